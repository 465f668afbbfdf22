use std::path::PathBuf;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// TCP port to listen on; the host is fixed to all interfaces.
    pub port: u16,
    /// Path to the ONNX emotion model artifact.
    pub model_path: String,
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Directory receiving uploaded images, served back under /uploads.
    pub upload_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            port: env_u16("PORT", 5000),
            model_path: std::env::var("AFFECT_MODEL_PATH")
                .unwrap_or_else(|_| "models/emotion.onnx".to_string()),
            db_path: std::env::var("AFFECT_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/affect.db")),
            upload_dir: std::env::var("AFFECT_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
        }
    }
}

fn env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
