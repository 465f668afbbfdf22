use affect_core::{preprocess, EmotionClassifier};
use affect_store::PredictionStore;
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "affect", about = "Affect emotion classification CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a face image file and print the predicted emotion
    Classify {
        /// Path to the image file
        image: PathBuf,
        /// Path to the ONNX model artifact (overrides AFFECT_MODEL_PATH)
        #[arg(short, long)]
        model: Option<String>,
    },
    /// List recent prediction records
    Recent {
        /// Maximum number of records to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        /// Path to the SQLite database (overrides AFFECT_DB_PATH)
        #[arg(short, long)]
        db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { image, model } => {
            let model_path = model
                .or_else(|| std::env::var("AFFECT_MODEL_PATH").ok())
                .unwrap_or_else(|| "models/emotion.onnx".to_string());

            let mut classifier = EmotionClassifier::load(&model_path)?;
            let input = preprocess::tensor_from_path(&image)?;
            let prediction = classifier.classify(&input)?;

            println!("{} ({:.3})", prediction.emotion, prediction.confidence);
        }
        Commands::Recent { limit, db } => {
            let db_path = db
                .or_else(|| std::env::var("AFFECT_DB_PATH").ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("data/affect.db"));

            let store = PredictionStore::open(&db_path).await?;
            let records = store.recent(limit).await?;

            if records.is_empty() {
                println!("no predictions recorded");
            }
            for r in records {
                println!(
                    "#{:<4} {}  {:<10} {:<10} {}",
                    r.id, r.created_at, r.emotion, r.name, r.image_filename
                );
            }
        }
    }

    Ok(())
}
