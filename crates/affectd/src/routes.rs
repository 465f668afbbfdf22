//! HTTP surface: upload form, predict endpoint, health probe, and static
//! serving of the upload directory.

use crate::engine::{EngineError, EngineHandle};
use crate::pages;
use crate::uploads::{UploadError, UploadStore};
use affect_core::preprocess::{self, PreprocessError};
use affect_core::Prediction;
use affect_store::{PredictionStore, StoreError};
use axum::body::Bytes;
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use thiserror::Error;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

const DEFAULT_NAME: &str = "Anonymous";

/// Shared per-process state handed to every handler.
pub struct AppState {
    pub engine: EngineHandle,
    pub store: PredictionStore,
    pub uploads: UploadStore,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("multipart: {0}")]
    Multipart(#[from] MultipartError),
    #[error("upload: {0}")]
    Upload(#[from] UploadError),
    #[error("preprocess: {0}")]
    Preprocess(#[from] PreprocessError),
    #[error("engine: {0}")]
    Engine(#[from] EngineError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            AppError::Upload(_)
            | AppError::Preprocess(_)
            | AppError::Engine(_)
            | AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!(error = %self, "request failed");
        // No user-facing error detail; the body stays generic.
        (status, "internal server error").into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/predict", post(predict))
        .route("/health", get(health))
        .nest_service("/uploads", ServeDir::new(state.uploads.dir()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(pages::INDEX)
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, AppError> {
    let predictions = state.store.count().await?;
    Ok(Json(serde_json::json!({
        "status": "ok",
        "predictions": predictions,
    })))
}

/// Handle one multipart form submission.
///
/// A submission without a file (or with an unnamed file field, which is how
/// browsers encode "no file chosen") is a silent no-op: redirect to the
/// form, write nothing.
async fn predict(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let mut name: Option<String> = None;
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => name = Some(field.text().await?),
            Some("file") => {
                let original = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|f| !f.is_empty());
                if let Some(original) = original {
                    let data = field.bytes().await?;
                    file = Some((original, data));
                }
            }
            _ => {}
        }
    }

    let Some((original, data)) = file else {
        return Ok(Redirect::to("/").into_response());
    };
    let name = name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_NAME.to_string());

    let filename = state.uploads.save(&original, &data).await?;

    // Store, classify, record. A failure past this point removes the stored
    // file again so failed requests leave no orphaned uploads.
    match classify_and_record(&state, &name, &filename).await {
        Ok(prediction) => {
            tracing::info!(
                name = %name,
                filename = %filename,
                emotion = %prediction.emotion,
                confidence = prediction.confidence,
                "prediction recorded"
            );
            Ok(Html(pages::result_page(prediction.emotion.as_str(), &filename)).into_response())
        }
        Err(err) => {
            state.uploads.remove(&filename).await;
            Err(err)
        }
    }
}

async fn classify_and_record(
    state: &AppState,
    name: &str,
    filename: &str,
) -> Result<Prediction, AppError> {
    let input = preprocess::tensor_from_path(&state.uploads.path_of(filename))?;
    let prediction = state.engine.classify(input).await?;
    state
        .store
        .insert(name, filename, prediction.emotion.as_str())
        .await?;
    Ok(prediction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use affect_core::Emotion;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use std::path::PathBuf;
    use tower::ServiceExt;
    use uuid::Uuid;

    const BOUNDARY: &str = "affect-test-boundary";

    struct TestApp {
        app: Router,
        state: Arc<AppState>,
        root: PathBuf,
    }

    impl Drop for TestApp {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.root);
        }
    }

    async fn test_app(emotion: Emotion) -> TestApp {
        let root = std::env::temp_dir().join(format!("affect-routes-test-{}", Uuid::new_v4()));
        let state = Arc::new(AppState {
            engine: EngineHandle::fixed(emotion),
            store: PredictionStore::in_memory().await.unwrap(),
            uploads: UploadStore::new(root.join("uploads")).unwrap(),
        });
        TestApp {
            app: router(state.clone()),
            state,
            root,
        }
    }

    fn png_face() -> Vec<u8> {
        let img = image::GrayImage::from_pixel(48, 48, image::Luma([128u8]));
        let mut buf = std::io::Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn predict_request(name: Option<&str>, file: Option<(&str, Vec<u8>)>) -> Request<Body> {
        let mut body: Vec<u8> = Vec::new();
        if let Some(name) = name {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\n{name}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(&bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn upload_count(state: &AppState) -> usize {
        std::fs::read_dir(state.uploads.dir()).unwrap().count()
    }

    #[tokio::test]
    async fn test_index_serves_upload_form() {
        let t = test_app(Emotion::Neutral).await;

        let response = t
            .app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains(r#"action="/predict""#));
    }

    #[tokio::test]
    async fn test_predict_without_file_redirects_silently() {
        let t = test_app(Emotion::Neutral).await;

        let response = t
            .app
            .clone()
            .oneshot(predict_request(Some("Alice"), None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
        assert_eq!(t.state.store.count().await.unwrap(), 0);
        assert_eq!(upload_count(&t.state), 0);
    }

    #[tokio::test]
    async fn test_predict_end_to_end() {
        let t = test_app(Emotion::Happy).await;

        let response = t
            .app
            .clone()
            .oneshot(predict_request(Some("Alice"), Some(("face.png", png_face()))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("Happy"));

        let records = t.state.store.recent(10).await.unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.name, "Alice");
        assert_eq!(record.emotion, "Happy");
        assert!(record.image_filename.ends_with("_face.png"));
        assert!(Emotion::from_label(&record.emotion).is_some());

        // The rendered image reference resolves to the saved file.
        assert!(body.contains(&format!("/uploads/{}", record.image_filename)));
        assert!(t.state.uploads.path_of(&record.image_filename).exists());
    }

    #[tokio::test]
    async fn test_predict_defaults_name_to_anonymous() {
        let t = test_app(Emotion::Sad).await;

        let response = t
            .app
            .clone()
            .oneshot(predict_request(None, Some(("face.png", png_face()))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let records = t.state.store.recent(1).await.unwrap();
        assert_eq!(records[0].name, "Anonymous");
    }

    #[tokio::test]
    async fn test_repeated_uploads_store_distinct_filenames() {
        let t = test_app(Emotion::Fear).await;

        for _ in 0..2 {
            let response = t
                .app
                .clone()
                .oneshot(predict_request(Some("Bob"), Some(("face.png", png_face()))))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let records = t.state.store.recent(10).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_ne!(records[0].image_filename, records[1].image_filename);
        assert!(records.iter().all(|r| r.image_filename.ends_with("_face.png")));
    }

    #[tokio::test]
    async fn test_predict_undecodable_file_fails_without_orphan() {
        let t = test_app(Emotion::Neutral).await;

        let response = t
            .app
            .clone()
            .oneshot(predict_request(
                Some("Alice"),
                Some(("face.png", b"not an image".to_vec())),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(t.state.store.count().await.unwrap(), 0);
        // Compensating cleanup removed the stored upload.
        assert_eq!(upload_count(&t.state), 0);
    }

    #[tokio::test]
    async fn test_uploaded_file_served_statically() {
        let t = test_app(Emotion::Happy).await;
        let stored = t.state.uploads.save("face.png", &png_face()).await.unwrap();

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/uploads/{stored}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_reports_record_count() {
        let t = test_app(Emotion::Neutral).await;
        t.state.store.insert("x", "f.png", "Angry").await.unwrap();

        let response = t
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains(r#""predictions":1"#));
    }
}
