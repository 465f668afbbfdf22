use affect_core::classifier::ClassifierError;
use affect_core::{EmotionClassifier, Prediction};
use ndarray::Array4;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Messages sent from request handlers to the engine thread.
enum EngineRequest {
    Classify {
        input: Array4<f32>,
        reply: oneshot::Sender<Result<Prediction, EngineError>>,
    },
}

/// Clone-safe handle to the inference thread.
#[derive(Clone, Debug)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    /// Classify a preprocessed batch tensor on the engine thread.
    pub async fn classify(&self, input: Array4<f32>) -> Result<Prediction, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EngineRequest::Classify {
                input,
                reply: reply_tx,
            })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)?
    }

    /// Handle whose worker answers every request with a fixed one-hot
    /// prediction, for exercising handlers without a model artifact.
    #[cfg(test)]
    pub(crate) fn fixed(emotion: affect_core::Emotion) -> Self {
        let (tx, mut rx) = mpsc::channel::<EngineRequest>(16);
        tokio::spawn(async move {
            while let Some(EngineRequest::Classify { reply, .. }) = rx.recv().await {
                let mut scores = vec![0.0f32; affect_core::Emotion::ALL.len()];
                scores[emotion.index()] = 1.0;
                let _ = reply.send(Ok(Prediction {
                    emotion,
                    confidence: 1.0,
                    scores,
                }));
            }
        });
        Self { tx }
    }
}

/// Load the model and spawn the inference loop on a dedicated OS thread.
///
/// The ONNX session runs with exclusive access, so all requests serialize
/// through the channel; handlers never share the session directly. Fails
/// fast at startup if the artifact is missing.
pub fn spawn_engine(model_path: &str) -> Result<EngineHandle, EngineError> {
    let mut classifier = EmotionClassifier::load(model_path)?;

    let (tx, mut rx) = mpsc::channel::<EngineRequest>(16);

    std::thread::Builder::new()
        .name("affect-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            while let Some(req) = rx.blocking_recv() {
                match req {
                    EngineRequest::Classify { input, reply } => {
                        let result = classifier.classify(&input).map_err(EngineError::from);
                        let _ = reply.send(result);
                    }
                }
            }
            tracing::info!("engine thread exiting");
        })
        .expect("failed to spawn engine thread");

    Ok(EngineHandle { tx })
}
