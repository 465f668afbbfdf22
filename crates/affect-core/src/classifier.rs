//! Emotion classifier via ONNX Runtime.
//!
//! Wraps a pretrained 7-class emotion CNN. The session is built once at
//! load time and held for the process lifetime; there is no hot-reload.

use crate::emotion::{Emotion, Prediction};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const EMOTION_CLASS_COUNT: usize = 7;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("model file not found: {0} — set AFFECT_MODEL_PATH to the ONNX artifact")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Pretrained emotion classifier.
#[derive(Debug)]
pub struct EmotionClassifier {
    session: Session,
}

impl EmotionClassifier {
    /// Load the emotion ONNX model from the given path.
    pub fn load(model_path: &str) -> Result<Self, ClassifierError> {
        if !Path::new(model_path).exists() {
            return Err(ClassifierError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = model_path,
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded emotion model"
        );

        Ok(Self { session })
    }

    /// Classify a preprocessed `(1, 1, 48, 48)` batch tensor.
    ///
    /// The model emits one score per label in the fixed vocabulary order;
    /// the prediction is the argmax (first index wins on exact ties). There
    /// is no confidence threshold and no "unknown" fallback.
    pub fn classify(&mut self, input: &Array4<f32>) -> Result<Prediction, ClassifierError> {
        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (_, raw) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::InferenceFailed(format!("class scores: {e}")))?;

        let scores: Vec<f32> = raw.to_vec();

        if scores.len() != EMOTION_CLASS_COUNT {
            return Err(ClassifierError::InferenceFailed(format!(
                "expected {EMOTION_CLASS_COUNT} class scores, got {}",
                scores.len()
            )));
        }

        let emotion = Emotion::from_scores(&scores).ok_or_else(|| {
            ClassifierError::InferenceFailed("empty score vector".to_string())
        })?;
        let confidence = scores[emotion.index()];

        Ok(Prediction {
            emotion,
            confidence,
            scores,
        })
    }
}
