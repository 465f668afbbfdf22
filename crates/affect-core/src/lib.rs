//! affect-core — Emotion classification engine.
//!
//! Preprocesses face images to the model's fixed 48x48 grayscale input grid
//! and runs a pretrained emotion CNN via ONNX Runtime for CPU inference.

pub mod classifier;
pub mod emotion;
pub mod preprocess;

pub use classifier::EmotionClassifier;
pub use emotion::{Emotion, Prediction};
