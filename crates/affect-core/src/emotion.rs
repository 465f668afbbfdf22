use serde::{Deserialize, Serialize};

/// The fixed emotion vocabulary, in model output order.
///
/// The classifier emits one score per variant; the declaration order here
/// must match the class order the model was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Sad,
    Surprise,
    Neutral,
}

impl Emotion {
    /// All labels in model output order. Position == class index.
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Surprise,
        Emotion::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "Angry",
            Emotion::Disgust => "Disgust",
            Emotion::Fear => "Fear",
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
            Emotion::Surprise => "Surprise",
            Emotion::Neutral => "Neutral",
        }
    }

    /// Class index of this label in the model output vector.
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|e| e == self)
            .unwrap_or_default()
    }

    /// Label for a class index, if in range.
    pub fn from_index(index: usize) -> Option<Emotion> {
        Self::ALL.get(index).copied()
    }

    /// Parse a stored label string.
    pub fn from_label(label: &str) -> Option<Emotion> {
        Self::ALL.iter().copied().find(|e| e.as_str() == label)
    }

    /// Argmax over a per-class score slice.
    ///
    /// Exact ties resolve to the lowest index: a later score replaces the
    /// running best only when strictly greater. Returns `None` for an empty
    /// slice or an index past the vocabulary.
    pub fn from_scores(scores: &[f32]) -> Option<Emotion> {
        let mut best_idx: Option<usize> = None;
        let mut best_score = f32::NEG_INFINITY;

        for (i, &score) in scores.iter().enumerate() {
            if score > best_score {
                best_score = score;
                best_idx = Some(i);
            }
        }

        best_idx.and_then(Emotion::from_index)
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one classification.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub emotion: Emotion,
    /// Score of the winning class, as produced by the model.
    pub confidence: f32,
    /// Raw per-class scores in model output order.
    pub scores: Vec<f32>,
}
