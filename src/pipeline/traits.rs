use crate::error::AlignmentError;
use crate::types::TextUnit;
use crate::vocabulary::Vocabulary;

/// How the values returned by an [`EmissionModel`] are scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    /// Rows are already log-probabilities.
    LogProbs,
    /// Raw scores; rows are log-softmax normalized after stitching.
    Logits,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmissionOutput {
    /// One row per frame, one column per vocabulary id.
    pub frames: Vec<Vec<f32>>,
    pub scores: ScoreKind,
}

impl EmissionOutput {
    pub fn log_probs(frames: Vec<Vec<f32>>) -> Self {
        Self {
            frames,
            scores: ScoreKind::LogProbs,
        }
    }

    pub fn logits(frames: Vec<Vec<f32>>) -> Self {
        Self {
            frames,
            scores: ScoreKind::Logits,
        }
    }
}

/// Acoustic model producing per-frame scores for a window of mono samples.
/// Must be deterministic for identical input.
pub trait EmissionModel: Send + Sync {
    fn emit(&self, samples: &[f32]) -> Result<EmissionOutput, AlignmentError>;
}

impl<F> EmissionModel for F
where
    F: Fn(&[f32]) -> Result<EmissionOutput, AlignmentError> + Send + Sync,
{
    fn emit(&self, samples: &[f32]) -> Result<EmissionOutput, AlignmentError> {
        self(samples)
    }
}

/// Splits raw text into ordered units and phonemizes the ones it can.
pub trait TextTokenizer: Send + Sync {
    fn tokenize(&self, text: &str, vocab: &Vocabulary) -> Vec<TextUnit>;
}

/// Receives chunk progress during emission: `completed` of `total` windows.
pub trait ProgressObserver: Send + Sync {
    fn on_window(&self, completed: usize, total: usize);
}

impl<F> ProgressObserver for F
where
    F: Fn(usize, usize) + Send + Sync,
{
    fn on_window(&self, completed: usize, total: usize) {
        self(completed, total)
    }
}
