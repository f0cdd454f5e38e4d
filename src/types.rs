use std::fmt;

use serde::Serialize;

use crate::error::AlignmentError;

#[derive(Debug, Clone)]
pub struct AlignmentInput {
    pub sample_rate_hz: u32,
    /// Mono PCM, already resampled to the model's rate.
    pub samples: Vec<f32>,
    pub transcript: String,
}

/// Per-frame log-probabilities over the vocabulary (frames × vocab).
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionMatrix {
    rows: Vec<Vec<f32>>,
    vocab_size: usize,
}

impl EmissionMatrix {
    /// Rows must share one width and hold only finite values.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, AlignmentError> {
        let vocab_size = rows.first().map(Vec::len).unwrap_or(0);
        for (frame, row) in rows.iter().enumerate() {
            if row.len() != vocab_size {
                return Err(AlignmentError::invalid_input(format!(
                    "emission frame {frame} has width {} (expected {vocab_size})",
                    row.len()
                )));
            }
            if let Some(column) = row.iter().position(|v| !v.is_finite()) {
                return Err(AlignmentError::non_finite("emission", frame, column));
            }
        }
        Ok(Self { rows, vocab_size })
    }

    pub fn num_frames(&self) -> usize {
        self.rows.len()
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    #[inline]
    pub fn get(&self, frame: usize, id: usize) -> f32 {
        self.rows[frame][id]
    }
}

/// One frame of the alignment path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub token_index: usize,
    pub time_index: usize,
    /// Probability of the emission chosen for this step.
    pub probability: f32,
}

/// Labelled frame interval `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub label: String,
    pub start: usize,
    pub end: usize,
    pub score: f32,
}

impl Segment {
    pub fn length(&self) -> usize {
        self.end - self.start
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t({:4.2}): [{:5}, {:5})",
            self.label, self.score, self.start, self.end
        )
    }
}

/// Phonemization of one text unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedUnit {
    pub phonemes: String,
    pub token_ids: Vec<usize>,
}

/// One unit of the original transcript as returned by a tokenizer.
/// `resolved` is `None` for units that could not be phonemized
/// (punctuation, whitespace, out-of-vocabulary text).
#[derive(Debug, Clone, PartialEq)]
pub struct TextUnit {
    pub text: String,
    pub resolved: Option<ResolvedUnit>,
}

impl TextUnit {
    pub fn resolved(
        text: impl Into<String>,
        phonemes: impl Into<String>,
        token_ids: Vec<usize>,
    ) -> Self {
        Self {
            text: text.into(),
            resolved: Some(ResolvedUnit {
                phonemes: phonemes.into(),
                token_ids,
            }),
        }
    }

    pub fn unresolved(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            resolved: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

/// Word position within the unit list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSlot {
    /// Index of the resolved unit that produced this word's tokens.
    pub unit_index: usize,
    /// Unresolved units directly after `unit_index` folded into the word's text.
    pub attached_unit_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenSequence {
    /// Word token groups joined by separators, with a separator at each end.
    pub tokens: Vec<usize>,
    /// Vocabulary symbol for each entry of `tokens`.
    pub labels: Vec<String>,
    pub words: Vec<WordSlot>,
    /// Unresolved units before the first resolved one.
    pub leading_unit_count: usize,
}

impl TokenSequence {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Final per-word timing in seconds.
///
/// `display_*` bounds are chained so consecutive spans touch; `exact_*`
/// bounds are the raw model-derived boundaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedSpan {
    pub text: String,
    pub display_start: f64,
    pub display_end: f64,
    pub exact_start: f64,
    pub exact_end: f64,
}
