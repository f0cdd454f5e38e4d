use std::path::Path;

use serde::Deserialize;

use crate::alignment::emission::ChunkPlan;
use crate::error::AlignmentError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    /// Path to a `{symbol: id}` JSON vocabulary. Empty selects the built-in
    /// phoneme table.
    pub vocab_path: String,
    pub expected_sample_rate_hz: u32,
    /// Duration of audio covered by one emission frame.
    pub frame_stride_ms: f64,
    /// Length of one emission window in seconds.
    pub window_secs: f64,
    /// Context added on each side of a window, as a fraction of `window_secs`.
    pub context_ratio: f64,
    pub blank_symbol: String,
    pub separator_symbol: String,
}

impl AlignerConfig {
    pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 16_000;
    pub const DEFAULT_FRAME_STRIDE_MS: f64 = 20.0;
    pub const DEFAULT_WINDOW_SECS: f64 = 30.0;
    pub const DEFAULT_CONTEXT_RATIO: f64 = 0.1;

    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read aligner config", e))?;
        serde_json::from_str(&data).map_err(|e| AlignmentError::json("parse aligner config", e))
    }

    pub fn chunk_plan(&self) -> Result<ChunkPlan, AlignmentError> {
        if !(self.context_ratio.is_finite() && self.context_ratio >= 0.0) {
            return Err(AlignmentError::invalid_input(format!(
                "context_ratio must be non-negative, got {}",
                self.context_ratio
            )));
        }
        ChunkPlan::new(
            self.window_secs,
            self.window_secs * self.context_ratio,
            self.frame_stride_ms,
        )
    }
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            vocab_path: String::new(),
            expected_sample_rate_hz: Self::DEFAULT_SAMPLE_RATE_HZ,
            frame_stride_ms: Self::DEFAULT_FRAME_STRIDE_MS,
            window_secs: Self::DEFAULT_WINDOW_SECS,
            context_ratio: Self::DEFAULT_CONTEXT_RATIO,
            blank_symbol: "[PAD]".to_string(),
            separator_symbol: "|".to_string(),
        }
    }
}
