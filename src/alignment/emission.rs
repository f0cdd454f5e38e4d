use candle_core::{Device, Tensor, D};

use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::traits::{EmissionModel, EmissionOutput, ProgressObserver, ScoreKind};
use crate::types::EmissionMatrix;

/// Fixed-window schedule for running the emission model over long audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkPlan {
    pub window_secs: f64,
    /// Extra audio fed to the model on each side of a window, then discarded.
    pub context_secs: f64,
    pub frame_stride_ms: f64,
}

impl Default for ChunkPlan {
    fn default() -> Self {
        Self {
            window_secs: AlignerConfig::DEFAULT_WINDOW_SECS,
            context_secs: AlignerConfig::DEFAULT_WINDOW_SECS * AlignerConfig::DEFAULT_CONTEXT_RATIO,
            frame_stride_ms: AlignerConfig::DEFAULT_FRAME_STRIDE_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkWindow {
    pub index: usize,
    /// Kept interval `[start_secs, end_secs)`; `end_secs` may pass the end of audio.
    pub start_secs: f64,
    pub end_secs: f64,
    /// Interval actually sent to the model, context included.
    pub input_start_secs: f64,
    pub input_end_secs: f64,
}

impl ChunkPlan {
    pub fn new(
        window_secs: f64,
        context_secs: f64,
        frame_stride_ms: f64,
    ) -> Result<Self, AlignmentError> {
        let plan = Self {
            window_secs,
            context_secs,
            frame_stride_ms,
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Window and stride must be finite and positive, context finite and
    /// non-negative; anything else makes `windows` unbounded.
    pub fn validate(&self) -> Result<(), AlignmentError> {
        if !(self.window_secs.is_finite() && self.window_secs > 0.0) {
            return Err(AlignmentError::invalid_input(format!(
                "window_secs must be positive, got {}",
                self.window_secs
            )));
        }
        if !(self.frame_stride_ms.is_finite() && self.frame_stride_ms > 0.0) {
            return Err(AlignmentError::invalid_input(format!(
                "frame_stride_ms must be positive, got {}",
                self.frame_stride_ms
            )));
        }
        if !(self.context_secs.is_finite() && self.context_secs >= 0.0) {
            return Err(AlignmentError::invalid_input(format!(
                "context_secs must be non-negative, got {}",
                self.context_secs
            )));
        }
        Ok(())
    }

    pub fn frames_per_second(&self) -> f64 {
        1000.0 / self.frame_stride_ms
    }

    /// Frame containing `secs` (truncating).
    pub fn time_to_frame(&self, secs: f64) -> usize {
        (secs * self.frames_per_second()) as usize
    }

    pub fn windows(&self, duration_secs: f64) -> impl Iterator<Item = ChunkWindow> {
        let plan = *self;
        (0usize..)
            .map(move |index| {
                let start_secs = index as f64 * plan.window_secs;
                let end_secs = start_secs + plan.window_secs;
                ChunkWindow {
                    index,
                    start_secs,
                    end_secs,
                    input_start_secs: (start_secs - plan.context_secs).max(0.0),
                    input_end_secs: (end_secs + plan.context_secs).min(duration_secs),
                }
            })
            .take_while(move |w| w.start_secs < duration_secs)
    }
}

/// Run `emit_fn` once per window and stitch the kept frames into one matrix.
///
/// Context frames on either side of a window are dropped, so the result is
/// contiguous in time. Any window failure aborts the whole call.
pub fn chunk_and_stitch<F>(
    duration_secs: f64,
    plan: &ChunkPlan,
    vocab_width: usize,
    mut emit_fn: F,
) -> Result<EmissionMatrix, AlignmentError>
where
    F: FnMut(&ChunkWindow) -> Result<EmissionOutput, AlignmentError>,
{
    plan.validate()?;
    if !(duration_secs.is_finite() && duration_secs >= 0.0) {
        return Err(AlignmentError::invalid_input(format!(
            "audio duration must be finite and non-negative, got {duration_secs}"
        )));
    }
    let device = Device::Cpu;
    let mut parts = Vec::new();

    for window in plan.windows(duration_secs) {
        let output = emit_fn(&window).inspect_err(|e| {
            tracing::warn!(
                window = window.index,
                error = %e,
                "emission: window failed, discarding stitched frames"
            );
        })?;
        let available = output.frames.len();
        let offset = plan.time_to_frame(window.input_start_secs);
        let first = plan
            .time_to_frame(window.start_secs)
            .saturating_sub(offset)
            .min(available);
        let last = plan
            .time_to_frame(window.end_secs)
            .saturating_sub(offset)
            .min(available);

        tracing::debug!(
            window = window.index,
            start_secs = window.start_secs,
            input_start_secs = window.input_start_secs,
            input_end_secs = window.input_end_secs,
            local_frames = available,
            kept_frames = last - first,
            "emission: window processed"
        );

        if last <= first {
            continue;
        }
        let local = frames_to_tensor(&output.frames, vocab_width, &device)?;
        let local = match output.scores {
            ScoreKind::LogProbs => local,
            ScoreKind::Logits => candle_nn::ops::log_softmax(&local, D::Minus1)
                .map_err(|e| AlignmentError::runtime("log_softmax", e))?,
        };
        let kept = local
            .narrow(0, first, last - first)
            .map_err(|e| AlignmentError::runtime("narrow emission window", e))?;
        parts.push(kept);
    }

    if parts.is_empty() {
        return Err(AlignmentError::invalid_input(format!(
            "no emission frames produced for {duration_secs:.3}s of audio"
        )));
    }

    let stitched =
        Tensor::cat(&parts, 0).map_err(|e| AlignmentError::runtime("stitch emissions", e))?;
    let rows: Vec<Vec<f32>> = stitched
        .to_vec2()
        .map_err(|e| AlignmentError::runtime("to_vec2", e))?;
    EmissionMatrix::from_rows(rows)
}

/// Slice `samples` per window of `plan` and feed each slice to `model`.
///
/// `progress`, when given, is told after every window the model finishes.
pub fn emit_chunked(
    samples: &[f32],
    sample_rate_hz: u32,
    plan: &ChunkPlan,
    model: &dyn EmissionModel,
    vocab_width: usize,
    progress: Option<&dyn ProgressObserver>,
) -> Result<EmissionMatrix, AlignmentError> {
    if sample_rate_hz == 0 {
        return Err(AlignmentError::invalid_input("sample rate must be non-zero"));
    }
    plan.validate()?;
    let sr = sample_rate_hz as f64;
    let duration_secs = samples.len() as f64 / sr;
    let total = plan.windows(duration_secs).count();
    chunk_and_stitch(duration_secs, plan, vocab_width, |window| {
        let start = ((sr * window.input_start_secs) as usize).min(samples.len());
        let end = ((sr * window.input_end_secs) as usize).clamp(start, samples.len());
        let output = model.emit(&samples[start..end])?;
        if let Some(progress) = progress {
            progress.on_window(window.index + 1, total);
        }
        Ok(output)
    })
}

impl EmissionMatrix {
    /// Log-softmax normalize raw per-frame scores.
    pub fn from_logits(rows: Vec<Vec<f32>>) -> Result<Self, AlignmentError> {
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if rows.is_empty() || width == 0 {
            return EmissionMatrix::from_rows(rows);
        }
        let logits = frames_to_tensor(&rows, width, &Device::Cpu)?;
        let log_probs = candle_nn::ops::log_softmax(&logits, D::Minus1)
            .and_then(|t| t.to_vec2())
            .map_err(|e| AlignmentError::runtime("log_softmax", e))?;
        EmissionMatrix::from_rows(log_probs)
    }
}

fn frames_to_tensor(
    frames: &[Vec<f32>],
    vocab_width: usize,
    device: &Device,
) -> Result<Tensor, AlignmentError> {
    if let Some((frame, row)) = frames
        .iter()
        .enumerate()
        .find(|(_, row)| row.len() != vocab_width)
    {
        return Err(AlignmentError::vocabulary_mismatch(format!(
            "emission frame {frame} has width {} but the vocabulary has {vocab_width} symbols",
            row.len()
        )));
    }
    let flat: Vec<f32> = frames.iter().flatten().copied().collect();
    Tensor::from_vec(flat, (frames.len(), vocab_width), device)
        .map_err(|e| AlignmentError::runtime("emission tensor creation", e))
}
