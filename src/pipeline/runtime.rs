use crate::alignment::backtrack::backtrack;
use crate::alignment::emission::{emit_chunked, ChunkPlan};
use crate::alignment::segments::{merge_repeats, merge_words};
use crate::alignment::spans::{assemble, AlignedSpans, AudioTiming};
use crate::alignment::tokenization::build_token_sequence;
use crate::alignment::trellis::build_trellis;
use crate::error::AlignmentError;
use crate::pipeline::traits::{EmissionModel, ProgressObserver, TextTokenizer};
use crate::types::{AlignmentInput, EmissionMatrix, TextUnit};
use crate::vocabulary::Vocabulary;

pub struct ForcedAligner {
    vocab: Vocabulary,
    chunk_plan: ChunkPlan,
    expected_sample_rate_hz: u32,
    emission_model: Box<dyn EmissionModel>,
    tokenizer: Box<dyn TextTokenizer>,
    progress: Option<Box<dyn ProgressObserver>>,
}

pub(crate) struct ForcedAlignerParts {
    pub vocab: Vocabulary,
    pub chunk_plan: ChunkPlan,
    pub expected_sample_rate_hz: u32,
    pub emission_model: Box<dyn EmissionModel>,
    pub tokenizer: Box<dyn TextTokenizer>,
    pub progress: Option<Box<dyn ProgressObserver>>,
}

impl ForcedAligner {
    pub(crate) fn from_parts(parts: ForcedAlignerParts) -> Self {
        Self {
            vocab: parts.vocab,
            chunk_plan: parts.chunk_plan,
            expected_sample_rate_hz: parts.expected_sample_rate_hz,
            emission_model: parts.emission_model,
            tokenizer: parts.tokenizer,
            progress: parts.progress,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Tokenize every non-empty line of `transcript`. Line breaks are kept as
    /// unresolved units so they stay in the reconstructed text.
    pub fn tokenize(&self, transcript: &str) -> Vec<TextUnit> {
        let lines: Vec<&str> = transcript
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let mut units = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                units.push(TextUnit::unresolved("\n"));
            }
            units.extend(self.tokenizer.tokenize(line, &self.vocab));
        }
        units
    }

    /// Align `input.transcript` against `input.samples`.
    ///
    /// Returns no spans when there is no audio or nothing in the transcript
    /// maps to the vocabulary.
    pub fn align(&self, input: &AlignmentInput) -> Result<AlignedSpans, AlignmentError> {
        if input.samples.is_empty() || input.transcript.trim().is_empty() {
            return Ok(AlignedSpans::empty());
        }

        if input.sample_rate_hz != self.expected_sample_rate_hz {
            tracing::warn!(
                expected_rate_hz = self.expected_sample_rate_hz,
                actual_rate_hz = input.sample_rate_hz,
                "forced aligner expects a specific sample rate; frame timing may drift"
            );
        }

        let units = self.tokenize(&input.transcript);
        if !units.iter().any(TextUnit::is_resolved) {
            tracing::debug!(units = units.len(), "align: no resolvable units in transcript");
            return Ok(AlignedSpans::empty());
        }

        let emission = emit_chunked(
            &input.samples,
            input.sample_rate_hz,
            &self.chunk_plan,
            self.emission_model.as_ref(),
            self.vocab.len(),
            self.progress.as_deref(),
        )?;

        self.align_emission(&emission, units, input.samples.len(), input.sample_rate_hz)
    }

    /// Align pre-tokenized `units` against an already computed emission matrix.
    pub fn align_emission(
        &self,
        emission: &EmissionMatrix,
        units: Vec<TextUnit>,
        sample_count: usize,
        sample_rate_hz: u32,
    ) -> Result<AlignedSpans, AlignmentError> {
        self.vocab.validate_width(emission.vocab_size())?;

        let sequence = build_token_sequence(&units, &self.vocab)?;
        if sequence.is_empty() {
            return Ok(AlignedSpans::empty());
        }

        let blank_id = self.vocab.blank_id();
        let trellis = build_trellis(emission, &sequence.tokens, blank_id)?;
        let path = backtrack(&trellis, emission, &sequence.tokens, blank_id)?;
        let segments = merge_repeats(&path, &sequence.labels)?;
        let word_segments = merge_words(&segments, self.vocab.separator_symbol());

        tracing::debug!(
            frames = emission.num_frames(),
            tokens = sequence.tokens.len(),
            segments = segments.len(),
            words = word_segments.len(),
            "align: path merged into words"
        );

        assemble(
            word_segments,
            units,
            sequence.words,
            sequence.leading_unit_count,
            AudioTiming {
                frame_count: trellis.num_frames(),
                sample_count,
                sample_rate_hz,
            },
        )
    }
}
