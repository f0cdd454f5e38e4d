use std::path::Path;

use crate::config::AlignerConfig;
use crate::error::AlignmentError;
use crate::pipeline::defaults::SymbolTokenizer;
use crate::pipeline::runtime::{ForcedAligner, ForcedAlignerParts};
use crate::pipeline::traits::{EmissionModel, ProgressObserver, TextTokenizer};
use crate::vocabulary::Vocabulary;

pub struct ForcedAlignerBuilder {
    config: AlignerConfig,
    vocab: Option<Vocabulary>,
    emission_model: Option<Box<dyn EmissionModel>>,
    tokenizer: Option<Box<dyn TextTokenizer>>,
    progress: Option<Box<dyn ProgressObserver>>,
}

impl ForcedAlignerBuilder {
    pub fn new(config: AlignerConfig) -> Self {
        Self {
            config,
            vocab: None,
            emission_model: None,
            tokenizer: None,
            progress: None,
        }
    }

    pub fn with_vocabulary(mut self, vocab: Vocabulary) -> Self {
        self.vocab = Some(vocab);
        self
    }

    pub fn with_emission_model(mut self, emission_model: Box<dyn EmissionModel>) -> Self {
        self.emission_model = Some(emission_model);
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn TextTokenizer>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    /// Report chunk progress while emitting; silent when unset.
    pub fn with_progress(mut self, progress: Box<dyn ProgressObserver>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn build(self) -> Result<ForcedAligner, AlignmentError> {
        let emission_model = self
            .emission_model
            .ok_or_else(|| AlignmentError::invalid_input("an emission model is required"))?;
        let chunk_plan = self.config.chunk_plan()?;
        let expected_sample_rate_hz = if self.config.expected_sample_rate_hz == 0 {
            AlignerConfig::DEFAULT_SAMPLE_RATE_HZ
        } else {
            self.config.expected_sample_rate_hz
        };

        let vocab = match self.vocab {
            Some(vocab) => vocab,
            None if self.config.vocab_path.is_empty() => Vocabulary::phonemes_with(
                &self.config.blank_symbol,
                &self.config.separator_symbol,
            )?,
            None => Vocabulary::load(
                Path::new(&self.config.vocab_path),
                &self.config.blank_symbol,
                &self.config.separator_symbol,
            )?,
        };

        tracing::info!(
            vocab = vocab.len(),
            blank_id = vocab.blank_id(),
            separator_id = vocab.separator_id(),
            window_secs = chunk_plan.window_secs,
            frame_stride_ms = chunk_plan.frame_stride_ms,
            "forced aligner built"
        );

        Ok(ForcedAligner::from_parts(ForcedAlignerParts {
            vocab,
            chunk_plan,
            expected_sample_rate_hz,
            emission_model,
            tokenizer: self
                .tokenizer
                .unwrap_or_else(|| Box::new(SymbolTokenizer)),
            progress: self.progress,
        }))
    }
}
