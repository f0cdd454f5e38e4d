pub mod alignment;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;
pub mod vocabulary;

pub use alignment::emission::{chunk_and_stitch, emit_chunked, ChunkPlan, ChunkWindow};
pub use alignment::spans::{AlignedSpans, AudioTiming};
pub use config::AlignerConfig;
pub use error::AlignmentError;
pub use pipeline::builder::ForcedAlignerBuilder;
pub use pipeline::defaults::SymbolTokenizer;
pub use pipeline::runtime::ForcedAligner;
pub use pipeline::traits::{
    EmissionModel, EmissionOutput, ProgressObserver, ScoreKind, TextTokenizer,
};
pub use types::{
    AlignedSpan, AlignmentInput, EmissionMatrix, Point, ResolvedUnit, Segment, TextUnit,
    TokenSequence, WordSlot,
};
pub use vocabulary::Vocabulary;
