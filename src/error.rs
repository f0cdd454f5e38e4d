use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlignmentError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON parse error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("{context}: {message}")]
    Runtime {
        context: &'static str,
        message: String,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    /// Not enough frames to emit every token, or the backtrack ran out of
    /// frames before consuming the token sequence.
    #[error("alignment infeasible: {message}")]
    Infeasible { message: String },
    #[error("vocabulary mismatch: {message}")]
    VocabularyMismatch { message: String },
    #[error("non-finite value in {context} at frame {frame}, column {column}")]
    NonFinite {
        context: &'static str,
        frame: usize,
        column: usize,
    },
}

impl AlignmentError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub fn runtime(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Runtime {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn infeasible(message: impl Into<String>) -> Self {
        Self::Infeasible {
            message: message.into(),
        }
    }

    pub(crate) fn vocabulary_mismatch(message: impl Into<String>) -> Self {
        Self::VocabularyMismatch {
            message: message.into(),
        }
    }

    pub(crate) fn non_finite(context: &'static str, frame: usize, column: usize) -> Self {
        Self::NonFinite {
            context,
            frame,
            column,
        }
    }
}
