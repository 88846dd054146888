use thiserror::Error;
use std::path::PathBuf;

/// The main result type for scout-core operations.
pub type ScoutResult<T> = Result<T, ScoutError>;

/// Coarse classification of a [`ScoutError`], for callers that map errors to responses
/// (e.g. "index not built yet" vs "bad query").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Corpus,
    Index,
    Query,
    Embedding,
    Storage,
}

/// Enum representing possible errors within the scout-core library.
#[derive(Error, Debug)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Corpus is empty, nothing to index")]
    EmptyCorpus,

    #[error("Corpus item {id} at {path:?} could not be read: {reason}")]
    UnreadableItem {
        id: u64,
        path: PathBuf,
        reason: String,
    },

    #[error("None of the {attempted} corpus items could be embedded")]
    NoEmbeddableItems { attempted: usize },

    #[error("Corpus source error: {0}")]
    CorpusSource(String),

    #[error("Index not found at {0:?}")]
    IndexMissing(PathBuf),

    #[error("Index is empty, cannot perform search")]
    EmptyIndex,

    #[error("Index is inconsistent: {0}")]
    InconsistentIndex(String),

    #[error("Query is empty")]
    EmptyQuery,

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding capability failed: {0}")]
    Embedding(String),

    #[error("I/O error accessing path {path:?}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl ScoutError {
    /// Shorthand for wrapping an `io::Error` together with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScoutError::IoError { path: path.into(), source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ScoutError::Configuration(_) => ErrorKind::Configuration,
            ScoutError::EmptyCorpus
            | ScoutError::UnreadableItem { .. }
            | ScoutError::NoEmbeddableItems { .. }
            | ScoutError::CorpusSource(_) => ErrorKind::Corpus,
            ScoutError::IndexMissing(_)
            | ScoutError::EmptyIndex
            | ScoutError::InconsistentIndex(_) => ErrorKind::Index,
            ScoutError::EmptyQuery
            | ScoutError::InvalidQuery(_)
            | ScoutError::DimensionMismatch { .. } => ErrorKind::Query,
            ScoutError::Embedding(_) => ErrorKind::Embedding,
            ScoutError::IoError { .. }
            | ScoutError::Serialization(_)
            | ScoutError::Deserialization(_) => ErrorKind::Storage,
        }
    }
}
