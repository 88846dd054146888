pub mod builder;
pub mod config;
pub mod corpus;
pub mod distance;
pub mod embedding;
pub mod error;
pub mod index;
pub mod request;
pub mod searcher;
pub mod storage;
pub mod vector;

// Re-export key types/traits for easier use
pub use builder::{BuildOutcome, BuildStatus, EmbeddingBuilder};
pub use config::{BuildConfig, FailurePolicy};
pub use corpus::{CorpusItem, MetadataFileSource};
pub use embedding::{ColorHistogramEmbedder, Embedder};
pub use error::{ErrorKind, ScoutError, ScoutResult};
pub use index::{FlatIndex, Ranker, ScoredPosition, VectorIndex};
pub use request::{SearchRequest, SearchResponse};
pub use searcher::{IndexStats, Query, SearchHit, SimilaritySearcher};
pub use storage::{IndexLayout, ItemFailure, Manifest};
pub use vector::{Embedding, DEFAULT_DIMENSIONS};
