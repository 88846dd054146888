use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::FailurePolicy;
use crate::corpus::CorpusItem;

/// Bumped whenever the on-disk layout changes incompatibly.
pub const FORMAT_VERSION: u32 = 1;

/// Build record stored next to the vector and metadata tables.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Manifest {
    pub format_version: u32,
    /// Number of vectors (and metadata rows) in the index.
    pub vector_count: usize,
    /// Corpus size the build saw before `limit` was applied.
    pub source_corpus_size: usize,
    pub dimensions: usize,
    pub embedder: String,
    /// Fingerprint of the effective (post-`limit`) corpus.
    pub corpus_fingerprint: String,
    pub parameters: BuildParameters,
    #[serde(default)]
    pub failures: Vec<ItemFailure>,
}

/// Build parameters that shaped the stored index.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildParameters {
    pub limit: Option<usize>,
    pub failure_policy: FailurePolicy,
}

/// One row of the metadata table, aligned with the vector table by `position`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IndexedItem {
    pub position: usize,
    #[serde(flatten)]
    pub item: CorpusItem,
}

/// A corpus item the builder skipped in lenient mode.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Position of the item in the (limited) corpus, not in the index.
    pub corpus_position: usize,
    pub id: u64,
    pub path: PathBuf,
    pub reason: String,
}
