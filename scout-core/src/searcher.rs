//! Query-time side: turns text or image queries into ranked corpus hits.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use serde::Serialize;
use tracing::{debug, warn};

use crate::corpus::CorpusItem;
use crate::embedding::Embedder;
use crate::error::{ScoutError, ScoutResult};
use crate::index::VectorIndex;
use crate::vector::Embedding;

/// A search query. Lives for one search call only.
#[derive(Debug, Clone)]
pub enum Query {
    Text(String),
    Image(DynamicImage),
}

impl Query {
    pub fn text(text: impl Into<String>) -> Self {
        Query::Text(text.into())
    }

    pub fn image(image: DynamicImage) -> Self {
        Query::Image(image)
    }

    /// Decodes an uploaded image (any format the `image` crate recognizes).
    pub fn from_image_bytes(bytes: &[u8]) -> ScoutResult<Self> {
        if bytes.is_empty() {
            return Err(ScoutError::EmptyQuery);
        }
        image::load_from_memory(bytes)
            .map(Query::Image)
            .map_err(|e| ScoutError::InvalidQuery(format!("Undecodable query image: {}", e)))
    }

    /// Short label for logs and response envelopes.
    pub fn describe(&self) -> String {
        match self {
            Query::Text(text) => text.clone(),
            Query::Image(_) => "[image]".to_string(),
        }
    }
}

/// One ranked corpus member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    /// Position of the item in the index.
    pub position: usize,
    #[serde(flatten)]
    pub item: CorpusItem,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub score: f32,
}

/// Summary of the loaded index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub vector_count: usize,
    pub dimensions: usize,
    pub embedder: String,
    pub skipped_items: usize,
}

/// Owns a loaded index and the embedder used to encode queries.
///
/// Construct it once and share it; search calls take `&self` and never mutate,
/// so an `Arc<SimilaritySearcher>` can serve concurrent callers without locks.
#[derive(Clone)]
pub struct SimilaritySearcher {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
}

impl std::fmt::Debug for SimilaritySearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilaritySearcher")
            .field("index", &self.index)
            .field("embedder", &self.embedder.name())
            .finish()
    }
}

impl SimilaritySearcher {
    /// Loads the index in `index_dir` (blocking) and pairs it with `embedder`.
    pub fn open(index_dir: &Path, embedder: Arc<dyn Embedder>) -> ScoutResult<Self> {
        let index = VectorIndex::load(index_dir)?;
        Self::new(index, embedder)
    }

    pub fn new(index: VectorIndex, embedder: Arc<dyn Embedder>) -> ScoutResult<Self> {
        if embedder.dimensions() != index.dimensions() {
            return Err(ScoutError::Configuration(format!(
                "Embedder {} produces {}-dimensional vectors but the index holds {}",
                embedder.name(),
                embedder.dimensions(),
                index.dimensions()
            )));
        }
        if embedder.name() != index.manifest().embedder {
            warn!(
                index_embedder = %index.manifest().embedder,
                query_embedder = embedder.name(),
                "Query embedder differs from the one the index was built with"
            );
        }
        Ok(SimilaritySearcher {
            index: Arc::new(index),
            embedder,
        })
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn stats(&self) -> IndexStats {
        let manifest = self.index.manifest();
        IndexStats {
            vector_count: self.index.len(),
            dimensions: self.index.dimensions(),
            embedder: manifest.embedder.clone(),
            skipped_items: manifest.failures.len(),
        }
    }

    /// Returns the `k` corpus items most similar to `query`.
    ///
    /// Blank text is rejected before the embedder is called. `k == 0` returns
    /// an empty list without embedding anything; `k` above the corpus size is
    /// clamped.
    pub fn search(&self, query: &Query, k: usize) -> ScoutResult<Vec<SearchHit>> {
        if let Query::Text(text) = query {
            if text.trim().is_empty() {
                return Err(ScoutError::EmptyQuery);
            }
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let vector = match query {
            Query::Text(text) => self.embedder.embed_text(text)?,
            Query::Image(image) => self.embedder.embed_image(image)?,
        };
        let hits = self.search_vector(&vector, k)?;
        debug!(
            query = %query.describe(),
            k,
            hits = hits.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Search completed"
        );
        Ok(hits)
    }

    /// Ranks a caller-supplied query vector against the index.
    pub fn search_vector(&self, vector: &Embedding, k: usize) -> ScoutResult<Vec<SearchHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        vector.ensure_dimensions(self.index.dimensions())?;
        let unit = vector
            .normalized()
            .map_err(|e| ScoutError::InvalidQuery(format!("Query {}", e)))?;

        let ranked = self.index.ranker().rank(unit.view(), k)?;
        ranked
            .into_iter()
            .map(|scored| {
                let item = self.index.item(scored.position).ok_or_else(|| {
                    ScoutError::InconsistentIndex(format!("No metadata for position {}", scored.position))
                })?;
                Ok(SearchHit {
                    position: scored.position,
                    item: item.clone(),
                    score: scored.score,
                })
            })
            .collect()
    }
}
