//! Transport-neutral request and response shapes for a query surface.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::{ScoutError, ScoutResult};
use crate::searcher::{Query, SearchHit, SimilaritySearcher};

pub const DEFAULT_TOP_K: usize = 5;

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Text XOR image, plus how many hits to return.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    #[serde(default)]
    pub text: Option<String>,
    /// Raw encoded image bytes (PNG, JPEG, ...).
    #[serde(default)]
    pub image: Option<Vec<u8>>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl SearchRequest {
    pub fn text(text: impl Into<String>, top_k: usize) -> Self {
        SearchRequest { text: Some(text.into()), image: None, top_k }
    }

    pub fn image(bytes: Vec<u8>, top_k: usize) -> Self {
        SearchRequest { text: None, image: Some(bytes), top_k }
    }

    /// Resolves the request into a [`Query`]. Blank text and empty image
    /// payloads count as absent; exactly one of the two must remain.
    pub fn to_query(&self) -> ScoutResult<Query> {
        let text = self.text.as_deref().filter(|t| !t.trim().is_empty());
        let image = self.image.as_deref().filter(|b| !b.is_empty());
        match (text, image) {
            (Some(text), None) => Ok(Query::text(text)),
            (None, Some(bytes)) => Query::from_image_bytes(bytes),
            (Some(_), Some(_)) => Err(ScoutError::InvalidQuery(
                "Provide either text or an image, not both".to_string(),
            )),
            (None, None) => Err(ScoutError::EmptyQuery),
        }
    }
}

/// Ranked hits plus the echoed query and how long the search took.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchHit>,
    pub latency_ms: f64,
}

impl SimilaritySearcher {
    /// Validates a request envelope, runs the search and wraps the hits.
    pub fn handle(&self, request: &SearchRequest) -> ScoutResult<SearchResponse> {
        let query = request.to_query()?;
        let started = Instant::now();
        let results = self.search(&query, request.top_k)?;
        let latency_ms = (started.elapsed().as_secs_f64() * 1000.0 * 100.0).round() / 100.0;
        Ok(SearchResponse {
            query: query.describe(),
            results,
            latency_ms,
        })
    }
}
