//! Turns a corpus of images into a persisted, normalized vector index.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::config::{BuildConfig, FailurePolicy};
use crate::corpus::{self, CorpusItem};
use crate::embedding::Embedder;
use crate::error::{ScoutError, ScoutResult};
use crate::storage::{BuildParameters, IndexLayout, IndexedItem, ItemFailure, Manifest, FORMAT_VERSION};

/// Whether a build run wrote a new index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    /// A new index was computed and swapped in.
    Built,
    /// The stored index already covered the corpus and was left untouched.
    Skipped,
}

/// Result of [`EmbeddingBuilder::build`].
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub status: BuildStatus,
    /// Manifest of the index now on disk.
    pub manifest: Manifest,
    /// Items skipped in lenient mode. For a skipped build these are the
    /// failures recorded when the stored index was built.
    pub failures: Vec<ItemFailure>,
}

impl BuildOutcome {
    pub fn is_skipped(&self) -> bool {
        self.status == BuildStatus::Skipped
    }
}

/// Builds the vector index for one index directory.
pub struct EmbeddingBuilder {
    layout: IndexLayout,
    embedder: Arc<dyn Embedder>,
    config: BuildConfig,
}

impl EmbeddingBuilder {
    pub fn new(index_dir: impl Into<PathBuf>, embedder: Arc<dyn Embedder>, config: BuildConfig) -> Self {
        EmbeddingBuilder {
            layout: IndexLayout::new(index_dir),
            embedder,
            config,
        }
    }

    pub fn index_dir(&self) -> &Path {
        self.layout.dir()
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Builds (or skips building) the index for `corpus`.
    ///
    /// Must not run concurrently with a searcher loading the same directory.
    pub fn build(&self, corpus: &[CorpusItem]) -> ScoutResult<BuildOutcome> {
        self.config.validate()?;
        if corpus.is_empty() {
            return Err(ScoutError::EmptyCorpus);
        }
        let dimensions = self.embedder.dimensions();
        if dimensions == 0 {
            return Err(ScoutError::Configuration(format!(
                "Embedder {} reports zero dimensions",
                self.embedder.name()
            )));
        }

        let items = corpus::truncate(corpus, self.config.limit);
        let fingerprint = corpus::fingerprint(items);

        self.layout.recover_interrupted_swap()?;
        if let Some(existing) = self.reusable_manifest(&fingerprint, dimensions, corpus.len()) {
            info!(
                path = ?self.layout.dir(),
                vectors = existing.vector_count,
                "Index already covers the corpus, skipping build (use force to rebuild)"
            );
            return Ok(BuildOutcome {
                status: BuildStatus::Skipped,
                failures: existing.failures.clone(),
                manifest: existing,
            });
        }

        info!(
            path = ?self.layout.dir(),
            items = items.len(),
            corpus_size = corpus.len(),
            embedder = self.embedder.name(),
            policy = ?self.config.failure_policy,
            "Building vector index"
        );
        let started = Instant::now();

        let mut rows: Vec<f32> = Vec::with_capacity(items.len() * dimensions);
        let mut indexed: Vec<IndexedItem> = Vec::with_capacity(items.len());
        let mut failures: Vec<ItemFailure> = Vec::new();

        for (batch_number, batch) in items.chunks(self.config.batch_size).enumerate() {
            let batch_start = batch_number * self.config.batch_size;

            let mut images: Vec<DynamicImage> = Vec::with_capacity(batch.len());
            let mut image_positions: Vec<usize> = Vec::with_capacity(batch.len());
            for (offset, item) in batch.iter().enumerate() {
                let corpus_position = batch_start + offset;
                match image::open(&item.path) {
                    Ok(decoded) => {
                        images.push(decoded);
                        image_positions.push(corpus_position);
                    }
                    Err(e) => self.record_failure(&mut failures, corpus_position, item, e.to_string())?,
                }
            }
            if images.is_empty() {
                continue;
            }

            let embeddings = self.embedder.embed_image_batch(&images)?;
            if embeddings.len() != images.len() {
                return Err(ScoutError::Embedding(format!(
                    "Embedder returned {} vectors for {} images",
                    embeddings.len(),
                    images.len()
                )));
            }

            for (corpus_position, embedding) in image_positions.into_iter().zip(embeddings) {
                let item = &items[corpus_position];
                if embedding.len() != dimensions {
                    return Err(ScoutError::Embedding(format!(
                        "Embedder {} returned {} dimensions for item {}, expected {}",
                        self.embedder.name(),
                        embedding.len(),
                        item.id,
                        dimensions
                    )));
                }
                match embedding.normalized() {
                    Ok(unit) => {
                        rows.extend(unit.iter().copied());
                        indexed.push(IndexedItem {
                            position: indexed.len(),
                            item: item.clone(),
                        });
                    }
                    Err(e) => self.record_failure(&mut failures, corpus_position, item, e.to_string())?,
                }
            }
            debug!(batch = batch_number, embedded = indexed.len(), failed = failures.len(), "Embedded batch");
        }

        // Decode failures are recorded before embedding failures within a batch.
        failures.sort_by_key(|failure| failure.corpus_position);
        if indexed.is_empty() {
            return Err(ScoutError::NoEmbeddableItems { attempted: items.len() });
        }

        let manifest = Manifest {
            format_version: FORMAT_VERSION,
            vector_count: indexed.len(),
            source_corpus_size: corpus.len(),
            dimensions,
            embedder: self.embedder.name().to_string(),
            corpus_fingerprint: fingerprint,
            parameters: BuildParameters {
                limit: self.config.limit,
                failure_policy: self.config.failure_policy,
            },
            failures: failures.clone(),
        };
        self.layout.write_atomic(dimensions, &rows, &indexed, &manifest)?;

        info!(
            path = ?self.layout.dir(),
            vectors = manifest.vector_count,
            failed = failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Vector index built"
        );
        Ok(BuildOutcome {
            status: BuildStatus::Built,
            manifest,
            failures,
        })
    }

    // The stored manifest, if it exists, is readable and describes exactly this run.
    fn reusable_manifest(&self, fingerprint: &str, dimensions: usize, corpus_size: usize) -> Option<Manifest> {
        if self.config.force {
            info!(path = ?self.layout.dir(), "Forced rebuild requested");
            return None;
        }
        if !self.layout.exists() {
            return None;
        }
        let manifest = match self.layout.read_manifest() {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!(path = ?self.layout.dir(), error = %e, "Stored index manifest is unreadable, rebuilding");
                return None;
            }
        };
        let covers = manifest.format_version == FORMAT_VERSION
            && manifest.corpus_fingerprint == fingerprint
            && manifest.dimensions == dimensions
            && manifest.embedder == self.embedder.name()
            && manifest.source_corpus_size == corpus_size
            && manifest.parameters.limit == self.config.limit
            && manifest.parameters.failure_policy == self.config.failure_policy;
        if covers {
            Some(manifest)
        } else {
            warn!(path = ?self.layout.dir(), "Stored index does not match the current corpus or embedder, rebuilding");
            None
        }
    }

    fn record_failure(
        &self,
        failures: &mut Vec<ItemFailure>,
        corpus_position: usize,
        item: &CorpusItem,
        reason: String,
    ) -> ScoutResult<()> {
        match self.config.failure_policy {
            FailurePolicy::Strict => Err(ScoutError::UnreadableItem {
                id: item.id,
                path: item.path.clone(),
                reason,
            }),
            FailurePolicy::Lenient => {
                warn!(id = item.id, path = ?item.path, %reason, "Skipping corpus item");
                failures.push(ItemFailure {
                    corpus_position,
                    id: item.id,
                    path: item.path.clone(),
                    reason,
                });
                Ok(())
            }
        }
    }
}
