use crate::corpus::CorpusItem;
use crate::distance::clamp_similarity;
use crate::error::{ScoutError, ScoutResult};
use crate::storage::{IndexLayout, IndexedItem, Manifest, FORMAT_VERSION};
use crate::vector::UNIT_NORM_TOLERANCE;

use ndarray::{Array2, ArrayView1, ArrayView2};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::path::Path;
use tracing::{debug, info};

/// An index position together with its similarity to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredPosition {
    pub position: usize,
    pub score: f32,
}

/// Turns a unit-length query vector into an ordered list of index positions.
///
/// Results are sorted by descending score; exact ties are ordered by ascending
/// position. `k` larger than the index is clamped, `k == 0` yields nothing.
pub trait Ranker: Send + Sync + std::fmt::Debug {
    fn rank(&self, query: ArrayView1<f32>, k: usize) -> ScoutResult<Vec<ScoredPosition>>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn dimensions(&self) -> usize;
}

// Heap entry. "Greater" means a better hit: higher score, then lower position.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f32,
    position: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.position.cmp(&self.position))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// Exhaustive scan over a dense `(n, d)` matrix of unit vectors.
///
/// Every query costs one matrix-vector product, O(n·d). For corpora in the tens
/// of thousands this beats building any graph or partition structure.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    vectors: Array2<f32>,
}

impl FlatIndex {
    /// Wraps a matrix whose rows are unit-length embeddings.
    pub fn new(vectors: Array2<f32>) -> ScoutResult<Self> {
        if vectors.ncols() == 0 {
            return Err(ScoutError::InconsistentIndex("Vectors have zero dimensions".into()));
        }
        for (position, row) in vectors.rows().into_iter().enumerate() {
            if row.iter().any(|v| !v.is_finite()) {
                return Err(ScoutError::InconsistentIndex(format!(
                    "Vector at position {} contains non-finite values",
                    position
                )));
            }
            let norm = row.dot(&row).sqrt();
            if (norm - 1.0).abs() > UNIT_NORM_TOLERANCE {
                return Err(ScoutError::InconsistentIndex(format!(
                    "Vector at position {} is not unit length (norm {})",
                    position, norm
                )));
            }
        }
        Ok(FlatIndex { vectors })
    }

    pub fn vectors(&self) -> ArrayView2<'_, f32> {
        self.vectors.view()
    }

    pub fn vector(&self, position: usize) -> Option<ArrayView1<'_, f32>> {
        (position < self.vectors.nrows()).then(|| self.vectors.row(position))
    }
}

impl Ranker for FlatIndex {
    fn rank(&self, query: ArrayView1<f32>, k: usize) -> ScoutResult<Vec<ScoredPosition>> {
        if query.len() != self.dimensions() {
            return Err(ScoutError::DimensionMismatch {
                expected: self.dimensions(),
                actual: query.len(),
            });
        }
        let k = k.min(self.len());
        if k == 0 {
            return Ok(Vec::new());
        }

        let scores = self.vectors.dot(&query);

        // Min-heap of the best k seen so far; the root is the weakest kept hit.
        let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::with_capacity(k + 1);
        for (position, &raw) in scores.iter().enumerate() {
            let mut score = clamp_similarity(raw);
            if score == 0.0 {
                score = 0.0; // fold -0.0 so it ties with +0.0
            }
            let candidate = Candidate { score, position };
            if heap.len() < k {
                heap.push(Reverse(candidate));
            } else if let Some(Reverse(weakest)) = heap.peek() {
                if candidate > *weakest {
                    heap.pop();
                    heap.push(Reverse(candidate));
                }
            }
        }

        let mut ranked: Vec<Candidate> = heap.into_iter().map(|Reverse(c)| c).collect();
        ranked.sort_unstable_by(|a, b| b.cmp(a));
        Ok(ranked
            .into_iter()
            .map(|c| ScoredPosition { position: c.position, score: c.score })
            .collect())
    }

    fn len(&self) -> usize {
        self.vectors.nrows()
    }

    fn dimensions(&self) -> usize {
        self.vectors.ncols()
    }
}

/// A persisted index loaded into memory: vectors, the aligned metadata table
/// and the manifest it was built with. Read-only after load.
#[derive(Debug)]
pub struct VectorIndex {
    ranker: FlatIndex,
    items: Vec<IndexedItem>,
    manifest: Manifest,
}

impl VectorIndex {
    /// Loads the index stored in `dir`, failing fast if it is missing, empty or
    /// internally inconsistent.
    pub fn load(dir: &Path) -> ScoutResult<Self> {
        let layout = IndexLayout::new(dir);
        info!(path = ?dir, "Loading vector index");

        layout.recover_interrupted_swap()?;
        if !layout.exists() {
            return Err(ScoutError::IndexMissing(dir.to_path_buf()));
        }
        let manifest = layout
            .read_manifest()
            .map_err(|e| ScoutError::InconsistentIndex(format!("Unreadable manifest: {}", e)))?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(ScoutError::InconsistentIndex(format!(
                "Unsupported index format version {} (expected {})",
                manifest.format_version, FORMAT_VERSION
            )));
        }
        if !layout.vectors_path().is_file() || !layout.metadata_path().is_file() {
            return Err(ScoutError::InconsistentIndex(format!(
                "Index directory {:?} is missing its vector or metadata table",
                dir
            )));
        }

        let vectors = layout.read_vectors()?;
        let items = layout
            .read_metadata()
            .map_err(|e| ScoutError::InconsistentIndex(format!("Unreadable metadata table: {}", e)))?;
        debug!(rows = vectors.nrows(), cols = vectors.ncols(), items = items.len(), "Read index tables");

        if vectors.nrows() != items.len() || items.len() != manifest.vector_count {
            return Err(ScoutError::InconsistentIndex(format!(
                "Vector table has {} rows, metadata table {} rows, manifest records {}",
                vectors.nrows(),
                items.len(),
                manifest.vector_count
            )));
        }
        if vectors.ncols() != manifest.dimensions {
            return Err(ScoutError::InconsistentIndex(format!(
                "Vector table has {} dimensions, manifest records {}",
                vectors.ncols(),
                manifest.dimensions
            )));
        }
        if let Some((i, item)) = items.iter().enumerate().find(|(i, item)| item.position != *i) {
            return Err(ScoutError::InconsistentIndex(format!(
                "Metadata row {} carries position {}",
                i, item.position
            )));
        }
        if items.is_empty() {
            return Err(ScoutError::EmptyIndex);
        }

        let index = Self::from_parts(vectors, items, manifest)?;
        info!(
            count = index.len(),
            dimensions = index.dimensions(),
            embedder = %index.manifest.embedder,
            "Vector index loaded"
        );
        Ok(index)
    }

    /// Assembles an index from already-validated parts.
    pub fn from_parts(vectors: Array2<f32>, items: Vec<IndexedItem>, manifest: Manifest) -> ScoutResult<Self> {
        if vectors.nrows() != items.len() {
            return Err(ScoutError::InconsistentIndex(format!(
                "{} vectors but {} metadata rows",
                vectors.nrows(),
                items.len()
            )));
        }
        if items.is_empty() {
            return Err(ScoutError::EmptyIndex);
        }
        let ranker = FlatIndex::new(vectors)?;
        Ok(VectorIndex { ranker, items, manifest })
    }

    pub fn ranker(&self) -> &dyn Ranker {
        &self.ranker
    }

    pub fn flat(&self) -> &FlatIndex {
        &self.ranker
    }

    pub fn items(&self) -> &[IndexedItem] {
        &self.items
    }

    pub fn item(&self, position: usize) -> Option<&CorpusItem> {
        self.items.get(position).map(|row| &row.item)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.ranker.dimensions()
    }
}
