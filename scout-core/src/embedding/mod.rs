//! The embedding capability consumed by the builder and the searcher.

pub mod histogram;

pub use histogram::ColorHistogramEmbedder;

use image::DynamicImage;

use crate::error::ScoutResult;
use crate::vector::Embedding;

/// Maps text and images into a shared vector space.
///
/// Implementations must be deterministic for a given model version and must
/// return vectors of exactly [`Embedder::dimensions`] components. Failures are
/// reported as `ScoutError::Embedding`; the core never retries them.
pub trait Embedder: Send + Sync {
    /// Embeds a text phrase.
    fn embed_text(&self, text: &str) -> ScoutResult<Embedding>;

    /// Embeds one decoded image.
    fn embed_image(&self, image: &DynamicImage) -> ScoutResult<Embedding>;

    /// Embeds several images at once.
    ///
    /// The default implementation calls `embed_image` sequentially.
    /// Override this for encoders that batch on an accelerator.
    fn embed_image_batch(&self, images: &[DynamicImage]) -> ScoutResult<Vec<Embedding>> {
        images.iter().map(|image| self.embed_image(image)).collect()
    }

    /// Number of components in every vector this embedder produces.
    fn dimensions(&self) -> usize;

    /// Model identifier, recorded in the index manifest.
    fn name(&self) -> &str {
        "unknown"
    }
}
