//! Colour-histogram image embedder.

use image::DynamicImage;

use crate::embedding::Embedder;
use crate::error::{ScoutError, ScoutResult};
use crate::vector::Embedding;

const BINS_PER_CHANNEL: usize = 8;

/// Joint RGB histogram with 8 bins per channel (8 × 8 × 8 = 512 components),
/// normalized to unit mass.
///
/// Tiles of the same land-cover class share a colour signature (water, crops,
/// forest), which makes this a usable, model-free baseline for image queries.
/// It has no notion of language, so text queries are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorHistogramEmbedder;

impl ColorHistogramEmbedder {
    pub const NAME: &'static str = "color-histogram-rgb-8x8x8";

    pub fn new() -> Self {
        ColorHistogramEmbedder
    }

    #[inline]
    fn bin(channel: u8) -> usize {
        channel as usize * BINS_PER_CHANNEL / 256
    }
}

impl Embedder for ColorHistogramEmbedder {
    fn embed_text(&self, _text: &str) -> ScoutResult<Embedding> {
        Err(ScoutError::Embedding(format!(
            "{} cannot embed text queries",
            Self::NAME
        )))
    }

    fn embed_image(&self, image: &DynamicImage) -> ScoutResult<Embedding> {
        let rgb = image.to_rgb8();
        let pixel_count = rgb.width() as usize * rgb.height() as usize;
        if pixel_count == 0 {
            return Err(ScoutError::Embedding("image has no pixels".to_string()));
        }

        let mut histogram = vec![0f32; self.dimensions()];
        for pixel in rgb.pixels() {
            let [r, g, b] = pixel.0;
            let slot = (Self::bin(r) * BINS_PER_CHANNEL + Self::bin(g)) * BINS_PER_CHANNEL + Self::bin(b);
            histogram[slot] += 1.0;
        }
        let total = pixel_count as f32;
        histogram.iter_mut().for_each(|count| *count /= total);

        Ok(Embedding::from(histogram))
    }

    fn dimensions(&self) -> usize {
        BINS_PER_CHANNEL * BINS_PER_CHANNEL * BINS_PER_CHANNEL
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}
