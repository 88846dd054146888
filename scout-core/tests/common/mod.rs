#![allow(dead_code)]

use image::{DynamicImage, Rgb, RgbImage};
use scout_core::{CorpusItem, Embedder, Embedding, ScoutError, ScoutResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic 3-d embedder: an image maps to the RGB value of its top-left
/// pixel, text maps through a fixed phrase table. Counts every call.
#[derive(Debug, Default)]
pub struct PixelEmbedder {
    phrases: HashMap<String, Vec<f32>>,
    pub text_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
}

impl PixelEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_phrase(mut self, phrase: &str, vector: [f32; 3]) -> Self {
        self.phrases.insert(phrase.to_string(), vector.to_vec());
        self
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }
}

impl Embedder for PixelEmbedder {
    fn embed_text(&self, text: &str) -> ScoutResult<Embedding> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        self.phrases
            .get(text)
            .map(|v| Embedding::from(v.clone()))
            .ok_or_else(|| ScoutError::Embedding(format!("unknown phrase {:?}", text)))
    }

    fn embed_image(&self, image: &DynamicImage) -> ScoutResult<Embedding> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        let [r, g, b] = image.to_rgb8().get_pixel(0, 0).0;
        Ok(Embedding::from(vec![r as f32, g as f32, b as f32]))
    }

    fn dimensions(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "pixel-rgb"
    }
}

/// Always returns vectors of the wrong length.
#[derive(Debug)]
pub struct WrongDimsEmbedder;

impl Embedder for WrongDimsEmbedder {
    fn embed_text(&self, _text: &str) -> ScoutResult<Embedding> {
        Ok(Embedding::from(vec![1.0, 0.0]))
    }

    fn embed_image(&self, _image: &DynamicImage) -> ScoutResult<Embedding> {
        Ok(Embedding::from(vec![1.0, 0.0]))
    }

    fn dimensions(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "pixel-rgb"
    }
}

pub fn solid_image(color: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb(color)))
}

pub fn write_png(path: &Path, color: [u8; 3]) {
    solid_image(color).save(path).unwrap();
}

pub fn write_corrupt(path: &Path) {
    fs::write(path, b"\x89PNG\r\n\x1a\nthis is not really a png").unwrap();
}

/// Writes one PNG per colour under `dir/images` and returns the matching corpus.
pub fn write_corpus(dir: &Path, colors: &[[u8; 3]]) -> Vec<CorpusItem> {
    let images = dir.join("images");
    fs::create_dir_all(&images).unwrap();
    colors
        .iter()
        .enumerate()
        .map(|(i, color)| {
            let path = images.join(format!("tile_{}.png", i));
            write_png(&path, *color);
            CorpusItem::new(100 + i as u64, path, Some(label_for(i)))
        })
        .collect()
}

pub fn label_for(i: usize) -> &'static str {
    ["Forest", "River", "Highway", "SeaLake", "Pasture"][i % 5]
}

/// Ten distinct, non-black colours.
pub fn ten_colors() -> Vec<[u8; 3]> {
    vec![
        [255, 0, 0],
        [0, 255, 0],
        [0, 0, 255],
        [200, 150, 0],
        [10, 200, 90],
        [90, 10, 200],
        [120, 120, 120],
        [30, 60, 250],
        [250, 60, 30],
        [5, 5, 100],
    ]
}

pub fn index_dir(dir: &Path) -> PathBuf {
    dir.join("index")
}

pub fn read_index_bytes(index_dir: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = fs::read_dir(index_dir)
        .unwrap()
        .map(|entry| {
            let entry = entry.unwrap();
            (
                entry.file_name().to_string_lossy().into_owned(),
                fs::read(entry.path()).unwrap(),
            )
        })
        .collect();
    files.sort();
    files
}
