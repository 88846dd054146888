//! Corpus items and the on-disk ingest format they are read from.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ScoutError, ScoutResult};

/// One source image of the corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusItem {
    pub id: u64,
    pub path: PathBuf,
    #[serde(default)]
    pub label: Option<String>,
}

impl CorpusItem {
    pub fn new(id: u64, path: impl Into<PathBuf>, label: Option<&str>) -> Self {
        CorpusItem {
            id,
            path: path.into(),
            label: label.map(str::to_string),
        }
    }
}

/// Stable digest of an ordered item list. Two corpora with the same items in the
/// same order produce the same fingerprint; any change to an id, path, label or
/// the order changes it.
pub fn fingerprint(items: &[CorpusItem]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(items.len() as u64).to_le_bytes());
    for item in items {
        hasher.update(&item.id.to_le_bytes());
        let path = item.path.to_string_lossy();
        hasher.update(&(path.len() as u64).to_le_bytes());
        hasher.update(path.as_bytes());
        match &item.label {
            Some(label) => {
                hasher.update(&[1u8]);
                hasher.update(&(label.len() as u64).to_le_bytes());
                hasher.update(label.as_bytes());
            }
            None => {
                hasher.update(&[0u8]);
            }
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// First `limit` items of the corpus, or all of them.
pub fn truncate(items: &[CorpusItem], limit: Option<usize>) -> &[CorpusItem] {
    match limit {
        Some(n) if n < items.len() => &items[..n],
        _ => items,
    }
}

// One row of `metadata.json` as written by the ingest step.
#[derive(Deserialize)]
struct MetadataRecord {
    id: u64,
    filename: String,
    #[serde(default)]
    class_name: Option<String>,
    #[serde(default)]
    label_int: Option<i64>,
}

/// Reads a corpus laid out as `<data_dir>/metadata.json` plus `<data_dir>/images/<filename>`.
#[derive(Debug, Clone)]
pub struct MetadataFileSource {
    data_dir: PathBuf,
}

impl MetadataFileSource {
    pub const METADATA_FILE: &'static str = "metadata.json";
    pub const IMAGES_DIR: &'static str = "images";

    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        MetadataFileSource { data_dir: data_dir.into() }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join(Self::METADATA_FILE)
    }

    /// Loads the ordered item list. Record order in the file is corpus order.
    pub fn load(&self) -> ScoutResult<Vec<CorpusItem>> {
        let metadata_path = self.metadata_path();
        if !metadata_path.is_file() {
            return Err(ScoutError::CorpusSource(format!(
                "Metadata file not found: {:?}",
                metadata_path
            )));
        }
        let images_dir = self.data_dir.join(Self::IMAGES_DIR);
        if !images_dir.is_dir() {
            return Err(ScoutError::CorpusSource(format!(
                "Images directory not found: {:?}",
                images_dir
            )));
        }

        let file = File::open(&metadata_path).map_err(|e| ScoutError::io(&metadata_path, e))?;
        let records: Vec<MetadataRecord> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ScoutError::CorpusSource(format!("Failed to parse {:?}: {}", metadata_path, e)))?;

        let mut seen = HashSet::with_capacity(records.len());
        let mut items = Vec::with_capacity(records.len());
        for record in records {
            if !seen.insert(record.id) {
                return Err(ScoutError::CorpusSource(format!(
                    "Duplicate corpus id {} in {:?}",
                    record.id, metadata_path
                )));
            }
            let label = record
                .class_name
                .or_else(|| record.label_int.map(|l| l.to_string()));
            items.push(CorpusItem {
                id: record.id,
                path: images_dir.join(&record.filename),
                label,
            });
        }

        debug!(path = ?metadata_path, "Parsed corpus metadata");
        info!(count = items.len(), data_dir = ?self.data_dir, "Loaded corpus");
        Ok(items)
    }
}
