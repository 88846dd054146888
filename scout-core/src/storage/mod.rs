//! On-disk layout of a persisted index.
//!
//! An index directory holds exactly three files:
//! `vectors.bin` (flat vector table), `metadata.json` (metadata table keyed by the
//! same positions) and `manifest.json` (build record). A directory is only ever
//! written as a whole: the builder fills a sibling staging directory and swaps it in.

pub mod manifest;
pub(crate) mod vector_table;

pub use manifest::{BuildParameters, IndexedItem, ItemFailure, Manifest, FORMAT_VERSION};

use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ScoutError, ScoutResult};

const VECTORS_FILE: &str = "vectors.bin";
const METADATA_FILE: &str = "metadata.json";
const MANIFEST_FILE: &str = "manifest.json";
const STAGING_SUFFIX: &str = ".staging";
const RETIRED_SUFFIX: &str = ".retired";

/// File locations for one index directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLayout {
    dir: PathBuf,
}

fn sibling_with_suffix(dir: &Path, suffix: &str) -> PathBuf {
    let mut file_name: OsString = dir.file_name().unwrap_or_default().to_os_string();
    file_name.push(suffix);
    dir.with_file_name(file_name)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> ScoutResult<()> {
    let file = File::create(path).map_err(|e| ScoutError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| ScoutError::Serialization(format!("Failed to serialize {:?}: {}", path, e)))?;
    writer.flush().map_err(|e| ScoutError::io(path, e))?;
    writer.get_ref().sync_all().map_err(|e| ScoutError::io(path, e))?;
    Ok(())
}

fn is_empty_dir(dir: &Path) -> ScoutResult<bool> {
    let mut entries = fs::read_dir(dir).map_err(|e| ScoutError::io(dir, e))?;
    Ok(entries.next().is_none())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> ScoutResult<T> {
    let file = File::open(path).map_err(|e| ScoutError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| ScoutError::Deserialization(format!("Failed to deserialize {:?}: {}", path, e)))
}

impl IndexLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        IndexLayout { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn vectors_path(&self) -> PathBuf {
        self.dir.join(VECTORS_FILE)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.dir.join(METADATA_FILE)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    fn staging_dir(&self) -> PathBuf {
        sibling_with_suffix(&self.dir, STAGING_SUFFIX)
    }

    fn retired_dir(&self) -> PathBuf {
        sibling_with_suffix(&self.dir, RETIRED_SUFFIX)
    }

    /// An index is considered present once its manifest exists.
    pub fn exists(&self) -> bool {
        self.manifest_path().is_file()
    }

    pub fn read_manifest(&self) -> ScoutResult<Manifest> {
        read_json(&self.manifest_path())
    }

    pub fn read_metadata(&self) -> ScoutResult<Vec<IndexedItem>> {
        read_json(&self.metadata_path())
    }

    pub(crate) fn read_vectors(&self) -> ScoutResult<Array2<f32>> {
        vector_table::read_vector_table(&self.vectors_path())
    }

    /// Moves `<dir>.retired` back into place when a swap was interrupted after
    /// the live directory was renamed away but before its replacement landed.
    /// Returns whether a retired index was restored.
    pub(crate) fn recover_interrupted_swap(&self) -> ScoutResult<bool> {
        if self.dir.exists() {
            return Ok(false);
        }
        let retired = IndexLayout::new(self.retired_dir());
        if !retired.exists() {
            return Ok(false);
        }
        warn!(path = ?self.dir, retired = ?retired.dir, "Index swap was interrupted, restoring previous index");
        fs::rename(&retired.dir, &self.dir).map_err(|e| ScoutError::io(&retired.dir, e))?;
        Ok(true)
    }

    /// Writes a complete index into a staging directory, then replaces the
    /// current index directory with it.
    pub(crate) fn write_atomic(
        &self,
        dimensions: usize,
        rows: &[f32],
        items: &[IndexedItem],
        manifest: &Manifest,
    ) -> ScoutResult<()> {
        self.recover_interrupted_swap()?;
        if self.dir.exists() && !self.exists() && !is_empty_dir(&self.dir)? {
            return Err(ScoutError::Configuration(format!(
                "Refusing to replace {:?}: it exists but holds no index manifest",
                self.dir
            )));
        }

        let staging = IndexLayout::new(self.staging_dir());
        if staging.dir.exists() {
            debug!(path = ?staging.dir, "Removing leftover staging directory");
            fs::remove_dir_all(&staging.dir).map_err(|e| ScoutError::io(&staging.dir, e))?;
        }
        fs::create_dir_all(&staging.dir).map_err(|e| ScoutError::io(&staging.dir, e))?;

        vector_table::write_vector_table(&staging.vectors_path(), dimensions, rows)?;
        write_json(&staging.metadata_path(), items)?;
        // Manifest last: a directory without one is never mistaken for an index.
        write_json(&staging.manifest_path(), manifest)?;

        self.commit(&staging.dir)
    }

    fn commit(&self, staging_dir: &Path) -> ScoutResult<()> {
        let retired = self.retired_dir();
        if retired.exists() {
            // A complete retired index with no live one was restored before staging.
            warn!(path = ?retired, "Removing stale retired index directory");
            fs::remove_dir_all(&retired).map_err(|e| ScoutError::io(&retired, e))?;
        }

        let had_previous = self.dir.exists();
        if had_previous {
            fs::rename(&self.dir, &retired).map_err(|e| ScoutError::io(&self.dir, e))?;
        }

        if let Err(e) = fs::rename(staging_dir, &self.dir) {
            if had_previous {
                if let Err(restore_err) = fs::rename(&retired, &self.dir) {
                    warn!(path = ?self.dir, error = %restore_err, "Failed to restore previous index after aborted swap");
                }
            }
            return Err(ScoutError::io(staging_dir, e));
        }

        if let Some(parent) = self.dir.parent().filter(|p| !p.as_os_str().is_empty()) {
            // Persist the renames; not every platform can fsync a directory.
            if let Err(e) = File::open(parent).and_then(|d| d.sync_all()) {
                debug!(path = ?parent, error = %e, "Could not fsync index parent directory");
            }
        }

        if had_previous {
            if let Err(e) = fs::remove_dir_all(&retired) {
                warn!(path = ?retired, error = %e, "Failed to remove retired index directory");
            }
        }

        info!(path = ?self.dir, replaced = had_previous, "Committed index directory");
        Ok(())
    }
}
