use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::mem::size_of;
use std::path::Path;

use bytemuck::{Pod, Zeroable};
use memmap2::Mmap;
use ndarray::Array2;
use tracing::debug;

use crate::error::{ScoutError, ScoutResult};

const CURRENT_VERSION: u16 = 1;
const VECTOR_FILE_MAGIC: &[u8; 6] = b"SCTVEC";

/// Header of the flat vector table file. 32 bytes, no padding, followed by
/// `count * dimensions` native-endian `f32` values in row-major order.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
pub(crate) struct VectorTableHeader {
    magic: [u8; 6],
    version: u16,
    dimensions: u32,
    reserved0: [u8; 4],
    count: u64,
    reserved1: [u8; 8],
}

impl VectorTableHeader {
    pub(crate) const SIZE: usize = size_of::<Self>();

    pub(crate) fn new(dimensions: u32, count: u64) -> Self {
        Self {
            magic: *VECTOR_FILE_MAGIC,
            version: CURRENT_VERSION,
            dimensions,
            reserved0: [0; 4],
            count,
            reserved1: [0; 8],
        }
    }

    pub(crate) fn from_bytes(bytes: &[u8]) -> ScoutResult<Self> {
        if bytes.len() < Self::SIZE {
            return Err(ScoutError::InconsistentIndex("Vector table header is truncated".into()));
        }
        let header: Self = bytemuck::pod_read_unaligned(&bytes[..Self::SIZE]);
        if &header.magic != VECTOR_FILE_MAGIC {
            return Err(ScoutError::InconsistentIndex("Invalid vector table magic number".into()));
        }
        if header.version > CURRENT_VERSION {
            return Err(ScoutError::InconsistentIndex(format!(
                "Unsupported vector table version: {} (expected <= {})",
                header.version, CURRENT_VERSION
            )));
        }
        Ok(header)
    }

    pub(crate) fn dimensions(&self) -> usize {
        self.dimensions as usize
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }

    /// Total file size this header describes, or `None` on overflow.
    pub(crate) fn expected_file_len(&self) -> Option<u64> {
        self.count
            .checked_mul(self.dimensions as u64)?
            .checked_mul(size_of::<f32>() as u64)?
            .checked_add(Self::SIZE as u64)
    }
}

/// Writes `rows` (row-major, `dimensions` values per row) to `path` and fsyncs it.
pub(crate) fn write_vector_table(path: &Path, dimensions: usize, rows: &[f32]) -> ScoutResult<()> {
    if dimensions == 0 || rows.len() % dimensions != 0 {
        return Err(ScoutError::Serialization(format!(
            "{} values do not form rows of {} dimensions",
            rows.len(),
            dimensions
        )));
    }
    let dimensions_u32 = u32::try_from(dimensions)
        .map_err(|_| ScoutError::Serialization(format!("Dimensionality {} does not fit the table header", dimensions)))?;
    let count = (rows.len() / dimensions) as u64;
    let header = VectorTableHeader::new(dimensions_u32, count);

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| ScoutError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytemuck::bytes_of(&header)).map_err(|e| ScoutError::io(path, e))?;
    writer.write_all(bytemuck::cast_slice(rows)).map_err(|e| ScoutError::io(path, e))?;
    writer.flush().map_err(|e| ScoutError::io(path, e))?;
    writer.get_ref().sync_all().map_err(|e| ScoutError::io(path, e))?;

    debug!(path = ?path, count, dimensions, "Wrote vector table");
    Ok(())
}

/// Maps the vector table at `path` and copies it into an owned `(count, dimensions)` matrix.
pub(crate) fn read_vector_table(path: &Path) -> ScoutResult<Array2<f32>> {
    let file = File::open(path).map_err(|e| ScoutError::io(path, e))?;
    let file_len = file.metadata().map_err(|e| ScoutError::io(path, e))?.len();
    if file_len < VectorTableHeader::SIZE as u64 {
        return Err(ScoutError::InconsistentIndex(format!(
            "Vector table {:?} is {} bytes, shorter than its header",
            path, file_len
        )));
    }

    // Safe as long as nothing truncates the file while it is mapped; the builder
    // never writes into a live index directory, it swaps a new one in.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| ScoutError::io(path, e))?;
    let header = VectorTableHeader::from_bytes(&mmap)?;

    if header.dimensions() == 0 {
        return Err(ScoutError::InconsistentIndex("Vector table declares zero dimensions".into()));
    }
    let expected_len = header.expected_file_len().ok_or_else(|| {
        ScoutError::InconsistentIndex("Vector table header describes an impossible size".into())
    })?;
    if expected_len != file_len {
        return Err(ScoutError::InconsistentIndex(format!(
            "Vector table {:?} holds {} bytes but its header describes {} vectors of {} dimensions ({} bytes)",
            path,
            file_len,
            header.count(),
            header.dimensions(),
            expected_len
        )));
    }

    let values: Vec<f32> = bytemuck::pod_collect_to_vec(&mmap[VectorTableHeader::SIZE..]);
    let count = header.count() as usize;
    Array2::from_shape_vec((count, header.dimensions()), values)
        .map_err(|e| ScoutError::InconsistentIndex(format!("Vector table shape error: {}", e)))
}
