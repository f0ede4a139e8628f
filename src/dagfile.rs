//! Byte layout contract for persisted datasets.
//!
//! A dump begins with an eight byte little-endian magic number followed by
//! the raw element array in index order, words little-endian. The actual
//! file or mmap handling belongs to the caller; this module only encodes
//! the layout and validates candidate bytes before they are trusted.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::Error;

/// Magic number at the start of every persisted dataset.
pub const DAG_MAGIC: u64 = 0xfee1_dead_badd_cafe;

/// Bytes occupied by the magic header.
pub const DAG_HEADER_BYTES: usize = 8;

/// Frame a generated dataset for persistence.
pub fn encode_dag_file(dataset: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(DAG_HEADER_BYTES + dataset.len());
    let mut magic = [0u8; DAG_HEADER_BYTES];
    LittleEndian::write_u64(&mut magic, DAG_MAGIC);
    out.extend_from_slice(&magic);
    out.extend_from_slice(dataset);
    out
}

/// Validate a persisted dataset and return the element array.
///
/// Rejects bytes whose magic does not match or whose payload differs from
/// the epoch's expected dataset size; callers fall back to regeneration.
pub fn decode_dag_file(bytes: &[u8], expected_full_size: usize) -> Result<&[u8], Error> {
    if bytes.len() < DAG_HEADER_BYTES {
        return Err(Error::DagSizeMismatch {
            found: bytes.len().saturating_sub(DAG_HEADER_BYTES),
            expected: expected_full_size,
        });
    }
    let magic = LittleEndian::read_u64(bytes);
    if magic != DAG_MAGIC {
        return Err(Error::BadDagMagic {
            found: magic,
            expected: DAG_MAGIC,
        });
    }
    let payload = &bytes[DAG_HEADER_BYTES..];
    if payload.len() != expected_full_size {
        return Err(Error::DagSizeMismatch {
            found: payload.len(),
            expected: expected_full_size,
        });
    }
    Ok(payload)
}
