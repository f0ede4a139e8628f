//! Per-epoch cache and dataset size schedule.
//!
//! Both curves start from a base constant, grow linearly with the epoch and
//! are then rounded down to the nearest size whose element (respectively
//! row) count is prime, which breaks up periodic access patterns in the
//! mixing step.

use crate::miller_rabin::is_prime;
use crate::{
    CACHE_BYTES_GROWTH, CACHE_BYTES_INIT, DATASET_BYTES_GROWTH, DATASET_BYTES_INIT, EPOCH_LENGTH,
    HASH_BYTES, MIX_BYTES,
};

/// The epoch a block number belongs to.
pub fn epoch(block_number: u64) -> usize {
    (block_number / EPOCH_LENGTH) as usize
}

/// Size in bytes of the verification cache for the given block number.
pub fn get_cache_size(block_number: u64) -> usize {
    let mut sz = CACHE_BYTES_INIT + CACHE_BYTES_GROWTH * epoch(block_number);
    sz -= HASH_BYTES;
    while !is_prime((sz / HASH_BYTES) as u64) {
        sz -= 2 * HASH_BYTES;
    }
    sz
}

/// Size in bytes of the full mining dataset for the given block number.
pub fn get_full_size(block_number: u64) -> usize {
    let mut sz = DATASET_BYTES_INIT + DATASET_BYTES_GROWTH * epoch(block_number);
    sz -= MIX_BYTES;
    while !is_prime((sz / MIX_BYTES) as u64) {
        sz -= 2 * MIX_BYTES;
    }
    sz
}
