//! Apache-2 licensed Ethash implementation.
//!
//! The engine has two cooperating code paths that always agree bit-for-bit:
//! a light client keeps only the per-epoch cache and recomputes dataset
//! elements on demand, while a mining client materializes the full dataset
//! once per epoch and reads it directly. See [`LightDAG`] and [`FullDAG`]
//! for the epoch-scoped entry points, or use the free functions below when
//! managing buffers yourself.

// The reference algorithm used is from https://github.com/ethereum/wiki/wiki/Ethash

use sha3::{Digest, Keccak256, Keccak512};

mod miller_rabin;

pub mod cache;
pub mod dag;
pub mod dagfile;
pub mod dataset;
pub mod error;
pub mod hashimoto;
pub mod seed;
pub mod sizes;

pub use cache::make_cache;
pub use dag::{FullDAG, LightDAG};
pub use dagfile::{decode_dag_file, encode_dag_file, DAG_MAGIC};
pub use dataset::{calc_dataset_item, make_dataset};
pub use error::Error;
pub use hashimoto::{hashimoto, hashimoto_full, hashimoto_light, mine, search, verify};
pub use seed::{check_seedhash, get_seedhash, SeedChain};
pub use sizes::{epoch, get_cache_size, get_full_size};

pub const EPOCH_LENGTH: u64 = 30_000;

pub(crate) const DATASET_BYTES_INIT: usize = 1 << 30;
pub(crate) const DATASET_BYTES_GROWTH: usize = 1 << 23;
pub(crate) const CACHE_BYTES_INIT: usize = 1 << 24;
pub(crate) const CACHE_BYTES_GROWTH: usize = 1 << 17;

/// Width of one cache/dataset element.
pub const HASH_BYTES: usize = 64;
/// Width of the hashimoto mix buffer, two elements per access.
pub const MIX_BYTES: usize = 128;
pub(crate) const WORD_BYTES: usize = 4;
pub(crate) const NODE_WORDS: usize = HASH_BYTES / WORD_BYTES;

pub(crate) const CACHE_ROUNDS: usize = 3;
pub(crate) const DATASET_PARENTS: usize = 256;
pub(crate) const ACCESSES: usize = 64;

const FNV_PRIME: u32 = 0x0100_0193;

pub(crate) fn fnv(v1: u32, v2: u32) -> u32 {
    v1.wrapping_mul(FNV_PRIME) ^ v2
}

pub(crate) fn keccak_512(data: &[u8]) -> [u8; 64] {
    let mut output = [0u8; 64];
    output.copy_from_slice(&Keccak512::digest(data));
    output
}

pub(crate) fn keccak_256(data: &[u8]) -> [u8; 32] {
    let mut output = [0u8; 32];
    output.copy_from_slice(&Keccak256::digest(data));
    output
}
