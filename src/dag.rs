//! Epoch-scoped contexts owning the cache or the full dataset.
//!
//! Both are immutable once built and safe to share by reference across
//! concurrent verification or mining calls for the same epoch; when the
//! epoch advances they are rebuilt, never mutated.

use std::sync::atomic::AtomicBool;
use std::time::Instant;

use ethereum_types::{H256, U256};
use log::{info, warn};

use crate::cache::make_cache;
use crate::dagfile::{decode_dag_file, encode_dag_file};
use crate::dataset::make_dataset;
use crate::error::Error;
use crate::hashimoto::{hashimoto_full, hashimoto_light, mine, search, verify};
use crate::seed::{check_seedhash, get_seedhash};
use crate::sizes::{epoch, get_cache_size, get_full_size};

/// Light client context: stores only the small per-epoch cache and
/// recomputes dataset elements on demand.
pub struct LightDAG {
    pub epoch: usize,
    pub cache: Vec<u8>,
    pub cache_size: usize,
    pub full_size: usize,
}

impl LightDAG {
    pub fn new(number: u64) -> Result<Self, Error> {
        let cache_size = get_cache_size(number);
        let full_size = get_full_size(number);
        let seed = get_seedhash(number);

        let start = Instant::now();
        let mut cache = vec![0u8; cache_size];
        make_cache(&mut cache, seed)?;
        info!(
            "generated cache for epoch {} in {:?}",
            epoch(number),
            start.elapsed()
        );

        Ok(Self {
            epoch: epoch(number),
            cache,
            cache_size,
            full_size,
        })
    }

    /// Adopt a persisted cache after checking its seed and size class.
    pub fn from_parts(number: u64, seed: H256, cache: Vec<u8>) -> Result<Self, Error> {
        check_seedhash(number, seed)?;
        let cache_size = get_cache_size(number);
        let full_size = get_full_size(number);
        if cache.len() != cache_size {
            return Err(Error::SizeClassMismatch {
                cache_size: cache.len(),
                full_size,
            });
        }
        Ok(Self {
            epoch: epoch(number),
            cache,
            cache_size,
            full_size,
        })
    }

    pub fn hashimoto(&self, header_hash: H256, nonce: u64) -> (H256, H256) {
        hashimoto_light(self.full_size, &self.cache, header_hash, nonce)
    }

    pub fn verify(&self, header_hash: H256, nonce: u64, mix_digest: H256, target: U256) -> bool {
        verify(
            header_hash,
            nonce,
            mix_digest,
            target,
            &self.cache,
            self.full_size,
        )
    }

    pub fn is_valid_for(&self, number: u64) -> bool {
        epoch(number) == self.epoch
    }
}

/// Full client context: stores the whole dataset in memory for mining.
pub struct FullDAG {
    pub epoch: usize,
    pub full_size: usize,
    dataset: Vec<u8>,
}

impl FullDAG {
    /// Generate the dataset from scratch for the given block number.
    pub fn generate(number: u64) -> Result<Self, Error> {
        let light = LightDAG::new(number)?;
        Self::from_light(&light)
    }

    /// Expand an existing light context into the full dataset.
    pub fn from_light(light: &LightDAG) -> Result<Self, Error> {
        let start = Instant::now();
        let mut dataset = vec![0u8; light.full_size];
        make_dataset(&mut dataset, &light.cache)?;
        info!(
            "generated {} MB dataset for epoch {} in {:?}",
            light.full_size / (1024 * 1024),
            light.epoch,
            start.elapsed()
        );
        Ok(Self {
            epoch: light.epoch,
            full_size: light.full_size,
            dataset,
        })
    }

    /// Adopt a persisted dataset, falling back to regeneration when the
    /// bytes are rejected. Load failures are recovered here, never
    /// surfaced as fatal.
    pub fn load(number: u64, bytes: &[u8]) -> Result<Self, Error> {
        match decode_dag_file(bytes, get_full_size(number)) {
            Ok(payload) => Ok(Self {
                epoch: epoch(number),
                full_size: payload.len(),
                dataset: payload.to_vec(),
            }),
            Err(e) => {
                warn!("persisted dataset rejected ({}), regenerating", e);
                Self::generate(number)
            }
        }
    }

    pub fn dataset(&self) -> &[u8] {
        &self.dataset
    }

    /// Frame the dataset in the persisted byte layout.
    pub fn to_dag_file(&self) -> Vec<u8> {
        encode_dag_file(&self.dataset)
    }

    pub fn hashimoto(&self, header_hash: H256, nonce: u64) -> (H256, H256) {
        hashimoto_full(self.full_size, &self.dataset, header_hash, nonce)
    }

    /// Single-threaded nonce scan; see [`crate::hashimoto::mine`].
    pub fn mine(
        &self,
        header_hash: H256,
        nonce_start: u64,
        target: U256,
        stop: &AtomicBool,
    ) -> Option<(u64, H256, H256)> {
        mine(
            header_hash,
            self.full_size,
            &self.dataset,
            nonce_start,
            target,
            stop,
        )
    }

    /// Multi-threaded nonce search; see [`crate::hashimoto::search`].
    pub fn search(
        &self,
        header_hash: H256,
        nonce_start: u64,
        target: U256,
        threads: usize,
        stop: &AtomicBool,
    ) -> Option<(u64, H256, H256)> {
        search(
            header_hash,
            self.full_size,
            &self.dataset,
            nonce_start,
            target,
            threads,
            stop,
        )
    }

    pub fn is_valid_for(&self, number: u64) -> bool {
        epoch(number) == self.epoch
    }
}
