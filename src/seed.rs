//! The per-epoch seed chain.
//!
//! `seed(0)` is the all-zero 32-byte value and `seed(n)` is the keccak256 of
//! `seed(n-1)`. The chain is append-only; a process-wide memo table avoids
//! recomputing it from epoch 0 on every call.

use ethereum_types::H256;
use parking_lot::RwLock;

use crate::error::Error;
use crate::sizes::epoch;
use crate::keccak_256;

lazy_static::lazy_static! {
    static ref SEED_CHAIN: SeedChain = SeedChain::new();
}

/// Memoized seed hash chain, shared read-only across epochs.
pub struct SeedChain {
    chain: RwLock<Vec<H256>>,
}

impl SeedChain {
    pub fn new() -> Self {
        Self {
            chain: RwLock::new(vec![H256::zero()]),
        }
    }

    /// The seed for an epoch, extending the chain if needed.
    pub fn seed(&self, epoch: usize) -> H256 {
        {
            let chain = self.chain.read();
            if let Some(seed) = chain.get(epoch) {
                return *seed;
            }
        }
        let mut chain = self.chain.write();
        while chain.len() <= epoch {
            let next = keccak_256(chain[chain.len() - 1].as_bytes());
            chain.push(H256::from(next));
        }
        chain[epoch]
    }
}

impl Default for SeedChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the seedhash for a given block number.
pub fn get_seedhash(block_number: u64) -> H256 {
    SEED_CHAIN.seed(epoch(block_number))
}

/// Check a persisted seed against the chain. A mismatch means the caller
/// should regenerate whatever was derived from it.
pub fn check_seedhash(block_number: u64, seed: H256) -> Result<(), Error> {
    let expected = get_seedhash(block_number);
    if seed == expected {
        Ok(())
    } else {
        Err(Error::SeedMismatch {
            epoch: epoch(block_number),
            expected,
            found: seed,
        })
    }
}
