//! Sequential-memory-hard cache generation.
//!
//! Follows Sergio Demian Lerner's "Strict Memory Hard Hashing Functions"
//! construction: a cheap keccak512 chain fills the array, then a fixed
//! number of full passes rewrite every element from a data-dependent
//! partner, forcing any producer to keep the whole array resident.

use byteorder::{ByteOrder, LittleEndian};
use ethereum_types::H256;
use log::debug;

use crate::error::Error;
use crate::{keccak_512, CACHE_ROUNDS, HASH_BYTES};

/// Fill `cache` with the verification cache for the given seed.
///
/// The buffer length must be a positive multiple of 64 bytes; malformed
/// sizes fail closed rather than being padded or truncated. Identical
/// `(seed, len)` inputs always produce identical bytes.
pub fn make_cache(cache: &mut [u8], seed: H256) -> Result<(), Error> {
    if cache.is_empty() || cache.len() % HASH_BYTES != 0 {
        return Err(Error::InvalidSize {
            size: cache.len(),
            multiple_of: HASH_BYTES,
        });
    }
    let n = cache.len() / HASH_BYTES;
    debug!("generating {} byte cache ({} elements)", cache.len(), n);

    cache[..HASH_BYTES].copy_from_slice(&keccak_512(seed.as_bytes()));
    for i in 1..n {
        let hashed = keccak_512(&cache[(i - 1) * HASH_BYTES..i * HASH_BYTES]);
        cache[i * HASH_BYTES..(i + 1) * HASH_BYTES].copy_from_slice(&hashed);
    }

    // In-place RandMemoHash rounds. Element i is rewritten from its left
    // neighbour and a partner chosen by its own first word, so later
    // elements in the same round observe already-updated state. That
    // ordering is part of the algorithm; it must not be parallelized.
    for _ in 0..CACHE_ROUNDS {
        for i in 0..n {
            let partner =
                (LittleEndian::read_u32(&cache[i * HASH_BYTES..]) as usize) % n;
            let neighbour = (i + n - 1) % n;
            let mut data = [0u8; HASH_BYTES];
            for w in 0..HASH_BYTES {
                data[w] = cache[neighbour * HASH_BYTES + w] ^ cache[partner * HASH_BYTES + w];
            }
            cache[i * HASH_BYTES..(i + 1) * HASH_BYTES].copy_from_slice(&keccak_512(&data));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_sizes() {
        let seed = H256::zero();
        assert_eq!(
            make_cache(&mut [], seed),
            Err(Error::InvalidSize {
                size: 0,
                multiple_of: 64
            })
        );
        assert_eq!(
            make_cache(&mut [0u8; 96], seed),
            Err(Error::InvalidSize {
                size: 96,
                multiple_of: 64
            })
        );
    }

    #[test]
    fn deterministic_for_identical_inputs() {
        let seed = H256::repeat_byte(0x7e);
        let mut a = vec![0u8; 1024];
        let mut b = vec![0xffu8; 1024];
        make_cache(&mut a, seed).unwrap();
        make_cache(&mut b, seed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn seed_changes_every_element() {
        let mut a = vec![0u8; 1024];
        let mut b = vec![0u8; 1024];
        make_cache(&mut a, H256::zero()).unwrap();
        make_cache(&mut b, H256::repeat_byte(1)).unwrap();
        for (i, (ea, eb)) in a.chunks(HASH_BYTES).zip(b.chunks(HASH_BYTES)).enumerate() {
            assert_ne!(ea, eb, "element {}", i);
        }
    }
}
