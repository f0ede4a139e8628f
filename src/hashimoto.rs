//! The hashimoto mixing function, its two lookup modes, verification and
//! nonce search.

use std::sync::atomic::{AtomicBool, Ordering};

use byteorder::{ByteOrder, LittleEndian};
use ethereum_types::{H256, H512, U256};
use parking_lot::Mutex;

use crate::dataset::calc_dataset_item;
use crate::{fnv, keccak_256, keccak_512, ACCESSES, HASH_BYTES, MIX_BYTES, WORD_BYTES};

const MIX_WORDS: usize = MIX_BYTES / WORD_BYTES;
const MIX_HASHES: usize = MIX_BYTES / HASH_BYTES;

/// "Main" function of Ethash, calculating the mix digest and result given
/// the header hash and nonce.
///
/// `lookup` abstracts over the two dataset access modes: a full client reads
/// the materialized array, a light client recomputes elements from the
/// cache. Both must return identical bytes for the same index, and then this
/// function returns identical output regardless of mode.
pub fn hashimoto<F: Fn(usize) -> H512>(
    header_hash: H256,
    nonce: u64,
    full_size: usize,
    lookup: F,
) -> (H256, H256) {
    let rows = full_size / MIX_BYTES;

    let s = {
        let mut data = [0u8; 40];
        data[..32].copy_from_slice(header_hash.as_bytes());
        LittleEndian::write_u64(&mut data[32..], nonce);
        keccak_512(&data)
    };
    let s_head = LittleEndian::read_u32(&s);

    // The mix buffer is the 64-byte seed replicated to 128 bytes.
    let mut mix = [0u32; MIX_WORDS];
    for (i, w) in mix.iter_mut().enumerate() {
        *w = LittleEndian::read_u32(&s[i % (HASH_BYTES / WORD_BYTES) * WORD_BYTES..]);
    }

    for i in 0..ACCESSES {
        let row = fnv(i as u32 ^ s_head, mix[i % MIX_WORDS]) as usize % rows;
        let mut data = [0u32; MIX_WORDS];
        for j in 0..MIX_HASHES {
            let element = lookup(MIX_HASHES * row + j);
            LittleEndian::read_u32_into(
                element.as_bytes(),
                &mut data[j * (HASH_BYTES / WORD_BYTES)..][..HASH_BYTES / WORD_BYTES],
            );
        }
        for (w, word) in mix.iter_mut().enumerate() {
            *word = fnv(*word, data[w]);
        }
    }

    // Compress the 32-word mix down to the 8-word digest.
    let mut compressed = [0u32; MIX_WORDS / 4];
    for (w, out) in compressed.iter_mut().enumerate() {
        let m = &mix[4 * w..];
        *out = fnv(fnv(fnv(m[0], m[1]), m[2]), m[3]);
    }
    let mut digest = [0u8; 32];
    LittleEndian::write_u32_into(&compressed, &mut digest);

    let result = {
        let mut data = [0u8; 96];
        data[..64].copy_from_slice(&s);
        data[64..].copy_from_slice(&digest);
        keccak_256(&data)
    };
    (H256::from(digest), H256::from(result))
}

/// Hashimoto used by a light client; recomputes dataset elements from the
/// cache on demand.
pub fn hashimoto_light(
    full_size: usize,
    cache: &[u8],
    header_hash: H256,
    nonce: u64,
) -> (H256, H256) {
    hashimoto(header_hash, nonce, full_size, |i| {
        calc_dataset_item(cache, i)
    })
}

/// Hashimoto used by a full client; reads the materialized dataset.
pub fn hashimoto_full(
    full_size: usize,
    dataset: &[u8],
    header_hash: H256,
    nonce: u64,
) -> (H256, H256) {
    hashimoto(header_hash, nonce, full_size, |i| {
        H512::from_slice(&dataset[i * HASH_BYTES..][..HASH_BYTES])
    })
}

/// Verify a claimed proof against a difficulty-derived target using only
/// the cache.
///
/// Recomputes the mix digest in light mode and checks it byte-for-byte,
/// then compares the result hash as a big-endian integer against `target`.
/// Any mismatch, including structurally invalid cache or dataset sizes,
/// yields `false`; this function never panics on forged input.
pub fn verify(
    header_hash: H256,
    nonce: u64,
    mix_digest: H256,
    target: U256,
    cache: &[u8],
    full_size: usize,
) -> bool {
    if cache.is_empty() || cache.len() % HASH_BYTES != 0 {
        return false;
    }
    if full_size == 0 || full_size % MIX_BYTES != 0 {
        return false;
    }
    let (digest, result) = hashimoto_light(full_size, cache, header_hash, nonce);
    digest == mix_digest && U256::from_big_endian(result.as_bytes()) <= target
}

/// Scan nonces from `nonce_start` until one hashes at or below `target`.
///
/// Returns the winning `(nonce, mix_digest, result)`, or `None` once `stop`
/// is raised. Target derivation from difficulty is the caller's concern.
pub fn mine(
    header_hash: H256,
    full_size: usize,
    dataset: &[u8],
    nonce_start: u64,
    target: U256,
    stop: &AtomicBool,
) -> Option<(u64, H256, H256)> {
    let mut nonce = nonce_start;
    loop {
        if stop.load(Ordering::Relaxed) {
            return None;
        }
        let (digest, result) = hashimoto_full(full_size, dataset, header_hash, nonce);
        if U256::from_big_endian(result.as_bytes()) <= target {
            return Some((nonce, digest, result));
        }
        nonce = nonce.wrapping_add(1);
    }
}

/// Search nonce ranges across `threads` workers until one finds a
/// qualifying nonce or `stop` is raised externally.
///
/// Workers take interleaved nonces starting from `nonce_start`. The first
/// worker to find a solution raises `stop` for the rest; when several
/// nonces qualify simultaneously, whichever worker records its win first
/// is returned. No further ordering is guaranteed.
pub fn search(
    header_hash: H256,
    full_size: usize,
    dataset: &[u8],
    nonce_start: u64,
    target: U256,
    threads: usize,
    stop: &AtomicBool,
) -> Option<(u64, H256, H256)> {
    let threads = if threads == 0 {
        num_cpus::get()
    } else {
        threads
    };
    let winner: Mutex<Option<(u64, H256, H256)>> = Mutex::new(None);

    std::thread::scope(|scope| {
        for t in 0..threads {
            let winner = &winner;
            scope.spawn(move || {
                let mut nonce = nonce_start.wrapping_add(t as u64);
                while !stop.load(Ordering::Relaxed) {
                    let (digest, result) = hashimoto_full(full_size, dataset, header_hash, nonce);
                    if U256::from_big_endian(result.as_bytes()) <= target {
                        let mut slot = winner.lock();
                        if slot.is_none() {
                            *slot = Some((nonce, digest, result));
                        }
                        stop.store(true, Ordering::Relaxed);
                        return;
                    }
                    nonce = nonce.wrapping_add(threads as u64);
                }
            });
        }
    });
    winner.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{make_cache, make_dataset};
    use hex_literal::hex;

    const TEST_FULL_SIZE: usize = 32 * 1024;

    fn test_cache() -> Vec<u8> {
        let mut cache = vec![0u8; 1024];
        make_cache(&mut cache, H256::zero()).unwrap();
        cache
    }

    fn test_header() -> H256 {
        H256::from(hex!(
            "c9149cc0386e689d789a1c2f3d5d169a61a6218ed30e74414dc736e442ef3d1f"
        ))
    }

    #[test]
    fn reference_vector_light() {
        let cache = test_cache();
        let (digest, result) = hashimoto_light(TEST_FULL_SIZE, &cache, test_header(), 0);
        assert_eq!(
            digest,
            H256::from(hex!(
                "e4073cffaef931d37117cefd9afd27ea0f1cad6a981dd2605c4a1ac97c519800"
            ))
        );
        assert_eq!(
            result,
            H256::from(hex!(
                "d3539235ee2e6f8db665c0a72169f55b7f6c605712330b778ec3944f0eb5a557"
            ))
        );
    }

    #[test]
    fn light_and_full_agree() {
        let cache = test_cache();
        let mut dataset = vec![0u8; TEST_FULL_SIZE];
        make_dataset(&mut dataset, &cache).unwrap();
        for nonce in [0u64, 1, 0x7c7c_597c, u64::MAX] {
            let light = hashimoto_light(TEST_FULL_SIZE, &cache, test_header(), nonce);
            let full = hashimoto_full(TEST_FULL_SIZE, &dataset, test_header(), nonce);
            assert_eq!(light, full, "nonce {:#x}", nonce);
        }
    }

    #[test]
    fn verify_accepts_honest_proof() {
        let cache = test_cache();
        let (digest, _) = hashimoto_light(TEST_FULL_SIZE, &cache, test_header(), 0);
        assert!(verify(
            test_header(),
            0,
            digest,
            U256::max_value(),
            &cache,
            TEST_FULL_SIZE
        ));
    }

    #[test]
    fn verify_rejects_any_flipped_digest_bit() {
        let cache = test_cache();
        let (digest, _) = hashimoto_light(TEST_FULL_SIZE, &cache, test_header(), 0);
        for bit in 0..256 {
            let mut tampered = digest;
            tampered.as_bytes_mut()[bit / 8] ^= 1 << (bit % 8);
            assert!(
                !verify(
                    test_header(),
                    0,
                    tampered,
                    U256::max_value(),
                    &cache,
                    TEST_FULL_SIZE
                ),
                "bit {}",
                bit
            );
        }
    }

    #[test]
    fn verify_rejects_zero_target() {
        let cache = test_cache();
        let (digest, _) = hashimoto_light(TEST_FULL_SIZE, &cache, test_header(), 0);
        assert!(!verify(
            test_header(),
            0,
            digest,
            U256::zero(),
            &cache,
            TEST_FULL_SIZE
        ));
    }

    #[test]
    fn verify_rejects_malformed_sizes() {
        let cache = test_cache();
        let (digest, _) = hashimoto_light(TEST_FULL_SIZE, &cache, test_header(), 0);
        assert!(!verify(
            test_header(),
            0,
            digest,
            U256::max_value(),
            &cache[..100],
            TEST_FULL_SIZE
        ));
        assert!(!verify(
            test_header(),
            0,
            digest,
            U256::max_value(),
            &cache,
            TEST_FULL_SIZE + 1
        ));
    }

    #[test]
    fn mine_finds_first_qualifying_nonce() {
        let cache = test_cache();
        let mut dataset = vec![0u8; TEST_FULL_SIZE];
        make_dataset(&mut dataset, &cache).unwrap();
        let stop = AtomicBool::new(false);
        let (nonce, digest, _) = mine(
            test_header(),
            TEST_FULL_SIZE,
            &dataset,
            42,
            U256::max_value(),
            &stop,
        )
        .unwrap();
        assert_eq!(nonce, 42);
        assert!(verify(
            test_header(),
            nonce,
            digest,
            U256::max_value(),
            &cache,
            TEST_FULL_SIZE
        ));
    }

    #[test]
    fn search_winner_verifies() {
        let cache = test_cache();
        let mut dataset = vec![0u8; TEST_FULL_SIZE];
        make_dataset(&mut dataset, &cache).unwrap();
        let stop = AtomicBool::new(false);
        // Target low enough that the first few nonces do not all qualify.
        let target = U256::max_value() >> 2;
        let (nonce, digest, result) = search(
            test_header(),
            TEST_FULL_SIZE,
            &dataset,
            0,
            target,
            4,
            &stop,
        )
        .unwrap();
        assert!(U256::from_big_endian(result.as_bytes()) <= target);
        assert!(verify(
            test_header(),
            nonce,
            digest,
            target,
            &cache,
            TEST_FULL_SIZE
        ));
        assert!(stop.load(Ordering::Relaxed));
    }

    #[test]
    fn search_observes_external_stop() {
        let cache = test_cache();
        let mut dataset = vec![0u8; TEST_FULL_SIZE];
        make_dataset(&mut dataset, &cache).unwrap();
        let stop = AtomicBool::new(true);
        assert_eq!(
            search(
                test_header(),
                TEST_FULL_SIZE,
                &dataset,
                0,
                U256::max_value(),
                2,
                &stop
            ),
            None
        );
    }

    #[test]
    fn mine_observes_stop_flag() {
        let cache = test_cache();
        let mut dataset = vec![0u8; TEST_FULL_SIZE];
        make_dataset(&mut dataset, &cache).unwrap();
        let stop = AtomicBool::new(true);
        assert_eq!(
            mine(
                test_header(),
                TEST_FULL_SIZE,
                &dataset,
                0,
                U256::max_value(),
                &stop
            ),
            None
        );
    }
}
