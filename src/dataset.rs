//! On-demand dataset element generation and bulk dataset construction.
//!
//! Computing a single element is cheap relative to the dataset but needs
//! random access into the whole cache; this asymmetry is what keeps light
//! verification fast while still memory-bound.

use byteorder::{ByteOrder, LittleEndian};
use ethereum_types::H512;
use log::debug;
use rayon::prelude::*;

use crate::error::Error;
use crate::{fnv, keccak_512, DATASET_PARENTS, HASH_BYTES, MIX_BYTES, NODE_WORDS};

/// Compute a single dataset element from the cache.
///
/// Used both by [`make_dataset`] and, independently, by light verification.
pub fn calc_dataset_item(cache: &[u8], i: usize) -> H512 {
    let n = cache.len() / HASH_BYTES;

    let mut mix = [0u8; HASH_BYTES];
    mix.copy_from_slice(&cache[(i % n) * HASH_BYTES..][..HASH_BYTES]);
    let head = LittleEndian::read_u32(&mix) ^ i as u32;
    LittleEndian::write_u32(&mut mix, head);
    let mix = keccak_512(&mix);

    let mut words = [0u32; NODE_WORDS];
    LittleEndian::read_u32_into(&mix, &mut words);
    for j in 0..DATASET_PARENTS {
        let parent = fnv(i as u32 ^ j as u32, words[j % NODE_WORDS]) as usize % n;
        let parent = &cache[parent * HASH_BYTES..][..HASH_BYTES];
        for (w, word) in words.iter_mut().enumerate() {
            *word = fnv(*word, LittleEndian::read_u32(&parent[w * 4..]));
        }
    }

    let mut bytes = [0u8; HASH_BYTES];
    LittleEndian::write_u32_into(&words, &mut bytes);
    H512::from(keccak_512(&bytes))
}

/// Fill `dataset` with elements derived from `cache`, in index order.
///
/// Elements are independent once the cache is complete, so generation is
/// spread across the worker pool.
pub fn make_dataset(dataset: &mut [u8], cache: &[u8]) -> Result<(), Error> {
    if cache.is_empty() || cache.len() % HASH_BYTES != 0 {
        return Err(Error::InvalidSize {
            size: cache.len(),
            multiple_of: HASH_BYTES,
        });
    }
    if dataset.is_empty() || dataset.len() % MIX_BYTES != 0 {
        return Err(Error::InvalidSize {
            size: dataset.len(),
            multiple_of: MIX_BYTES,
        });
    }
    debug!(
        "generating {} byte dataset from {} byte cache",
        dataset.len(),
        cache.len()
    );

    // setup rayon thread pool.
    let _ = rayon::ThreadPoolBuilder::new()
        .num_threads(num_cpus::get())
        .build_global()
        .is_ok();

    dataset
        .par_chunks_exact_mut(HASH_BYTES)
        .enumerate()
        .for_each(|(i, out)| {
            out.copy_from_slice(calc_dataset_item(cache, i).as_bytes());
        });
    Ok(())
}
