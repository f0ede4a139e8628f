use ethereum_types::H256;

/// Errors surfaced by cache/dataset construction and the persisted-layout
/// contract. Verification failure is a boolean outcome, never an `Error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A buffer size is not a positive multiple of the required width.
    #[error("size {size} is not a positive multiple of {multiple_of} bytes")]
    InvalidSize { size: usize, multiple_of: usize },

    /// A supplied cache cannot serve the dataset size it is asked to expand
    /// to, signalling caller misuse.
    #[error("cache of {cache_size} bytes does not belong to the size class of a {full_size} byte dataset")]
    SizeClassMismatch { cache_size: usize, full_size: usize },

    /// A persisted seed diverges from the epoch's chained seed. Callers
    /// recover by regenerating, not by aborting.
    #[error("seed hash for epoch {epoch} should be {expected}, found {found}")]
    SeedMismatch {
        epoch: usize,
        expected: H256,
        found: H256,
    },

    /// A persisted dataset does not start with the expected magic number.
    #[error("dag file magic {found:#018x} does not match {expected:#018x}")]
    BadDagMagic { found: u64, expected: u64 },

    /// A persisted dataset payload is truncated or does not match the
    /// epoch's dataset size.
    #[error("dag file payload of {found} bytes does not match the expected {expected} bytes")]
    DagSizeMismatch { found: usize, expected: usize },
}
