//! Construction errors.
//!
//! Runtime protocol violations (a second send on a blocked channel, a miss that
//! spans two blocks, a response nobody is waiting for) are bugs in a collaborator
//! and panic at the point of detection. The only recoverable failures are the
//! ones a caller can fix by changing its input, namely an unusable configuration.

use thiserror::Error;

/// Reasons a cache configuration cannot be turned into a working cache.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The block size is zero.
    #[error("block size must be non-zero")]
    ZeroBlockSize,

    /// The block size is not a power of two, so alignment cannot be done by masking.
    #[error("block size {0} is not a power of two")]
    BlockSizeNotPowerOfTwo(usize),

    /// The cache size is not a whole number of blocks.
    #[error("cache size {size} is not a multiple of the block size {block_size}")]
    SizeNotMultipleOfBlock {
        /// Configured cache size in bytes.
        size: usize,
        /// Configured block size in bytes.
        block_size: usize,
    },

    /// The cache would hold no blocks at all.
    #[error("cache capacity is zero blocks")]
    ZeroCapacity,

    /// No upstream ports were configured.
    #[error("at least one cpu-side port is required")]
    NoCpuPorts,

    /// The number of bound requestors differs from the configured port count.
    #[error("configured {expected} cpu-side ports but {actual} requestors were bound")]
    PortCountMismatch {
        /// Port count from the configuration.
        expected: usize,
        /// Number of requestors supplied.
        actual: usize,
    },

    /// The configuration text could not be parsed.
    #[error("malformed cache configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
