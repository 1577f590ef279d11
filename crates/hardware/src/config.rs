//! Configuration for the blocking cache.
//!
//! This module defines the parameters of a `SimpleCache`. It provides:
//! 1. **Defaults:** Baseline latency, size, block size, port count, and eviction seed.
//! 2. **Structure:** `CacheConfig`, deserializable from JSON with per-field defaults.
//! 3. **Validation:** Checks that the geometry describes a usable cache.
//!
//! Use `CacheConfig::default()` in code, or `CacheConfig::from_json` when the
//! parameters come from a file.

use serde::Deserialize;

use crate::common::ConfigError;
use crate::sim::Cycles;

/// Default configuration constants for the cache.
///
/// These values define the baseline cache when a field is not explicitly
/// overridden in the JSON configuration.
mod defaults {
    /// Cycles taken on a hit, and to start resolving a miss.
    pub const LATENCY: u64 = 1;

    /// Total cache size in bytes (16 KiB).
    pub const SIZE_BYTES: usize = 16 * 1024;

    /// Block (cache line) size in bytes.
    ///
    /// Matches the system cache line size and DRAM burst length.
    pub const BLOCK_SIZE: usize = 64;

    /// Number of cpu-side ports.
    pub const CPU_PORTS: usize = 1;

    /// Seed for the random eviction generator.
    pub const SEED: u64 = 123456789;
}

/// Blocking cache configuration.
///
/// # Examples
///
/// ```
/// use memsim_core::config::CacheConfig;
///
/// let json = r#"{ "latency": 2, "size_bytes": 128, "cpu_ports": 2 }"#;
/// let config = CacheConfig::from_json(json).unwrap();
/// assert_eq!(config.capacity(), 2);
/// assert_eq!(config.block_size, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheConfig {
    /// Cycles taken on a hit or to begin resolving a miss
    #[serde(default = "CacheConfig::default_latency")]
    pub latency: Cycles,

    /// Total cache size in bytes
    #[serde(default = "CacheConfig::default_size")]
    pub size_bytes: usize,

    /// Block size in bytes
    #[serde(default = "CacheConfig::default_block_size")]
    pub block_size: usize,

    /// Number of cpu-side ports
    #[serde(default = "CacheConfig::default_cpu_ports")]
    pub cpu_ports: usize,

    /// Eviction generator seed
    #[serde(default = "CacheConfig::default_seed")]
    pub seed: u64,
}

impl CacheConfig {
    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and any validation error
    /// reported by [`CacheConfig::validate`].
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Number of blocks the cache can hold.
    pub const fn capacity(&self) -> usize {
        self.size_bytes / self.block_size
    }

    /// Checks that the geometry describes a usable cache.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule: the block size must be a non-zero power of
    /// two, the size a non-zero multiple of it, and at least one port must exist.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if !self.block_size.is_power_of_two() {
            return Err(ConfigError::BlockSizeNotPowerOfTwo(self.block_size));
        }
        if !self.size_bytes.is_multiple_of(self.block_size) {
            return Err(ConfigError::SizeNotMultipleOfBlock {
                size: self.size_bytes,
                block_size: self.block_size,
            });
        }
        if self.capacity() == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.cpu_ports == 0 {
            return Err(ConfigError::NoCpuPorts);
        }
        Ok(())
    }

    /// Returns the default access latency in cycles.
    const fn default_latency() -> Cycles {
        defaults::LATENCY
    }

    /// Returns the default cache size in bytes.
    const fn default_size() -> usize {
        defaults::SIZE_BYTES
    }

    /// Returns the default block size in bytes.
    const fn default_block_size() -> usize {
        defaults::BLOCK_SIZE
    }

    /// Returns the default number of cpu-side ports.
    const fn default_cpu_ports() -> usize {
        defaults::CPU_PORTS
    }

    /// Returns the default eviction seed.
    const fn default_seed() -> u64 {
        defaults::SEED
    }
}

impl Default for CacheConfig {
    /// Creates a default configuration.
    ///
    /// One-cycle latency, 16 KiB of 64-byte blocks, a single cpu-side port.
    fn default() -> Self {
        Self {
            latency: defaults::LATENCY,
            size_bytes: defaults::SIZE_BYTES,
            block_size: defaults::BLOCK_SIZE,
            cpu_ports: defaults::CPU_PORTS,
            seed: defaults::SEED,
        }
    }
}
