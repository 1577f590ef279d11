//! # Configuration Error Tests
//!
//! Checks the rendered messages and the `serde_json` conversion.

use memsim_core::common::ConfigError;

#[test]
fn test_messages_name_the_offending_values() {
    assert_eq!(
        ConfigError::BlockSizeNotPowerOfTwo(48).to_string(),
        "block size 48 is not a power of two"
    );
    assert_eq!(
        ConfigError::SizeNotMultipleOfBlock {
            size: 100,
            block_size: 64
        }
        .to_string(),
        "cache size 100 is not a multiple of the block size 64"
    );
    assert_eq!(
        ConfigError::PortCountMismatch {
            expected: 2,
            actual: 1
        }
        .to_string(),
        "configured 2 cpu-side ports but 1 requestors were bound"
    );
}

#[test]
fn test_parse_error_converts_and_keeps_source() {
    let err: ConfigError = serde_json::from_str::<serde_json::Value>("{")
        .map(|_| ())
        .map_err(ConfigError::from)
        .unwrap_err();

    assert!(matches!(err, ConfigError::Parse(_)));
    assert!(err.to_string().starts_with("malformed cache configuration"));
    assert!(std::error::Error::source(&err).is_some());
}
