//! Fuzz target for engine configuration parsing.
//!
//! Tests that JSON configuration parsing handles arbitrary input without
//! panicking, and that anything it accepts is valid.

#![no_main]

use libfuzzer_sys::fuzz_target;
use phsrm_core::EngineConfig;

fuzz_target!(|data: &str| {
    if let Ok(config) = EngineConfig::from_json_str(data) {
        assert!(config.validate().is_ok());
    }
});
