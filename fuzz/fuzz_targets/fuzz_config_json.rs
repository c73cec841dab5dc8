//! Fuzz target: `SystemConfig::from_json`
//!
//! Feeds arbitrary bytes as the config document and verifies:
//! - No panics on malformed or hostile JSON
//! - Every accepted document also passes `validate()`
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use filament_dryer::config::SystemConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = SystemConfig::from_json(text) {
        assert!(config.validate().is_ok());
        assert!(config.dryfan_samples > 0);
        assert!(config.watchdog_slice_ms < config.watchdog_timeout_ms);
    }
});
