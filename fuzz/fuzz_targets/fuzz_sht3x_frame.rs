//! Fuzz target: SHT3x measurement frame decoder
//!
//! Arbitrary 6-byte frames must either fail the CRC check or decode into
//! the sensor's physical range.
//!
//! cargo fuzz run fuzz_sht3x_frame

#![no_main]

use filament_dryer::sensors::sht3x::decode;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|frame: [u8; 6]| {
    if let Ok((celsius, rh)) = decode(&frame) {
        assert!((-45.0..=130.0).contains(&celsius));
        assert!((0.0..=100.0).contains(&rh));
    }
});
