//! Unified error types for the filament dryer firmware.
//!
//! Sensor faults never leave the sensor aggregator: every phase call
//! returns `Result<(), SensorFault>` and the aggregator turns an `Err`
//! into a permanent "broken" flag.  All variants are `Copy`.

use core::fmt;

use embedded_hal::i2c::ErrorKind;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A forced transition named a state that does not exist.
    UnknownState,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownState => write!(f, "unknown state name"),
        }
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorFault {
    /// The I2C transaction failed.
    Bus(ErrorKind),
    /// The one-wire bus reported an error.
    OneWire,
    /// No device answered the bus reset.
    NoDevice,
    /// The checksum of the received frame does not match.
    Crc,
}

impl fmt::Display for SensorFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(kind) => write!(f, "I2C bus error ({kind})"),
            Self::OneWire => write!(f, "one-wire bus error"),
            Self::NoDevice => write!(f, "no device present"),
            Self::Crc => write!(f, "CRC mismatch"),
        }
    }
}
