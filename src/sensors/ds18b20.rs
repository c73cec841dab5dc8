//! Maxim DS18B20 one-wire temperature probe on the heater board.
//!
//! One probe per bus, addressed with SKIP ROM.  `trigger_conversion`
//! starts a 12-bit conversion (750 ms max); `read_slow` fetches and checks
//! the scratchpad.

use crate::error::SensorFault;

use super::{Quantity, Reading, Sensor};

const CMD_SKIP_ROM: u8 = 0xCC;
const CMD_CONVERT_T: u8 = 0x44;
const CMD_READ_SCRATCHPAD: u8 = 0xBE;

/// 12-bit resolution worst case.
pub const CONVERSION_MS: u32 = 750;

/// Minimal one-wire bus access.
pub trait OneWireBus {
    /// Reset pulse.  `Ok(true)` when a device answered with presence.
    fn reset(&mut self) -> Result<bool, SensorFault>;

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SensorFault>;

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), SensorFault>;
}

/// Dallas/Maxim CRC-8 (polynomial x^8 + x^5 + x^4 + 1, reflected).
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            let mix = (crc ^ b) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            b >>= 1;
        }
    }
    crc
}

pub struct Ds18b20<B: OneWireBus> {
    bus: B,
    location: &'static str,
    readings: [Reading; 1],
    /// A conversion was started and not read back yet.
    converting: bool,
}

impl<B: OneWireBus> Ds18b20<B> {
    pub fn new(bus: B, location: &'static str) -> Self {
        Self {
            bus,
            location,
            readings: [Reading::new(location, Quantity::Temperature)],
            converting: false,
        }
    }

    fn select(&mut self) -> Result<(), SensorFault> {
        if !self.bus.reset()? {
            return Err(SensorFault::NoDevice);
        }
        self.bus.write_bytes(&[CMD_SKIP_ROM])
    }
}

impl<B: OneWireBus> Sensor for Ds18b20<B> {
    fn name(&self) -> &'static str {
        self.location
    }

    fn conversion_time_ms(&self) -> u32 {
        CONVERSION_MS
    }

    fn trigger_conversion(&mut self) -> Result<(), SensorFault> {
        self.select()?;
        self.bus.write_bytes(&[CMD_CONVERT_T])?;
        self.converting = true;
        Ok(())
    }

    fn read_slow(&mut self) -> Result<(), SensorFault> {
        if !core::mem::take(&mut self.converting) {
            return Ok(());
        }
        self.select()?;
        self.bus.write_bytes(&[CMD_READ_SCRATCHPAD])?;
        let mut scratchpad = [0u8; 9];
        self.bus.read_bytes(&mut scratchpad)?;
        if crc8(&scratchpad[..8]) != scratchpad[8] {
            return Err(SensorFault::Crc);
        }
        let raw = i16::from_le_bytes([scratchpad[0], scratchpad[1]]);
        self.readings[0].value = Some(f32::from(raw) / 16.0);
        Ok(())
    }

    fn readings(&self) -> &[Reading] {
        &self.readings
    }

    fn readings_mut(&mut self) -> &mut [Reading] {
        &mut self.readings
    }
}
