//! Sensirion SHT3x temperature / humidity probe on I2C.
//!
//! Single-shot, high repeatability, no clock stretching: the command is
//! sent in `trigger_conversion`, the 6-byte result fetched in `read_slow`
//! after the hub's conversion wait.  Dew point and absolute humidity are
//! derived here so they reach telemetry as ordinary readings.

use embedded_hal::i2c::{Error as _, I2c};

use crate::error::SensorFault;
use crate::humidity::{absolute_humidity_g_per_kg, dew_point_at};

use super::{Quantity, Reading, Sensor};

/// Default address (ADDR pin low).
pub const ADDRESS_LOW: u8 = 0x44;
/// Alternate address (ADDR pin high).
pub const ADDRESS_HIGH: u8 = 0x45;

const CMD_SINGLE_SHOT_HIGH: [u8; 2] = [0x24, 0x00];

/// Datasheet maximum for high repeatability is 15.5 ms.
const CONVERSION_MS: u32 = 16;

const TEMPERATURE: usize = 0;
const HUMIDITY: usize = 1;
const DEW_POINT: usize = 2;
const ABSOLUTE: usize = 3;

/// CRC-8 as specified by Sensirion: polynomial 0x31, init 0xFF.
pub fn crc8(data: &[u8]) -> u8 {
    let mut crc: u8 = 0xFF;
    for byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ 0x31
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Decode a checked 6-byte frame into (°C, %rH).
pub fn decode(frame: &[u8; 6]) -> Result<(f32, f32), SensorFault> {
    if crc8(&frame[0..2]) != frame[2] || crc8(&frame[3..5]) != frame[5] {
        return Err(SensorFault::Crc);
    }
    let raw_t = u16::from_be_bytes([frame[0], frame[1]]) as f32;
    let raw_h = u16::from_be_bytes([frame[3], frame[4]]) as f32;
    let celsius = -45.0 + 175.0 * raw_t / 65535.0;
    let rh = 100.0 * raw_h / 65535.0;
    Ok((celsius, rh))
}

pub struct Sht3x<I: I2c> {
    i2c: I,
    address: u8,
    location: &'static str,
    pressure_pa: f32,
    readings: [Reading; 4],
}

impl<I: I2c> Sht3x<I> {
    pub fn new(i2c: I, address: u8, location: &'static str, pressure_pa: f32) -> Self {
        Self {
            i2c,
            address,
            location,
            pressure_pa,
            readings: [
                Reading::new(location, Quantity::Temperature),
                Reading::new(location, Quantity::RelativeHumidity),
                Reading::new(location, Quantity::DewPoint),
                Reading::new(location, Quantity::AbsoluteHumidity),
            ],
        }
    }

    fn store(&mut self, celsius: f32, rh: f32) {
        let dew = dew_point_at(celsius, self.pressure_pa, rh);
        self.readings[TEMPERATURE].value = Some(celsius);
        self.readings[HUMIDITY].value = Some(rh);
        self.readings[DEW_POINT].value = Some(dew.celsius);
        self.readings[ABSOLUTE].value = absolute_humidity_g_per_kg(celsius, self.pressure_pa, rh);
    }

    /// Release the underlying I2C bus.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> Sensor for Sht3x<I> {
    fn name(&self) -> &'static str {
        self.location
    }

    fn conversion_time_ms(&self) -> u32 {
        CONVERSION_MS
    }

    fn trigger_conversion(&mut self) -> Result<(), SensorFault> {
        self.i2c
            .write(self.address, &CMD_SINGLE_SHOT_HIGH)
            .map_err(|e| SensorFault::Bus(e.kind()))
    }

    fn read_slow(&mut self) -> Result<(), SensorFault> {
        let mut frame = [0u8; 6];
        self.i2c
            .read(self.address, &mut frame)
            .map_err(|e| SensorFault::Bus(e.kind()))?;
        let (celsius, rh) = decode(&frame)?;
        self.store(celsius, rh);
        Ok(())
    }

    fn readings(&self) -> &[Reading] {
        &self.readings
    }

    fn readings_mut(&mut self) -> &mut [Reading] {
        &mut self.readings
    }
}
