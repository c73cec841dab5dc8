//! Bit-banged one-wire master on an open-drain GPIO.
//!
//! Standard-speed slot timings from Maxim AN126.  Interrupt latency can
//! stretch a slot; the DS18B20 scratchpad CRC catches the damage.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::SensorFault;
use crate::sensors::ds18b20::OneWireBus;

pub struct BitBangOneWire<P, D> {
    pin: P,
    delay: D,
}

impl<P: InputPin + OutputPin, D: DelayNs> BitBangOneWire<P, D> {
    /// The pin must be configured open-drain with a pull-up.
    pub fn new(pin: P, delay: D) -> Self {
        Self { pin, delay }
    }

    fn low(&mut self) -> Result<(), SensorFault> {
        self.pin.set_low().map_err(|_| SensorFault::OneWire)
    }

    fn release(&mut self) -> Result<(), SensorFault> {
        self.pin.set_high().map_err(|_| SensorFault::OneWire)
    }

    fn sample(&mut self) -> Result<bool, SensorFault> {
        self.pin.is_high().map_err(|_| SensorFault::OneWire)
    }

    fn write_bit(&mut self, bit: bool) -> Result<(), SensorFault> {
        self.low()?;
        if bit {
            self.delay.delay_us(6);
            self.release()?;
            self.delay.delay_us(64);
        } else {
            self.delay.delay_us(60);
            self.release()?;
            self.delay.delay_us(10);
        }
        Ok(())
    }

    fn read_bit(&mut self) -> Result<bool, SensorFault> {
        self.low()?;
        self.delay.delay_us(6);
        self.release()?;
        self.delay.delay_us(9);
        let bit = self.sample()?;
        self.delay.delay_us(55);
        Ok(bit)
    }
}

impl<P: InputPin + OutputPin, D: DelayNs> OneWireBus for BitBangOneWire<P, D> {
    fn reset(&mut self) -> Result<bool, SensorFault> {
        self.release()?;
        if !self.sample()? {
            // Bus held low by something else.
            return Err(SensorFault::OneWire);
        }
        self.low()?;
        self.delay.delay_us(480);
        self.release()?;
        self.delay.delay_us(70);
        let presence = !self.sample()?;
        self.delay.delay_us(410);
        Ok(presence)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), SensorFault> {
        for &byte in bytes {
            for i in 0..8 {
                self.write_bit((byte >> i) & 1 == 1)?;
            }
        }
        Ok(())
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), SensorFault> {
        for byte in buf.iter_mut() {
            *byte = 0;
            for i in 0..8 {
                if self.read_bit()? {
                    *byte |= 1 << i;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;

    /// Records driven levels; reads back the idle-high bus unless a
    /// device pulls it low for presence.
    #[derive(Default)]
    struct Line {
        driven: Vec<bool>,
        device_present: bool,
        low_since_reset: bool,
    }

    impl ErrorType for Line {
        type Error = Infallible;
    }

    impl OutputPin for Line {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.driven.push(false);
            Ok(())
        }
        fn set_high(&mut self) -> Result<(), Infallible> {
            self.driven.push(true);
            Ok(())
        }
    }

    impl InputPin for Line {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            // Presence pulse: the sample taken right after the reset pulse.
            let after_reset = self.driven.len() >= 3 && !self.low_since_reset;
            if after_reset {
                self.low_since_reset = true;
                return Ok(!self.device_present);
            }
            Ok(true)
        }
        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.is_high().map(|h| !h)
        }
    }

    #[derive(Default)]
    struct Delays(Vec<u32>);

    impl DelayNs for Delays {
        fn delay_ns(&mut self, ns: u32) {
            self.0.push(ns / 1000);
        }
    }

    #[test]
    fn reset_detects_presence() {
        let line = Line {
            device_present: true,
            ..Line::default()
        };
        let mut bus = BitBangOneWire::new(line, Delays::default());
        assert_eq!(bus.reset(), Ok(true));

        let mut bus = BitBangOneWire::new(Line::default(), Delays::default());
        assert_eq!(bus.reset(), Ok(false));
    }

    #[test]
    fn bytes_go_out_lsb_first() {
        let mut bus = BitBangOneWire::new(Line::default(), Delays::default());
        bus.write_bytes(&[0b0000_0001]).unwrap();
        // Each slot drives low then releases.
        let slots: Vec<_> = bus.pin.driven.chunks(2).map(<[bool]>::to_vec).collect();
        assert_eq!(slots.len(), 8);
        assert!(slots.iter().all(|s| s == &[false, true]));
        // A one is a short low pulse, a zero a long one.
        let low_us: Vec<_> = bus.delay.0.iter().step_by(2).copied().collect();
        assert_eq!(low_us, [6, 60, 60, 60, 60, 60, 60, 60]);
    }

    #[test]
    fn idle_bus_reads_ones() {
        let mut bus = BitBangOneWire::new(Line::default(), Delays::default());
        let mut buf = [0u8; 2];
        bus.read_bytes(&mut buf).unwrap();
        assert_eq!(buf, [0xFF, 0xFF]);
    }
}
