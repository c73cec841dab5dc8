//! Desiccant heater driver with board over-temperature cutoff.
//!
//! Two MOSFET outputs (A and B) always switch together.
//!
//! ## Safety contract
//!
//! The applied power is the requested power only while the last known
//! board temperature is at or below the ceiling.  An unknown temperature
//! (probe broken, not yet measured) keeps the heater off.  The guard is
//! self-healing: once the board cools down the request is honoured again.
//! Both setters write the outputs on every call.

use embedded_hal::digital::OutputPin;

use super::drive;

pub struct HeaterDriver<P: OutputPin> {
    pins: [P; 2],
    requested: bool,
    board_c: Option<f32>,
    max_board_c: f32,
    applied: bool,
}

impl<P: OutputPin> HeaterDriver<P> {
    /// Outputs are written low immediately.
    pub fn new(pin_a: P, pin_b: P, max_board_c: f32) -> Self {
        let mut heater = Self {
            pins: [pin_a, pin_b],
            requested: false,
            board_c: None,
            max_board_c,
            applied: false,
        };
        heater.write();
        heater
    }

    pub fn set_power(&mut self, on: bool) {
        self.requested = on;
        self.write();
    }

    pub fn set_board_temperature(&mut self, celsius: Option<f32>) {
        self.board_c = celsius;
        self.write();
    }

    /// Requested power after the over-temperature guard.
    pub fn power_controlled(&self) -> bool {
        self.requested && self.board_c.is_some_and(|t| t <= self.max_board_c)
    }

    pub fn requested(&self) -> bool {
        self.requested
    }

    /// Level last written to the outputs.
    pub fn applied(&self) -> bool {
        self.applied
    }

    fn write(&mut self) {
        let on = self.power_controlled();
        if self.requested && !on && self.applied {
            log::warn!(
                "Heater: cutoff, board {:?}C above {:.1}C or unknown",
                self.board_c,
                self.max_board_c
            );
        }
        for pin in &mut self.pins {
            drive(pin, on, "heater");
        }
        self.applied = on;
    }

    /// Release the output pins.
    pub fn release(self) -> [P; 2] {
        self.pins
    }
}
