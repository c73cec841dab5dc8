//! Green / red / white status LEDs.
//!
//! Each FSM state shows its own pattern; see the entry actions in
//! [`crate::fsm::states`].

use embedded_hal::digital::OutputPin;

use crate::fsm::context::Leds;

use super::drive;

pub struct StatusLeds<P: OutputPin> {
    green: P,
    red: P,
    white: P,
    current: Leds,
}

impl<P: OutputPin> StatusLeds<P> {
    pub fn new(green: P, red: P, white: P) -> Self {
        let mut leds = Self {
            green,
            red,
            white,
            current: Leds::OFF,
        };
        leds.set(Leds::OFF);
        leds
    }

    pub fn set(&mut self, leds: Leds) {
        drive(&mut self.green, leds.green, "led green");
        drive(&mut self.red, leds.red, "led red");
        drive(&mut self.white, leds.white, "led white");
        self.current = leds;
    }

    pub fn off(&mut self) {
        self.set(Leds::OFF);
    }

    pub fn current(&self) -> Leds {
        self.current
    }
}
