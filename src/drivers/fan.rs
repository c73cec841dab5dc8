//! On/off fan outputs.
//!
//! The dryer has three fans: the ambient exhaust fan venting the heater
//! chamber, the fan pushing air through the silica gel into the filament
//! compartment, and the box fan circulating air inside the compartment.
//! The last two always run together as the "process" fans.

use embedded_hal::digital::OutputPin;

use super::drive;

pub struct Fan<P: OutputPin> {
    pin: P,
    name: &'static str,
    on: bool,
}

impl<P: OutputPin> Fan<P> {
    pub fn new(pin: P, name: &'static str) -> Self {
        let mut fan = Self {
            pin,
            name,
            on: false,
        };
        fan.set(false);
        fan
    }

    pub fn set(&mut self, on: bool) {
        drive(&mut self.pin, on, self.name);
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

pub struct FanBank<P: OutputPin> {
    pub ambient: Fan<P>,
    pub filament: Fan<P>,
    pub enclosure: Fan<P>,
}

impl<P: OutputPin> FanBank<P> {
    pub fn new(ambient: P, filament: P, enclosure: P) -> Self {
        Self {
            ambient: Fan::new(ambient, "ambient fan"),
            filament: Fan::new(filament, "filament fan"),
            enclosure: Fan::new(enclosure, "box fan"),
        }
    }

    pub fn set(&mut self, ambient: bool, process: bool) {
        self.ambient.set(ambient);
        self.filament.set(process);
        self.enclosure.set(process);
    }
}
