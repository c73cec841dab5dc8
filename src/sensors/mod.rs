//! Sensor subsystem.
//!
//! [`SensorHub`] owns every probe behind the [`Sensor`] capability trait
//! and runs the three-phase measurement each control cycle:
//!
//! ```text
//!  trigger_conversion ─▶ read_fast ─▶ wait(slowest conversion − spent) ─▶ read_slow
//! ```
//!
//! A probe whose phase call returns `Err` is marked broken on the spot,
//! skipped by every later phase and cycle, and rendered as
//! [`UNAVAILABLE`] from then on.  The hub itself never fails.

pub mod ds18b20;
pub mod sht3x;

use log::debug;

use crate::app::events::TelemetryField;
use crate::error::SensorFault;
use crate::fsm::context::{Climate, SensorSnapshot};
use crate::timebase::{Timing, elapsed_ms};

/// Rendering of a reading whose sensor is broken.
pub const UNAVAILABLE: &str = "unavailable";

/// Rendering of a reading that has not been measured yet.
pub const NOT_MEASURED: &str = "-";

// ── Locations ─────────────────────────────────────────────────

/// SHT3x inside the heater / desiccant chamber.
pub const HEATER: &str = "heater";
/// SHT3x outside the box.
pub const AMBIENT: &str = "ambient";
/// SHT3x in the filament compartment.
pub const FILAMENT: &str = "filament";
/// DS18B20 on the heater board, the safety probe.
pub const HEATER_PROBE: &str = "heater_ds18";

// ───────────────────────────────────────────────────────────────
// Readings
// ───────────────────────────────────────────────────────────────

/// Physical quantity of a [`Reading`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Temperature,
    RelativeHumidity,
    DewPoint,
    AbsoluteHumidity,
}

impl Quantity {
    /// Tag suffix appended to the sensor location.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Temperature => "_C",
            Self::RelativeHumidity => "_rH",
            Self::DewPoint => "_dew_C",
            Self::AbsoluteHumidity => "_abs_g_kg",
        }
    }

    fn decimals(self) -> usize {
        match self {
            Self::Temperature | Self::DewPoint => 1,
            Self::RelativeHumidity => 0,
            Self::AbsoluteHumidity => 2,
        }
    }
}

/// One named measurement.  `valid` goes `false` once its sensor breaks and
/// never comes back; the last value is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub location: &'static str,
    pub quantity: Quantity,
    pub value: Option<f32>,
    pub valid: bool,
}

impl Reading {
    pub fn new(location: &'static str, quantity: Quantity) -> Self {
        Self {
            location,
            quantity,
            value: None,
            valid: true,
        }
    }

    /// Telemetry tag, e.g. `filament_abs_g_kg`.
    pub fn tag(&self) -> String {
        format!("{}{}", self.location, self.quantity.suffix())
    }

    pub fn value_text(&self) -> String {
        match (self.valid, self.value) {
            (false, _) => UNAVAILABLE.to_string(),
            (true, None) => NOT_MEASURED.to_string(),
            (true, Some(v)) => format!("{v:.prec$}", prec = self.quantity.decimals()),
        }
    }

    /// The value, if the sensor is healthy and has measured.
    pub fn current(&self) -> Option<f32> {
        if self.valid { self.value } else { None }
    }
}

// ───────────────────────────────────────────────────────────────
// Sensor capability
// ───────────────────────────────────────────────────────────────

/// Capability contract every probe implements.  All phases default to
/// no-ops so a probe only implements the ones it needs.
pub trait Sensor {
    /// Location / instance name, e.g. `"ambient"`.
    fn name(&self) -> &'static str;

    /// Datasheet conversion time between trigger and `read_slow`.
    fn conversion_time_ms(&self) -> u32 {
        0
    }

    fn trigger_conversion(&mut self) -> Result<(), SensorFault> {
        Ok(())
    }

    fn read_fast(&mut self) -> Result<(), SensorFault> {
        Ok(())
    }

    fn read_slow(&mut self) -> Result<(), SensorFault> {
        Ok(())
    }

    fn readings(&self) -> &[Reading];

    fn readings_mut(&mut self) -> &mut [Reading];

    /// Invalidate every reading.  Sticky until restart.
    fn report_fault(&mut self) {
        for reading in self.readings_mut() {
            reading.valid = false;
        }
    }
}

/// A probe that broke during [`SensorHub::measure`].
#[derive(Debug, Clone, PartialEq)]
pub struct SensorFailure {
    pub sensor: &'static str,
    pub fault: SensorFault,
}

// ───────────────────────────────────────────────────────────────
// SensorHub
// ───────────────────────────────────────────────────────────────

struct Slot {
    sensor: Box<dyn Sensor>,
    broken: bool,
}

#[derive(Clone, Copy)]
enum Phase {
    Trigger,
    Fast,
    Slow,
}

/// Aggregates all sensors in a fixed order.
pub struct SensorHub {
    slots: Vec<Slot>,
}

impl SensorHub {
    pub fn new(sensors: Vec<Box<dyn Sensor>>) -> Self {
        Self {
            slots: sensors
                .into_iter()
                .map(|sensor| Slot {
                    sensor,
                    broken: false,
                })
                .collect(),
        }
    }

    /// One full sampling pass.  Returns the probes that broke in it.
    pub fn measure(&mut self, timing: &mut impl Timing) -> Vec<SensorFailure> {
        let mut failures = Vec::new();
        let started = timing.now_ms();
        let budget_ms = self
            .slots
            .iter()
            .filter(|s| !s.broken)
            .map(|s| s.sensor.conversion_time_ms())
            .max()
            .unwrap_or(0);

        self.run_phase(Phase::Trigger, &mut failures);
        self.run_phase(Phase::Fast, &mut failures);

        let spent_ms = elapsed_ms(started, timing.now_ms());
        if budget_ms > spent_ms {
            timing.pause_ms(budget_ms - spent_ms);
        }

        self.run_phase(Phase::Slow, &mut failures);
        failures
    }

    fn run_phase(&mut self, phase: Phase, failures: &mut Vec<SensorFailure>) {
        for index in 0..self.slots.len() {
            let slot = &mut self.slots[index];
            if slot.broken {
                continue;
            }
            let result = match phase {
                Phase::Trigger => slot.sensor.trigger_conversion(),
                Phase::Fast => slot.sensor.read_fast(),
                Phase::Slow => slot.sensor.read_slow(),
            };
            if let Err(fault) = result {
                if self.report_fault(index, fault) {
                    failures.push(SensorFailure {
                        sensor: self.slots[index].sensor.name(),
                        fault,
                    });
                }
            }
        }
    }

    /// Mark sensor `index` broken.  Returns `true` only the first time;
    /// repeated reports leave everything untouched and log nothing.
    pub fn report_fault(&mut self, index: usize, fault: SensorFault) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        if slot.broken {
            return false;
        }
        slot.broken = true;
        slot.sensor.report_fault();
        debug!("Sensor '{}' broken: {}", slot.sensor.name(), fault);
        true
    }

    pub fn is_broken(&self, index: usize) -> bool {
        self.slots.get(index).is_some_and(|s| s.broken)
    }

    pub fn broken_count(&self) -> usize {
        self.slots.iter().filter(|s| s.broken).count()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All readings, in sensor order.
    pub fn readings(&self) -> impl Iterator<Item = &Reading> {
        self.slots.iter().flat_map(|s| s.sensor.readings().iter())
    }

    /// Current value of one location/quantity pair.
    pub fn value(&self, location: &str, quantity: Quantity) -> Option<f32> {
        self.readings()
            .find(|r| r.location == location && r.quantity == quantity)
            .and_then(Reading::current)
    }

    fn climate(&self, location: &str) -> Climate {
        Climate {
            temperature_c: self.value(location, Quantity::Temperature),
            humidity_rh: self.value(location, Quantity::RelativeHumidity),
            dew_point_c: self.value(location, Quantity::DewPoint),
            abs_g_kg: self.value(location, Quantity::AbsoluteHumidity),
        }
    }

    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            heater_probe_c: self.value(HEATER_PROBE, Quantity::Temperature),
            heater: self.climate(HEATER),
            ambient: self.climate(AMBIENT),
            filament: self.climate(FILAMENT),
        }
    }

    pub fn fields(&self) -> Vec<TelemetryField> {
        self.readings()
            .map(|r| TelemetryField {
                tag: r.tag(),
                text: r.value_text(),
                value: r.current(),
            })
            .collect()
    }

    /// Space-separated reading tags.
    pub fn header(&self) -> String {
        self.readings().map(Reading::tag).collect::<Vec<_>>().join(" ")
    }

    /// Space-separated reading values, in [`header`](Self::header) order.
    pub fn values(&self) -> String {
        self.readings()
            .map(Reading::value_text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
