//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to.  It contains the latest sensor snapshot, actuator command
//! outputs, timing, configuration, and the per-state memory of the
//! dryer cycle.  Think of it as the "blackboard" in a blackboard architecture.

use crate::config::SystemConfig;
use crate::timebase::elapsed_ms;

use super::history::History;

// ---------------------------------------------------------------------------
// Sensor snapshot (read-only to state handlers; written by sensor hub)
// ---------------------------------------------------------------------------

/// Climate at one measuring location.  `None` = not measured or broken.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Climate {
    pub temperature_c: Option<f32>,
    pub humidity_rh: Option<f32>,
    pub dew_point_c: Option<f32>,
    /// Absolute humidity (g water / kg dry air).
    pub abs_g_kg: Option<f32>,
}

/// A point-in-time snapshot of every sensor in the system.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    /// Heater board probe (°C), also the over-temperature guard input.
    pub heater_probe_c: Option<f32>,
    /// Heater / desiccant chamber.
    pub heater: Climate,
    /// Outside air.
    pub ambient: Climate,
    /// Filament compartment.
    pub filament: Climate,
}

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; consumed by the service)
// ---------------------------------------------------------------------------

/// Status LED levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Leds {
    pub green: bool,
    pub red: bool,
    pub white: bool,
}

impl Leds {
    pub const OFF: Self = Self::new(false, false, false);

    pub const fn new(green: bool, red: bool, white: bool) -> Self {
        Self { green, red, white }
    }
}

/// Commands that state handlers write to request actuator actions.
/// The service applies these to the hardware every cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorCommands {
    pub heater_on: bool,
    /// Exhaust fan venting the heater chamber to the outside.
    pub fan_ambient: bool,
    /// Fans circulating air between desiccant and filament.
    pub fan_process: bool,
    pub leds: Leds,
}

impl ActuatorCommands {
    /// Heater and fans off, LEDs untouched.
    pub fn quiet(leds: Leds) -> Self {
        Self {
            leds,
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Control-loop time of the current evaluation (ms, wrapping).
    pub now_ms: u32,
    /// Time the current state was entered (ms, wrapping).
    pub entered_at_ms: u32,

    // -- Sensor data --
    pub sensors: SensorSnapshot,

    // -- Actuator outputs --
    pub commands: ActuatorCommands,

    // -- Configuration --
    pub config: SystemConfig,

    // -- Regenerate memory --
    /// Last time the exhaust fan was on (or the chamber was not hot).
    pub last_fan_on_ms: u32,

    // -- DryFan memory --
    pub history: History,
    pub next_sample_ms: u32,

    // -- DryWait memory --
    /// Filament absolute humidity when DryWait was entered.
    pub drywait_entry_g_kg: Option<f32>,

    /// Progress messages from handlers, drained by the service each tick.
    pub notes: Vec<String>,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            now_ms: 0,
            entered_at_ms: 0,
            sensors: SensorSnapshot::default(),
            commands: ActuatorCommands::default(),
            history: History::new(config.dryfan_samples),
            config,
            last_fan_on_ms: 0,
            next_sample_ms: 0,
            drywait_entry_g_kg: None,
            notes: Vec::new(),
        }
    }

    /// Milliseconds since the current state was entered.
    pub fn ms_in_state(&self) -> u32 {
        elapsed_ms(self.entered_at_ms, self.now_ms)
    }

    pub fn note(&mut self, text: String) {
        self.notes.push(text);
    }
}
