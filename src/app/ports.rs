//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, clock, watchdog, event sinks,
//! publishers) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the domain core never touches hardware directly.

use crate::fsm::context::{Leds, SensorSnapshot};
use crate::sensors::SensorFailure;
use crate::telemetry::TelemetryMessage;
use crate::timebase::Timing;

use super::events::TelemetryField;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain sensor data.
pub trait SensorPort {
    /// Run one full sampling pass.  Never fails; returns the sensors that
    /// broke during this pass.
    fn measure(&mut self, timing: &mut impl Timing) -> Vec<SensorFailure>;

    /// Derived per-location view of the latest valid readings.
    fn snapshot(&self) -> SensorSnapshot;

    /// Every reading and output level, in header order.
    fn fields(&self) -> Vec<TelemetryField>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command actuators.
pub trait ActuatorPort {
    /// Request heater power.  The over-temperature guard may still keep
    /// the output off.
    fn set_heater(&mut self, on: bool);

    /// Feed the latest heater board temperature into the guard.
    fn set_heater_board_temperature(&mut self, celsius: Option<f32>);

    /// Whether the heater output is currently energised.
    fn heater_applied(&self) -> bool;

    /// Drive the ambient exhaust fan and the process (filament) fans.
    fn set_fans(&mut self, ambient: bool, process: bool);

    /// Set the three status LEDs.
    fn set_leds(&mut self, leds: Leds);

    /// Kill all actuators — safe shutdown.
    fn all_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock and watchdog ports
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  Timestamps wrap at `u32::MAX`; compare
/// them with `wrapping_sub` only.
pub trait ClockPort {
    fn now_ms(&self) -> u32;

    /// Block the calling task.
    fn sleep_ms(&mut self, ms: u32);
}

/// Hardware watchdog.  Must be fed within the configured timeout.
pub trait WatchdogPort {
    fn feed(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port, stamped with the control-loop time.  Adapters decide
/// where they go (log file, console, publisher queue).
pub trait EventSink {
    fn emit(&mut self, at_ms: u32, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Publisher port (connectivity task → remote collaborator)
// ───────────────────────────────────────────────────────────────

/// Delivers telemetry messages to a remote endpoint (MQTT broker, serial
/// bridge).  Called from the connectivity task only.
pub trait PublisherPort {
    fn publish(&mut self, message: &TelemetryMessage) -> Result<(), PublishError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors raised while loading the configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The config document could not be parsed.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

/// Errors from [`PublisherPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// The remote endpoint is not reachable right now.
    Disconnected,
    /// The message could not be encoded.
    Encoding,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::fmt::Display for PublishError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "publisher disconnected"),
            Self::Encoding => write!(f, "encoding failed"),
        }
    }
}
