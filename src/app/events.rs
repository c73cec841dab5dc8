//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: append to the log file, echo to the
//! console, queue for the publisher task.

use crate::error::SensorFault;
use crate::fsm::StateId;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// Space-separated tags of every value in [`TelemetryData`], once at start.
    SensorsHeader(String),

    /// The FSM transitioned between states.
    StateChanged {
        from: StateId,
        to: StateId,
        reason: String,
    },

    /// A sensor broke during this cycle and is excluded from now on.
    SensorFault {
        sensor: &'static str,
        fault: SensorFault,
    },

    /// Periodic telemetry snapshot, once per cycle.
    Telemetry(TelemetryData),

    /// Progress note (DryFan sampling, remote interventions).
    Info(String),

    /// Something odd that the loop absorbed.
    Warning(String),
}

/// One column of the telemetry table.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryField {
    /// Column name, e.g. `filament_abs_g_kg`.
    pub tag: String,
    /// Rendered value, [`UNAVAILABLE`](crate::sensors::UNAVAILABLE) for broken sensors.
    pub text: String,
    /// Numeric value when known; outputs render as `0.0` / `1.0`.
    pub value: Option<f32>,
}

impl TelemetryField {
    /// A binary output level.
    pub fn level(tag: &str, on: bool) -> Self {
        Self {
            tag: tag.to_string(),
            text: if on { "1" } else { "0" }.to_string(),
            value: Some(if on { 1.0 } else { 0.0 }),
        }
    }
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub state: StateId,
    pub fields: Vec<TelemetryField>,
}

impl TelemetryData {
    /// Column names, starting with the state pseudo-column.
    pub fn header(&self) -> String {
        core::iter::once("state")
            .chain(self.fields.iter().map(|f| f.tag.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Column values, in [`header`](Self::header) order.
    pub fn values(&self) -> String {
        core::iter::once(self.state.name())
            .chain(self.fields.iter().map(|f| f.text.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn field(&self, tag: &str) -> Option<&TelemetryField> {
        self.fields.iter().find(|f| f.tag == tag)
    }
}
