//! Telemetry event sink adapter.
//!
//! Implements [`EventSink`] by writing every application event as a tagged
//! line to the [`Logfile`] and queueing the dashboard-worthy ones for the
//! publisher task.  The queue is fire-and-forget: when it is full the
//! message is dropped and counted, the control loop never waits.

use std::io::Write;

use log::{debug, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::telemetry::{LogTag, Logfile, Outbox, Severity, TelemetryMessage};

pub struct TelemetrySink<'a, W: Write> {
    logfile: &'a Logfile<W>,
    outbox: &'a Outbox,
    /// Echo the per-cycle values line on the console.
    console_values: bool,
    dropped: u32,
    write_failed: bool,
}

impl<'a, W: Write> TelemetrySink<'a, W> {
    pub fn new(logfile: &'a Logfile<W>, outbox: &'a Outbox, console_values: bool) -> Self {
        Self {
            logfile,
            outbox,
            console_values,
            dropped: 0,
            write_failed: false,
        }
    }

    /// Messages lost because the publisher queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    fn line(&mut self, at_ms: u32, tag: LogTag, text: &str, console: bool) {
        match self.logfile.log(at_ms, tag, text, console) {
            Ok(()) => self.write_failed = false,
            Err(e) if !self.write_failed => {
                self.write_failed = true;
                warn!("Log write failed: {}", e);
            }
            Err(_) => {}
        }
    }

    fn publish(&mut self, message: TelemetryMessage) {
        if self.outbox.try_send(message).is_err() {
            self.dropped += 1;
            debug!("Outbox full, {} messages dropped so far", self.dropped);
        }
    }

    fn annotate(&mut self, title: &str, text: String, severity: Severity) {
        self.publish(TelemetryMessage::Annotation {
            title: title.to_string(),
            text,
            severity,
        });
    }
}

impl<W: Write> EventSink for TelemetrySink<'_, W> {
    fn emit(&mut self, at_ms: u32, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                self.line(at_ms, LogTag::LogInfo, &format!("Started in '{state}'"), true);
            }
            AppEvent::SensorsHeader(header) => {
                self.line(at_ms, LogTag::SensorsHeader, header, true);
            }
            AppEvent::StateChanged { from, to, reason } => {
                // The FSM already logged the transition on the console.
                self.line(at_ms, LogTag::SmState, &format!("{from} {to} {reason}"), false);
                self.annotate("state", format!("'{from}' -> '{to}': {reason}"), Severity::Info);
            }
            AppEvent::SensorFault { sensor, fault } => {
                let text = format!("Sensor '{sensor}' broken: {fault}");
                self.line(at_ms, LogTag::LogError, &text, true);
                self.annotate("sensor", text, Severity::Error);
            }
            AppEvent::Telemetry(data) => {
                self.line(at_ms, LogTag::SensorsValues, &data.values(), self.console_values);
                self.publish(TelemetryMessage::Fields(data.clone()));
            }
            AppEvent::Info(text) => {
                self.line(at_ms, LogTag::LogInfo, text, true);
            }
            AppEvent::Warning(text) => {
                self.line(at_ms, LogTag::LogWarning, text, true);
                self.annotate("warning", text.clone(), Severity::Warning);
            }
        }
    }
}
