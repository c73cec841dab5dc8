//! Telemetry: the tagged line log on flash and the outbound publisher queue.

pub mod logfile;
pub mod outbox;

pub use logfile::{LogDirectory, LogTag, Logfile};
pub use outbox::{LogPublisher, Outbox, Severity, TelemetryMessage, drain_pending, run_publisher};
