//! Outbound telemetry queue and the publisher task that drains it.
//!
//! ```text
//! ┌──────────────┐  TelemetryMessage  ┌────────────────┐
//! │ Control loop │ ─── try_send ────▶ │ Publisher task │ ──▶ PublisherPort
//! │  (sync)      │   (drop if full)   │  (async)       │
//! └──────────────┘                    └────────────────┘
//! ```

use std::collections::BTreeMap;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::{info, warn};
use serde::Serialize;

use crate::app::events::TelemetryData;
use crate::app::ports::{PublishError, PublisherPort};

/// Depth of the control loop → publisher queue.
pub const OUTBOX_DEPTH: usize = 16;

pub type Outbox = Channel<CriticalSectionRawMutex, TelemetryMessage, OUTBOX_DEPTH>;

/// Severity of an [`TelemetryMessage::Annotation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryMessage {
    /// One row of readings and output levels.
    Fields(TelemetryData),
    /// Free-text event for dashboards (state changes, faults).
    Annotation {
        title: String,
        text: String,
        severity: Severity,
    },
    /// Ends [`run_publisher`].
    Shutdown,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Wire<'a> {
    Fields {
        state: &'static str,
        values: BTreeMap<&'a str, Option<f32>>,
    },
    Annotation {
        title: &'a str,
        text: &'a str,
        severity: Severity,
    },
    Shutdown,
}

impl TelemetryMessage {
    /// JSON document as sent to the remote endpoint.
    pub fn to_json(&self) -> Result<String, PublishError> {
        let wire = match self {
            Self::Fields(data) => Wire::Fields {
                state: data.state.name(),
                values: data
                    .fields
                    .iter()
                    .map(|f| (f.tag.as_str(), f.value))
                    .collect(),
            },
            Self::Annotation {
                title,
                text,
                severity,
            } => Wire::Annotation {
                title,
                text,
                severity: *severity,
            },
            Self::Shutdown => Wire::Shutdown,
        };
        serde_json::to_string(&wire).map_err(|_| PublishError::Encoding)
    }
}

// ───────────────────────────────────────────────────────────────
// Publisher task
// ───────────────────────────────────────────────────────────────

/// Forward every queued message to `publisher` until
/// [`TelemetryMessage::Shutdown`] arrives.  Publish failures are logged
/// and the message is dropped.  Returns the number of messages delivered.
pub async fn run_publisher(outbox: &Outbox, publisher: &mut impl PublisherPort) -> u32 {
    let mut delivered = 0;
    loop {
        let message = outbox.receive().await;
        if message == TelemetryMessage::Shutdown {
            info!("Publisher: shutdown after {} messages", delivered);
            return delivered;
        }
        match publisher.publish(&message) {
            Ok(()) => delivered += 1,
            Err(e) => warn!("Publisher: message dropped ({})", e),
        }
    }
}

/// Non-blocking variant: publish whatever is queued right now.
pub fn drain_pending(outbox: &Outbox, publisher: &mut impl PublisherPort) -> u32 {
    let mut delivered = 0;
    while let Ok(message) = outbox.try_receive() {
        if publisher.publish(&message).is_ok() {
            delivered += 1;
        }
    }
    delivered
}

/// Publisher that writes the JSON documents to the console log.  Used
/// when no network endpoint is configured.
#[derive(Debug, Default)]
pub struct LogPublisher {
    published: u32,
}

impl LogPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> u32 {
        self.published
    }
}

impl PublisherPort for LogPublisher {
    fn publish(&mut self, message: &TelemetryMessage) -> Result<(), PublishError> {
        let json = message.to_json()?;
        info!("PUBLISH {}", json);
        self.published += 1;
        Ok(())
    }
}
