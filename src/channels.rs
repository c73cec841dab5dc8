//! Inter-task communication channels.
//!
//! Uses `embassy-sync` bounded MPMC channels to bridge the synchronous
//! control loop with the publisher, button and console tasks.  The
//! channels live in one [`Mailboxes`] value that `main` keeps in a static.
//!
//! ```text
//! ┌──────────────┐   AppCommand     ┌──────────────┐
//! │ Button /     │ ───────────────▶ │ Control loop │
//! │ remote task  │                  │  (sync)      │
//! └──────────────┘                  └──────┬───────┘
//!                                          │ TelemetryMessage
//!                                          ▼
//!                                   ┌──────────────┐
//!                                   │  Publisher   │
//!                                   └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::app::commands::AppCommand;
use crate::telemetry::Outbox;

/// Channel depth for inbound commands.
pub const COMMAND_DEPTH: usize = 4;

pub type CommandInbox = Channel<CriticalSectionRawMutex, AppCommand, COMMAND_DEPTH>;

/// Every channel shared between tasks.
pub struct Mailboxes {
    /// Control loop → publisher.
    pub telemetry: Outbox,
    /// Button / remote → control loop.
    pub commands: CommandInbox,
}

impl Mailboxes {
    pub const fn new() -> Self {
        Self {
            telemetry: Channel::new(),
            commands: Channel::new(),
        }
    }
}

impl Default for Mailboxes {
    fn default() -> Self {
        Self::new()
    }
}
