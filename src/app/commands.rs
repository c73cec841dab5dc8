//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (button task,
//! remote command channel) that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Force the FSM into a state by its symbolic name, e.g. `"dryfan"`.
    /// Unknown names are rejected with a warning.
    ForceState(String),

    /// Jump to the current state's successor at the next tick (button).
    Forward,

    /// Switch everything off, flush the log and leave the control loop.
    Stop,
}

impl AppCommand {
    /// Parse one console line: `forward`, `stop` or `state <name>`.
    /// The state name is checked later, by the FSM.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split_whitespace();
        let command = match (words.next()?, words.next()) {
            ("forward" | "fw", None) => Self::Forward,
            ("stop", None) => Self::Stop,
            ("state", Some(name)) => Self::ForceState(name.to_string()),
            _ => return None,
        };
        words.next().is_none().then_some(command)
    }
}
