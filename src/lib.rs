//! Filament dryer firmware library.
//!
//! A filament box is dried by a heater that regenerates silica gel and a
//! set of fans that move air through it.  The control logic lives here as
//! plain Rust so it runs unchanged on the host for testing; everything
//! that touches ESP-IDF is guarded by `#[cfg(target_os = "espidf")]`
//! inside each module.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod channels;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;
pub mod humidity;
pub mod pins;
pub mod sensors;
pub mod telemetry;
pub mod timebase;
