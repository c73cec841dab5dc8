//! Actuator drivers and peripheral helpers.
//!
//! Output drivers are generic over [`embedded_hal::digital::OutputPin`];
//! on the device they wrap `esp_idf_hal` pin drivers, on the host a fake
//! pin that records writes.

pub mod button;
pub mod fan;
pub mod heater;
pub mod status_led;
pub mod watchdog;

use embedded_hal::digital::OutputPin;

/// Write one output level.  A GPIO write failure is logged, not raised.
pub(crate) fn drive(pin: &mut impl OutputPin, on: bool, what: &str) {
    let result = if on { pin.set_high() } else { pin.set_low() };
    if let Err(e) = result {
        log::warn!("GPIO write to {} failed: {:?}", what, e);
    }
}
