//! ESP32 time adapter.
//!
//! Provides the monotonic millisecond clock of the control loop.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`** — uses `std::time::Instant` for
//!   host-side testing and simulation.
//!
//! Milliseconds are truncated to `u32` and wrap after ~49.7 days; all
//! consumers compare them with `wrapping_sub`.

use std::time::Duration;

use crate::app::ports::ClockPort;

pub struct SystemClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since construction (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl ClockPort for SystemClock {
    fn now_ms(&self) -> u32 {
        (self.uptime_us() / 1000) as u32
    }

    fn sleep_ms(&mut self, ms: u32) {
        // FreeRTOS-backed on the device, yields to the other tasks.
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}
