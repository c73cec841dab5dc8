//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the device if the control loop
//! stalls for longer than the configured timeout (a hung I2C or one-wire
//! transaction is the usual suspect).
//!
//! The control loop feeds it through [`WatchdogPort`]; every sleep is
//! sliced so that no single pause outlives the timeout.  A feed arriving
//! after more than half the timeout is logged as a warning.
//!
//! Dropping the watchdog unsubscribes the task, so a control loop that
//! ends on purpose does not turn into a timeout panic.

use std::time::Instant;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

use crate::app::ports::WatchdogPort;

pub struct TaskWatchdog {
    timeout_ms: u32,
    last_feed: Instant,
    late_feeds: u32,
    subscribed: bool,
}

impl TaskWatchdog {
    /// Initialise and subscribe the calling task to the TWDT.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: plain FFI calls with a stack-allocated config; a null
            // task handle subscribes the calling task.
            unsafe {
                let cfg = esp_task_wdt_config_t {
                    timeout_ms,
                    idle_core_mask: 0,
                    trigger_panic: true,
                };
                let ret = esp_task_wdt_reconfigure(&cfg);
                if ret != ESP_OK {
                    warn!(
                        "TWDT reconfigure returned {} (may already be configured)",
                        ret
                    );
                }

                let ret = esp_task_wdt_add(core::ptr::null_mut());
                let subscribed = ret == ESP_OK;
                if subscribed {
                    info!("Watchdog: subscribed ({}ms timeout, panic on trigger)", timeout_ms);
                } else {
                    warn!("Watchdog: failed to subscribe ({})", ret);
                }

                Self {
                    timeout_ms,
                    last_feed: Instant::now(),
                    late_feeds: 0,
                    subscribed,
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog(sim): {}ms timeout, no-op", timeout_ms);
            Self {
                timeout_ms,
                last_feed: Instant::now(),
                late_feeds: 0,
                subscribed: true,
            }
        }
    }

    /// Remove the calling task from the TWDT.  Later feeds are no-ops.
    pub fn unsubscribe(&mut self) {
        if !self.subscribed {
            return;
        }
        self.subscribed = false;

        #[cfg(target_os = "espidf")]
        {
            // SAFETY: a null handle removes the calling task, the one that
            // subscribed in `new`.
            let ret = unsafe { esp_task_wdt_delete(core::ptr::null_mut()) };
            if ret != ESP_OK {
                warn!("Watchdog: failed to unsubscribe ({})", ret);
                return;
            }
        }
        info!("Watchdog: unsubscribed");
    }

    /// Feeds that arrived after more than half the timeout.
    pub fn late_feeds(&self) -> u32 {
        self.late_feeds
    }

    fn check_interval(&mut self) {
        let since_ms = self.last_feed.elapsed().as_millis();
        if since_ms > u128::from(self.timeout_ms / 2) {
            self.late_feeds += 1;
            warn!(
                "Watchdog: fed after {}ms (timeout {}ms)",
                since_ms, self.timeout_ms
            );
        }
        self.last_feed = Instant::now();
    }
}

impl WatchdogPort for TaskWatchdog {
    fn feed(&mut self) {
        if !self.subscribed {
            return;
        }
        self.check_interval();

        #[cfg(target_os = "espidf")]
        {
            // SAFETY: resets the TWDT entry of the calling task only.
            unsafe {
                esp_task_wdt_reset();
            }
        }
    }
}

impl Drop for TaskWatchdog {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
