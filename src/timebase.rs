//! Control-cycle pacing and watchdog-safe sleeping.
//!
//! ```text
//!   deadline n        deadline n+1 = n + interval
//!   │ cycle work │ sleep ≤ slice │ feed │ sleep ≤ slice │ feed │
//! ```
//!
//! Every blocking wait in the control task goes through [`Timing::pause_ms`],
//! which never sleeps longer than the watchdog slice in one piece and feeds
//! the watchdog before and after each piece.  The two places that block are
//! [`Timebase::sleep_until_next_cycle`] and the sensor conversion wait.

use crate::app::ports::{ClockPort, WatchdogPort};

/// Milliseconds from `since` to `now`, immune to `u32` wraparound.
pub fn elapsed_ms(since: u32, now: u32) -> u32 {
    now.wrapping_sub(since)
}

/// `true` once `now` is at or past `deadline` (wraparound-safe for
/// distances below ~24 days).
pub fn reached(now: u32, deadline: u32) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}

/// Time source for the control task: a clock plus a blocking wait that
/// keeps the watchdog fed.
pub trait Timing {
    fn now_ms(&self) -> u32;

    /// Block for `ms`, servicing the watchdog along the way.  `0` only feeds.
    fn pause_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// GuardedClock
// ───────────────────────────────────────────────────────────────

/// [`Timing`] implementation that slices sleeps for a watchdog.
pub struct GuardedClock<C, W> {
    clock: C,
    watchdog: W,
    slice_ms: u32,
}

impl<C: ClockPort, W: WatchdogPort> GuardedClock<C, W> {
    pub fn new(clock: C, watchdog: W, slice_ms: u32) -> Self {
        Self {
            clock,
            watchdog,
            slice_ms: slice_ms.max(1),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }

    pub fn watchdog_mut(&mut self) -> &mut W {
        &mut self.watchdog
    }
}

impl<C: ClockPort, W: WatchdogPort> Timing for GuardedClock<C, W> {
    fn now_ms(&self) -> u32 {
        self.clock.now_ms()
    }

    fn pause_ms(&mut self, ms: u32) {
        let mut remaining = ms;
        self.watchdog.feed();
        while remaining > 0 {
            let slice = remaining.min(self.slice_ms);
            self.clock.sleep_ms(slice);
            self.watchdog.feed();
            remaining -= slice;
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Timebase
// ───────────────────────────────────────────────────────────────

/// Fixed-period cycle scheduler.
pub struct Timebase {
    interval_ms: u32,
    deadline_ms: u32,
    overruns: u32,
}

impl Timebase {
    /// Start counting cycles from `now_ms`.
    pub fn new(interval_ms: u32, now_ms: u32) -> Self {
        Self {
            interval_ms,
            deadline_ms: now_ms,
            overruns: 0,
        }
    }

    /// Advance the deadline by one interval and block until it.
    ///
    /// If the cycle overran its deadline the call returns at once.
    pub fn sleep_until_next_cycle(&mut self, timing: &mut impl Timing) {
        self.deadline_ms = self.deadline_ms.wrapping_add(self.interval_ms);
        let now = timing.now_ms();
        if reached(now, self.deadline_ms) {
            self.overruns = self.overruns.wrapping_add(1);
            return;
        }
        timing.pause_ms(elapsed_ms(now, self.deadline_ms));
    }

    /// The deadline the next cycle starts at.
    pub fn deadline_ms(&self) -> u32 {
        self.deadline_ms
    }

    /// Cycles that started late since startup.
    pub fn overruns(&self) -> u32 {
        self.overruns
    }
}
