//! Debounced push button with short and long press detection.
//!
//! ## Hardware
//!
//! Active-low momentary switch with pull-up.  The button task samples the
//! level every few milliseconds and feeds it to [`ButtonDriver::poll`];
//! the driver itself is pure so it runs unchanged on the host.
//!
//! ## Gesture detection
//!
//! | Gesture     | Condition                         | Event        |
//! |-------------|-----------------------------------|--------------|
//! | Short press | Released before the long-press time | `ShortPress` |
//! | Long press  | Held for the long-press time      | `LongPress` (once, while still held) |
//!
//! Level changes closer than [`DEBOUNCE_MS`] to the previous accepted
//! change are bounce and ignored.

/// Minimum time between two accepted level changes.
pub const DEBOUNCE_MS: u32 = 20;

/// Button events emitted after gesture classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    ShortPress,
    LongPress,
}

/// Internal state machine for gesture detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Released,
    Pressed { since_ms: u32 },
    /// Long press already reported; wait for release.
    Held,
}

pub struct ButtonDriver {
    long_press_ms: u32,
    state: GestureState,
    last_change_ms: Option<u32>,
}

impl ButtonDriver {
    pub fn new(long_press_ms: u32) -> Self {
        Self {
            long_press_ms,
            state: GestureState::Released,
            last_change_ms: None,
        }
    }

    /// Feed the current level (`pressed` already inverted for active-low).
    /// Returns a classified gesture event, if any.
    pub fn poll(&mut self, now_ms: u32, pressed: bool) -> Option<ButtonEvent> {
        let level_changed = match self.state {
            GestureState::Released => pressed,
            GestureState::Pressed { .. } | GestureState::Held => !pressed,
        };

        if level_changed {
            let bouncing = self
                .last_change_ms
                .is_some_and(|t| now_ms.wrapping_sub(t) < DEBOUNCE_MS);
            if bouncing {
                return None;
            }
            self.last_change_ms = Some(now_ms);
        }

        match (self.state, level_changed) {
            (GestureState::Released, true) => {
                self.state = GestureState::Pressed { since_ms: now_ms };
                None
            }
            (GestureState::Pressed { .. }, true) => {
                self.state = GestureState::Released;
                Some(ButtonEvent::ShortPress)
            }
            (GestureState::Pressed { since_ms }, false) => {
                if now_ms.wrapping_sub(since_ms) >= self.long_press_ms {
                    self.state = GestureState::Held;
                    Some(ButtonEvent::LongPress)
                } else {
                    None
                }
            }
            (GestureState::Held, true) => {
                self.state = GestureState::Released;
                None
            }
            (GestureState::Released | GestureState::Held, false) => None,
        }
    }
}
