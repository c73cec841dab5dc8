//! System configuration parameters
//!
//! All tunable parameters for the filament dryer.  The configuration is
//! loaded once at startup (JSON file on flash, or the defaults below) and
//! is immutable afterwards.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Timing ---
    /// Control cycle period (milliseconds)
    pub control_cycle_ms: u32,
    /// Hardware watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
    /// Longest uninterrupted sleep between two watchdog feeds (milliseconds)
    pub watchdog_slice_ms: u32,

    // --- Safety ---
    /// Heater board temperature (Celsius) above which the heater is forced off
    pub heater_board_max_c: f32,

    // --- Regenerate ---
    /// Heater-vs-ambient dew-point difference (Celsius) that switches the ambient fan on
    pub regenerate_diff_dew_c: f32,
    /// Heater chamber temperature (Celsius) at which the no-fan timer runs
    pub regenerate_hot_c: f32,
    /// Continuous fan-off time (milliseconds) that ends regeneration
    pub regenerate_no_fan_ms: u32,

    // --- Cooldown ---
    /// Heater chamber temperature (Celsius) below which drying starts
    pub cooldown_heater_c: f32,

    // --- DryFan ---
    /// Interval between two filament humidity samples (milliseconds)
    pub dryfan_sample_interval_ms: u32,
    /// Capacity of the filament humidity history
    pub dryfan_samples: usize,
    /// Minimum drop of filament absolute humidity (g/kg) across the history
    pub dryfan_min_drop_g_kg: f32,
    /// Filament absolute humidity (g/kg) considered "dry enough"
    pub dryfan_setpoint_g_kg: f32,

    // --- DryWait ---
    /// Rise of filament absolute humidity (g/kg) that restarts the fans
    pub drywait_rise_g_kg: f32,
    /// Entry filament absolute humidity (g/kg) above which regeneration is due
    pub drywait_max_g_kg: f32,
    /// Minimum time in DryWait before going back to Regenerate (milliseconds)
    pub drywait_min_time_ms: u32,

    // --- Environment ---
    /// Air pressure used for absolute humidity (Pascal)
    pub pressure_pa: f32,

    // --- User interface ---
    /// Button hold time that resets the device (milliseconds)
    pub long_press_ms: u32,
    /// Echo every `SENSORS_VALUES` line to the console
    pub console_values: bool,
}

/// Largest supported DryFan history.
pub const MAX_DRYFAN_SAMPLES: usize = 32;

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Timing
            control_cycle_ms: 10_000,
            watchdog_timeout_ms: 8_000,
            watchdog_slice_ms: 3_500,

            // Safety
            heater_board_max_c: 110.0,

            // Regenerate
            regenerate_diff_dew_c: 10.0,
            regenerate_hot_c: 105.0,
            regenerate_no_fan_ms: 17_000,

            // Cooldown
            cooldown_heater_c: 60.0,

            // DryFan: 10 samples * 2 min = 20 min window
            dryfan_sample_interval_ms: 120_000,
            dryfan_samples: 10,
            dryfan_min_drop_g_kg: 0.0,
            dryfan_setpoint_g_kg: 3.0,

            // DryWait
            drywait_rise_g_kg: 0.5,
            drywait_max_g_kg: 4.0,
            drywait_min_time_ms: 30 * 60 * 1000,

            // Environment
            pressure_pa: 101_325.0,

            // User interface
            long_press_ms: 5_000,
            console_values: false,
        }
    }
}

impl SystemConfig {
    /// Parse a (possibly partial) JSON document and validate the result.
    ///
    /// Missing fields keep their default value.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|_| ConfigError::Corrupted)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the controller unsafe or meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.control_cycle_ms == 0 {
            return Err(ConfigError::ValidationFailed("control_cycle_ms must be > 0"));
        }
        if self.watchdog_slice_ms == 0 || self.watchdog_slice_ms >= self.watchdog_timeout_ms {
            return Err(ConfigError::ValidationFailed(
                "watchdog_slice_ms must be in 1..watchdog_timeout_ms",
            ));
        }
        if !(self.heater_board_max_c > 0.0 && self.heater_board_max_c <= 150.0) {
            return Err(ConfigError::ValidationFailed(
                "heater_board_max_c must be in (0, 150]",
            ));
        }
        if self.regenerate_hot_c > self.heater_board_max_c {
            return Err(ConfigError::ValidationFailed(
                "regenerate_hot_c must not exceed heater_board_max_c",
            ));
        }
        if self.cooldown_heater_c >= self.regenerate_hot_c {
            return Err(ConfigError::ValidationFailed(
                "cooldown_heater_c must be below regenerate_hot_c",
            ));
        }
        if self.dryfan_sample_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "dryfan_sample_interval_ms must be > 0",
            ));
        }
        if self.dryfan_samples == 0 || self.dryfan_samples > MAX_DRYFAN_SAMPLES {
            return Err(ConfigError::ValidationFailed(
                "dryfan_samples must be in 1..=32",
            ));
        }
        if self.drywait_rise_g_kg < 0.0 {
            return Err(ConfigError::ValidationFailed("drywait_rise_g_kg must be >= 0"));
        }
        if !(self.pressure_pa > 10_000.0 && self.pressure_pa < 200_000.0) {
            return Err(ConfigError::ValidationFailed(
                "pressure_pa must be in (10000, 200000)",
            ));
        }
        Ok(())
    }
}
