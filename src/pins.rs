//! GPIO / peripheral pin assignments for the filament dryer board
//! (ESP32-S3).
//!
//! Single source of truth — every driver is built from this module rather
//! than hard-coding pin numbers.  Change a pin here and it propagates
//! everywhere.

// ---------------------------------------------------------------------------
// Heater (two MOSFET channels, always switched together)
// ---------------------------------------------------------------------------

pub const HEATER_A_GPIO: i32 = 7;
pub const HEATER_B_GPIO: i32 = 8;

// ---------------------------------------------------------------------------
// Fans (low-side MOSFETs, active HIGH)
// ---------------------------------------------------------------------------

/// Exhaust fan venting the heater chamber to the outside.
pub const FAN_AMBIENT_GPIO: i32 = 4;
/// Fan blowing through the silica gel into the filament compartment.
pub const FAN_FILAMENT_GPIO: i32 = 5;
/// Circulation fan inside the filament box.
pub const FAN_BOX_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Status LEDs (active HIGH)
// ---------------------------------------------------------------------------

pub const LED_GREEN_GPIO: i32 = 15;
pub const LED_RED_GPIO: i32 = 16;
pub const LED_WHITE_GPIO: i32 = 17;

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// DS18B20 on the heater board (open drain, 4.7 kΩ pull-up).
pub const ONEWIRE_GPIO: i32 = 9;

/// I²C0: ambient SHT3x.
pub const I2C0_SDA_GPIO: i32 = 1;
pub const I2C0_SCL_GPIO: i32 = 2;

/// I²C1: heater and filament SHT3x.
pub const I2C1_SDA_GPIO: i32 = 10;
pub const I2C1_SCL_GPIO: i32 = 11;

pub const I2C_FREQ_HZ: u32 = 400_000;

// ---------------------------------------------------------------------------
// User button (active-low with pull-up)
// ---------------------------------------------------------------------------

/// Short press: forward to the next state.  Long press: restart.
pub const BUTTON_GPIO: i32 = 0;
