//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and all actuator drivers, exposing them
//! through [`SensorPort`] and [`ActuatorPort`].  This is the only
//! module in the system that touches actual hardware.  The drivers are
//! generic over `embedded-hal` pins, so the host tests run it against
//! recording fakes.

use embedded_hal::digital::OutputPin;

use crate::app::events::TelemetryField;
use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::fan::FanBank;
use crate::drivers::heater::HeaterDriver;
use crate::drivers::status_led::StatusLeds;
use crate::fsm::context::{Leds, SensorSnapshot};
use crate::sensors::{SensorFailure, SensorHub};
use crate::timebase::Timing;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<P: OutputPin> {
    sensor_hub: SensorHub,
    heater: HeaterDriver<P>,
    fans: FanBank<P>,
    leds: StatusLeds<P>,
}

impl<P: OutputPin> HardwareAdapter<P> {
    pub fn new(
        sensor_hub: SensorHub,
        heater: HeaterDriver<P>,
        fans: FanBank<P>,
        leds: StatusLeds<P>,
    ) -> Self {
        Self {
            sensor_hub,
            heater,
            fans,
            leds,
        }
    }

    pub fn sensor_hub(&self) -> &SensorHub {
        &self.sensor_hub
    }

    /// Output levels logged alongside the sensor readings.
    fn output_fields(&self) -> [TelemetryField; 7] {
        let leds = self.leds.current();
        [
            TelemetryField::level("led_green", leds.green),
            TelemetryField::level("led_red", leds.red),
            TelemetryField::level("led_white", leds.white),
            TelemetryField::level("heater_requested", self.heater.requested()),
            TelemetryField::level("heater_power", self.heater.applied()),
            TelemetryField::level("filament_Fan", self.fans.filament.is_on()),
            TelemetryField::level("ambient_Fan", self.fans.ambient.is_on()),
        ]
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<P: OutputPin> SensorPort for HardwareAdapter<P> {
    fn measure(&mut self, timing: &mut impl Timing) -> Vec<SensorFailure> {
        self.sensor_hub.measure(timing)
    }

    fn snapshot(&self) -> SensorSnapshot {
        self.sensor_hub.snapshot()
    }

    fn fields(&self) -> Vec<TelemetryField> {
        let mut fields = self.output_fields().to_vec();
        fields.extend(self.sensor_hub.fields());
        fields
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<P: OutputPin> ActuatorPort for HardwareAdapter<P> {
    fn set_heater(&mut self, on: bool) {
        self.heater.set_power(on);
    }

    fn set_heater_board_temperature(&mut self, celsius: Option<f32>) {
        self.heater.set_board_temperature(celsius);
    }

    fn heater_applied(&self) -> bool {
        self.heater.applied()
    }

    fn set_fans(&mut self, ambient: bool, process: bool) {
        self.fans.set(ambient, process);
    }

    fn set_leds(&mut self, leds: Leds) {
        self.leds.set(leds);
    }

    fn all_off(&mut self) {
        self.heater.set_power(false);
        self.fans.set(false, false);
        self.leds.off();
    }
}
