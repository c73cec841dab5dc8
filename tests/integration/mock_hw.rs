//! Scripted hardware for integration tests.
//!
//! The real [`HardwareAdapter`] is used end to end; only the leaves are
//! fake: sensors read their values from a shared [`Air`] script and pins
//! just remember their level.

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin};

use filament_dryer::adapters::hardware::HardwareAdapter;
use filament_dryer::app::events::AppEvent;
use filament_dryer::app::ports::{EventSink, PublisherPort, PublishError};
use filament_dryer::app::service::AppService;
use filament_dryer::config::SystemConfig;
use filament_dryer::drivers::fan::FanBank;
use filament_dryer::drivers::heater::HeaterDriver;
use filament_dryer::drivers::status_led::StatusLeds;
use filament_dryer::error::SensorFault;
use filament_dryer::sensors::{self, Quantity, Reading, Sensor, SensorHub};
use filament_dryer::telemetry::TelemetryMessage;
use filament_dryer::timebase::Timing;

// ── Air script ────────────────────────────────────────────────

/// What the probes will report on their next read.
#[derive(Debug, Clone, Copy, Default)]
pub struct Air {
    pub heater_probe_c: Option<f32>,
    pub heater_dew_c: Option<f32>,
    pub ambient_dew_c: Option<f32>,
    pub filament_abs_g_kg: Option<f32>,
}

pub type AirScript = Rc<RefCell<Air>>;

type Source = fn(&Air) -> Option<f32>;

// ── ScriptedSensor ────────────────────────────────────────────

pub struct ScriptedSensor {
    name: &'static str,
    readings: Vec<Reading>,
    sources: Vec<Source>,
    air: AirScript,
    reads: Rc<Cell<u32>>,
    fail_on_read: Option<u32>,
}

impl ScriptedSensor {
    fn new(name: &'static str, quantity: Quantity, source: Source, air: &AirScript) -> Self {
        Self {
            name,
            readings: vec![Reading::new(name, quantity)],
            sources: vec![source],
            air: Rc::clone(air),
            reads: Rc::new(Cell::new(0)),
            fail_on_read: None,
        }
    }

    /// `read_slow` fails on its `n`-th call (1-based).
    pub fn failing_on_read(mut self, n: u32) -> Self {
        self.fail_on_read = Some(n);
        self
    }

    /// Shared counter of `read_slow` calls.
    pub fn reads(&self) -> Rc<Cell<u32>> {
        Rc::clone(&self.reads)
    }
}

impl Sensor for ScriptedSensor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn read_slow(&mut self) -> Result<(), SensorFault> {
        let n = self.reads.get() + 1;
        self.reads.set(n);
        if self.fail_on_read == Some(n) {
            return Err(SensorFault::Crc);
        }
        let air = *self.air.borrow();
        for (reading, source) in self.readings.iter_mut().zip(&self.sources) {
            reading.value = source(&air);
        }
        Ok(())
    }

    fn readings(&self) -> &[Reading] {
        &self.readings
    }

    fn readings_mut(&mut self) -> &mut [Reading] {
        &mut self.readings
    }
}

/// The four probes of the dryer, in hub order.
pub struct Probes {
    pub heater_probe: ScriptedSensor,
    pub heater: ScriptedSensor,
    pub ambient: ScriptedSensor,
    pub filament: ScriptedSensor,
}

impl Probes {
    pub fn new(air: &AirScript) -> Self {
        Self {
            heater_probe: ScriptedSensor::new(sensors::HEATER_PROBE, Quantity::Temperature, |a| a.heater_probe_c, air),
            heater: ScriptedSensor::new(sensors::HEATER, Quantity::DewPoint, |a| a.heater_dew_c, air),
            ambient: ScriptedSensor::new(sensors::AMBIENT, Quantity::DewPoint, |a| a.ambient_dew_c, air),
            filament: ScriptedSensor::new(sensors::FILAMENT, Quantity::AbsoluteHumidity, |a| a.filament_abs_g_kg, air),
        }
    }

    pub fn into_hub(self) -> SensorHub {
        SensorHub::new(vec![
            Box::new(self.heater_probe),
            Box::new(self.heater),
            Box::new(self.ambient),
            Box::new(self.filament),
        ])
    }
}

// ── Pins ──────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct TestPin {
    pub high: bool,
}

impl ErrorType for TestPin {
    type Error = Infallible;
}

impl OutputPin for TestPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

pub type TestHardware = HardwareAdapter<TestPin>;

pub fn hardware(hub: SensorHub, heater_max_c: f32) -> TestHardware {
    HardwareAdapter::new(
        hub,
        HeaterDriver::new(TestPin::default(), TestPin::default(), heater_max_c),
        FanBank::new(TestPin::default(), TestPin::default(), TestPin::default()),
        StatusLeds::new(TestPin::default(), TestPin::default(), TestPin::default()),
    )
}

// ── Clock ─────────────────────────────────────────────────────

/// Time only moves when a test (or a pause) moves it.
#[derive(Debug, Default)]
pub struct ManualClock {
    pub now: u32,
    pub paused_ms: u32,
}

impl Timing for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now
    }

    fn pause_ms(&mut self, ms: u32) {
        self.now = self.now.wrapping_add(ms);
        self.paused_ms += ms;
    }
}

// ── Sinks ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<(u32, AppEvent)>,
}

impl RecordingSink {
    pub fn state_changes(&self) -> Vec<(u32, String, String, String)> {
        self.events
            .iter()
            .filter_map(|(at, e)| match e {
                AppEvent::StateChanged { from, to, reason } => {
                    Some((*at, from.to_string(), to.to_string(), reason.clone()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|(_, e)| match e {
                AppEvent::Info(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|(_, e)| match e {
                AppEvent::Warning(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, at_ms: u32, event: &AppEvent) {
        self.events.push((at_ms, event.clone()));
    }
}

#[derive(Debug, Default)]
pub struct RecordingPublisher {
    pub messages: Vec<TelemetryMessage>,
}

impl PublisherPort for RecordingPublisher {
    fn publish(&mut self, message: &TelemetryMessage) -> Result<(), PublishError> {
        self.messages.push(message.clone());
        Ok(())
    }
}

// ── Bench ─────────────────────────────────────────────────────

/// A started [`AppService`] wired to scripted hardware.
pub struct Bench {
    pub app: AppService,
    pub hw: TestHardware,
    pub clock: ManualClock,
    pub sink: RecordingSink,
    pub air: AirScript,
}

impl Bench {
    pub fn new(config: SystemConfig, air: Air) -> Self {
        let air = Rc::new(RefCell::new(air));
        let hub = Probes::new(&air).into_hub();
        Self::with_hub(config, hub, air)
    }

    pub fn with_hub(config: SystemConfig, hub: SensorHub, air: AirScript) -> Self {
        let mut hw = hardware(hub, config.heater_board_max_c);
        let mut app = AppService::new(config);
        let mut sink = RecordingSink::default();
        app.start(0, &mut hw, &mut sink);
        Self {
            app,
            hw,
            clock: ManualClock::default(),
            sink,
            air,
        }
    }

    pub fn set_air(&self, f: impl FnOnce(&mut Air)) {
        f(&mut *self.air.borrow_mut());
    }

    /// One control cycle, `control_cycle_ms` after the previous one.
    pub fn cycle(&mut self) {
        self.clock.now = self.clock.now.wrapping_add(self.app.config().control_cycle_ms);
        self.app.tick(&mut self.hw, &mut self.clock, &mut self.sink);
    }

    /// Cycle until `done` holds, at most `max` times.  Returns the cycles run.
    pub fn cycle_until(&mut self, max: u32, done: impl Fn(&AppService) -> bool) -> u32 {
        for n in 1..=max {
            self.cycle();
            if done(&self.app) {
                return n;
            }
        }
        max
    }

    pub fn command(&mut self, cmd: filament_dryer::app::commands::AppCommand) {
        self.app
            .handle_command(cmd, self.clock.now, &mut self.hw, &mut self.sink);
    }

    /// Text of one telemetry column in the latest row.
    pub fn field_text(&self, tag: &str) -> Option<String> {
        self.sink.events.iter().rev().find_map(|(_, e)| match e {
            AppEvent::Telemetry(data) => data.field(tag).map(|f| f.text.clone()),
            _ => None,
        })
    }
}
