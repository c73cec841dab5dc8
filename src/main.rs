//! Filament dryer firmware main entry point.
//!
//! Hexagonal architecture with one synchronous control loop and two
//! helper tasks joined by bounded channels.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    TelemetrySink      SystemClock             │
//! │  (Sensor+Actuator)  (EventSink)        (ClockPort)             │
//! │  TaskWatchdog       LogPublisher                               │
//! │  (WatchdogPort)     (PublisherPort)                            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  FSM · heater guard · telemetry rows                   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Timebase (fixed cycle) · button task · console task           │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::ffi::CStr;
use std::io::{BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::{Context, Result};
use esp_idf_svc::hal::delay::Ets;
use esp_idf_svc::hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, Output, PinDriver, Pull};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::esp;
use futures_lite::future::block_on;
use log::{error, info, warn};

use filament_dryer::adapters::hardware::HardwareAdapter;
use filament_dryer::adapters::log_sink::TelemetrySink;
use filament_dryer::adapters::onewire::BitBangOneWire;
use filament_dryer::adapters::shared_i2c::SharedI2c;
use filament_dryer::adapters::time::SystemClock;
use filament_dryer::app::commands::AppCommand;
use filament_dryer::app::ports::ClockPort;
use filament_dryer::app::service::AppService;
use filament_dryer::channels::Mailboxes;
use filament_dryer::config::SystemConfig;
use filament_dryer::drivers::button::{ButtonDriver, ButtonEvent};
use filament_dryer::drivers::fan::FanBank;
use filament_dryer::drivers::heater::HeaterDriver;
use filament_dryer::drivers::status_led::StatusLeds;
use filament_dryer::drivers::watchdog::TaskWatchdog;
use filament_dryer::pins;
use filament_dryer::sensors::ds18b20::Ds18b20;
use filament_dryer::sensors::sht3x::{ADDRESS_HIGH, ADDRESS_LOW, Sht3x};
use filament_dryer::sensors::{self, Sensor, SensorHub};
use filament_dryer::telemetry::{LogDirectory, LogPublisher, Logfile, TelemetryMessage, run_publisher};
use filament_dryer::timebase::{GuardedClock, Timebase, Timing};

const STORAGE_BASE: &CStr = c"/spiffs";
const CONFIG_PATH: &str = "/spiffs/config.json";
const LOG_DIR: &str = "/spiffs/logs";

/// Below this share of free flash, old log files are deleted at boot.
const MIN_FREE_PERCENT: usize = 25;

const BUTTON_POLL_MS: u32 = 10;

static MAILBOXES: Mailboxes = Mailboxes::new();

type OutPin = PinDriver<'static, AnyOutputPin, Output>;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Filament dryer v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Storage, config, log file ──────────────────────────
    mount_storage()?;
    let config = load_config();

    let mut log_dir = LogDirectory::open(LOG_DIR)?;
    let logfile = Logfile::new(log_dir.create_next()?);
    if free_percent().is_some_and(|p| p < MIN_FREE_PERCENT) {
        match log_dir.remove_other_files() {
            Ok(n) => info!("Storage low, removed {} old log files", n),
            Err(e) => warn!("Removing old log files failed: {}", e),
        }
    }

    // ── 3. Peripherals and adapters ───────────────────────────
    let peripherals = Peripherals::take()?;
    let mut hw = build_hardware(peripherals, &config)?;

    // SAFETY: GPIO numbers come from `pins` and are not claimed elsewhere.
    let mut button_pin = PinDriver::input(unsafe { AnyInputPin::new(pins::BUTTON_GPIO) })?;
    button_pin.set_pull(Pull::Up)?;

    let watchdog = TaskWatchdog::new(config.watchdog_timeout_ms);
    let mut timing = GuardedClock::new(SystemClock::new(), watchdog, config.watchdog_slice_ms);

    let mailboxes = &MAILBOXES;
    let stopping = AtomicBool::new(false);

    // ── 4. Tasks ──────────────────────────────────────────────
    thread::scope(|s| -> Result<()> {
        thread::Builder::new()
            .name("publisher".into())
            .stack_size(8 * 1024)
            .spawn_scoped(s, || {
                let mut publisher = LogPublisher::new();
                block_on(run_publisher(&mailboxes.telemetry, &mut publisher));
            })?;

        let long_press_ms = config.long_press_ms;
        let (stop, log) = (&stopping, &logfile);
        thread::Builder::new()
            .name("button".into())
            .stack_size(4 * 1024)
            .spawn_scoped(s, move || {
                let mut clock = SystemClock::new();
                let mut driver = ButtonDriver::new(long_press_ms);
                while !stop.load(Ordering::Relaxed) {
                    let pressed = button_pin.is_low();
                    match driver.poll(clock.now_ms(), pressed) {
                        Some(ButtonEvent::ShortPress) => send(AppCommand::Forward),
                        Some(ButtonEvent::LongPress) => {
                            warn!("Button: long press, restarting");
                            let _ = log.flush();
                            esp_idf_svc::hal::reset::restart();
                        }
                        None => {}
                    }
                    clock.sleep_ms(BUTTON_POLL_MS);
                }
            })?;

        // Blocks on the UART forever; ends with the process.
        thread::Builder::new()
            .name("console".into())
            .stack_size(4 * 1024)
            .spawn(console_task)?;

        // ── 5. Control loop (this thread) ─────────────────────
        let mut sink = TelemetrySink::new(&logfile, &mailboxes.telemetry, config.console_values);
        let mut app = AppService::new(config.clone());
        app.start(timing.now_ms(), &mut hw, &mut sink);
        let mut timebase = Timebase::new(config.control_cycle_ms, timing.now_ms());
        info!("System ready. Entering control loop.");

        'control: while app.is_running() {
            while let Ok(cmd) = mailboxes.commands.try_receive() {
                app.handle_command(cmd, timing.now_ms(), &mut hw, &mut sink);
                if !app.is_running() {
                    break 'control;
                }
            }
            app.tick(&mut hw, &mut timing, &mut sink);
            if let Err(e) = logfile.flush() {
                warn!("Log flush failed: {}", e);
            }
            timebase.sleep_until_next_cycle(&mut timing);
        }

        info!(
            "Control loop stopped after {} cycles ({} overruns, {} late watchdog feeds, {} telemetry messages dropped)",
            app.tick_count(),
            timebase.overruns(),
            timing.watchdog().late_feeds(),
            sink.dropped()
        );
        timing.watchdog_mut().unsubscribe();
        stopping.store(true, Ordering::Relaxed);
        block_on(mailboxes.telemetry.send(TelemetryMessage::Shutdown));
        logfile.flush()?;
        Ok(())
    })
}

// ── Helpers ───────────────────────────────────────────────────

fn send(cmd: AppCommand) {
    if MAILBOXES.commands.try_send(cmd).is_err() {
        warn!("Command queue full, command dropped");
    }
}

/// Reads command lines from the serial console.
fn console_task() {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { continue };
        match AppCommand::parse(&line) {
            Some(cmd) => send(cmd),
            None => println!("commands: forward | stop | state <name>"),
        }
        let _ = std::io::stdout().flush();
    }
}

fn mount_storage() -> Result<()> {
    let conf = esp_idf_svc::sys::esp_vfs_spiffs_conf_t {
        base_path: STORAGE_BASE.as_ptr(),
        partition_label: core::ptr::null(),
        max_files: 4,
        format_if_mount_failed: true,
    };
    // SAFETY: `conf` and the static base path outlive the call.
    esp!(unsafe { esp_idf_svc::sys::esp_vfs_spiffs_register(&conf) })
        .context("mounting SPIFFS")?;
    Ok(())
}

fn free_percent() -> Option<usize> {
    let (mut total, mut used) = (0usize, 0usize);
    // SAFETY: out-pointers to locals; null selects the default partition.
    esp!(unsafe { esp_idf_svc::sys::esp_spiffs_info(core::ptr::null(), &mut total, &mut used) })
        .ok()?;
    (total > 0).then(|| 100 - used * 100 / total)
}

fn load_config() -> SystemConfig {
    match std::fs::read_to_string(CONFIG_PATH) {
        Ok(text) => match SystemConfig::from_json(&text) {
            Ok(cfg) => {
                info!("Config loaded from {}", CONFIG_PATH);
                cfg
            }
            Err(e) => {
                error!("Config {} rejected ({}), using defaults", CONFIG_PATH, e);
                SystemConfig::default()
            }
        },
        Err(_) => {
            warn!("No {}, using defaults", CONFIG_PATH);
            SystemConfig::default()
        }
    }
}

fn output(gpio: i32) -> Result<OutPin> {
    // SAFETY: GPIO numbers come from `pins` and each is claimed once.
    Ok(PinDriver::output(unsafe { AnyOutputPin::new(gpio) })?)
}

fn build_hardware(peripherals: Peripherals, config: &SystemConfig) -> Result<HardwareAdapter<OutPin>> {
    let i2c_config = I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ));
    // SAFETY: see `output`.
    let i2c0 = I2cDriver::new(
        peripherals.i2c0,
        unsafe { AnyIOPin::new(pins::I2C0_SDA_GPIO) },
        unsafe { AnyIOPin::new(pins::I2C0_SCL_GPIO) },
        &i2c_config,
    )?;
    let i2c1 = SharedI2c::new(I2cDriver::new(
        peripherals.i2c1,
        unsafe { AnyIOPin::new(pins::I2C1_SDA_GPIO) },
        unsafe { AnyIOPin::new(pins::I2C1_SCL_GPIO) },
        &i2c_config,
    )?);

    let mut onewire_pin = PinDriver::input_output_od(unsafe { AnyIOPin::new(pins::ONEWIRE_GPIO) })?;
    onewire_pin.set_pull(Pull::Up)?;

    let p = config.pressure_pa;
    let probes: Vec<Box<dyn Sensor>> = vec![
        Box::new(Sht3x::new(i2c0, ADDRESS_HIGH, sensors::AMBIENT, p)),
        Box::new(Sht3x::new(i2c1.clone(), ADDRESS_LOW, sensors::HEATER, p)),
        Box::new(Sht3x::new(i2c1, ADDRESS_HIGH, sensors::FILAMENT, p)),
        Box::new(Ds18b20::new(BitBangOneWire::new(onewire_pin, Ets), sensors::HEATER_PROBE)),
    ];

    Ok(HardwareAdapter::new(
        SensorHub::new(probes),
        HeaterDriver::new(
            output(pins::HEATER_A_GPIO)?,
            output(pins::HEATER_B_GPIO)?,
            config.heater_board_max_c,
        ),
        FanBank::new(
            output(pins::FAN_AMBIENT_GPIO)?,
            output(pins::FAN_FILAMENT_GPIO)?,
            output(pins::FAN_BOX_GPIO)?,
        ),
        StatusLeds::new(
            output(pins::LED_GREEN_GPIO)?,
            output(pins::LED_RED_GPIO)?,
            output(pins::LED_WHITE_GPIO)?,
        ),
    ))
}
