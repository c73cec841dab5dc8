//! Integration tests for the telemetry path: AppService events rendered
//! by the log sink into the log file and the publisher queue, and the
//! command inbox feeding the control loop.

use std::thread;

use futures_lite::future::block_on;

use filament_dryer::adapters::log_sink::TelemetrySink;
use filament_dryer::app::commands::AppCommand;
use filament_dryer::app::service::AppService;
use filament_dryer::channels::Mailboxes;
use filament_dryer::config::SystemConfig;
use filament_dryer::fsm::StateId;
use filament_dryer::telemetry::{Logfile, Outbox, TelemetryMessage, drain_pending, run_publisher};

use crate::mock_hw::{Air, ManualClock, Probes, RecordingPublisher, hardware};

fn cool_air() -> Air {
    Air {
        heater_probe_c: Some(95.0),
        heater_dew_c: Some(20.0),
        ambient_dew_c: Some(15.0),
        filament_abs_g_kg: Some(5.0),
    }
}

#[test]
fn control_cycles_become_log_lines_and_published_rows() {
    let config = SystemConfig::default();
    let air = std::rc::Rc::new(std::cell::RefCell::new(cool_air()));
    let mut hw = hardware(Probes::new(&air).into_hub(), config.heater_board_max_c);
    let mut clock = ManualClock::default();
    let logfile = Logfile::new(Vec::new());
    let outbox = Outbox::new();

    {
        let mut sink = TelemetrySink::new(&logfile, &outbox, false);
        let mut app = AppService::new(config);
        app.start(0, &mut hw, &mut sink);
        for _ in 0..3 {
            clock.now += 10_000;
            app.tick(&mut hw, &mut clock, &mut sink);
        }
        assert_eq!(sink.dropped(), 0);
    }

    let text = String::from_utf8(logfile.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], "0 LOG_INFO Started in 'cooldown'");
    assert_eq!(
        lines[1],
        "0 SENSORS_HEADER state led_green led_red led_white heater_requested \
         heater_power filament_Fan ambient_Fan heater_ds18_C heater_dew_C \
         ambient_dew_C filament_abs_g_kg"
    );
    assert_eq!(
        lines[2],
        "10000 SENSORS_VALUES cooldown 0 1 1 0 0 0 0 95.0 20.0 15.0 5.00"
    );
    assert!(lines[4].starts_with("30000 SENSORS_VALUES cooldown "));

    let mut publisher = RecordingPublisher::default();
    assert_eq!(drain_pending(&outbox, &mut publisher), 3);
    let TelemetryMessage::Fields(row) = &publisher.messages[0] else {
        panic!("expected a fields row, got {:?}", publisher.messages[0]);
    };
    assert_eq!(row.state, StateId::Cooldown);
    assert_eq!(row.field("heater_ds18_C").and_then(|f| f.value), Some(95.0));
}

#[test]
fn state_changes_are_logged_and_annotated() {
    let config = SystemConfig::default();
    let air = std::rc::Rc::new(std::cell::RefCell::new(cool_air()));
    let mut hw = hardware(Probes::new(&air).into_hub(), config.heater_board_max_c);
    let mut clock = ManualClock::default();
    let logfile = Logfile::new(Vec::new());
    let outbox = Outbox::new();

    {
        let mut sink = TelemetrySink::new(&logfile, &outbox, false);
        let mut app = AppService::new(config);
        app.start(0, &mut hw, &mut sink);
        air.borrow_mut().heater_probe_c = Some(55.0);
        clock.now = 10_000;
        app.tick(&mut hw, &mut clock, &mut sink);
    }

    let text = String::from_utf8(logfile.into_inner()).unwrap();
    assert!(
        text.contains("10000 SM_STATE cooldown dryfan heater_C 55.0C < cooldown_heater_c 60.0C\n"),
        "{text}"
    );

    let mut publisher = RecordingPublisher::default();
    drain_pending(&outbox, &mut publisher);
    let json = publisher.messages[0].to_json().unwrap();
    assert!(json.contains(r#""type":"annotation""#), "{json}");
    assert!(json.contains("'cooldown' -> 'dryfan'"), "{json}");
}

#[test]
fn publisher_task_drains_until_shutdown() {
    let outbox = Outbox::new();
    let delivered = thread::scope(|s| {
        let task = s.spawn(|| {
            let mut publisher = RecordingPublisher::default();
            block_on(run_publisher(&outbox, &mut publisher))
        });
        for i in 0..40 {
            block_on(outbox.send(TelemetryMessage::Annotation {
                title: "note".into(),
                text: format!("#{i}"),
                severity: filament_dryer::telemetry::Severity::Info,
            }));
        }
        block_on(outbox.send(TelemetryMessage::Shutdown));
        task.join().unwrap()
    });
    assert_eq!(delivered, 40);
}

#[test]
fn queued_commands_reach_the_service_in_order() {
    let mailboxes = Mailboxes::new();
    let air = std::rc::Rc::new(std::cell::RefCell::new(cool_air()));
    let mut hw = hardware(Probes::new(&air).into_hub(), 110.0);
    let mut sink = crate::mock_hw::RecordingSink::default();
    let mut app = AppService::new(SystemConfig::default());
    app.start(0, &mut hw, &mut sink);

    for line in ["state drywait", "forward", "stop"] {
        let cmd = AppCommand::parse(line).unwrap();
        mailboxes.commands.try_send(cmd).unwrap();
    }
    while let Ok(cmd) = mailboxes.commands.try_receive() {
        app.handle_command(cmd, 0, &mut hw, &mut sink);
    }

    assert_eq!(app.state(), StateId::DryWait);
    assert!(app.forward_pending());
    assert!(!app.is_running());
}
