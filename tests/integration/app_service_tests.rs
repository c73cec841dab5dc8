//! Integration tests for the sensors → AppService → FSM → actuators pipeline.
//!
//! These run on the host (x86_64) against scripted probes and the real
//! hardware adapter, so every cycle goes through the same code path as on
//! the device.

use std::cell::RefCell;
use std::rc::Rc;

use filament_dryer::app::commands::AppCommand;
use filament_dryer::app::events::AppEvent;
use filament_dryer::app::ports::ActuatorPort;
use filament_dryer::config::SystemConfig;
use filament_dryer::fsm::{StateId, WHY_FORWARD, WHY_REMOTE};
use filament_dryer::sensors::UNAVAILABLE;

use crate::mock_hw::{Air, Bench, Probes};

fn air(probe_c: f32, filament_g_kg: f32) -> Air {
    Air {
        heater_probe_c: Some(probe_c),
        heater_dew_c: Some(20.0),
        ambient_dew_c: Some(15.0),
        filament_abs_g_kg: Some(filament_g_kg),
    }
}

// ── Cooldown → DryFan ─────────────────────────────────────────

#[test]
fn boots_in_cooldown_and_waits_for_the_heater_to_cool() {
    let mut bench = Bench::new(SystemConfig::default(), air(95.0, 5.0));
    assert_eq!(bench.app.state(), StateId::Cooldown);

    for _ in 0..5 {
        bench.cycle();
    }
    assert_eq!(bench.app.state(), StateId::Cooldown);
    assert!(!bench.hw.heater_applied());

    bench.set_air(|a| a.heater_probe_c = Some(59.0));
    bench.cycle();

    assert_eq!(bench.app.state(), StateId::DryFan);
    let changes = bench.sink.state_changes();
    assert_eq!(
        changes,
        vec![(
            60_000,
            "cooldown".to_string(),
            "dryfan".to_string(),
            "heater_C 59.0C < cooldown_heater_c 60.0C".to_string()
        )]
    );
    assert_eq!(bench.field_text("filament_Fan").as_deref(), Some("1"));
    assert_eq!(bench.field_text("ambient_Fan").as_deref(), Some("0"));
    assert_eq!(bench.field_text("led_white").as_deref(), Some("1"));
}

// ── Regenerate ────────────────────────────────────────────────

#[test]
fn regenerate_heats_vents_and_then_cools_down() {
    let mut bench = Bench::new(SystemConfig::default(), air(106.0, 5.0));
    bench.cycle();
    bench.command(AppCommand::ForceState("regenerate".into()));
    assert_eq!(bench.app.state(), StateId::Regenerate);

    // Wet chamber air: vent, the no-fan timer keeps restarting.
    bench.set_air(|a| a.heater_dew_c = Some(40.0));
    for _ in 0..5 {
        bench.cycle();
        assert_eq!(bench.field_text("ambient_Fan").as_deref(), Some("1"));
        assert_eq!(bench.field_text("heater_power").as_deref(), Some("1"));
    }
    assert_eq!(bench.app.state(), StateId::Regenerate);

    // Dry chamber air: fan stays off until the timer runs out.
    bench.set_air(|a| a.heater_dew_c = Some(20.0));
    bench.cycle();
    assert_eq!(bench.app.state(), StateId::Regenerate);
    bench.cycle();
    assert_eq!(bench.app.state(), StateId::Cooldown);

    let changes = bench.sink.state_changes();
    let (_, from, to, reason) = changes.last().unwrap();
    assert_eq!((from.as_str(), to.as_str()), ("regenerate", "cooldown"));
    assert_eq!(reason, "duration_fan_off_ms 20000ms > regenerate_no_fan_ms 17000ms");
    assert!(!bench.hw.heater_applied());
}

#[test]
fn heater_is_cut_above_the_board_limit() {
    let mut bench = Bench::new(SystemConfig::default(), air(115.0, 5.0));
    bench.command(AppCommand::ForceState("regenerate".into()));
    bench.cycle();

    assert_eq!(bench.field_text("heater_requested").as_deref(), Some("1"));
    assert_eq!(bench.field_text("heater_power").as_deref(), Some("0"));
    assert!(!bench.hw.heater_applied());

    bench.set_air(|a| a.heater_probe_c = Some(100.0));
    bench.cycle();
    assert!(bench.hw.heater_applied());
}

#[test]
fn unknown_probe_keeps_heater_off_and_warns_once() {
    let mut bench = Bench::new(
        SystemConfig::default(),
        Air {
            heater_probe_c: None,
            ..air(0.0, 5.0)
        },
    );
    bench.command(AppCommand::ForceState("regenerate".into()));
    for _ in 0..10 {
        bench.cycle();
    }

    assert!(!bench.hw.heater_applied());
    assert_eq!(bench.app.state(), StateId::Regenerate);
    assert_eq!(bench.sink.warnings().len(), 1);
}

// ── DryFan / DryWait ──────────────────────────────────────────

#[test]
fn dryfan_settles_into_drywait_when_box_is_dry() {
    let mut bench = Bench::new(SystemConfig::default(), air(30.0, 2.0));
    bench.cycle();
    assert_eq!(bench.app.state(), StateId::DryFan);

    let cycles = bench.cycle_until(500, |app| app.state() != StateId::DryFan);
    assert!(cycles < 500);
    assert_eq!(bench.app.state(), StateId::DryWait);

    let infos = bench.sink.infos();
    assert_eq!(infos[0], "len=0, append(2.00)");
    assert!(infos.contains(&"reduction_abs_g_kg=0.0"));

    let (_, _, _, reason) = bench.sink.state_changes().pop().unwrap();
    assert!(reason.starts_with("humidity does not sink fast enough"), "{reason}");
    assert_eq!(bench.field_text("led_green").as_deref(), Some("1"));
    assert_eq!(bench.field_text("filament_Fan").as_deref(), Some("0"));
}

#[test]
fn drywait_restarts_fans_when_humidity_creeps_up() {
    let mut bench = Bench::new(SystemConfig::default(), air(30.0, 2.0));
    bench.cycle();
    bench.command(AppCommand::ForceState("drywait".into()));
    assert_eq!(bench.app.state(), StateId::DryWait);

    bench.set_air(|a| a.filament_abs_g_kg = Some(2.4));
    bench.cycle();
    assert_eq!(bench.app.state(), StateId::DryWait);

    bench.set_air(|a| a.filament_abs_g_kg = Some(2.6));
    bench.cycle();
    assert_eq!(bench.app.state(), StateId::DryFan);
}

#[test]
fn humid_drywait_regenerates_after_minimum_time() {
    let config = SystemConfig::default();
    let min_cycles = config.drywait_min_time_ms / config.control_cycle_ms;
    let mut bench = Bench::new(config, air(30.0, 4.5));
    bench.cycle();
    bench.command(AppCommand::ForceState("drywait".into()));

    for _ in 0..min_cycles {
        bench.cycle();
    }
    assert_eq!(bench.app.state(), StateId::DryWait);
    bench.cycle();
    assert_eq!(bench.app.state(), StateId::Regenerate);
}

// ── Sensor failures ───────────────────────────────────────────

#[test]
fn failing_sensor_is_reported_once_and_never_read_again() {
    let air = Rc::new(RefCell::new(air(30.0, 2.0)));
    let mut probes = Probes::new(&air);
    probes.filament = probes.filament.failing_on_read(5);
    let reads = probes.filament.reads();
    let mut bench = Bench::with_hub(SystemConfig::default(), probes.into_hub(), air);

    for _ in 0..4 {
        bench.cycle();
    }
    assert_eq!(bench.field_text("filament_abs_g_kg").as_deref(), Some("2.00"));

    for _ in 0..6 {
        bench.cycle();
    }
    assert_eq!(reads.get(), 5);
    assert_eq!(bench.field_text("filament_abs_g_kg").as_deref(), Some(UNAVAILABLE));
    assert_eq!(bench.field_text("heater_ds18_C").as_deref(), Some("30.0"));

    let faults: Vec<_> = bench
        .sink
        .events
        .iter()
        .filter(|(_, e)| matches!(e, AppEvent::SensorFault { .. }))
        .collect();
    assert_eq!(faults.len(), 1);
    assert!(matches!(
        faults[0],
        (50_000, AppEvent::SensorFault { sensor: "filament", .. })
    ));
    assert!(bench.hw.sensor_hub().is_broken(3));
    // The loop keeps running on the remaining probes.
    assert_eq!(bench.app.tick_count(), 10);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn forward_is_consumed_by_exactly_one_tick() {
    let mut bench = Bench::new(SystemConfig::default(), air(95.0, 5.0));
    bench.command(AppCommand::Forward);
    bench.command(AppCommand::Forward);
    assert!(bench.app.forward_pending());

    bench.cycle();
    assert_eq!(bench.app.state(), StateId::DryFan);
    assert!(!bench.app.forward_pending());

    bench.cycle();
    assert_eq!(bench.app.state(), StateId::DryFan);

    let changes = bench.sink.state_changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].3, WHY_FORWARD);
}

#[test]
fn forward_walks_the_whole_ring() {
    let mut bench = Bench::new(SystemConfig::default(), air(95.0, 5.0));
    let mut seen = vec![bench.app.state()];
    for _ in 0..StateId::COUNT {
        bench.command(AppCommand::Forward);
        bench.cycle();
        seen.push(bench.app.state());
    }
    assert_eq!(
        seen,
        vec![
            StateId::Cooldown,
            StateId::DryFan,
            StateId::DryWait,
            StateId::Off,
            StateId::Regenerate,
            StateId::Cooldown,
        ]
    );
}

#[test]
fn forcing_the_current_state_is_a_no_op() {
    let mut bench = Bench::new(SystemConfig::default(), air(95.0, 5.0));
    let before = bench.sink.events.len();
    bench.command(AppCommand::ForceState("cooldown".into()));
    assert_eq!(bench.sink.events.len(), before);
    assert_eq!(bench.app.state(), StateId::Cooldown);
}

#[test]
fn remote_switch_carries_its_reason() {
    let mut bench = Bench::new(SystemConfig::default(), air(95.0, 5.0));
    bench.command(AppCommand::ForceState("off".into()));
    let changes = bench.sink.state_changes();
    assert_eq!(changes[0].3, WHY_REMOTE);
    assert_eq!(bench.field_text("led_red"), None);

    bench.cycle();
    for led in ["led_green", "led_red", "led_white"] {
        assert_eq!(bench.field_text(led).as_deref(), Some("1"));
    }
}

#[test]
fn unknown_state_name_is_ignored_with_a_warning() {
    let mut bench = Bench::new(SystemConfig::default(), air(95.0, 5.0));
    bench.command(AppCommand::ForceState("sauna".into()));
    assert_eq!(bench.app.state(), StateId::Cooldown);
    let warnings = bench.sink.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("'sauna' ignored"), "{}", warnings[0]);
}

#[test]
fn stop_switches_everything_off() {
    let mut bench = Bench::new(SystemConfig::default(), air(106.0, 5.0));
    bench.command(AppCommand::ForceState("regenerate".into()));
    bench.cycle();
    assert!(bench.hw.heater_applied());

    bench.command(AppCommand::Stop);
    assert!(!bench.app.is_running());
    assert!(!bench.hw.heater_applied());

    let ticks = bench.app.tick_count();
    bench.cycle();
    assert_eq!(bench.app.tick_count(), ticks);
}

#[test]
fn commands_queued_behind_stop_leave_the_heater_off() {
    let mut bench = Bench::new(SystemConfig::default(), air(40.0, 5.0));
    bench.cycle();

    bench.command(AppCommand::Stop);
    bench.command(AppCommand::ForceState("regenerate".into()));
    bench.command(AppCommand::Forward);

    assert!(!bench.app.is_running());
    assert_eq!(bench.app.state(), StateId::DryFan);
    assert!(!bench.app.forward_pending());
    assert!(!bench.hw.heater_applied());
    let warnings = bench.sink.warnings();
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| w.contains("ignored")), "{warnings:?}");
}

// ── Determinism ───────────────────────────────────────────────

#[test]
fn identical_scripts_give_identical_event_streams() {
    fn run() -> Vec<(u32, AppEvent)> {
        let mut bench = Bench::new(SystemConfig::default(), air(70.0, 4.0));
        for n in 0..300u32 {
            bench.set_air(|a| {
                a.heater_probe_c = Some(70.0 - n as f32 * 0.1);
                a.filament_abs_g_kg = Some(4.0 - n as f32 * 0.002);
            });
            bench.cycle();
        }
        bench.sink.events
    }
    assert_eq!(run(), run());
}
