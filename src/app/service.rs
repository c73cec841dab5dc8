//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the FSM and its shared context.  It exposes a
//! clean, hardware-agnostic API.  All I/O flows through port traits
//! injected at call sites, making the entire service testable with mock
//! adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │       AppService        │
//! ActuatorPort ◀──│   FSM · heater guard    │
//!                 └────────────────────────┘
//! ```

use log::info;

use crate::config::SystemConfig;
use crate::fsm::context::FsmContext;
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateChange, StateId};
use crate::timebase::Timing;

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, EventSink, SensorPort};

/// State the dryer boots into: the heater may still be hot after a reset.
pub const INITIAL_STATE: StateId = StateId::Cooldown;

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    fsm: Fsm,
    ctx: FsmContext,
    tick_count: u64,
    running: bool,
    /// Set while the heater probe is unreadable, so the warning fires once.
    probe_missing: bool,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** start the FSM — call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), INITIAL_STATE);
        Self {
            fsm,
            ctx,
            tick_count: 0,
            running: true,
            probe_missing: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run the initial state's entry action, drive the outputs once and
    /// announce the telemetry columns.
    pub fn start(
        &mut self,
        now_ms: u32,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        self.ctx.now_ms = now_ms;
        self.fsm.start(&mut self.ctx);
        self.apply_actuators(hw);

        let state = self.fsm.current_state();
        sink.emit(now_ms, &AppEvent::Started(state));
        sink.emit(now_ms, &AppEvent::SensorsHeader(self.build_telemetry(hw).header()));
        info!("AppService started in {}", state);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle: measure → heater guard → FSM → actuators
    /// → telemetry.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`ActuatorPort`] — this avoids a double mutable borrow while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        timing: &mut impl Timing,
        sink: &mut impl EventSink,
    ) {
        if !self.running {
            return;
        }
        self.tick_count += 1;

        // 1. Measure; the conversion wait feeds the watchdog through `timing`
        let failures = hw.measure(timing);
        let now_ms = timing.now_ms();
        self.ctx.now_ms = now_ms;
        for failure in failures {
            sink.emit(
                now_ms,
                &AppEvent::SensorFault {
                    sensor: failure.sensor,
                    fault: failure.fault,
                },
            );
        }

        // 2. Heater guard input
        let snapshot = hw.snapshot();
        self.ctx.sensors = snapshot;
        hw.set_heater_board_temperature(snapshot.heater_probe_c);
        match (snapshot.heater_probe_c, self.probe_missing) {
            (None, false) => {
                self.probe_missing = true;
                sink.emit(
                    now_ms,
                    &AppEvent::Warning("heater probe unavailable, heater held off".to_string()),
                );
            }
            (Some(_), true) => self.probe_missing = false,
            _ => {}
        }

        // 3. FSM tick (pure state logic)
        self.fsm
            .tick(&mut self.ctx, &mut |change| emit_change(sink, now_ms, change));
        for note in self.ctx.notes.drain(..) {
            sink.emit(now_ms, &AppEvent::Info(note));
        }

        // 4. Apply actuator commands via ActuatorPort
        self.apply_actuators(hw);

        // 5. One telemetry row per cycle
        sink.emit(now_ms, &AppEvent::Telemetry(self.build_telemetry(hw)));
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (button, remote channel).
    ///
    /// Once stopped, the outputs stay off: later commands are dropped with
    /// a warning.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        now_ms: u32,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        if !self.running {
            sink.emit(
                now_ms,
                &AppEvent::Warning(format!("stopped, {cmd:?} ignored")),
            );
            return;
        }
        match cmd {
            AppCommand::ForceState(name) => {
                self.ctx.now_ms = now_ms;
                let result = self.fsm.switch_by_name(&name, &mut self.ctx, &mut |change| {
                    emit_change(sink, now_ms, change);
                });
                match result {
                    Ok(true) => self.apply_actuators(hw),
                    Ok(false) => {}
                    Err(e) => sink.emit(
                        now_ms,
                        &AppEvent::Warning(format!("{e} '{name}' ignored")),
                    ),
                }
            }
            AppCommand::Forward => self.fsm.request_forward(),
            AppCommand::Stop => {
                self.running = false;
                hw.all_off();
                sink.emit(now_ms, &AppEvent::Info("Stopped by command".to_string()));
                info!("AppService stopped");
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current outputs and readings.
    pub fn build_telemetry(&self, hw: &impl SensorPort) -> TelemetryData {
        TelemetryData {
            state: self.fsm.current_state(),
            fields: hw.fields(),
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// `false` once a [`AppCommand::Stop`] was handled.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn forward_pending(&self) -> bool {
        self.fsm.forward_pending()
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Translate FSM actuator commands into port calls.
    fn apply_actuators(&self, hw: &mut impl ActuatorPort) {
        let cmds = &self.ctx.commands;
        hw.set_heater(cmds.heater_on);
        hw.set_fans(cmds.fan_ambient, cmds.fan_process);
        hw.set_leds(cmds.leds);
    }
}

fn emit_change(sink: &mut impl EventSink, now_ms: u32, change: &StateChange) {
    sink.emit(
        now_ms,
        &AppEvent::StateChanged {
            from: change.from,
            to: change.to,
            reason: change.reason.clone(),
        },
    );
}
