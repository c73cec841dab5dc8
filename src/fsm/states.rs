//! Concrete state handler functions and table builder.
//!
//! ```text
//!            forward                     fan off long enough while hot
//!   OFF ─────────────▶ REGENERATE ───────────────────────────────▶ COOLDOWN
//!    ▲                   ▲     ▲                                      │
//!    │ forward           │     │ not sinking, still humid             │ heater < ceiling
//!    │                   │     └───────────────────────────── DRYFAN ◀┘
//!    │                   │ entry humid + waited long            │  ▲
//!    │                   │                   not sinking, dry   ▼  │ humidity rises
//!    └─────────────── DRYWAIT ◀────────────────────────────────────┘
//! ```
//!
//! Unknown sensor values (`None`) make every condition false.

use super::context::{ActuatorCommands, FsmContext, Leds};
use super::{StateDescriptor, StateId, Transition};
use crate::timebase::{elapsed_ms, reached};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        StateDescriptor {
            id: StateId::Off,
            on_enter: off_enter,
            on_update: off_update,
            successor: StateId::Regenerate,
        },
        StateDescriptor {
            id: StateId::Regenerate,
            on_enter: regenerate_enter,
            on_update: regenerate_update,
            successor: StateId::Cooldown,
        },
        StateDescriptor {
            id: StateId::Cooldown,
            on_enter: cooldown_enter,
            on_update: cooldown_update,
            successor: StateId::DryFan,
        },
        StateDescriptor {
            id: StateId::DryFan,
            on_enter: dryfan_enter,
            on_update: dryfan_update,
            successor: StateId::DryWait,
        },
        StateDescriptor {
            id: StateId::DryWait,
            on_enter: drywait_enter,
            on_update: drywait_update,
            successor: StateId::Off,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  OFF: everything de-energised until the user presses forward
// ═══════════════════════════════════════════════════════════════════════════

fn off_enter(ctx: &mut FsmContext) {
    ctx.commands = ActuatorCommands::quiet(Leds::new(true, true, true));
}

fn off_update(_ctx: &mut FsmContext) -> Option<Transition> {
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  REGENERATE: bake the moisture out of the desiccant
// ═══════════════════════════════════════════════════════════════════════════

fn regenerate_enter(ctx: &mut FsmContext) {
    ctx.commands = ActuatorCommands {
        heater_on: true,
        ..ActuatorCommands::quiet(Leds::new(false, true, false))
    };
    ctx.last_fan_on_ms = ctx.now_ms;
}

fn regenerate_update(ctx: &mut FsmContext) -> Option<Transition> {
    let cfg = &ctx.config;

    // Vent while the chamber air is much wetter than the outside air.
    let fan_on = match (ctx.sensors.heater.dew_point_c, ctx.sensors.ambient.dew_point_c) {
        (Some(heater), Some(ambient)) => heater - ambient > cfg.regenerate_diff_dew_c,
        _ => false,
    };
    ctx.commands.fan_ambient = fan_on;
    ctx.commands.heater_on = true;

    if fan_on {
        ctx.last_fan_on_ms = ctx.now_ms;
        return None;
    }

    // The no-fan timer only runs while the chamber is hot.
    let hot = ctx
        .sensors
        .heater_probe_c
        .is_some_and(|t| t >= cfg.regenerate_hot_c);
    if !hot {
        ctx.last_fan_on_ms = ctx.now_ms;
        return None;
    }

    let fan_off_ms = elapsed_ms(ctx.last_fan_on_ms, ctx.now_ms);
    if fan_off_ms > cfg.regenerate_no_fan_ms {
        return Some(Transition::new(
            StateId::Cooldown,
            format!(
                "duration_fan_off_ms {}ms > regenerate_no_fan_ms {}ms",
                fan_off_ms, cfg.regenerate_no_fan_ms
            ),
        ));
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  COOLDOWN: let the heater chamber cool before blowing into the filament
// ═══════════════════════════════════════════════════════════════════════════

fn cooldown_enter(ctx: &mut FsmContext) {
    ctx.commands = ActuatorCommands::quiet(Leds::new(false, true, true));
}

fn cooldown_update(ctx: &mut FsmContext) -> Option<Transition> {
    let limit = ctx.config.cooldown_heater_c;
    match ctx.sensors.heater_probe_c {
        Some(heater_c) if heater_c < limit => Some(Transition::new(
            StateId::DryFan,
            format!("heater_C {heater_c:.1}C < cooldown_heater_c {limit:.1}C"),
        )),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  DRYFAN: circulate box air through the dry desiccant
// ═══════════════════════════════════════════════════════════════════════════

fn dryfan_enter(ctx: &mut FsmContext) {
    ctx.commands = ActuatorCommands {
        fan_process: true,
        ..ActuatorCommands::quiet(Leds::new(false, false, true))
    };
    ctx.history.clear();
    ctx.next_sample_ms = ctx.now_ms;
}

fn dryfan_update(ctx: &mut FsmContext) -> Option<Transition> {
    if !reached(ctx.now_ms, ctx.next_sample_ms) {
        return None;
    }
    ctx.next_sample_ms = ctx
        .next_sample_ms
        .wrapping_add(ctx.config.dryfan_sample_interval_ms);

    let Some(sample) = ctx.sensors.filament.abs_g_kg else {
        ctx.note("filament humidity unavailable, sample skipped".to_string());
        return None;
    };
    ctx.note(format!("len={}, append({sample:.2})", ctx.history.len()));

    let oldest = ctx.history.push(sample)?;

    // Negative while the filament compartment is getting drier.
    let reduction = sample - oldest;
    ctx.note(format!("reduction_abs_g_kg={reduction:.1}"));

    let min_drop = ctx.config.dryfan_min_drop_g_kg;
    if reduction < -min_drop {
        return None;
    }

    let setpoint = ctx.config.dryfan_setpoint_g_kg;
    let why = format!(
        "humidity does not sink fast enough, reduction_abs_g_kg {reduction:.1} g/kg >= -{min_drop:.1} g/kg"
    );
    if sample > setpoint {
        Some(Transition::new(
            StateId::Regenerate,
            format!("{why} and filament {sample:.1} g/kg > dryfan_setpoint_g_kg {setpoint:.1} g/kg"),
        ))
    } else {
        Some(Transition::new(
            StateId::DryWait,
            format!("{why} and filament {sample:.1} g/kg <= dryfan_setpoint_g_kg {setpoint:.1} g/kg"),
        ))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  DRYWAIT: everything off, watch the filament compartment
// ═══════════════════════════════════════════════════════════════════════════

fn drywait_enter(ctx: &mut FsmContext) {
    ctx.commands = ActuatorCommands::quiet(Leds::new(true, false, false));
    ctx.drywait_entry_g_kg = ctx.sensors.filament.abs_g_kg;
}

fn drywait_update(ctx: &mut FsmContext) -> Option<Transition> {
    let cfg = &ctx.config;
    let entry = ctx.drywait_entry_g_kg?;

    if let Some(current) = ctx.sensors.filament.abs_g_kg {
        let rise = current - entry;
        if rise > cfg.drywait_rise_g_kg {
            return Some(Transition::new(
                StateId::DryFan,
                format!(
                    "humidity increased too much diff_abs_g_kg {rise:.1} > drywait_rise_g_kg {:.1}",
                    cfg.drywait_rise_g_kg
                ),
            ));
        }
    }

    let waited_ms = ctx.ms_in_state();
    if entry > cfg.drywait_max_g_kg && waited_ms > cfg.drywait_min_time_ms {
        return Some(Transition::new(
            StateId::Regenerate,
            format!(
                "too humid at entry {entry:.1} > drywait_max_g_kg {:.1} and waited {waited_ms}ms > drywait_min_time_ms {}ms",
                cfg.drywait_max_g_kg, cfg.drywait_min_time_ms
            ),
        ));
    }
    None
}
