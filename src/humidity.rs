//! Psychrometric helpers: dew point and absolute humidity.
//!
//! Saturation vapour pressure over water and the enhancement factor follow
//! Sonntag (1994), "Advancements in the field of hygrometry", eq. 7, 22
//! and 24.  The dew point is found by fixed-point iteration on the
//! enhancement factor at the dew-point temperature.
//!
//! All functions are pure: relative humidity at or below zero is floored to
//! [`MIN_RH_PCT`] so the logarithms stay finite.  Absolute humidity has no
//! value once the vapour pressure reaches the total pressure.

/// Standard sea-level pressure (Pa).
pub const STANDARD_PRESSURE_PA: f32 = 101_325.0;

/// Lowest relative humidity fed into the formulas (%).
pub const MIN_RH_PCT: f32 = 0.1;

/// Successive dew-point estimates closer than this end the iteration (°C).
const DEW_TOLERANCE_C: f64 = 0.01;

/// Upper bound on dew-point refinement passes.
pub const MAX_DEW_ITERATIONS: u32 = 100;

/// Ratio of the molar masses of water vapour and dry air.
const EPSILON: f64 = 0.62198;

/// Result of the iterative dew-point solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DewPoint {
    pub celsius: f32,
    /// Refinement passes after the initial estimate.
    pub iterations: u32,
}

/// Saturation vapour pressure of pure water, in Pa.
fn saturation_pressure_pa(t_kelvin: f64) -> f64 {
    let ln_e_w = -6096.0 / t_kelvin + 21.240_964_2 - 2.711_193e-2 * t_kelvin
        + 1.673_952e-5 * t_kelvin * t_kelvin
        + 2.433_502 * t_kelvin.ln();
    ln_e_w.exp()
}

/// Enhancement factor for water in moist air at `t_c`.
fn enhancement(e_w_hpa: f64, p_hpa: f64, t_c: f64) -> f64 {
    1.0 + (1e-4 * e_w_hpa) / (273.0 + t_c)
        * ((38.0 + 173.0 * (-t_c / 43.0).exp()) * (1.0 - e_w_hpa / p_hpa)
            + (6.39 + 4.28 * (-t_c / 107.0).exp()) * (p_hpa / e_w_hpa - 1.0))
}

/// Water vapour partial pressure in air at the given conditions (Pa),
/// together with `e_w` in hPa.
fn vapour_pressure_pa(temp_c: f32, pressure_pa: f32, rh_pct: f32) -> (f64, f64) {
    let rh = f64::from(rh_pct.max(MIN_RH_PCT));
    let t_c = f64::from(temp_c);
    let p_hpa = f64::from(pressure_pa) / 100.0;

    let e_w = saturation_pressure_pa(t_c + 273.15);
    let e_w_hpa = e_w / 100.0;
    let f_w = enhancement(e_w_hpa, p_hpa, t_c);
    (rh / 100.0 * f_w * e_w, e_w_hpa)
}

/// Absolute humidity in grams of water per kilogram of dry air.
///
/// `None` when the vapour pressure is not below `pressure_pa`: there is no
/// dry air left to refer the mixing ratio to.
pub fn absolute_humidity_g_per_kg(temp_c: f32, pressure_pa: f32, rh_pct: f32) -> Option<f32> {
    let (e_prime, _) = vapour_pressure_pa(temp_c, pressure_pa, rh_pct);
    let dry = f64::from(pressure_pa) - e_prime;
    if dry <= 0.0 {
        return None;
    }
    Some((EPSILON * e_prime / dry * 1000.0) as f32)
}

/// Dew point (°C) at standard pressure.
pub fn dew_point_c(temp_c: f32, rh_pct: f32) -> f32 {
    dew_point_at(temp_c, STANDARD_PRESSURE_PA, rh_pct).celsius
}

/// Iterative dew-point solve at `pressure_pa`.
///
/// The result never exceeds `temp_c`.
pub fn dew_point_at(temp_c: f32, pressure_pa: f32, rh_pct: f32) -> DewPoint {
    let (e_prime, e_w_hpa) = vapour_pressure_pa(temp_c, pressure_pa, rh_pct);
    let p_hpa = f64::from(pressure_pa) / 100.0;

    let solve = |f: f64| {
        let y = (e_prime / f / 611.213).ln();
        13.715 * y + 8.4262e-1 * y * y + 1.9048e-2 * y * y * y + 7.8158e-3 * y * y * y * y
    };

    // First pass: pressure-only approximation of the enhancement factor.
    let mut t_d = solve(1.0016 + 3.15e-6 * p_hpa - 0.074 / p_hpa);
    let mut iterations = 0;
    while iterations < MAX_DEW_ITERATIONS {
        iterations += 1;
        let next = solve(enhancement(e_w_hpa, p_hpa, t_d));
        let delta = (next - t_d).abs();
        t_d = next;
        if delta < DEW_TOLERANCE_C {
            break;
        }
    }

    DewPoint {
        celsius: (t_d as f32).min(temp_c),
        iterations,
    }
}
