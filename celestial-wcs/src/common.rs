use celestial_core::constants::RAD_TO_DEG;
use celestial_core::math::{atan2d, sincosd};

use crate::coordinate::{IntermediateCoord, NativeCoord};
use crate::error::{WcsError, WcsResult};

/// Radius of the generating sphere, chosen so that intermediate
/// coordinates come out in degrees.
pub(crate) const R0: f64 = RAD_TO_DEG;

/// Slack allowed on domain boundaries, in degrees or unit-sphere terms.
pub(crate) const DOMAIN_TOL: f64 = 1e-10;

/// Polar (R, φ) to Cartesian with the zenithal/conic sign convention
/// x = R sin φ, y = −R cos φ.
#[inline]
pub(crate) fn from_polar(r: f64, phi_deg: f64) -> (f64, f64) {
    let (s, c) = sincosd(phi_deg);
    (r * s, -r * c)
}

/// Inverse of [`from_polar`]; φ is 0 at the origin.
#[inline]
pub(crate) fn to_polar(x: f64, y: f64) -> (f64, f64) {
    let r = libm::hypot(x, y);
    let phi = if r == 0.0 { 0.0 } else { atan2d(x, -y) };
    (r, phi)
}

pub(crate) fn intermediate(x: f64, y: f64, code: &str) -> WcsResult<IntermediateCoord> {
    if x.is_finite() && y.is_finite() {
        Ok(IntermediateCoord::new(x, y))
    } else {
        Err(WcsError::non_finite(format!("{code} projection produced ({x}, {y})")))
    }
}

pub(crate) fn native(phi: f64, theta: f64, code: &str) -> WcsResult<NativeCoord> {
    if !(phi.is_finite() && theta.is_finite()) {
        return Err(WcsError::non_finite(format!("{code} deprojection produced ({phi}, {theta})")));
    }
    if theta.abs() > 90.0 + DOMAIN_TOL {
        return Err(WcsError::out_of_bounds(format!("{code}: native latitude {theta} beyond pole")));
    }
    Ok(NativeCoord::new(phi, theta.clamp(-90.0, 90.0)))
}

/// Rejects native longitudes outside [-180, 180] for projections whose
/// image is a bounded region.
pub(crate) fn check_phi_range(phi: f64, code: &str) -> WcsResult<f64> {
    if phi.abs() > 180.0 + DOMAIN_TOL {
        return Err(WcsError::out_of_bounds(format!(
            "{code}: point lies outside the projection boundary"
        )));
    }
    Ok(phi.clamp(-180.0, 180.0))
}

/// Clamps a sine/cosine that drifted just past ±1, rejecting anything further.
pub(crate) fn unit_clamp(v: f64, code: &str) -> WcsResult<f64> {
    if v.abs() > 1.0 + DOMAIN_TOL {
        return Err(WcsError::out_of_bounds(format!(
            "{code}: point lies outside the projection boundary"
        )));
    }
    Ok(v.clamp(-1.0, 1.0))
}

pub(crate) fn check_nonzero(value: f64, what: &str) -> WcsResult<()> {
    if value.abs() < 1e-12 {
        return Err(WcsError::invalid_parameter(format!("{what} must be non-zero")));
    }
    Ok(())
}

/// Finds `x` in `[lo, hi]` with `f(x) = target`, given `f(lo) <= target <= f(hi)`.
///
/// Illinois variant of regula falsi: superlinear in practice and never
/// leaves the bracket.
pub(crate) fn solve_bracketed<F>(
    f: F,
    target: f64,
    mut lo: f64,
    mut hi: f64,
    code: &str,
) -> WcsResult<f64>
where
    F: Fn(f64) -> f64,
{
    let mut f_lo = f(lo) - target;
    let mut f_hi = f(hi) - target;
    if f_lo == 0.0 {
        return Ok(lo);
    }
    if f_hi == 0.0 {
        return Ok(hi);
    }
    if f_lo.signum() == f_hi.signum() {
        return Err(WcsError::out_of_bounds(format!(
            "{code}: no solution in the projection domain"
        )));
    }

    let mut side = 0i8;
    for _ in 0..200 {
        let mut x = (lo * f_hi - hi * f_lo) / (f_hi - f_lo);
        if !(x > lo.min(hi) && x < lo.max(hi)) {
            x = 0.5 * (lo + hi);
        }
        let fx = f(x) - target;
        if fx == 0.0 || (hi - lo).abs() <= 4.0 * f64::EPSILON * x.abs().max(f64::MIN_POSITIVE) {
            return Ok(x);
        }
        if fx.signum() == f_hi.signum() {
            hi = x;
            f_hi = fx;
            if side == -1 {
                f_lo *= 0.5;
            }
            side = -1;
        } else {
            lo = x;
            f_lo = fx;
            if side == 1 {
                f_hi *= 0.5;
            }
            side = 1;
        }
    }
    Ok(0.5 * (lo + hi))
}
