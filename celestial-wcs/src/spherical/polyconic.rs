//! Bonne's equal-area and the (American) polyconic projection.

use celestial_core::constants::{DEG_TO_RAD, HALF_PI, RAD_TO_DEG};
use celestial_core::math::sincosd;

use super::pseudocylindrical::PseudoCylindrical;
use super::ProjectionParams;
use crate::common::{check_phi_range, intermediate, native, solve_bracketed, DOMAIN_TOL, R0};
use crate::coordinate::{IntermediateCoord, NativeCoord};
use crate::error::{WcsError, WcsResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Polyconic {
    /// Bonne with standard parallel θ1; θ1 = 0 reduces to Sanson-Flamsteed.
    Bon { theta_1: f64, y0: f64 },
    Pco,
}

impl Polyconic {
    pub fn bon(params: &ProjectionParams) -> WcsResult<Self> {
        let theta_1 = params.require(1, "BON")?;
        if theta_1.abs() >= 90.0 {
            return Err(WcsError::invalid_parameter("BON: |theta_1| must be below 90"));
        }
        let y0 = if theta_1 == 0.0 {
            0.0
        } else {
            let (s, c) = sincosd(theta_1);
            R0 * c / s + theta_1
        };
        Ok(Self::Bon { theta_1, y0 })
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Bon { .. } => "BON",
            Self::Pco => "PCO",
        }
    }

    pub fn project(&self, n: NativeCoord) -> WcsResult<IntermediateCoord> {
        let code = self.code();
        let (phi, theta) = (n.phi_deg(), n.theta_deg());
        match *self {
            Self::Bon { theta_1, .. } if theta_1 == 0.0 => PseudoCylindrical::Sfl.project(n),
            Self::Bon { y0, .. } => {
                let r = y0 - theta;
                let a = if r == 0.0 { 0.0 } else { phi * sincosd(theta).1 / r };
                let (s, c) = libm::sincos(a);
                intermediate(r * s, -r * c + y0, code)
            }
            Self::Pco => {
                if theta == 0.0 {
                    return intermediate(phi, 0.0, code);
                }
                let (sin_t, cos_t) = sincosd(theta);
                let cot = cos_t / sin_t;
                let e = phi * DEG_TO_RAD * sin_t;
                let half = libm::sin(0.5 * e);
                intermediate(R0 * cot * libm::sin(e), theta + R0 * cot * 2.0 * half * half, code)
            }
        }
    }

    pub fn deproject(&self, ic: IntermediateCoord) -> WcsResult<NativeCoord> {
        let code = self.code();
        let (x, y) = (ic.x_deg(), ic.y_deg());
        let (phi, theta) = match *self {
            Self::Bon { theta_1, .. } if theta_1 == 0.0 => {
                return PseudoCylindrical::Sfl.deproject(ic)
            }
            Self::Bon { theta_1, y0 } => {
                let dy = y0 - y;
                let r = libm::hypot(x, dy).copysign(theta_1);
                let theta = y0 - r;
                let a = if r == 0.0 { 0.0 } else { libm::atan2(x / r, dy / r) };
                let cos_t = sincosd(theta).1;
                let phi = if cos_t.abs() < 1e-15 {
                    if (a * r).abs() > DOMAIN_TOL {
                        return Err(WcsError::out_of_bounds("BON: pole maps to a single point"));
                    }
                    0.0
                } else {
                    a * r / cos_t
                };
                (phi, theta)
            }
            Self::Pco => pco_inverse(x, y, code)?,
        };
        native(check_phi_range(phi, code)?, theta, code)
    }
}

fn pco_inverse(x: f64, y: f64, code: &str) -> WcsResult<(f64, f64)> {
    if y.abs() < 1e-12 {
        return Ok((x, 0.0));
    }
    if y.abs() > 90.0 + DOMAIN_TOL {
        return Err(WcsError::out_of_bounds("PCO: point lies beyond the pole"));
    }
    if x.abs() < 1e-12 {
        return Ok((0.0, y));
    }

    // Solve in the northern half and mirror.
    let xr = x * DEG_TO_RAD;
    let yr = (y * DEG_TO_RAD).abs().min(HALF_PI);
    let residual = |t: f64| {
        let d = yr - t;
        xr * xr + d * d - 2.0 * d / libm::tan(t)
    };
    let lo = 1e-12 * yr;
    let theta = solve_bracketed(residual, 0.0, lo, yr, code)?;

    let tan_t = libm::tan(theta);
    let e = libm::atan2(xr * tan_t, 1.0 - (yr - theta) * tan_t);
    let phi = e / libm::sin(theta) * RAD_TO_DEG;
    Ok((phi, (theta * RAD_TO_DEG).copysign(y)))
}
