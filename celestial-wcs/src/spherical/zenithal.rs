//! Zenithal (azimuthal) projections: the native pole sits at the reference
//! point and native longitude is the position angle around it.

use celestial_core::constants::{DEG_TO_RAD, HALF_PI, PI, RAD_TO_DEG};
use celestial_core::math::{asind_clamped, atan2d, sincosd};

use super::ProjectionParams;
use crate::common::{
    check_nonzero, from_polar, intermediate, native, solve_bracketed, to_polar, unit_clamp,
    DOMAIN_TOL, R0,
};
use crate::coordinate::{IntermediateCoord, NativeCoord};
use crate::error::{WcsError, WcsResult};

const ZPN_MAX_DEGREE: u16 = 29;

#[derive(Debug, Clone, PartialEq)]
pub enum Zenithal {
    /// Slant zenithal perspective.
    Azp { mu: f64, gamma: f64 },
    /// Slant zenithal perspective with an arbitrary projection point.
    Szp { mu: f64, phi_c: f64, theta_c: f64, xp: f64, yp: f64, zp: f64 },
    Tan,
    Stg,
    /// Orthographic, optionally slanted by (ξ, η).
    Sin { xi: f64, eta: f64 },
    Arc,
    /// Polynomial in zenith distance; `zeta_max` bounds the monotonic part.
    Zpn { coeffs: Vec<f64>, zeta_max: f64 },
    Zea,
    Air { theta_b: f64, c_b: f64 },
}

impl Zenithal {
    pub fn azp(params: &ProjectionParams) -> WcsResult<Self> {
        let mu = params.get_or(1, 0.0);
        let gamma = params.get_or(2, 0.0);
        if mu == -1.0 {
            return Err(WcsError::invalid_parameter(
                "AZP: mu = -1 places the projection point on the sphere",
            ));
        }
        if gamma.abs() >= 90.0 {
            return Err(WcsError::invalid_parameter("AZP: |gamma| must be below 90"));
        }
        Ok(Self::Azp { mu, gamma })
    }

    pub fn szp(params: &ProjectionParams) -> WcsResult<Self> {
        let mu = params.get_or(1, 0.0);
        let phi_c = params.get_or(2, 0.0);
        let theta_c = params.get_or(3, 90.0);
        let (sin_phi_c, cos_phi_c) = sincosd(phi_c);
        let (sin_theta_c, cos_theta_c) = sincosd(theta_c);
        let xp = -mu * cos_theta_c * sin_phi_c;
        let yp = mu * cos_theta_c * cos_phi_c;
        let zp = mu * sin_theta_c + 1.0;
        check_nonzero(zp, "SZP: mu * sin(theta_c) + 1")?;
        Ok(Self::Szp { mu, phi_c, theta_c, xp, yp, zp })
    }

    pub fn sin(params: &ProjectionParams) -> Self {
        Self::Sin {
            xi: params.get_or(1, 0.0),
            eta: params.get_or(2, 0.0),
        }
    }

    /// Legacy north-celestial-pole projection: SIN slanted so that the
    /// celestial pole is at its true distance from the reference point.
    pub fn ncp(reference_lat: f64) -> WcsResult<Self> {
        let (s, c) = sincosd(reference_lat);
        if s == 0.0 {
            return Err(WcsError::invalid_parameter(
                "NCP is undefined for a reference point on the equator",
            ));
        }
        Ok(Self::Sin { xi: 0.0, eta: c / s })
    }

    pub fn zpn(params: &ProjectionParams) -> WcsResult<Self> {
        let mut coeffs: Vec<f64> = (0..=ZPN_MAX_DEGREE).map(|m| params.get_or(m, 0.0)).collect();
        while coeffs.len() > 1 && coeffs.last() == Some(&0.0) {
            coeffs.pop();
        }
        if coeffs.len() < 2 {
            // No terms beyond the constant: fall back to the ARC-like P1 = 1.
            coeffs = vec![coeffs.first().copied().unwrap_or(0.0), 1.0];
        }
        if coeffs[1] <= 0.0 {
            return Err(WcsError::invalid_parameter(
                "ZPN: P1 must be positive for an invertible projection",
            ));
        }
        let zeta_max = zpn_monotonic_limit(&coeffs);
        Ok(Self::Zpn { coeffs, zeta_max })
    }

    pub fn air(params: &ProjectionParams) -> WcsResult<Self> {
        let theta_b = params.get_or(1, 90.0);
        if theta_b <= -90.0 || theta_b > 90.0 {
            return Err(WcsError::invalid_parameter("AIR: theta_b must lie in (-90, 90]"));
        }
        let xi_b = (90.0 - theta_b) * 0.5 * DEG_TO_RAD;
        let c_b = if xi_b.abs() < 1e-12 {
            -0.5
        } else {
            log_cos(xi_b) / libm::tan(xi_b).powi(2)
        };
        Ok(Self::Air { theta_b, c_b })
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Azp { .. } => "AZP",
            Self::Szp { .. } => "SZP",
            Self::Tan => "TAN",
            Self::Stg => "STG",
            Self::Sin { .. } => "SIN",
            Self::Arc => "ARC",
            Self::Zpn { .. } => "ZPN",
            Self::Zea => "ZEA",
            Self::Air { .. } => "AIR",
        }
    }

    pub fn project(&self, n: NativeCoord) -> WcsResult<IntermediateCoord> {
        let code = self.code();
        let (phi, theta) = (n.phi_deg(), n.theta_deg());
        let (sin_t, cos_t) = sincosd(theta);

        let (x, y) = match self {
            Self::Azp { mu, gamma } => {
                let (sin_p, cos_p) = sincosd(phi);
                let (sin_g, cos_g) = sincosd(*gamma);
                if mu.abs() > 1.0 && theta < asind_clamped(-1.0 / mu) - DOMAIN_TOL {
                    return Err(WcsError::out_of_bounds("AZP: point lies beyond the horizon"));
                }
                let t = mu + sin_t + cos_t * cos_p * (sin_g / cos_g);
                if t <= DOMAIN_TOL {
                    return Err(WcsError::out_of_bounds(
                        "AZP: point lies behind the projection point",
                    ));
                }
                let r = R0 * (mu + 1.0) * cos_t / t;
                (r * sin_p, -r * cos_p / cos_g)
            }
            Self::Szp { xp, yp, zp, .. } => {
                let (sin_p, cos_p) = sincosd(phi);
                let z = one_minus_sin(theta);
                let t = zp - z;
                if t <= DOMAIN_TOL {
                    return Err(WcsError::out_of_bounds(
                        "SZP: point lies behind the projection point",
                    ));
                }
                (
                    R0 * (zp * cos_t * sin_p - xp * z) / t,
                    -R0 * (zp * cos_t * cos_p + yp * z) / t,
                )
            }
            Self::Tan => {
                if sin_t <= 0.0 {
                    return Err(WcsError::singularity(
                        "TAN: native latitude must be above the equator",
                    ));
                }
                from_polar(R0 * cos_t / sin_t, phi)
            }
            Self::Stg => {
                if 1.0 + sin_t <= 0.0 {
                    return Err(WcsError::singularity("STG: the antipode of the reference point"));
                }
                from_polar(2.0 * R0 * cos_t / (1.0 + sin_t), phi)
            }
            Self::Sin { xi, eta } => {
                let (sin_p, cos_p) = sincosd(phi);
                let limit = -atan2d(xi * sin_p - eta * cos_p, 1.0);
                if theta < limit - DOMAIN_TOL {
                    return Err(WcsError::out_of_bounds("SIN: point lies on the hidden hemisphere"));
                }
                let z = one_minus_sin(theta);
                (R0 * (cos_t * sin_p + xi * z), -R0 * (cos_t * cos_p - eta * z))
            }
            Self::Arc => from_polar(90.0 - theta, phi),
            Self::Zpn { coeffs, zeta_max } => {
                let zeta = (90.0 - theta) * DEG_TO_RAD;
                if zeta > zeta_max + 1e-12 {
                    return Err(WcsError::out_of_bounds(
                        "ZPN: zenith distance beyond the monotonic range",
                    ));
                }
                from_polar(R0 * horner(coeffs, zeta), phi)
            }
            Self::Zea => {
                let (s, _) = sincosd(0.5 * (90.0 - theta));
                from_polar(2.0 * R0 * s, phi)
            }
            Self::Air { c_b, .. } => {
                if theta <= -90.0 + DOMAIN_TOL {
                    return Err(WcsError::singularity("AIR: the antipode of the reference point"));
                }
                let xi = 0.5 * (90.0 - theta) * DEG_TO_RAD;
                from_polar(air_radius(xi, *c_b), phi)
            }
        };
        intermediate(x, y, code)
    }

    pub fn deproject(&self, c: IntermediateCoord) -> WcsResult<NativeCoord> {
        let code = self.code();
        let (x, y) = (c.x_deg(), c.y_deg());

        let (phi, theta) = match self {
            Self::Azp { mu, gamma } => {
                let (sin_g, cos_g) = sincosd(*gamma);
                let yc = y * cos_g;
                let (r, phi) = to_polar(x, yc);
                if r == 0.0 {
                    (0.0, 90.0)
                } else {
                    let denom = R0 * (mu + 1.0) + y * sin_g;
                    if denom.abs() < 1e-12 {
                        return Err(WcsError::singularity(
                            "AZP: point maps to the slant singularity",
                        ));
                    }
                    let rho = r / denom;
                    let s = unit_clamp(rho * mu / libm::sqrt(rho * rho + 1.0), code)?;
                    let base = atan2d(1.0, rho);
                    let a = asind_clamped(s);
                    let near = base - a;
                    let far = base + a - 180.0;
                    let theta = [near, far]
                        .into_iter()
                        .filter(|t| t.abs() <= 90.0 + DOMAIN_TOL)
                        .fold(f64::NAN, f64::max);
                    if theta.is_nan() {
                        return Err(WcsError::out_of_bounds(
                            "AZP: no native latitude maps to this point",
                        ));
                    }
                    (phi, theta)
                }
            }
            Self::Szp { xp, yp, zp, .. } => {
                let xr = x / R0;
                let yr = y / R0;
                let x1 = (xr - xp) / zp;
                let y1 = (yr - yp) / zp;
                let r2 = xr * xr + yr * yr;
                let a = x1 * x1 + y1 * y1 + 1.0;
                let b = xr * x1 + yr * y1 + 1.0;
                let disc = b * b - a * r2;
                if disc < 0.0 {
                    return Err(WcsError::out_of_bounds(
                        "SZP: point lies outside the projection boundary",
                    ));
                }
                let z = solve_z(r2, a, b, disc);
                let phi = if z == 0.0 && r2 == 0.0 {
                    0.0
                } else {
                    atan2d(xr - x1 * z, -(yr - y1 * z))
                };
                (phi, theta_from_z(z, code)?)
            }
            Self::Tan => {
                let (r, phi) = to_polar(x, y);
                (phi, atan2d(R0, r))
            }
            Self::Stg => {
                let (r, phi) = to_polar(x, y);
                (phi, 90.0 - 2.0 * libm::atan(r / (2.0 * R0)) * RAD_TO_DEG)
            }
            Self::Sin { xi, eta } => {
                let xr = x / R0;
                let yr = y / R0;
                let r2 = xr * xr + yr * yr;
                let a = 1.0 + xi * xi + eta * eta;
                let b = 1.0 + xr * xi + yr * eta;
                let disc = b * b - a * r2;
                if disc < 0.0 {
                    return Err(WcsError::out_of_bounds(
                        "SIN: point lies outside the projection boundary",
                    ));
                }
                let z = solve_z(r2, a, b, disc);
                let px = xr - xi * z;
                let py = -(yr - eta * z);
                let phi = if px == 0.0 && py == 0.0 { 0.0 } else { atan2d(px, py) };
                (phi, theta_from_z(z, code)?)
            }
            Self::Arc => {
                let (r, phi) = to_polar(x, y);
                (phi, 90.0 - r)
            }
            Self::Zpn { coeffs, zeta_max } => {
                let (r, phi) = to_polar(x, y);
                let target = r / R0;
                let lo = coeffs[0];
                let hi = horner(coeffs, *zeta_max);
                if target < lo - 1e-12 || target > hi + 1e-12 {
                    return Err(WcsError::out_of_bounds("ZPN: radius outside the monotonic range"));
                }
                let zeta = solve_bracketed(
                    |z| horner(coeffs, z),
                    target.clamp(lo, hi),
                    0.0,
                    *zeta_max,
                    code,
                )?;
                (phi, 90.0 - zeta * RAD_TO_DEG)
            }
            Self::Zea => {
                let (r, phi) = to_polar(x, y);
                let w = unit_clamp(r / (2.0 * R0), code)?;
                (phi, 90.0 - 2.0 * asind_clamped(w))
            }
            Self::Air { c_b, .. } => {
                let (r, phi) = to_polar(x, y);
                if r == 0.0 {
                    (0.0, 90.0)
                } else {
                    let mut hi = 0.25 * PI;
                    let mut grown = 0;
                    while air_radius(hi, *c_b) < r {
                        hi = 0.5 * (hi + HALF_PI);
                        grown += 1;
                        if grown > 60 {
                            return Err(WcsError::out_of_bounds(
                                "AIR: radius beyond the projection boundary",
                            ));
                        }
                    }
                    let xi = solve_bracketed(|xi| air_radius(xi, *c_b), r, 0.0, hi, code)?;
                    (phi, 90.0 - 2.0 * xi * RAD_TO_DEG)
                }
            }
        };
        native(phi, theta, code)
    }
}

/// `1 − sin θ` without cancellation near the reference point.
#[inline]
fn one_minus_sin(theta: f64) -> f64 {
    let (s, _) = sincosd(0.5 * (90.0 - theta));
    2.0 * s * s
}

/// Smaller root of `a z² − 2 b z + r2 = 0`, written to avoid cancellation
/// when `r2` is small. `z = 1 − sin θ`.
#[inline]
fn solve_z(r2: f64, a: f64, b: f64, disc: f64) -> f64 {
    let denom = b + libm::sqrt(disc);
    if denom == 0.0 {
        b / a
    } else {
        r2 / denom
    }
}

fn theta_from_z(z: f64, code: &str) -> WcsResult<f64> {
    if !(-DOMAIN_TOL..=2.0 + DOMAIN_TOL).contains(&z) {
        return Err(WcsError::out_of_bounds(format!(
            "{code}: point lies outside the projection boundary"
        )));
    }
    let z = z.clamp(0.0, 2.0);
    Ok(atan2d(1.0 - z, libm::sqrt(z * (2.0 - z))))
}

#[inline]
fn horner(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

fn horner_derivative(coeffs: &[f64], x: f64) -> f64 {
    coeffs
        .iter()
        .enumerate()
        .skip(1)
        .rev()
        .fold(0.0, |acc, (m, &c)| acc * x + m as f64 * c)
}

/// First zenith distance where the ZPN polynomial stops increasing, or π.
fn zpn_monotonic_limit(coeffs: &[f64]) -> f64 {
    const STEPS: usize = 1800;
    let step = PI / STEPS as f64;
    let mut prev = 0.0;
    for k in 1..=STEPS {
        let z = k as f64 * step;
        if horner_derivative(coeffs, z) <= 0.0 {
            let (mut lo, mut hi) = (prev, z);
            for _ in 0..60 {
                let mid = 0.5 * (lo + hi);
                if horner_derivative(coeffs, mid) > 0.0 {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            return lo;
        }
        prev = z;
    }
    PI
}

/// ln(cos ξ) without the cancellation of `ln(1 − tiny)`.
#[inline]
fn log_cos(xi: f64) -> f64 {
    let s = libm::sin(0.5 * xi);
    libm::log1p(-2.0 * s * s)
}

/// Airy radius for half zenith distance `xi` (radians).
fn air_radius(xi: f64, c_b: f64) -> f64 {
    if xi == 0.0 {
        return 0.0;
    }
    let t = libm::tan(xi);
    -2.0 * R0 * (log_cos(xi) / t + c_b * t)
}
