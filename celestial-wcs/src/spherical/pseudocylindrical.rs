//! Pseudo-cylindrical projections: parallels are straight, meridians curve
//! towards the poles. Native reference point is (0, 0).

use celestial_core::constants::{DEG_TO_RAD, HALF_PI, PI, SQRT2};
use celestial_core::math::{asind_clamped, atan2d, sincosd};

use crate::common::{
    check_phi_range, intermediate, native, solve_bracketed, unit_clamp, DOMAIN_TOL, R0,
};
use crate::coordinate::{IntermediateCoord, NativeCoord};
use crate::error::{WcsError, WcsResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoCylindrical {
    /// Sanson-Flamsteed; also used for the legacy GLS code.
    Sfl,
    Par,
    Mol,
    Ait,
}

impl PseudoCylindrical {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sfl => "SFL",
            Self::Par => "PAR",
            Self::Mol => "MOL",
            Self::Ait => "AIT",
        }
    }

    pub fn project(&self, n: NativeCoord) -> WcsResult<IntermediateCoord> {
        let code = self.code();
        let (phi, theta) = (n.phi_deg(), n.theta_deg());
        let (x, y) = match self {
            Self::Sfl => (phi * sincosd(theta).1, theta),
            Self::Par => {
                let (s3, _) = sincosd(theta / 3.0);
                let (_, c23) = sincosd(2.0 * theta / 3.0);
                (phi * (2.0 * c23 - 1.0), 180.0 * s3)
            }
            Self::Mol => {
                let gamma = mollweide_gamma(theta, code)?;
                let (s, c) = libm::sincos(gamma);
                (2.0 * SQRT2 / PI * phi * c, SQRT2 * R0 * s)
            }
            Self::Ait => {
                let (s_t, c_t) = sincosd(theta);
                let (s_h, c_h) = sincosd(0.5 * phi);
                let denom = 1.0 + c_t * c_h;
                if denom <= DOMAIN_TOL {
                    return Err(WcsError::singularity("AIT: antipode of the reference point"));
                }
                let gamma = libm::sqrt(2.0 / denom);
                (2.0 * R0 * gamma * c_t * s_h, R0 * gamma * s_t)
            }
        };
        intermediate(x, y, code)
    }

    pub fn deproject(&self, c: IntermediateCoord) -> WcsResult<NativeCoord> {
        let code = self.code();
        let (x, y) = (c.x_deg(), c.y_deg());
        let (phi, theta) = match self {
            Self::Sfl => {
                let cos_t = sincosd(y).1;
                let phi = if cos_t.abs() < 1e-15 {
                    if x.abs() > DOMAIN_TOL {
                        return Err(WcsError::out_of_bounds("SFL: pole maps to a single point"));
                    }
                    0.0
                } else {
                    x / cos_t
                };
                (phi, y)
            }
            Self::Par => {
                let s = y / 180.0;
                if s.abs() > 0.5 + DOMAIN_TOL {
                    return Err(WcsError::out_of_bounds(
                        "PAR: point lies outside the projection boundary",
                    ));
                }
                let s = s.clamp(-0.5, 0.5);
                let denom = 1.0 - 4.0 * s * s;
                let phi = if denom.abs() < 1e-15 {
                    if x.abs() > DOMAIN_TOL {
                        return Err(WcsError::out_of_bounds("PAR: pole maps to a single point"));
                    }
                    0.0
                } else {
                    x / denom
                };
                (phi, 3.0 * asind_clamped(s))
            }
            Self::Mol => {
                let s = unit_clamp(y / (SQRT2 * R0), code)?;
                let gamma = libm::asin(s);
                let c = libm::cos(gamma);
                let phi = if c.abs() < 1e-15 {
                    if x.abs() > DOMAIN_TOL {
                        return Err(WcsError::out_of_bounds("MOL: pole maps to a single point"));
                    }
                    0.0
                } else {
                    PI * x / (2.0 * SQRT2 * c)
                };
                let sin_t = unit_clamp((2.0 * gamma + libm::sin(2.0 * gamma)) / PI, code)?;
                (phi, asind_clamped(sin_t))
            }
            Self::Ait => {
                let u = x / (4.0 * R0);
                let v = y / (2.0 * R0);
                let z2 = 1.0 - u * u - v * v;
                if z2 < 0.5 - DOMAIN_TOL {
                    return Err(WcsError::out_of_bounds(
                        "AIT: point lies outside the projection boundary",
                    ));
                }
                let z = libm::sqrt(z2.max(0.5));
                let phi = 2.0 * atan2d(z * x / (2.0 * R0), 2.0 * z * z - 1.0);
                let sin_t = unit_clamp(y * z / R0, code)?;
                (phi, asind_clamped(sin_t))
            }
        };
        native(check_phi_range(phi, code)?, theta, code)
    }
}

/// Solves `2γ + sin 2γ = π sin θ` for the Mollweide auxiliary angle.
fn mollweide_gamma(theta: f64, code: &str) -> WcsResult<f64> {
    if theta.abs() >= 90.0 {
        return Ok(HALF_PI.copysign(theta));
    }
    let target = PI * libm::sin(theta * DEG_TO_RAD);
    solve_bracketed(|g| 2.0 * g + libm::sin(2.0 * g), target, -HALF_PI, HALF_PI, code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const ALL: [PseudoCylindrical; 4] = [
        PseudoCylindrical::Sfl,
        PseudoCylindrical::Par,
        PseudoCylindrical::Mol,
        PseudoCylindrical::Ait,
    ];

    #[test]
    fn test_reference_point_is_origin() {
        for p in ALL {
            let inter = p.project(NativeCoord::new(0.0, 0.0)).unwrap();
            assert_abs_diff_eq!(inter.x_deg(), 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!(inter.y_deg(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_round_trips() {
        for p in ALL {
            for &(phi, theta) in &[(10.0, 20.0), (-150.0, -60.0), (179.0, 5.0), (45.0, 85.0)] {
                let inter = p.project(NativeCoord::new(phi, theta)).unwrap();
                let back = p.deproject(inter).unwrap();
                assert_abs_diff_eq!(back.phi_deg(), phi, epsilon = 1e-8);
                assert_abs_diff_eq!(back.theta_deg(), theta, epsilon = 1e-8);
            }
        }
    }

    #[test]
    fn test_outside_boundary() {
        assert!(PseudoCylindrical::Ait.deproject(IntermediateCoord::new(400.0, 0.0)).is_err());
        assert!(PseudoCylindrical::Par.deproject(IntermediateCoord::new(0.0, 100.0)).is_err());
        assert!(PseudoCylindrical::Sfl.deproject(IntermediateCoord::new(200.0, 0.0)).is_err());
        assert!(PseudoCylindrical::Mol.deproject(IntermediateCoord::new(0.0, 90.0)).is_err());
    }

    #[test]
    fn test_mollweide_pole() {
        let inter = PseudoCylindrical::Mol.project(NativeCoord::new(30.0, 90.0)).unwrap();
        assert_abs_diff_eq!(inter.x_deg(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(inter.y_deg(), SQRT2 * R0, epsilon = 1e-12);
    }
}
