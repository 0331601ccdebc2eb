//! Conic projections. The native reference point is (0, θa); the cone
//! touches or cuts the sphere at the standard parallels θa ∓ η.

use celestial_core::constants::DEG_TO_RAD;
use celestial_core::math::{asind_clamped, atan2d, sincosd};

use super::ProjectionParams;
use crate::common::{
    check_nonzero, check_phi_range, intermediate, native, unit_clamp, DOMAIN_TOL, R0,
};
use crate::coordinate::{IntermediateCoord, NativeCoord};
use crate::error::{WcsError, WcsResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConicKind {
    /// Perspective.
    Cop { k: f64, cot_a: f64 },
    /// Equal-area.
    Coe { gamma: f64, w: f64, k: f64 },
    /// Equidistant.
    Cod,
    /// Orthomorphic.
    Coo { psi: f64 },
}

/// A conic projection with its constants precomputed from `PVi_1`/`PVi_2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conic {
    kind: ConicKind,
    theta_a: f64,
    eta: f64,
    /// Cone constant: φ scales by this to give the polar angle.
    c: f64,
    y0: f64,
}

impl Conic {
    fn parameters(params: &ProjectionParams, code: &str) -> WcsResult<(f64, f64)> {
        let theta_a = params.require(1, code)?;
        let eta = params.get_or(2, 0.0);
        if theta_a.abs() >= 90.0 {
            return Err(WcsError::invalid_parameter(format!("{code}: |theta_a| must be below 90")));
        }
        check_nonzero(theta_a, &format!("{code}: theta_a"))?;
        if eta.abs() >= 90.0 {
            return Err(WcsError::invalid_parameter(format!("{code}: |eta| must be below 90")));
        }
        Ok((theta_a, eta))
    }

    pub fn cop(params: &ProjectionParams) -> WcsResult<Self> {
        let (theta_a, eta) = Self::parameters(params, "COP")?;
        let (sin_a, cos_a) = sincosd(theta_a);
        let k = R0 * sincosd(eta).1;
        let cot_a = cos_a / sin_a;
        Ok(Self {
            kind: ConicKind::Cop { k, cot_a },
            theta_a,
            eta,
            c: sin_a,
            y0: k * cot_a,
        })
    }

    pub fn coe(params: &ProjectionParams) -> WcsResult<Self> {
        let (theta_a, eta) = Self::parameters(params, "COE")?;
        let s1 = sincosd(theta_a - eta).0;
        let s2 = sincosd(theta_a + eta).0;
        let gamma = s1 + s2;
        check_nonzero(gamma, "COE: sin(theta_1) + sin(theta_2)")?;
        let w = 1.0 + s1 * s2;
        let k = 2.0 * R0 / gamma;
        let y0 = k * libm::sqrt(w - gamma * sincosd(theta_a).0);
        Ok(Self {
            kind: ConicKind::Coe { gamma, w, k },
            theta_a,
            eta,
            c: gamma / 2.0,
            y0,
        })
    }

    pub fn cod(params: &ProjectionParams) -> WcsResult<Self> {
        let (theta_a, eta) = Self::parameters(params, "COD")?;
        let (sin_a, cos_a) = sincosd(theta_a);
        let cot_a = cos_a / sin_a;
        let (c, y0) = if eta == 0.0 {
            (sin_a, R0 * cot_a)
        } else {
            let eta_rad = eta * DEG_TO_RAD;
            let (sin_e, cos_e) = libm::sincos(eta_rad);
            (sin_a * sin_e / eta_rad, R0 * eta_rad * cos_e / sin_e * cot_a)
        };
        Ok(Self {
            kind: ConicKind::Cod,
            theta_a,
            eta,
            c,
            y0,
        })
    }

    pub fn coo(params: &ProjectionParams) -> WcsResult<Self> {
        let (theta_a, eta) = Self::parameters(params, "COO")?;
        let theta_1 = theta_a - eta;
        let theta_2 = theta_a + eta;
        let half_tan = |t: f64| libm::tan(0.5 * (90.0 - t) * DEG_TO_RAD);
        let cos_1 = sincosd(theta_1).1;
        let cos_2 = sincosd(theta_2).1;
        if cos_1 <= 0.0 || cos_2 <= 0.0 {
            return Err(WcsError::invalid_parameter("COO: standard parallels must avoid the poles"));
        }
        let c = if eta == 0.0 {
            sincosd(theta_a).0
        } else {
            libm::log(cos_2 / cos_1) / libm::log(half_tan(theta_2) / half_tan(theta_1))
        };
        check_nonzero(c, "COO: cone constant")?;
        let psi = R0 * cos_1 / (c * libm::pow(half_tan(theta_1), c));
        let y0 = psi * libm::pow(half_tan(theta_a), c);
        Ok(Self {
            kind: ConicKind::Coo { psi },
            theta_a,
            eta,
            c,
            y0,
        })
    }

    pub fn code(&self) -> &'static str {
        match self.kind {
            ConicKind::Cop { .. } => "COP",
            ConicKind::Coe { .. } => "COE",
            ConicKind::Cod => "COD",
            ConicKind::Coo { .. } => "COO",
        }
    }

    pub fn theta_a(&self) -> f64 {
        self.theta_a
    }

    pub fn eta(&self) -> f64 {
        self.eta
    }

    pub fn cone_constant(&self) -> f64 {
        self.c
    }

    pub fn project(&self, n: NativeCoord) -> WcsResult<IntermediateCoord> {
        let code = self.code();
        let (phi, theta) = (n.phi_deg(), n.theta_deg());

        let r = match self.kind {
            ConicKind::Cop { k, cot_a } => {
                let (s, c) = sincosd(theta - self.theta_a);
                if c <= DOMAIN_TOL {
                    return Err(WcsError::out_of_bounds(
                        "COP: point lies at the perspective singularity",
                    ));
                }
                let r = k * (cot_a - s / c);
                if r * self.c < 0.0 {
                    return Err(WcsError::out_of_bounds(
                        "COP: point lies on the far side of the apex",
                    ));
                }
                r
            }
            ConicKind::Coe { gamma, w, k } => {
                k * libm::sqrt((w - gamma * sincosd(theta).0).max(0.0))
            }
            ConicKind::Cod => self.theta_a - theta + self.y0,
            ConicKind::Coo { psi } => {
                let t = libm::tan(0.5 * (90.0 - theta) * DEG_TO_RAD);
                if t <= 0.0 {
                    if self.c > 0.0 {
                        0.0
                    } else {
                        return Err(WcsError::singularity("COO: pole projects to infinity"));
                    }
                } else if !t.is_finite() || (theta <= -90.0 + DOMAIN_TOL && self.c > 0.0) {
                    return Err(WcsError::singularity("COO: pole projects to infinity"));
                } else {
                    psi * libm::pow(t, self.c)
                }
            }
        };

        let (s, c) = sincosd(self.c * phi);
        intermediate(r * s, -r * c + self.y0, code)
    }

    pub fn deproject(&self, ic: IntermediateCoord) -> WcsResult<NativeCoord> {
        let code = self.code();
        let x = ic.x_deg();
        let dy = self.y0 - ic.y_deg();
        let r = libm::hypot(x, dy).copysign(self.theta_a);

        let phi = if r == 0.0 { 0.0 } else { atan2d(x / r, dy / r) / self.c };
        let phi = check_phi_range(phi, code)?;

        let theta = match self.kind {
            ConicKind::Cop { k, cot_a } => self.theta_a + atan2d(cot_a - r / k, 1.0),
            ConicKind::Coe { gamma, w, k } => {
                let q = r / k;
                asind_clamped(unit_clamp((w - q * q) / gamma, code)?)
            }
            ConicKind::Cod => self.theta_a + self.y0 - r,
            ConicKind::Coo { psi } => {
                let ratio = r / psi;
                if ratio < 0.0 {
                    return Err(WcsError::out_of_bounds(
                        "COO: point lies on the far side of the apex",
                    ));
                }
                if ratio == 0.0 {
                    if self.c > 0.0 {
                        90.0
                    } else {
                        -90.0
                    }
                } else {
                    90.0 - 2.0 * atan2d(libm::pow(ratio, 1.0 / self.c), 1.0)
                }
            }
        };
        native(phi, theta, code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn params(theta_a: f64, eta: f64) -> ProjectionParams {
        ProjectionParams::from_pairs([(1, theta_a), (2, eta)])
    }

    fn all(theta_a: f64, eta: f64) -> Vec<Conic> {
        let p = params(theta_a, eta);
        vec![
            Conic::cop(&p).unwrap(),
            Conic::coe(&p).unwrap(),
            Conic::cod(&p).unwrap(),
            Conic::coo(&p).unwrap(),
        ]
    }

    #[test]
    fn test_reference_point_is_origin() {
        for conic in all(45.0, 10.0).into_iter().chain(all(-30.0, 0.0)) {
            let inter = conic.project(NativeCoord::new(0.0, conic.theta_a())).unwrap();
            assert_abs_diff_eq!(inter.x_deg(), 0.0, epsilon = 1e-10);
            assert_abs_diff_eq!(inter.y_deg(), 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_round_trips() {
        for conic in all(45.0, 10.0).into_iter().chain(all(-30.0, 5.0)).chain(all(60.0, 0.0)) {
            let base = conic.theta_a();
            for &(phi, dt) in &[(0.0, 0.0), (40.0, 10.0), (-120.0, -20.0), (170.0, 15.0)] {
                let theta = base + dt;
                let inter = conic.project(NativeCoord::new(phi, theta)).unwrap();
                let back = conic.deproject(inter).unwrap();
                assert_abs_diff_eq!(back.phi_deg(), phi, epsilon = 1e-9);
                assert_abs_diff_eq!(back.theta_deg(), theta, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_theta_a_is_required() {
        let err = Conic::cop(&ProjectionParams::default()).unwrap_err();
        assert!(matches!(err, WcsError::MissingKeyword { .. }));
        assert!(Conic::cod(&params(0.0, 0.0)).is_err());
        assert!(Conic::coe(&params(90.0, 0.0)).is_err());
    }

    #[test]
    fn test_cone_constant() {
        let cod = Conic::cod(&params(45.0, 0.0)).unwrap();
        assert_abs_diff_eq!(cod.cone_constant(), libm::sqrt(0.5), epsilon = 1e-15);
        let coe = Conic::coe(&params(30.0, 0.0)).unwrap();
        assert_abs_diff_eq!(coe.cone_constant(), 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_cop_far_side() {
        let cop = Conic::cop(&params(45.0, 0.0)).unwrap();
        assert!(cop.project(NativeCoord::new(0.0, -45.0)).is_err());
    }
}
