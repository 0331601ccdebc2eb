//! Cylindrical projections. Native reference point is (0, 0); x is a
//! linear function of φ, y a function of θ alone.

use celestial_core::math::{asind_clamped, atan2d, sincosd};

use super::ProjectionParams;
use crate::common::{
    check_nonzero, check_phi_range, intermediate, native, unit_clamp, DOMAIN_TOL, R0,
};
use crate::coordinate::{IntermediateCoord, NativeCoord};
use crate::error::{WcsError, WcsResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cylindrical {
    Car,
    Mer,
    /// Lambert equal-area with scale λ in (0, 1].
    Cea { lambda: f64 },
    /// Perspective cylindrical.
    Cyp { mu: f64, lambda: f64 },
}

impl Cylindrical {
    pub fn cea(params: &ProjectionParams) -> WcsResult<Self> {
        let lambda = params.get_or(1, 1.0);
        if !(lambda > 0.0 && lambda <= 1.0) {
            return Err(WcsError::invalid_parameter(format!(
                "CEA: lambda = {lambda} must lie in (0, 1]"
            )));
        }
        Ok(Self::Cea { lambda })
    }

    pub fn cyp(params: &ProjectionParams) -> WcsResult<Self> {
        let mu = params.get_or(1, 1.0);
        let lambda = params.get_or(2, 1.0);
        check_nonzero(lambda, "CYP: lambda")?;
        check_nonzero(mu + lambda, "CYP: mu + lambda")?;
        Ok(Self::Cyp { mu, lambda })
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Car => "CAR",
            Self::Mer => "MER",
            Self::Cea { .. } => "CEA",
            Self::Cyp { .. } => "CYP",
        }
    }

    pub fn project(&self, n: NativeCoord) -> WcsResult<IntermediateCoord> {
        let code = self.code();
        let (phi, theta) = (n.phi_deg(), n.theta_deg());
        let (x, y) = match *self {
            Self::Car => (phi, theta),
            Self::Mer => {
                if theta.abs() >= 90.0 - DOMAIN_TOL {
                    return Err(WcsError::singularity("MER: the poles project to infinity"));
                }
                let (s, c) = sincosd(theta);
                (phi, R0 * libm::asinh(s / c))
            }
            Self::Cea { lambda } => (phi, R0 * sincosd(theta).0 / lambda),
            Self::Cyp { mu, lambda } => {
                let (s, c) = sincosd(theta);
                let denom = mu + c;
                if denom <= DOMAIN_TOL {
                    return Err(WcsError::singularity(
                        "CYP: point lies at the perspective singularity",
                    ));
                }
                (lambda * phi, R0 * (mu + lambda) * s / denom)
            }
        };
        intermediate(x, y, code)
    }

    pub fn deproject(&self, c: IntermediateCoord) -> WcsResult<NativeCoord> {
        let code = self.code();
        let (x, y) = (c.x_deg(), c.y_deg());
        let (phi, theta) = match *self {
            Self::Car => (x, y),
            Self::Mer => (x, libm::atan(libm::sinh(y / R0)).to_degrees()),
            Self::Cea { lambda } => (x, asind_clamped(unit_clamp(lambda * y / R0, code)?)),
            Self::Cyp { mu, lambda } => {
                let eta = y / (R0 * (mu + lambda));
                let s = unit_clamp(eta * mu / libm::sqrt(eta * eta + 1.0), code)?;
                (x / lambda, atan2d(eta, 1.0) + asind_clamped(s))
            }
        };
        native(check_phi_range(phi, code)?, theta, code)
    }
}
