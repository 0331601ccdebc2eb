//! Native-spherical machinery: the rotation between native and celestial
//! spherical coordinates, and the projection families that map native
//! coordinates onto the plane of intermediate world coordinates.

use std::collections::BTreeMap;

use celestial_core::constants::RAD_TO_DEG;
use celestial_core::math::{asind_clamped, atan2d, sincosd};
use celestial_core::utils::{normalize_longitude, normalize_longitude_positive};

use crate::coordinate::{CelestialCoord, IntermediateCoord, NativeCoord};
use crate::error::{WcsError, WcsResult};

mod conic;
mod cylindrical;
mod polyconic;
mod pseudocylindrical;
mod zenithal;

pub use conic::{Conic, ConicKind};
pub use cylindrical::Cylindrical;
pub use polyconic::Polyconic;
pub use pseudocylindrical::PseudoCylindrical;
pub use zenithal::Zenithal;

const POLE_TOL: f64 = 1e-12;

/// Euler rotation from native (φ, θ) to celestial (α, δ), all in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphericalRotation {
    alpha_p: f64,
    delta_p: f64,
    phi_p: f64,
    sin_delta_p: f64,
    cos_delta_p: f64,
}

impl SphericalRotation {
    /// Rotation with the celestial pole at (α_p, δ_p) and native longitude
    /// φ_p of that pole.
    pub fn new(alpha_p: f64, delta_p: f64, phi_p: f64) -> Self {
        let (sin_delta_p, cos_delta_p) = sincosd(delta_p);
        Self {
            alpha_p,
            delta_p,
            phi_p,
            sin_delta_p,
            cos_delta_p,
        }
    }

    pub fn default_lonpole(delta_0: f64, phi_0: f64, theta_0: f64) -> f64 {
        if delta_0 < theta_0 {
            phi_0 + 180.0
        } else {
            phi_0
        }
    }

    /// Solves for the celestial pole from the reference point (α₀, δ₀),
    /// which sits at native (φ₀, θ₀). `latpole` picks between the two
    /// solutions when both are valid.
    pub fn from_reference(
        alpha_0: f64,
        delta_0: f64,
        phi_0: f64,
        theta_0: f64,
        lonpole: Option<f64>,
        latpole: Option<f64>,
    ) -> WcsResult<Self> {
        let phi_p = lonpole.unwrap_or_else(|| Self::default_lonpole(delta_0, phi_0, theta_0));
        let latpole = latpole.unwrap_or(90.0);

        let (sin_t0, cos_t0) = sincosd(theta_0);
        let (sin_dphi, cos_dphi) = sincosd(phi_p - phi_0);

        let delta_p = if theta_0 == 90.0 {
            delta_0
        } else {
            Self::solve_delta_p(delta_0, sin_t0, cos_t0, sin_dphi, cos_dphi, latpole)?
        };

        let (sin_dp, cos_dp) = sincosd(delta_p);
        let alpha_p = if cos_dp.abs() < POLE_TOL {
            if delta_p > 0.0 {
                alpha_0 + phi_p - phi_0 - 180.0
            } else {
                alpha_0 - phi_p + phi_0
            }
        } else {
            let x = cos_t0 * sin_dphi;
            let y = sin_t0 * cos_dp - cos_t0 * sin_dp * cos_dphi;
            if x.abs() < POLE_TOL && y.abs() < POLE_TOL {
                alpha_0
            } else {
                alpha_0 - atan2d(x, y)
            }
        };

        Ok(Self::new(normalize_longitude(alpha_p), delta_p, phi_p))
    }

    fn solve_delta_p(
        delta_0: f64,
        sin_t0: f64,
        cos_t0: f64,
        sin_dphi: f64,
        cos_dphi: f64,
        latpole: f64,
    ) -> WcsResult<f64> {
        let sin_d0 = sincosd(delta_0).0;
        let denom_sq = 1.0 - (cos_t0 * sin_dphi).powi(2);
        if denom_sq < POLE_TOL {
            if sin_d0.abs() < POLE_TOL {
                return Ok(latpole);
            }
            return Err(WcsError::invalid_parameter(
                "no celestial pole satisfies LONPOLE for this reference point",
            ));
        }

        let arg = sin_d0 / libm::sqrt(denom_sq);
        if arg.abs() > 1.0 + POLE_TOL {
            return Err(WcsError::invalid_parameter(
                "no celestial pole satisfies LONPOLE for this reference point",
            ));
        }
        let xi = atan2d(sin_t0, cos_t0 * cos_dphi);
        let spread = libm::acos(arg.clamp(-1.0, 1.0)).to_degrees();

        let in_range = |d: f64| d.abs() <= 90.0 + 1e-10;
        let candidates = [xi + spread, xi - spread];
        candidates
            .into_iter()
            .filter(|d| in_range(*d))
            .map(|d| d.clamp(-90.0, 90.0))
            .min_by(|a, b| (a - latpole).abs().total_cmp(&(b - latpole).abs()))
            .ok_or_else(|| WcsError::invalid_parameter("celestial pole latitude outside [-90, 90]"))
    }

    pub fn native_to_celestial(&self, native: NativeCoord) -> CelestialCoord {
        let (sin_t, cos_t) = sincosd(native.theta_deg());
        let (sin_d, cos_d) = sincosd(native.phi_deg() - self.phi_p);

        let x = -cos_t * sin_d;
        let y = sin_t * self.cos_delta_p - cos_t * self.sin_delta_p * cos_d;
        let z = sin_t * self.sin_delta_p + cos_t * self.cos_delta_p * cos_d;
        let alpha = self.alpha_p + atan2d(x, y);
        let delta = latitude_from_components(x, y, z);

        CelestialCoord::new(normalize_longitude_positive(alpha), delta)
    }

    pub fn celestial_to_native(&self, celestial: CelestialCoord) -> NativeCoord {
        let (sin_dl, cos_dl) = sincosd(celestial.lat_deg());
        let (sin_a, cos_a) = sincosd(celestial.lon_deg() - self.alpha_p);

        let x = -cos_dl * sin_a;
        let y = sin_dl * self.cos_delta_p - cos_dl * self.sin_delta_p * cos_a;
        let z = sin_dl * self.sin_delta_p + cos_dl * self.cos_delta_p * cos_a;
        let phi = self.phi_p + atan2d(x, y);
        let theta = latitude_from_components(x, y, z);

        NativeCoord::new(normalize_longitude(phi), theta)
    }

    pub fn alpha_p(&self) -> f64 {
        self.alpha_p
    }

    pub fn delta_p(&self) -> f64 {
        self.delta_p
    }

    pub fn phi_p(&self) -> f64 {
        self.phi_p
    }
}

/// Latitude of the unit vector `(x, y, z)`. Near a pole `asin(z)` is
/// ill-conditioned, so the magnitude comes from the equatorial components.
fn latitude_from_components(x: f64, y: f64, z: f64) -> f64 {
    if z.abs() > 0.99 {
        let lat = libm::acos(libm::hypot(x, y).min(1.0)) * RAD_TO_DEG;
        lat.copysign(z)
    } else {
        asind_clamped(z)
    }
}

/// `PVi_m` values of the latitude axis, keyed by `m`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionParams {
    values: BTreeMap<u16, f64>,
}

impl ProjectionParams {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u16, f64)>) -> Self {
        Self {
            values: pairs.into_iter().collect(),
        }
    }

    pub fn insert(&mut self, m: u16, value: f64) {
        self.values.insert(m, value);
    }

    pub fn get(&self, m: u16) -> Option<f64> {
        self.values.get(&m).copied()
    }

    pub fn get_or(&self, m: u16, default: f64) -> f64 {
        self.get(m).unwrap_or(default)
    }

    pub fn require(&self, m: u16, code: &str) -> WcsResult<f64> {
        self.get(m)
            .ok_or_else(|| WcsError::missing_keyword(format!("PVi_{m} (required by {code})")))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, f64)> + '_ {
        self.values.iter().map(|(&m, &v)| (m, v))
    }
}

/// A spherical projection with its parameters resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Zenithal(Zenithal),
    Cylindrical(Cylindrical),
    PseudoCylindrical(PseudoCylindrical),
    Conic(Conic),
    Polyconic(Polyconic),
}

impl Projection {
    /// Resolves a three-letter code. `reference_lat` is CRVAL of the
    /// latitude axis, needed only by the legacy NCP code.
    pub fn from_code(code: &str, params: &ProjectionParams, reference_lat: f64) -> WcsResult<Self> {
        let projection = match code {
            "AZP" => Self::Zenithal(Zenithal::azp(params)?),
            "SZP" => Self::Zenithal(Zenithal::szp(params)?),
            "TAN" | "TPV" => Self::Zenithal(Zenithal::Tan),
            "STG" => Self::Zenithal(Zenithal::Stg),
            "SIN" => Self::Zenithal(Zenithal::sin(params)),
            "NCP" => Self::Zenithal(Zenithal::ncp(reference_lat)?),
            "ARC" => Self::Zenithal(Zenithal::Arc),
            "ZPN" => Self::Zenithal(Zenithal::zpn(params)?),
            "ZEA" => Self::Zenithal(Zenithal::Zea),
            "AIR" => Self::Zenithal(Zenithal::air(params)?),
            "CYP" => Self::Cylindrical(Cylindrical::cyp(params)?),
            "CEA" => Self::Cylindrical(Cylindrical::cea(params)?),
            "CAR" => Self::Cylindrical(Cylindrical::Car),
            "MER" => Self::Cylindrical(Cylindrical::Mer),
            "SFL" | "GLS" => Self::PseudoCylindrical(PseudoCylindrical::Sfl),
            "PAR" => Self::PseudoCylindrical(PseudoCylindrical::Par),
            "MOL" => Self::PseudoCylindrical(PseudoCylindrical::Mol),
            "AIT" => Self::PseudoCylindrical(PseudoCylindrical::Ait),
            "COP" => Self::Conic(Conic::cop(params)?),
            "COE" => Self::Conic(Conic::coe(params)?),
            "COD" => Self::Conic(Conic::cod(params)?),
            "COO" => Self::Conic(Conic::coo(params)?),
            "BON" => Self::Polyconic(Polyconic::bon(params)?),
            "PCO" => Self::Polyconic(Polyconic::Pco),
            other => return Err(WcsError::unsupported_projection(other)),
        };
        Ok(projection)
    }

    /// Codes this crate can construct, legacy aliases included.
    pub fn is_known_code(code: &str) -> bool {
        matches!(
            code,
            "AZP" | "SZP" | "TAN" | "TPV" | "STG" | "SIN" | "NCP" | "ARC" | "ZPN" | "ZEA" | "AIR"
                | "CYP" | "CEA" | "CAR" | "MER" | "SFL" | "GLS" | "PAR" | "MOL" | "AIT"
                | "COP" | "COE" | "COD" | "COO" | "BON" | "PCO"
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Zenithal(p) => p.code(),
            Self::Cylindrical(p) => p.code(),
            Self::PseudoCylindrical(p) => p.code(),
            Self::Conic(p) => p.code(),
            Self::Polyconic(p) => p.code(),
        }
    }

    /// Native coordinates (φ₀, θ₀) of the reference point.
    pub fn native_reference(&self) -> (f64, f64) {
        match self {
            Self::Zenithal(_) => (0.0, 90.0),
            Self::Conic(c) => (0.0, c.theta_a()),
            Self::Cylindrical(_) | Self::PseudoCylindrical(_) | Self::Polyconic(_) => (0.0, 0.0),
        }
    }

    pub fn project(&self, native: NativeCoord) -> WcsResult<IntermediateCoord> {
        match self {
            Self::Zenithal(p) => p.project(native),
            Self::Cylindrical(p) => p.project(native),
            Self::PseudoCylindrical(p) => p.project(native),
            Self::Conic(p) => p.project(native),
            Self::Polyconic(p) => p.project(native),
        }
    }

    pub fn deproject(&self, inter: IntermediateCoord) -> WcsResult<NativeCoord> {
        if !inter.is_finite() {
            return Err(WcsError::non_finite("intermediate coordinates"));
        }
        match self {
            Self::Zenithal(p) => p.deproject(inter),
            Self::Cylindrical(p) => p.deproject(inter),
            Self::PseudoCylindrical(p) => p.deproject(inter),
            Self::Conic(p) => p.deproject(inter),
            Self::Polyconic(p) => p.deproject(inter),
        }
    }
}
