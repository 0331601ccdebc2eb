//! The validated two-axis coordinate system and its pixel ↔ sky pipeline.
//!
//! Forward: SIP (pixel space) → linear → TPV (plane) → deprojection →
//! spherical rotation. The inverse runs the same stages backwards.
//! A [`Wcs`] is immutable, so it is `Send + Sync` and one instance can serve
//! any number of concurrent transform calls.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::coordinate::{CelestialCoord, IntermediateCoord, PixelCoord};
use crate::description::{CelestialAxes, CoordinateSystemDescription};
use crate::distortion::{Distortion, DistortionModel};
use crate::error::{Direction, WcsError, WcsResult, WcsStatus};
use crate::header::{KeywordMap, KeywordValue, WcsKeyword};
use crate::linear::LinearTransform;
use crate::spherical::{Projection, SphericalRotation};

/// Batch calls are processed in chunks of this many coordinates.
pub const MAX_COORDS: usize = 5000;

/// One transform outcome. `coords` are NaN when `status` is not success.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformed {
    pub coords: [f64; 2],
    pub status: WcsStatus,
}

impl Transformed {
    fn from_result(result: WcsResult<[f64; 2]>, direction: Direction) -> Self {
        match result {
            Ok(coords) => Self {
                coords,
                status: WcsStatus::Success,
            },
            Err(e) => Self {
                coords: [f64::NAN; 2],
                status: WcsStatus::from_error(&e, direction),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[derive(Debug, Clone)]
enum CelestialState {
    Absent,
    Ready {
        projection: Projection,
        rotation: SphericalRotation,
        axes: CelestialAxes,
    },
    /// Celestial axes are present but the projection cannot be set up.
    Invalid(WcsError),
}

#[derive(Debug, Clone)]
pub struct Wcs {
    description: CoordinateSystemDescription,
    linear: LinearTransform,
    celestial: CelestialState,
}

impl Wcs {
    /// Callers guarantee a two-axis description; see [`crate::validate`].
    pub(crate) fn from_description(description: CoordinateSystemDescription) -> Self {
        let crpix = [description.crpix()[0], description.crpix()[1]];
        let cd = description.cd_matrix();
        let linear = LinearTransform::from_cd(crpix, [[cd[0], cd[1]], [cd[2], cd[3]]]);
        if linear.is_singular() {
            debug!(determinant = linear.determinant(), "linear transform is singular");
        }
        let celestial = match description.celestial_axes() {
            None => CelestialState::Absent,
            Some(axes) => match Self::celestial_setup(&description, axes) {
                Ok((projection, rotation)) => CelestialState::Ready {
                    projection,
                    rotation,
                    axes,
                },
                Err(e) => {
                    debug!(error = %e, "celestial axes present but unusable");
                    CelestialState::Invalid(e)
                }
            },
        };
        Self {
            description,
            linear,
            celestial,
        }
    }

    fn celestial_setup(
        desc: &CoordinateSystemDescription,
        axes: CelestialAxes,
    ) -> WcsResult<(Projection, SphericalRotation)> {
        let code = desc
            .projection_code()
            .ok_or_else(|| {
                WcsError::missing_keyword(format!("projection code in CTYPE{}", axes.lng + 1))
            })?;
        let (alpha_0, delta_0) = (desc.crval()[axes.lng], desc.crval()[axes.lat]);
        let projection = Projection::from_code(code, &desc.projection_params(), delta_0)?;
        let (phi_0, theta_0) = projection.native_reference();
        let rotation = SphericalRotation::from_reference(
            alpha_0,
            delta_0,
            phi_0,
            theta_0,
            desc.lonpole(),
            desc.latpole(),
        )?;
        Ok((projection, rotation))
    }

    pub fn description(&self) -> &CoordinateSystemDescription {
        &self.description
    }

    pub fn linear(&self) -> &LinearTransform {
        &self.linear
    }

    pub fn has_celestial(&self) -> bool {
        self.description.has_celestial()
    }

    pub fn projection(&self) -> Option<&Projection> {
        match &self.celestial {
            CelestialState::Ready { projection, .. } => Some(projection),
            _ => None,
        }
    }

    pub fn rotation(&self) -> Option<&SphericalRotation> {
        match &self.celestial {
            CelestialState::Ready { rotation, .. } => Some(rotation),
            _ => None,
        }
    }

    fn ready(&self) -> WcsResult<(&Projection, &SphericalRotation, CelestialAxes)> {
        match &self.celestial {
            CelestialState::Ready {
                projection,
                rotation,
                axes,
            } => Ok((projection, rotation, *axes)),
            CelestialState::Absent => Err(WcsError::MissingCelestialAxes),
            CelestialState::Invalid(e) => Err(e.clone()),
        }
    }

    fn pixel_distortion(&self) -> Option<&DistortionModel> {
        self.description.distortion().filter(|d| d.operates_on_pixels())
    }

    fn plane_distortion(&self) -> Option<&DistortionModel> {
        self.description.distortion().filter(|d| !d.operates_on_pixels())
    }

    /// Pixel → intermediate coordinates in axis order.
    fn pixel_to_plane(&self, x: f64, y: f64) -> WcsResult<[f64; 2]> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(WcsError::non_finite(format!("pixel ({x}, {y})")));
        }
        let (x, y) = match self.pixel_distortion() {
            Some(d) => d.apply(x, y),
            None => (x, y),
        };
        let q = self.linear.pixel_to_intermediate(PixelCoord::new(x, y));
        Ok([q.x_deg(), q.y_deg()])
    }

    fn plane_to_pixel(&self, q: [f64; 2]) -> WcsResult<[f64; 2]> {
        let p = self.linear.intermediate_to_pixel(IntermediateCoord::new(q[0], q[1]))?;
        let (x, y) = match self.pixel_distortion() {
            Some(d) => d.apply_inverse(p.x(), p.y())?,
            None => (p.x(), p.y()),
        };
        if !(x.is_finite() && y.is_finite()) {
            return Err(WcsError::non_finite(format!("pixel ({x}, {y})")));
        }
        Ok([x, y])
    }

    /// Pixel (1-based, FITS convention) to world coordinates in axis order.
    /// Longitudes come back in [0, 360).
    pub fn pixel_to_sky(&self, x: f64, y: f64) -> WcsResult<[f64; 2]> {
        let (projection, rotation, axes) = self.ready()?;
        let q = self.pixel_to_plane(x, y)?;
        let (xi, eta) = match self.plane_distortion() {
            Some(d) => d.apply(q[axes.lng], q[axes.lat]),
            None => (q[axes.lng], q[axes.lat]),
        };
        let native = projection.deproject(IntermediateCoord::new(xi, eta))?;
        let sky = rotation.native_to_celestial(native);
        if !(sky.lon_deg().is_finite() && sky.lat_deg().is_finite()) {
            return Err(WcsError::non_finite(format!(
                "pixel ({x}, {y}) produced sky ({}, {})",
                sky.lon_deg(),
                sky.lat_deg()
            )));
        }

        let mut world = [0.0; 2];
        world[axes.lng] = sky.lon_deg();
        world[axes.lat] = sky.lat_deg();
        Ok(world)
    }

    /// World coordinates in axis order to pixel.
    pub fn sky_to_pixel(&self, c0: f64, c1: f64) -> WcsResult<[f64; 2]> {
        let (projection, rotation, axes) = self.ready()?;
        if self.linear.is_singular() {
            return Err(WcsError::non_invertible_matrix(self.linear.determinant()));
        }
        let world = [c0, c1];
        let (lon, lat) = (world[axes.lng], world[axes.lat]);
        if !(lon.is_finite() && lat.is_finite()) {
            return Err(WcsError::non_finite(format!("sky ({c0}, {c1})")));
        }
        if lat.abs() > 90.0 {
            return Err(WcsError::out_of_bounds(format!("latitude {lat} outside [-90, 90]")));
        }

        let native = rotation.celestial_to_native(CelestialCoord::new(lon, lat));
        let plane = projection.project(native)?;
        let (x, y) = match self.plane_distortion() {
            Some(d) => d.apply_inverse(plane.x_deg(), plane.y_deg())?,
            None => (plane.x_deg(), plane.y_deg()),
        };

        let mut q = [0.0; 2];
        q[axes.lng] = x;
        q[axes.lat] = y;
        self.plane_to_pixel(q)
    }

    pub fn pix2sky(&self, x: f64, y: f64) -> Transformed {
        Transformed::from_result(self.pixel_to_sky(x, y), Direction::PixelToSky)
    }

    pub fn sky2pix(&self, c0: f64, c1: f64) -> Transformed {
        Transformed::from_result(self.sky_to_pixel(c0, c1), Direction::SkyToPixel)
    }

    /// Like [`Wcs::pixel_to_sky`], but linear axes are also mapped, as
    /// `CRVAL + intermediate`. Valid on systems without celestial axes.
    pub fn pixel_to_world(&self, x: f64, y: f64) -> WcsResult<[f64; 2]> {
        if let CelestialState::Absent = self.celestial {
            let q = self.pixel_to_plane(x, y)?;
            let crval = self.description.crval();
            let world = [crval[0] + q[0], crval[1] + q[1]];
            if !(world[0].is_finite() && world[1].is_finite()) {
                return Err(WcsError::non_finite(format!(
                    "pixel ({x}, {y}) produced world {world:?}"
                )));
            }
            return Ok(world);
        }
        self.pixel_to_sky(x, y)
    }

    pub fn world_to_pixel(&self, w0: f64, w1: f64) -> WcsResult<[f64; 2]> {
        if let CelestialState::Absent = self.celestial {
            if !(w0.is_finite() && w1.is_finite()) {
                return Err(WcsError::non_finite(format!("world ({w0}, {w1})")));
            }
            let crval = self.description.crval();
            return self.plane_to_pixel([w0 - crval[0], w1 - crval[1]]);
        }
        self.sky_to_pixel(w0, w1)
    }

    pub fn pixel_to_sky_batch(&self, coords: &[[f64; 2]]) -> Vec<Transformed> {
        batch(coords, |c| self.pix2sky(c[0], c[1]))
    }

    pub fn sky_to_pixel_batch(&self, coords: &[[f64; 2]]) -> Vec<Transformed> {
        batch(coords, |c| self.sky2pix(c[0], c[1]))
    }

    /// Re-emits the description as header keywords carrying its alternate
    /// suffix. Parsing these keywords gives back the same transform.
    pub fn to_keywords(&self) -> KeywordMap {
        let desc = &self.description;
        let alt = desc.alt();
        let mut map = KeywordMap::new();
        let mut put = |key: WcsKeyword, value: KeywordValue| {
            map.insert(key.name(), value);
        };

        put(WcsKeyword::WcsAxes(alt), KeywordValue::Integer(desc.axis_count() as i64));
        for i in 0..desc.axis_count() {
            let n = (i + 1) as u16;
            if !desc.ctype()[i].is_empty() {
                put(WcsKeyword::Ctype(n, alt), KeywordValue::String(desc.ctype()[i].clone()));
            }
            if !desc.cunit()[i].is_empty() {
                put(WcsKeyword::Cunit(n, alt), KeywordValue::String(desc.cunit()[i].clone()));
            }
            put(WcsKeyword::Crpix(n, alt), KeywordValue::Real(desc.crpix()[i]));
            put(WcsKeyword::Crval(n, alt), KeywordValue::Real(desc.crval()[i]));
            put(WcsKeyword::Cdelt(n, alt), KeywordValue::Real(desc.cdelt()[i]));
        }
        for i in 0..desc.axis_count() {
            for j in 0..desc.axis_count() {
                put(
                    WcsKeyword::Pc((i + 1) as u16, (j + 1) as u16, alt),
                    KeywordValue::Real(desc.pc_element(i, j)),
                );
            }
        }
        for pv in desc.pv() {
            put(WcsKeyword::Pv((pv.axis + 1) as u16, pv.m, alt), KeywordValue::Real(pv.value));
        }
        if let Some(v) = desc.lonpole() {
            put(WcsKeyword::Lonpole(alt), KeywordValue::Real(v));
        }
        if let Some(v) = desc.latpole() {
            put(WcsKeyword::Latpole(alt), KeywordValue::Real(v));
        }
        if let Some(v) = desc.radesys() {
            put(WcsKeyword::Radesys(alt), KeywordValue::String(v.to_string()));
        }
        if let Some(v) = desc.equinox() {
            put(WcsKeyword::Equinox(alt), KeywordValue::Real(v));
        }
        if let Some(v) = desc.wcsname() {
            put(WcsKeyword::Wcsname(alt), KeywordValue::String(v.to_string()));
        }

        // SIP keywords have no alternate form.
        if let (None, Some(DistortionModel::Sip(sip))) = (alt, desc.distortion()) {
            let (a, b) = sip.orders();
            map.set_int("A_ORDER", i64::from(a)).set_int("B_ORDER", i64::from(b));
            if let Some((ap, bp)) = sip.inverse_orders() {
                map.set_int("AP_ORDER", i64::from(ap)).set_int("BP_ORDER", i64::from(bp));
            }
            for (series, p, q, value) in sip.coefficients() {
                map.set_float(format!("{series}_{p}_{q}"), value);
            }
        }
        map
    }
}

fn batch<F>(coords: &[[f64; 2]], f: F) -> Vec<Transformed>
where
    F: Fn(&[f64; 2]) -> Transformed + Send + Sync,
{
    #[cfg(feature = "parallel")]
    {
        coords
            .par_chunks(MAX_COORDS)
            .flat_map_iter(|chunk| chunk.iter().map(&f))
            .collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        coords
            .chunks(MAX_COORDS)
            .flat_map(|chunk| chunk.iter().map(&f))
            .collect()
    }
}
