//! Coordinate value types for each stage of the pixel ↔ sky pipeline.
//!
//! Pixel coordinates follow the FITS convention: the centre of the first
//! pixel is (1, 1). Everything angular is held in degrees; the [`Angle`]
//! accessors are there for callers that want radians.

use celestial_core::Angle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelCoord {
    x: f64,
    y: f64,
}

impl PixelCoord {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Projection-plane coordinates in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntermediateCoord {
    x: f64,
    y: f64,
}

impl IntermediateCoord {
    #[inline]
    pub fn new(x_deg: f64, y_deg: f64) -> Self {
        Self { x: x_deg, y: y_deg }
    }

    #[inline]
    pub fn x_deg(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y_deg(&self) -> f64 {
        self.y
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Native spherical coordinates (φ, θ) of a projection, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeCoord {
    phi: f64,
    theta: f64,
}

impl NativeCoord {
    #[inline]
    pub fn new(phi_deg: f64, theta_deg: f64) -> Self {
        Self {
            phi: phi_deg,
            theta: theta_deg,
        }
    }

    #[inline]
    pub fn phi_deg(&self) -> f64 {
        self.phi
    }

    #[inline]
    pub fn theta_deg(&self) -> f64 {
        self.theta
    }

    #[inline]
    pub fn phi(&self) -> Angle {
        Angle::from_degrees(self.phi)
    }

    #[inline]
    pub fn theta(&self) -> Angle {
        Angle::from_degrees(self.theta)
    }
}

/// Celestial longitude/latitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CelestialCoord {
    lon: f64,
    lat: f64,
}

impl CelestialCoord {
    #[inline]
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon: lon_deg,
            lat: lat_deg,
        }
    }

    #[inline]
    pub fn lon_deg(&self) -> f64 {
        self.lon
    }

    #[inline]
    pub fn lat_deg(&self) -> f64 {
        self.lat
    }

    #[inline]
    pub fn lon(&self) -> Angle {
        Angle::from_degrees(self.lon)
    }

    #[inline]
    pub fn lat(&self) -> Angle {
        Angle::from_degrees(self.lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_coord_accessors() {
        let p = PixelCoord::new(100.5, 200.5);
        assert_eq!(p.x(), 100.5);
        assert_eq!(p.y(), 200.5);
        assert!(p.is_finite());
        assert!(!PixelCoord::new(f64::NAN, 1.0).is_finite());
    }

    #[test]
    fn test_intermediate_coord() {
        let c = IntermediateCoord::new(0.001, -0.002);
        assert_eq!(c.x_deg(), 0.001);
        assert_eq!(c.y_deg(), -0.002);
        assert!(!IntermediateCoord::new(f64::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn test_native_coord_angles() {
        let n = NativeCoord::new(45.0, 30.0);
        assert_eq!(n.phi_deg(), 45.0);
        celestial_core::assert_ulp_lt!(n.theta().radians(), 30.0_f64.to_radians(), 1);
    }

    #[test]
    fn test_celestial_coord_angles() {
        let c = CelestialCoord::new(180.0, -45.0);
        assert_eq!(c.lon_deg(), 180.0);
        assert_eq!(c.lat_deg(), -45.0);
        celestial_core::assert_ulp_lt!(c.lon().degrees(), 180.0, 1);
    }
}
