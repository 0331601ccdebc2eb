use crate::constants::{ARCSEC_TO_RAD, HALF_PI, PI};
use ::core::ops::{Add, Neg, Sub};

/// An angular measurement stored as radians.
///
/// `PartialEq`/`PartialOrd` compare the radian values; `Eq` is not derived
/// because the payload may be NaN.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
pub struct Angle {
    rad: f64,
}

impl Angle {
    pub const ZERO: Self = Self { rad: 0.0 };
    pub const PI: Self = Self { rad: PI };
    pub const HALF_PI: Self = Self { rad: HALF_PI };

    #[inline]
    pub const fn from_radians(rad: f64) -> Self {
        Self { rad }
    }

    #[inline]
    pub fn from_degrees(deg: f64) -> Self {
        Self {
            rad: deg.to_radians(),
        }
    }

    #[inline]
    pub fn from_arcseconds(arcsec: f64) -> Self {
        Self {
            rad: arcsec * ARCSEC_TO_RAD,
        }
    }

    #[inline]
    pub const fn radians(self) -> f64 {
        self.rad
    }

    #[inline]
    pub fn degrees(self) -> f64 {
        self.rad.to_degrees()
    }

    #[inline]
    pub fn arcseconds(self) -> f64 {
        self.rad / ARCSEC_TO_RAD
    }

    #[inline]
    pub fn sin(self) -> f64 {
        libm::sin(self.rad)
    }

    #[inline]
    pub fn cos(self) -> f64 {
        libm::cos(self.rad)
    }

    #[inline]
    pub fn sin_cos(self) -> (f64, f64) {
        libm::sincos(self.rad)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.rad.is_finite()
    }
}

impl Add for Angle {
    type Output = Angle;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Angle::from_radians(self.rad + rhs.rad)
    }
}

impl Sub for Angle {
    type Output = Angle;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Angle::from_radians(self.rad - rhs.rad)
    }
}

impl Neg for Angle {
    type Output = Angle;
    #[inline]
    fn neg(self) -> Self {
        Angle::from_radians(-self.rad)
    }
}
