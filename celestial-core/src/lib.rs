//! Angular primitives shared by the celestial crates.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`angle`] | [`Angle`] newtype stored in radians |
//! | [`constants`] | π, √2 and degree/radian/arcsecond factors |
//! | [`utils`] | Longitude normalisation in degrees |
//! | [`math`] | Thin wrappers over `libm` |
//! | [`test_helpers`] | ULP comparison used by `assert_ulp_lt!` |
//!
//! # Features
//!
//! - `serde`: serialises [`Angle`] as a bare radian value.

pub mod angle;
pub mod constants;
pub mod math;
pub mod test_helpers;
pub mod utils;

pub use angle::Angle;
