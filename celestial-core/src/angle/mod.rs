//! Typed angles.
//!
//! [`Angle`] stores radians and converts to degrees on demand.

mod core;
#[cfg(feature = "serde")]
mod serde_;

pub use self::core::Angle;
