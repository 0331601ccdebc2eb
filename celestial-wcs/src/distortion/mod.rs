//! Non-linear distortion corrections.
//!
//! SIP works on pixel offsets ahead of the linear transform; TPV works on
//! intermediate (tangent-plane) coordinates after it.

pub mod polynomial;
pub mod sip;
pub mod tpv;

pub use sip::SipDistortion;
pub use tpv::TpvDistortion;

use crate::error::WcsResult;

pub trait Distortion {
    fn apply(&self, x: f64, y: f64) -> (f64, f64);
    fn apply_inverse(&self, x: f64, y: f64) -> WcsResult<(f64, f64)>;
    fn operates_on_pixels(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum DistortionModel {
    Sip(SipDistortion),
    Tpv(Box<TpvDistortion>),
}

impl Distortion for DistortionModel {
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Self::Sip(d) => d.apply(x, y),
            Self::Tpv(d) => d.apply(x, y),
        }
    }

    fn apply_inverse(&self, x: f64, y: f64) -> WcsResult<(f64, f64)> {
        match self {
            Self::Sip(d) => d.apply_inverse(x, y),
            Self::Tpv(d) => d.apply_inverse(x, y),
        }
    }

    fn operates_on_pixels(&self) -> bool {
        match self {
            Self::Sip(d) => d.operates_on_pixels(),
            Self::Tpv(d) => d.operates_on_pixels(),
        }
    }
}
