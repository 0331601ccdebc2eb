//! FITS World Coordinate System engine.
//!
//! [`parser::parse`] reads header records into [`CoordinateSystemDescription`]s,
//! [`validate::select_first`] turns the first two-axis one into a [`Wcs`], and
//! [`Wcs::pixel_to_sky`] / [`Wcs::sky_to_pixel`] run the transform. Hosts that
//! need integer handles go through [`host::WcsHost`].

pub mod builder;
mod common;
pub mod config;
pub mod coordinate;
pub mod description;
pub mod distortion;
pub mod error;
pub mod header;
pub mod host;
pub mod linear;
pub mod parser;
pub mod spherical;
pub mod validate;
pub mod wcs;

pub use builder::WcsBuilder;
pub use config::{AltSelection, CrpixDefault, ParseOptions};
pub use coordinate::{CelestialCoord, IntermediateCoord, NativeCoord, PixelCoord};
pub use description::{AxisType, CoordType, CoordinateSystemDescription, MatrixSource};
pub use error::{Direction, ParseError, Rejection, WcsError, WcsResult, WcsStatus};
pub use header::{KeywordMap, KeywordProvider};
pub use host::{WcsHandle, WcsHost};
pub use linear::LinearTransform;
pub use parser::{parse, ParsedHeader, RejectedRecord};
pub use spherical::{Projection, SphericalRotation};
pub use validate::{select_first, validate, validate_all};
pub use wcs::{Transformed, Wcs, MAX_COORDS};
