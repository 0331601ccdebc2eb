use crate::coordinate::{IntermediateCoord, PixelCoord};
use crate::error::{WcsError, WcsResult};

/// Determinants this small relative to the matrix entries are treated as zero.
const SINGULAR_RELATIVE_TOL: f64 = 1e-12;

/// Pixel to intermediate-coordinate map: `q = M (p - r)`, with `M = diag(CDELT) · PC`
/// or `M = CD`.
///
/// A singular matrix is accepted; only [`LinearTransform::intermediate_to_pixel`]
/// fails on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTransform {
    crpix: [f64; 2],
    matrix: [[f64; 2]; 2],
    inverse: Option<[[f64; 2]; 2]>,
    determinant: f64,
}

impl LinearTransform {
    pub fn from_cd(crpix: [f64; 2], cd: [[f64; 2]; 2]) -> Self {
        let determinant = cd[0][0] * cd[1][1] - cd[0][1] * cd[1][0];
        let scale = cd.iter().flatten().fold(0.0_f64, |m, v| m.max(v.abs()));
        let singular = !determinant.is_finite()
            || determinant.abs() <= SINGULAR_RELATIVE_TOL * scale * scale;
        let inverse = (!singular).then(|| compute_inverse(cd, determinant));
        Self {
            crpix,
            matrix: cd,
            inverse,
            determinant,
        }
    }

    pub fn from_pc_cdelt(crpix: [f64; 2], pc: [[f64; 2]; 2], cdelt: [f64; 2]) -> Self {
        let cd = [
            [cdelt[0] * pc[0][0], cdelt[0] * pc[0][1]],
            [cdelt[1] * pc[1][0], cdelt[1] * pc[1][1]],
        ];
        Self::from_cd(crpix, cd)
    }

    pub fn pixel_to_intermediate(&self, pixel: PixelCoord) -> IntermediateCoord {
        let d0 = pixel.x() - self.crpix[0];
        let d1 = pixel.y() - self.crpix[1];
        let m = &self.matrix;
        IntermediateCoord::new(m[0][0] * d0 + m[0][1] * d1, m[1][0] * d0 + m[1][1] * d1)
    }

    pub fn intermediate_to_pixel(&self, inter: IntermediateCoord) -> WcsResult<PixelCoord> {
        let inv = self.inverse.ok_or_else(|| WcsError::non_invertible_matrix(self.determinant))?;
        let (x, y) = (inter.x_deg(), inter.y_deg());
        Ok(PixelCoord::new(
            inv[0][0] * x + inv[0][1] * y + self.crpix[0],
            inv[1][0] * x + inv[1][1] * y + self.crpix[1],
        ))
    }

    #[inline]
    pub fn is_singular(&self) -> bool {
        self.inverse.is_none()
    }

    #[inline]
    pub fn crpix(&self) -> [f64; 2] {
        self.crpix
    }

    #[inline]
    pub fn matrix(&self) -> [[f64; 2]; 2] {
        self.matrix
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        self.determinant
    }

    /// Geometric-mean pixel scale in intermediate units per pixel.
    #[inline]
    pub fn pixel_scale(&self) -> f64 {
        libm::sqrt(self.determinant.abs())
    }
}

fn compute_inverse(m: [[f64; 2]; 2], det: f64) -> [[f64; 2]; 2] {
    let inv_det = 1.0 / det;
    [
        [m[1][1] * inv_det, -m[0][1] * inv_det],
        [-m[1][0] * inv_det, m[0][0] * inv_det],
    ]
}
