use crate::error::{WcsError, WcsResult};

use super::polynomial::newton_raphson_2d;
use super::Distortion;

pub const TPV_TERMS: usize = 40;

/// Exponents `(x, y, r)` of each TPV term. Odd degrees close with a pure
/// radial term; there is no r², r⁴ or r⁶.
const TERMS: [(i32, i32, i32); TPV_TERMS] = {
    let mut table = [(0, 0, 0); TPV_TERMS];
    let mut idx = 0;
    let mut degree = 0;
    while degree <= 7 {
        let mut k = 0;
        while k <= degree {
            table[idx] = (degree - k, k, 0);
            idx += 1;
            k += 1;
        }
        if degree % 2 == 1 {
            table[idx] = (0, 0, degree);
            idx += 1;
        }
        degree += 1;
    }
    table
};

/// TPV polynomial distortion of the tangent-plane coordinates, in degrees.
///
/// ξ is a series in (x, y) with coefficients `PV1_m`; η uses `PV2_m` with
/// the roles of x and y swapped.
#[derive(Debug, Clone, PartialEq)]
pub struct TpvDistortion {
    xi: [f64; TPV_TERMS],
    eta: [f64; TPV_TERMS],
}

impl TpvDistortion {
    pub fn identity() -> Self {
        let mut tpv = Self {
            xi: [0.0; TPV_TERMS],
            eta: [0.0; TPV_TERMS],
        };
        tpv.xi[1] = 1.0;
        tpv.eta[1] = 1.0;
        tpv
    }

    pub fn set_xi(&mut self, index: usize, value: f64) {
        if let Some(slot) = self.xi.get_mut(index) {
            *slot = value;
        }
    }

    pub fn set_eta(&mut self, index: usize, value: f64) {
        if let Some(slot) = self.eta.get_mut(index) {
            *slot = value;
        }
    }

    pub fn xi_coefficients(&self) -> &[f64; TPV_TERMS] {
        &self.xi
    }

    pub fn eta_coefficients(&self) -> &[f64; TPV_TERMS] {
        &self.eta
    }

    fn series(coeffs: &[f64; TPV_TERMS], u: f64, v: f64, r: f64) -> f64 {
        coeffs
            .iter()
            .zip(TERMS.iter())
            .filter(|(c, _)| **c != 0.0)
            .map(|(c, &(pu, pv, pr))| c * u.powi(pu) * v.powi(pv) * r.powi(pr))
            .sum()
    }
}

impl Default for TpvDistortion {
    fn default() -> Self {
        Self::identity()
    }
}

impl Distortion for TpvDistortion {
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let r = libm::hypot(x, y);
        (
            Self::series(&self.xi, x, y, r),
            Self::series(&self.eta, y, x, r),
        )
    }

    fn apply_inverse(&self, xi: f64, eta: f64) -> WcsResult<(f64, f64)> {
        newton_raphson_2d((xi, eta), (xi, eta), |x, y| self.apply(x, y), 50, 1e-14)
            .map_err(|msg| WcsError::convergence_failure(format!("TPV inverse: {msg}")))
    }

    fn operates_on_pixels(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_table_layout() {
        assert_eq!(TERMS[0], (0, 0, 0));
        assert_eq!(TERMS[1], (1, 0, 0));
        assert_eq!(TERMS[2], (0, 1, 0));
        assert_eq!(TERMS[3], (0, 0, 1));
        assert_eq!(TERMS[11], (0, 0, 3));
        assert_eq!(TERMS[12], (4, 0, 0));
        assert_eq!(TERMS[23], (0, 0, 5));
        assert_eq!(TERMS[39], (0, 0, 7));
    }

    #[test]
    fn test_identity() {
        let tpv = TpvDistortion::identity();
        assert_eq!(tpv.apply(0.15, -0.25), (0.15, -0.25));
    }

    #[test]
    fn test_eta_swaps_arguments() {
        let mut tpv = TpvDistortion::identity();
        tpv.set_xi(4, 0.01);
        tpv.set_eta(4, 0.02);
        let (xi, eta) = tpv.apply(0.1, 0.3);
        approx::assert_relative_eq!(xi, 0.1 + 0.01 * 0.1 * 0.1, epsilon = 1e-15);
        approx::assert_relative_eq!(eta, 0.3 + 0.02 * 0.3 * 0.3, epsilon = 1e-15);
    }

    #[test]
    fn test_inverse_round_trip() {
        let mut tpv = TpvDistortion::identity();
        tpv.set_xi(0, 1e-4);
        tpv.set_xi(5, 0.003);
        tpv.set_xi(11, 0.01);
        tpv.set_eta(6, -0.002);
        tpv.set_eta(3, 1e-4);

        let (xi, eta) = tpv.apply(0.2, -0.12);
        let (x, y) = tpv.apply_inverse(xi, eta).unwrap();
        approx::assert_abs_diff_eq!(x, 0.2, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(y, -0.12, epsilon = 1e-12);
    }
}
