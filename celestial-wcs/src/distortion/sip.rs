use std::collections::BTreeMap;

use crate::error::{WcsError, WcsResult};

use super::polynomial::{newton_raphson_2d, power_term};
use super::Distortion;

type Coefficients = BTreeMap<(u16, u16), f64>;

/// Simple Imaging Polynomial distortion, applied to pixel offsets from the
/// reference pixel before the linear transform.
#[derive(Debug, Clone, PartialEq)]
pub struct SipDistortion {
    crpix: [f64; 2],
    a_order: u16,
    b_order: u16,
    a: Coefficients,
    b: Coefficients,
    inverse: Option<SipInverse>,
}

#[derive(Debug, Clone, PartialEq)]
struct SipInverse {
    ap_order: u16,
    bp_order: u16,
    ap: Coefficients,
    bp: Coefficients,
}

impl SipDistortion {
    pub fn new(crpix: [f64; 2], a_order: u16, b_order: u16) -> Self {
        Self {
            crpix,
            a_order,
            b_order,
            a: Coefficients::new(),
            b: Coefficients::new(),
            inverse: None,
        }
    }

    /// Terms above the declared order are ignored, as are zeros.
    pub fn set_a(&mut self, p: u16, q: u16, value: f64) {
        if p + q <= self.a_order && value != 0.0 {
            self.a.insert((p, q), value);
        }
    }

    pub fn set_b(&mut self, p: u16, q: u16, value: f64) {
        if p + q <= self.b_order && value != 0.0 {
            self.b.insert((p, q), value);
        }
    }

    pub fn set_inverse_order(&mut self, ap_order: u16, bp_order: u16) {
        self.inverse = Some(SipInverse {
            ap_order,
            bp_order,
            ap: Coefficients::new(),
            bp: Coefficients::new(),
        });
    }

    pub fn set_ap(&mut self, p: u16, q: u16, value: f64) {
        if let Some(inv) = self.inverse.as_mut() {
            if p + q <= inv.ap_order && value != 0.0 {
                inv.ap.insert((p, q), value);
            }
        }
    }

    pub fn set_bp(&mut self, p: u16, q: u16, value: f64) {
        if let Some(inv) = self.inverse.as_mut() {
            if p + q <= inv.bp_order && value != 0.0 {
                inv.bp.insert((p, q), value);
            }
        }
    }

    pub fn orders(&self) -> (u16, u16) {
        (self.a_order, self.b_order)
    }

    /// Every non-zero coefficient as `(series, p, q, value)`, series being
    /// `"A"`, `"B"`, `"AP"` or `"BP"`.
    pub fn coefficients(&self) -> Vec<(&'static str, u16, u16, f64)> {
        let mut out: Vec<_> = self.a.iter().map(|(&(p, q), &v)| ("A", p, q, v)).collect();
        out.extend(self.b.iter().map(|(&(p, q), &v)| ("B", p, q, v)));
        if let Some(inv) = &self.inverse {
            out.extend(inv.ap.iter().map(|(&(p, q), &v)| ("AP", p, q, v)));
            out.extend(inv.bp.iter().map(|(&(p, q), &v)| ("BP", p, q, v)));
        }
        out
    }

    pub fn inverse_orders(&self) -> Option<(u16, u16)> {
        self.inverse.as_ref().map(|inv| (inv.ap_order, inv.bp_order))
    }

    fn eval(coeffs: &Coefficients, u: f64, v: f64) -> f64 {
        coeffs
            .iter()
            .map(|(&(p, q), &c)| c * power_term(u, v, p, q))
            .sum()
    }

    fn initial_guess(&self, x: f64, y: f64) -> (f64, f64) {
        match &self.inverse {
            Some(inv) => {
                let u = x - self.crpix[0];
                let v = y - self.crpix[1];
                (x + Self::eval(&inv.ap, u, v), y + Self::eval(&inv.bp, u, v))
            }
            None => (x, y),
        }
    }
}

impl Distortion for SipDistortion {
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let u = x - self.crpix[0];
        let v = y - self.crpix[1];
        (x + Self::eval(&self.a, u, v), y + Self::eval(&self.b, u, v))
    }

    /// AP/BP give the starting point; Newton polishes it so that the
    /// forward polynomial is inverted to round-off.
    fn apply_inverse(&self, x: f64, y: f64) -> WcsResult<(f64, f64)> {
        let start = self.initial_guess(x, y);
        newton_raphson_2d((x, y), start, |px, py| self.apply(px, py), 50, 1e-14)
            .map_err(|msg| WcsError::convergence_failure(format!("SIP inverse: {msg}")))
    }

    fn operates_on_pixels(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_when_empty() {
        let sip = SipDistortion::new([512.0, 512.0], 2, 2);
        assert_eq!(sip.apply(100.0, 200.0), (100.0, 200.0));
    }

    #[test]
    fn test_quadratic_term() {
        let mut sip = SipDistortion::new([512.0, 512.0], 2, 2);
        sip.set_a(2, 0, 1e-6);
        let (x, y) = sip.apply(612.0, 612.0);
        assert_eq!(x, 612.0 + 1e-6 * 100.0 * 100.0);
        assert_eq!(y, 612.0);
    }

    #[test]
    fn test_terms_above_order_ignored() {
        let mut sip = SipDistortion::new([0.0, 0.0], 2, 2);
        sip.set_a(3, 0, 1.0);
        sip.set_b(0, 0, 0.0);
        assert!(sip.coefficients().is_empty());
    }

    #[test]
    fn test_inverse_without_ap_bp() {
        let mut sip = SipDistortion::new([512.0, 512.0], 3, 3);
        sip.set_a(2, 0, 2e-6);
        sip.set_a(1, 1, -1e-6);
        sip.set_b(0, 2, 3e-6);
        sip.set_b(2, 1, 1e-9);

        let (dx, dy) = sip.apply(900.0, 150.0);
        let (x, y) = sip.apply_inverse(dx, dy).unwrap();
        approx::assert_abs_diff_eq!(x, 900.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(y, 150.0, epsilon = 1e-9);
    }

    #[test]
    fn test_inverse_with_ap_bp_seed() {
        let mut sip = SipDistortion::new([100.0, 100.0], 2, 2);
        sip.set_a(2, 0, 1e-5);
        sip.set_inverse_order(2, 2);
        sip.set_ap(2, 0, -1e-5);

        let (dx, dy) = sip.apply(150.0, 80.0);
        let (x, y) = sip.apply_inverse(dx, dy).unwrap();
        approx::assert_abs_diff_eq!(x, 150.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(y, 80.0, epsilon = 1e-9);
        assert_eq!(sip.inverse_orders(), Some((2, 2)));
    }
}
