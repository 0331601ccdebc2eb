#[inline]
pub fn fmod(x: f64, y: f64) -> f64 {
    libm::fmod(x, y)
}

/// Sine and cosine of an angle in degrees.
///
/// Exact multiples of 90° return exact zeros and ones so that axis-aligned
/// rotations do not pick up `6e-17` residue.
#[inline]
pub fn sincosd(deg: f64) -> (f64, f64) {
    let r = fmod(deg, 360.0);
    if fmod(r, 90.0) == 0.0 {
        let quadrant = (r / 90.0).round() as i64;
        return match quadrant.rem_euclid(4) {
            0 => (0.0, 1.0),
            1 => (1.0, 0.0),
            2 => (0.0, -1.0),
            _ => (-1.0, 0.0),
        };
    }
    libm::sincos(deg * crate::constants::DEG_TO_RAD)
}

/// `atan2` returning degrees.
#[inline]
pub fn atan2d(y: f64, x: f64) -> f64 {
    libm::atan2(y, x) * crate::constants::RAD_TO_DEG
}

/// `asin` in degrees with the argument clamped to [-1, 1].
#[inline]
pub fn asind_clamped(x: f64) -> f64 {
    libm::asin(x.clamp(-1.0, 1.0)) * crate::constants::RAD_TO_DEG
}
