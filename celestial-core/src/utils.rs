//! Degree-based normalisation.
//!
//! | Function | Output range |
//! |----------|--------------|
//! | [`normalize_longitude`] | (-180°, 180°] |
//! | [`normalize_longitude_positive`] | [0°, 360°) |

/// Normalizes longitude to the range (-180°, 180°].
#[inline]
pub fn normalize_longitude(lon: f64) -> f64 {
    let mut normalized = lon % 360.0;
    if normalized > 180.0 {
        normalized -= 360.0;
    } else if normalized <= -180.0 {
        normalized += 360.0;
    }
    normalized
}

/// Normalizes longitude to the range [0°, 360°).
///
/// Values that round to exactly 360 after wrapping (e.g. `-1e-17`) come
/// back as 0.
#[inline]
pub fn normalize_longitude_positive(lon: f64) -> f64 {
    let mut normalized = lon % 360.0;
    if normalized < 0.0 {
        normalized += 360.0;
    }
    if normalized >= 360.0 {
        normalized = 0.0;
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(normalize_longitude(190.0), -170.0);
        assert_eq!(normalize_longitude(-180.0), 180.0);
        assert_eq!(normalize_longitude(180.0), 180.0);
        assert_eq!(normalize_longitude(540.0), 180.0);
    }

    #[test]
    fn test_normalize_longitude_positive() {
        assert_eq!(normalize_longitude_positive(0.0), 0.0);
        assert_eq!(normalize_longitude_positive(360.0), 0.0);
        assert_eq!(normalize_longitude_positive(-90.0), 270.0);
        assert_eq!(normalize_longitude_positive(725.0), 5.0);
        let tiny = normalize_longitude_positive(-1e-17);
        assert!((0.0..360.0).contains(&tiny));
    }
}
