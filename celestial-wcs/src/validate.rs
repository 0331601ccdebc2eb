//! Acceptance of parsed descriptions.
//!
//! Only two-axis systems are transformed. When a header carries several
//! alternates, [`select_first`] applies a "first match wins" policy: the
//! earliest alternate in header order with exactly two axes is used and the
//! rest are ignored. [`validate_all`] exposes every acceptable alternate for
//! callers that want to choose themselves.

use tracing::debug;

use crate::description::CoordinateSystemDescription;
use crate::error::{ParseError, Rejection};
use crate::parser::ParsedHeader;
use crate::wcs::Wcs;

pub fn validate(description: &CoordinateSystemDescription) -> Result<Wcs, Rejection> {
    match description.axis_count() {
        2 => Ok(Wcs::from_description(description.clone())),
        n => Err(Rejection::UnsupportedAxisCount(n)),
    }
}

pub fn select_first(parsed: Result<ParsedHeader, ParseError>) -> Result<Wcs, Rejection> {
    let parsed = parsed?;
    for desc in parsed.systems() {
        match validate(desc) {
            Ok(wcs) => {
                debug!(alt = ?desc.alt(), "selected coordinate system");
                return Ok(wcs);
            }
            Err(reason) => debug!(alt = ?desc.alt(), %reason, "skipping coordinate system"),
        }
    }
    Err(Rejection::NoUsableSystem)
}

pub fn validate_all(parsed: &ParsedHeader) -> Vec<Wcs> {
    parsed.systems().iter().filter_map(|d| validate(d).ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WcsBuilder;
    use crate::config::ParseOptions;
    use crate::parser::parse;

    fn cards(lines: &[&str]) -> Vec<u8> {
        lines.iter().flat_map(|c| format!("{c:<80}").into_bytes()).collect()
    }

    #[test]
    fn test_axis_count_must_be_two() {
        let one = WcsBuilder::new().ctype(["RA---TAN"]).build().unwrap();
        assert_eq!(validate(&one).unwrap_err(), Rejection::UnsupportedAxisCount(1));

        let three = WcsBuilder::new().ctype(["RA---TAN", "DEC--TAN", "FREQ"]).build().unwrap();
        assert_eq!(validate(&three).unwrap_err(), Rejection::UnsupportedAxisCount(3));
    }

    #[test]
    fn test_non_celestial_is_accepted() {
        let desc = WcsBuilder::new().ctype(["X", "Y"]).build().unwrap();
        let wcs = validate(&desc).unwrap();
        assert!(!wcs.has_celestial());
    }

    #[test]
    fn test_first_two_axis_alternate_wins() {
        let buf = cards(&[
            "WCSAXES =                    3",
            "CTYPE1  = 'RA---TAN'",
            "CTYPE2  = 'DEC--TAN'",
            "CTYPE3  = 'FREQ'",
            "CTYPE1A = 'GLON-CAR'",
            "CTYPE2A = 'GLAT-CAR'",
            "WCSAXESA=                    2",
            "CTYPE1B = 'RA---SIN'",
            "CTYPE2B = 'DEC--SIN'",
            "WCSAXESB=                    2",
        ]);
        let parsed = parse(&buf, 10, &ParseOptions::default());
        let wcs = select_first(parsed.clone()).unwrap();
        assert_eq!(wcs.description().alt(), Some('A'));
        assert_eq!(validate_all(&parsed.unwrap()).len(), 2);
    }

    #[test]
    fn test_no_usable_system() {
        let buf = cards(&["NAXIS   =                    3"]);
        let parsed = parse(&buf, 1, &ParseOptions::default());
        assert_eq!(select_first(parsed).unwrap_err(), Rejection::NoUsableSystem);
    }

    #[test]
    fn test_parse_failure_propagates() {
        let parsed = parse(b"", 0, &ParseOptions::default());
        assert!(matches!(select_first(parsed), Err(Rejection::ParseFailure(_))));
    }
}
