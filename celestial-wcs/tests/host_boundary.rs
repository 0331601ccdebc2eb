mod common;

use approx::assert_abs_diff_eq;
use celestial_wcs::{parse, ParseOptions, WcsHost, WcsStatus};
use common::{cards, int, real, tan_scenario, text, to_buffer, ARCSEC};

// --- The tangent-plane scenario ---

#[test]
fn reference_pixel_maps_to_reference_value() {
    let host = WcsHost::new();
    let (buf, n) = tan_scenario();
    let handle = host.get_wcs(&buf, n).unwrap();
    assert!(host.has_celestial(handle));

    let (lon, lat, status) = host.pix2sky(handle, 512.0, 512.0);
    assert_eq!(status, 0);
    assert_abs_diff_eq!(lon, 180.0, epsilon = 1e-10);
    assert_abs_diff_eq!(lat, 0.0, epsilon = 1e-10);
}

#[test]
fn one_pixel_along_x_is_minus_one_arcsec() {
    let host = WcsHost::new();
    let (buf, n) = tan_scenario();
    let handle = host.get_wcs(&buf, n).unwrap();

    let (lon, lat, status) = host.pix2sky(handle, 513.0, 512.0);
    assert_eq!(status, 0);
    assert_abs_diff_eq!((lon - 180.0) * 3600.0, -1.0, epsilon = 1e-9);
    assert_abs_diff_eq!(lat, 0.0, epsilon = 1e-10);
}

#[test]
fn scenario_round_trips() {
    let host = WcsHost::new();
    let (buf, n) = tan_scenario();
    let handle = host.get_wcs(&buf, n).unwrap();
    for &(x, y) in &[(1.0, 1.0), (1024.0, 1024.0), (300.5, 812.25)] {
        let (lon, lat, s1) = host.pix2sky(handle, x, y);
        assert!((0.0..360.0).contains(&lon));
        let (px, py, s2) = host.sky2pix(handle, lon, lat);
        assert_eq!((s1, s2), (0, 0));
        assert_abs_diff_eq!(px, x, epsilon = 1e-9);
        assert_abs_diff_eq!(py, y, epsilon = 1e-9);
    }
}

// --- Axis rejection ---

#[test]
fn one_axis_header_has_no_handle() {
    let host = WcsHost::new();
    let lines = [
        int("NAXIS", 1),
        text("CTYPE1", "FREQ"),
        real("CRVAL1", 1.4e9),
        real("CDELT1", 1e6),
    ];
    let (buf, n) = to_buffer(&lines);
    assert!(host.get_wcs(&buf, n).is_none());
}

#[test]
fn three_axis_header_has_no_handle() {
    let host = WcsHost::new();
    let mut lines = common::celestial_header("TAN", [10.0, 20.0], ARCSEC, &[]);
    lines[0] = int("NAXIS", 3);
    lines.push(int("NAXIS3", 16));
    lines.push(text("CTYPE3", "FREQ"));
    let (buf, n) = to_buffer(&lines);
    assert!(host.get_wcs(&buf, n).is_none());
}

// --- Non-celestial systems ---

#[test]
fn linear_axes_report_missing_celestial() {
    let host = WcsHost::new();
    let lines = [
        int("NAXIS", 2),
        text("CTYPE1", "FREQ"),
        text("CTYPE2", "VELO"),
        real("CDELT1", 1e6),
        real("CDELT2", 1e3),
    ];
    let (buf, n) = to_buffer(&lines);
    let handle = host.get_wcs(&buf, n).unwrap();
    assert!(!host.has_celestial(handle));

    let (_, _, status) = host.pix2sky(handle, 1.0, 1.0);
    assert_eq!(status, WcsStatus::MissingCelestialAxes.code());
    let (_, _, status) = host.sky2pix(handle, 10.0, 10.0);
    assert_eq!(status, WcsStatus::MissingCelestialAxes.code());

    let wcs = host.get(handle).unwrap();
    assert_eq!(wcs.pixel_to_world(2.0, 1.0).unwrap(), [2e6, 1e3]);
}

// --- Singular matrix ---

#[test]
fn singular_matrix_fails_every_inverse() {
    let host = WcsHost::new();
    let mut lines = common::celestial_header("TAN", [45.0, 30.0], ARCSEC, &[]);
    lines.push(real("CD1_1", 1e-4));
    lines.push(real("CD1_2", 1e-4));
    lines.push(real("CD2_1", 1e-4));
    lines.push(real("CD2_2", 1e-4));
    let (buf, n) = to_buffer(&lines);
    let handle = host.get_wcs(&buf, n).unwrap();

    for &(x, y) in &[(1.0, 1.0), (512.0, 512.0), (900.0, 40.0)] {
        let (lon, lat, status) = host.pix2sky(handle, x, y);
        assert_eq!(status, 0);
        let (_, _, inverse) = host.sky2pix(handle, lon, lat);
        assert_eq!(inverse, WcsStatus::SingularMatrix.code());
    }
    assert_eq!(host.sky2pix(handle, 45.0, 30.0).2, WcsStatus::SingularMatrix.code());
}

// --- Out-of-domain calls ---

#[test]
fn out_of_domain_does_not_poison_the_handle() {
    let host = WcsHost::new();
    let (buf, n) = tan_scenario();
    let handle = host.get_wcs(&buf, n).unwrap();

    // The antipode of the tangent point cannot be projected.
    let (x, _, status) = host.sky2pix(handle, 0.0, 0.0);
    assert_eq!(status, WcsStatus::InvalidWorld.code());
    assert!(x.is_nan());
    let (_, _, status) = host.pix2sky(handle, f64::NAN, 1.0);
    assert_eq!(status, WcsStatus::InvalidPixel.code());

    assert_eq!(host.pix2sky(handle, 512.0, 512.0).2, 0);
}

// --- Non-finite values ---

#[test]
fn overflowing_reference_value_is_rejected() {
    let mut lines = common::celestial_header("TAN", [10.0, 20.0], ARCSEC, &[]);
    assert!(lines[8].starts_with("CRVAL2"));
    lines[8] = "CRVAL2  =                1E400".to_string();
    let (buf, n) = to_buffer(&lines);

    let parsed = parse(&buf, n, &ParseOptions::default()).unwrap();
    assert_eq!(parsed.rejected_count(), 1);
    assert_eq!(parsed.systems()[0].crval(), &[10.0, 0.0]);

    let host = WcsHost::new();
    let handle = host.get_wcs(&buf, n).unwrap();
    let (lon, lat, status) = host.pix2sky(handle, 512.0, 512.0);
    assert_eq!(status, 0);
    assert_abs_diff_eq!(lon, 10.0, epsilon = 1e-10);
    assert_abs_diff_eq!(lat, 0.0, epsilon = 1e-10);
}

// --- Handle lifecycle ---

#[test]
fn released_handle_is_invalid() {
    let host = WcsHost::new();
    let (buf, n) = tan_scenario();
    let handle = host.get_wcs(&buf, n).unwrap();
    assert!(host.release(handle));
    assert_eq!(host.pix2sky(handle, 1.0, 1.0).2, WcsStatus::InvalidHandle.code());
    assert_eq!(host.sky2pix(handle, 1.0, 1.0).2, WcsStatus::InvalidHandle.code());
}

#[test]
fn structural_failures_have_no_handle() {
    let host = WcsHost::new();
    let (buf, n) = tan_scenario();
    assert!(host.get_wcs(&buf, 0).is_none());
    assert!(host.get_wcs(&buf, -5).is_none());
    assert!(host.get_wcs(&buf, n + 1).is_none());
    assert!(host.get_wcs(&cards(&["OBJECT  = 'nothing'"]), 1).is_none());
}
