mod common;

use approx::assert_abs_diff_eq;
use celestial_wcs::distortion::DistortionModel;
use celestial_wcs::{parse, select_first, validate, ParseOptions, Wcs, WcsBuilder, WcsHost};
use common::{celestial_header, int, real, to_buffer, ARCSEC};

const SCALE: f64 = 0.05;

const PIXELS: &[(f64, f64)] = &[
    (512.0, 512.0),
    (12.0, 12.0),
    (1012.0, 300.0),
    (200.0, 900.0),
    (700.5, 650.25),
    (512.0, 1000.0),
];

fn build(code: &str, crval: [f64; 2], pv: &[(u16, u16, f64)]) -> Wcs {
    build_scaled(code, crval, SCALE, pv)
}

fn build_scaled(code: &str, crval: [f64; 2], scale: f64, pv: &[(u16, u16, f64)]) -> Wcs {
    let mut builder = WcsBuilder::new()
        .ctype([format!("RA---{code}"), format!("DEC--{code}")])
        .crpix([512.0, 512.0])
        .crval(crval)
        .cdelt([-scale, scale]);
    for &(axis, m, value) in pv {
        builder = builder.pv(axis, m, value);
    }
    let desc = builder.build().unwrap();
    assert_eq!(desc.projection_code(), Some(code));
    validate(&desc).unwrap()
}

fn assert_round_trip(wcs: &Wcs, code: &str) {
    for &(x, y) in PIXELS {
        let [lon, lat] = wcs
            .pixel_to_sky(x, y)
            .unwrap_or_else(|e| panic!("{code}: pixel ({x}, {y}) failed: {e}"));
        assert!((0.0..360.0).contains(&lon), "{code}: longitude {lon}");
        assert!((-90.0..=90.0).contains(&lat), "{code}: latitude {lat}");
        let [px, py] = wcs
            .sky_to_pixel(lon, lat)
            .unwrap_or_else(|e| panic!("{code}: sky ({lon}, {lat}) failed: {e}"));
        assert_abs_diff_eq!(px, x, epsilon = 1e-9);
        assert_abs_diff_eq!(py, y, epsilon = 1e-9);
    }
}

fn check_at(code: &str, crval: [f64; 2], pv: &[(u16, u16, f64)]) {
    let wcs = build(code, crval, pv);
    let [lon, lat] = wcs.pixel_to_sky(512.0, 512.0).unwrap();
    assert_abs_diff_eq!(lon, crval[0], epsilon = 1e-10);
    assert_abs_diff_eq!(lat, crval[1], epsilon = 1e-10);
    assert_round_trip(&wcs, code);
}

fn check(code: &str, pv: &[(u16, u16, f64)]) {
    check_at(code, [30.0, 40.0], pv);
}

// --- Zenithal ---

#[test]
fn azp_round_trip() {
    check("AZP", &[(2, 1, 2.0), (2, 2, 10.0)]);
}

#[test]
fn szp_round_trip() {
    check("SZP", &[(2, 1, 2.0), (2, 2, 30.0), (2, 3, 60.0)]);
}

#[test]
fn tan_round_trip() {
    check("TAN", &[]);
}

#[test]
fn stg_round_trip() {
    check("STG", &[]);
}

#[test]
fn sin_round_trip() {
    check("SIN", &[]);
    check("SIN", &[(2, 1, 0.1), (2, 2, -0.05)]);
}

#[test]
fn ncp_round_trip() {
    // NCP only covers the hemisphere north of the equator.
    check_at("NCP", [30.0, 60.0], &[]);
}

#[test]
fn arc_round_trip() {
    check("ARC", &[]);
}

#[test]
fn zpn_round_trip() {
    check("ZPN", &[(2, 0, 0.0), (2, 1, 1.0), (2, 2, 0.0), (2, 3, -0.05)]);
}

#[test]
fn zea_round_trip() {
    check("ZEA", &[]);
}

#[test]
fn air_round_trip() {
    check("AIR", &[(2, 1, 45.0)]);
}

// --- Cylindrical ---

#[test]
fn cyp_round_trip() {
    check("CYP", &[(2, 1, 1.0), (2, 2, 0.7)]);
}

#[test]
fn cea_round_trip() {
    check("CEA", &[(2, 1, 0.75)]);
}

#[test]
fn car_round_trip() {
    check("CAR", &[]);
}

#[test]
fn mer_round_trip() {
    check("MER", &[]);
}

// --- Pseudo-cylindrical ---

#[test]
fn sfl_round_trip() {
    check("SFL", &[]);
    check("GLS", &[]);
}

#[test]
fn par_round_trip() {
    check("PAR", &[]);
}

#[test]
fn mol_round_trip() {
    check("MOL", &[]);
}

#[test]
fn ait_round_trip() {
    check("AIT", &[]);
}

// --- Conic ---

#[test]
fn cop_round_trip() {
    check("COP", &[(2, 1, 45.0), (2, 2, 10.0)]);
}

#[test]
fn coe_round_trip() {
    check("COE", &[(2, 1, 45.0), (2, 2, 10.0)]);
}

#[test]
fn cod_round_trip() {
    check("COD", &[(2, 1, 45.0), (2, 2, 10.0)]);
}

#[test]
fn coo_round_trip() {
    check("COO", &[(2, 1, 45.0), (2, 2, 10.0)]);
}

#[test]
fn southern_conic_round_trip() {
    let wcs = build("COE", [200.0, -50.0], &[(2, 1, -45.0), (2, 2, 5.0)]);
    assert_round_trip(&wcs, "COE");
}

#[test]
fn conic_without_standard_parallel_is_invalid() {
    let wcs = build("COP", [30.0, 40.0], &[]);
    assert!(wcs.projection().is_none());
    assert!(wcs.pixel_to_sky(512.0, 512.0).is_err());
}

// --- Polyconic ---

#[test]
fn bon_round_trip() {
    check("BON", &[(2, 1, 45.0)]);
}

#[test]
fn pco_round_trip() {
    check("PCO", &[]);
}

// --- TPV ---

#[test]
fn tpv_round_trip() {
    check("TPV", &[(1, 4, 2e-3), (1, 5, -1e-3), (2, 4, 1e-3), (2, 7, 5e-5)]);
}

// --- Arcsecond plate scale ---

#[test]
fn zenithal_round_trip_at_arcsecond_scale() {
    let cases: &[(&str, [f64; 2], &[(u16, u16, f64)])] = &[
        ("AZP", [30.0, 40.0], &[(2, 1, 2.0), (2, 2, 10.0)]),
        ("SZP", [30.0, 40.0], &[(2, 1, 2.0), (2, 2, 30.0), (2, 3, 60.0)]),
        ("TAN", [30.0, 40.0], &[]),
        ("TAN", [180.0, 0.0], &[]),
        ("STG", [30.0, 40.0], &[]),
        ("SIN", [30.0, 40.0], &[]),
        ("SIN", [30.0, 40.0], &[(2, 1, 0.1), (2, 2, -0.05)]),
        ("NCP", [30.0, 60.0], &[]),
        ("ARC", [30.0, 40.0], &[]),
        ("ZPN", [30.0, 40.0], &[(2, 0, 0.0), (2, 1, 1.0), (2, 3, -0.05)]),
        ("ZEA", [30.0, 40.0], &[]),
        ("AIR", [30.0, 40.0], &[(2, 1, 45.0)]),
        ("TPV", [30.0, 40.0], &[(1, 4, 2e-3), (1, 5, -1e-3), (2, 4, 1e-3), (2, 7, 5e-5)]),
        ("TAN", [75.0, 90.0], &[]),
    ];
    for &(code, crval, pv) in cases {
        let wcs = build_scaled(code, crval, ARCSEC, pv);
        assert_round_trip(&wcs, code);
    }
}

// --- SIP ---

fn sip_header(with_inverse: bool) -> Vec<String> {
    let mut lines = celestial_header("TAN-SIP", [150.0, 2.0], ARCSEC, &[]);
    lines.extend([
        real("CD1_1", -2.8e-4),
        real("CD1_2", 1.5e-6),
        real("CD2_1", 1.2e-6),
        real("CD2_2", 2.8e-4),
        int("A_ORDER", 2),
        real("A_2_0", 2e-6),
        real("A_1_1", -1e-6),
        real("A_0_2", 5e-7),
        int("B_ORDER", 2),
        real("B_2_0", 1e-6),
        real("B_0_2", -2e-6),
    ]);
    if with_inverse {
        lines.extend([
            int("AP_ORDER", 2),
            real("AP_2_0", -2e-6),
            real("AP_1_1", 1e-6),
            real("AP_0_2", -5e-7),
            int("BP_ORDER", 2),
            real("BP_2_0", -1e-6),
            real("BP_0_2", 2e-6),
        ]);
    }
    lines
}

#[test]
fn sip_header_round_trip() {
    for with_inverse in [false, true] {
        let (buf, n) = to_buffer(&sip_header(with_inverse));
        let wcs = select_first(parse(&buf, n, &ParseOptions::default())).unwrap();
        assert_eq!(wcs.description().projection_code(), Some("TAN"));
        assert!(matches!(wcs.description().distortion(), Some(DistortionModel::Sip(_))));

        let [lon, lat] = wcs.pixel_to_sky(512.0, 512.0).unwrap();
        assert_abs_diff_eq!(lon, 150.0, epsilon = 1e-10);
        assert_abs_diff_eq!(lat, 2.0, epsilon = 1e-10);
        assert_round_trip(&wcs, "TAN-SIP");
    }
}

#[test]
fn sip_terms_move_the_sky_position() {
    let (buf, n) = to_buffer(&sip_header(false));
    let host = WcsHost::new();
    let distorted = host.get_wcs(&buf, n).unwrap();

    let plain_lines: Vec<String> = sip_header(false)
        .into_iter()
        .map(|l| l.replace("TAN-SIP", "TAN"))
        .filter(|l| !l.starts_with("A_") && !l.starts_with("B_"))
        .collect();
    let (buf, n) = to_buffer(&plain_lines);
    let plain = host.get_wcs(&buf, n).unwrap();

    // 500 px from CRPIX the A_2_0 term alone adds half a pixel along x.
    let (d_lon, d_lat, s1) = host.pix2sky(distorted, 1012.0, 512.0);
    let (p_lon, p_lat, s2) = host.pix2sky(plain, 1012.0, 512.0);
    assert_eq!((s1, s2), (0, 0));
    assert!((d_lon - p_lon).abs() * 3600.0 > 0.1);
    assert!((d_lat - p_lat).abs() * 3600.0 > 0.1);

    let (x, y, status) = host.sky2pix(distorted, d_lon, d_lat);
    assert_eq!(status, 0);
    assert_abs_diff_eq!(x, 1012.0, epsilon = 1e-9);
    assert_abs_diff_eq!(y, 512.0, epsilon = 1e-9);
}

// --- Reference point placement ---

#[test]
fn polar_reference_point() {
    for code in ["TAN", "ZEA", "CAR", "AIT"] {
        let wcs = build(code, [75.0, 90.0], &[]);
        assert_round_trip(&wcs, code);
    }
}

#[test]
fn lonpole_rotates_the_sky() {
    let plain = build("TAN", [0.0, 0.0], &[]);
    let mut lines = celestial_header("TAN", [0.0, 0.0], SCALE, &[]);
    lines.push(real("LONPOLE", 0.0));
    let (buf, n) = to_buffer(&lines);
    let flipped = select_first(parse(&buf, n, &ParseOptions::default())).unwrap();

    let [a_lon, a_lat] = plain.pixel_to_sky(512.0, 600.0).unwrap();
    let [b_lon, b_lat] = flipped.pixel_to_sky(512.0, 600.0).unwrap();
    assert_abs_diff_eq!(a_lon, b_lon, epsilon = 1e-10);
    assert_abs_diff_eq!(a_lat, -b_lat, epsilon = 1e-10);
    assert_round_trip(&flipped, "TAN");
}
