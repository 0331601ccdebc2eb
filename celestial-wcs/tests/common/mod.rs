#![allow(dead_code)]

/// Routes library log events to the test harness output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub const ARCSEC: f64 = 1.0 / 3600.0;

/// Concatenated 80-column cards.
pub fn cards(lines: &[&str]) -> Vec<u8> {
    lines.iter().flat_map(|l| format!("{l:<80}").into_bytes()).collect()
}

pub fn real(keyword: &str, value: f64) -> String {
    format!("{keyword:<8}= {:>20}", format!("{value:?}"))
}

pub fn int(keyword: &str, value: i64) -> String {
    format!("{keyword:<8}= {value:>20}")
}

pub fn text(keyword: &str, value: &str) -> String {
    format!("{keyword:<8}= '{value:<8}'")
}

/// Header for a two-axis celestial system with projection `code`.
pub fn celestial_header(
    code: &str,
    crval: [f64; 2],
    cdelt: f64,
    pv: &[(u16, u16, f64)],
) -> Vec<String> {
    let lng = format!("RA---{code}");
    let lat = format!("DEC--{code}");
    let mut lines = vec![
        int("NAXIS", 2),
        int("NAXIS1", 1024),
        int("NAXIS2", 1024),
        text("CTYPE1", &lng),
        text("CTYPE2", &lat),
        real("CRPIX1", 512.0),
        real("CRPIX2", 512.0),
        real("CRVAL1", crval[0]),
        real("CRVAL2", crval[1]),
        real("CDELT1", -cdelt),
        real("CDELT2", cdelt),
    ];
    for &(axis, m, value) in pv {
        lines.push(real(&format!("PV{axis}_{m}"), value));
    }
    lines
}

pub fn to_buffer(lines: &[String]) -> (Vec<u8>, i32) {
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    (cards(&refs), lines.len() as i32)
}

/// The scenario header: TAN at (180, 0), reference pixel (512, 512), 1"/px.
pub fn tan_scenario() -> (Vec<u8>, i32) {
    to_buffer(&celestial_header("TAN", [180.0, 0.0], ARCSEC, &[]))
}
