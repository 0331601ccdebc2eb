//! Recognition of WCS keyword names.
//!
//! A name is split into a stem, axis indices and an optional alternate
//! letter (`CRPIX1A` → `CRPIX`, axis 1, alternate `A`). Names that share a
//! stem with a WCS keyword but do not fit its pattern are reported as
//! malformed so the parser can count them as rejected.

use std::fmt;

/// Alternate coordinate-system marker: `None` is the primary system.
pub type Alt = Option<char>;

pub(crate) const MAX_AXIS: u16 = 99;
pub(crate) const MAX_PV_INDEX: u16 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SipSeries {
    A,
    B,
    Ap,
    Bp,
}

impl SipSeries {
    fn prefix(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::Ap => "AP",
            Self::Bp => "BP",
        }
    }
}

/// What kind of value a keyword must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Number,
    Integer,
    Text,
}

/// A recognised WCS keyword. Axis numbers are 1-based as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WcsKeyword {
    Naxis,
    NaxisN(u16),
    WcsAxes(Alt),
    Ctype(u16, Alt),
    Cunit(u16, Alt),
    Crpix(u16, Alt),
    Crval(u16, Alt),
    Cdelt(u16, Alt),
    Pc(u16, u16, Alt),
    Cd(u16, u16, Alt),
    Pv(u16, u16, Alt),
    Ps(u16, u16, Alt),
    Lonpole(Alt),
    Latpole(Alt),
    Radesys(Alt),
    Equinox(Alt),
    Wcsname(Alt),
    Crota(u16),
    Epoch,
    Radecsys,
    Projp(u16),
    LegacyPc(u16, u16),
    LegacyCd(u16, u16),
    SipOrder(SipSeries),
    SipCoeff(SipSeries, u16, u16),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedKeyword(pub String);

impl fmt::Display for MalformedKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type Lexed = Result<Option<WcsKeyword>, MalformedKeyword>;

impl WcsKeyword {
    /// `Ok(None)` for names unrelated to WCS, `Err` for names that start like
    /// a WCS keyword but break its pattern.
    pub fn parse(name: &str) -> Lexed {
        const ALT_STEMS: [(&str, fn(Alt) -> WcsKeyword); 6] = [
            ("WCSAXES", WcsKeyword::WcsAxes),
            ("LONPOLE", WcsKeyword::Lonpole),
            ("LATPOLE", WcsKeyword::Latpole),
            ("RADESYS", WcsKeyword::Radesys),
            ("EQUINOX", WcsKeyword::Equinox),
            ("WCSNAME", WcsKeyword::Wcsname),
        ];
        const AXIS_STEMS: [(&str, fn(u16, Alt) -> WcsKeyword); 5] = [
            ("CTYPE", WcsKeyword::Ctype),
            ("CUNIT", WcsKeyword::Cunit),
            ("CRPIX", WcsKeyword::Crpix),
            ("CRVAL", WcsKeyword::Crval),
            ("CDELT", WcsKeyword::Cdelt),
        ];

        match name {
            "NAXIS" => return Ok(Some(Self::Naxis)),
            "EPOCH" => return Ok(Some(Self::Epoch)),
            "RADECSYS" => return Ok(Some(Self::Radecsys)),
            _ => {}
        }
        if let Some(rest) = name.strip_prefix("NAXIS") {
            return axis_number(rest, name).map(|i| Some(Self::NaxisN(i)));
        }
        for (stem, make) in ALT_STEMS {
            if let Some(rest) = name.strip_prefix(stem) {
                return alt_only(rest, name).map(|a| Some(make(a)));
            }
        }
        for (stem, make) in AXIS_STEMS {
            if let Some(rest) = name.strip_prefix(stem) {
                let (digits, alt) = split_alt(rest, name)?;
                return axis_number(digits, name).map(|i| Some(make(i, alt)));
            }
        }
        if let Some(rest) = name.strip_prefix("CROTA") {
            return axis_number(rest, name).map(|i| Some(Self::Crota(i)));
        }
        if let Some(rest) = name.strip_prefix("PROJP") {
            return index_number(rest, name).map(|m| Some(Self::Projp(m)));
        }
        if let Some(lexed) = lex_matrix(name) {
            return lexed;
        }
        lex_sip(name)
    }

    pub fn alt(&self) -> Alt {
        match *self {
            Self::WcsAxes(a)
            | Self::Ctype(_, a)
            | Self::Cunit(_, a)
            | Self::Crpix(_, a)
            | Self::Crval(_, a)
            | Self::Cdelt(_, a)
            | Self::Pc(_, _, a)
            | Self::Cd(_, _, a)
            | Self::Pv(_, _, a)
            | Self::Ps(_, _, a)
            | Self::Lonpole(a)
            | Self::Latpole(a)
            | Self::Radesys(a)
            | Self::Equinox(a)
            | Self::Wcsname(a) => a,
            _ => None,
        }
    }

    /// Largest axis number the keyword refers to, if any.
    pub fn max_axis(&self) -> Option<u16> {
        match *self {
            Self::Ctype(i, _)
            | Self::Cunit(i, _)
            | Self::Crpix(i, _)
            | Self::Crval(i, _)
            | Self::Cdelt(i, _)
            | Self::Crota(i)
            | Self::Pv(i, _, _)
            | Self::Ps(i, _, _) => Some(i),
            Self::Pc(i, j, _) | Self::Cd(i, j, _) | Self::LegacyPc(i, j) | Self::LegacyCd(i, j) => {
                Some(i.max(j))
            }
            _ => None,
        }
    }

    /// Pre-standard spellings that only apply to the primary system.
    pub fn is_legacy(&self) -> bool {
        matches!(
            self,
            Self::Crota(_)
                | Self::Epoch
                | Self::Radecsys
                | Self::Projp(_)
                | Self::LegacyPc(..)
                | Self::LegacyCd(..)
        )
    }

    /// Keywords that describe the image rather than any one coordinate system.
    pub fn is_image_level(&self) -> bool {
        matches!(self, Self::Naxis | Self::NaxisN(_))
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            Self::Naxis | Self::NaxisN(_) | Self::WcsAxes(_) | Self::SipOrder(_) => {
                ValueKind::Integer
            }
            Self::Ctype(..)
            | Self::Cunit(..)
            | Self::Radesys(_)
            | Self::Radecsys
            | Self::Wcsname(_) => ValueKind::Text,
            Self::Ps(..) => ValueKind::Text,
            _ => ValueKind::Number,
        }
    }

    /// Canonical name, the inverse of [`WcsKeyword::parse`].
    pub fn name(&self) -> String {
        let suffix = |a: Alt| a.map(String::from).unwrap_or_default();
        match *self {
            Self::Naxis => "NAXIS".to_string(),
            Self::NaxisN(i) => format!("NAXIS{i}"),
            Self::WcsAxes(a) => format!("WCSAXES{}", suffix(a)),
            Self::Ctype(i, a) => format!("CTYPE{i}{}", suffix(a)),
            Self::Cunit(i, a) => format!("CUNIT{i}{}", suffix(a)),
            Self::Crpix(i, a) => format!("CRPIX{i}{}", suffix(a)),
            Self::Crval(i, a) => format!("CRVAL{i}{}", suffix(a)),
            Self::Cdelt(i, a) => format!("CDELT{i}{}", suffix(a)),
            Self::Pc(i, j, a) => format!("PC{i}_{j}{}", suffix(a)),
            Self::Cd(i, j, a) => format!("CD{i}_{j}{}", suffix(a)),
            Self::Pv(i, m, a) => format!("PV{i}_{m}{}", suffix(a)),
            Self::Ps(i, m, a) => format!("PS{i}_{m}{}", suffix(a)),
            Self::Lonpole(a) => format!("LONPOLE{}", suffix(a)),
            Self::Latpole(a) => format!("LATPOLE{}", suffix(a)),
            Self::Radesys(a) => format!("RADESYS{}", suffix(a)),
            Self::Equinox(a) => format!("EQUINOX{}", suffix(a)),
            Self::Wcsname(a) => format!("WCSNAME{}", suffix(a)),
            Self::Crota(i) => format!("CROTA{i}"),
            Self::Epoch => "EPOCH".to_string(),
            Self::Radecsys => "RADECSYS".to_string(),
            Self::Projp(m) => format!("PROJP{m}"),
            Self::LegacyPc(i, j) => format!("PC{i:03}{j:03}"),
            Self::LegacyCd(i, j) => format!("CD{i:03}{j:03}"),
            Self::SipOrder(s) => format!("{}_ORDER", s.prefix()),
            Self::SipCoeff(s, p, q) => format!("{}_{p}_{q}", s.prefix()),
        }
    }
}

fn malformed(name: &str, why: &str) -> MalformedKeyword {
    MalformedKeyword(format!("{name}: {why}"))
}

fn is_alt_letter(c: char) -> bool {
    c.is_ascii_uppercase()
}

fn alt_only(rest: &str, name: &str) -> Result<Alt, MalformedKeyword> {
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(None),
        (Some(c), None) if is_alt_letter(c) => Ok(Some(c)),
        _ => Err(malformed(name, "bad alternate suffix")),
    }
}

fn split_alt<'a>(rest: &'a str, name: &str) -> Result<(&'a str, Alt), MalformedKeyword> {
    match rest.chars().last() {
        Some(c) if is_alt_letter(c) => Ok((&rest[..rest.len() - 1], Some(c))),
        Some(_) => Ok((rest, None)),
        None => Err(malformed(name, "missing axis number")),
    }
}

fn parse_digits(digits: &str, name: &str) -> Result<u16, MalformedKeyword> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(name, "expected digits"));
    }
    digits
        .parse::<u16>()
        .map_err(|_| malformed(name, "number out of range"))
}

fn axis_number(digits: &str, name: &str) -> Result<u16, MalformedKeyword> {
    let i = parse_digits(digits, name)?;
    if i == 0 || i > MAX_AXIS {
        return Err(malformed(name, "axis number must be 1..=99"));
    }
    Ok(i)
}

fn index_number(digits: &str, name: &str) -> Result<u16, MalformedKeyword> {
    let m = parse_digits(digits, name)?;
    if m > MAX_PV_INDEX {
        return Err(malformed(name, "parameter index must be 0..=99"));
    }
    Ok(m)
}

/// `PCi_ja`, `CDi_ja`, `PVi_ma`, `PSi_ma` and the `PCiiijjj` legacy form.
/// The stem only counts when followed by a digit, so `PCOUNT` stays foreign.
fn lex_matrix(name: &str) -> Option<Lexed> {
    let (stem, rest) = ["PC", "CD", "PV", "PS"]
        .iter()
        .find_map(|s| name.strip_prefix(s).map(|r| (*s, r)))?;
    if !rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    if !rest.contains('_') {
        if rest.len() == 6
            && rest.bytes().all(|b| b.is_ascii_digit())
            && matches!(stem, "PC" | "CD")
        {
            let lexed = axis_number(&rest[..3], name).and_then(|i| {
                axis_number(&rest[3..], name).map(|j| match stem {
                    "PC" => WcsKeyword::LegacyPc(i, j),
                    _ => WcsKeyword::LegacyCd(i, j),
                })
            });
            return Some(lexed.map(Some));
        }
        return Some(Err(malformed(name, "expected i_j indices")));
    }

    let lexed = split_alt(rest, name).and_then(|(body, alt)| {
        let (i, j) = body
            .split_once('_')
            .ok_or_else(|| malformed(name, "expected i_j indices"))?;
        let i = axis_number(i, name)?;
        Ok(match stem {
            "PC" => WcsKeyword::Pc(i, axis_number(j, name)?, alt),
            "CD" => WcsKeyword::Cd(i, axis_number(j, name)?, alt),
            "PV" => WcsKeyword::Pv(i, index_number(j, name)?, alt),
            _ => WcsKeyword::Ps(i, index_number(j, name)?, alt),
        })
    });
    Some(lexed.map(Some))
}

fn lex_sip(name: &str) -> Lexed {
    let (series, rest) = if let Some(r) = name.strip_prefix("AP_") {
        (SipSeries::Ap, r)
    } else if let Some(r) = name.strip_prefix("BP_") {
        (SipSeries::Bp, r)
    } else if let Some(r) = name.strip_prefix("A_") {
        (SipSeries::A, r)
    } else if let Some(r) = name.strip_prefix("B_") {
        (SipSeries::B, r)
    } else {
        return Ok(None);
    };

    if rest == "ORDER" {
        return Ok(Some(WcsKeyword::SipOrder(series)));
    }
    if rest.starts_with("DMAX") {
        return Ok(None);
    }
    let (p, q) = rest
        .split_once('_')
        .ok_or_else(|| malformed(name, "expected p_q exponents"))?;
    Ok(Some(WcsKeyword::SipCoeff(
        series,
        index_number(p, name)?,
        index_number(q, name)?,
    )))
}
