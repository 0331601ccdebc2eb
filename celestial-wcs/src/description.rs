//! The coordinate-system description assembled from one alternate of a
//! header, with every default, legacy spelling and unit already resolved.

use std::fmt;

use celestial_core::constants::RAD_TO_DEG;
use celestial_core::math::sincosd;
use tracing::warn;

use crate::config::{CrpixDefault, ParseOptions};
use crate::distortion::{DistortionModel, SipDistortion, TpvDistortion};
use crate::error::{WcsError, WcsResult};
use crate::header::keyword::MAX_AXIS;
use crate::header::{Alt, KeywordProvider, SipSeries, WcsKeyword};
use crate::spherical::ProjectionParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CoordType {
    #[default]
    Equatorial,
    Galactic,
    Ecliptic,
    Helioecliptic,
    Supergalactic,
    /// Two-letter `xyLN`/`xyLT` body-fixed systems.
    Planetary,
    Generic,
}

impl CoordType {
    fn from_family(family: &str) -> Self {
        match family {
            "EQ" => Self::Equatorial,
            "G" => Self::Galactic,
            "E" => Self::Ecliptic,
            "H" => Self::Helioecliptic,
            "S" => Self::Supergalactic,
            f if f.len() == 2 => Self::Planetary,
            _ => Self::Generic,
        }
    }
}

/// Role of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AxisType {
    Longitude,
    Latitude,
    Linear,
}

/// Zero-based indices of the celestial longitude and latitude axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CelestialAxes {
    pub lng: usize,
    pub lat: usize,
}

/// Which header form the linear matrix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixSource {
    Pc,
    Cd,
    Crota,
    Identity,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PvParam {
    /// Zero-based axis index.
    pub axis: usize,
    pub m: u16,
    pub value: f64,
}

/// A `CTYPEia` value split into coordinate type and projection code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ctype {
    pub coord: String,
    pub code: Option<String>,
    pub sip: bool,
}

impl Ctype {
    /// `RA---TAN-SIP` → (`RA`, `TAN`, SIP). The code follows the last run
    /// of dashes and must be three characters.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        let (body, sip) = match value.strip_suffix("-SIP") {
            Some(body) => (body, true),
            None => (value, false),
        };
        if let Some(dash) = body.rfind('-') {
            let code = &body[dash + 1..];
            let coord = body[..dash].trim_end_matches('-');
            if code.len() == 3 && !coord.is_empty() {
                return Self {
                    coord: coord.to_string(),
                    code: Some(code.to_string()),
                    sip,
                };
            }
        }
        Self {
            coord: body.to_string(),
            code: None,
            sip,
        }
    }

    /// Celestial role and family tag, e.g. `GLON` → (Longitude, `G`).
    fn celestial_role(&self) -> Option<(AxisType, &str)> {
        self.code.as_ref()?;
        let c = self.coord.as_str();
        match c {
            "RA" => return Some((AxisType::Longitude, "EQ")),
            "DEC" => return Some((AxisType::Latitude, "EQ")),
            _ => {}
        }
        if c.len() != 4 {
            return None;
        }
        if let Some(f) = c.strip_suffix("LON") {
            Some((AxisType::Longitude, f))
        } else if let Some(f) = c.strip_suffix("LAT") {
            Some((AxisType::Latitude, f))
        } else if let Some(f) = c.strip_suffix("LN") {
            Some((AxisType::Longitude, f))
        } else {
            c.strip_suffix("LT").map(|f| (AxisType::Latitude, f))
        }
    }
}

/// Conversion factor to degrees for an angular `CUNIT`.
fn angular_unit_scale(unit: &str) -> Option<f64> {
    match unit {
        "" | "deg" => Some(1.0),
        "arcmin" => Some(1.0 / 60.0),
        "arcsec" => Some(1.0 / 3600.0),
        "mas" => Some(1.0 / 3_600_000.0),
        "rad" => Some(RAD_TO_DEG),
        _ => None,
    }
}

/// A fully resolved coordinate system. Immutable once assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSystemDescription {
    pub(crate) alt: Alt,
    pub(crate) ctype: Vec<String>,
    pub(crate) cunit: Vec<String>,
    pub(crate) axis_types: Vec<AxisType>,
    pub(crate) celestial: Option<CelestialAxes>,
    pub(crate) crpix: Vec<f64>,
    pub(crate) crval: Vec<f64>,
    pub(crate) cdelt: Vec<f64>,
    /// Row-major `axis_count × axis_count`.
    pub(crate) pc: Vec<f64>,
    pub(crate) matrix_source: MatrixSource,
    pub(crate) projection_code: Option<String>,
    pub(crate) pv: Vec<PvParam>,
    pub(crate) lonpole: Option<f64>,
    pub(crate) latpole: Option<f64>,
    pub(crate) radesys: Option<String>,
    pub(crate) equinox: Option<f64>,
    pub(crate) wcsname: Option<String>,
    pub(crate) coord_type: CoordType,
    pub(crate) distortion: Option<DistortionModel>,
    pub(crate) warnings: Vec<String>,
}

impl CoordinateSystemDescription {
    /// Assembles alternate `alt` from the keywords in `kw`.
    pub fn from_keywords(
        kw: &impl KeywordProvider,
        alt: Alt,
        opts: &ParseOptions,
    ) -> WcsResult<Self> {
        Assembler {
            kw,
            alt,
            opts,
            warnings: Vec::new(),
        }
        .assemble()
    }

    pub fn alt(&self) -> Alt {
        self.alt
    }

    pub fn axis_count(&self) -> usize {
        self.ctype.len()
    }

    pub fn ctype(&self) -> &[String] {
        &self.ctype
    }

    pub fn cunit(&self) -> &[String] {
        &self.cunit
    }

    pub fn axis_types(&self) -> &[AxisType] {
        &self.axis_types
    }

    pub fn celestial_axes(&self) -> Option<CelestialAxes> {
        self.celestial
    }

    pub fn longitude_axis(&self) -> Option<usize> {
        self.celestial.map(|c| c.lng)
    }

    pub fn latitude_axis(&self) -> Option<usize> {
        self.celestial.map(|c| c.lat)
    }

    pub fn has_celestial(&self) -> bool {
        self.celestial.is_some()
    }

    pub fn crpix(&self) -> &[f64] {
        &self.crpix
    }

    pub fn crval(&self) -> &[f64] {
        &self.crval
    }

    pub fn cdelt(&self) -> &[f64] {
        &self.cdelt
    }

    pub fn pc(&self) -> &[f64] {
        &self.pc
    }

    pub fn pc_element(&self, i: usize, j: usize) -> f64 {
        self.pc[i * self.axis_count() + j]
    }

    /// `diag(CDELT) · PC`.
    pub fn cd_matrix(&self) -> Vec<f64> {
        let n = self.axis_count();
        (0..n * n).map(|k| self.cdelt[k / n] * self.pc[k]).collect()
    }

    pub fn matrix_source(&self) -> MatrixSource {
        self.matrix_source
    }

    pub fn projection_code(&self) -> Option<&str> {
        self.projection_code.as_deref()
    }

    pub fn pv(&self) -> &[PvParam] {
        &self.pv
    }

    /// `PV(lat)_m` values that parameterise the projection. TPV spends its
    /// `PV` keywords on the distortion polynomial instead.
    pub fn projection_params(&self) -> ProjectionParams {
        match (self.celestial, self.projection_code()) {
            (Some(_), Some("TPV")) | (None, _) => ProjectionParams::default(),
            (Some(axes), _) => ProjectionParams::from_pairs(
                self.pv
                    .iter()
                    .filter(|p| p.axis == axes.lat)
                    .map(|p| (p.m, p.value)),
            ),
        }
    }

    pub fn lonpole(&self) -> Option<f64> {
        self.lonpole
    }

    pub fn latpole(&self) -> Option<f64> {
        self.latpole
    }

    pub fn radesys(&self) -> Option<&str> {
        self.radesys.as_deref()
    }

    pub fn equinox(&self) -> Option<f64> {
        self.equinox
    }

    pub fn wcsname(&self) -> Option<&str> {
        self.wcsname.as_deref()
    }

    pub fn coord_type(&self) -> CoordType {
        self.coord_type
    }

    pub fn distortion(&self) -> Option<&DistortionModel> {
        self.distortion.as_ref()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub(crate) fn push_warning(&mut self, message: String) {
        self.warnings.push(message);
    }
}

impl fmt::Display for CoordinateSystemDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alt = self.alt.map(String::from).unwrap_or_else(|| "primary".to_string());
        write!(f, "WCS {alt}: {} axes [{}]", self.axis_count(), self.ctype.join(", "))
    }
}

struct Assembler<'a, K> {
    kw: &'a K,
    alt: Alt,
    opts: &'a ParseOptions,
    warnings: Vec<String>,
}

impl<K: KeywordProvider> Assembler<'_, K> {
    fn warn(&mut self, message: String) {
        warn!(alt = ?self.alt, "{message}");
        self.warnings.push(message);
    }

    fn float(&self, key: WcsKeyword) -> Option<f64> {
        self.kw.get_float(&key.name())
    }

    fn string(&self, key: WcsKeyword) -> Option<String> {
        self.kw.get_string(&key.name()).map(|s| s.trim().to_string())
    }

    fn primary(&self) -> bool {
        self.alt.is_none()
    }

    /// Modern spelling wins; a differing legacy value is reported.
    fn modern_or_legacy(&mut self, modern: WcsKeyword, legacy: Option<WcsKeyword>) -> Option<f64> {
        let new = self.float(modern);
        let old = legacy.filter(|_| self.primary()).and_then(|k| self.float(k));
        match (new, old, legacy) {
            (Some(n), Some(o), Some(l)) if n != o => {
                self.warn(format!("{} = {n} overrides legacy {} = {o}", modern.name(), l.name()));
                Some(n)
            }
            (Some(n), _, _) => Some(n),
            (None, o, _) => o,
        }
    }

    /// Every WCS keyword in the store that belongs to this alternate.
    fn keywords(&self) -> Vec<(WcsKeyword, String)> {
        self.kw
            .names()
            .filter_map(|name| match WcsKeyword::parse(name) {
                Ok(Some(k)) if k.alt() == self.alt => Some((k, name.to_string())),
                _ => None,
            })
            .collect()
    }

    fn axis_count(&self, keywords: &[(WcsKeyword, String)]) -> WcsResult<usize> {
        let wcsaxes = WcsKeyword::WcsAxes(self.alt);
        if let Some(n) = self.kw.get_int(&wcsaxes.name()) {
            if !(0..=i64::from(MAX_AXIS)).contains(&n) {
                return Err(WcsError::invalid_keyword(
                    wcsaxes.name(),
                    format!("{n} axes is out of range"),
                ));
            }
            return Ok(n as usize);
        }
        let naxis = self.kw.get_int("NAXIS").unwrap_or(0);
        if !(0..=999).contains(&naxis) {
            return Err(WcsError::invalid_keyword("NAXIS", format!("{naxis} is out of range")));
        }
        let highest = keywords
            .iter()
            .filter(|(k, _)| !k.is_image_level() && !matches!(k, WcsKeyword::SipCoeff(..)))
            .filter_map(|(k, _)| k.max_axis())
            .max()
            .unwrap_or(0);
        let n = (naxis as usize).max(usize::from(highest));
        if n > usize::from(MAX_AXIS) {
            return Err(WcsError::invalid_keyword("NAXIS", format!("{n} axes is out of range")));
        }
        Ok(n)
    }

    fn assemble(mut self) -> WcsResult<CoordinateSystemDescription> {
        let alt = self.alt;
        let keywords = self.keywords();
        let n = self.axis_count(&keywords)?;

        let mut ctype = Vec::with_capacity(n);
        let mut cunit = Vec::with_capacity(n);
        let mut crpix = Vec::with_capacity(n);
        let mut crval = Vec::with_capacity(n);
        let mut cdelt = Vec::with_capacity(n);
        for i in 1..=n as u16 {
            ctype.push(self.string(WcsKeyword::Ctype(i, alt)).unwrap_or_default());
            cunit.push(self.string(WcsKeyword::Cunit(i, alt)).unwrap_or_default());
            crpix.push(
                self.float(WcsKeyword::Crpix(i, alt))
                    .unwrap_or_else(|| self.default_crpix(i)),
            );
            crval.push(self.float(WcsKeyword::Crval(i, alt)).unwrap_or(0.0));
            cdelt.push(self.float(WcsKeyword::Cdelt(i, alt)).unwrap_or(1.0));
        }

        let parsed: Vec<Ctype> = ctype.iter().map(|c| Ctype::parse(c)).collect();
        let (mut axis_types, celestial, coord_type) = self.classify(&parsed);
        let projection_code = celestial.and_then(|c| parsed[c.lng].code.clone());
        if let Some(code @ ("NCP" | "GLS")) = projection_code.as_deref() {
            let target = if code == "NCP" { "SIN" } else { "SFL" };
            self.warn(format!("legacy projection code {code} interpreted as {target}"));
        }

        let (pc, matrix_source) = self.matrix(n, &mut cdelt, celestial);

        if let Some(axes) = celestial {
            for axis in [axes.lng, axes.lat] {
                match angular_unit_scale(&cunit[axis]) {
                    Some(scale) => {
                        crval[axis] *= scale;
                        cdelt[axis] *= scale;
                        cunit[axis] = "deg".to_string();
                    }
                    None => {
                        let unit = cunit[axis].clone();
                        self.warn(format!(
                            "unrecognised angular unit '{unit}' on axis {}, assuming degrees",
                            axis + 1
                        ));
                    }
                }
            }
        } else {
            axis_types.iter_mut().for_each(|t| *t = AxisType::Linear);
        }

        let pv = self.pv_params(n, &keywords, celestial);
        let is_tpv = projection_code.as_deref() == Some("TPV");
        let pv_of = |axis: Option<usize>, m: u16| {
            axis.and_then(|a| pv.iter().find(|p| p.axis == a && p.m == m).map(|p| p.value))
        };
        let lng_axis = celestial.map(|c| c.lng);
        let pole_pv = |m: u16| (!is_tpv).then(|| pv_of(lng_axis, m)).flatten();
        let lonpole = self.pole_keyword(WcsKeyword::Lonpole(alt), pole_pv(3));
        let latpole = self.pole_keyword(WcsKeyword::Latpole(alt), pole_pv(4));

        let radesys = self.string(WcsKeyword::Radesys(alt)).or_else(|| {
            self.primary().then(|| self.string(WcsKeyword::Radecsys)).flatten()
        });
        let equinox = self.modern_or_legacy(WcsKeyword::Equinox(alt), Some(WcsKeyword::Epoch));
        let wcsname = self.string(WcsKeyword::Wcsname(alt));

        let wants_sip = celestial.is_some_and(|c| parsed[c.lng].sip || parsed[c.lat].sip);
        let distortion = self.distortion(n, &crpix, &keywords, &pv, celestial, is_tpv, wants_sip);

        Ok(CoordinateSystemDescription {
            alt,
            ctype,
            cunit,
            axis_types,
            celestial,
            crpix,
            crval,
            cdelt,
            pc,
            matrix_source,
            projection_code,
            pv,
            lonpole,
            latpole,
            radesys,
            equinox,
            wcsname,
            coord_type,
            distortion,
            warnings: self.warnings,
        })
    }

    fn default_crpix(&self, axis: u16) -> f64 {
        match self.opts.default_crpix {
            CrpixDefault::Zero => 0.0,
            CrpixDefault::Midpoint => self
                .kw
                .get_int(&WcsKeyword::NaxisN(axis).name())
                .map(|len| (len as f64 + 1.0) / 2.0)
                .unwrap_or(0.0),
        }
    }

    fn classify(&mut self, parsed: &[Ctype]) -> (Vec<AxisType>, Option<CelestialAxes>, CoordType) {
        let roles: Vec<Option<(AxisType, &str)>> =
            parsed.iter().map(Ctype::celestial_role).collect();
        let mut types: Vec<AxisType> = roles
            .iter()
            .map(|r| r.map(|(t, _)| t).unwrap_or(AxisType::Linear))
            .collect();

        let find = |want: AxisType| {
            roles
                .iter()
                .position(|r| matches!(r, Some((t, _)) if *t == want))
        };
        let (lng, lat) = match (find(AxisType::Longitude), find(AxisType::Latitude)) {
            (Some(lng), Some(lat)) => (lng, lat),
            (None, None) => return (types, None, CoordType::Generic),
            (lng, lat) => {
                let axis = lng.or(lat).unwrap_or(0);
                self.warn(format!(
                    "celestial axis {} has no partner, treating as linear",
                    axis + 1
                ));
                types.iter_mut().for_each(|t| *t = AxisType::Linear);
                return (types, None, CoordType::Generic);
            }
        };

        let lng_family = roles[lng].map(|(_, f)| f).unwrap_or_default();
        let lat_family = roles[lat].map(|(_, f)| f).unwrap_or_default();
        if parsed[lng].code != parsed[lat].code || lng_family != lat_family {
            self.warn(format!(
                "celestial axes disagree ({} vs {}), treating as linear",
                parsed[lng].coord, parsed[lat].coord
            ));
            types.iter_mut().for_each(|t| *t = AxisType::Linear);
            return (types, None, CoordType::Generic);
        }
        let coord_type = CoordType::from_family(lng_family);
        (types, Some(CelestialAxes { lng, lat }), coord_type)
    }

    /// Resolves the linear matrix: PC, then CD, then CROTA, then identity.
    /// With CD the returned CDELT is all ones.
    fn matrix(
        &mut self,
        n: usize,
        cdelt: &mut [f64],
        celestial: Option<CelestialAxes>,
    ) -> (Vec<f64>, MatrixSource) {
        let alt = self.alt;
        let mut pc = vec![0.0; n * n];
        let mut has_pc = false;
        let mut has_cd = false;
        for i in 0..n {
            for j in 0..n {
                let (a, b) = ((i + 1) as u16, (j + 1) as u16);
                has_pc |= self.float(WcsKeyword::Pc(a, b, alt)).is_some()
                    || (self.primary() && self.float(WcsKeyword::LegacyPc(a, b)).is_some());
                has_cd |= self.float(WcsKeyword::Cd(a, b, alt)).is_some()
                    || (self.primary() && self.float(WcsKeyword::LegacyCd(a, b)).is_some());
            }
        }
        let crota = if self.primary() {
            let pick = |axis: Option<usize>| {
                axis.and_then(|a| self.float(WcsKeyword::Crota((a + 1) as u16)))
            };
            pick(celestial.map(|c| c.lat))
                .or_else(|| pick(celestial.map(|c| c.lng)))
                .or_else(|| (1..=n as u16).rev().find_map(|i| self.float(WcsKeyword::Crota(i))))
        } else {
            None
        };

        let forms = [has_pc, has_cd, crota.is_some()].iter().filter(|&&f| f).count();
        if forms > 1 {
            self.warn(
                "more than one of PC, CD and CROTA given; using the highest-precedence form"
                    .to_string(),
            );
        }

        if has_pc {
            for i in 0..n {
                for j in 0..n {
                    let (a, b) = ((i + 1) as u16, (j + 1) as u16);
                    let legacy = Some(WcsKeyword::LegacyPc(a, b));
                    let value = self.modern_or_legacy(WcsKeyword::Pc(a, b, alt), legacy);
                    pc[i * n + j] = value.unwrap_or(if i == j { 1.0 } else { 0.0 });
                }
            }
            return (pc, MatrixSource::Pc);
        }
        if has_cd {
            for i in 0..n {
                for j in 0..n {
                    let (a, b) = ((i + 1) as u16, (j + 1) as u16);
                    let legacy = Some(WcsKeyword::LegacyCd(a, b));
                    pc[i * n + j] = self
                        .modern_or_legacy(WcsKeyword::Cd(a, b, alt), legacy)
                        .unwrap_or(0.0);
                }
            }
            cdelt.iter_mut().for_each(|d| *d = 1.0);
            return (pc, MatrixSource::Cd);
        }

        for i in 0..n {
            pc[i * n + i] = 1.0;
        }
        let pair = celestial.map(|c| (c.lng, c.lat)).or((n >= 2).then_some((0, 1)));
        match (crota, pair) {
            (Some(rho), Some((lng, lat))) if rho != 0.0 => {
                if cdelt[lng] == 0.0 || cdelt[lat] == 0.0 {
                    self.warn("CROTA ignored because a CDELT is zero".to_string());
                    return (pc, MatrixSource::Identity);
                }
                let (s, c) = sincosd(rho);
                pc[lng * n + lng] = c;
                pc[lng * n + lat] = -s * (cdelt[lat] / cdelt[lng]);
                pc[lat * n + lng] = s * (cdelt[lng] / cdelt[lat]);
                pc[lat * n + lat] = c;
                (pc, MatrixSource::Crota)
            }
            (Some(_), Some(_)) => (pc, MatrixSource::Crota),
            _ => (pc, MatrixSource::Identity),
        }
    }

    fn pv_params(
        &mut self,
        n: usize,
        keywords: &[(WcsKeyword, String)],
        celestial: Option<CelestialAxes>,
    ) -> Vec<PvParam> {
        let mut pv: Vec<PvParam> = keywords
            .iter()
            .filter_map(|(k, name)| match *k {
                WcsKeyword::Pv(i, m, a) if a == self.alt && usize::from(i) <= n && i > 0 => {
                    self.kw.get_float(name).map(|value| PvParam {
                        axis: usize::from(i) - 1,
                        m,
                        value,
                    })
                }
                _ => None,
            })
            .collect();

        if let (true, Some(axes)) = (self.primary(), celestial) {
            let legacy: Vec<(u16, f64)> = keywords
                .iter()
                .filter_map(|(k, name)| match *k {
                    WcsKeyword::Projp(m) => self.kw.get_float(name).map(|v| (m, v)),
                    _ => None,
                })
                .collect();
            for (m, value) in legacy {
                match pv.iter().find(|p| p.axis == axes.lat && p.m == m) {
                    Some(p) if p.value != value => {
                        let modern = p.value;
                        self.warn(format!(
                            "PV{}_{m} = {modern} overrides legacy PROJP{m} = {value}",
                            axes.lat + 1
                        ));
                    }
                    Some(_) => {}
                    None => pv.push(PvParam {
                        axis: axes.lat,
                        m,
                        value,
                    }),
                }
            }
        }

        pv.sort_by_key(|p| (p.axis, p.m));
        pv
    }

    fn pole_keyword(&mut self, key: WcsKeyword, from_pv: Option<f64>) -> Option<f64> {
        match (self.float(key), from_pv) {
            (Some(k), Some(p)) if k != p => {
                self.warn(format!("{} = {k} overrides the PV value {p}", key.name()));
                Some(k)
            }
            (Some(k), _) => Some(k),
            (None, p) => p,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn distortion(
        &mut self,
        n: usize,
        crpix: &[f64],
        keywords: &[(WcsKeyword, String)],
        pv: &[PvParam],
        celestial: Option<CelestialAxes>,
        is_tpv: bool,
        wants_sip: bool,
    ) -> Option<DistortionModel> {
        let axes = celestial?;
        if is_tpv {
            if wants_sip {
                self.warn("TPV and SIP both declared; SIP ignored".to_string());
            }
            let mut tpv = TpvDistortion::identity();
            for p in pv {
                if p.axis == axes.lng {
                    tpv.set_xi(usize::from(p.m), p.value);
                } else if p.axis == axes.lat {
                    tpv.set_eta(usize::from(p.m), p.value);
                }
            }
            return Some(DistortionModel::Tpv(Box::new(tpv)));
        }
        if !wants_sip || n < 2 {
            return None;
        }

        let kw = self.kw;
        let order = |series| kw.get_int(&WcsKeyword::SipOrder(series).name());
        let Some(a_order) = order(SipSeries::A) else {
            self.warn("-SIP axis type without A_ORDER; distortion ignored".to_string());
            return None;
        };
        let b_order = order(SipSeries::B).unwrap_or(a_order);
        let (Ok(a_order), Ok(b_order)) = (u16::try_from(a_order), u16::try_from(b_order)) else {
            self.warn("negative SIP order; distortion ignored".to_string());
            return None;
        };

        let mut sip = SipDistortion::new([crpix[0], crpix[1]], a_order, b_order);
        let ap = order(SipSeries::Ap).and_then(|o| u16::try_from(o).ok());
        let bp = order(SipSeries::Bp).and_then(|o| u16::try_from(o).ok());
        if ap.is_some() || bp.is_some() {
            sip.set_inverse_order(ap.or(bp).unwrap_or(0), bp.or(ap).unwrap_or(0));
        }
        for (k, name) in keywords {
            if let WcsKeyword::SipCoeff(series, p, q) = *k {
                let Some(value) = self.kw.get_float(name) else { continue };
                match series {
                    SipSeries::A => sip.set_a(p, q, value),
                    SipSeries::B => sip.set_b(p, q, value),
                    SipSeries::Ap => sip.set_ap(p, q, value),
                    SipSeries::Bp => sip.set_bp(p, q, value),
                }
            }
        }
        Some(DistortionModel::Sip(sip))
    }
}
