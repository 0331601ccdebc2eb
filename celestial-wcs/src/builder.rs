//! Programmatic construction of a [`CoordinateSystemDescription`] without a
//! header. The builder writes the same keywords a header would carry, so the
//! result goes through exactly the defaults and checks the parser applies.

use std::collections::BTreeMap;

use crate::config::ParseOptions;
use crate::description::CoordinateSystemDescription;
use crate::error::WcsResult;
use crate::header::{Alt, KeywordMap, WcsKeyword};

#[derive(Debug, Clone, Default)]
enum MatrixSpec {
    #[default]
    Identity,
    Pc(Vec<Vec<f64>>),
    Cd(Vec<Vec<f64>>),
}

#[derive(Debug, Clone, Default)]
pub struct WcsBuilder {
    alt: Alt,
    ctype: Vec<String>,
    crpix: Vec<f64>,
    crval: Vec<f64>,
    cdelt: Vec<f64>,
    matrix: MatrixSpec,
    pv: BTreeMap<(u16, u16), f64>,
    lonpole: Option<f64>,
    latpole: Option<f64>,
}

fn rows<R, I>(rows: I) -> Vec<Vec<f64>>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = f64>,
{
    rows.into_iter().map(|r| r.into_iter().collect()).collect()
}

impl WcsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alt(mut self, alt: char) -> Self {
        self.alt = Some(alt);
        self
    }

    pub fn ctype<S: Into<String>>(mut self, ctype: impl IntoIterator<Item = S>) -> Self {
        self.ctype = ctype.into_iter().map(Into::into).collect();
        self
    }

    pub fn crpix(mut self, crpix: impl IntoIterator<Item = f64>) -> Self {
        self.crpix = crpix.into_iter().collect();
        self
    }

    pub fn crval(mut self, crval: impl IntoIterator<Item = f64>) -> Self {
        self.crval = crval.into_iter().collect();
        self
    }

    pub fn cdelt(mut self, cdelt: impl IntoIterator<Item = f64>) -> Self {
        self.cdelt = cdelt.into_iter().collect();
        self
    }

    pub fn pc<R, I>(mut self, pc: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = f64>,
    {
        self.matrix = MatrixSpec::Pc(rows(pc));
        self
    }

    pub fn cd<R, I>(mut self, cd: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = f64>,
    {
        self.matrix = MatrixSpec::Cd(rows(cd));
        self
    }

    /// `PVi_m`, with `axis` 1-based as in the keyword.
    pub fn pv(mut self, axis: u16, m: u16, value: f64) -> Self {
        self.pv.insert((axis, m), value);
        self
    }

    pub fn lonpole(mut self, lonpole: f64) -> Self {
        self.lonpole = Some(lonpole);
        self
    }

    pub fn latpole(mut self, latpole: f64) -> Self {
        self.latpole = Some(latpole);
        self
    }

    fn axis_count(&self) -> usize {
        let matrix = match &self.matrix {
            MatrixSpec::Identity => 0,
            MatrixSpec::Pc(m) | MatrixSpec::Cd(m) => m.len(),
        };
        [self.ctype.len(), self.crpix.len(), self.crval.len(), self.cdelt.len(), matrix]
            .into_iter()
            .max()
            .unwrap_or(0)
    }

    /// The keywords this builder stands for.
    pub fn to_keywords(&self) -> KeywordMap {
        let alt = self.alt;
        let mut map = KeywordMap::new();
        map.set_int(WcsKeyword::WcsAxes(alt).name(), self.axis_count() as i64);

        let axis = |i: usize| (i + 1) as u16;
        for (i, v) in self.ctype.iter().enumerate() {
            map.set_string(WcsKeyword::Ctype(axis(i), alt).name(), v.as_str());
        }
        for (i, &v) in self.crpix.iter().enumerate() {
            map.set_float(WcsKeyword::Crpix(axis(i), alt).name(), v);
        }
        for (i, &v) in self.crval.iter().enumerate() {
            map.set_float(WcsKeyword::Crval(axis(i), alt).name(), v);
        }
        for (i, &v) in self.cdelt.iter().enumerate() {
            map.set_float(WcsKeyword::Cdelt(axis(i), alt).name(), v);
        }

        let (matrix, is_cd) = match &self.matrix {
            MatrixSpec::Identity => (&[][..], false),
            MatrixSpec::Pc(m) => (&m[..], false),
            MatrixSpec::Cd(m) => (&m[..], true),
        };
        for (i, row) in matrix.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                let key = if is_cd {
                    WcsKeyword::Cd(axis(i), axis(j), alt)
                } else {
                    WcsKeyword::Pc(axis(i), axis(j), alt)
                };
                map.set_float(key.name(), v);
            }
        }

        for (&(i, m), &v) in &self.pv {
            map.set_float(WcsKeyword::Pv(i, m, alt).name(), v);
        }
        if let Some(v) = self.lonpole {
            map.set_float(WcsKeyword::Lonpole(alt).name(), v);
        }
        if let Some(v) = self.latpole {
            map.set_float(WcsKeyword::Latpole(alt).name(), v);
        }
        map
    }

    pub fn build(&self) -> WcsResult<CoordinateSystemDescription> {
        CoordinateSystemDescription::from_keywords(
            &self.to_keywords(),
            self.alt,
            &ParseOptions::default(),
        )
    }
}
