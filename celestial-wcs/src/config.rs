//! Header parsing options.

/// Which alternate coordinate systems the parser assembles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AltSelection {
    #[default]
    All,
    PrimaryOnly,
    /// A single alternate letter, `A`–`Z`.
    Only(char),
}

impl AltSelection {
    pub fn accepts(&self, alt: Option<char>) -> bool {
        match self {
            Self::All => true,
            Self::PrimaryOnly => alt.is_none(),
            Self::Only(c) => alt == Some(*c),
        }
    }
}

/// Fallback for a missing `CRPIXja`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CrpixDefault {
    /// `(NAXISj + 1) / 2` when `NAXISj` is known, otherwise 0.
    #[default]
    Midpoint,
    Zero,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ParseOptions {
    /// Honour pre-standard keywords such as `CROTAi` and `PC001002`.
    pub accept_legacy: bool,
    pub alternates: AltSelection,
    pub default_crpix: CrpixDefault,
    /// Skip records the WCS keyword filter does not recognise before parsing.
    pub wcs_keywords_only: bool,
    pub max_records: Option<usize>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            accept_legacy: true,
            alternates: AltSelection::All,
            default_crpix: CrpixDefault::Midpoint,
            wcs_keywords_only: false,
            max_records: None,
        }
    }
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            accept_legacy: false,
            ..Self::default()
        }
    }

    pub fn alternates(mut self, selection: AltSelection) -> Self {
        self.alternates = selection;
        self
    }

    pub fn default_crpix(mut self, default: CrpixDefault) -> Self {
        self.default_crpix = default;
        self
    }

    pub fn wcs_keywords_only(mut self, enabled: bool) -> Self {
        self.wcs_keywords_only = enabled;
        self
    }

    pub fn max_records(mut self, limit: usize) -> Self {
        self.max_records = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = ParseOptions::default();
        assert!(opts.accept_legacy);
        assert_eq!(opts.alternates, AltSelection::All);
        assert_eq!(opts.default_crpix, CrpixDefault::Midpoint);
        assert!(!opts.wcs_keywords_only);
        assert_eq!(opts.max_records, None);
    }

    #[test]
    fn test_alt_selection() {
        assert!(AltSelection::All.accepts(Some('B')));
        assert!(AltSelection::PrimaryOnly.accepts(None));
        assert!(!AltSelection::PrimaryOnly.accepts(Some('A')));
        assert!(AltSelection::Only('C').accepts(Some('C')));
        assert!(!AltSelection::Only('C').accepts(None));
    }

    #[test]
    fn test_chained_setters() {
        let opts = ParseOptions::strict()
            .alternates(AltSelection::PrimaryOnly)
            .default_crpix(CrpixDefault::Zero)
            .max_records(36);
        assert!(!opts.accept_legacy);
        assert_eq!(opts.alternates, AltSelection::PrimaryOnly);
        assert_eq!(opts.default_crpix, CrpixDefault::Zero);
        assert_eq!(opts.max_records, Some(36));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_fills_missing_fields() {
        let opts: ParseOptions = serde_json::from_str(r#"{"accept_legacy": false}"#).unwrap();
        assert!(!opts.accept_legacy);
        assert_eq!(opts.alternates, AltSelection::All);
        let text = serde_json::to_string(&opts).unwrap();
        let back: ParseOptions = serde_json::from_str(&text).unwrap();
        assert_eq!(back, opts);
    }
}
