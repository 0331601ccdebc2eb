//! Turns a raw header buffer into coordinate-system descriptions.
//!
//! Parsing is best effort. A record that cannot be decomposed, a WCS-looking
//! keyword that breaks its pattern, or a value of the wrong kind is counted
//! as rejected and skipped. Only a structurally unreadable buffer fails the
//! whole call.

use tracing::{debug, warn};

use crate::config::ParseOptions;
use crate::description::CoordinateSystemDescription;
use crate::error::{ParseError, WcsError};
use crate::header::keyword::ValueKind;
use crate::header::record::split_records;
use crate::header::writer::is_wcs_keyword;
use crate::header::{Alt, HeaderRecord, KeywordMap, KeywordValue, WcsKeyword};

/// A record the parser could not use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Zero-based position in the header.
    pub index: usize,
    pub keyword: String,
    pub reason: String,
}

/// Everything recovered from one header.
#[derive(Debug, Clone)]
pub struct ParsedHeader {
    systems: Vec<CoordinateSystemDescription>,
    failures: Vec<(Alt, WcsError)>,
    rejections: Vec<RejectedRecord>,
    keywords: KeywordMap,
}

impl ParsedHeader {
    /// Descriptions in order of first appearance of their alternate.
    pub fn systems(&self) -> &[CoordinateSystemDescription] {
        &self.systems
    }

    pub fn into_systems(self) -> Vec<CoordinateSystemDescription> {
        self.systems
    }

    /// Alternates whose keywords could not be assembled at all.
    pub fn failures(&self) -> &[(Alt, WcsError)] {
        &self.failures
    }

    pub fn rejected_count(&self) -> usize {
        self.rejections.len()
    }

    pub fn rejections(&self) -> &[RejectedRecord] {
        &self.rejections
    }

    /// The interpreted WCS keywords, after duplicate resolution.
    pub fn keywords(&self) -> &KeywordMap {
        &self.keywords
    }
}

/// Parses the first `record_count` records of `header`.
///
/// Interpretation stops at an `END` card.
pub fn parse(
    header: &[u8],
    record_count: i32,
    opts: &ParseOptions,
) -> Result<ParsedHeader, ParseError> {
    let mut records = split_records(header, record_count)?;
    if let Some(limit) = opts.max_records {
        records.truncate(limit);
    }

    let mut collector = Collector {
        opts,
        keywords: KeywordMap::new(),
        alternates: Vec::new(),
        rejections: Vec::new(),
        duplicates: Vec::new(),
    };
    for (index, raw) in records.iter().enumerate() {
        if !collector.record(index, raw) {
            break;
        }
    }
    Ok(collector.finish())
}

struct Collector<'a> {
    opts: &'a ParseOptions,
    keywords: KeywordMap,
    /// Alternates in order of first appearance.
    alternates: Vec<Alt>,
    rejections: Vec<RejectedRecord>,
    duplicates: Vec<(Alt, String)>,
}

impl Collector<'_> {
    fn reject(&mut self, index: usize, keyword: impl Into<String>, reason: impl Into<String>) {
        let rejected = RejectedRecord {
            index,
            keyword: keyword.into(),
            reason: reason.into(),
        };
        debug!(
            index,
            keyword = %rejected.keyword,
            reason = %rejected.reason,
            "rejected header record"
        );
        self.rejections.push(rejected);
    }

    /// Returns false once the `END` card is reached.
    fn record(&mut self, index: usize, raw: &[u8]) -> bool {
        let record = match HeaderRecord::parse(raw) {
            Ok(record) => record,
            Err(e) => {
                let name = String::from_utf8_lossy(&raw[..raw.len().min(8)]).trim().to_string();
                self.reject(index, name, e.to_string());
                return true;
            }
        };
        if record.keyword == "END" {
            return false;
        }
        if record.is_commentary()
            || (self.opts.wcs_keywords_only && !is_wcs_keyword(&record.keyword))
        {
            return true;
        }

        let key = match WcsKeyword::parse(&record.keyword) {
            Ok(Some(key)) => key,
            Ok(None) => return true,
            Err(e) => {
                self.reject(index, record.keyword, e.to_string());
                return true;
            }
        };
        if key.is_legacy() && !self.opts.accept_legacy {
            self.reject(index, record.keyword, "legacy keyword not accepted");
            return true;
        }
        let Some(value) = record.value else {
            self.reject(index, record.keyword, "no value");
            return true;
        };
        if !kind_matches(key.value_kind(), &value) {
            let reason = format!("unexpected {} value", value.type_name());
            self.reject(index, record.keyword, reason);
            return true;
        }

        if !key.is_image_level() && !self.alternates.contains(&key.alt()) {
            self.alternates.push(key.alt());
        }
        let name = key.name();
        if let Some(previous) = self.keywords.insert(name.clone(), value.clone()) {
            if previous != value {
                let message =
                    format!("{name} repeated ({previous} then {value}), keeping the last value");
                warn!("{message}");
                self.duplicates.push((key.alt(), message));
            }
        }
        true
    }

    fn finish(self) -> ParsedHeader {
        let mut alternates = self.alternates;
        if alternates.is_empty() && self.keywords.contains("NAXIS") {
            alternates.push(None);
        }

        let mut systems = Vec::new();
        let mut failures = Vec::new();
        for alt in alternates.into_iter().filter(|&a| self.opts.alternates.accepts(a)) {
            match CoordinateSystemDescription::from_keywords(&self.keywords, alt, self.opts) {
                Ok(mut desc) => {
                    for (_, message) in self.duplicates.iter().filter(|(a, _)| *a == alt) {
                        desc.push_warning(message.clone());
                    }
                    systems.push(desc);
                }
                Err(e) => {
                    warn!(alt = ?alt, error = %e, "coordinate system could not be assembled");
                    failures.push((alt, e));
                }
            }
        }

        ParsedHeader {
            systems,
            failures,
            rejections: self.rejections,
            keywords: self.keywords,
        }
    }
}

fn kind_matches(kind: ValueKind, value: &KeywordValue) -> bool {
    match kind {
        ValueKind::Number => matches!(value, KeywordValue::Integer(_) | KeywordValue::Real(_)),
        ValueKind::Integer => matches!(value, KeywordValue::Integer(_)),
        ValueKind::Text => matches!(value, KeywordValue::String(_)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AltSelection;
    use crate::header::KeywordProvider;

    fn header(cards: &[&str]) -> Vec<u8> {
        cards.iter().flat_map(|c| format!("{c:<80}").into_bytes()).collect()
    }

    fn parse_cards(cards: &[&str], opts: &ParseOptions) -> ParsedHeader {
        parse(&header(cards), cards.len() as i32, opts).unwrap()
    }

    const TAN: &[&str] = &[
        "NAXIS   =                    2",
        "NAXIS1  =                 1024",
        "NAXIS2  =                 1024",
        "CTYPE1  = 'RA---TAN'",
        "CTYPE2  = 'DEC--TAN'",
        "CRPIX1  =                512.0",
        "CRPIX2  =                512.0",
        "CRVAL1  =                180.0",
        "CRVAL2  =                  0.0",
        "CDELT1  =      -2.777777778E-4",
        "CDELT2  =       2.777777778E-4",
    ];

    #[test]
    fn test_non_positive_count_fails() {
        let buf = header(TAN);
        assert_eq!(
            parse(&buf, 0, &ParseOptions::default()).unwrap_err(),
            ParseError::NonPositiveRecordCount(0)
        );
        assert!(parse(&buf, -3, &ParseOptions::default()).is_err());
    }

    #[test]
    fn test_simple_header() {
        let parsed = parse_cards(TAN, &ParseOptions::default());
        assert_eq!(parsed.systems().len(), 1);
        assert_eq!(parsed.rejected_count(), 0);
        let desc = &parsed.systems()[0];
        assert_eq!(desc.crpix(), &[512.0, 512.0]);
        assert!(desc.has_celestial());
    }

    #[test]
    fn test_garbled_records_are_counted() {
        let mut cards = TAN.to_vec();
        cards.insert(2, "CRPIX1Q2=                 12.0");
        cards.insert(4, "CRVAL1  = 'oops");
        cards.insert(6, "CDELT2  = 'text'");
        cards.push("OBJECT  = 'M31'");
        cards.push("COMMENT anything goes here");
        let parsed = parse_cards(&cards, &ParseOptions::default());
        assert_eq!(parsed.rejected_count(), 3);
        assert_eq!(parsed.rejections()[0].index, 2);
        assert_eq!(parsed.systems().len(), 1);
        assert!(parsed.systems()[0].has_celestial());
    }

    #[test]
    fn test_stops_at_end() {
        let mut cards = TAN.to_vec();
        cards.push("END");
        cards.push("CRVAL1  =                 10.0");
        let parsed = parse_cards(&cards, &ParseOptions::default());
        assert_eq!(parsed.systems()[0].crval()[0], 180.0);
    }

    #[test]
    fn test_alternates_in_order() {
        let cards = [
            "NAXIS   =                    2",
            "CTYPE1B = 'PIXEL'",
            "CTYPE1  = 'RA---TAN'",
            "CTYPE2  = 'DEC--TAN'",
            "CTYPE1A = 'GLON-CAR'",
            "CTYPE2A = 'GLAT-CAR'",
        ];
        let parsed = parse_cards(&cards, &ParseOptions::default());
        let alts: Vec<Alt> = parsed.systems().iter().map(|d| d.alt()).collect();
        assert_eq!(alts, vec![Some('B'), None, Some('A')]);

        let only_a = parse_cards(
            &cards,
            &ParseOptions::default().alternates(AltSelection::Only('A')),
        );
        assert_eq!(only_a.systems().len(), 1);
        assert_eq!(only_a.systems()[0].alt(), Some('A'));
    }

    #[test]
    fn test_naxis_only_gives_default_system() {
        let parsed = parse_cards(&["NAXIS   =                    2"], &ParseOptions::default());
        assert_eq!(parsed.systems().len(), 1);
        assert_eq!(parsed.systems()[0].axis_count(), 2);
        assert!(!parsed.systems()[0].has_celestial());

        let empty = parse_cards(&["OBJECT  = 'M31'"], &ParseOptions::default());
        assert!(empty.systems().is_empty());
    }

    #[test]
    fn test_duplicate_last_wins() {
        let mut cards = TAN.to_vec();
        cards.push("CRVAL1  =                181.0");
        let parsed = parse_cards(&cards, &ParseOptions::default());
        let desc = &parsed.systems()[0];
        assert_eq!(desc.crval()[0], 181.0);
        assert!(desc.warnings().iter().any(|w| w.contains("CRVAL1 repeated")));
    }

    #[test]
    fn test_strict_rejects_legacy() {
        let mut cards = TAN.to_vec();
        cards.push("CROTA2  =                 30.0");
        let lenient = parse_cards(&cards, &ParseOptions::default());
        assert_eq!(lenient.rejected_count(), 0);
        let strict = parse_cards(&cards, &ParseOptions::strict());
        assert_eq!(strict.rejected_count(), 1);
        assert_eq!(strict.rejections()[0].keyword, "CROTA2");
    }

    #[test]
    fn test_wcs_filter_skips_other_keywords() {
        let cards = [
            "NAXIS   =                    2",
            "CRPIX1Q2=                 12.0",
            "CTYPE1  = 'RA---TAN'",
        ];
        let plain = parse_cards(&cards, &ParseOptions::default());
        assert_eq!(plain.rejected_count(), 1);
        let filtered = parse_cards(&cards, &ParseOptions::default().wcs_keywords_only(true));
        assert_eq!(filtered.rejected_count(), 0);
        assert_eq!(filtered.keywords().get_string("CTYPE1").as_deref(), Some("RA---TAN"));
    }

    #[test]
    fn test_max_records() {
        let parsed = parse_cards(TAN, &ParseOptions::default().max_records(5));
        let desc = &parsed.systems()[0];
        assert_eq!(desc.crval(), &[0.0, 0.0]);
        assert_eq!(desc.crpix(), &[512.5, 512.5]);
    }

    #[test]
    fn test_newline_separated_records() {
        let text = TAN.join("\n");
        let parsed = parse(text.as_bytes(), TAN.len() as i32, &ParseOptions::default()).unwrap();
        assert_eq!(parsed.systems()[0].crval(), &[180.0, 0.0]);
    }

    #[test]
    fn test_truncated_buffer() {
        let buf = header(TAN);
        let err = parse(&buf, TAN.len() as i32 + 1, &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::Truncated { .. }));
    }

    #[test]
    fn test_out_of_range_wcsaxes_is_a_failure() {
        let cards = ["WCSAXESA=                  500", "CTYPE1  = 'RA---TAN'"];
        let parsed = parse_cards(&cards, &ParseOptions::default());
        assert_eq!(parsed.systems().len(), 1);
        assert_eq!(parsed.failures().len(), 1);
        assert_eq!(parsed.failures()[0].0, Some('A'));
    }
}
