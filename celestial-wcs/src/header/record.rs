use std::fmt;

use thiserror::Error;

use crate::error::ParseError;

pub const CARD_SIZE: usize = 80;
const KEYWORD_WIDTH: usize = 8;

/// Why a single header record could not be decomposed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record is {0} columns long, at most 80 allowed")]
    TooLong(usize),

    #[error("non-printable byte 0x{byte:02x} at column {column}")]
    NonPrintable { byte: u8, column: usize },

    #[error("invalid keyword name '{0}'")]
    InvalidKeyword(String),

    #[error("unterminated string value")]
    UnterminatedString,

    #[error("unexpected text after string value: '{0}'")]
    TrailingText(String),

    #[error("unparsable value '{0}'")]
    InvalidValue(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeywordValue {
    Logical(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Complex(f64, f64),
}

impl KeywordValue {
    /// Numeric value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Logical(b) => Some(*b),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Logical(_) => "logical",
            Self::Integer(_) => "integer",
            Self::Real(_) => "real",
            Self::String(_) => "string",
            Self::Complex(..) => "complex",
        }
    }
}

/// Renders the value the way it appears after `= ` on a card.
impl fmt::Display for KeywordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Logical(true) => f.write_str("T"),
            Self::Logical(false) => f.write_str("F"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{}", format_real(*v)),
            Self::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
            Self::Complex(re, im) => write!(f, "({}, {})", format_real(*re), format_real(*im)),
        }
    }
}

/// Shortest representation that parses back to the same bits, always with a
/// decimal point or exponent so it cannot be mistaken for an integer.
fn format_real(v: f64) -> String {
    let s = format!("{v:?}");
    if s.contains(['.', 'e', 'E']) || !v.is_finite() {
        s
    } else {
        format!("{s}.0")
    }
}

/// One 80-column header card split into keyword, value and comment.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderRecord {
    pub keyword: String,
    pub value: Option<KeywordValue>,
    pub comment: Option<String>,
}

impl HeaderRecord {
    pub fn parse(raw: &[u8]) -> Result<Self, RecordError> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        if raw.len() > CARD_SIZE {
            return Err(RecordError::TooLong(raw.len()));
        }
        if let Some(column) = raw.iter().position(|b| !(0x20..=0x7e).contains(b)) {
            return Err(RecordError::NonPrintable {
                byte: raw[column],
                column: column + 1,
            });
        }
        // Every byte is printable ASCII from here on.
        let text: String = raw.iter().map(|&b| b as char).collect();

        let keyword_end = text.len().min(KEYWORD_WIDTH);
        let keyword = text[..keyword_end].trim_end().to_string();
        if !is_valid_keyword(&keyword) {
            return Err(RecordError::InvalidKeyword(keyword));
        }

        let has_value = text.len() >= 10 && &text[8..10] == "= ";
        if !has_value {
            let rest = text.get(KEYWORD_WIDTH..).unwrap_or("").trim();
            return Ok(Self {
                keyword,
                value: None,
                comment: non_empty(rest),
            });
        }

        let (value, comment) = split_value_field(&text[10..])?;
        Ok(Self {
            keyword,
            value,
            comment,
        })
    }

    /// Commentary and terminator cards carry nothing to interpret.
    pub fn is_commentary(&self) -> bool {
        matches!(self.keyword.as_str(), "" | "COMMENT" | "HISTORY" | "END")
    }
}

fn is_valid_keyword(keyword: &str) -> bool {
    if keyword.starts_with(' ') {
        return keyword.trim().is_empty();
    }
    keyword
        .bytes()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn split_value_field(field: &str) -> Result<(Option<KeywordValue>, Option<String>), RecordError> {
    let body = field.trim_start();
    if body.is_empty() {
        return Ok((None, None));
    }
    if let Some(comment) = body.strip_prefix('/') {
        return Ok((None, non_empty(comment)));
    }

    if let Some(quoted) = body.strip_prefix('\'') {
        let (text, rest) = read_quoted(quoted)?;
        let rest = rest.trim_start();
        let comment = if rest.is_empty() {
            None
        } else if let Some(c) = rest.strip_prefix('/') {
            non_empty(c)
        } else {
            return Err(RecordError::TrailingText(rest.trim_end().to_string()));
        };
        return Ok((Some(KeywordValue::String(text)), comment));
    }

    let (token, comment) = match body.find('/') {
        Some(pos) => (body[..pos].trim(), non_empty(&body[pos + 1..])),
        None => (body.trim(), None),
    };
    Ok((Some(parse_token(token)?), comment))
}

/// Reads a quoted string whose opening quote has been consumed. Returns the
/// unescaped text with trailing blanks removed, and whatever follows the
/// closing quote.
fn read_quoted(s: &str) -> Result<(String, &str), RecordError> {
    let mut out = String::new();
    let mut chars = s.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if let Some(&(_, '\'')) = chars.peek() {
                out.push('\'');
                chars.next();
                continue;
            }
            return Ok((out.trim_end().to_string(), &s[i + 1..]));
        }
        out.push(c);
    }
    Err(RecordError::UnterminatedString)
}

fn parse_token(token: &str) -> Result<KeywordValue, RecordError> {
    match token {
        "T" => return Ok(KeywordValue::Logical(true)),
        "F" => return Ok(KeywordValue::Logical(false)),
        _ => {}
    }
    if let Some(inner) = token.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        let mut parts = inner.split(',');
        if let (Some(re), Some(im), None) = (parts.next(), parts.next(), parts.next()) {
            if let (Some(re), Some(im)) = (parse_real(re.trim()), parse_real(im.trim())) {
                return Ok(KeywordValue::Complex(re, im));
            }
        }
        return Err(RecordError::InvalidValue(token.to_string()));
    }
    if let Ok(v) = token.parse::<i64>() {
        return Ok(KeywordValue::Integer(v));
    }
    parse_real(token)
        .map(KeywordValue::Real)
        .ok_or_else(|| RecordError::InvalidValue(token.to_string()))
}

/// Accepts the Fortran `D` exponent marker. Rejects `inf`/`nan` spellings,
/// which are not FITS numbers, and literals that overflow `f64`.
fn parse_real(token: &str) -> Option<f64> {
    if token.is_empty() || token.bytes().any(|b| b.is_ascii_alphabetic() && !b"EeDd".contains(&b)) {
        return None;
    }
    token
        .replace(['D', 'd'], "E")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Splits a raw header buffer into records.
///
/// Buffers containing line feeds are split per line; anything else is cut
/// into 80-byte cards. Only the first `record_count` records are returned.
pub fn split_records(header: &[u8], record_count: i32) -> Result<Vec<&[u8]>, ParseError> {
    if record_count <= 0 {
        return Err(ParseError::NonPositiveRecordCount(i64::from(record_count)));
    }
    let expected = record_count as usize;

    let records: Vec<&[u8]> = if header.contains(&b'\n') {
        let body = header.strip_suffix(b"\n").unwrap_or(header);
        body.split(|&b| b == b'\n').collect()
    } else {
        header.chunks(CARD_SIZE).collect()
    };

    if records.len() < expected {
        return Err(ParseError::Truncated {
            expected,
            available: records.len(),
        });
    }
    Ok(records.into_iter().take(expected).collect())
}
