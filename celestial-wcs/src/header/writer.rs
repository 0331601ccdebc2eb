//! Rendering keywords as fixed-format header cards.
//!
//! Cards follow the FITS fixed layout: keyword in columns 1–8, `= ` in
//! columns 9–10, strings starting at column 11 and other values right
//! aligned to column 30. Output from [`format_header`] can be fed straight
//! back into [`crate::parser::parse`].

use super::keyword::WcsKeyword;
use super::record::{KeywordValue, CARD_SIZE};
use crate::error::{WcsError, WcsResult};

const FIXED_VALUE_END: usize = 30;

pub fn format_card(
    keyword: &str,
    value: &KeywordValue,
    comment: Option<&str>,
) -> WcsResult<String> {
    if keyword.is_empty() || keyword.len() > 8 {
        return Err(WcsError::invalid_keyword(keyword, "keyword must be 1-8 characters"));
    }

    let rendered = value.to_string();
    let mut card = format!("{keyword:<8}= ");
    if matches!(value, KeywordValue::String(_)) {
        card.push_str(&rendered);
    } else {
        card.push_str(&format!("{rendered:>width$}", width = FIXED_VALUE_END - 10));
    }
    if card.len() > CARD_SIZE {
        return Err(WcsError::invalid_keyword(keyword, "value does not fit on one card"));
    }

    if let Some(comment) = comment.filter(|c| !c.is_empty()) {
        let room = CARD_SIZE.saturating_sub(card.len() + 3);
        if room > 0 {
            card.push_str(" / ");
            card.extend(
                comment
                    .chars()
                    .filter(|c| c.is_ascii() && !c.is_ascii_control())
                    .take(room),
            );
        }
    }
    Ok(format!("{card:<width$}", width = CARD_SIZE))
}

/// Concatenates cards for every keyword, optionally closing with `END`.
pub fn format_header<'a, I>(keywords: I, terminate: bool) -> WcsResult<String>
where
    I: IntoIterator<Item = (&'a str, &'a KeywordValue)>,
{
    let mut out = String::new();
    for (name, value) in keywords {
        out.push_str(&format_card(name, value, None)?);
    }
    if terminate {
        out.push_str(&format!("{:<width$}", "END", width = CARD_SIZE));
    }
    Ok(out)
}

/// True for keywords that can influence a coordinate system, including
/// `DATE-OBS` and the SIP distortion keywords.
pub fn is_wcs_keyword(name: &str) -> bool {
    name == "DATE-OBS" || matches!(WcsKeyword::parse(name), Ok(Some(_)))
}

/// Keeps only the keywords [`is_wcs_keyword`] accepts.
pub fn filter_wcs<'a, I>(keywords: I) -> impl Iterator<Item = (&'a str, &'a KeywordValue)>
where
    I: IntoIterator<Item = (&'a str, &'a KeywordValue)>,
{
    keywords.into_iter().filter(|(name, _)| is_wcs_keyword(name))
}
