//! Header records and keyword access.
//!
//! [`record`] decomposes raw 80-column cards, [`keyword`] recognises WCS
//! keyword names, and [`writer`] renders keywords back into cards.
//! [`KeywordMap`] is the ordered keyword store the description assembler
//! reads through [`KeywordProvider`].

use std::collections::HashMap;

use crate::error::{WcsError, WcsResult};

pub mod keyword;
pub mod record;
pub mod writer;

pub use keyword::{Alt, SipSeries, WcsKeyword};
pub use record::{HeaderRecord, KeywordValue, RecordError};

pub trait KeywordProvider {
    fn get_value(&self, key: &str) -> Option<&KeywordValue>;

    /// Keyword names in first-seen order.
    fn names(&self) -> Box<dyn Iterator<Item = &str> + '_>;

    fn get_string(&self, key: &str) -> Option<String> {
        self.get_value(key)?.as_str().map(str::to_string)
    }

    fn get_float(&self, key: &str) -> Option<f64> {
        self.get_value(key)?.as_f64()
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        self.get_value(key)?.as_i64()
    }

    fn require_float(&self, key: &str) -> WcsResult<f64> {
        self.get_float(key)
            .ok_or_else(|| WcsError::missing_keyword(key))
    }

    fn require_string(&self, key: &str) -> WcsResult<String> {
        self.get_string(key)
            .ok_or_else(|| WcsError::missing_keyword(key))
    }
}

/// Insertion-ordered keyword store. A repeated keyword keeps its original
/// position and takes the newer value.
#[derive(Debug, Clone, Default)]
pub struct KeywordMap {
    entries: Vec<(String, KeywordValue)>,
    index: HashMap<String, usize>,
}

impl KeywordMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: KeywordValue) -> Option<KeywordValue> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.insert(key, KeywordValue::String(value.into()));
        self
    }

    pub fn set_float(&mut self, key: impl Into<String>, value: f64) -> &mut Self {
        self.insert(key, KeywordValue::Real(value));
        self
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) -> &mut Self {
        self.insert(key, KeywordValue::Integer(value));
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeywordValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl KeywordProvider for KeywordMap {
    fn get_value(&self, key: &str) -> Option<&KeywordValue> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    fn names(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.entries.iter().map(|(k, _)| k.as_str()))
    }
}
