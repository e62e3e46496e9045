//! Ordered query parameter sets.
//!
//! A [`QueryParams`] keeps insertion order so serialization is deterministic.
//! Values are kept verbatim: parsing splits on `&` and `=` without decoding,
//! and serialization joins them back unchanged.

use indexmap::IndexMap;
use std::fmt;

/// Ordered mapping from parameter name to value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(IndexMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `key=value&key=value` string. A leading `?` is ignored, empty
    /// pairs are skipped, a key without `=` gets an empty value, and a
    /// repeated key keeps its first position with the last value.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if key.is_empty() {
                continue;
            }
            params.insert(key, value);
        }
        params
    }

    /// Insert or replace a value. Replacing keeps the key's position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay `other` on top of `self`: shared keys take `other`'s value at
    /// `self`'s position, new keys follow in `other`'s order.
    pub fn overlay(mut self, other: &QueryParams) -> Self {
        for (key, value) in other.iter() {
            self.insert(key, value);
        }
        self
    }

    /// Serialize as `key=value` pairs joined with `&`.
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Append this set to `url` with [`append_query`]. An empty set leaves the
    /// URL untouched.
    pub fn append_to(&self, url: &str) -> String {
        if self.is_empty() {
            return url.to_string();
        }
        append_query(url, &self.serialize())
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Merge an embedded query string (from a size specifier) with explicit
/// parameters. Explicit values win.
pub fn merge(embedded: Option<&str>, explicit: &QueryParams) -> QueryParams {
    match embedded {
        Some(query) => QueryParams::parse(query).overlay(explicit),
        None => explicit.clone(),
    }
}

/// Append a serialized query to a URL, using `?` when the URL has none yet
/// and `&` otherwise.
pub fn append_query(url: &str, query: &str) -> String {
    let op = if url.contains('?') { '&' } else { '?' };
    format!("{url}{op}{query}")
}
