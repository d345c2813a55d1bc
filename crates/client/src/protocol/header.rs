//! Ordered response header collection.
//!
//! HTTP/1.1 allows a field name to appear more than once and servers still send
//! obsolete line folding, so the parsed block is kept as an ordered list of
//! `(name, value)` pairs rather than a map. Lookups are case-insensitive.

use http::{HeaderMap, HeaderName, HeaderValue};

use crate::utils::contains_ignore_ascii_case;

/// An ordered collection of header fields preserving duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, name: String, value: String) {
        self.entries.push((name, value));
    }

    /// Appends a folded continuation line to the most recent field.
    ///
    /// Returns false when there is no field to continue.
    pub(crate) fn continue_last(&mut self, continuation: &str) -> bool {
        match self.entries.last_mut() {
            Some((_, value)) => {
                if !value.is_empty() && !continuation.is_empty() {
                    value.push(' ');
                }
                value.push_str(continuation);
                true
            }
            None => false,
        }
    }

    /// Returns the value of the first field with this name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).next()
    }

    /// Returns the values of every field with this name, in arrival order.
    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.entries.iter().filter(move |(n, _)| n.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }

    /// Returns every value for this name joined with `", "`, or `None` when absent.
    pub fn get_joined(&self, name: &str) -> Option<String> {
        let values = self.get_all(name).collect::<Vec<_>>();
        (!values.is_empty()).then(|| values.join(", "))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get_all(name).next().is_some()
    }

    /// Checks whether any value of `name` contains `token`, ignoring ASCII case.
    pub fn contains_token(&self, name: &str, token: &str) -> bool {
        self.get_all(name).any(|value| contains_ignore_ascii_case(value, token))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts into an `http::HeaderMap`, dropping fields that are not valid there.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let (Ok(name), Ok(value)) = (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) else {
                continue;
            };
            map.append(name, value);
        }
        map
    }
}
