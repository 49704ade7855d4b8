//! Ordered, case-insensitive header storage.
//!
//! Header names keep the case they were first inserted with, lookups ignore
//! ASCII case. Entries are kept in insertion order so serialization writes
//! them back in the order they arrived.

use std::collections::HashMap;

pub const CONTENT_LENGTH: &str = "Content-Length";
pub const CONTENT_ENCODING: &str = "Content-Encoding";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const TRANSFER_ENCODING: &str = "Transfer-Encoding";

#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

fn normalize(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// A header name is valid when it is non-empty and starts with an ASCII letter.
pub fn is_valid_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.index.get(&normalize(name)).map(|&i| self.entries[i].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&normalize(name))
    }

    /// Inserts or overwrites a header.
    ///
    /// An existing entry keeps its position and original name, only its value
    /// changes. Returns the previous value if there was one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        let key = normalize(&name);
        match self.index.get(&key) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((name, value));
                None
            }
        }
    }

    /// Appends `value` to an existing header using `separator`, or inserts it.
    pub fn append(&mut self, name: impl Into<String>, value: &str, separator: &str) {
        let name = name.into();
        match self.index.get(&normalize(&name)) {
            Some(&i) => {
                let current = &mut self.entries[i].1;
                current.push_str(separator);
                current.push_str(value);
            }
            None => {
                self.insert(name, value);
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let removed = self.index.remove(&normalize(name))?;
        let (_, value) = self.entries.remove(removed);
        for position in self.index.values_mut() {
            if *position > removed {
                *position -= 1;
            }
        }
        Some(value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    /// Iterates `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Two header maps are equal when they hold the same names (ignoring case) with the same values.
impl PartialEq for Headers {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(name, value)| other.get(name) == Some(value))
    }
}

impl Eq for Headers {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case_and_keeps_first_name() {
        let mut headers = Headers::new();
        headers.insert("CSeq", "1");
        assert_eq!(headers.get("cseq"), Some("1"));
        assert_eq!(headers.insert("CSEQ", "2"), Some("1".to_owned()));

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.iter().next(), Some(("CSeq", "2")));
    }

    #[test]
    fn keeps_insertion_order_across_removal() {
        let mut headers = Headers::new();
        headers.insert("A", "1");
        headers.insert("B", "2");
        headers.insert("C", "3");

        assert_eq!(headers.remove("b"), Some("2".to_owned()));
        assert_eq!(headers.remove("b"), None);
        headers.insert("D", "4");

        let names: Vec<&str> = headers.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["A", "C", "D"]);
        assert_eq!(headers.get("c"), Some("3"));
        assert_eq!(headers.get("D"), Some("4"));
    }

    #[test]
    fn append_uses_separator() {
        let mut headers = Headers::new();
        headers.append("Accept", "text/html", ", ");
        headers.append("accept", "application/sdp", ", ");
        assert_eq!(headers.get("ACCEPT"), Some("text/html, application/sdp"));
    }

    #[test]
    fn equality_ignores_order_and_name_case() {
        let mut left = Headers::new();
        left.insert("Host", "a");
        left.insert("Accept", "*/*");

        let mut right = Headers::new();
        right.insert("accept", "*/*");
        right.insert("HOST", "a");

        assert_eq!(left, right);
        right.insert("host", "b");
        assert_ne!(left, right);
    }

    #[test]
    fn name_validation() {
        assert!(is_valid_name("Content-Length"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("1abc"));
        assert!(!is_valid_name(" x"));
    }
}
