//! Text encodings used to turn body bytes into text and back.
//!
//! The body itself is always stored as raw bytes, an encoding is only applied
//! when a caller asks for the body as text or sets it from text.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Ascii,
    Latin1,
}

impl TextEncoding {
    /// Looks up an encoding by its IANA label, ignoring case.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().trim_matches('"').to_ascii_lowercase();
        match label.as_str() {
            "utf-8" | "utf8" => Some(TextEncoding::Utf8),
            "us-ascii" | "ascii" => Some(TextEncoding::Ascii),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Some(TextEncoding::Latin1),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Ascii => "us-ascii",
            TextEncoding::Latin1 => "iso-8859-1",
        }
    }

    /// Decodes bytes, replacing anything the encoding cannot represent with U+FFFD.
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            TextEncoding::Ascii => {
                bytes.iter().map(|&b| if b.is_ascii() { char::from(b) } else { char::REPLACEMENT_CHARACTER }).collect()
            }
            TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
        }
    }

    /// Encodes text, replacing characters outside the encoding with `?`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Ascii => text.chars().map(|c| u8::try_from(c).ok().filter(u8::is_ascii).unwrap_or(b'?')).collect(),
            TextEncoding::Latin1 => text.chars().map(|c| u8::try_from(c).unwrap_or(b'?')).collect(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(TextEncoding::from_label("UTF-8"), Some(TextEncoding::Utf8));
        assert_eq!(TextEncoding::from_label(" \"ISO-8859-1\" "), Some(TextEncoding::Latin1));
        assert_eq!(TextEncoding::from_label("gzip"), None);
    }

    #[test]
    fn latin1_is_byte_exact() {
        let bytes: Vec<u8> = (0..=255).collect();
        let text = TextEncoding::Latin1.decode(&bytes);
        assert_eq!(TextEncoding::Latin1.encode(&text), bytes);
    }

    #[test]
    fn ascii_replaces_out_of_range() {
        assert_eq!(TextEncoding::Ascii.decode(b"a\xffb"), "a\u{fffd}b");
        assert_eq!(TextEncoding::Ascii.encode("aéb"), b"a?b");
    }
}
