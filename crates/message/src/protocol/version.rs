use std::fmt;

/// Protocol version as written after the protocol token, e.g. the `1.1` in `HTTP/1.1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    major: u16,
    minor: u16,
}

impl Version {
    pub const V1_0: Version = Version::new(1, 0);
    pub const V1_1: Version = Version::new(1, 1);
    pub const V2_0: Version = Version::new(2, 0);

    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    pub fn major(&self) -> u16 {
        self.major
    }

    pub fn minor(&self) -> u16 {
        self.minor
    }

    /// Extracts `major.minor` from text, skipping any stray non-digit characters.
    ///
    /// `"1.1"`, `"1.1x"` and `" 1 . 1"` all give `1.1`, a bare `"2"` gives `2.0`.
    /// Returns `None` when there are no major digits or a part overflows.
    pub fn parse_lenient(text: &str) -> Option<Self> {
        let mut parts = text.splitn(2, '.');
        let major = digits(parts.next()?)?;
        let minor = match parts.next() {
            Some(rest) => digits(rest.split('.').next().unwrap_or_default()).unwrap_or(0),
            None => 0,
        };
        Some(Self::new(major, minor))
    }
}

fn digits(text: &str) -> Option<u16> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

impl Default for Version {
    fn default() -> Self {
        Self::V1_1
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_parsing() {
        assert_eq!(Version::parse_lenient("1.1"), Some(Version::V1_1));
        assert_eq!(Version::parse_lenient("1.0x"), Some(Version::V1_0));
        assert_eq!(Version::parse_lenient("v2"), Some(Version::V2_0));
        assert_eq!(Version::parse_lenient("x1.y1"), Some(Version::V1_1));
        assert_eq!(Version::parse_lenient("X.X"), None);
        assert_eq!(Version::parse_lenient(""), None);
        assert_eq!(Version::parse_lenient("99999999.1"), None);
    }

    #[test]
    fn display() {
        assert_eq!(Version::V1_0.to_string(), "1.0");
        assert_eq!(Version::new(2, 10).to_string(), "2.10");
    }
}
