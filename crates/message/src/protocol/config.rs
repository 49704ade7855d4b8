//! Parser and serializer settings shared by every message of one protocol.
//!
//! A single [`MessageConfig`] value describes which line protocol a message
//! speaks (`HTTP`, `RTSP`, `SIP`, ...) and the limits the incremental parser
//! enforces while bytes trickle in.

/// Protocol token used when nothing else is configured.
pub const DEFAULT_PROTOCOL: &str = "HTTP";

/// Maximum size in bytes of any single line: status line, header line or chunk size line.
///
/// It also bounds how many unconsumed bytes may pile up while a line that is
/// already terminated still refuses to parse.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// Maximum number of distinct header names in one header or trailer section
pub const MAX_HEADER_NUM: usize = 64;

/// Size of the scratch buffer used for each socket receive
pub const RECEIVE_BUFFER_SIZE: usize = 8 * 1024;

/// Consecutive retryable socket errors tolerated before giving the call back to the caller
pub const MAX_RECEIVE_RETRIES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageConfig {
    protocol: String,
    min_status_line: usize,
    max_line_bytes: usize,
    max_headers: usize,
    allow_invalid_headers: bool,
    strict_encoding: bool,
    skip_stray_terminators: bool,
    header_space: bool,
    receive_buffer_size: usize,
    max_receive_retries: usize,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            protocol: DEFAULT_PROTOCOL.to_owned(),
            min_status_line: min_status_line_for(DEFAULT_PROTOCOL),
            max_line_bytes: MAX_LINE_BYTES,
            max_headers: MAX_HEADER_NUM,
            allow_invalid_headers: false,
            strict_encoding: false,
            skip_stray_terminators: false,
            header_space: true,
            receive_buffer_size: RECEIVE_BUFFER_SIZE,
            max_receive_retries: MAX_RECEIVE_RETRIES,
        }
    }
}

/// The shortest status line is `TOKEN/X.X ` followed by a terminator.
fn min_status_line_for(protocol: &str) -> usize {
    protocol.len() + 5
}

impl MessageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches the protocol token, e.g. `RTSP` or `SIP`.
    ///
    /// The minimum status line length follows the token length.
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self.min_status_line = min_status_line_for(&self.protocol);
        self
    }

    #[must_use]
    pub fn with_min_status_line(mut self, min_status_line: usize) -> Self {
        self.min_status_line = min_status_line;
        self
    }

    #[must_use]
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    #[must_use]
    pub fn with_max_headers(mut self, max_headers: usize) -> Self {
        self.max_headers = max_headers;
        self
    }

    /// Keeps header lines whose name is empty or does not start with a letter.
    #[must_use]
    pub fn with_allow_invalid_headers(mut self, allow: bool) -> Self {
        self.allow_invalid_headers = allow;
        self
    }

    /// Makes an unknown body text encoding an error instead of falling back to the message default.
    #[must_use]
    pub fn with_strict_encoding(mut self, strict: bool) -> Self {
        self.strict_encoding = strict;
        self
    }

    /// Controls skipping of CR/LF bytes between the header section and the first body byte.
    ///
    /// Off by default: a body is free to start with a line terminator, and
    /// skipping would eat it. Only enable it for peers known to pad the end
    /// of the header section.
    #[must_use]
    pub fn with_skip_stray_terminators(mut self, skip: bool) -> Self {
        self.skip_stray_terminators = skip;
        self
    }

    /// Controls the single space written after `name:` when serializing headers.
    #[must_use]
    pub fn with_header_space(mut self, header_space: bool) -> Self {
        self.header_space = header_space;
        self
    }

    #[must_use]
    pub fn with_receive_buffer_size(mut self, size: usize) -> Self {
        self.receive_buffer_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_max_receive_retries(mut self, retries: usize) -> Self {
        self.max_receive_retries = retries;
        self
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn min_status_line(&self) -> usize {
        self.min_status_line
    }

    pub fn max_line_bytes(&self) -> usize {
        self.max_line_bytes
    }

    pub fn max_headers(&self) -> usize {
        self.max_headers
    }

    pub fn allow_invalid_headers(&self) -> bool {
        self.allow_invalid_headers
    }

    pub fn strict_encoding(&self) -> bool {
        self.strict_encoding
    }

    pub fn skip_stray_terminators(&self) -> bool {
        self.skip_stray_terminators
    }

    pub fn header_space(&self) -> bool {
        self.header_space
    }

    pub fn receive_buffer_size(&self) -> usize {
        self.receive_buffer_size
    }

    pub fn max_receive_retries(&self) -> usize {
        self.max_receive_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_bytes_are_kept_by_default() {
        assert!(!MessageConfig::default().skip_stray_terminators());
        assert!(MessageConfig::new().with_skip_stray_terminators(true).skip_stray_terminators());
    }

    #[test]
    fn protocol_drives_min_status_line() {
        assert_eq!(MessageConfig::default().min_status_line(), 9);
        assert_eq!(MessageConfig::new().with_protocol("RTSP").min_status_line(), 9);
        assert_eq!(MessageConfig::new().with_protocol("SIP").min_status_line(), 8);
    }

    #[test]
    fn explicit_min_status_line_wins_after_protocol() {
        let config = MessageConfig::new().with_protocol("SIP").with_min_status_line(12);
        assert_eq!(config.protocol(), "SIP");
        assert_eq!(config.min_status_line(), 12);
    }
}
