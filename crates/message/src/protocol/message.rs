//! The message model shared by the parser and the serializer.
//!
//! A [`Message`] is either a request, a response, or invalid. Inbound
//! messages start out [`MessageKind::Invalid`] and are filled in place by
//! [`Message::complete_from`] as bytes arrive. Outbound messages are built
//! with [`Message::request`] or [`Message::response`] and turned into wire
//! bytes with [`Message::to_bytes`].
//!
//! # Example
//!
//! ```
//! use micro_message::protocol::Message;
//!
//! let mut message = Message::default();
//! message.complete_from(None, b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhel").unwrap();
//! assert!(!message.is_complete());
//! ```

use std::convert::Infallible;
use std::str::FromStr;
use std::time::SystemTime;

use bytes::{Bytes, BytesMut};
use http::{StatusCode, Uri};
use mime::Mime;
use tracing::warn;

use crate::codec::PayloadDecoder;
use crate::codec::RawBuffer;
use crate::protocol::headers::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use crate::protocol::{Headers, MessageConfig, Method, ParseError, SendError, TextEncoding, Version, is_valid_name};
use crate::utils::ensure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Request,
    Response,
    /// Nothing parsed yet, or the bytes received so far can never form a message
    Invalid,
}

/// Whether a received response with `status` may carry a body: `1xx`, `204` and `304` may not.
///
/// This decides framing only. A `302` on the wire may still announce a body,
/// and it has to be read to find where the next message starts.
pub fn status_allows_body(status: u16) -> bool {
    !(100..200).contains(&status) && status != 204 && status != 304
}

/// Whether a body may be set on an outbound response with `status`.
///
/// Stricter than [`status_allows_body`]: a redirect found at `302` carries
/// no content of its own either.
pub fn status_accepts_body(status: u16) -> bool {
    status_allows_body(status) && status != 302
}

/// How far the incremental parser has come.
#[derive(Debug, Clone, Default)]
pub(crate) struct ParseProgress {
    pub(crate) status_line_parsed: bool,
    pub(crate) headers_parsed: bool,
    /// Offset in the raw buffer where the header section starts
    pub(crate) header_offset: usize,
    /// Offset in the raw buffer of the first unconsumed byte
    pub(crate) cursor: usize,
    /// Chosen once the header section is parsed
    pub(crate) payload: Option<PayloadDecoder>,
    /// Set when the message became permanently invalid
    pub(crate) invalid_reason: Option<String>,
}

/// A request or response of a line oriented protocol such as HTTP, RTSP or SIP.
#[derive(Debug, Clone)]
pub struct Message {
    pub(crate) kind: MessageKind,
    pub(crate) config: MessageConfig,
    pub(crate) version: Version,
    pub(crate) method: String,
    pub(crate) target: String,
    pub(crate) status: u16,
    pub(crate) reason: Option<String>,
    pub(crate) headers: Headers,
    pub(crate) trailers: Headers,
    pub(crate) body: BytesMut,
    pub(crate) content_length: i64,
    pub(crate) encoding: TextEncoding,
    pub(crate) progress: ParseProgress,
    pub(crate) buffer: RawBuffer,
    created_at: SystemTime,
    transferred_at: Option<SystemTime>,
    persistent: bool,
}

impl Message {
    /// Creates an empty outbound message of the given kind.
    ///
    /// The status line and headers count as parsed and the body is explicitly
    /// empty, so the message is complete as soon as it is a request or response.
    pub fn new(kind: MessageKind, version: Version) -> Self {
        let mut message = Self::inbound(MessageConfig::default());
        message.kind = kind;
        message.version = version;
        message.content_length = 0;
        message.progress.status_line_parsed = true;
        message.progress.headers_parsed = true;
        message
    }

    /// Creates an empty message waiting for bytes, see [`Message::complete_from`].
    pub fn inbound(config: MessageConfig) -> Self {
        Self {
            kind: MessageKind::Invalid,
            config,
            version: Version::default(),
            method: String::new(),
            target: String::new(),
            status: 0,
            reason: None,
            headers: Headers::new(),
            trailers: Headers::new(),
            body: BytesMut::new(),
            content_length: -1,
            encoding: TextEncoding::default(),
            progress: ParseProgress::default(),
            buffer: RawBuffer::default(),
            created_at: SystemTime::now(),
            transferred_at: None,
            persistent: false,
        }
    }

    /// Parses as much of `data` as possible with the default configuration.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self::from_bytes_with(data, MessageConfig::default(), TextEncoding::default())
    }

    pub fn from_bytes_with(data: &[u8], config: MessageConfig, encoding: TextEncoding) -> Self {
        let mut message = Self::inbound(config).with_encoding(encoding);
        message.feed(data);
        message
    }

    /// Builds an outbound request, validating the method token and the target.
    pub fn request(method: &str, target: &str) -> Result<Self, SendError> {
        let mut message = Self::new(MessageKind::Request, Version::V1_1);
        message.set_method(method)?;
        message.set_target(target)?;
        Ok(message)
    }

    /// Builds an outbound response carrying the canonical reason phrase of `status`, if there is one.
    pub fn response(status: u16) -> Self {
        let mut message = Self::new(MessageKind::Response, Version::V1_1);
        message.set_status(status);
        message
    }

    #[must_use]
    pub fn with_config(mut self, config: MessageConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the text encoding used when the headers do not name one.
    #[must_use]
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Deep copy of `other` with fresh timestamps.
    pub fn copy_of(other: &Message) -> Self {
        let mut copy = other.clone();
        copy.created_at = SystemTime::now();
        copy.transferred_at = None;
        copy
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn is_request(&self) -> bool {
        self.kind == MessageKind::Request
    }

    pub fn is_response(&self) -> bool {
        self.kind == MessageKind::Response
    }

    pub fn is_invalid(&self) -> bool {
        self.kind == MessageKind::Invalid
    }

    /// Why the message became permanently invalid, `None` while it may still parse.
    pub fn invalid_reason(&self) -> Option<&str> {
        self.progress.invalid_reason.as_deref()
    }

    pub fn config(&self) -> &MessageConfig {
        &self.config
    }

    pub fn protocol(&self) -> &str {
        self.config.protocol()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// The request method as received, e.g. `DESCRIBE`.
    pub fn method_text(&self) -> &str {
        &self.method
    }

    /// The request method if it is a known verb.
    pub fn method(&self) -> Option<Method> {
        self.method.parse().ok()
    }

    pub fn set_method(&mut self, method: &str) -> Result<(), SendError> {
        ensure!(
            !method.is_empty() && !method.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()),
            SendError::invalid_message(format!("method {method:?} is not a single token"))
        );
        method.clone_into(&mut self.method);
        Ok(())
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn set_target(&mut self, target: &str) -> Result<(), SendError> {
        Uri::try_from(target).map_err(|e| SendError::invalid_target(format!("{target:?}: {e}")))?;
        target.clone_into(&mut self.target);
        Ok(())
    }

    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Sets the status code along with its canonical reason phrase.
    pub fn set_status(&mut self, status: u16) {
        self.status = status;
        self.reason = StatusCode::from_u16(status).ok().and_then(|s| s.canonical_reason()).map(str::to_owned);
    }

    pub fn reason_phrase(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.reason = Some(reason.into());
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn contains_header(&self, name: &str) -> bool {
        self.headers.contains(name)
    }

    /// Inserts or overwrites a header, returning the previous value.
    ///
    /// Setting `Content-Length` also updates [`Message::content_length`].
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<Option<String>, SendError> {
        validate_header(name, value)?;
        if name.eq_ignore_ascii_case(CONTENT_LENGTH) {
            self.content_length = parse_content_length(value)?;
        }
        Ok(self.headers.insert(name, value))
    }

    /// Appends to an existing header value with `separator`, or inserts the header.
    pub fn append_header(&mut self, name: &str, value: &str, separator: &str) -> Result<(), SendError> {
        if name.eq_ignore_ascii_case(CONTENT_LENGTH) {
            return self.set_header(name, value).map(|_| ());
        }
        validate_header(name, value)?;
        self.headers.append(name, value, separator);
        Ok(())
    }

    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let removed = self.headers.remove(name)?;
        if name.eq_ignore_ascii_case(CONTENT_LENGTH) {
            self.content_length = if self.progress.headers_parsed { 0 } else { -1 };
        }
        Some(removed)
    }

    pub fn trailers(&self) -> &Headers {
        &self.trailers
    }

    pub fn trailer(&self, name: &str) -> Option<&str> {
        self.trailers.get(name)
    }

    pub fn contains_trailer(&self, name: &str) -> bool {
        self.trailers.contains(name)
    }

    pub fn set_trailer(&mut self, name: &str, value: &str) -> Result<Option<String>, SendError> {
        validate_header(name, value)?;
        Ok(self.trailers.insert(name, value))
    }

    pub fn remove_trailer(&mut self, name: &str) -> Option<String> {
        self.trailers.remove(name)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Replaces the body and sets `Content-Length` to its size.
    ///
    /// Any `Transfer-Encoding` header is dropped since the body is now
    /// complete. Fails for invalid messages and for a non-empty body on a
    /// response whose status forbids one.
    pub fn set_body(&mut self, body: impl Into<Bytes>) -> Result<(), SendError> {
        let body = body.into();
        ensure!(!self.is_invalid(), SendError::invalid_message("cannot set the body of an invalid message"));
        ensure!(
            body.is_empty() || !self.is_response() || status_accepts_body(self.status),
            SendError::body_forbidden(self.status)
        );

        self.headers.remove(TRANSFER_ENCODING);
        self.headers.insert(CONTENT_LENGTH, body.len().to_string());
        self.content_length = i64::try_from(body.len()).unwrap_or(i64::MAX);
        self.body = BytesMut::from(&body[..]);
        Ok(())
    }

    /// Encodes `text` with the message encoding and sets it as the body.
    ///
    /// A non UTF-8 encoding is announced with a `Content-Encoding` header.
    pub fn set_body_text(&mut self, text: &str) -> Result<(), SendError> {
        self.set_body(self.encoding.encode(text))?;
        if self.encoding == TextEncoding::Utf8 {
            self.headers.remove(CONTENT_ENCODING);
        } else {
            self.headers.insert(CONTENT_ENCODING, self.encoding.label());
        }
        Ok(())
    }

    /// The encoding used to read the body as text.
    ///
    /// Taken from `Content-Encoding`, else from the `charset` parameter of
    /// `Content-Type`, else the message default. An unknown label is an error
    /// with [`MessageConfig::with_strict_encoding`] and falls back to the
    /// message default otherwise.
    pub fn text_encoding(&self) -> Result<TextEncoding, ParseError> {
        let label = match self.headers.get(CONTENT_ENCODING) {
            Some(label) => Some(label.to_owned()),
            None => self
                .headers
                .get(CONTENT_TYPE)
                .and_then(|value| value.parse::<Mime>().ok())
                .and_then(|content_type| content_type.get_param(mime::CHARSET).map(|charset| charset.as_str().to_owned())),
        };

        let Some(label) = label else {
            return Ok(self.encoding);
        };

        match TextEncoding::from_label(&label) {
            Some(encoding) => Ok(encoding),
            None if self.config.strict_encoding() => Err(ParseError::unsupported_content_encoding(label)),
            None => {
                warn!(label, fallback = %self.encoding, "unsupported content encoding");
                Ok(self.encoding)
            }
        }
    }

    pub fn body_text(&self) -> Result<String, ParseError> {
        Ok(self.text_encoding()?.decode(&self.body))
    }

    /// Declared body length: `-1` while unknown, `0` for an explicitly empty body.
    pub fn content_length(&self) -> i64 {
        self.content_length
    }

    pub fn status_line_parsed(&self) -> bool {
        self.progress.status_line_parsed
    }

    pub fn headers_parsed(&self) -> bool {
        self.progress.headers_parsed
    }

    /// Offset in the raw buffer where the header section starts.
    pub fn header_offset(&self) -> usize {
        self.progress.header_offset
    }

    /// Whether the whole message, body included, has been received.
    pub fn is_complete(&self) -> bool {
        if self.is_invalid() || !self.progress.headers_parsed {
            return false;
        }

        match &self.progress.payload {
            Some(decoder) if decoder.is_chunked() => decoder.is_finished(),
            _ => self.content_length <= 0 || i64::try_from(self.body.len()).is_ok_and(|len| len >= self.content_length),
        }
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn transferred_at(&self) -> Option<SystemTime> {
        self.transferred_at
    }

    /// Records the hand-over to a transport. Only the first call has an effect.
    pub fn mark_transferred(&mut self) -> bool {
        if self.transferred_at.is_some() {
            return false;
        }
        self.transferred_at = Some(SystemTime::now());
        true
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// A persistent message keeps its raw buffer when [`Message::release`] is called.
    pub fn set_persistent(&mut self, persistent: bool) {
        self.persistent = persistent;
    }

    /// Drops the raw buffer unless the message is persistent.
    ///
    /// Parsing a released message is a no-op.
    pub fn release(&mut self) -> bool {
        if self.persistent {
            return false;
        }
        self.buffer.release();
        true
    }

    pub fn is_released(&self) -> bool {
        self.buffer.is_released()
    }

    /// Every byte received so far, consumed or not.
    pub fn raw_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Bytes received but not consumed, e.g. the start of a pipelined message.
    pub fn remaining(&self) -> &[u8] {
        let raw = self.buffer.as_slice();
        &raw[self.progress.cursor.min(raw.len())..]
    }

    /// Cuts the unconsumed bytes out of the raw buffer.
    pub fn take_remaining(&mut self) -> Bytes {
        self.buffer.split_off(self.progress.cursor)
    }
}

fn validate_header(name: &str, value: &str) -> Result<(), SendError> {
    ensure!(
        is_valid_name(name) && !name.bytes().any(|b| b == b':' || b.is_ascii_whitespace() || b.is_ascii_control()),
        SendError::invalid_header(format!("invalid header name {name:?}"))
    );
    ensure!(
        !value.bytes().any(|b| b == b'\r' || b == b'\n'),
        SendError::invalid_header(format!("header {name} value contains a line terminator"))
    );
    Ok(())
}

fn parse_content_length(value: &str) -> Result<i64, SendError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .and_then(|length| i64::try_from(length).ok())
        .ok_or_else(|| SendError::invalid_header(format!("invalid content length {value:?}")))
}

impl Default for Message {
    fn default() -> Self {
        Self::inbound(MessageConfig::default())
    }
}

/// Parses literal message text, mostly useful in tests.
impl FromStr for Message {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_bytes(s.as_bytes()))
    }
}

/// Messages are equal when kind, protocol, version, the status line fields
/// of their kind, the header set and the body match.
impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        let line_eq = match self.kind {
            MessageKind::Request => self.method == other.method && self.target == other.target,
            MessageKind::Response => self.status == other.status,
            MessageKind::Invalid => true,
        };

        self.kind == other.kind
            && self.protocol() == other.protocol()
            && self.version == other.version
            && line_eq
            && self.headers == other.headers
            && self.body == other.body
    }
}
