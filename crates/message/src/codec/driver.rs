//! The completion driver: the single entry point while a message is received.
//!
//! Every call appends the new bytes to the raw buffer and runs the phases in
//! their fixed order, each one gated on the previous having finished:
//!
//! 1. status line
//! 2. header section, which also selects the body framing
//! 3. body, by `Content-Length` or chunked with trailers
//!
//! A phase that runs out of data leaves the cursor where it can resume, so
//! feeding a stream one byte at a time builds the same message as feeding
//! it in one piece.

use std::task::Poll;

use tracing::{debug, error, trace, warn};

use crate::codec::PayloadDecoder;
use crate::codec::header::decode_section;
use crate::codec::status_line::{self, StatusLine};
use crate::connection::{Socket, is_retryable};
use crate::protocol::headers::{CONTENT_LENGTH, TRANSFER_ENCODING};
use crate::protocol::{Headers, Message, MessageKind, ParseError, status_allows_body};

impl Message {
    /// Feeds `segment` into the message and, with a `source`, keeps receiving
    /// until the message is complete.
    ///
    /// Without a source the call never blocks and never fails: parsing stops
    /// when the available bytes run out and continues on the next call. With
    /// a source the driver receives into a scratch buffer of
    /// [`MessageConfig::receive_buffer_size`](crate::protocol::MessageConfig::receive_buffer_size)
    /// bytes until the message is complete or invalid, the source reports
    /// end of stream, or [`MessageConfig::max_receive_retries`](crate::protocol::MessageConfig::max_receive_retries)
    /// retryable errors occurred in a row.
    ///
    /// Malformed input does not fail the call, it turns the message
    /// [`Invalid`](MessageKind::Invalid). Returns the number of bytes consumed
    /// during this call.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Io`] when the source fails with an error that is
    /// not retryable.
    pub fn complete_from(&mut self, source: Option<&mut dyn Socket>, segment: &[u8]) -> Result<usize, ParseError> {
        if self.buffer.is_released() {
            trace!("ignoring bytes for a released message");
            return Ok(0);
        }

        let mut consumed = self.feed(segment);
        let Some(socket) = source else {
            return Ok(consumed);
        };

        let mut scratch = vec![0u8; self.config.receive_buffer_size()];
        let mut retries = 0;
        while !self.is_complete() && self.progress.invalid_reason.is_none() {
            match socket.receive(&mut scratch) {
                Ok(0) => {
                    debug!(consumed, "source reached end of stream");
                    break;
                }
                Ok(n) => {
                    retries = 0;
                    consumed += self.feed(&scratch[..n]);
                }
                Err(e) if is_retryable(e.kind()) => {
                    retries += 1;
                    if retries > self.config.max_receive_retries() {
                        debug!(retries, kind = ?e.kind(), "giving up after retryable receive errors");
                        break;
                    }
                    trace!(retries, kind = ?e.kind(), "retrying receive");
                }
                Err(e) => {
                    error!(cause = %e, "receive failed");
                    return Err(ParseError::io(e));
                }
            }
        }

        Ok(consumed)
    }

    /// Appends `segment` and advances parsing, returning how far the cursor moved.
    pub(crate) fn feed(&mut self, segment: &[u8]) -> usize {
        if self.buffer.is_released() {
            return 0;
        }
        self.buffer.extend(segment);
        self.advance()
    }

    fn advance(&mut self) -> usize {
        if self.progress.invalid_reason.is_some() {
            return 0;
        }

        let start = self.progress.cursor;
        if let Err(e) = self.advance_phases() {
            warn!(cause = %e, cursor = self.progress.cursor, "message is invalid");
            self.kind = MessageKind::Invalid;
            self.progress.invalid_reason = Some(e.to_string());
        }
        self.progress.cursor.saturating_sub(start)
    }

    fn advance_phases(&mut self) -> Result<(), ParseError> {
        if !self.progress.status_line_parsed && !self.parse_status_line()? {
            return Ok(());
        }
        if !self.progress.headers_parsed && !self.parse_headers()? {
            return Ok(());
        }
        self.parse_body()
    }

    fn parse_status_line(&mut self) -> Result<bool, ParseError> {
        let (poll, cursor) = status_line::decode(self.buffer.as_slice(), self.progress.cursor, &self.config);
        self.progress.cursor = cursor;

        let Poll::Ready(result) = poll else {
            return Ok(false);
        };

        let (line, header_offset) = result?;
        match line {
            StatusLine::Request { method, target, version } => {
                self.kind = MessageKind::Request;
                self.method = method;
                self.target = target;
                self.version = version;
            }
            StatusLine::Response { version, status, reason } => {
                self.kind = MessageKind::Response;
                self.version = version;
                self.status = status;
                self.reason = reason;
            }
        }

        self.progress.status_line_parsed = true;
        self.progress.header_offset = header_offset;
        self.progress.cursor = header_offset;
        debug!(kind = ?self.kind, header_offset, "status line parsed");
        Ok(true)
    }

    fn parse_headers(&mut self) -> Result<bool, ParseError> {
        let (poll, cursor) = decode_section(self.buffer.as_slice(), self.progress.cursor, &mut self.headers, &self.config);
        self.progress.cursor = cursor;

        let Poll::Ready(result) = poll else {
            return Ok(false);
        };
        result?;

        let payload = self.select_payload()?;
        debug!(header_count = self.headers.len(), content_length = self.content_length, "header section parsed");
        self.progress.payload = Some(payload);
        self.progress.headers_parsed = true;
        Ok(true)
    }

    /// Picks the body framing from the status and the parsed headers.
    ///
    /// Chunked transfer encoding wins over `Content-Length`; without either
    /// the body is empty.
    fn select_payload(&mut self) -> Result<PayloadDecoder, ParseError> {
        if self.kind == MessageKind::Response && !status_allows_body(self.status) {
            self.content_length = 0;
            return Ok(PayloadDecoder::empty());
        }

        if is_chunked(&self.headers) {
            self.content_length = -1;
            return Ok(PayloadDecoder::chunked());
        }

        match self.headers.get(CONTENT_LENGTH) {
            Some(value) => {
                let length = value
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| ParseError::malformed_header(format!("content length {value:?} is not u64: {e}")))?;
                self.content_length = i64::try_from(length)
                    .map_err(|e| ParseError::malformed_header(format!("content length {length} is too large: {e}")))?;
                Ok(PayloadDecoder::fix_length(length, self.config.skip_stray_terminators()))
            }
            None => {
                self.content_length = 0;
                Ok(PayloadDecoder::empty())
            }
        }
    }

    fn parse_body(&mut self) -> Result<(), ParseError> {
        let Some(decoder) = self.progress.payload.as_mut() else {
            return Ok(());
        };
        if decoder.is_finished() {
            return Ok(());
        }

        let (poll, cursor) = decoder.decode(
            self.buffer.as_slice(),
            self.progress.cursor,
            &mut self.body,
            &mut self.trailers,
            &self.config,
        );
        let chunked = decoder.is_chunked();
        self.progress.cursor = cursor;

        match poll {
            Poll::Ready(Ok(())) => {
                if chunked {
                    self.finish_chunked();
                }
                trace!(body_len = self.body.len(), "body complete");
                Ok(())
            }
            Poll::Ready(Err(e)) => Err(e),
            Poll::Pending => Ok(()),
        }
    }

    /// Turns a fully decoded chunked message into a `Content-Length` one.
    fn finish_chunked(&mut self) {
        self.headers.remove(TRANSFER_ENCODING);
        self.headers.insert(CONTENT_LENGTH, self.body.len().to_string());
        self.content_length = i64::try_from(self.body.len()).unwrap_or(i64::MAX);
        debug!(content_length = self.content_length, trailer_count = self.trailers.len(), "chunked body complete");
    }
}

/// Whether the last transfer coding is `chunked`.
fn is_chunked(headers: &Headers) -> bool {
    headers
        .get(TRANSFER_ENCODING)
        .and_then(|value| value.rsplit(',').next())
        .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
}
