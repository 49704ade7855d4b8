//! Unified body decoding.
//!
//! The framing is chosen once the header section is parsed:
//! - Content-Length based payloads
//! - Chunked transfer encoding
//! - Messages with no body

use std::task::Poll;

use bytes::BytesMut;

use crate::codec::body::chunked_decoder::ChunkedDecoder;
use crate::codec::body::length_decoder::LengthDecoder;
use crate::protocol::{Headers, MessageConfig, ParseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PayloadDecoder {
    /// The specific decoding strategy to use
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Decode payload with a fixed content length
    Length(LengthDecoder),

    /// Decode payload using chunked transfer encoding
    Chunked(ChunkedDecoder),

    /// Handle messages with no body
    NoBody,
}

impl PayloadDecoder {
    pub(crate) fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub(crate) fn chunked() -> Self {
        Self { kind: Kind::Chunked(ChunkedDecoder::new()) }
    }

    pub(crate) fn fix_length(size: u64, skip_stray_terminators: bool) -> Self {
        Self { kind: Kind::Length(LengthDecoder::new(size, skip_stray_terminators)) }
    }

    pub(crate) fn is_chunked(&self) -> bool {
        matches!(self.kind, Kind::Chunked(_))
    }

    /// Whether the body has been read completely.
    pub(crate) fn is_finished(&self) -> bool {
        match &self.kind {
            Kind::Length(length_decoder) => length_decoder.remaining() == 0,
            Kind::Chunked(chunked_decoder) => chunked_decoder.is_finished(),
            Kind::NoBody => true,
        }
    }

    /// Delegates to the decoder for the chosen framing.
    pub(crate) fn decode(
        &mut self,
        buf: &[u8],
        cursor: usize,
        body: &mut BytesMut,
        trailers: &mut Headers,
        config: &MessageConfig,
    ) -> (Poll<Result<(), ParseError>>, usize) {
        match &mut self.kind {
            Kind::Length(length_decoder) => length_decoder.decode(buf, cursor, body),
            Kind::Chunked(chunked_decoder) => chunked_decoder.decode(buf, cursor, body, trailers, config),
            Kind::NoBody => (Poll::Ready(Ok(())), cursor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_body_is_finished() {
        let mut decoder = PayloadDecoder::empty();
        assert!(decoder.is_finished());
        let (poll, cursor) =
            decoder.decode(b"left over", 0, &mut BytesMut::new(), &mut Headers::new(), &MessageConfig::default());
        assert!(matches!(poll, Poll::Ready(Ok(()))));
        assert_eq!(cursor, 0);
    }

    #[test]
    fn strategies() {
        assert!(PayloadDecoder::chunked().is_chunked());
        assert!(!PayloadDecoder::chunked().is_finished());
        assert!(!PayloadDecoder::fix_length(3, true).is_chunked());
        assert!(!PayloadDecoder::fix_length(3, true).is_finished());
        assert!(PayloadDecoder::fix_length(0, true).is_finished());
    }
}
