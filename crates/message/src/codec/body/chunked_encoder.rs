//! Encoder producing chunked transfer encoding for streamed bodies.
//!
//! Messages themselves always serialize with `Content-Length` framing; this
//! encoder is for transports that push a body out piece by piece.

use bytes::{Buf, BytesMut};
use std::io::Write;
use tokio_util::codec::Encoder;
use tracing::trace;

use crate::codec::header::{FastWrite, encode_section};
use crate::protocol::{Headers, PayloadItem, SendError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkedEncoder {
    eof: bool,
    trailers: Headers,
    header_space: bool,
}

impl ChunkedEncoder {
    pub fn new() -> Self {
        Self { eof: false, trailers: Headers::new(), header_space: true }
    }

    /// Trailer headers written after the terminal chunk.
    #[must_use]
    pub fn with_trailers(mut self, trailers: Headers) -> Self {
        self.trailers = trailers;
        self
    }

    #[must_use]
    pub fn with_header_space(mut self, header_space: bool) -> Self {
        self.header_space = header_space;
        self
    }

    /// Whether the terminal chunk has been written.
    pub fn is_eof(&self) -> bool {
        self.eof
    }
}

impl Default for ChunkedEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for ChunkedEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if self.eof {
            return Ok(());
        }

        match item {
            PayloadItem::Chunk(mut bytes) => {
                let size = bytes.remaining();
                if size == 0 {
                    return Err(SendError::EmptyChunk);
                }

                write!(FastWrite(dst), "{size:X}\r\n")?;
                dst.reserve(size + 2);
                while bytes.has_remaining() {
                    let chunk = bytes.chunk();
                    let len = chunk.len();
                    dst.extend_from_slice(chunk);
                    bytes.advance(len);
                }
                dst.extend_from_slice(b"\r\n");
                trace!(size, "wrote chunk");
                Ok(())
            }
            PayloadItem::Eof => {
                self.eof = true;
                dst.extend_from_slice(b"0\r\n");
                encode_section(&self.trailers, self.header_space, dst);
                dst.extend_from_slice(b"\r\n");
                trace!(trailer_count = self.trailers.len(), "wrote last chunk");
                Ok(())
            }
        }
    }
}
