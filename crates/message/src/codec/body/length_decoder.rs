//! Decoder for bodies framed by `Content-Length`.
//!
//! The decoder tracks the remaining bytes to be read and appends whatever is
//! available, so a body may arrive in any number of fragments.

use std::cmp;
use std::task::Poll;

use bytes::BytesMut;
use tracing::trace;

use crate::protocol::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LengthDecoder {
    /// The number of bytes remaining to be read from the payload
    remaining: u64,
    /// Whether a body byte has been consumed yet
    started: bool,
    skip_stray_terminators: bool,
}

impl LengthDecoder {
    pub(crate) fn new(length: u64, skip_stray_terminators: bool) -> Self {
        Self { remaining: length, started: false, skip_stray_terminators }
    }

    /// Bytes still outstanding, `0` once the body is complete.
    pub(crate) fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Appends up to the outstanding number of bytes from `buf[cursor..]` to `body`.
    ///
    /// Stray `\r` and `\n` bytes left between the header section and the
    /// first body byte are skipped when configured to.
    pub(crate) fn decode(&mut self, buf: &[u8], cursor: usize, body: &mut BytesMut) -> (Poll<Result<(), ParseError>>, usize) {
        let mut pos = cursor;

        if self.remaining > 0 && !self.started && self.skip_stray_terminators {
            let stray = buf[pos..].iter().take_while(|&&b| b == b'\r' || b == b'\n').count();
            if stray > 0 {
                trace!(stray, "skipping stray line terminators before body");
                pos += stray;
            }
        }

        let available = buf.len() - pos;
        let len = usize::try_from(self.remaining).map_or(available, |remaining| cmp::min(remaining, available));
        if len > 0 {
            body.extend_from_slice(&buf[pos..pos + len]);
            self.started = true;
            self.remaining -= len as u64;
            pos += len;
            trace!(len, remaining = self.remaining, "read body bytes");
        }

        if self.remaining == 0 { (Poll::Ready(Ok(())), pos) } else { (Poll::Pending, pos) }
    }
}
