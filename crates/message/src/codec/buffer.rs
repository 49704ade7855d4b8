//! Raw wire buffer and the line scanner shared by every sub-parser.
//!
//! Parsers never mutate a shared position. Each one receives the buffer and a
//! cursor and hands back the cursor it reached, so a pass that runs out of
//! data can be replayed later from exactly the same place.

use bytes::{Bytes, BytesMut};
use std::task::Poll;

/// Expandable byte sequence holding everything received for one message.
///
/// Consumed bytes are kept so a persistent message can be inspected after it
/// completes; the parse cursor lives in the message, not here.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawBuffer {
    data: BytesMut,
    released: bool,
}

impl RawBuffer {
    pub(crate) fn extend(&mut self, bytes: &[u8]) {
        if !self.released {
            self.data.extend_from_slice(bytes);
        }
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    /// Cuts everything from `at` onwards out of the buffer.
    pub(crate) fn split_off(&mut self, at: usize) -> Bytes {
        if at >= self.data.len() {
            return Bytes::new();
        }
        self.data.split_off(at).freeze()
    }

    /// Drops the storage; later appends are ignored.
    pub(crate) fn release(&mut self) {
        self.data = BytesMut::new();
        self.released = true;
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released
    }
}

/// A line located in the buffer: content is `start..end`, the next line begins at `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Line {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) next: usize,
}

impl Line {
    pub(crate) fn len(&self) -> usize {
        self.end - self.start
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Finds the line starting at `from`.
///
/// `\r\n`, a lone `\r` and a lone `\n` all terminate a line. Returns `None`
/// when no terminator can be confirmed yet, which includes a `\r` that is the
/// last available byte: it may still turn out to be the first half of `\r\n`.
pub(crate) fn find_line(buf: &[u8], from: usize) -> Option<Line> {
    let rest = buf.get(from..)?;
    let offset = rest.iter().position(|&b| b == b'\r' || b == b'\n')?;
    let end = from + offset;
    match terminator_at(buf, end) {
        Poll::Ready(len) if len > 0 => Some(Line { start: from, end, next: end + len }),
        _ => None,
    }
}

/// Length of the line terminator starting at `at`, `0` if the byte there is not a terminator.
pub(crate) fn terminator_at(buf: &[u8], at: usize) -> Poll<usize> {
    match buf.get(at) {
        None => Poll::Pending,
        Some(b'\n') => Poll::Ready(1),
        Some(b'\r') => match buf.get(at + 1) {
            None => Poll::Pending,
            Some(b'\n') => Poll::Ready(2),
            Some(_) => Poll::Ready(1),
        },
        Some(_) => Poll::Ready(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_terminator() {
        let buf = b"a\r\nbb\rccc\nd";
        let first = find_line(buf, 0).unwrap();
        assert_eq!(first, Line { start: 0, end: 1, next: 3 });
        let second = find_line(buf, first.next).unwrap();
        assert_eq!(&buf[second.start..second.end], b"bb");
        let third = find_line(buf, second.next).unwrap();
        assert_eq!(&buf[third.start..third.end], b"ccc");
        assert_eq!(find_line(buf, third.next), None);
    }

    #[test]
    fn trailing_cr_waits_for_more() {
        assert_eq!(find_line(b"abc\r", 0), None);
        assert_eq!(find_line(b"abc\r\n", 0).map(|l| l.next), Some(5));
        assert_eq!(find_line(b"abc\rx", 0).map(|l| l.next), Some(4));
    }

    #[test]
    fn empty_line() {
        let line = find_line(b"\r\nrest", 0).unwrap();
        assert!(line.is_empty());
        assert_eq!(line.next, 2);
    }

    #[test]
    fn released_buffer_ignores_appends() {
        let mut buffer = RawBuffer::default();
        buffer.extend(b"abc");
        assert_eq!(buffer.split_off(1), Bytes::from_static(b"bc"));
        buffer.release();
        buffer.extend(b"def");
        assert!(buffer.is_released());
        assert_eq!(buffer.len(), 0);
    }
}
