//! Header section serialization.
//!
//! Writes `name:` followed by an optional single space, the value and `\r\n`
//! for every entry in insertion order. The caller decides whether an empty
//! line closes the section.

use bytes::{BufMut, BytesMut};
use std::io;
use std::io::Write;

use crate::protocol::Headers;

/// Writes every header of `headers` into `dst` without the closing empty line.
pub(crate) fn encode_section(headers: &Headers, header_space: bool, dst: &mut BytesMut) {
    for (name, value) in headers.iter() {
        dst.reserve(name.len() + value.len() + 4);
        dst.put_slice(name.as_bytes());
        dst.put_u8(b':');
        if header_space {
            dst.put_u8(b' ');
        }
        dst.put_slice(value.as_bytes());
        dst.put_slice(b"\r\n");
    }
}

/// Number of bytes [`encode_section`] writes for `headers`.
pub(crate) fn section_len(headers: &Headers, header_space: bool) -> usize {
    let sep = if header_space { 2 } else { 1 };
    headers.iter().map(|(name, value)| name.len() + sep + value.len() + 2).sum()
}

/// Fast writer implementation for writing to BytesMut.
///
/// Lets `write!` format straight into the output buffer without an
/// intermediate `String`.
pub(crate) struct FastWrite<'a>(pub(crate) &'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
