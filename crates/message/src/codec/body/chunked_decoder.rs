//! Decoder for chunked transfer encoding.
//!
//! A chunked body is a series of hex size lines each followed by that many
//! data bytes and a line terminator, closed by a zero size chunk and an
//! optional trailer section:
//!
//! ```text
//! 5;ext=1\r\n
//! hello\r\n
//! 0\r\n
//! Expires: never\r\n
//! \r\n
//! ```
//!
//! Every state can be suspended when data runs out. Chunk data is consumed
//! only once the whole chunk is available, so a chunk is never appended to
//! the body twice.

use std::task::Poll;

use bytes::BytesMut;
use tracing::{debug, trace};
use ChunkedState::*;

use crate::codec::buffer::{find_line, terminator_at};
use crate::codec::header::decode_section;
use crate::protocol::{Headers, MessageConfig, ParseError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChunkedDecoder {
    state: ChunkedState,
    chunks: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    /// Read the chunk size line in hex, extensions are ignored
    Size,
    /// Wait for the whole chunk of `size` bytes
    Data { size: usize },
    /// Read the terminator after chunk data
    DataEnd,
    /// Read the trailer section after the last chunk
    Trailer,
    /// Final state after the trailer section
    Done,
}

impl ChunkedDecoder {
    /// The decoder starts in the `Size` state, ready to read the size of the first chunk.
    pub(crate) fn new() -> Self {
        Self { state: Size, chunks: 0 }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.state == Done
    }

    /// Advances the state machine over `buf[cursor..]`.
    ///
    /// Chunk data goes to `body`, trailer headers to `trailers`. Returns
    /// `Ready(Ok(()))` after the trailer section, `Pending` with the cursor
    /// to resume from, or an error once a size line can no longer become
    /// valid within [`MessageConfig::max_line_bytes`].
    pub(crate) fn decode(
        &mut self,
        buf: &[u8],
        cursor: usize,
        body: &mut BytesMut,
        trailers: &mut Headers,
        config: &MessageConfig,
    ) -> (Poll<Result<(), ParseError>>, usize) {
        let mut pos = cursor;
        loop {
            match self.state {
                Size => match read_size(buf, pos, config) {
                    (Poll::Ready(Ok(Some(0))), next) => {
                        debug!(chunks = self.chunks, body_len = body.len(), "read last chunk");
                        pos = next;
                        self.state = Trailer;
                    }
                    (Poll::Ready(Ok(Some(size))), next) => {
                        pos = next;
                        self.state = Data { size };
                    }
                    (Poll::Ready(Ok(None)), next) => pos = next,
                    (Poll::Ready(Err(e)), _) => return (Poll::Ready(Err(e)), pos),
                    (Poll::Pending, _) => return (Poll::Pending, pos),
                },
                Data { size } => {
                    if buf.len() - pos < size {
                        return (Poll::Pending, pos);
                    }
                    body.extend_from_slice(&buf[pos..pos + size]);
                    pos += size;
                    self.chunks += 1;
                    trace!(size, "read chunk");
                    self.state = DataEnd;
                }
                DataEnd => match terminator_at(buf, pos) {
                    Poll::Ready(0) => {
                        let found = &buf[pos..buf.len().min(pos + 16)];
                        let e = ParseError::malformed_chunk_size(format!(
                            "missing line terminator after chunk data, found {:?}",
                            String::from_utf8_lossy(found)
                        ));
                        return (Poll::Ready(Err(e)), pos);
                    }
                    Poll::Ready(len) => {
                        pos += len;
                        self.state = Size;
                    }
                    Poll::Pending => return (Poll::Pending, pos),
                },
                Trailer => match decode_section(buf, pos, trailers, config) {
                    (Poll::Ready(Ok(())), next) => {
                        trace!(trailer_count = trailers.len(), "read trailer section");
                        pos = next;
                        self.state = Done;
                    }
                    (poll, next) => return (poll, next),
                },
                Done => return (Poll::Ready(Ok(())), pos),
            }
        }
    }
}

/// Reads one size line.
///
/// Yields `Some(size)`, or `None` for an empty line that is skipped. A line
/// that does not start with a hex number is retried on later passes until
/// the unconsumed bytes outgrow the line limit.
fn read_size(buf: &[u8], pos: usize, config: &MessageConfig) -> (Poll<Result<Option<usize>, ParseError>>, usize) {
    let available = buf.len() - pos;

    let Some(line) = find_line(buf, pos) else {
        if available > config.max_line_bytes() {
            let e = ParseError::malformed_chunk_size(String::from_utf8_lossy(&buf[pos..pos + config.max_line_bytes()]));
            return (Poll::Ready(Err(e)), pos);
        }
        return (Poll::Pending, pos);
    };

    let content = &buf[line.start..line.end];
    if line.len() > config.max_line_bytes() {
        return (Poll::Ready(Err(ParseError::malformed_chunk_size(String::from_utf8_lossy(content)))), pos);
    }

    let size_text = content.split(|&b| b == b';').next().unwrap_or_default().trim_ascii();
    if size_text.is_empty() {
        return (Poll::Ready(Ok(None)), line.next);
    }

    match parse_hex(size_text) {
        Some(size) => (Poll::Ready(Ok(Some(size))), line.next),
        None if available > config.max_line_bytes() => {
            (Poll::Ready(Err(ParseError::malformed_chunk_size(String::from_utf8_lossy(content)))), pos)
        }
        None => {
            trace!(line = %String::from_utf8_lossy(content), "chunk size not parsed yet");
            (Poll::Pending, pos)
        }
    }
}

fn parse_hex(text: &[u8]) -> Option<usize> {
    let token = text.split(u8::is_ascii_whitespace).next()?;
    let token = std::str::from_utf8(token).ok()?;
    if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let size = u64::from_str_radix(token, 16).ok()?;
    usize::try_from(size).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    struct Decoded {
        poll: Poll<Result<(), ParseError>>,
        cursor: usize,
        body: BytesMut,
        trailers: Headers,
        decoder: ChunkedDecoder,
    }

    fn decode_all(input: &[u8]) -> Decoded {
        let mut decoder = ChunkedDecoder::new();
        let mut body = BytesMut::new();
        let mut trailers = Headers::new();
        let (poll, cursor) = decoder.decode(input, 0, &mut body, &mut trailers, &MessageConfig::default());
        Decoded { poll, cursor, body, trailers, decoder }
    }

    #[test]
    fn test_basic() {
        let input = b"10\r\n1234567890abcdef\r\n0\r\n\r\nnext";
        let decoded = decode_all(input);

        assert!(matches!(decoded.poll, Poll::Ready(Ok(()))));
        assert!(decoded.decoder.is_finished());
        assert_eq!(&decoded.body[..], b"1234567890abcdef");
        assert_eq!(&input[decoded.cursor..], b"next");
    }

    #[test]
    fn extensions_and_trailers() {
        let str = indoc! {r##"
        5;name=value
        hello
        6 ; other
         world
        0
        Expires: never
        X-Checksum: abc

        "##};

        let decoded = decode_all(str.as_bytes());

        assert!(matches!(decoded.poll, Poll::Ready(Ok(()))));
        assert_eq!(&decoded.body[..], b"hello world");
        assert_eq!(decoded.trailers.len(), 2);
        assert_eq!(decoded.trailers.get("expires"), Some("never"));
        assert_eq!(decoded.trailers.get("x-checksum"), Some("abc"));
    }

    #[test]
    fn partial_chunk_is_not_consumed() {
        let decoded = decode_all(b"a\r\n12345");

        assert!(decoded.poll.is_pending());
        assert_eq!(decoded.cursor, 3);
        assert!(decoded.body.is_empty());
    }

    #[test]
    fn resumes_across_fragments() {
        let input = b"3\r\nabc\r\n4\r\ndefg\r\n0\r\nX: y\r\n\r\n";
        let mut decoder = ChunkedDecoder::new();
        let mut body = BytesMut::new();
        let mut trailers = Headers::new();
        let config = MessageConfig::default();

        let mut cursor = 0;
        for end in 1..=input.len() {
            let (poll, next) = decoder.decode(&input[..end], cursor, &mut body, &mut trailers, &config);
            cursor = next;
            if end < input.len() {
                assert!(poll.is_pending(), "finished early at {end}");
            } else {
                assert!(matches!(poll, Poll::Ready(Ok(()))));
            }
        }

        assert_eq!(cursor, input.len());
        assert_eq!(&body[..], b"abcdefg");
        assert_eq!(trailers.get("x"), Some("y"));
    }

    #[test]
    fn chunk_data_must_end_with_terminator() {
        let decoded = decode_all(b"3\r\nabc0\r\n\r\n");
        assert!(matches!(decoded.poll, Poll::Ready(Err(ParseError::MalformedChunkSize { .. }))));
        assert_eq!(decoded.cursor, 6);

        // a lone CR or LF is enough
        let decoded = decode_all(b"3\r\nabc\n0\r\n\r\n");
        assert!(matches!(decoded.poll, Poll::Ready(Ok(()))));
        assert_eq!(&decoded.body[..], b"abc");
    }

    #[test]
    fn bad_size_waits_until_limit() {
        let decoded = decode_all(b"zz\r\n");
        assert!(decoded.poll.is_pending());
        assert_eq!(decoded.cursor, 0);

        let mut decoder = ChunkedDecoder::new();
        let config = MessageConfig::default().with_max_line_bytes(8);
        let (poll, _) =
            decoder.decode(b"zz\r\n0123456789", 0, &mut BytesMut::new(), &mut Headers::new(), &config);
        assert!(matches!(poll, Poll::Ready(Err(ParseError::MalformedChunkSize { .. }))));
    }

    #[test]
    fn hex_parsing() {
        assert_eq!(parse_hex(b"ff"), Some(255));
        assert_eq!(parse_hex(b"A x"), Some(10));
        assert_eq!(parse_hex(b"+1"), None);
        assert_eq!(parse_hex(b"0x1"), None);
    }
}
