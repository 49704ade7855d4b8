//! Stream decoding of whole messages for event-driven transports.
//!
//! [`MessageDecoder`] plugs the completion driver into
//! [`tokio_util::codec::FramedRead`]: every chunk of bytes read from the
//! transport is fed into the message in flight, and a message is yielded as
//! soon as it is complete. Bytes past its end stay in the frame buffer, so
//! pipelined messages come out one after another.
//!
//! # Example
//!
//! ```no_run
//! use micro_message::codec::MessageDecoder;
//! use tokio_util::codec::Decoder;
//! use bytes::BytesMut;
//!
//! let mut decoder = MessageDecoder::new();
//! let mut buffer = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n"[..]);
//! let message = decoder.decode(&mut buffer).unwrap().unwrap();
//! assert_eq!(message.status_code(), 200);
//! ```

use std::io;

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::{trace, warn};

use crate::protocol::{Message, MessageConfig, ParseError};

#[derive(Debug, Default)]
pub struct MessageDecoder {
    config: MessageConfig,
    current: Option<Message>,
}

impl MessageDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MessageConfig) -> Self {
        Self { config, current: None }
    }

    /// Whether part of a message has been buffered.
    pub fn has_partial(&self) -> bool {
        self.current.as_ref().is_some_and(|message| !message.raw_bytes().iter().all(u8::is_ascii_whitespace))
    }
}

impl Decoder for MessageDecoder {
    type Item = Message;
    type Error = ParseError;

    /// Feeds everything in `src` into the message in flight.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(message))`: a complete message, or an invalid one that can
    ///   never complete
    /// - `Ok(None)`: need more data to proceed
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }

        let message = self.current.get_or_insert_with(|| Message::inbound(self.config.clone()));
        let data = src.split();
        let consumed = message.complete_from(None, &data)?;
        trace!(received = data.len(), consumed, "fed message");

        if message.is_complete() {
            let Some(mut message) = self.current.take() else {
                return Ok(None);
            };
            let rest = message.take_remaining();
            src.extend_from_slice(&rest);
            return Ok(Some(message));
        }

        if message.invalid_reason().is_some() {
            warn!(reason = message.invalid_reason(), "yielding invalid message");
            return Ok(self.current.take());
        }

        Ok(None)
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(message) = self.decode(buf)? {
            return Ok(Some(message));
        }

        if self.has_partial() {
            self.current.take();
            return Err(ParseError::io(io::Error::new(io::ErrorKind::UnexpectedEof, "stream ended inside a message")));
        }

        self.current.take();
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use indoc::indoc;
    use tokio_util::codec::FramedRead;

    #[test]
    fn waits_for_complete_message() {
        let mut decoder = MessageDecoder::new();
        let mut buffer = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Le"[..]);

        assert!(decoder.decode(&mut buffer).unwrap().is_none());
        assert!(buffer.is_empty());
        assert!(decoder.has_partial());

        buffer.extend_from_slice(b"ngth: 2\r\n\r\nokHTTP/1.1");
        let message = decoder.decode(&mut buffer).unwrap().unwrap();

        assert_eq!(message.body(), b"ok");
        assert_eq!(&buffer[..], b"HTTP/1.1");
        assert!(!decoder.has_partial());
    }

    #[tokio::test]
    async fn pipelined_messages() {
        let str = indoc! {r##"
        OPTIONS * RTSP/1.0
        CSeq: 1

        DESCRIBE rtsp://example.com/media RTSP/1.0
        CSeq: 2
        Content-Length: 5

        12345
        PLAY rtsp://example.com/media RTSP/1.0
        CSeq: 3

        "##};

        let decoder = MessageDecoder::with_config(MessageConfig::default().with_protocol("RTSP"));
        let mut framed = FramedRead::with_capacity(str.as_bytes(), decoder, 7);

        let mut sequence = Vec::new();
        while let Some(message) = framed.next().await {
            let message = message.unwrap();
            assert!(message.is_complete());
            sequence.push((message.method_text().to_owned(), message.header("cseq").map(str::to_owned)));
        }

        assert_eq!(
            sequence,
            [
                ("OPTIONS".to_owned(), Some("1".to_owned())),
                ("DESCRIBE".to_owned(), Some("2".to_owned())),
                ("PLAY".to_owned(), Some("3".to_owned())),
            ]
        );
    }

    #[tokio::test]
    async fn invalid_message_is_yielded() {
        let input: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: many\r\n\r\n";
        let mut framed = FramedRead::new(input, MessageDecoder::new());

        let message = framed.next().await.unwrap().unwrap();
        assert!(message.is_invalid());
        assert!(message.invalid_reason().unwrap().contains("content length"));
    }

    #[tokio::test]
    async fn eof_inside_message() {
        let input: &[u8] = b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nshort";
        let mut framed = FramedRead::new(input, MessageDecoder::new());

        let result = framed.next().await.unwrap();
        assert!(matches!(result, Err(ParseError::Io { .. })));
    }

    #[tokio::test]
    async fn trailing_terminators_are_not_a_message() {
        let input: &[u8] = b"HTTP/1.1 204 No Content\r\n\r\n\r\n";
        let mut framed = FramedRead::new(input, MessageDecoder::new());

        assert_eq!(framed.next().await.unwrap().unwrap().status_code(), 204);
        assert!(framed.next().await.is_none());
    }
}
