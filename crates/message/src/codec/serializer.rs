//! Turns a message back into wire bytes.
//!
//! The body is written as stored, with no framing of its own: a message
//! carries its length in `Content-Length`. Chunked output for streamed
//! bodies is the job of [`ChunkedEncoder`](crate::codec::ChunkedEncoder).

use bytes::{BufMut, Bytes, BytesMut};

use crate::codec::header::{encode_section, section_len};
use crate::protocol::{Message, MessageKind};

/// Which parts of a message [`Message::prepare`] writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections {
    pub status_line: bool,
    pub headers: bool,
    pub body: bool,
    pub trailer: bool,
}

impl Sections {
    /// Everything, as written by [`Message::to_bytes`].
    pub const ALL: Sections = Sections { status_line: true, headers: true, body: true, trailer: true };

    /// Status line and headers only.
    pub const HEAD: Sections = Sections { status_line: true, headers: true, body: false, trailer: false };
}

impl Message {
    /// Serializes the selected sections.
    ///
    /// An invalid message has no status line to write. Headers are written in
    /// insertion order and closed by an empty line; trailers are only written
    /// when there are any.
    pub fn prepare(&self, sections: Sections) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.prepared_len(sections));
        self.encode_into(sections, &mut dst);
        dst.freeze()
    }

    /// Shorthand for [`Message::prepare`] with [`Sections::ALL`].
    pub fn to_bytes(&self) -> Bytes {
        self.prepare(Sections::ALL)
    }

    /// Exact number of bytes [`Message::to_bytes`] produces.
    pub fn encoded_len(&self) -> usize {
        self.prepared_len(Sections::ALL)
    }

    pub(crate) fn encode_into(&self, sections: Sections, dst: &mut BytesMut) {
        let header_space = self.config.header_space();

        if sections.status_line {
            match self.kind {
                MessageKind::Request => {
                    dst.put_slice(self.method.as_bytes());
                    dst.put_u8(b' ');
                    dst.put_slice(self.target.as_bytes());
                    dst.put_u8(b' ');
                    dst.put_slice(self.protocol_version().as_bytes());
                    dst.put_slice(b"\r\n");
                }
                MessageKind::Response => {
                    dst.put_slice(self.protocol_version().as_bytes());
                    dst.put_u8(b' ');
                    dst.put_slice(self.status.to_string().as_bytes());
                    if let Some(reason) = &self.reason {
                        dst.put_u8(b' ');
                        dst.put_slice(reason.as_bytes());
                    }
                    dst.put_slice(b"\r\n");
                }
                MessageKind::Invalid => {}
            }
        }

        if sections.headers {
            encode_section(&self.headers, header_space, dst);
            dst.put_slice(b"\r\n");
        }

        if sections.body {
            dst.put_slice(&self.body);
        }

        if sections.trailer && !self.trailers.is_empty() {
            encode_section(&self.trailers, header_space, dst);
            dst.put_slice(b"\r\n");
        }
    }

    fn prepared_len(&self, sections: Sections) -> usize {
        let header_space = self.config.header_space();
        let mut len = 0;

        if sections.status_line {
            len += match self.kind {
                MessageKind::Request => self.method.len() + self.target.len() + self.protocol_version().len() + 4,
                MessageKind::Response => {
                    let reason = self.reason.as_ref().map_or(0, |reason| reason.len() + 1);
                    self.protocol_version().len() + self.status.to_string().len() + reason + 3
                }
                MessageKind::Invalid => 0,
            };
        }
        if sections.headers {
            len += section_len(&self.headers, header_space) + 2;
        }
        if sections.body {
            len += self.body.len();
        }
        if sections.trailer && !self.trailers.is_empty() {
            len += section_len(&self.trailers, header_space) + 2;
        }
        len
    }

    fn protocol_version(&self) -> String {
        format!("{}/{}", self.protocol(), self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MessageConfig, TextEncoding, Version};

    #[test]
    fn response_round_trip() {
        let mut response = Message::response(200);
        response.set_header("Content-Type", "application/sdp").unwrap();
        response.set_header("CSeq", "7").unwrap();
        response.set_body(&b"v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\n"[..]).unwrap();

        let bytes = response.to_bytes();
        assert_eq!(bytes.len(), response.encoded_len());

        let parsed = Message::from_bytes(&bytes);
        assert!(parsed.is_complete());
        assert_eq!(parsed, response);
        assert_eq!(parsed.reason_phrase(), Some("OK"));
    }

    #[test]
    fn body_starting_with_terminators_round_trips() {
        let mut response = Message::response(200);
        response.set_body(&b"\r\n\nabc\r"[..]).unwrap();

        let parsed = Message::from_bytes(&response.to_bytes());
        assert!(parsed.is_complete());
        assert_eq!(parsed.body(), b"\r\n\nabc\r");
        assert_eq!(parsed, response);
        assert!(parsed.remaining().is_empty());
    }

    #[test]
    fn request_round_trip_with_other_protocol() {
        let config = MessageConfig::default().with_protocol("RTSP").with_header_space(false);
        let mut request = Message::request("SETUP", "rtsp://example.com/media/track1").unwrap().with_config(config.clone());
        request.set_version(Version::V1_0);
        request.set_header("Transport", "RTP/AVP;unicast;client_port=8000-8001").unwrap();

        let bytes = request.to_bytes();
        assert_eq!(
            &bytes[..],
            b"SETUP rtsp://example.com/media/track1 RTSP/1.0\r\nTransport:RTP/AVP;unicast;client_port=8000-8001\r\n\r\n"
        );
        assert_eq!(bytes.len(), request.encoded_len());

        let parsed = Message::from_bytes_with(&bytes, config, TextEncoding::Utf8);
        assert_eq!(parsed, request);
    }

    #[test]
    fn selected_sections() {
        let mut response = Message::response(404);
        response.set_header("Server", "micro").unwrap();
        response.set_body("missing").unwrap();

        let head = response.prepare(Sections::HEAD);
        assert_eq!(&head[..], b"HTTP/1.1 404 Not Found\r\nServer: micro\r\nContent-Length: 7\r\n\r\n");

        let body = response.prepare(Sections { status_line: false, headers: false, body: true, trailer: false });
        assert_eq!(&body[..], b"missing");
    }

    #[test]
    fn response_without_reason() {
        let mut response = Message::response(551);
        assert_eq!(response.reason_phrase(), None);
        assert_eq!(&response.to_bytes()[..], b"HTTP/1.1 551\r\n\r\n");

        response.set_reason("Option not supported");
        assert_eq!(&response.to_bytes()[..], b"HTTP/1.1 551 Option not supported\r\n\r\n");
    }

    #[test]
    fn trailers_follow_body() {
        let mut response = Message::response(200);
        response.set_body("abc").unwrap();
        response.set_trailer("Expires", "never").unwrap();

        let bytes = response.to_bytes();
        assert!(bytes.ends_with(b"\r\n\r\nabcExpires: never\r\n\r\n"));
        assert_eq!(bytes.len(), response.encoded_len());
    }

    #[test]
    fn invalid_message_has_no_status_line() {
        let message = Message::default();
        assert_eq!(&message.to_bytes()[..], b"\r\n");
    }
}
