//! An incremental message engine for line oriented protocols
//!
//! This crate parses and serializes the request/response messages shared by
//! HTTP/1.x, RTSP and SIP: a status line, a header section and an optional
//! body framed by `Content-Length` or chunked transfer encoding. Bytes can be
//! fed as they arrive from a socket, in pieces of any size.
//!
//! # Features
//!
//! - One engine for every protocol token (`HTTP`, `RTSP`, `SIP`, ...)
//! - Resumable parsing: one byte at a time gives the same message as one large block
//! - Tolerant input: `\r\n`, `\r` or `\n` line endings, obsolete line folding,
//!   garbage in front of the status line
//! - Chunked bodies with trailer headers
//! - `tokio_util` codecs for framed transports
//!
//! # Example
//!
//! ```
//! use micro_message::protocol::Message;
//!
//! let mut message = Message::default();
//! for piece in [&b"HTTP/1.0 200 OK\r\nCSeq: 3"[..], b"02\r\nContent-Length: 4\r\n\r\n", b"Body"] {
//!     message.complete_from(None, piece).unwrap();
//! }
//!
//! assert!(message.is_complete());
//! assert_eq!(message.header("cseq"), Some("302"));
//! assert_eq!(message.body(), b"Body");
//!
//! let mut response = Message::response(200);
//! response.set_body("Body").unwrap();
//! assert_eq!(&response.to_bytes()[..], b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\nBody");
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: the message model, configuration and error types
//! - [`codec`]: the completion driver, the decoders it runs, the serializer
//!   and the `tokio_util` codecs
//! - [`connection`]: the socket boundary the driver receives from
//!
//! ## Error Handling
//!
//! - [`protocol::ParseError`]: receive side errors. Malformed input does not
//!   surface as an error, it turns the message invalid instead; only a fatal
//!   socket error is returned to the caller
//! - [`protocol::SendError`]: building and encoding messages
//!
//! # Limitations
//!
//! - Maximum line size: 8KB by default
//! - Maximum number of headers: 64 by default
//! - Bodies are buffered in memory, streaming is left to the transport

pub mod codec;
pub mod connection;
pub mod protocol;

mod utils;
