//! Encoding and decoding of messages.
//!
//! # Architecture
//!
//! - Receiving:
//!   - [`Message::complete_from`](crate::protocol::Message::complete_from): the
//!     completion driver, fed from a buffer or a [`Socket`](crate::connection::Socket)
//!   - status line, header section and body decoders it runs in order
//!   - [`MessageDecoder`]: the driver as a `tokio_util` [`Decoder`](tokio_util::codec::Decoder)
//!
//! - Sending:
//!   - [`Message::prepare`](crate::protocol::Message::prepare) with [`Sections`]
//!   - [`MessageEncoder`]: whole messages as a `tokio_util` [`Encoder`](tokio_util::codec::Encoder)
//!   - [`ChunkedEncoder`]: streamed bodies with chunked transfer encoding
//!
//! Every decoder takes the raw buffer and a cursor and returns the cursor it
//! reached, so a pass that runs out of data is simply repeated later.

mod body;
mod buffer;
mod driver;
mod header;
mod message_decoder;
mod message_encoder;
mod serializer;
mod status_line;

pub use body::ChunkedEncoder;
pub(crate) use body::PayloadDecoder;
pub(crate) use buffer::RawBuffer;
pub use message_decoder::MessageDecoder;
pub use message_encoder::MessageEncoder;
pub use serializer::Sections;
