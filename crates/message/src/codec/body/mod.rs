//! Body handling for both directions.
//!
//! ## Decoders
//! - [`LengthDecoder`](length_decoder::LengthDecoder): `Content-Length` framed bodies
//! - [`ChunkedDecoder`](chunked_decoder::ChunkedDecoder): chunked bodies and their trailers
//! - [`PayloadDecoder`]: picks one of the above once the headers are known
//!
//! ## Encoders
//! - [`ChunkedEncoder`]: streams a body out with chunked transfer encoding

mod chunked_decoder;
mod chunked_encoder;
mod length_decoder;
mod payload_decoder;

pub use chunked_encoder::ChunkedEncoder;
pub(crate) use payload_decoder::PayloadDecoder;
