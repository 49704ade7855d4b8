//! Header section processing shared by headers and chunked trailers.
//!
//! - [`decode_section`]: tolerant, resumable parsing of `name: value` lines
//!   with obsolete line folding
//! - [`encode_section`]: writes headers back out in insertion order

mod header_decoder;
mod header_encoder;

pub(crate) use header_decoder::decode_section;
pub(crate) use header_encoder::{FastWrite, encode_section, section_len};
