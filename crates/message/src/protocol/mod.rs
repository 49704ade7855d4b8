//! The message model: what a request or response is made of.
//!
//! - **Message** ([`message`]): [`Message`] and its [`MessageKind`]
//! - **Headers** ([`headers`]): ordered, case-insensitive [`Headers`]
//! - **Values**: [`Method`], [`Version`], [`TextEncoding`] and [`PayloadItem`]
//! - **Configuration** ([`config`]): [`MessageConfig`] limits and switches
//! - **Errors**: [`ParseError`] for the receiving side, [`SendError`]
//!   for building and encoding messages

pub mod config;
pub use config::MessageConfig;

mod encoding;
pub use encoding::TextEncoding;

mod error;
pub use error::ParseError;
pub use error::SendError;

pub mod headers;
pub use headers::Headers;
pub use headers::is_valid_name;

pub mod message;
pub use message::Message;
pub use message::MessageKind;
pub use message::status_accepts_body;
pub use message::status_allows_body;

mod method;
pub use method::Method;
pub use method::UnknownMethod;

mod payload;
pub use payload::PayloadItem;

mod version;
pub use version::Version;
