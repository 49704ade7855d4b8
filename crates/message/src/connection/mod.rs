//! Transport boundary.
//!
//! The engine performs no connect or reconnect logic itself, it only needs
//! to receive bytes and to tell a retryable failure from a fatal one.

mod socket;

pub use socket::Socket;
pub use socket::is_retryable;
