use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed status line: {reason}")]
    MalformedStatusLine { reason: String },

    #[error("malformed header: {reason}")]
    MalformedHeader { reason: String },

    #[error("malformed chunk size line: {line:?}")]
    MalformedChunkSize { line: String },

    #[error("unsupported content encoding: {label}")]
    UnsupportedContentEncoding { label: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn malformed_status_line<S: ToString>(str: S) -> Self {
        Self::MalformedStatusLine { reason: str.to_string() }
    }

    pub fn malformed_header<S: ToString>(str: S) -> Self {
        Self::MalformedHeader { reason: str.to_string() }
    }

    pub fn malformed_chunk_size<S: ToString>(str: S) -> Self {
        Self::MalformedChunkSize { line: str.to_string() }
    }

    pub fn unsupported_content_encoding<S: ToString>(str: S) -> Self {
        Self::UnsupportedContentEncoding { label: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("status {status} does not allow a message body")]
    BodyForbidden { status: u16 },

    #[error("invalid header: {reason}")]
    InvalidHeader { reason: String },

    #[error("invalid target: {reason}")]
    InvalidTarget { reason: String },

    #[error("zero length chunk can only terminate a chunked body")]
    EmptyChunk,

    #[error("message is invalid: {reason}")]
    InvalidMessage { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn body_forbidden(status: u16) -> Self {
        Self::BodyForbidden { status }
    }

    pub fn invalid_header<S: ToString>(str: S) -> Self {
        Self::InvalidHeader { reason: str.to_string() }
    }

    pub fn invalid_target<S: ToString>(str: S) -> Self {
        Self::InvalidTarget { reason: str.to_string() }
    }

    pub fn invalid_message<S: ToString>(str: S) -> Self {
        Self::InvalidMessage { reason: str.to_string() }
    }
}
