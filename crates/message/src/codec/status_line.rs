//! Status line decoding.
//!
//! The first line of a message decides what it is:
//!
//! - `TOKEN/x.y status [reason]` is a response,
//! - `method target TOKEN/x.y` is a request,
//! - a line without the protocol token anywhere is leading garbage: it is
//!   skipped and the next line is tried,
//! - any other line holding the token is malformed, unless the only thing in
//!   front of the token is garbage glued to it.
//!
//! The protocol token comes from [`MessageConfig::protocol`], so the same
//! decoder serves HTTP, RTSP and SIP.

use std::task::Poll;

use http::Uri;
use tracing::{trace, warn};

use crate::codec::buffer::find_line;
use crate::protocol::{MessageConfig, ParseError, Version};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StatusLine {
    Request { method: String, target: String, version: Version },
    Response { version: Version, status: u16, reason: Option<String> },
}

/// What a single complete line turned out to be.
#[derive(Debug)]
enum Classified {
    Parsed(Result<StatusLine, ParseError>),
    /// Looks like a status line but the version or status code is not numeric
    NotParsed(&'static str),
    Garbage,
}

/// Decodes the status line starting at `cursor`.
///
/// Returns the poll result and the cursor reached. On success the payload is
/// the status line plus the offset where the header section begins. Garbage
/// lines are consumed, so the returned cursor may move forward even while
/// the result is still pending.
pub(crate) fn decode(buf: &[u8], mut cursor: usize, config: &MessageConfig) -> (Poll<Result<(StatusLine, usize), ParseError>>, usize) {
    loop {
        let available = buf.len() - cursor;
        if available < config.min_status_line() {
            return (Poll::Pending, cursor);
        }

        let Some(line) = find_line(buf, cursor) else {
            if available > config.max_line_bytes() {
                let e = ParseError::malformed_status_line(format!("no line terminator within {} bytes", config.max_line_bytes()));
                return (Poll::Ready(Err(e)), cursor);
            }
            return (Poll::Pending, cursor);
        };

        if line.len() > config.max_line_bytes() {
            let e = ParseError::malformed_status_line(format!("line of {} bytes exceeds the limit {}", line.len(), config.max_line_bytes()));
            return (Poll::Ready(Err(e)), cursor);
        }

        let text = String::from_utf8_lossy(&buf[line.start..line.end]);
        match classify(&text, config.protocol()) {
            Classified::Parsed(Ok(status_line)) => {
                trace!(?status_line, header_offset = line.next, "parsed status line");
                return (Poll::Ready(Ok((status_line, line.next))), cursor);
            }
            Classified::Parsed(Err(e)) => return (Poll::Ready(Err(e)), cursor),
            Classified::NotParsed(reason) => {
                if available > config.max_line_bytes() {
                    return (Poll::Ready(Err(ParseError::malformed_status_line(reason))), cursor);
                }
                trace!(reason, "status line not parsed yet");
                return (Poll::Pending, cursor);
            }
            Classified::Garbage => {
                warn!(skipped = line.next - cursor, "skipping garbage before status line");
                cursor = line.next;
            }
        }
    }
}

fn classify(line: &str, protocol: &str) -> Classified {
    let line = line.trim_start();
    let marker = format!("{protocol}/");

    let found = line.find(&marker);
    if found == Some(0) {
        return response(line, marker.len());
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() == 3 && fields[2].starts_with(&marker) {
        return request(fields[0], fields[1], &fields[2][marker.len()..]);
    }

    match found {
        // garbage glued to the front of a response line
        Some(index) if !line[..index].contains(char::is_whitespace) => {
            warn!(skipped = index, "skipping garbage in front of protocol token");
            response(&line[index..], marker.len())
        }
        Some(_) => Classified::Parsed(Err(ParseError::malformed_status_line(format!(
            "{} fields with the protocol token out of place",
            fields.len()
        )))),
        None => Classified::Garbage,
    }
}

fn response(line: &str, marker_len: usize) -> Classified {
    let (protocol_version, rest) = split_field(line);
    let (status, rest) = split_field(rest);

    if status.is_empty() {
        return Classified::Parsed(Err(ParseError::malformed_status_line("response line needs at least 2 fields")));
    }

    let Some(version) = Version::parse_lenient(&protocol_version[marker_len..]) else {
        return Classified::NotParsed("version is not numeric");
    };

    let Ok(status) = status.parse::<u16>() else {
        return Classified::NotParsed("status code is not numeric");
    };

    let reason = rest.trim();
    let reason = (!reason.is_empty()).then(|| reason.to_owned());
    Classified::Parsed(Ok(StatusLine::Response { version, status, reason }))
}

fn request(method: &str, target: &str, version: &str) -> Classified {
    if let Err(e) = Uri::try_from(target) {
        return Classified::Parsed(Err(ParseError::malformed_status_line(format!("invalid target {target:?}: {e}"))));
    }

    let Some(version) = Version::parse_lenient(version) else {
        return Classified::NotParsed("version is not numeric");
    };

    Classified::Parsed(Ok(StatusLine::Request { method: method.to_owned(), target: target.to_owned(), version }))
}

/// Splits off the first whitespace delimited field, returning it and the remainder.
fn split_field(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(index) => (&s[..index], &s[index..]),
        None => (s, ""),
    }
}
