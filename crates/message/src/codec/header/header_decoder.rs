//! Header section decoding, used for both the message headers and chunked trailers.
//!
//! A section is a run of `name: value` lines closed by an empty line. The
//! decoder is deliberately forgiving:
//!
//! - every line may end in `\r\n`, `\r` or `\n`,
//! - a line that starts with whitespace, has no colon or has an empty name
//!   continues the value of the previous header (obsolete line folding),
//! - a later header with the same name overwrites the earlier one,
//! - names that are empty or do not start with a letter are dropped unless
//!   [`MessageConfig::allow_invalid_headers`] is set.
//!
//! # Resuming
//!
//! A header is only stored once the following line proves it has no more
//! continuation lines. When data runs out, the returned cursor points at the
//! first line of the header still being assembled, so the next pass re-reads
//! it from there and nothing is stored twice.

use std::task::Poll;

use tracing::{trace, warn};

use crate::codec::buffer::find_line;
use crate::protocol::{Headers, MessageConfig, ParseError, is_valid_name};

/// A header waiting for its continuation lines: `(first line start, name, raw value)`
type PendingHeader = (usize, String, String);

/// Decodes one header section starting at `cursor` into `headers`.
///
/// Returns `Ready(Ok(()))` with the cursor just past the terminating empty
/// line, `Pending` with the cursor to resume from, or an error when a line
/// exceeds [`MessageConfig::max_line_bytes`] or the section holds more than
/// [`MessageConfig::max_headers`] names.
pub(crate) fn decode_section(
    buf: &[u8],
    cursor: usize,
    headers: &mut Headers,
    config: &MessageConfig,
) -> (Poll<Result<(), ParseError>>, usize) {
    let mut pos = cursor;
    let mut pending: Option<PendingHeader> = None;

    loop {
        let Some(line) = find_line(buf, pos) else {
            if buf.len() - pos > config.max_line_bytes() {
                let e = ParseError::malformed_header(format!("no line terminator within {} bytes", config.max_line_bytes()));
                return (Poll::Ready(Err(e)), pos);
            }
            let resume = pending.map_or(pos, |(start, _, _)| start);
            return (Poll::Pending, resume);
        };

        if line.len() > config.max_line_bytes() {
            let e = ParseError::malformed_header(format!("line of {} bytes exceeds the limit {}", line.len(), config.max_line_bytes()));
            return (Poll::Ready(Err(e)), pos);
        }

        let content = &buf[line.start..line.end];
        pos = line.next;

        if line.is_empty() {
            if let Some((_, name, value)) = pending.take()
                && let Err(e) = commit(headers, name, &value, config)
            {
                return (Poll::Ready(Err(e)), pos);
            }
            trace!(header_count = headers.len(), "header section complete");
            return (Poll::Ready(Ok(())), pos);
        }

        match split_header(content) {
            Some((name, value)) => {
                if let Some((_, name, value)) = pending.take()
                    && let Err(e) = commit(headers, name, &value, config)
                {
                    return (Poll::Ready(Err(e)), pos);
                }
                pending = Some((line.start, name, value));
            }
            None => match pending.as_mut() {
                Some((_, _, value)) => value.push_str(&String::from_utf8_lossy(content)),
                None => warn!(line = %String::from_utf8_lossy(content), "dropping continuation line without a header"),
            },
        }
    }
}

/// Splits `name: value`, or returns `None` for a continuation line.
fn split_header(content: &[u8]) -> Option<(String, String)> {
    if matches!(content.first(), Some(b' ' | b'\t')) {
        return None;
    }

    let colon = content.iter().position(|&b| b == b':')?;
    let name = content[..colon].trim_ascii();
    if name.is_empty() {
        return None;
    }

    let name = String::from_utf8_lossy(name).into_owned();
    let value = String::from_utf8_lossy(&content[colon + 1..]).into_owned();
    Some((name, value))
}

fn commit(headers: &mut Headers, name: String, value: &str, config: &MessageConfig) -> Result<(), ParseError> {
    if !config.allow_invalid_headers() && !is_valid_name(&name) {
        warn!(name, "dropping header with invalid name");
        return Ok(());
    }

    trace!(name, value = value.trim(), "parsed header");
    headers.insert(name, value.trim());

    if headers.len() > config.max_headers() {
        return Err(ParseError::malformed_header(format!("header number exceed the limit {}", config.max_headers())));
    }
    Ok(())
}
