//! Reads one message from stdin through the blocking socket loop and prints what was parsed.
//!
//! ```text
//! printf 'RTSP/1.0 200 OK\r\nCSeq: 1\r\n\r\n' | cargo run --example parse_stream -- RTSP
//! ```

use std::io;

use micro_message::protocol::{Message, MessageConfig};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let protocol = std::env::args().nth(1).unwrap_or_else(|| "HTTP".to_owned());
    let mut message = Message::inbound(MessageConfig::default().with_protocol(protocol));

    let mut stdin = io::stdin().lock();
    match message.complete_from(Some(&mut stdin), b"") {
        Ok(consumed) => info!(consumed, "finished reading"),
        Err(e) => {
            error!(cause = %e, "failed to read message");
            return;
        }
    }

    if let Some(reason) = message.invalid_reason() {
        warn!(reason, "message is invalid");
        return;
    }

    info!(kind = ?message.kind(), version = %message.version(), complete = message.is_complete(), "status line");
    for (name, value) in message.headers().iter() {
        info!(name, value, "header");
    }
    match message.body_text() {
        Ok(text) => info!(len = message.body().len(), body = %text, "body"),
        Err(e) => warn!(cause = %e, "body is not text"),
    }
}
