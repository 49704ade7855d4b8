//! Answers every RTSP request on a connection with `200 OK`, echoing its `CSeq`.
//!
//! ```text
//! cargo run --example rtsp_server
//! printf 'OPTIONS * RTSP/1.0\r\nCSeq: 1\r\n\r\n' | nc 127.0.0.1 8554
//! ```

use futures::{SinkExt, StreamExt};
use micro_message::codec::{MessageDecoder, MessageEncoder};
use micro_message::protocol::{Message, MessageConfig, Version};
use tokio::net::TcpListener;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!(port = 8554, "start listening");
    let tcp_listener = match TcpListener::bind("127.0.0.1:8554").await {
        Ok(tcp_listener) => tcp_listener,
        Err(e) => {
            error!(cause = %e, "bind server error");
            return;
        }
    };

    loop {
        let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
            Ok(stream_and_addr) => stream_and_addr,
            Err(e) => {
                warn!(cause = %e, "failed to accept");
                continue;
            }
        };

        tokio::spawn(async move {
            let config = MessageConfig::default().with_protocol("RTSP");
            let (reader, writer) = tcp_stream.into_split();
            let mut requests = FramedRead::new(reader, MessageDecoder::with_config(config.clone()));
            let mut responses = FramedWrite::new(writer, MessageEncoder::new());

            while let Some(request) = requests.next().await {
                let request = match request {
                    Ok(request) if request.is_request() => request,
                    Ok(message) => {
                        warn!(%remote_addr, reason = message.invalid_reason(), "dropping message");
                        continue;
                    }
                    Err(e) => {
                        error!(%remote_addr, cause = %e, "connection error");
                        break;
                    }
                };
                info!(%remote_addr, method = request.method_text(), target = request.target(), "request");

                let mut response = Message::response(200).with_config(config.clone());
                response.set_version(Version::V1_0);
                if let Some(cseq) = request.header("CSeq")
                    && let Err(e) = response.set_header("CSeq", cseq)
                {
                    warn!(cause = %e, "invalid CSeq");
                }

                if let Err(e) = responses.send(response).await {
                    error!(%remote_addr, cause = %e, "failed to send response");
                    break;
                }
            }
            info!(%remote_addr, "connection closed");
        });
    }
}
