use bytes::BytesMut;
use tokio_util::codec::Encoder;
use tracing::{error, trace};

use crate::codec::Sections;
use crate::protocol::{Message, SendError};

/// Writes whole messages with [`tokio_util::codec::FramedWrite`].
#[derive(Debug, Default)]
pub struct MessageEncoder;

impl MessageEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<Message> for MessageEncoder {
    type Error = SendError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if let Some(reason) = item.invalid_reason() {
            error!(reason, "refusing to send an invalid message");
            return Err(SendError::invalid_message(reason));
        }
        if item.is_invalid() {
            return Err(SendError::invalid_message("message is neither a request nor a response"));
        }

        let len = item.encoded_len();
        dst.reserve(len);
        item.encode_into(Sections::ALL, dst);
        trace!(len, kind = ?item.kind(), "encoded message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::MessageDecoder;
    use futures::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    #[test]
    fn writes_to_bytes() {
        let mut response = Message::response(200);
        response.set_body("hi").unwrap();

        let mut dst = BytesMut::new();
        MessageEncoder::new().encode(response.clone(), &mut dst).unwrap();
        assert_eq!(&dst[..], &response.to_bytes()[..]);
    }

    #[test]
    fn rejects_invalid() {
        let mut dst = BytesMut::new();
        let result = MessageEncoder::new().encode(Message::default(), &mut dst);
        assert!(matches!(result, Err(SendError::InvalidMessage { .. })));
        assert!(dst.is_empty());
    }

    #[tokio::test]
    async fn framed_round_trip() {
        let mut first = Message::request("ANNOUNCE", "/stream").unwrap();
        first.set_header("CSeq", "1").unwrap();
        first.set_body("v=0").unwrap();
        let second = Message::response(204);

        let mut framed = FramedWrite::new(Vec::new(), MessageEncoder::new());
        framed.send(first.clone()).await.unwrap();
        framed.send(second.clone()).await.unwrap();
        let wire = framed.into_inner();

        let decoded: Vec<Message> =
            FramedRead::new(&wire[..], MessageDecoder::new()).map(|message| message.unwrap()).collect().await;
        assert_eq!(decoded, [first, second]);
    }
}
