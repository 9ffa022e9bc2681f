//! `tokio_util` codec for LLRP framing.
//!
//! Messages are self-delimiting through the length field of their
//! header, so the decoder only needs to wait until a whole message is
//! buffered. Several messages in one read are yielded one by one; a
//! message split across reads is held until its tail arrives.
//!
//! A whole message with an unsupported protocol version is consumed
//! before its error is returned, so the next call resumes at the
//! following message. Any other error leaves the stream unframeable.

use bytes::{Buf, BytesMut};

use crate::error::LlrpError;
use crate::frame::{Frame, MAX_MESSAGE_SIZE};
use crate::header::{HEADER_LENGTH, MessageHeader};

#[derive(Debug, Default, Clone, Copy)]
pub struct LlrpCodec;

impl tokio_util::codec::Decoder for LlrpCodec {
    type Item = Frame;
    type Error = LlrpError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < HEADER_LENGTH {
            return Ok(None);
        }

        let length = MessageHeader::peek_length(src)? as usize;
        if length > MAX_MESSAGE_SIZE {
            return Err(LlrpError::FrameTooLarge {
                size: length,
                max: MAX_MESSAGE_SIZE,
            });
        }

        if src.len() < length {
            src.reserve(length - src.len());
            return Ok(None);
        }

        let header = match MessageHeader::from_slice(src) {
            Ok(header) => header,
            Err(e) => {
                src.advance(length);
                return Err(e);
            }
        };

        let mut message = src.split_to(length).freeze();
        let body = message.split_off(HEADER_LENGTH);
        Ok(Some(Frame::from_parts(header, body)))
    }
}

impl tokio_util::codec::Encoder<Frame> for LlrpCodec {
    type Error = LlrpError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        item.write_to(dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;
    use bytes::Bytes;
    use tokio_util::codec::{Decoder, Encoder};

    fn encoded(frame: Frame) -> BytesMut {
        let mut buf = BytesMut::new();
        LlrpCodec.encode(frame, &mut buf).unwrap();
        buf
    }

    #[test]
    fn waits_for_complete_header() {
        let mut buf = BytesMut::from(&[0x04u8, 0x3E, 0, 0][..]);
        assert!(LlrpCodec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn holds_partial_message_until_tail_arrives() {
        let frame = Frame::new(MessageType::EnableRospec, 3, Bytes::from_static(&[0, 0, 0, 1]));
        let full = encoded(frame.clone());

        let mut buf = BytesMut::from(&full[..12]);
        assert!(LlrpCodec.decode(&mut buf).unwrap().is_none());
        buf.extend_from_slice(&full[12..]);

        let decoded = LlrpCodec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, frame);
        assert!(buf.is_empty());
    }

    #[test]
    fn yields_coalesced_messages_in_order() {
        let mut buf = encoded(Frame::new(MessageType::Keepalive, 1, Bytes::new()));
        buf.extend_from_slice(&encoded(Frame::new(MessageType::Keepalive, 2, Bytes::new())));

        let first = LlrpCodec.decode(&mut buf).unwrap().unwrap();
        let second = LlrpCodec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.message_id(), 1);
        assert_eq!(second.message_id(), 2);
        assert!(LlrpCodec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn unsupported_version_consumes_its_message() {
        let mut buf = BytesMut::from(&[0x0Cu8, 0x3E, 0, 0, 0, 12, 0, 0, 0, 0, 0xAA, 0xBB][..]);
        buf.extend_from_slice(&encoded(Frame::new(MessageType::Keepalive, 7, Bytes::new())));

        assert!(matches!(
            LlrpCodec.decode(&mut buf),
            Err(LlrpError::UnsupportedVersion(3))
        ));
        let next = LlrpCodec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(next.message_type(), Some(MessageType::Keepalive));
        assert_eq!(next.message_id(), 7);
        assert!(buf.is_empty());
    }

    #[test]
    fn unsupported_version_waits_for_whole_message() {
        let mut buf = BytesMut::from(&[0x0Cu8, 0x3E, 0, 0, 0, 12, 0, 0, 0, 0][..]);
        assert!(LlrpCodec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 10);
    }

    #[test]
    fn rejects_oversized_message() {
        let mut buf = BytesMut::from(&[0x04u8, 0x3D, 0x7F, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0][..]);
        assert!(matches!(
            LlrpCodec.decode(&mut buf),
            Err(LlrpError::FrameTooLarge { .. })
        ));
    }
}
