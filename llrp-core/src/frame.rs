use std::fmt::Debug;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::LlrpError;
use crate::header::{HEADER_LENGTH, MessageHeader};
use crate::message::MessageType;
use crate::parameter::{Parameter, decode_parameters};

/// Upper bound on a single inbound message, header included.
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// One framed LLRP message: header plus its opaque parameter block.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    header: MessageHeader,
    body: Bytes,
}

impl Frame {
    pub fn new(message_type: MessageType, message_id: u32, body: Bytes) -> Self {
        Self::with_type_code(message_type as u16, message_id, body)
    }

    /// Build a frame for an arbitrary type code, including ones this
    /// client does not know.
    pub fn with_type_code(type_code: u16, message_id: u32, body: Bytes) -> Self {
        Self {
            header: MessageHeader::new(type_code, message_id, body.len()),
            body,
        }
    }

    pub(crate) fn from_parts(header: MessageHeader, body: Bytes) -> Self {
        Self { header, body }
    }

    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    pub fn type_code(&self) -> u16 {
        self.header.message_type()
    }

    /// The message type, or `None` for kinds this client does not know.
    pub fn message_type(&self) -> Option<MessageType> {
        MessageType::try_from(self.type_code()).ok()
    }

    pub fn message_id(&self) -> u32 {
        self.header.message_id()
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decode the parameter block into its top-level parameters.
    pub fn parameters(&self) -> Result<Vec<Parameter>, LlrpError> {
        decode_parameters(&self.body)
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(HEADER_LENGTH + self.body.len());
        self.write_to(&mut out);
        out.freeze()
    }

    pub fn write_to(&self, dst: &mut BytesMut) {
        dst.reserve(HEADER_LENGTH + self.body.len());
        dst.put_slice(&self.header.to_bytes());
        dst.put_slice(&self.body);
    }
}

impl Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("header", &self.header)
            .field("body_len", &self.body.len())
            .finish()
    }
}
