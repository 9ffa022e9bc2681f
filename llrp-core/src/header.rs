//! LLRP message header.
//!
//! ```text
//!  0               1               2               3
//! +-----+-----+-------------------+-------------------------------+
//! | rsv |ver  |   message type    |        message length ...     |
//! | (3) | (3) |       (10)        |           (32, BE)            |
//! +-----+-----+-------------------+-------------------------------+
//! |  ... length  |               message id (32, BE)              |
//! +--------------+------------------------------------------------+
//! ```
//!
//! The length covers the whole message, header included.

use crate::error::LlrpError;

pub const HEADER_LENGTH: usize = 10;

/// Protocol version written on outbound messages (LLRP 1.0.1).
pub const PROTOCOL_VERSION: u8 = 1;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    version: u8,
    message_type: u16,
    length: u32,
    message_id: u32,
}

impl MessageHeader {
    pub fn new(message_type: u16, message_id: u32, body_length: usize) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            message_type: message_type & 0x03FF,
            length: (HEADER_LENGTH + body_length) as u32,
            message_id,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LENGTH] {
        let mut header = [0; HEADER_LENGTH];
        let word = (u16::from(self.version & 0x07) << 10) | (self.message_type & 0x03FF);
        header[0..2].copy_from_slice(&word.to_be_bytes());
        header[2..6].copy_from_slice(&self.length.to_be_bytes());
        header[6..10].copy_from_slice(&self.message_id.to_be_bytes());
        header
    }

    /// Parse a header. The length is validated before the version, so a
    /// frame with an unsupported version can still be skipped whole.
    pub fn from_bytes(bytes: [u8; HEADER_LENGTH]) -> Result<Self, LlrpError> {
        let length = Self::length_of(&bytes)?;

        let word = u16::from_be_bytes([bytes[0], bytes[1]]);
        let version = ((word >> 10) & 0x07) as u8;
        if !(1..=2).contains(&version) {
            return Err(LlrpError::UnsupportedVersion(version));
        }

        Ok(Self {
            version,
            message_type: word & 0x03FF,
            length,
            message_id: u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]),
        })
    }

    /// Parse a header from the start of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, LlrpError> {
        let mut header = [0; HEADER_LENGTH];
        header.copy_from_slice(Self::prefix(bytes)?);
        Self::from_bytes(header)
    }

    /// Total length announced by the header at the start of `bytes`,
    /// without looking at any other field.
    pub fn peek_length(bytes: &[u8]) -> Result<u32, LlrpError> {
        Self::length_of(Self::prefix(bytes)?)
    }

    fn prefix(bytes: &[u8]) -> Result<&[u8], LlrpError> {
        bytes
            .get(..HEADER_LENGTH)
            .ok_or(LlrpError::InvalidHeader("fewer than 10 bytes"))
    }

    fn length_of(header: &[u8]) -> Result<u32, LlrpError> {
        let length = u32::from_be_bytes([header[2], header[3], header[4], header[5]]);
        if (length as usize) < HEADER_LENGTH {
            return Err(LlrpError::InvalidLength(length));
        }
        Ok(length)
    }

    pub fn message_type(&self) -> u16 {
        self.message_type
    }

    /// Total message length, header included.
    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn message_id(&self) -> u32 {
        self.message_id
    }
}

impl std::fmt::Debug for MessageHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageHeader")
            .field("version", &self.version)
            .field("message_type", &self.message_type)
            .field("length", &self.length)
            .field("message_id", &self.message_id)
            .finish()
    }
}
