//! LLRP message and parameter type codes.
//!
//! Uses proper enums with `TryFrom`. Unknown values are errors, never
//! panics, so callers can ignore message kinds they do not handle.

use crate::error::LlrpError;
use std::fmt;

// ── MessageType ──────────────────────────────────────────────────

/// LLRP message types known to this client.
///
/// Only a handful drive the session handshake; the rest are listed so
/// that logs can name what the reader sent.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    // ── Reader configuration ─────────────────────────────────────
    GetReaderCapabilities = 1,
    GetReaderConfig = 2,
    SetReaderConfig = 3,
    CloseConnectionResponse = 4,
    GetReaderCapabilitiesResponse = 11,
    GetReaderConfigResponse = 12,
    SetReaderConfigResponse = 13,
    CloseConnection = 14,

    // ── ROSpec operations ────────────────────────────────────────
    AddRospec = 20,
    DeleteRospec = 21,
    StartRospec = 22,
    StopRospec = 23,
    EnableRospec = 24,
    DisableRospec = 25,
    GetRospecs = 26,
    AddRospecResponse = 30,
    DeleteRospecResponse = 31,
    StartRospecResponse = 32,
    StopRospecResponse = 33,
    EnableRospecResponse = 34,
    DisableRospecResponse = 35,
    GetRospecsResponse = 36,

    // ── Reports and events ───────────────────────────────────────
    GetReport = 60,
    RoAccessReport = 61,
    Keepalive = 62,
    ReaderEventNotification = 63,
    EnableEventsAndReports = 64,
    KeepaliveAck = 72,
    ErrorMessage = 100,
}

impl TryFrom<u16> for MessageType {
    type Error = LlrpError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(MessageType::GetReaderCapabilities),
            2 => Ok(MessageType::GetReaderConfig),
            3 => Ok(MessageType::SetReaderConfig),
            4 => Ok(MessageType::CloseConnectionResponse),
            11 => Ok(MessageType::GetReaderCapabilitiesResponse),
            12 => Ok(MessageType::GetReaderConfigResponse),
            13 => Ok(MessageType::SetReaderConfigResponse),
            14 => Ok(MessageType::CloseConnection),

            20 => Ok(MessageType::AddRospec),
            21 => Ok(MessageType::DeleteRospec),
            22 => Ok(MessageType::StartRospec),
            23 => Ok(MessageType::StopRospec),
            24 => Ok(MessageType::EnableRospec),
            25 => Ok(MessageType::DisableRospec),
            26 => Ok(MessageType::GetRospecs),
            30 => Ok(MessageType::AddRospecResponse),
            31 => Ok(MessageType::DeleteRospecResponse),
            32 => Ok(MessageType::StartRospecResponse),
            33 => Ok(MessageType::StopRospecResponse),
            34 => Ok(MessageType::EnableRospecResponse),
            35 => Ok(MessageType::DisableRospecResponse),
            36 => Ok(MessageType::GetRospecsResponse),

            60 => Ok(MessageType::GetReport),
            61 => Ok(MessageType::RoAccessReport),
            62 => Ok(MessageType::Keepalive),
            63 => Ok(MessageType::ReaderEventNotification),
            64 => Ok(MessageType::EnableEventsAndReports),
            72 => Ok(MessageType::KeepaliveAck),
            100 => Ok(MessageType::ErrorMessage),

            _ => Err(LlrpError::UnknownVariant {
                type_name: "MessageType",
                value: value as u64,
            }),
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl MessageType {
    /// Returns `true` for reader replies that carry an `LLRPStatus`.
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            MessageType::CloseConnectionResponse
                | MessageType::GetReaderCapabilitiesResponse
                | MessageType::GetReaderConfigResponse
                | MessageType::SetReaderConfigResponse
                | MessageType::AddRospecResponse
                | MessageType::DeleteRospecResponse
                | MessageType::StartRospecResponse
                | MessageType::StopRospecResponse
                | MessageType::EnableRospecResponse
                | MessageType::DisableRospecResponse
                | MessageType::GetRospecsResponse
                | MessageType::ErrorMessage
        )
    }
}

// ── ParameterType ────────────────────────────────────────────────

/// LLRP parameter types used by this client.
///
/// Codes `1..=127` are TV-encoded (fixed length, no length field);
/// codes `128..=1023` are TLV-encoded.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    // ── TV (0x01..0x7F) ──────────────────────────────────────────
    AntennaId = 1,
    FirstSeenTimestampUtc = 2,
    FirstSeenTimestampUptime = 3,
    LastSeenTimestampUtc = 4,
    LastSeenTimestampUptime = 5,
    PeakRssi = 6,
    ChannelIndex = 7,
    TagSeenCount = 8,
    RospecId = 9,
    InventoryParameterSpecId = 10,
    C1g2Crc = 11,
    C1g2Pc = 12,
    Epc96 = 13,
    SpecIndex = 14,
    ClientRequestOpSpecResult = 15,
    AccessSpecId = 16,
    OpSpecId = 17,
    C1g2SingulationDetails = 18,
    C1g2XpcW1 = 19,
    C1g2XpcW2 = 20,

    // ── TLV (0x80..0x3FF) ────────────────────────────────────────
    UtcTimestamp = 128,
    Uptime = 129,
    Rospec = 177,
    RoBoundarySpec = 178,
    RospecStartTrigger = 179,
    RospecStopTrigger = 182,
    AiSpec = 183,
    AiSpecStopTrigger = 184,
    InventoryParameterSpec = 186,
    KeepaliveSpec = 220,
    RoReportSpec = 237,
    TagReportContentSelector = 238,
    TagReportData = 240,
    EpcData = 241,
    ReaderEventNotificationSpec = 244,
    EventNotificationState = 245,
    ReaderEventNotificationData = 246,
    RospecEvent = 249,
    ConnectionAttemptEvent = 256,
    LlrpStatus = 287,
}

impl TryFrom<u16> for ParameterType {
    type Error = LlrpError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ParameterType::AntennaId),
            2 => Ok(ParameterType::FirstSeenTimestampUtc),
            3 => Ok(ParameterType::FirstSeenTimestampUptime),
            4 => Ok(ParameterType::LastSeenTimestampUtc),
            5 => Ok(ParameterType::LastSeenTimestampUptime),
            6 => Ok(ParameterType::PeakRssi),
            7 => Ok(ParameterType::ChannelIndex),
            8 => Ok(ParameterType::TagSeenCount),
            9 => Ok(ParameterType::RospecId),
            10 => Ok(ParameterType::InventoryParameterSpecId),
            11 => Ok(ParameterType::C1g2Crc),
            12 => Ok(ParameterType::C1g2Pc),
            13 => Ok(ParameterType::Epc96),
            14 => Ok(ParameterType::SpecIndex),
            15 => Ok(ParameterType::ClientRequestOpSpecResult),
            16 => Ok(ParameterType::AccessSpecId),
            17 => Ok(ParameterType::OpSpecId),
            18 => Ok(ParameterType::C1g2SingulationDetails),
            19 => Ok(ParameterType::C1g2XpcW1),
            20 => Ok(ParameterType::C1g2XpcW2),

            128 => Ok(ParameterType::UtcTimestamp),
            129 => Ok(ParameterType::Uptime),
            177 => Ok(ParameterType::Rospec),
            178 => Ok(ParameterType::RoBoundarySpec),
            179 => Ok(ParameterType::RospecStartTrigger),
            182 => Ok(ParameterType::RospecStopTrigger),
            183 => Ok(ParameterType::AiSpec),
            184 => Ok(ParameterType::AiSpecStopTrigger),
            186 => Ok(ParameterType::InventoryParameterSpec),
            220 => Ok(ParameterType::KeepaliveSpec),
            237 => Ok(ParameterType::RoReportSpec),
            238 => Ok(ParameterType::TagReportContentSelector),
            240 => Ok(ParameterType::TagReportData),
            241 => Ok(ParameterType::EpcData),
            244 => Ok(ParameterType::ReaderEventNotificationSpec),
            245 => Ok(ParameterType::EventNotificationState),
            246 => Ok(ParameterType::ReaderEventNotificationData),
            249 => Ok(ParameterType::RospecEvent),
            256 => Ok(ParameterType::ConnectionAttemptEvent),
            287 => Ok(ParameterType::LlrpStatus),

            _ => Err(LlrpError::UnknownVariant {
                type_name: "ParameterType",
                value: value as u64,
            }),
        }
    }
}

impl ParameterType {
    /// Value length in bytes of a TV parameter, excluding its type byte.
    ///
    /// Returns `None` for TLV types and for TV codes this client does not
    /// know, which cannot be skipped because TV carries no length.
    pub fn tv_value_len(code: u8) -> Option<usize> {
        match code {
            1 | 7 | 8 | 10 | 11 | 12 | 14 | 15 | 17 | 19 | 20 => Some(2),
            2..=5 => Some(8),
            6 => Some(1),
            9 | 16 | 18 => Some(4),
            13 => Some(12),
            _ => None,
        }
    }

    /// Returns `true` for TV-encoded parameter types.
    pub fn is_tv(&self) -> bool {
        (*self as u16) < 128
    }

    /// Number of fixed-field bytes that precede the sub-parameters of a
    /// container TLV, or `None` when the TLV body is an opaque value.
    pub fn container_fields_len(code: u16) -> Option<usize> {
        match code {
            246 | 240 => Some(0),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_type_roundtrip() {
        let types = [
            MessageType::SetReaderConfigResponse,
            MessageType::AddRospecResponse,
            MessageType::EnableRospecResponse,
            MessageType::StartRospecResponse,
            MessageType::RoAccessReport,
            MessageType::Keepalive,
            MessageType::ReaderEventNotification,
            MessageType::KeepaliveAck,
        ];
        for ty in types {
            assert_eq!(MessageType::try_from(ty as u16).unwrap(), ty);
        }
    }

    #[test]
    fn message_type_invalid() {
        assert!(MessageType::try_from(0x3FF).is_err());
    }

    #[test]
    fn responses_are_flagged() {
        assert!(MessageType::AddRospecResponse.is_response());
        assert!(!MessageType::Keepalive.is_response());
        assert!(!MessageType::RoAccessReport.is_response());
    }

    #[test]
    fn tv_lengths() {
        assert_eq!(ParameterType::tv_value_len(ParameterType::Epc96 as u8), Some(12));
        assert_eq!(ParameterType::tv_value_len(ParameterType::TagSeenCount as u8), Some(2));
        assert_eq!(ParameterType::tv_value_len(ParameterType::PeakRssi as u8), Some(1));
        assert_eq!(ParameterType::tv_value_len(ParameterType::OpSpecId as u8), Some(2));
        assert_eq!(ParameterType::tv_value_len(ParameterType::C1g2SingulationDetails as u8), Some(4));
        assert_eq!(ParameterType::tv_value_len(ParameterType::C1g2XpcW2 as u8), Some(2));
        assert_eq!(ParameterType::tv_value_len(0x7F), None);
        assert!(ParameterType::Epc96.is_tv());
        assert!(!ParameterType::TagReportData.is_tv());
    }

    #[test]
    fn parameter_type_invalid() {
        assert!(ParameterType::try_from(1023).is_err());
    }
}
