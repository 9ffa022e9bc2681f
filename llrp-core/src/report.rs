//! Structured data pulled out of inbound parameter trees.

use std::fmt::Write as _;

use serde::Serialize;

use crate::message::ParameterType;
use crate::parameter::{Parameter, ParameterMap};

/// ROSpecEvent event type reported when a ROSpec run has finished.
pub const ROSPEC_EVENT_END: u8 = 1;

// ── TagObservation ───────────────────────────────────────────────

/// One tag seen by the reader, as published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagObservation {
    /// Lowercase hex EPC.
    pub tag_id: String,
    /// Times the tag was seen in the reported round; 0 when not reported.
    pub seen_count: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub antenna_id: Option<u16>,
    /// Peak RSSI in dBm.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_rssi: Option<i8>,
}

impl TagObservation {
    /// Build an observation from a flattened TagReportData.
    ///
    /// Returns `None` when no EPC is present: such reports are never
    /// published. Every other field falls back to its default.
    pub fn from_report(fields: &ParameterMap) -> Option<Self> {
        let tag_id = fields
            .get(ParameterType::Epc96)
            .map(|epc| hex(epc))
            .or_else(|| fields.get(ParameterType::EpcData).and_then(|data| epc_data_hex(data)))?;

        Some(Self {
            tag_id,
            seen_count: fields
                .get(ParameterType::TagSeenCount)
                .and_then(|v| be_u16(v))
                .unwrap_or(0),
            antenna_id: fields.get(ParameterType::AntennaId).and_then(|v| be_u16(v)),
            peak_rssi: fields
                .get(ParameterType::PeakRssi)
                .and_then(|v| v.first())
                .map(|b| *b as i8),
        })
    }
}

/// Observations for every TagReportData in a report, in message order.
pub fn tag_observations(params: &[Parameter]) -> Vec<TagObservation> {
    params
        .iter()
        .filter(|p| p.is(ParameterType::TagReportData))
        .filter_map(|p| TagObservation::from_report(&p.flatten()))
        .collect()
}

// ── Reader events ────────────────────────────────────────────────

/// Returns `true` if a reader event notification reports the end of a
/// ROSpec run.
///
/// Only one ROSpec is ever installed, so the ROSpec id in the event is
/// not compared.
pub fn is_cycle_end(params: &[Parameter]) -> bool {
    params
        .iter()
        .filter(|p| p.is(ParameterType::ReaderEventNotificationData))
        .any(|p| {
            p.flatten()
                .get(ParameterType::RospecEvent)
                .and_then(|event| event.first())
                .is_some_and(|event_type| *event_type == ROSPEC_EVENT_END)
        })
}

/// Status carried by a ConnectionAttemptEvent, if the notification has one.
pub fn connection_attempt_status(params: &[Parameter]) -> Option<u16> {
    params
        .iter()
        .filter(|p| p.is(ParameterType::ReaderEventNotificationData))
        .find_map(|p| p.flatten().get(ParameterType::ConnectionAttemptEvent).and_then(|v| be_u16(v)))
}

// ── LLRPStatus ───────────────────────────────────────────────────

/// `LLRPStatus` from a reader reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlrpStatus {
    pub code: u16,
    pub description: String,
}

impl LlrpStatus {
    pub const SUCCESS: u16 = 0;

    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCESS
    }

    /// Find and parse the top-level LLRPStatus of a reply.
    pub fn find(params: &[Parameter]) -> Option<Self> {
        let value = &params.iter().find(|p| p.is(ParameterType::LlrpStatus))?.value;
        let code = be_u16(value)?;
        let description = value
            .get(2..4)
            .and_then(be_u16)
            .and_then(|len| value.get(4..4 + len as usize))
            .map(|text| String::from_utf8_lossy(text).into_owned())
            .unwrap_or_default();
        Some(Self { code, description })
    }
}

// ── Helpers ──────────────────────────────────────────────────────

fn be_u16(bytes: &[u8]) -> Option<u16> {
    Some(u16::from_be_bytes([*bytes.first()?, *bytes.get(1)?]))
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// EPCData: bit count followed by the EPC, padded to whole bytes.
fn epc_data_hex(value: &[u8]) -> Option<String> {
    let bits = be_u16(value)? as usize;
    let epc = value.get(2..2 + bits.div_ceil(8))?;
    Some(hex(epc))
}
