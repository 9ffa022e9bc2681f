//! LLRP parameter trees.
//!
//! A message body is a sequence of parameters in one of two encodings:
//!
//! ```text
//! TV:  1ttttttt | value (fixed length, known from the type)
//! TLV: 000000tt tttttttt | length (u16, header included) | body
//! ```
//!
//! Container TLVs (see [`ParameterType::container_fields_len`]) are
//! decoded into sub-parameters; every other TLV keeps its body as an
//! opaque value whose meaning depends on the type.

use std::collections::HashMap;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::LlrpError;
use crate::message::ParameterType;

const TLV_HEADER_LENGTH: usize = 4;

// ── Parameter ────────────────────────────────────────────────────

/// One decoded parameter node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub type_code: u16,
    pub value: Bytes,
    pub sub_parameters: Vec<Parameter>,
}

impl Parameter {
    pub fn leaf(type_code: u16, value: Bytes) -> Self {
        Self {
            type_code,
            value,
            sub_parameters: Vec::new(),
        }
    }

    pub fn is(&self, ty: ParameterType) -> bool {
        self.type_code == ty as u16
    }

    /// Map this parameter's direct children by type code.
    pub fn flatten(&self) -> ParameterMap {
        ParameterMap::flatten(&self.sub_parameters)
    }
}

/// Decode a parameter block into its top-level parameters, in order.
pub fn decode_parameters(block: &Bytes) -> Result<Vec<Parameter>, LlrpError> {
    let mut rest = block.clone();
    let mut params = Vec::new();
    while !rest.is_empty() {
        params.push(decode_one(&mut rest)?);
    }
    Ok(params)
}

fn decode_one(rest: &mut Bytes) -> Result<Parameter, LlrpError> {
    let first = rest[0];
    if first & 0x80 != 0 {
        let code = first & 0x7F;
        let len = ParameterType::tv_value_len(code).ok_or(LlrpError::UnknownTvParameter(code))?;
        ensure_len("TV parameter", 1 + len, rest.len())?;
        rest.advance(1);
        return Ok(Parameter::leaf(u16::from(code), rest.split_to(len)));
    }

    ensure_len("TLV header", TLV_HEADER_LENGTH, rest.len())?;
    let type_code = u16::from_be_bytes([rest[0], rest[1]]) & 0x03FF;
    let length = u16::from_be_bytes([rest[2], rest[3]]) as usize;
    if length < TLV_HEADER_LENGTH {
        return Err(LlrpError::InvalidHeader("TLV length shorter than its header"));
    }
    ensure_len("TLV parameter", length, rest.len())?;

    let mut body = rest.split_to(length);
    body.advance(TLV_HEADER_LENGTH);

    match ParameterType::container_fields_len(type_code) {
        Some(fixed) => {
            ensure_len("container fields", fixed, body.len())?;
            let value = body.split_to(fixed);
            Ok(Parameter {
                type_code,
                value,
                sub_parameters: decode_parameters(&body)?,
            })
        }
        None => Ok(Parameter::leaf(type_code, body)),
    }
}

fn ensure_len(context: &'static str, needed: usize, available: usize) -> Result<(), LlrpError> {
    if available < needed {
        return Err(LlrpError::Truncated {
            context,
            needed,
            available,
        });
    }
    Ok(())
}

// ── ParameterMap ─────────────────────────────────────────────────

/// Sub-parameter values of one parent keyed by type code.
///
/// Built fresh for each parent. When a type code appears more than once
/// the later value overwrites the earlier one; nothing accumulates.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParameterMap {
    values: HashMap<u16, Bytes>,
}

impl ParameterMap {
    pub fn flatten(params: &[Parameter]) -> Self {
        let mut values = HashMap::with_capacity(params.len());
        for param in params {
            values.insert(param.type_code, param.value.clone());
        }
        Self { values }
    }

    pub fn get(&self, ty: ParameterType) -> Option<&Bytes> {
        self.values.get(&(ty as u16))
    }
}

// ── ParameterBuilder ─────────────────────────────────────────────

/// Encoder for parameter blocks.
///
/// TLV lengths are back-patched once the nested body has been written:
///
/// ```
/// use llrp_core::message::ParameterType;
/// use llrp_core::parameter::ParameterBuilder;
///
/// let mut b = ParameterBuilder::new();
/// b.tlv(ParameterType::TagReportData, |b| {
///     b.tv(ParameterType::TagSeenCount, &[0, 2]);
/// });
/// assert_eq!(&b.finish()[..], &[0x00, 0xF0, 0x00, 0x07, 0x88, 0x00, 0x02]);
/// ```
#[derive(Debug, Default)]
pub struct ParameterBuilder {
    buf: BytesMut,
}

impl ParameterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.buf.put_u8(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.put_u16(value);
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32(value);
        self
    }

    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.buf.put_u64(value);
        self
    }

    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.buf.put_slice(value);
        self
    }

    /// Write a TV parameter. `value` must have the type's fixed length.
    pub fn tv(&mut self, ty: ParameterType, value: &[u8]) -> &mut Self {
        debug_assert!(ty.is_tv());
        debug_assert_eq!(ParameterType::tv_value_len(ty as u8), Some(value.len()));
        self.buf.put_u8(0x80 | (ty as u8));
        self.buf.put_slice(value);
        self
    }

    pub fn tlv(&mut self, ty: ParameterType, fill: impl FnOnce(&mut Self)) -> &mut Self {
        self.tlv_code(ty as u16, fill)
    }

    /// Write a TLV parameter for any type code, known or not.
    pub fn tlv_code(&mut self, type_code: u16, fill: impl FnOnce(&mut Self)) -> &mut Self {
        let start = self.buf.len();
        self.buf.put_u16(type_code & 0x03FF);
        self.buf.put_u16(0);
        fill(self);
        let length = (self.buf.len() - start) as u16;
        self.buf[start + 2..start + 4].copy_from_slice(&length.to_be_bytes());
        self
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag_report(epc: &[u8; 12], count: Option<u16>) -> Bytes {
        let mut b = ParameterBuilder::new();
        b.tlv(ParameterType::TagReportData, |b| {
            b.tv(ParameterType::Epc96, epc);
            b.tv(ParameterType::AntennaId, &1u16.to_be_bytes());
            if let Some(count) = count {
                b.tv(ParameterType::TagSeenCount, &count.to_be_bytes());
            }
        });
        b.finish()
    }

    #[test]
    fn decodes_container_with_tv_children() {
        let block = tag_report(&[0xAA; 12], Some(3));
        let params = decode_parameters(&block).unwrap();
        assert_eq!(params.len(), 1);

        let report = &params[0];
        assert!(report.is(ParameterType::TagReportData));
        assert!(report.value.is_empty());
        assert_eq!(report.sub_parameters.len(), 3);
        assert!(report.sub_parameters[0].is(ParameterType::Epc96));
        assert_eq!(&report.sub_parameters[2].value[..], &[0, 3]);
    }

    #[test]
    fn non_container_tlv_keeps_raw_body() {
        let mut b = ParameterBuilder::new();
        b.tlv(ParameterType::RospecEvent, |b| {
            b.u8(1).u32(1).u32(0);
        });
        let params = decode_parameters(&b.finish()).unwrap();
        assert_eq!(params[0].value.len(), 9);
        assert!(params[0].sub_parameters.is_empty());
    }

    #[test]
    fn unknown_tlv_is_kept_as_leaf() {
        let mut b = ParameterBuilder::new();
        b.tlv_code(1023, |b| {
            b.u32(0xDEADBEEF);
        });
        let params = decode_parameters(&b.finish()).unwrap();
        assert_eq!(params[0].type_code, 1023);
        assert_eq!(&params[0].value[..], &[0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn unknown_tv_stops_decoding() {
        let block = Bytes::from_static(&[0xFF, 0x00]);
        assert!(matches!(
            decode_parameters(&block),
            Err(LlrpError::UnknownTvParameter(0x7F))
        ));
    }

    #[test]
    fn truncated_tlv_is_an_error() {
        let mut block = BytesMut::from(&tag_report(&[0x11; 12], None)[..]);
        block.truncate(block.len() - 3);
        assert!(matches!(
            decode_parameters(&block.freeze()),
            Err(LlrpError::Truncated { .. })
        ));
    }

    #[test]
    fn tlv_length_below_header_is_an_error() {
        let block = Bytes::from_static(&[0x00, 0xF0, 0x00, 0x02]);
        assert!(decode_parameters(&block).is_err());
    }

    #[test]
    fn flatten_last_write_wins() {
        let params = vec![
            Parameter::leaf(ParameterType::TagSeenCount as u16, Bytes::from_static(&[0, 1])),
            Parameter::leaf(ParameterType::AntennaId as u16, Bytes::from_static(&[0, 4])),
            Parameter::leaf(ParameterType::TagSeenCount as u16, Bytes::from_static(&[0, 9])),
        ];
        let map = ParameterMap::flatten(&params);
        assert_eq!(&map.get(ParameterType::TagSeenCount).unwrap()[..], &[0, 9]);
        assert_eq!(&map.get(ParameterType::AntennaId).unwrap()[..], &[0, 4]);
    }

    #[test]
    fn flatten_empty() {
        assert!(ParameterMap::flatten(&[]).get(ParameterType::Epc96).is_none());
    }
}
