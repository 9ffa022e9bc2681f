//! # llrp-core
//!
//! Client-side session library for LLRP RFID readers.
//!
//! This crate contains:
//! - **Framing**: `MessageHeader`, `Frame` and `LlrpCodec` for `tokio_util`
//! - **Parameters**: recursive TLV/TV decoding, `ParameterMap` flattening
//!   and `ParameterBuilder` encoding
//! - **Catalog**: the six pre-built commands the client sends
//! - **State**: `SessionState`, the handshake state machine and dispatcher
//! - **Reports**: `TagObservation` extraction and status parsing
//! - **Network**: `ReaderClient`, the per-reader session task and its
//!   broadcast `ReaderEvent`s
//! - **Error**: `LlrpError`, a typed `thiserror`-based error hierarchy

pub mod catalog;
pub mod codec;
pub mod error;
pub mod frame;
pub mod header;
pub mod message;
pub mod network;
pub mod parameter;
pub mod report;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use catalog::{CommandCatalog, OutboundCommand};
pub use codec::LlrpCodec;
pub use error::LlrpError;
pub use frame::{Frame, MAX_MESSAGE_SIZE};
pub use header::{HEADER_LENGTH, MessageHeader};
pub use message::{MessageType, ParameterType};
pub use network::{
    ConnectionInfo, EventSink, ReaderClient, ReaderEvent, ReaderHandle, ReaderOptions,
    SessionPump,
};
pub use parameter::{Parameter, ParameterBuilder, ParameterMap};
pub use report::{LlrpStatus, TagObservation};
pub use state::{Reaction, SessionState};
