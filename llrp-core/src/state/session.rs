//! Reader session state machine.
//!
//! The session does not drive a fixed sequence. It reacts to each
//! inbound message by type, and the handshake order comes from the
//! order in which the reader replies:
//!
//! ```text
//!  READER_EVENT_NOTIFICATION ──► SET_READER_CONFIG      (first time only)
//!  SET_READER_CONFIG_RESPONSE ─► ADD_ROSPEC
//!  ADD_ROSPEC_RESPONSE ────────► ENABLE_ROSPEC
//!  ENABLE_ROSPEC_RESPONSE ─────► START_ROSPEC            (guarded)
//!  START_ROSPEC_RESPONSE ──────► ENABLE_EVENTS_AND_REPORTS
//!  READER_EVENT_NOTIFICATION ──► START_ROSPEC            (guarded, once configured)
//!  RO_ACCESS_REPORT ───────────► tag events, start guard cleared
//!  KEEPALIVE ──────────────────► KEEPALIVE_ACK
//! ```

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::{debug, warn};

use crate::catalog::OutboundCommand;
use crate::codec::LlrpCodec;
use crate::error::LlrpError;
use crate::frame::Frame;
use crate::message::MessageType;
use crate::report::{self, LlrpStatus, TagObservation};

// ── Reaction ─────────────────────────────────────────────────────

/// What the session decided to do about one inbound message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reaction {
    /// Command to write back to the reader, if any.
    pub command: Option<OutboundCommand>,
    /// Tag observations to publish, in report order.
    pub observations: Vec<TagObservation>,
}

impl Reaction {
    fn send(command: OutboundCommand) -> Self {
        Self {
            command: Some(command),
            observations: Vec::new(),
        }
    }
}

// ── SessionState ─────────────────────────────────────────────────

/// Per-connection session state.
///
/// `config_sent` is set once and never cleared for the life of the
/// connection. `spec_start_sent` is set when START_ROSPEC goes out and
/// cleared when the reader reports the end of a cycle.
#[derive(Debug, Default)]
pub struct SessionState {
    config_sent: bool,
    spec_start_sent: bool,
    codec: LlrpCodec,
    logging: bool,
}

impl SessionState {
    pub fn new(logging: bool) -> Self {
        Self {
            logging,
            ..Default::default()
        }
    }

    pub fn config_sent(&self) -> bool {
        self.config_sent
    }

    pub fn spec_start_sent(&self) -> bool {
        self.spec_start_sent
    }

    /// Decode every complete message in `buf` and dispatch each in order.
    ///
    /// An empty buffer is not decoded at all. A message with an
    /// unsupported version is skipped on its own and decoding carries on
    /// with the next one. Bytes that cannot be framed are discarded; an
    /// incomplete trailing message stays in `buf` for the next read.
    pub fn ingest(&mut self, buf: &mut BytesMut) -> Vec<Reaction> {
        let mut reactions = Vec::new();
        if buf.is_empty() {
            return reactions;
        }

        loop {
            match self.codec.decode(buf) {
                Ok(Some(frame)) => reactions.push(self.dispatch(&frame)),
                Ok(None) => break,
                Err(e @ LlrpError::UnsupportedVersion(_)) => {
                    warn!(error = %e, "dropping reader message");
                }
                Err(e) => {
                    warn!(error = %e, discarded = buf.len(), "dropping unframeable reader data");
                    buf.clear();
                    break;
                }
            }
        }
        reactions
    }

    /// React to a single inbound message.
    pub fn dispatch(&mut self, frame: &Frame) -> Reaction {
        let Some(message_type) = frame.message_type() else {
            if self.logging {
                debug!(type_code = frame.type_code(), "ignoring unknown message type");
            }
            return Reaction::default();
        };

        if self.logging {
            debug!(%message_type, message_id = frame.message_id(), "reader message");
        }

        let reaction = match message_type {
            MessageType::ReaderEventNotification => self.on_reader_event(frame),
            MessageType::SetReaderConfigResponse => {
                self.check_status(message_type, frame);
                Reaction::send(OutboundCommand::AddReadSpec)
            }
            MessageType::AddRospecResponse => {
                self.check_status(message_type, frame);
                Reaction::send(OutboundCommand::EnableReadSpec)
            }
            MessageType::EnableRospecResponse => {
                self.check_status(message_type, frame);
                self.start_read_spec()
            }
            MessageType::StartRospecResponse => {
                self.check_status(message_type, frame);
                Reaction::send(OutboundCommand::EnableEventsAndReports)
            }
            MessageType::RoAccessReport => self.on_tag_report(frame),
            MessageType::Keepalive => Reaction::send(OutboundCommand::KeepaliveAck),
            other => {
                if other.is_response() {
                    self.check_status(other, frame);
                }
                Reaction::default()
            }
        };

        if self.logging {
            if let Some(command) = reaction.command {
                debug!(%command, "sending command");
            }
        }
        reaction
    }

    // ── Handlers ─────────────────────────────────────────────────

    fn on_reader_event(&mut self, frame: &Frame) -> Reaction {
        let params = match frame.parameters() {
            Ok(params) => params,
            Err(e) => {
                warn!(error = %e, "dropping malformed reader event notification");
                return Reaction::default();
            }
        };

        if let Some(status) = report::connection_attempt_status(&params) {
            if status != 0 {
                warn!(status, "reader reported a failed connection attempt");
            }
        }

        if report::is_cycle_end(&params) {
            self.spec_start_sent = false;
        }

        if !self.config_sent {
            self.config_sent = true;
            return Reaction::send(OutboundCommand::ConfigureReader);
        }
        self.start_read_spec()
    }

    fn on_tag_report(&mut self, frame: &Frame) -> Reaction {
        let params = match frame.parameters() {
            Ok(params) => params,
            Err(e) => {
                warn!(error = %e, "dropping malformed tag report");
                return Reaction::default();
            }
        };

        self.spec_start_sent = false;
        Reaction {
            command: None,
            observations: report::tag_observations(&params),
        }
    }

    fn start_read_spec(&mut self) -> Reaction {
        if self.spec_start_sent {
            return Reaction::default();
        }
        self.spec_start_sent = true;
        Reaction::send(OutboundCommand::StartReadSpec)
    }

    fn check_status(&self, message_type: MessageType, frame: &Frame) {
        let Ok(params) = frame.parameters() else {
            return;
        };
        if let Some(status) = LlrpStatus::find(&params) {
            if !status.is_success() {
                warn!(
                    %message_type,
                    code = status.code,
                    description = %status.description,
                    "reader returned an error status"
                );
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
