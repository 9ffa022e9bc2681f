//! Pre-built outbound commands.
//!
//! The client only ever sends six messages and none of them vary at
//! runtime, so each is encoded once and shared by every session.

use std::fmt;
use std::sync::OnceLock;

use bitflags::bitflags;
use bytes::Bytes;

use crate::frame::Frame;
use crate::message::{MessageType, ParameterType};
use crate::parameter::ParameterBuilder;

/// The single read specification installed on the reader.
pub const ROSPEC_ID: u32 = 1;

/// Inventory round length before the reader ends the ROSpec and reports.
pub const AISPEC_DURATION_MS: u32 = 1000;

/// Period at which the reader sends KEEPALIVE.
pub const KEEPALIVE_INTERVAL_MS: u32 = 10_000;

// ReaderEventNotificationSpec event types.
const EVENT_ROSPEC: u16 = 2;

// ROReportSpec trigger: Upon_N_Tags_Or_End_Of_ROSpec.
const REPORT_END_OF_ROSPEC: u8 = 2;

// AISpecStopTrigger type: Duration.
const AISPEC_STOP_DURATION: u8 = 1;

// InventoryParameterSpec protocol: EPCGlobal Class 1 Gen 2.
const PROTOCOL_C1G2: u8 = 1;

// KeepaliveSpec trigger: Periodic.
const KEEPALIVE_PERIODIC: u8 = 1;

bitflags! {
    /// Fields the reader includes in each TagReportData.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ReportContent: u16 {
        const ROSPEC_ID = 1 << 15;
        const SPEC_INDEX = 1 << 14;
        const INVENTORY_PARAMETER_SPEC_ID = 1 << 13;
        const ANTENNA_ID = 1 << 12;
        const CHANNEL_INDEX = 1 << 11;
        const PEAK_RSSI = 1 << 10;
        const FIRST_SEEN_TIMESTAMP = 1 << 9;
        const LAST_SEEN_TIMESTAMP = 1 << 8;
        const TAG_SEEN_COUNT = 1 << 7;
        const ACCESS_SPEC_ID = 1 << 6;
    }
}

/// Report contents requested by the catalog.
pub const REPORT_CONTENT: ReportContent = ReportContent::ANTENNA_ID
    .union(ReportContent::PEAK_RSSI)
    .union(ReportContent::LAST_SEEN_TIMESTAMP)
    .union(ReportContent::TAG_SEEN_COUNT);

// ── OutboundCommand ──────────────────────────────────────────────

/// Every message the session may send to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboundCommand {
    /// SET_READER_CONFIG: reset, event and report configuration.
    ConfigureReader,
    EnableEventsAndReports,
    /// ADD_ROSPEC for [`ROSPEC_ID`].
    AddReadSpec,
    EnableReadSpec,
    StartReadSpec,
    KeepaliveAck,
}

impl OutboundCommand {
    pub const ALL: [OutboundCommand; 6] = [
        OutboundCommand::ConfigureReader,
        OutboundCommand::EnableEventsAndReports,
        OutboundCommand::AddReadSpec,
        OutboundCommand::EnableReadSpec,
        OutboundCommand::StartReadSpec,
        OutboundCommand::KeepaliveAck,
    ];

    pub fn message_type(&self) -> MessageType {
        match self {
            OutboundCommand::ConfigureReader => MessageType::SetReaderConfig,
            OutboundCommand::EnableEventsAndReports => MessageType::EnableEventsAndReports,
            OutboundCommand::AddReadSpec => MessageType::AddRospec,
            OutboundCommand::EnableReadSpec => MessageType::EnableRospec,
            OutboundCommand::StartReadSpec => MessageType::StartRospec,
            OutboundCommand::KeepaliveAck => MessageType::KeepaliveAck,
        }
    }

    fn body(&self) -> Bytes {
        let mut b = ParameterBuilder::new();
        match self {
            OutboundCommand::ConfigureReader => {
                // ResetToFactoryDefault, drops ROSpecs left by an earlier session.
                b.u8(0x80);
                b.tlv(ParameterType::ReaderEventNotificationSpec, |b| {
                    b.tlv(ParameterType::EventNotificationState, |b| {
                        b.u16(EVENT_ROSPEC).u8(0x80);
                    });
                });
                ro_report_spec(&mut b);
                b.tlv(ParameterType::KeepaliveSpec, |b| {
                    b.u8(KEEPALIVE_PERIODIC).u32(KEEPALIVE_INTERVAL_MS);
                });
            }
            OutboundCommand::AddReadSpec => {
                b.tlv(ParameterType::Rospec, |b| {
                    // id, priority, current state (disabled)
                    b.u32(ROSPEC_ID).u8(0).u8(0);
                    b.tlv(ParameterType::RoBoundarySpec, |b| {
                        b.tlv(ParameterType::RospecStartTrigger, |b| {
                            b.u8(0);
                        });
                        b.tlv(ParameterType::RospecStopTrigger, |b| {
                            b.u8(0).u32(0);
                        });
                    });
                    b.tlv(ParameterType::AiSpec, |b| {
                        // one antenna entry, 0 = all antennas
                        b.u16(1).u16(0);
                        b.tlv(ParameterType::AiSpecStopTrigger, |b| {
                            b.u8(AISPEC_STOP_DURATION).u32(AISPEC_DURATION_MS);
                        });
                        b.tlv(ParameterType::InventoryParameterSpec, |b| {
                            b.u16(1).u8(PROTOCOL_C1G2);
                        });
                    });
                    ro_report_spec(b);
                });
            }
            OutboundCommand::EnableReadSpec | OutboundCommand::StartReadSpec => {
                b.u32(ROSPEC_ID);
            }
            OutboundCommand::EnableEventsAndReports | OutboundCommand::KeepaliveAck => {}
        }
        b.finish()
    }
}

fn ro_report_spec(b: &mut ParameterBuilder) {
    b.tlv(ParameterType::RoReportSpec, |b| {
        b.u8(REPORT_END_OF_ROSPEC).u16(0);
        b.tlv(ParameterType::TagReportContentSelector, |b| {
            b.u16(REPORT_CONTENT.bits());
        });
    });
}

impl fmt::Display for OutboundCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ── CommandCatalog ───────────────────────────────────────────────

/// Encoded bytes for each [`OutboundCommand`].
#[derive(Debug)]
pub struct CommandCatalog {
    encoded: [Bytes; 6],
}

static CATALOG: OnceLock<CommandCatalog> = OnceLock::new();

impl CommandCatalog {
    fn build() -> Self {
        Self {
            encoded: OutboundCommand::ALL.map(|command| {
                Frame::new(command.message_type(), 0, command.body()).to_bytes()
            }),
        }
    }

    /// The process-wide catalog, built on first use.
    pub fn global() -> &'static CommandCatalog {
        CATALOG.get_or_init(Self::build)
    }

    /// Encoded message for `command`. Cloning `Bytes` is a refcount bump.
    pub fn get(&self, command: OutboundCommand) -> Bytes {
        let index = match command {
            OutboundCommand::ConfigureReader => 0,
            OutboundCommand::EnableEventsAndReports => 1,
            OutboundCommand::AddReadSpec => 2,
            OutboundCommand::EnableReadSpec => 3,
            OutboundCommand::StartReadSpec => 4,
            OutboundCommand::KeepaliveAck => 5,
        };
        self.encoded[index].clone()
    }
}
