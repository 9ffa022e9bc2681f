//! # llrp-reader: LLRP reader client
//!
//! Connects to an RFID reader over LLRP, drives it into continuous
//! inventory, and prints every tag observation to stdout, either as a
//! plain `tag_id seen_count` line or as JSON.
//!
//! Reconnecting is this crate's job: `llrp-core` only reports a lost
//! session, and [`service::ReaderService`] replaces it after a delay.

pub mod config;
pub mod service;
