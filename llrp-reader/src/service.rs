//! Reader client service loop.
//!
//! Owns the reconnect policy: the library reports a lost session and
//! this loop decides to tear it down and start a fresh one.

use std::sync::Arc;

use llrp_core::{ReaderClient, ReaderEvent, TagObservation};
use tokio::sync::{Notify, broadcast};
use tracing::{error, info, warn};

use crate::config::ReaderConfig;

/// Why watching a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// Stop was requested.
    Stopped,
    /// The session is unusable and should be replaced.
    Lost,
}

pub struct ReaderService {
    config: ReaderConfig,
    stop: Arc<Notify>,
}

impl ReaderService {
    pub fn new(config: ReaderConfig) -> Self {
        Self {
            config,
            stop: Arc::new(Notify::new()),
        }
    }

    /// Handle that stops [`run`](Self::run) when notified.
    pub fn stop_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.stop)
    }

    /// Connect, print tags, and reconnect after every lost session
    /// until stopped.
    pub async fn run(&self) {
        let client = ReaderClient::new(self.config.connection_info());
        let mut events = client.subscribe();

        loop {
            info!(reader = %client.info(), "starting reader session");
            let handle = client.connect();
            let end = self.watch(&mut events).await;
            handle.close().await;

            // Drop anything the closed session published after it was lost.
            events = events.resubscribe();

            if end == SessionEnd::Stopped {
                info!("reader client stopped");
                return;
            }

            let delay = self.config.reconnect_delay();
            info!(?delay, "reconnecting to reader");
            tokio::select! {
                _ = self.stop.notified() => {
                    info!("reader client stopped");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn watch(&self, events: &mut broadcast::Receiver<ReaderEvent>) -> SessionEnd {
        loop {
            let event = tokio::select! {
                _ = self.stop.notified() => return SessionEnd::Stopped,
                event = events.recv() => event,
            };

            match event {
                Ok(ReaderEvent::TagObserved(tag)) => self.emit(&tag),
                Ok(ReaderEvent::Timeout(window)) => {
                    warn!(?window, "reader went silent");
                    return SessionEnd::Lost;
                }
                Ok(ReaderEvent::Disconnected(reason)) => {
                    warn!(%reason, "reader disconnected");
                    return SessionEnd::Lost;
                }
                Ok(ReaderEvent::Error(e)) => {
                    error!(error = %e, "reader session failed");
                    return SessionEnd::Lost;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "tag output fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => return SessionEnd::Lost,
            }
        }
    }

    fn emit(&self, tag: &TagObservation) {
        if !self.config.output.json {
            println!("{} {}", tag.tag_id, tag.seen_count);
            return;
        }
        match serde_json::to_string(tag) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "failed to encode tag"),
        }
    }
}
