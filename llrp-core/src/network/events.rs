//! Consumer-facing session events.
//!
//! Events go out on a `tokio::sync::broadcast` channel. Publishing never
//! waits on a subscriber: a slow subscriber lags and loses the oldest
//! events instead of stalling the session.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use crate::error::LlrpError;
use crate::report::TagObservation;

/// Default buffer depth per subscriber.
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub enum ReaderEvent {
    /// The reader reported a tag.
    TagObserved(TagObservation),
    /// The reader closed the connection.
    Disconnected(Arc<LlrpError>),
    /// No traffic for the given idle window. The connection stays open.
    Timeout(Duration),
    /// Connecting, reading or writing failed. The session has ended.
    Error(Arc<LlrpError>),
}

/// Fan-out point for [`ReaderEvent`]s. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: broadcast::Sender<ReaderEvent>,
}

impl EventSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReaderEvent> {
        self.tx.subscribe()
    }

    /// Publish to every current subscriber. Having none is not an error.
    pub fn publish(&self, event: ReaderEvent) {
        let _ = self.tx.send(event);
    }

    pub fn error(&self, error: LlrpError) {
        self.publish(ReaderEvent::Error(Arc::new(error)));
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}
