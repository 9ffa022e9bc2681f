pub mod connection;
pub mod events;

pub use connection::{
    ConnectionInfo, DEFAULT_HOST, DEFAULT_PORT, INACTIVITY_TIMEOUT, ReaderClient, ReaderHandle,
    ReaderOptions, SessionPump,
};
pub use events::{EventSink, ReaderEvent};
