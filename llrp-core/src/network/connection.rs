use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::CommandCatalog;
use crate::error::LlrpError;
use crate::network::events::{EVENT_CHANNEL_CAPACITY, EventSink, ReaderEvent};
use crate::state::SessionState;

pub const DEFAULT_HOST: &str = "192.168.0.30";
pub const DEFAULT_PORT: u16 = 5084;

/// Silence on the socket after which a `Timeout` event is published.
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(60);

const READ_BUFFER_SIZE: usize = 8 * 1024;

// ── ConnectionInfo ───────────────────────────────────────────────

/// Where the reader lives, and whether to log protocol traffic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    host: String,
    port: u16,
    logging: bool,
}

impl ConnectionInfo {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            logging: false,
        }
    }

    pub fn with_logging(mut self, logging: bool) -> Self {
        self.logging = logging;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn logging(&self) -> bool {
        self.logging
    }
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ── ReaderOptions ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Idle window before a `Timeout` event. Covers the connect attempt too.
    pub idle_timeout: Duration,
    /// Events buffered per subscriber before it starts lagging.
    pub event_capacity: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            idle_timeout: INACTIVITY_TIMEOUT,
            event_capacity: EVENT_CHANNEL_CAPACITY,
        }
    }
}

// ── ReaderClient ─────────────────────────────────────────────────

/// Client for one physical reader.
///
/// Subscribers registered with [`subscribe`](Self::subscribe) receive
/// the events of every session started by [`connect`](Self::connect).
/// The client never reconnects on its own.
#[derive(Debug)]
pub struct ReaderClient {
    info: ConnectionInfo,
    options: ReaderOptions,
    events: EventSink,
}

impl ReaderClient {
    pub fn new(info: ConnectionInfo) -> Self {
        Self::with_options(info, ReaderOptions::default())
    }

    pub fn with_options(info: ConnectionInfo, options: ReaderOptions) -> Self {
        let events = EventSink::new(options.event_capacity);
        Self {
            info,
            options,
            events,
        }
    }

    pub fn info(&self) -> &ConnectionInfo {
        &self.info
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReaderEvent> {
        self.events.subscribe()
    }

    /// Start a session task with fresh state.
    ///
    /// Connection failures are published as [`ReaderEvent::Error`], not
    /// returned.
    pub fn connect(&self) -> ReaderHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run_session(
            self.info.clone(),
            self.options.idle_timeout,
            self.events.clone(),
            shutdown_rx,
        ));
        ReaderHandle {
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle to a running session. Dropping it closes the session.
#[derive(Debug)]
pub struct ReaderHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ReaderHandle {
    /// Shut the socket down and wait for the session task to end.
    pub async fn close(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }

    /// Returns `true` once the session has ended for any reason.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn run_session(
    info: ConnectionInfo,
    idle_timeout: Duration,
    events: EventSink,
    mut shutdown: oneshot::Receiver<()>,
) {
    let addr = info.to_string();
    debug!(%addr, "connecting to reader");

    let connect = TcpStream::connect(addr.clone());
    tokio::pin!(connect);
    let stream = loop {
        let attempt = tokio::select! {
            _ = &mut shutdown => return,
            attempt = tokio::time::timeout(idle_timeout, &mut connect) => attempt,
        };
        match attempt {
            Ok(Ok(stream)) => break stream,
            Ok(Err(e)) => {
                warn!(%addr, error = %e, "reader connection failed");
                events.error(e.into());
                return;
            }
            Err(_) => events.publish(ReaderEvent::Timeout(idle_timeout)),
        }
    };

    let _ = stream.set_nodelay(true);
    info!(%addr, "connected to reader");

    SessionPump::new(stream, SessionState::new(info.logging()), events, idle_timeout)
        .run(shutdown)
        .await;
}

// ── SessionPump ──────────────────────────────────────────────────

/// The single task that owns a reader socket.
///
/// Each loop reads once, dispatches every complete message in that read
/// in order, writes the resulting commands, and only then reads again.
pub struct SessionPump<S> {
    stream: S,
    state: SessionState,
    events: EventSink,
    idle_timeout: Duration,
    buf: BytesMut,
    catalog: &'static CommandCatalog,
}

impl<S> SessionPump<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, state: SessionState, events: EventSink, idle_timeout: Duration) -> Self {
        Self {
            stream,
            state,
            events,
            idle_timeout,
            buf: BytesMut::with_capacity(READ_BUFFER_SIZE),
            catalog: CommandCatalog::global(),
        }
    }

    /// Pump until the peer closes, an I/O error occurs, a write stays
    /// blocked for a whole idle window, or `shutdown` fires (or its sender
    /// is dropped). Shutdown also interrupts a blocked write. Returns the
    /// final session state.
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) -> SessionState {
        loop {
            let read = tokio::select! {
                _ = &mut shutdown => None,
                read = tokio::time::timeout(self.idle_timeout, self.stream.read_buf(&mut self.buf)) => Some(read),
            };

            match read {
                None => {
                    debug!("closing reader session");
                    let _ = self.stream.shutdown().await;
                    return self.state;
                }
                Some(Err(_)) => {
                    debug!(idle = ?self.idle_timeout, "reader idle");
                    self.events.publish(ReaderEvent::Timeout(self.idle_timeout));
                }
                Some(Ok(Ok(0))) => {
                    info!("reader closed the connection");
                    self.events
                        .publish(ReaderEvent::Disconnected(Arc::new(LlrpError::PeerClosed)));
                    return self.state;
                }
                Some(Ok(Ok(_))) => {
                    let outbound = self.react();
                    if outbound.is_empty() {
                        continue;
                    }

                    let write = tokio::select! {
                        _ = &mut shutdown => None,
                        write = tokio::time::timeout(self.idle_timeout, self.send(&outbound)) => Some(write),
                    };
                    match write {
                        None => {
                            debug!("closing reader session with commands unsent");
                            return self.state;
                        }
                        Some(Ok(Ok(()))) => {}
                        Some(Ok(Err(e))) => {
                            warn!(error = %e, "failed to write to reader");
                            self.events.error(e.into());
                            return self.state;
                        }
                        Some(Err(_)) => {
                            warn!(stalled = ?self.idle_timeout, "reader stopped accepting commands");
                            self.events.error(LlrpError::Connection(io::Error::new(
                                io::ErrorKind::TimedOut,
                                "reader stopped accepting commands",
                            )));
                            return self.state;
                        }
                    }
                }
                Some(Ok(Err(e))) => {
                    warn!(error = %e, "failed to read from reader");
                    self.events.error(e.into());
                    return self.state;
                }
            }
        }
    }

    /// Dispatch everything buffered, publish its tag observations, and
    /// return the commands to send back, concatenated in order.
    fn react(&mut self) -> BytesMut {
        let mut outbound = BytesMut::new();
        for reaction in self.state.ingest(&mut self.buf) {
            for observation in reaction.observations {
                self.events.publish(ReaderEvent::TagObserved(observation));
            }
            if let Some(command) = reaction.command {
                outbound.extend_from_slice(&self.catalog.get(command));
            }
        }
        outbound
    }

    async fn send(&mut self, outbound: &[u8]) -> io::Result<()> {
        self.stream.write_all(outbound).await?;
        self.stream.flush().await
    }
}
