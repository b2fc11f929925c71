//! Termination signalling and ordered teardown
//!
//! Either worker can end the session: the receive worker on peer close or a
//! read failure, the send loop on Ctrl-C, closed stdin, or a write failure.
//! Whichever fires first wins; everything after that is a no-op. Teardown
//! runs exactly once and in a fixed order: signal the workers, wait for the
//! receive worker within a bound, then close the link and the listening
//! socket.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::link::{LinkHandle, LinkWriter};
use crate::transport::Listener;

/// Why the session is ending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// The peer performed an orderly close (zero-length read)
    PeerClosed,
    /// A socket read failed (reset, broken pipe)
    ReadFailed,
    /// A socket write failed after the peer went away
    WriteFailed,
    /// The local user interrupted (Ctrl-C)
    Interrupted,
    /// End-of-input on the console
    InputClosed,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminationReason::PeerClosed => write!(f, "peer closed the connection"),
            TerminationReason::ReadFailed => write!(f, "read failed"),
            TerminationReason::WriteFailed => write!(f, "write failed"),
            TerminationReason::Interrupted => write!(f, "interrupted"),
            TerminationReason::InputClosed => write!(f, "end of input"),
        }
    }
}

/// One-shot, many-listener termination signal.
///
/// The first `trigger` records its reason and wakes every subscriber; later
/// triggers lose the race and return false. Raising the signal never blocks,
/// so a worker can fire it without waiting on the other worker.
#[derive(Clone)]
pub struct ShutdownSignal {
    reason: Arc<OnceLock<TerminationReason>>,
    tx: broadcast::Sender<()>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            reason: Arc::new(OnceLock::new()),
            tx,
        }
    }

    /// Raise the signal. Returns true only for the first caller.
    pub fn trigger(&self, reason: TerminationReason) -> bool {
        if self.reason.set(reason).is_err() {
            return false;
        }
        debug!("Termination signal raised: {}", reason);
        let _ = self.tx.send(());
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.reason.get().is_some()
    }

    pub fn reason(&self) -> Option<TerminationReason> {
        self.reason.get().copied()
    }

    /// Subscribe before entering a blocking loop; the receiver fires once
    /// the signal is raised.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Bound on how long teardown waits for the receive worker. It selects on
/// the shutdown signal, so in practice it stops immediately; the abort is a
/// backstop for a worker wedged in a socket read.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Runs the ordered, single-shot teardown.
///
/// Consuming `self` makes a second teardown unrepresentable.
pub struct Coordinator {
    shutdown: ShutdownSignal,
    link: LinkHandle,
    receiver: JoinHandle<()>,
    writer: LinkWriter,
    listener: Option<Box<dyn Listener>>,
}

impl Coordinator {
    pub fn new(
        shutdown: ShutdownSignal,
        link: LinkHandle,
        receiver: JoinHandle<()>,
        writer: LinkWriter,
        listener: Option<Box<dyn Listener>>,
    ) -> Self {
        Self {
            shutdown,
            link,
            receiver,
            writer,
            listener,
        }
    }

    /// Signal workers first, then close. Never the reverse: a worker must
    /// not be left blocked on a connection that was closed under it.
    pub async fn teardown(mut self) {
        let reason = self.shutdown.reason().unwrap_or(TerminationReason::Interrupted);
        info!("Shutting down: {}", reason);

        // Make sure every subscriber has been woken, whoever triggered first.
        self.shutdown.trigger(reason);
        self.link.cancel();

        match timeout(SHUTDOWN_GRACE, &mut self.receiver).await {
            Ok(_) => debug!("Receive worker stopped"),
            Err(_) => {
                warn!("Receive worker did not stop within {:?}, aborting it", SHUTDOWN_GRACE);
                self.receiver.abort();
            }
        }

        if let Err(e) = self.writer.close().await {
            debug!("Error closing connection: {}", e);
        }

        if self.listener.take().is_some() {
            debug!("Closed listening socket");
        }

        info!("Connection closed");
    }
}
