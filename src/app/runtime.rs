//! Runtime - session lifecycle driver
//!
//! Drives the whole-program state machine:
//!
//! ```text
//! Idle → Establishing → Connected → Terminating → Closed
//!              └────────────────────────────────────┘
//!               (fatal establishment failure/cancel)
//! ```
//!
//! Establishment is raced against Ctrl-C so a user can abandon a blocking
//! accept or connect. Once connected, the receive worker runs in the
//! background while the send loop holds the main flow; whichever ends the
//! session, the coordinator performs the one ordered teardown.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::chat::{Coordinator, ReceiveWorker, SendLoop, ShutdownSignal};
use crate::config::Config;
use crate::error::Result;
use crate::link::{Established, Establisher, Role};
use crate::transport::{TcpTransport, Transport};

/// Whole-program lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Establishing,
    Connected,
    Terminating,
    Closed,
}

impl Phase {
    /// Legal transitions of the lifecycle state machine. `Closed` is
    /// terminal.
    pub fn can_advance(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Idle, Phase::Establishing)
                | (Phase::Establishing, Phase::Connected)
                | (Phase::Establishing, Phase::Closed)
                | (Phase::Connected, Phase::Terminating)
                | (Phase::Terminating, Phase::Closed)
        )
    }
}

struct Lifecycle {
    phase: Phase,
}

impl Lifecycle {
    fn new() -> Self {
        Self { phase: Phase::Idle }
    }

    fn advance(&mut self, next: Phase) {
        if self.phase.can_advance(next) {
            debug!("Lifecycle: {:?} -> {:?}", self.phase, next);
            self.phase = next;
        } else {
            warn!("Ignoring illegal lifecycle transition {:?} -> {:?}", self.phase, next);
        }
    }
}

/// Runtime manages one messenger session from establishment to teardown
pub struct Runtime {
    config: Config,
}

impl Runtime {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the session to completion.
    ///
    /// Returns `Err` only for fatal establishment failures; peer close and
    /// local cancellation are normal termination.
    pub async fn run(&self) -> Result<()> {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(Phase::Establishing);

        let role = if self.config.server {
            Role::Server
        } else {
            Role::Client
        };
        let addr = self.config.address()?;
        info!("Running as {} against {}", role, addr);

        let transport: Arc<dyn Transport> = Arc::new(TcpTransport::new());
        let greeting = role.is_server().then(|| self.config.greeting.clone()).flatten();
        let establisher = Establisher::new(transport).with_greeting(greeting);

        let established = tokio::select! {
            result = establisher.establish(role, &addr) => match result {
                Ok(established) => established,
                Err(e) => {
                    lifecycle.advance(Phase::Closed);
                    return Err(e);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Cancelled before a connection was established");
                lifecycle.advance(Phase::Closed);
                return Ok(());
            }
        };
        lifecycle.advance(Phase::Connected);

        let Established { link, listener } = established;
        debug!("Active {} link with {}", link.role(), link.peer());
        let handle = link.handle();
        let (reader, writer) = link.split();

        let shutdown = ShutdownSignal::new();
        let receiver = ReceiveWorker::new(reader, shutdown.clone()).spawn();
        let writer = SendLoop::new(writer, shutdown.clone()).run().await;

        lifecycle.advance(Phase::Terminating);
        Coordinator::new(shutdown, handle, receiver, writer, listener)
            .teardown()
            .await;
        lifecycle.advance(Phase::Closed);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert!(Phase::Idle.can_advance(Phase::Establishing));
        assert!(Phase::Establishing.can_advance(Phase::Connected));
        assert!(Phase::Establishing.can_advance(Phase::Closed));
        assert!(Phase::Connected.can_advance(Phase::Terminating));
        assert!(Phase::Terminating.can_advance(Phase::Closed));
    }

    #[test]
    fn test_illegal_transitions() {
        // Closed is terminal
        for next in [
            Phase::Idle,
            Phase::Establishing,
            Phase::Connected,
            Phase::Terminating,
            Phase::Closed,
        ] {
            assert!(!Phase::Closed.can_advance(next));
        }

        assert!(!Phase::Idle.can_advance(Phase::Connected));
        assert!(!Phase::Connected.can_advance(Phase::Closed));
        assert!(!Phase::Terminating.can_advance(Phase::Connected));
    }

    #[test]
    fn test_lifecycle_ignores_illegal_advance() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.advance(Phase::Establishing);
        lifecycle.advance(Phase::Terminating); // illegal, ignored
        assert_eq!(lifecycle.phase, Phase::Establishing);
        lifecycle.advance(Phase::Connected);
        assert_eq!(lifecycle.phase, Phase::Connected);
    }

    #[tokio::test]
    async fn test_run_fails_fast_when_peer_not_listening() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = Config::default_client();
        config.port = port;

        let result = Runtime::new(config).run().await;
        assert!(result.is_err());
    }
}
