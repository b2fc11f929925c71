//! Receive worker: drains the connection and displays what arrives
//!
//! Runs as its own task so a blocked socket read never blocks the send
//! loop. It shares nothing with the send loop except the link itself, and
//! only ever issues reads on it.

use bytes::BytesMut;
use tokio::io::AsyncReadExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::link::LinkReader;

use super::console;
use super::shutdown::{ShutdownSignal, TerminationReason};

/// Receive chunk size
pub const RECV_BUFFER_SIZE: usize = 4096;

/// Background reader for the active connection
pub struct ReceiveWorker {
    reader: LinkReader,
    shutdown: ShutdownSignal,
    // Subscribed at construction, before the task is spawned, so a signal
    // raised in between cannot be missed.
    rx: broadcast::Receiver<()>,
}

impl ReceiveWorker {
    pub fn new(reader: LinkReader, shutdown: ShutdownSignal) -> Self {
        let rx = shutdown.subscribe();
        Self {
            reader,
            shutdown,
            rx,
        }
    }

    /// Spawn the worker onto the runtime. The returned handle is awaited
    /// with a bound at teardown; the worker must never be required for
    /// process exit.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        let mut buf = BytesMut::with_capacity(RECV_BUFFER_SIZE);
        buf.resize(RECV_BUFFER_SIZE, 0);

        while !self.shutdown.is_triggered() {
            tokio::select! {
                result = self.reader.read(&mut buf) => match result {
                    Ok(0) => {
                        debug!("Zero-length read, peer closed");
                        self.shutdown.trigger(TerminationReason::PeerClosed);
                        break;
                    }
                    Ok(n) => {
                        let _ = console::show_received(&buf[..n]).await;
                    }
                    Err(e) => {
                        // A cancelled read is the coordinator stopping us,
                        // not a new end condition.
                        if !self.reader.is_cancelled() {
                            warn!("Receive failed: {}", e);
                            self.shutdown.trigger(TerminationReason::ReadFailed);
                        }
                        break;
                    }
                },
                _ = self.rx.recv() => {
                    debug!("Receive worker asked to stop");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Address, IntoStream};
    use crate::link::{Link, Role};
    use std::time::Duration;
    use tokio::io::AsyncWriteExt;
    use tokio::time::timeout;

    fn spawn_worker(
        stream: impl IntoStream,
        shutdown: &ShutdownSignal,
    ) -> JoinHandle<()> {
        let link = Link::new(
            stream.into_stream(),
            Role::Server,
            Address::parse("127.0.0.1:12345").unwrap(),
        );
        let (reader, _writer) = link.split();
        ReceiveWorker::new(reader, shutdown.clone()).spawn()
    }

    #[tokio::test]
    async fn test_peer_close_triggers_termination() {
        let (local, remote) = tokio::io::duplex(1024);
        let shutdown = ShutdownSignal::new();
        let worker = spawn_worker(local, &shutdown);

        drop(remote);

        timeout(Duration::from_secs(1), worker)
            .await
            .expect("worker must stop after EOF")
            .unwrap();
        assert_eq!(shutdown.reason(), Some(TerminationReason::PeerClosed));
    }

    #[tokio::test]
    async fn test_incoming_bytes_keep_worker_running() {
        let (local, remote) = tokio::io::duplex(1024);
        let shutdown = ShutdownSignal::new();
        let worker = spawn_worker(local, &shutdown);

        let (_remote_read, mut remote_write) = tokio::io::split(remote);
        remote_write.write_all(b"hello").await.unwrap();
        remote_write.flush().await.unwrap();

        // Still no end condition.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!shutdown.is_triggered());

        remote_write.shutdown().await.unwrap();
        timeout(Duration::from_secs(1), worker).await.unwrap().unwrap();
        assert_eq!(shutdown.reason(), Some(TerminationReason::PeerClosed));
    }

    #[tokio::test]
    async fn test_stop_request_does_not_raise_second_signal() {
        let (local, remote) = tokio::io::duplex(1024);
        let shutdown = ShutdownSignal::new();
        let worker = spawn_worker(local, &shutdown);

        // A stop request must not overwrite the recorded reason.
        shutdown.trigger(TerminationReason::Interrupted);

        timeout(Duration::from_secs(1), worker)
            .await
            .expect("worker must stop on request")
            .unwrap();
        assert_eq!(shutdown.reason(), Some(TerminationReason::Interrupted));

        drop(remote);
    }
}
