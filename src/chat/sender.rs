//! Send loop: forwards console lines to the peer
//!
//! Runs on the main flow. Every end condition it can observe (Ctrl-C,
//! end-of-input on the console, a failed write) becomes a termination
//! signal; a signal raised elsewhere just ends the loop. Either way
//! control returns to the runtime, which owns teardown.

use tokio::io::AsyncWriteExt;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::link::LinkWriter;

use super::console::{self, ConsoleInput};
use super::shutdown::{ShutdownSignal, TerminationReason};

/// Foreground writer for the active connection
pub struct SendLoop {
    writer: LinkWriter,
    shutdown: ShutdownSignal,
    // Subscribed at construction so a signal raised before the loop starts
    // cannot be missed.
    rx: broadcast::Receiver<()>,
}

impl SendLoop {
    pub fn new(writer: LinkWriter, shutdown: ShutdownSignal) -> Self {
        let rx = shutdown.subscribe();
        Self {
            writer,
            shutdown,
            rx,
        }
    }

    /// Run until an end condition, then hand the write half back for the
    /// coordinator to close.
    pub async fn run(mut self) -> LinkWriter {
        let mut input = ConsoleInput::new();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        while !self.shutdown.is_triggered() {
            let _ = console::prompt().await;

            tokio::select! {
                line = input.next_line() => match line {
                    Ok(Some(line)) => {
                        // Nothing to send for a bare return.
                        if line.is_empty() {
                            continue;
                        }
                        if let Err(e) = send(&mut self.writer, line.as_bytes()).await {
                            warn!("Send failed: {}", e);
                            self.shutdown.trigger(TerminationReason::WriteFailed);
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("Console input closed");
                        self.shutdown.trigger(TerminationReason::InputClosed);
                        break;
                    }
                    Err(e) => {
                        debug!("Console read failed: {}", e);
                        self.shutdown.trigger(TerminationReason::InputClosed);
                        break;
                    }
                },
                _ = &mut ctrl_c => {
                    debug!("Interrupt received");
                    self.shutdown.trigger(TerminationReason::Interrupted);
                    break;
                }
                _ = self.rx.recv() => {
                    debug!("Send loop stopping, termination signalled elsewhere");
                    break;
                }
            }
        }

        self.writer
    }
}

async fn send(writer: &mut LinkWriter, payload: &[u8]) -> std::io::Result<()> {
    writer.write_all(payload).await?;
    writer.flush().await
}
