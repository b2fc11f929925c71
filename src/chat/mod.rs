//! Chat layer
//!
//! The two concurrent workers plus the shutdown machinery around them:
//! - ReceiveWorker: background task draining the connection to the console
//! - SendLoop: foreground loop forwarding console lines to the peer
//! - ShutdownSignal / Coordinator: one-shot termination and ordered teardown
//! - console: prompt and received-payload display

pub mod console;
mod receiver;
mod sender;
mod shutdown;

pub use receiver::{ReceiveWorker, RECV_BUFFER_SIZE};
pub use sender::SendLoop;
pub use shutdown::{Coordinator, ShutdownSignal, TerminationReason, SHUTDOWN_GRACE};
