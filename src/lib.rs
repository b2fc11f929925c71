//! sockchat - a two-party, full-duplex TCP text messenger
//!
//! One process listens and accepts exactly one peer (server role), the
//! other dials out (client role). Once connected, each side forwards
//! console lines to the peer while a background worker displays whatever
//! arrives, until either the user cancels or the peer disconnects.
//!
//! # Architecture
//!
//! ```text
//! Establisher (bind + accept-one | dial)
//!     │
//!     v
//!   Link ──────────── split ────────────┐
//!     │                                 │
//!  LinkReader                       LinkWriter
//!     │                                 │
//!  ReceiveWorker (background task)   SendLoop (main flow)
//!     │         display                 │        one line at a time
//!     v                                 ^
//!  console stdout                  console stdin
//!
//!  either worker ── TerminationSignal ──> Coordinator
//!                                          (signal, bounded wait,
//!                                           close link + listener)
//! ```
//!
//! ## Core Principles
//!
//! - Exactly one connection, owned explicitly and passed to the workers;
//!   no ambient globals
//! - The two workers share nothing but the link's split halves
//! - A single one-shot termination signal; teardown runs exactly once
//!
//! ## Module Structure
//!
//! ```text
//! src/
//! ├── common/          # Core types: Stream, Address
//! ├── transport/       # Raw TCP dial/listen behind a trait seam
//! ├── link/            # The active connection + establishment
//! ├── chat/            # Receive worker, send loop, shutdown, console
//! └── app/             # Runtime and the lifecycle state machine
//! ```

// Core types
pub mod common;
pub mod error;

// Connection plumbing
pub mod link;
pub mod transport;

// Workers and lifecycle
pub mod app;
pub mod chat;

// Supporting modules
pub mod config;

// Re-exports for convenience
pub use common::{Address, Stream};
pub use config::Config;
pub use error::{Error, Result};

// Architecture re-exports
pub use app::{Phase, Runtime};
pub use chat::{ReceiveWorker, SendLoop, ShutdownSignal, TerminationReason};
pub use link::{Establisher, Link, Role};
pub use transport::{TcpTransport, Transport};
