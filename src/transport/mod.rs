//! Transport Layer
//!
//! Responsibilities:
//! - Establish the lowest-level connection (TCP)
//! - NO framing, NO protocol parsing, NO content inspection
//!
//! This layer ONLY deals with raw byte transport. The messenger exchanges
//! arbitrary byte chunks, so nothing above this layer frames anything.

mod tcp;

pub use tcp::TcpTransport;

use async_trait::async_trait;

use crate::common::{Address, Result, Stream};

/// Transport trait for establishing raw connections
#[async_trait]
pub trait Transport: Send + Sync {
    /// Connect to a remote address
    async fn connect(&self, addr: &Address) -> Result<Stream>;

    /// Create a listener bound to an address
    async fn bind(&self, addr: &Address) -> Result<Box<dyn Listener>>;
}

/// Listener trait for accepting incoming connections
///
/// The listener is closed by dropping it; pending dialers in the OS backlog
/// are cut off at that point.
#[async_trait]
pub trait Listener: Send + Sync {
    /// Accept a new connection
    async fn accept(&self) -> Result<(Stream, Address)>;

    /// Get the local bound address
    fn local_addr(&self) -> Result<Address>;
}
