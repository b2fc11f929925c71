//! Link - the single active connection with lifecycle management
//!
//! A `Link` is the one TCP connection a messenger process owns, split into
//! independent read/write halves so the receive worker and the send loop can
//! block on the socket concurrently. The halves share a small piece of
//! lifecycle state:
//!
//! - read-done: set when the peer closes (EOF) or a read fails
//! - write-done: set when our write side has been shut down
//! - cancelled: set when shutdown asks both halves to stop
//!
//! Cancelled I/O fails fast instead of blocking, so a worker parked on the
//! socket can be released without forcibly killing it.

mod establish;

pub use establish::{BoundServer, Established, Establisher};

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf, ReadHalf, WriteHalf};
use tokio::sync::Notify;

use crate::common::{Address, Stream};

/// Which end of the connection this process is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Listens and accepts exactly one peer
    Server,
    /// Dials out to a listening peer
    Client,
}

impl Role {
    /// Decide the role from the CLI flag value. Exactly "True", "true" and
    /// "TRUE" select the server role; anything else selects client.
    pub fn from_flag(value: &str) -> Role {
        match value {
            "True" | "true" | "TRUE" => Role::Server,
            _ => Role::Client,
        }
    }

    pub fn is_server(&self) -> bool {
        matches!(self, Role::Server)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Server => write!(f, "server"),
            Role::Client => write!(f, "client"),
        }
    }
}

/// Shared lifecycle state between the two halves
struct LinkState {
    /// Set when the read side is done (EOF or error)
    read_done: AtomicBool,
    /// Set when the write side is done (shutdown or error)
    write_done: AtomicBool,
    /// Set when the link is asked to stop
    cancelled: AtomicBool,
    /// Notify waiters when state changes
    notify: Notify,
}

impl LinkState {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            read_done: AtomicBool::new(false),
            write_done: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            notify: Notify::new(),
        })
    }

    fn mark_read_done(&self) {
        self.read_done.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    fn mark_write_done(&self) {
        self.write_done.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// The active connection: one bidirectional byte stream bound to a peer
pub struct Link {
    reader: LinkReader,
    writer: LinkWriter,
    role: Role,
    peer: Address,
}

/// Read half of a Link, owned by the receive worker
pub struct LinkReader {
    inner: ReadHalf<Stream>,
    state: Arc<LinkState>,
}

/// Write half of a Link, owned by the send loop
pub struct LinkWriter {
    inner: WriteHalf<Stream>,
    state: Arc<LinkState>,
}

/// Cheap handle onto a Link's lifecycle state, kept by the shutdown path
#[derive(Clone)]
pub struct LinkHandle {
    state: Arc<LinkState>,
}

impl Link {
    /// Wrap an established stream into a Link
    pub fn new(stream: Stream, role: Role, peer: Address) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        let state = LinkState::new();

        Self {
            reader: LinkReader {
                inner: read_half,
                state: Arc::clone(&state),
            },
            writer: LinkWriter {
                inner: write_half,
                state,
            },
            role,
            peer,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn peer(&self) -> &Address {
        &self.peer
    }

    /// Handle for cancelling the link from outside the workers
    pub fn handle(&self) -> LinkHandle {
        LinkHandle {
            state: Arc::clone(&self.reader.state),
        }
    }

    /// Split into reader and writer (consumes self)
    pub fn split(self) -> (LinkReader, LinkWriter) {
        (self.reader, self.writer)
    }
}

impl LinkHandle {
    /// Ask both halves to stop; pending and future I/O fails fast
    pub fn cancel(&self) {
        self.state.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }
}

impl LinkReader {
    /// Whether this half has been asked to stop
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }
}

impl LinkWriter {
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// Shut down the write side of the connection.
    ///
    /// Idempotent: closing an already-closed link is a no-op.
    pub async fn close(&mut self) -> std::io::Result<()> {
        if self.state.write_done.load(Ordering::SeqCst) {
            return Ok(());
        }
        let result = self.inner.shutdown().await;
        self.state.mark_write_done();
        result
    }
}

fn cancelled_error() -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::ConnectionAborted, "link cancelled")
}

impl AsyncRead for LinkReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if self.state.is_cancelled() {
            return Poll::Ready(Err(cancelled_error()));
        }

        let before = buf.filled().len();
        let result = Pin::new(&mut self.inner).poll_read(cx, buf);

        // Mark read done on EOF (no bytes read) or error
        if let Poll::Ready(ref r) = result {
            let bytes_read = buf.filled().len() - before;
            if r.is_err() || bytes_read == 0 {
                self.state.mark_read_done();
            }
        }

        result
    }
}

impl AsyncWrite for LinkWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        if self.state.is_cancelled() {
            return Poll::Ready(Err(cancelled_error()));
        }

        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        if self.state.is_cancelled() {
            return Poll::Ready(Err(cancelled_error()));
        }

        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        let result = Pin::new(&mut self.inner).poll_shutdown(cx);

        if let Poll::Ready(_) = result {
            self.state.mark_write_done();
        }

        result
    }
}

impl Drop for LinkReader {
    fn drop(&mut self) {
        self.state.mark_read_done();
    }
}

impl Drop for LinkWriter {
    fn drop(&mut self) {
        self.state.mark_write_done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::IntoStream;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_link(stream: impl IntoStream) -> Link {
        Link::new(
            stream.into_stream(),
            Role::Client,
            Address::parse("127.0.0.1:12345").unwrap(),
        )
    }

    #[test]
    fn test_role_from_flag() {
        assert_eq!(Role::from_flag("True"), Role::Server);
        assert_eq!(Role::from_flag("true"), Role::Server);
        assert_eq!(Role::from_flag("TRUE"), Role::Server);
        // Only those three spellings select the server
        assert_eq!(Role::from_flag("tRuE"), Role::Client);
        assert_eq!(Role::from_flag("1"), Role::Client);
        assert_eq!(Role::from_flag("false"), Role::Client);
        assert_eq!(Role::from_flag(""), Role::Client);
    }

    #[tokio::test]
    async fn test_cancel_releases_reader() {
        let (local, remote) = tokio::io::duplex(1024);
        let link = test_link(local);
        let handle = link.handle();

        assert!(!handle.is_cancelled());
        handle.cancel();

        let (mut reader, _writer) = link.split();
        let mut buf = [0u8; 16];
        assert!(reader.read(&mut buf).await.is_err());

        drop(remote);
    }

    #[tokio::test]
    async fn test_bytes_pass_through_intact() {
        let (local, remote) = tokio::io::duplex(1024);
        let (mut reader, mut writer) = test_link(local).split();
        let (mut remote_read, mut remote_write) = tokio::io::split(remote);

        writer.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 16];
        let n = remote_read.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");

        remote_write.write_all(b"hi").await.unwrap();
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hi");
    }

    #[tokio::test]
    async fn test_peer_close_reads_zero() {
        let (local, remote) = tokio::io::duplex(1024);
        let (mut reader, _writer) = test_link(local).split();

        drop(remote);
        let mut buf = [0u8; 16];
        assert_eq!(reader.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (local, _remote) = tokio::io::duplex(1024);
        let (_reader, mut writer) = test_link(local).split();

        writer.close().await.unwrap();
        writer.close().await.unwrap();
    }
}
