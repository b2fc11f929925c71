//! Stream abstraction
//!
//! Unified byte-stream type the rest of the crate operates on. Everything
//! above the transport layer only sees a `Stream`, never a raw `TcpStream`,
//! which keeps the workers testable against in-memory duplex pipes.

use tokio::io::{AsyncRead, AsyncWrite};

/// The core stream type: any bidirectional async byte stream.
pub type Stream = Box<dyn AsyncReadWrite + Unpin + Send>;

/// Combined trait for async read + write
pub trait AsyncReadWrite: AsyncRead + AsyncWrite {}

impl<T: AsyncRead + AsyncWrite> AsyncReadWrite for T {}

/// Trait for types that can be converted into a Stream
pub trait IntoStream {
    fn into_stream(self) -> Stream;
}

impl<T> IntoStream for T
where
    T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn into_stream(self) -> Stream {
        Box::new(self)
    }
}
