//! TCP Transport implementation

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};

use crate::common::{Address, Result, Stream};
use crate::error::Error;

use super::{Listener, Transport};

/// TCP transport - raw TCP connections
pub struct TcpTransport;

impl TcpTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn connect(&self, addr: &Address) -> Result<Stream> {
        let stream = match addr {
            Address::Socket(socket_addr) => TcpStream::connect(socket_addr).await,
            Address::Domain(domain, port) => {
                TcpStream::connect(format!("{}:{}", domain, port)).await
            }
        }
        .map_err(|e| Error::Connect(format!("{}: {}", addr, e)))?;

        // Disable Nagle's algorithm for lower latency
        stream.set_nodelay(true)?;

        Ok(Box::new(stream))
    }

    async fn bind(&self, addr: &Address) -> Result<Box<dyn Listener>> {
        let socket_addr = match addr {
            Address::Socket(s) => *s,
            Address::Domain(_, _) => {
                return Err(Error::Config("Cannot bind to domain address".into()));
            }
        };

        let listener = TcpListener::bind(socket_addr)
            .await
            .map_err(|e| Error::Bind(format!("{}: {}", socket_addr, e)))?;
        Ok(Box::new(TcpListenerWrapper { listener }))
    }
}

/// Wrapper for TcpListener to implement Listener trait
struct TcpListenerWrapper {
    listener: TcpListener,
}

#[async_trait]
impl Listener for TcpListenerWrapper {
    async fn accept(&self) -> Result<(Stream, Address)> {
        let (stream, addr) = self.listener.accept().await?;
        stream.set_nodelay(true)?;
        Ok((Box::new(stream), Address::Socket(addr)))
    }

    fn local_addr(&self) -> Result<Address> {
        Ok(Address::Socket(self.listener.local_addr()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_rejects_domain() {
        let transport = TcpTransport::new();
        let result = transport.bind(&Address::domain("example.com", 0)).await;
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_connect_refused_is_fatal() {
        let transport = TcpTransport::new();
        // Bind then drop, so the port is known to be closed.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = Address::Socket(listener.local_addr().unwrap());
        drop(listener);

        let result = transport.connect(&addr).await;
        assert!(matches!(result, Err(Error::Connect(_))));
    }

    #[tokio::test]
    async fn test_connect_and_accept() {
        let transport = TcpTransport::new();
        let listener = transport
            .bind(&Address::parse("127.0.0.1:0").unwrap())
            .await
            .unwrap();
        let local = listener.local_addr().unwrap();

        let dial = tokio::spawn(async move {
            TcpTransport::new().connect(&local).await.unwrap();
        });

        let (_stream, peer) = listener.accept().await.unwrap();
        assert!(peer.as_socket().is_some());
        dial.await.unwrap();
    }
}
