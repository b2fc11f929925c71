//! Connection establishment for both roles
//!
//! Server role: bind, block until the first peer connects, optionally send
//! a one-line greeting. Exactly one peer is accepted; later dialers sit in
//! the OS backlog until the listener is dropped at shutdown.
//!
//! Client role: dial the remote address and block until connected.
//!
//! Both paths yield an [`Established`] holding the single active [`Link`].

use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::common::{Address, Result};
use crate::transport::{Listener, Transport};

use super::{Link, Role};

/// Builds the one active connection for either role
pub struct Establisher {
    transport: Arc<dyn Transport>,
    greeting: Option<String>,
}

/// Result of establishment: the active link, plus the listening socket when
/// we were the server (retained only so shutdown can close it).
pub struct Established {
    pub link: Link,
    pub listener: Option<Box<dyn Listener>>,
}

/// A bound, listening server endpoint that has not yet accepted its peer
pub struct BoundServer {
    listener: Box<dyn Listener>,
    greeting: Option<String>,
}

impl Establisher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            greeting: None,
        }
    }

    /// Line sent to the peer immediately after accept (server role only)
    pub fn with_greeting(mut self, greeting: Option<String>) -> Self {
        self.greeting = greeting;
        self
    }

    /// Produce the single active connection for the given role.
    ///
    /// Bind and connect failures are fatal; the caller aborts startup.
    pub async fn establish(&self, role: Role, addr: &Address) -> Result<Established> {
        match role {
            Role::Server => self.bind(addr).await?.accept_one().await,
            Role::Client => self.connect(addr).await,
        }
    }

    /// Server role, first half: create the listening socket
    pub async fn bind(&self, addr: &Address) -> Result<BoundServer> {
        let listener = self.transport.bind(addr).await?;
        info!("Listening on {}, waiting for a peer...", listener.local_addr()?);

        Ok(BoundServer {
            listener,
            greeting: self.greeting.clone(),
        })
    }

    async fn connect(&self, addr: &Address) -> Result<Established> {
        debug!("Dialing {}...", addr);
        let stream = self.transport.connect(addr).await?;
        info!("Connected to {}", addr);

        Ok(Established {
            link: Link::new(stream, Role::Client, addr.clone()),
            listener: None,
        })
    }
}

impl BoundServer {
    pub fn local_addr(&self) -> Result<Address> {
        self.listener.local_addr()
    }

    /// Server role, second half: block until the first peer connects.
    pub async fn accept_one(self) -> Result<Established> {
        let (mut stream, peer) = self.listener.accept().await?;
        info!("Peer connected from {}", peer);

        if let Some(greeting) = &self.greeting {
            stream.write_all(greeting.as_bytes()).await?;
            stream.flush().await?;
            debug!("Sent greeting ({} bytes)", greeting.len());
        }

        Ok(Established {
            link: Link::new(stream, Role::Server, peer),
            listener: Some(self.listener),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TcpTransport;
    use tokio::io::AsyncReadExt;

    fn establisher() -> Establisher {
        Establisher::new(Arc::new(TcpTransport::new()))
    }

    #[tokio::test]
    async fn test_server_unblocks_when_client_dials() {
        let bound = establisher()
            .bind(&Address::parse("127.0.0.1:0").unwrap())
            .await
            .unwrap();
        let addr = bound.local_addr().unwrap();

        let client = tokio::spawn(async move {
            establisher().establish(Role::Client, &addr).await.unwrap()
        });

        let server = bound.accept_one().await.unwrap();
        assert!(server.listener.is_some());
        assert_eq!(server.link.role(), Role::Server);

        let client = client.await.unwrap();
        assert!(client.listener.is_none());
        assert_eq!(client.link.role(), Role::Client);
    }

    #[tokio::test]
    async fn test_client_receives_greeting() {
        let bound = establisher()
            .with_greeting(Some("Thank you for connecting".to_string()))
            .bind(&Address::parse("127.0.0.1:0").unwrap())
            .await
            .unwrap();
        let addr = bound.local_addr().unwrap();

        let client = tokio::spawn(async move {
            establisher().establish(Role::Client, &addr).await.unwrap()
        });

        let _server = bound.accept_one().await.unwrap();
        let client = client.await.unwrap();

        let (mut reader, _writer) = client.link.split();
        let mut buf = [0u8; 64];
        let n = reader.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"Thank you for connecting");
    }

    #[tokio::test]
    async fn test_connect_without_listener_fails() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = Address::Socket(listener.local_addr().unwrap());
        drop(listener);

        let result = establisher().establish(Role::Client, &addr).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_bind_conflict_fails() {
        let bound = establisher()
            .bind(&Address::parse("127.0.0.1:0").unwrap())
            .await
            .unwrap();
        let addr = bound.local_addr().unwrap();

        let result = establisher().bind(&addr).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_end_to_end_exchange() {
        use tokio::io::AsyncWriteExt;

        let bound = establisher()
            .bind(&Address::parse("127.0.0.1:0").unwrap())
            .await
            .unwrap();
        let addr = bound.local_addr().unwrap();

        let client = tokio::spawn(async move {
            establisher().establish(Role::Client, &addr).await.unwrap()
        });
        let server = bound.accept_one().await.unwrap();
        let client = client.await.unwrap();

        let (mut server_read, mut server_write) = server.link.split();
        let (mut client_read, mut client_write) = client.link.split();

        // client sends "hello"; the server sees exactly those 5 bytes
        client_write.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 64];
        let n = server_read.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hello");

        // server answers "hi"
        server_write.write_all(b"hi").await.unwrap();
        let n = client_read.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hi");

        // client goes away; the server's next read returns zero
        client_write.close().await.unwrap();
        drop(client_read);
        let n = server_read.read(&mut buf).await.unwrap();
        assert_eq!(n, 0);
    }
}
