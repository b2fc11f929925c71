//! Address type for network endpoints

use std::net::SocketAddr;

use crate::error::{Error, Result};

/// Network address representation
///
/// Servers bind to socket addresses; clients may also dial a hostname,
/// which is resolved by the transport at connect time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    /// IP socket address (IP + port)
    Socket(SocketAddr),
    /// Domain name with port
    Domain(String, u16),
}

impl Address {
    /// Create from domain and port
    pub fn domain(domain: impl Into<String>, port: u16) -> Self {
        Address::Domain(domain.into(), port)
    }

    /// Parse a `host:port` string into an Address
    pub fn parse(s: &str) -> Result<Self> {
        if let Ok(addr) = s.parse() {
            return Ok(Address::Socket(addr));
        }

        if let Some((host, port)) = s.rsplit_once(':') {
            let port: u16 = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid port in address: {}", s)))?;
            if let Ok(ip) = host.parse() {
                return Ok(Address::Socket(SocketAddr::new(ip, port)));
            }
            return Ok(Address::Domain(host.to_string(), port));
        }

        Err(Error::Config(format!("Invalid address: {}", s)))
    }

    /// Get the port
    pub fn port(&self) -> u16 {
        match self {
            Address::Socket(addr) => addr.port(),
            Address::Domain(_, port) => *port,
        }
    }

    /// Try to get as socket address (fails for domain)
    pub fn as_socket(&self) -> Option<SocketAddr> {
        match self {
            Address::Socket(addr) => Some(*addr),
            Address::Domain(_, _) => None,
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Address::Socket(addr) => write!(f, "{}", addr),
            Address::Domain(domain, port) => write!(f, "{}:{}", domain, port),
        }
    }
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        Address::Socket(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_socket_address() {
        let addr = Address::parse("127.0.0.1:12345").unwrap();
        assert_eq!(addr, Address::Socket("127.0.0.1:12345".parse().unwrap()));
        assert_eq!(addr.port(), 12345);
        assert!(addr.as_socket().is_some());
    }

    #[test]
    fn test_parse_domain_address() {
        let addr = Address::parse("chat.example.com:12345").unwrap();
        assert_eq!(addr, Address::domain("chat.example.com", 12345));
        assert_eq!(addr.port(), 12345);
        assert!(addr.as_socket().is_none());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Address::parse("no-port-here").is_err());
        assert!(Address::parse("host:not-a-port").is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for s in ["127.0.0.1:5000", "example.org:12345"] {
            assert_eq!(Address::parse(s).unwrap().to_string(), s);
        }
    }
}
