//! TCP transport
//!
//! Cross-platform TCP socket wrapper with the options a record write path
//! cares about: blocking mode, Nagle, and send buffer sizing.

use crate::transport::{Transport, TransportError};
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use thiserror::Error;
use tracing::debug;

/// Socket configuration errors
#[derive(Error, Debug)]
pub enum SocketError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid socket address")]
    InvalidAddress,
}

/// TCP stream transport
///
/// Wraps a TCP socket configured through socket2. The caller decides whether
/// the socket blocks; the write path handles would-block either way.
pub struct TcpTransport {
    inner: Socket,
}

impl TcpTransport {
    /// Connect to the given address with a blocking socket
    pub fn connect(addr: SocketAddr) -> Result<Self, SocketError> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
        socket.connect(&addr.into())?;
        debug!(%addr, "TCP transport connected");

        Ok(TcpTransport { inner: socket })
    }

    /// Switch the socket between blocking and non-blocking mode
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<(), SocketError> {
        self.inner.set_nonblocking(nonblocking)?;
        Ok(())
    }

    /// Disable or enable Nagle's algorithm
    pub fn set_nodelay(&self, nodelay: bool) -> Result<(), SocketError> {
        self.inner.set_nodelay(nodelay)?;
        Ok(())
    }

    /// Set the kernel send buffer size
    pub fn set_send_buffer_size(&self, size: usize) -> Result<(), SocketError> {
        self.inner.set_send_buffer_size(size)?;
        Ok(())
    }

    /// Get the kernel send buffer size
    pub fn send_buffer_size(&self) -> Result<usize, SocketError> {
        Ok(self.inner.send_buffer_size()?)
    }

    /// Get the local address this socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        self.inner
            .local_addr()?
            .as_socket()
            .ok_or(SocketError::InvalidAddress)
    }

    /// Get the peer address
    pub fn peer_addr(&self) -> Result<SocketAddr, SocketError> {
        self.inner
            .peer_addr()?
            .as_socket()
            .ok_or(SocketError::InvalidAddress)
    }
}

impl Transport for TcpTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        match self.inner.send(buf) {
            Ok(n) => Ok(n),
            Err(e) => Err(e.into()),
        }
    }
}
