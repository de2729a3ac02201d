//! Transport and Timing Abstractions
//!
//! This crate provides the byte transport the write path drives and the
//! monotonic idle timer used by dynamic record sizing. The transport side
//! covers a trait with a would-block-distinguishing error, a
//! socket2-configured TCP implementation, and adapters for generic writers
//! and in-memory testing.

pub mod socket;
pub mod time;
pub mod transport;

pub use socket::{SocketError, TcpTransport};
pub use time::IdleTimer;
pub use transport::{IoTransport, MemoryTransport, Transport, TransportError, WriteStep};
