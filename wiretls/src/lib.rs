//! wiretls - TLS Outbound Record Path
//!
//! The write side of a TLS connection: fragments application plaintext into
//! wire-format records, adapts the record size to network conditions, and
//! drives the bytes onto a possibly non-blocking transport with resumable
//! partial progress.
//!
//! Operations on one connection must be externally serialized; there is no
//! internal locking, and suspension is never implicit: a call completes,
//! fails, or returns partial progress for the caller to retry.

pub use wiretls_io as io;
pub use wiretls_record as record;

pub mod config;
pub mod connection;
pub mod send;

// Re-export commonly used types
pub use config::DynamicRecordSizeConfig;
pub use connection::{Connection, ConnectionStats};
pub use io::{IdleTimer, TcpTransport, Transport, TransportError};
pub use record::{Alert, AlertDescription, AlertLevel, CipherMode, ProtocolVersion};
pub use send::{SendError, SendOutcome};
