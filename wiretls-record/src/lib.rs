//! TLS Record Layer Primitives
//!
//! This crate implements the wire-format record layer used by the outbound
//! write path: content types, protocol versions, alert codes, record framing
//! and sizing arithmetic, the sealing (cipher) seam, and the growable output
//! buffer that holds one in-flight record.

pub mod alert;
pub mod buffer;
pub mod record;
pub mod seal;

pub use alert::{Alert, AlertDescription, AlertLevel};
pub use buffer::{BufferError, OutputBuffer};
pub use record::{
    ContentType, ProtocolVersion, RecordError, DEFAULT_FRAGMENT_LENGTH, MAXIMUM_FRAGMENT_LENGTH,
    RECORD_HEADER_SIZE,
};
pub use seal::{AeadSealer, CipherMode, NullSealer, SealError, Sealer};
