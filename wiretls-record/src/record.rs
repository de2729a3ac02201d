//! TLS Record Framing
//!
//! A record is a 5-byte header (content type, protocol version, length)
//! followed by the sealed payload. The plaintext carried by one record is
//! bounded by the negotiated fragment size; cipher overhead (IV, MAC, padding
//! or AEAD tag) extends the record beyond the fragment, never eats into it.

use crate::buffer::OutputBuffer;
use crate::seal::{SealError, Sealer};
use thiserror::Error;

/// Size of the record header in bytes (type + version + length)
pub const RECORD_HEADER_SIZE: usize = 5;

/// Initial per-record plaintext cap: Ethernet MTU minus IP/TCP overhead,
/// so one record fits one segment while the connection is young.
pub const DEFAULT_FRAGMENT_LENGTH: u16 = 1500;

/// Absolute protocol limit on plaintext per record (2^14)
pub const MAXIMUM_FRAGMENT_LENGTH: u16 = 16384;

/// Worst-case explicit IV prepended to a sealed payload
const EXPLICIT_IV_MAX: usize = 16;

/// Worst-case MAC digest appended to a sealed payload (SHA-384)
const MAC_DIGEST_MAX: usize = 48;

/// Worst-case block-cipher padding
const CIPHER_BLOCK_MAX: usize = 16;

/// Record content types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ContentType {
    /// Cipher state transition marker
    ChangeCipherSpec = 20,
    /// 2-byte alert codes
    Alert = 21,
    /// Handshake messages
    Handshake = 22,
    /// Application plaintext
    ApplicationData = 23,
}

impl ContentType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            20 => Some(ContentType::ChangeCipherSpec),
            21 => Some(ContentType::Alert),
            22 => Some(ContentType::Handshake),
            23 => Some(ContentType::ApplicationData),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Negotiated protocol versions, ordered oldest to newest.
///
/// Versions before TLS 1.1 predicate the one-byte record split in the send
/// path (chosen-plaintext weakness in CBC modes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProtocolVersion {
    Ssl3,
    Tls10,
    Tls11,
    Tls12,
}

impl ProtocolVersion {
    /// Wire encoding (major, minor)
    pub fn to_wire(self) -> [u8; 2] {
        match self {
            ProtocolVersion::Ssl3 => [3, 0],
            ProtocolVersion::Tls10 => [3, 1],
            ProtocolVersion::Tls11 => [3, 2],
            ProtocolVersion::Tls12 => [3, 3],
        }
    }

    pub fn from_wire(bytes: [u8; 2]) -> Option<Self> {
        match bytes {
            [3, 0] => Some(ProtocolVersion::Ssl3),
            [3, 1] => Some(ProtocolVersion::Tls10),
            [3, 2] => Some(ProtocolVersion::Tls11),
            [3, 3] => Some(ProtocolVersion::Tls12),
            _ => None,
        }
    }
}

/// Record framing errors
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("payload of {0} bytes exceeds the maximum fragment length")]
    PayloadTooLarge(usize),

    #[error("sealing failed: {0}")]
    Seal(#[from] SealError),
}

/// Maximum plaintext bytes one record may carry at the given fragment size.
///
/// The fragment size bounds the plaintext directly; sealing overhead grows
/// the record length, not the fragment.
pub fn max_write_payload(fragment_size: u16) -> usize {
    fragment_size.min(MAXIMUM_FRAGMENT_LENGTH) as usize
}

/// Buffer capacity needed to hold one full record of the given plaintext
/// size, assuming worst-case cipher overhead.
pub fn max_record_size(fragment_size: u16) -> usize {
    RECORD_HEADER_SIZE
        + EXPLICIT_IV_MAX
        + fragment_size.min(MAXIMUM_FRAGMENT_LENGTH) as usize
        + MAC_DIGEST_MAX
        + CIPHER_BLOCK_MAX
}

/// Seal `payload` and append one framed record to `out`.
///
/// The header length field covers the sealed payload, which may be larger
/// than the plaintext by the sealer's overhead.
pub fn write_record(
    out: &mut OutputBuffer,
    sealer: &mut dyn Sealer,
    content_type: ContentType,
    version: ProtocolVersion,
    payload: &[u8],
) -> Result<(), RecordError> {
    if payload.len() > MAXIMUM_FRAGMENT_LENGTH as usize {
        return Err(RecordError::PayloadTooLarge(payload.len()));
    }

    let mut sealed = Vec::with_capacity(payload.len() + sealer.overhead());
    sealer.seal(content_type, version, payload, &mut sealed)?;

    let wire_version = version.to_wire();
    let length = sealed.len() as u16;
    out.put_slice(&[
        content_type.as_u8(),
        wire_version[0],
        wire_version[1],
        (length >> 8) as u8,
        length as u8,
    ]);
    out.put_slice(&sealed);

    Ok(())
}
