//! Record Sealing
//!
//! The seam between the write path and the active cipher. A [`Sealer`]
//! transforms one record's plaintext into its protected payload and reports
//! the two cipher facts the send engine needs: the cipher mode (block-mode
//! ciphers trigger the legacy one-byte split) and the worst-case overhead.

use crate::record::{ContentType, ProtocolVersion};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_128_GCM};
use thiserror::Error;

/// How the active cipher operates on a record payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherMode {
    /// Stream cipher, no padding
    Stream,
    /// Block cipher (CBC class); padded, and subject to the legacy
    /// chosen-plaintext weakness before TLS 1.1
    Block,
    /// Authenticated cipher with explicit nonce and tag
    Aead,
}

/// Sealing errors
#[derive(Error, Debug)]
pub enum SealError {
    #[error("cipher operation failed")]
    Crypto,

    #[error("record sequence number space exhausted")]
    SequenceOverflow,
}

/// One active cipher direction: seals record payloads in order.
pub trait Sealer {
    /// The active cipher's mode
    fn mode(&self) -> CipherMode;

    /// Worst-case bytes added to a plaintext by sealing
    fn overhead(&self) -> usize;

    /// Seal one record payload, appending the protected bytes to `out`
    fn seal(
        &mut self,
        content_type: ContentType,
        version: ProtocolVersion,
        plaintext: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<(), SealError>;
}

/// Pass-through sealer: the payload goes on the wire unprotected.
///
/// This is the state of a connection before a cipher is active. The reported
/// mode is configurable so the write path can be driven as if a negotiated
/// cipher of that mode were active.
#[derive(Debug)]
pub struct NullSealer {
    mode: CipherMode,
}

impl NullSealer {
    pub fn new() -> Self {
        NullSealer {
            mode: CipherMode::Stream,
        }
    }

    pub fn with_mode(mode: CipherMode) -> Self {
        NullSealer { mode }
    }
}

impl Default for NullSealer {
    fn default() -> Self {
        Self::new()
    }
}

impl Sealer for NullSealer {
    fn mode(&self) -> CipherMode {
        self.mode
    }

    fn overhead(&self) -> usize {
        0
    }

    fn seal(
        &mut self,
        _content_type: ContentType,
        _version: ProtocolVersion,
        plaintext: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<(), SealError> {
        out.extend_from_slice(plaintext);
        Ok(())
    }
}

/// Explicit nonce bytes prepended to each AEAD payload
const EXPLICIT_NONCE_LEN: usize = 8;

/// AES-128-GCM sealer in the TLS 1.2 layout: 4-byte implicit salt plus an
/// 8-byte explicit nonce carried on the wire, 16-byte tag appended.
pub struct AeadSealer {
    key: LessSafeKey,
    salt: [u8; 4],
    sequence: u64,
}

impl AeadSealer {
    pub fn new(key: &[u8; 16], salt: [u8; 4]) -> Result<Self, SealError> {
        let unbound = UnboundKey::new(&AES_128_GCM, key).map_err(|_| SealError::Crypto)?;
        Ok(AeadSealer {
            key: LessSafeKey::new(unbound),
            salt,
            sequence: 0,
        })
    }

    /// Records sealed so far
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl Sealer for AeadSealer {
    fn mode(&self) -> CipherMode {
        CipherMode::Aead
    }

    fn overhead(&self) -> usize {
        EXPLICIT_NONCE_LEN + AES_128_GCM.tag_len()
    }

    fn seal(
        &mut self,
        content_type: ContentType,
        version: ProtocolVersion,
        plaintext: &[u8],
        out: &mut Vec<u8>,
    ) -> Result<(), SealError> {
        let explicit = self.sequence.to_be_bytes();

        let mut nonce_bytes = [0u8; 12];
        nonce_bytes[..4].copy_from_slice(&self.salt);
        nonce_bytes[4..].copy_from_slice(&explicit);
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        // Additional data: sequence, header type/version, plaintext length
        let wire_version = version.to_wire();
        let mut aad = [0u8; 13];
        aad[..8].copy_from_slice(&explicit);
        aad[8] = content_type.as_u8();
        aad[9] = wire_version[0];
        aad[10] = wire_version[1];
        aad[11] = (plaintext.len() >> 8) as u8;
        aad[12] = plaintext.len() as u8;

        let mut in_out = plaintext.to_vec();
        self.key
            .seal_in_place_append_tag(nonce, Aad::from(&aad), &mut in_out)
            .map_err(|_| SealError::Crypto)?;

        out.extend_from_slice(&explicit);
        out.extend_from_slice(&in_out);

        self.sequence = self
            .sequence
            .checked_add(1)
            .ok_or(SealError::SequenceOverflow)?;
        Ok(())
    }
}
