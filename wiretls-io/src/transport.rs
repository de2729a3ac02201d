//! Byte Transport Abstraction
//!
//! The write path drives bytes onto a transport that may be blocking or
//! non-blocking. A would-block outcome is flow control, not a failure, so
//! the error type carries it as its own variant rather than burying it in an
//! `io::ErrorKind`.

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Write};
use thiserror::Error;

/// Transport write errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// No bytes could be written right now; retry later
    #[error("operation would block")]
    WouldBlock,

    #[error("IO error: {0}")]
    Io(io::Error),
}

impl TransportError {
    pub fn is_would_block(&self) -> bool {
        matches!(self, TransportError::WouldBlock)
    }
}

impl From<io::Error> for TransportError {
    /// Lift would-block into its own variant; everything else is an IO error
    fn from(err: io::Error) -> Self {
        if err.kind() == ErrorKind::WouldBlock {
            TransportError::WouldBlock
        } else {
            TransportError::Io(err)
        }
    }
}

/// A byte sink the write path can drive, possibly non-blocking.
///
/// Implementations report short writes by returning fewer bytes than given;
/// the caller resumes from the unwritten tail.
pub trait Transport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError>;
}

/// Adapter exposing any `io::Write` (pipes, files, unix sockets) as a
/// [`Transport`]
#[derive(Debug)]
pub struct IoTransport<W> {
    inner: W,
}

impl<W: Write> IoTransport<W> {
    pub fn new(inner: W) -> Self {
        IoTransport { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Transport for IoTransport<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        loop {
            match self.inner.write(buf) {
                Ok(n) => return Ok(n),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// One scripted outcome for a [`MemoryTransport`] write call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    /// Accept at most this many bytes (a short write)
    Accept(usize),
    /// Report would-block
    WouldBlock,
    /// Fail with a broken-pipe error
    Fail,
}

/// In-memory transport with a scripted outcome queue.
///
/// Each write call consumes the next scripted step; once the script is
/// exhausted, every write is accepted in full. Written bytes accumulate in
/// order for inspection.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    written: Vec<u8>,
    script: VecDeque<WriteStep>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome for a future write call
    pub fn push_step(&mut self, step: WriteStep) {
        self.script.push_back(step);
    }

    /// All bytes accepted so far, in write order
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    pub fn written_len(&self) -> usize {
        self.written.len()
    }
}

impl Transport for MemoryTransport {
    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        match self.script.pop_front() {
            None => {
                self.written.extend_from_slice(buf);
                Ok(buf.len())
            }
            Some(WriteStep::Accept(limit)) => {
                let n = buf.len().min(limit);
                self.written.extend_from_slice(&buf[..n]);
                Ok(n)
            }
            Some(WriteStep::WouldBlock) => Err(TransportError::WouldBlock),
            Some(WriteStep::Fail) => Err(TransportError::Io(io::Error::new(
                ErrorKind::BrokenPipe,
                "scripted transport failure",
            ))),
        }
    }
}
