//! Output Buffer
//!
//! A growable, cursor-tracked byte buffer holding at most one in-flight
//! record. Bytes are appended behind the write cursor and drained from the
//! read cursor; between send calls the buffer is either empty or contains
//! only the not-yet-transmitted tail of a fully framed record.

use thiserror::Error;

/// Buffer errors
#[derive(Error, Debug)]
pub enum BufferError {
    /// The allocator could not satisfy the request, or the configured
    /// capacity limit would be exceeded. Callers may treat this as
    /// best-effort and continue with the old capacity.
    #[error("allocation failed")]
    AllocationFailed,

    /// The buffer was created with a fixed capacity and cannot be resized.
    #[error("buffer is not growable")]
    Fixed,
}

/// Growable byte buffer with separate read and write cursors
#[derive(Debug)]
pub struct OutputBuffer {
    /// Storage; `data.len()` is the write cursor
    data: Vec<u8>,
    /// Read cursor: bytes before it have already been consumed
    read_cursor: usize,
    /// Upper bound on capacity, if configured
    capacity_limit: Option<usize>,
    /// Fixed buffers refuse all resizing
    growable: bool,
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputBuffer {
    /// Create an empty, growable buffer
    pub fn new() -> Self {
        OutputBuffer {
            data: Vec::new(),
            read_cursor: 0,
            capacity_limit: None,
            growable: true,
        }
    }

    /// Create a growable buffer with the given initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        OutputBuffer {
            data: Vec::with_capacity(capacity),
            read_cursor: 0,
            capacity_limit: None,
            growable: true,
        }
    }

    /// Create a buffer that can never grow beyond its initial capacity
    pub fn fixed(capacity: usize) -> Self {
        OutputBuffer {
            data: Vec::with_capacity(capacity),
            read_cursor: 0,
            capacity_limit: None,
            growable: false,
        }
    }

    /// Bound the buffer's capacity. Resizes beyond the limit fail with
    /// [`BufferError::AllocationFailed`].
    pub fn set_capacity_limit(&mut self, limit: usize) {
        self.capacity_limit = Some(limit);
    }

    /// Number of unconsumed bytes
    pub fn data_available(&self) -> usize {
        self.data.len() - self.read_cursor
    }

    pub fn is_empty(&self) -> bool {
        self.data_available() == 0
    }

    /// Currently allocated capacity
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// The unconsumed bytes, starting at the read cursor
    pub fn available_slice(&self) -> &[u8] {
        &self.data[self.read_cursor..]
    }

    /// Consume `n` bytes from the front of the unconsumed region
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.data_available());
        self.read_cursor = (self.read_cursor + n).min(self.data.len());
    }

    /// Append bytes behind the write cursor
    pub fn put_slice(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Mark the buffer empty and ready for reuse. Capacity is retained;
    /// contents are not cleared.
    pub fn mark_reusable(&mut self) {
        self.data.clear();
        self.read_cursor = 0;
    }

    /// Zero the contents, then mark the buffer empty
    pub fn wipe(&mut self) {
        self.data.iter_mut().for_each(|b| *b = 0);
        self.mark_reusable();
    }

    /// Grow the allocation so that capacity is at least `n` bytes.
    ///
    /// Shrinking never happens; a request at or below the current capacity
    /// is a no-op. Allocation exhaustion and the capacity limit report
    /// [`BufferError::AllocationFailed`]; fixed buffers report
    /// [`BufferError::Fixed`].
    pub fn resize_at_least(&mut self, n: usize) -> Result<(), BufferError> {
        if n <= self.data.capacity() {
            return Ok(());
        }
        if !self.growable {
            return Err(BufferError::Fixed);
        }
        if let Some(limit) = self.capacity_limit {
            if n > limit {
                return Err(BufferError::AllocationFailed);
            }
        }
        self.data
            .try_reserve(n - self.data.len())
            .map_err(|_| BufferError::AllocationFailed)
    }
}
