//! Outbound Record Path
//!
//! Three cooperating engines drive application plaintext onto the wire:
//!
//! - the record-size controller, a two-state hysteresis machine that starts
//!   records small for latency, grows them once enough bytes have flowed,
//!   and falls back after idle periods (TCP slow-start restart shrinks the
//!   congestion window after long idle, so big records would stall);
//! - the flush engine, which drains buffered output and interleaves pending
//!   alerts, closing the connection after its final alert;
//! - the send engine, which fragments caller data into records and reports
//!   partial progress under non-blocking backpressure.

use crate::connection::Connection;
use thiserror::Error;
use tracing::{debug, trace};
use wiretls_io::transport::{Transport, TransportError};
use wiretls_record::buffer::BufferError;
use wiretls_record::record::{self, ContentType, ProtocolVersion, RecordError, DEFAULT_FRAGMENT_LENGTH};
use wiretls_record::seal::CipherMode;

/// Write-path errors. All variants except a translated would-block leave the
/// connection unfit for reuse; callers should tear it down.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("connection is closed")]
    Closed,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("record error: {0}")]
    Record(#[from] RecordError),
}

/// Progress of one send call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOutcome {
    /// Plaintext bytes framed this call. These bytes are committed: they are
    /// either on the wire or buffered awaiting retransmission, and must not
    /// be passed in again.
    pub bytes_written: usize,
    /// True when a framed tail is still buffered; the caller retries later
    /// with the remaining data
    pub more: bool,
}

impl<T: Transport> Connection<T> {
    /// Write the buffered record tail to the transport until empty.
    ///
    /// Would-block propagates as [`TransportError::WouldBlock`]; how that is
    /// classified depends on the caller.
    fn drain_output(&mut self) -> Result<(), TransportError> {
        while !self.out.is_empty() {
            let written = self.transport.write(self.out.available_slice())?;
            self.out.advance(written);
            self.wire_bytes_out += written as u64;
        }
        Ok(())
    }

    /// The flush loop: drain, finalize a close, reset the buffer, then frame
    /// any pending alert and go around again to transmit it.
    fn flush_pending(&mut self) -> Result<(), SendError> {
        loop {
            self.drain_output()?;

            if self.closing {
                self.closed = true;
                self.wipe_transient();
                debug!("closing alert transmitted, connection closed");
            }

            self.out.mark_reusable();

            // Reader-originated alerts take priority; a writer alert left in
            // its slot goes out on the next pass.
            let pending = self.reader_alert.take().or_else(|| self.writer_alert.take());
            match pending {
                Some(alert) => {
                    record::write_record(
                        &mut self.out,
                        self.sealer.as_mut(),
                        ContentType::Alert,
                        self.version,
                        &alert.to_bytes(),
                    )?;
                    self.closing = true;
                    trace!(?alert, "alert framed for transmission");
                }
                None => return Ok(()),
            }
        }
    }

    /// Drain buffered output and any pending alerts to the transport.
    ///
    /// Returns `Ok(false)` once nothing further is pending. Flush does not
    /// tolerate a non-blocking transport: a would-block result here is a
    /// hard error. Callers needing would-block semantics go through
    /// [`send`](Self::send), which owns that translation.
    pub fn flush(&mut self) -> Result<bool, SendError> {
        if self.closed {
            return Err(SendError::Closed);
        }
        self.flush_pending()?;
        Ok(false)
    }

    /// Re-evaluate the fragment cap before framing a record.
    ///
    /// Runs once per send call. Growth is judged on the bytes counted before
    /// this call's data is added, so crossing the threshold takes effect on
    /// the call after the one that crossed it. A failed buffer grow due to
    /// allocation pressure keeps the old cap; sizing is best effort and never
    /// tears down a connection.
    fn adjust_record_size(&mut self) -> Result<(), SendError> {
        let current = self.current_max_fragment_size;
        let mut target = current;

        if current == self.config.max_fragment_size {
            let idle_millis = self.idle_timer.reset().as_millis() as u64;
            if idle_millis >= self.config.idle_millis_threshold {
                target = DEFAULT_FRAGMENT_LENGTH;
                self.bytes_out_since_resize = 0;
            }
        } else if self.bytes_out_since_resize >= self.config.bytes_out_threshold {
            target = self.config.max_fragment_size;
            self.idle_timer.reset();
        }

        if target != current {
            match self.out.resize_at_least(record::max_record_size(target)) {
                Ok(()) => {
                    debug!(from = current, to = target, "fragment size adjusted");
                    self.current_max_fragment_size = target;
                }
                Err(BufferError::AllocationFailed) => {
                    debug!(
                        from = current,
                        to = target,
                        "fragment size adjustment skipped: allocation failed"
                    );
                }
                Err(err) => return Err(SendError::Buffer(err)),
            }
        }

        Ok(())
    }

    /// Fragment `data` into application-data records and transmit them.
    ///
    /// Under a non-blocking transport a would-block result returns the
    /// partial [`SendOutcome`] with `more = true`; the unsent tail of the
    /// current record stays buffered and is drained, never re-sealed, by the
    /// next call before any new data is framed. Calling again with the
    /// not-yet-written remainder (or empty data) resumes transmission.
    pub fn send(&mut self, data: &[u8]) -> Result<SendOutcome, SendError> {
        if self.closed {
            return Err(SendError::Closed);
        }

        // Leftover output from a prior partial call goes first; at most one
        // record is ever in flight.
        if let Err(err) = self.flush_pending() {
            return match err {
                SendError::Transport(TransportError::WouldBlock) => Ok(SendOutcome {
                    bytes_written: 0,
                    more: true,
                }),
                other => Err(other),
            };
        }

        // Flushing may have transmitted a queued closing alert.
        if self.closed {
            return Err(SendError::Closed);
        }

        self.adjust_record_size()?;

        let max_payload = record::max_write_payload(self.current_max_fragment_size);
        let mut bytes_written = 0usize;
        let mut remaining = data;

        // Versions before TLS 1.1 with a block cipher are open to a
        // chosen-plaintext attack on predictable IVs. Splitting a single
        // byte into the first record of the call defeats it; the remainder
        // follows at full size.
        let mut split_first_record = self.version < ProtocolVersion::Tls11
            && self.sealer.mode() == CipherMode::Block;

        while !remaining.is_empty() {
            let mut chunk = remaining.len().min(max_payload);
            if split_first_record && chunk > 1 {
                chunk = 1;
            }
            split_first_record = false;

            self.out.mark_reusable();
            record::write_record(
                &mut self.out,
                self.sealer.as_mut(),
                ContentType::ApplicationData,
                self.version,
                &remaining[..chunk],
            )?;

            // The chunk is committed once framed, even if transmission of
            // this record blocks partway.
            bytes_written += chunk;
            self.bytes_out_since_resize += chunk as u64;

            match self.drain_output() {
                Ok(()) => {}
                Err(TransportError::WouldBlock) => {
                    trace!(bytes_written, "transport blocked, returning partial progress");
                    return Ok(SendOutcome {
                        bytes_written,
                        more: true,
                    });
                }
                Err(err) => return Err(SendError::Transport(err)),
            }

            remaining = &remaining[chunk..];
        }

        Ok(SendOutcome {
            bytes_written,
            more: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DynamicRecordSizeConfig;
    use std::thread;
    use std::time::Duration;
    use wiretls_io::transport::{MemoryTransport, WriteStep};
    use wiretls_record::alert::{Alert, AlertDescription, AlertLevel};
    use wiretls_record::record::RECORD_HEADER_SIZE;
    use wiretls_record::seal::NullSealer;

    const LARGE_FRAGMENT: u16 = 4096;

    fn conn_with(
        config: DynamicRecordSizeConfig,
        version: ProtocolVersion,
        mode: CipherMode,
    ) -> Connection<MemoryTransport> {
        Connection::new(
            MemoryTransport::new(),
            Box::new(NullSealer::with_mode(mode)),
            version,
            config,
        )
    }

    fn conn() -> Connection<MemoryTransport> {
        conn_with(
            DynamicRecordSizeConfig::default(),
            ProtocolVersion::Tls12,
            CipherMode::Stream,
        )
    }

    fn dynamic_config(bytes_out_threshold: u64) -> DynamicRecordSizeConfig {
        DynamicRecordSizeConfig::new(bytes_out_threshold, 10_000, LARGE_FRAGMENT)
    }

    /// Parse (content_type, payload) pairs out of a null-sealed wire stream
    fn parse_records(mut bytes: &[u8]) -> Vec<(u8, Vec<u8>)> {
        let mut records = Vec::new();
        while !bytes.is_empty() {
            assert!(bytes.len() >= RECORD_HEADER_SIZE, "truncated record header");
            let length = usize::from(bytes[3]) << 8 | usize::from(bytes[4]);
            let end = RECORD_HEADER_SIZE + length;
            assert!(bytes.len() >= end, "truncated record payload");
            records.push((bytes[0], bytes[RECORD_HEADER_SIZE..end].to_vec()));
            bytes = &bytes[end..];
        }
        records
    }

    #[test]
    fn test_send_fragments_input_into_records() {
        let mut conn = conn();
        let data = vec![0x42u8; 4000];

        let outcome = conn.send(&data).unwrap();
        assert_eq!(outcome.bytes_written, 4000);
        assert!(!outcome.more);

        let records = parse_records(conn.transport().written());
        let payload_lens: Vec<usize> = records.iter().map(|(_, p)| p.len()).collect();
        assert_eq!(payload_lens, vec![1500, 1500, 1000]);
        assert!(records.iter().all(|(ty, _)| *ty == 23));

        let reassembled: Vec<u8> = records.into_iter().flat_map(|(_, p)| p).collect();
        assert_eq!(reassembled, data);
    }

    #[test]
    fn test_empty_send_is_a_noop() {
        let mut conn = conn();
        let outcome = conn.send(&[]).unwrap();
        assert_eq!(outcome.bytes_written, 0);
        assert!(!outcome.more);
        assert!(conn.transport().written().is_empty());
    }

    #[test]
    fn test_growth_waits_for_the_call_after_the_threshold() {
        let mut conn = conn_with(
            dynamic_config(1000),
            ProtocolVersion::Tls12,
            CipherMode::Stream,
        );

        // N-1 bytes: no change
        conn.send(&vec![0u8; 999]).unwrap();
        assert_eq!(conn.current_max_fragment_size(), DEFAULT_FRAGMENT_LENGTH);

        // The call that reaches N still runs at the default size
        conn.send(&[0u8]).unwrap();
        assert_eq!(conn.current_max_fragment_size(), DEFAULT_FRAGMENT_LENGTH);

        // The next call sees the counter at the threshold and grows
        conn.send(&[0u8]).unwrap();
        assert_eq!(conn.current_max_fragment_size(), LARGE_FRAGMENT);
    }

    #[test]
    fn test_fragment_size_is_only_ever_small_or_large() {
        let mut conn = conn_with(
            dynamic_config(500),
            ProtocolVersion::Tls12,
            CipherMode::Stream,
        );

        for size in [1usize, 300, 700, 50, 2000, 1, 9000] {
            conn.send(&vec![0u8; size]).unwrap();
            let current = conn.current_max_fragment_size();
            assert!(
                current == DEFAULT_FRAGMENT_LENGTH || current == LARGE_FRAGMENT,
                "unexpected fragment size {current}"
            );
        }
    }

    #[test]
    fn test_grown_connection_uses_large_records() {
        let mut conn = conn_with(
            dynamic_config(100),
            ProtocolVersion::Tls12,
            CipherMode::Stream,
        );
        conn.send(&vec![0u8; 200]).unwrap();
        conn.send(&vec![0u8; 5000]).unwrap();
        assert_eq!(conn.current_max_fragment_size(), LARGE_FRAGMENT);

        let records = parse_records(conn.transport().written());
        let largest = records.iter().map(|(_, p)| p.len()).max().unwrap();
        assert_eq!(largest, LARGE_FRAGMENT as usize);
    }

    #[test]
    fn test_idle_connection_shrinks_back() {
        let mut conn = conn_with(
            DynamicRecordSizeConfig::new(0, 10, LARGE_FRAGMENT),
            ProtocolVersion::Tls12,
            CipherMode::Stream,
        );

        // Threshold zero: the first send grows immediately
        conn.send(b"x").unwrap();
        assert_eq!(conn.current_max_fragment_size(), LARGE_FRAGMENT);

        thread::sleep(Duration::from_millis(15));

        conn.send(b"x").unwrap();
        assert_eq!(conn.current_max_fragment_size(), DEFAULT_FRAGMENT_LENGTH);
        // The throughput counter restarted with this call's single byte
        assert_eq!(conn.stats().bytes_out_since_resize, 1);
    }

    #[test]
    fn test_resize_allocation_failure_is_best_effort() {
        let mut conn = conn_with(
            dynamic_config(10),
            ProtocolVersion::Tls12,
            CipherMode::Stream,
        );
        conn.set_output_capacity_limit(record::max_record_size(DEFAULT_FRAGMENT_LENGTH));

        conn.send(&vec![0u8; 50]).unwrap();
        // Growth is due, but the buffer cannot grow; the send still succeeds
        // at the old size and no error surfaces.
        let outcome = conn.send(&vec![0u8; 50]).unwrap();
        assert_eq!(outcome.bytes_written, 50);
        assert_eq!(conn.current_max_fragment_size(), DEFAULT_FRAGMENT_LENGTH);
    }

    #[test]
    fn test_would_block_returns_partial_progress() {
        let mut conn = conn();
        conn.transport_mut().push_step(WriteStep::Accept(3));
        conn.transport_mut().push_step(WriteStep::WouldBlock);

        let outcome = conn.send(b"hello").unwrap();
        // The record was framed, so its plaintext counts as written
        assert_eq!(outcome.bytes_written, 5);
        assert!(outcome.more);
        assert_eq!(conn.transport().written_len(), 3);
    }

    #[test]
    fn test_partial_record_resumes_without_reframing() {
        let mut conn = conn();
        conn.transport_mut().push_step(WriteStep::Accept(3));
        conn.transport_mut().push_step(WriteStep::WouldBlock);

        conn.send(b"hello").unwrap();

        // The retry drains exactly the remaining tail of the same record.
        let outcome = conn.send(&[]).unwrap();
        assert_eq!(outcome.bytes_written, 0);
        assert!(!outcome.more);

        let records = parse_records(conn.transport().written());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1, b"hello");
        assert_eq!(
            conn.transport().written_len(),
            RECORD_HEADER_SIZE + 5
        );
    }

    #[test]
    fn test_blocked_leftover_translates_to_empty_progress() {
        let mut conn = conn();
        conn.transport_mut().push_step(WriteStep::Accept(3));
        conn.transport_mut().push_step(WriteStep::WouldBlock);
        conn.transport_mut().push_step(WriteStep::WouldBlock);

        conn.send(b"hello").unwrap();

        // Still blocked while draining the leftover: empty partial progress,
        // not an error.
        let outcome = conn.send(b"world").unwrap();
        assert_eq!(outcome.bytes_written, 0);
        assert!(outcome.more);

        // Once the transport recovers, the old tail drains before new data.
        let outcome = conn.send(b"world").unwrap();
        assert_eq!(outcome.bytes_written, 5);
        assert!(!outcome.more);

        let records = parse_records(conn.transport().written());
        assert_eq!(records[0].1, b"hello");
        assert_eq!(records[1].1, b"world");
    }

    #[test]
    fn test_transport_failure_is_fatal() {
        let mut conn = conn();
        conn.transport_mut().push_step(WriteStep::Fail);

        let result = conn.send(b"doomed");
        assert!(matches!(
            result,
            Err(SendError::Transport(TransportError::Io(_)))
        ));
    }

    #[test]
    fn test_legacy_block_cipher_splits_first_record() {
        let mut conn = conn_with(
            DynamicRecordSizeConfig::default(),
            ProtocolVersion::Tls10,
            CipherMode::Block,
        );

        conn.send(&vec![0u8; 100]).unwrap();
        let records = parse_records(conn.transport().written());
        let payload_lens: Vec<usize> = records.iter().map(|(_, p)| p.len()).collect();
        assert_eq!(payload_lens, vec![1, 99]);
    }

    #[test]
    fn test_one_byte_split_fires_once_per_call() {
        let mut conn = conn_with(
            DynamicRecordSizeConfig::default(),
            ProtocolVersion::Tls10,
            CipherMode::Block,
        );

        conn.send(&vec![0u8; 100]).unwrap();
        conn.send(&vec![0u8; 60]).unwrap();

        let records = parse_records(conn.transport().written());
        let payload_lens: Vec<usize> = records.iter().map(|(_, p)| p.len()).collect();
        // Each call splits its own first record, exactly once
        assert_eq!(payload_lens, vec![1, 99, 1, 59]);
    }

    #[test]
    fn test_single_byte_send_needs_no_split() {
        let mut conn = conn_with(
            DynamicRecordSizeConfig::default(),
            ProtocolVersion::Tls10,
            CipherMode::Block,
        );

        conn.send(b"x").unwrap();
        let records = parse_records(conn.transport().written());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1, b"x");
    }

    #[test]
    fn test_no_split_for_modern_versions_or_stream_ciphers() {
        for (version, mode) in [
            (ProtocolVersion::Tls11, CipherMode::Block),
            (ProtocolVersion::Tls12, CipherMode::Block),
            (ProtocolVersion::Tls10, CipherMode::Stream),
            (ProtocolVersion::Tls10, CipherMode::Aead),
        ] {
            let mut conn = conn_with(DynamicRecordSizeConfig::default(), version, mode);
            conn.send(&vec![0u8; 100]).unwrap();

            let records = parse_records(conn.transport().written());
            assert_eq!(records.len(), 1, "{version:?}/{mode:?} should not split");
            assert_eq!(records[0].1.len(), 100);
        }
    }

    #[test]
    fn test_flush_transmits_writer_alert_and_closes() {
        let mut conn = conn();
        conn.queue_writer_alert(Alert::close_notify());

        let more = conn.flush().unwrap();
        assert!(!more);
        assert!(conn.is_closing());
        assert!(conn.is_closed());

        let records = parse_records(conn.transport().written());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, 21);
        assert_eq!(records[0].1, vec![1, 0]);
    }

    #[test]
    fn test_closed_connection_rejects_send_and_flush() {
        let mut conn = conn();
        conn.queue_writer_alert(Alert::close_notify());
        conn.flush().unwrap();

        assert!(matches!(conn.send(b"late"), Err(SendError::Closed)));
        assert!(matches!(conn.flush(), Err(SendError::Closed)));
    }

    #[test]
    fn test_reader_alert_takes_priority_and_close_drops_writer_alert() {
        let mut conn = conn();
        conn.queue_writer_alert(Alert::close_notify());
        conn.queue_reader_alert(Alert::new(
            AlertLevel::Fatal,
            AlertDescription::BadRecordMac,
        ));

        conn.flush().unwrap();

        // The reader alert went out; teardown after it discarded the writer
        // alert, since the connection is already closed.
        let records = parse_records(conn.transport().written());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1, vec![2, 20]);
        assert!(conn.is_closed());
    }

    #[test]
    fn test_send_transmits_alert_before_failing_closed() {
        let mut conn = conn();
        conn.queue_writer_alert(Alert::close_notify());

        // The leading flush inside send transmits the alert and closes the
        // connection, so the send itself is rejected.
        assert!(matches!(conn.send(b"data"), Err(SendError::Closed)));
        let records = parse_records(conn.transport().written());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, 21);
    }

    #[test]
    fn test_flush_treats_would_block_as_hard_error() {
        let mut conn = conn();
        conn.queue_writer_alert(Alert::close_notify());
        conn.transport_mut().push_step(WriteStep::WouldBlock);

        // Flush never returns partial progress; a non-blocking transport
        // that cannot take the alert record fails the whole flush.
        let result = conn.flush();
        assert!(matches!(
            result,
            Err(SendError::Transport(TransportError::WouldBlock))
        ));
        assert!(conn.is_closing());
        assert!(!conn.is_closed());

        // The framed alert survived; a later flush finishes the close.
        conn.flush().unwrap();
        assert!(conn.is_closed());
        let records = parse_records(conn.transport().written());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].1, vec![1, 0]);
    }

    #[test]
    fn test_wire_bytes_out_accumulates() {
        let mut conn = conn();
        conn.send(&vec![0u8; 10]).unwrap();
        assert_eq!(
            conn.wire_bytes_out(),
            (RECORD_HEADER_SIZE + 10) as u64
        );

        conn.send(&vec![0u8; 20]).unwrap();
        assert_eq!(
            conn.wire_bytes_out(),
            (2 * RECORD_HEADER_SIZE + 30) as u64
        );
    }
}
