//! Connection State
//!
//! A connection owns exactly one output buffer, one transport, one active
//! sealer, and the counters driving dynamic record sizing. All operations
//! must be externally serialized; there is no internal locking.

use crate::config::DynamicRecordSizeConfig;
use wiretls_io::time::IdleTimer;
use wiretls_io::transport::Transport;
use wiretls_record::alert::Alert;
use wiretls_record::buffer::OutputBuffer;
use wiretls_record::record::{self, ProtocolVersion, DEFAULT_FRAGMENT_LENGTH};
use wiretls_record::seal::Sealer;

/// Snapshot of a connection's write-side counters
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionStats {
    /// Cumulative bytes physically written to the transport
    pub wire_bytes_out: u64,
    /// Plaintext bytes emitted since the last resize event
    pub bytes_out_since_resize: u64,
    /// Fragment cap currently in effect
    pub current_max_fragment_size: u16,
}

/// The write side of one TLS connection.
///
/// Long-lived and owned by the caller across many send calls. Between calls
/// the output buffer is either empty or holds only the untransmitted tail of
/// the record currently being flushed.
pub struct Connection<T: Transport> {
    pub(crate) transport: T,
    pub(crate) sealer: Box<dyn Sealer>,
    pub(crate) version: ProtocolVersion,
    pub(crate) config: DynamicRecordSizeConfig,
    pub(crate) out: OutputBuffer,
    pub(crate) current_max_fragment_size: u16,
    pub(crate) bytes_out_since_resize: u64,
    pub(crate) wire_bytes_out: u64,
    pub(crate) idle_timer: IdleTimer,
    /// Pending alert raised by the receive side; takes priority
    pub(crate) reader_alert: Option<Alert>,
    /// Pending alert raised by the write side
    pub(crate) writer_alert: Option<Alert>,
    /// An alert has been queued as this connection's last transmission
    pub(crate) closing: bool,
    /// The closing alert has gone out and the connection is torn down
    pub(crate) closed: bool,
}

impl<T: Transport> Connection<T> {
    /// Create a connection with a negotiated version and active sealer.
    ///
    /// The fragment cap starts at the default (small) size and the output
    /// buffer is sized for one full record at that cap.
    pub fn new(
        transport: T,
        sealer: Box<dyn Sealer>,
        version: ProtocolVersion,
        config: DynamicRecordSizeConfig,
    ) -> Self {
        Connection {
            transport,
            sealer,
            version,
            config,
            out: OutputBuffer::with_capacity(record::max_record_size(DEFAULT_FRAGMENT_LENGTH)),
            current_max_fragment_size: DEFAULT_FRAGMENT_LENGTH,
            bytes_out_since_resize: 0,
            wire_bytes_out: 0,
            idle_timer: IdleTimer::new(),
            reader_alert: None,
            writer_alert: None,
            closing: false,
            closed: false,
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Fragment cap currently in effect
    pub fn current_max_fragment_size(&self) -> u16 {
        self.current_max_fragment_size
    }

    /// Cumulative bytes physically written to the transport
    pub fn wire_bytes_out(&self) -> u64 {
        self.wire_bytes_out
    }

    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn config(&self) -> &DynamicRecordSizeConfig {
        &self.config
    }

    /// The dynamic-size knobs may be tuned mid-connection; changes apply on
    /// the next send call.
    pub fn config_mut(&mut self) -> &mut DynamicRecordSizeConfig {
        &mut self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Bound the output buffer's capacity. Dynamic record-size growth that
    /// would exceed the bound is skipped, not fatal.
    pub fn set_output_capacity_limit(&mut self, limit: usize) {
        self.out.set_capacity_limit(limit);
    }

    /// Queue an alert raised by the receive side. The slot holds one alert;
    /// later alerts are dropped until it drains.
    pub fn queue_reader_alert(&mut self, alert: Alert) {
        self.reader_alert.get_or_insert(alert);
    }

    /// Queue an alert raised by the write side
    pub fn queue_writer_alert(&mut self, alert: Alert) {
        self.writer_alert.get_or_insert(alert);
    }

    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            wire_bytes_out: self.wire_bytes_out,
            bytes_out_since_resize: self.bytes_out_since_resize,
            current_max_fragment_size: self.current_max_fragment_size,
        }
    }

    /// Tear down transient state once the closing alert has gone out:
    /// wipe buffered plaintext and drop anything still queued.
    pub(crate) fn wipe_transient(&mut self) {
        self.out.wipe();
        self.reader_alert = None;
        self.writer_alert = None;
        self.bytes_out_since_resize = 0;
    }
}
