//! Dynamic Record-Size Configuration
//!
//! Each connection owns its configuration value; there is no process-wide
//! default. The fields may be tuned at any point in a connection's lifetime
//! and take effect on the next send call.

use wiretls_record::record::{DEFAULT_FRAGMENT_LENGTH, MAXIMUM_FRAGMENT_LENGTH};

/// Tuning knobs for the two-state record-size controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynamicRecordSizeConfig {
    /// Grow to `max_fragment_size` once this many plaintext bytes have gone
    /// out since the last resize event
    pub bytes_out_threshold: u64,
    /// Shrink back to the default fragment length after the write side has
    /// been idle this long
    pub idle_millis_threshold: u64,
    /// The large fragment cap, bounded by the protocol maximum
    pub max_fragment_size: u16,
}

impl DynamicRecordSizeConfig {
    /// Create a config, clamping the fragment cap to the protocol maximum
    pub fn new(bytes_out_threshold: u64, idle_millis_threshold: u64, max_fragment_size: u16) -> Self {
        DynamicRecordSizeConfig {
            bytes_out_threshold,
            idle_millis_threshold,
            max_fragment_size: max_fragment_size.clamp(1, MAXIMUM_FRAGMENT_LENGTH),
        }
    }

    /// Whether the controller can ever change the fragment size
    pub fn is_dynamic(&self) -> bool {
        self.max_fragment_size != DEFAULT_FRAGMENT_LENGTH
    }
}

impl Default for DynamicRecordSizeConfig {
    /// Dynamic sizing effectively disabled: the large cap equals the default
    /// fragment length, so the controller never moves.
    fn default() -> Self {
        DynamicRecordSizeConfig {
            bytes_out_threshold: 1024 * 1024,
            idle_millis_threshold: 1000,
            max_fragment_size: DEFAULT_FRAGMENT_LENGTH,
        }
    }
}
