//! TLS Alert Codes
//!
//! Alerts are 2-byte codes (severity level + description) carried in records
//! of their own content type. The write path keeps at most one pending alert
//! per originator (reader / writer) and transmits it as the connection's last
//! record.

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertLevel {
    Warning = 1,
    Fatal = 2,
}

impl AlertLevel {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(AlertLevel::Warning),
            2 => Some(AlertLevel::Fatal),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Alert descriptions used by the write path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AlertDescription {
    CloseNotify = 0,
    UnexpectedMessage = 10,
    BadRecordMac = 20,
    RecordOverflow = 22,
    HandshakeFailure = 40,
    InternalError = 80,
    UserCanceled = 90,
}

impl AlertDescription {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(AlertDescription::CloseNotify),
            10 => Some(AlertDescription::UnexpectedMessage),
            20 => Some(AlertDescription::BadRecordMac),
            22 => Some(AlertDescription::RecordOverflow),
            40 => Some(AlertDescription::HandshakeFailure),
            80 => Some(AlertDescription::InternalError),
            90 => Some(AlertDescription::UserCanceled),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One pending alert: severity plus description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alert {
    pub level: AlertLevel,
    pub description: AlertDescription,
}

impl Alert {
    pub fn new(level: AlertLevel, description: AlertDescription) -> Self {
        Alert { level, description }
    }

    /// The warning-level close_notify sent during orderly shutdown
    pub fn close_notify() -> Self {
        Alert::new(AlertLevel::Warning, AlertDescription::CloseNotify)
    }

    /// Wire encoding
    pub fn to_bytes(self) -> [u8; 2] {
        [self.level.as_u8(), self.description.as_u8()]
    }

    pub fn from_bytes(bytes: [u8; 2]) -> Option<Self> {
        Some(Alert {
            level: AlertLevel::from_u8(bytes[0])?,
            description: AlertDescription::from_u8(bytes[1])?,
        })
    }
}
