//! Error types for the DNP3 outstation engine.

use std::borrow::Cow;

use thiserror::Error;

use crate::types::PointType;

/// Result type alias for outstation operations.
pub type Result<T> = std::result::Result<T, Dnp3Error>;

/// DNP3 outstation error types.
#[derive(Debug, Error)]
pub enum Dnp3Error {
    /// Point already registered at this index
    #[error("Duplicate index: {point_type} {index}")]
    DuplicateIndex { point_type: PointType, index: u16 },

    /// Point not registered at this index
    #[error("Unknown index: {point_type} {index}")]
    UnknownIndex { point_type: PointType, index: u16 },

    /// Value cannot be stored in the point
    #[error("Invalid value: {0}")]
    InvalidValue(Cow<'static, str>),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(Cow<'static, str>),

    /// Object group/variation not known to the outstation
    #[error("Unknown object: g{group}v{variation}")]
    ObjectUnknown { group: u8, variation: u8 },

    /// Unknown function code
    #[error("Unknown function code: 0x{0:02X}")]
    UnknownFunction(u8),

    /// Qualifier not valid for the object
    #[error("Bad qualifier 0x{qualifier:02X} for g{group}v{variation}")]
    BadQualifier {
        group: u8,
        variation: u8,
        qualifier: u8,
    },

    /// Fragment ended in the middle of an object header or object
    #[error("Insufficient bytes: {0}")]
    InsufficientBytes(Cow<'static, str>),

    /// Range or count inside an object header is not valid
    #[error("Bad range: {0}")]
    BadRange(Cow<'static, str>),

    /// Invalid fragment format
    #[error("Invalid fragment: {0}")]
    InvalidFrame(Cow<'static, str>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Codec error
    #[error("Codec error: {0}")]
    Codec(Cow<'static, str>),

    /// Channel closed
    #[error("Channel closed")]
    ChannelClosed,

    /// Outstation was shut down through its handle
    #[error("Outstation shut down")]
    Shutdown,
}

impl Dnp3Error {
    /// Create an invalid configuration error with a static message.
    pub const fn invalid_config_static(msg: &'static str) -> Self {
        Self::InvalidConfig(Cow::Borrowed(msg))
    }

    /// Create an invalid configuration error with a message.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(Cow::Owned(msg.into()))
    }

    /// Create an invalid value error with a static message.
    pub const fn invalid_value_static(msg: &'static str) -> Self {
        Self::InvalidValue(Cow::Borrowed(msg))
    }

    /// Create an insufficient bytes error with a static message.
    pub const fn insufficient_static(msg: &'static str) -> Self {
        Self::InsufficientBytes(Cow::Borrowed(msg))
    }

    /// Create a bad range error with a static message.
    pub const fn bad_range_static(msg: &'static str) -> Self {
        Self::BadRange(Cow::Borrowed(msg))
    }

    /// Create an invalid fragment error with a static message.
    pub const fn invalid_frame_static(msg: &'static str) -> Self {
        Self::InvalidFrame(Cow::Borrowed(msg))
    }

    /// Create an invalid fragment error with a message.
    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(Cow::Owned(msg.into()))
    }

    /// Check if this error is raised while building the database or the configuration.
    ///
    /// These errors are rejected before the engine starts.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIndex { .. }
                | Self::UnknownIndex { .. }
                | Self::InvalidValue(_)
                | Self::InvalidConfig(_)
        )
    }

    /// Check if this error describes a malformed or unsupported request.
    ///
    /// Protocol errors are reported to the master through IIN bits and never end the session.
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::ObjectUnknown { .. }
                | Self::UnknownFunction(_)
                | Self::BadQualifier { .. }
                | Self::InsufficientBytes(_)
                | Self::BadRange(_)
                | Self::InvalidFrame(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Dnp3Error::DuplicateIndex {
            point_type: PointType::BinaryInput,
            index: 7,
        };
        assert_eq!(err.to_string(), "Duplicate index: BinaryInput 7");

        let err = Dnp3Error::ObjectUnknown {
            group: 99,
            variation: 1,
        };
        assert_eq!(err.to_string(), "Unknown object: g99v1");

        let err = Dnp3Error::UnknownFunction(0x7F);
        assert_eq!(err.to_string(), "Unknown function code: 0x7F");

        let err = Dnp3Error::BadQualifier {
            group: 1,
            variation: 2,
            qualifier: 0x5B,
        };
        assert_eq!(err.to_string(), "Bad qualifier 0x5B for g1v2");
    }

    #[test]
    fn test_is_configuration_error() {
        assert!(Dnp3Error::invalid_config_static("zero capacity").is_configuration_error());
        assert!(Dnp3Error::UnknownIndex {
            point_type: PointType::Counter,
            index: 3
        }
        .is_configuration_error());
        assert!(!Dnp3Error::ChannelClosed.is_configuration_error());
    }

    #[test]
    fn test_is_protocol_error() {
        assert!(Dnp3Error::UnknownFunction(0x30).is_protocol_error());
        assert!(Dnp3Error::insufficient_static("header").is_protocol_error());
        assert!(!Dnp3Error::Shutdown.is_protocol_error());
        assert!(!Dnp3Error::invalid_config("x").is_protocol_error());
    }
}
