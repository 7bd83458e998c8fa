//! DNP3 object header qualifier codes.

use crate::error::{Dnp3Error, Result};

/// Qualifier code of an object header.
///
/// Only the qualifiers used by an outstation to parse requests and
/// format responses are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum QualifierCode {
    /// 8-bit start and stop indices (0x00)
    Range8 = 0x00,

    /// 16-bit start and stop indices (0x01)
    Range16 = 0x01,

    /// All objects, no range field (0x06)
    AllObjects = 0x06,

    /// 8-bit object count (0x07)
    Count8 = 0x07,

    /// 16-bit object count (0x08)
    Count16 = 0x08,

    /// 8-bit count, objects prefixed with 8-bit index (0x17)
    CountAndPrefix8 = 0x17,

    /// 16-bit count, objects prefixed with 16-bit index (0x28)
    CountAndPrefix16 = 0x28,
}

impl QualifierCode {
    /// Create from raw byte value.
    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Range8),
            0x01 => Some(Self::Range16),
            0x06 => Some(Self::AllObjects),
            0x07 => Some(Self::Count8),
            0x08 => Some(Self::Count16),
            0x17 => Some(Self::CountAndPrefix8),
            0x28 => Some(Self::CountAndPrefix16),
            _ => None,
        }
    }

    /// Create from raw byte value, reporting the object it qualifies on failure.
    pub fn parse(value: u8, group: u8, variation: u8) -> Result<Self> {
        Self::from_u8(value).ok_or(Dnp3Error::BadQualifier {
            group,
            variation,
            qualifier: value,
        })
    }

    /// Convert to raw byte value.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Number of bytes in the range field that follows the qualifier.
    #[inline]
    pub const fn range_field_size(self) -> usize {
        match self {
            Self::Range8 => 2,
            Self::Range16 => 4,
            Self::AllObjects => 0,
            Self::Count8 | Self::CountAndPrefix8 => 1,
            Self::Count16 | Self::CountAndPrefix16 => 2,
        }
    }

    /// Number of index bytes that prefix each object.
    #[inline]
    pub const fn prefix_size(self) -> usize {
        match self {
            Self::CountAndPrefix8 => 1,
            Self::CountAndPrefix16 => 2,
            _ => 0,
        }
    }

    /// Check if this is a start-stop range qualifier.
    #[inline]
    pub const fn is_range(self) -> bool {
        matches!(self, Self::Range8 | Self::Range16)
    }

    /// Check if this is a count qualifier without index prefixes.
    #[inline]
    pub const fn is_count(self) -> bool {
        matches!(self, Self::Count8 | Self::Count16)
    }

    /// Check if objects carry an index prefix.
    #[inline]
    pub const fn is_prefixed(self) -> bool {
        matches!(self, Self::CountAndPrefix8 | Self::CountAndPrefix16)
    }
}

impl std::fmt::Display for QualifierCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:02X}", self.as_u8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualifier_values() {
        for value in [0x00, 0x01, 0x06, 0x07, 0x08, 0x17, 0x28] {
            assert_eq!(QualifierCode::from_u8(value).unwrap().as_u8(), value);
        }
    }

    #[test]
    fn test_unsupported_qualifier() {
        assert!(QualifierCode::from_u8(0x5B).is_none());
        assert!(matches!(
            QualifierCode::parse(0x39, 12, 1),
            Err(Dnp3Error::BadQualifier {
                group: 12,
                variation: 1,
                qualifier: 0x39
            })
        ));
    }

    #[test]
    fn test_field_sizes() {
        assert_eq!(QualifierCode::Range8.range_field_size(), 2);
        assert_eq!(QualifierCode::Range16.range_field_size(), 4);
        assert_eq!(QualifierCode::AllObjects.range_field_size(), 0);
        assert_eq!(QualifierCode::CountAndPrefix16.range_field_size(), 2);
        assert_eq!(QualifierCode::CountAndPrefix16.prefix_size(), 2);
        assert_eq!(QualifierCode::CountAndPrefix8.prefix_size(), 1);
        assert_eq!(QualifierCode::Count8.prefix_size(), 0);
    }

    #[test]
    fn test_qualifier_display() {
        assert_eq!(QualifierCode::CountAndPrefix16.to_string(), "0x28");
    }
}
