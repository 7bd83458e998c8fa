//! Internal indication (IIN) bits.
//!
//! Every response carries two IIN octets that report outstation status to the master.

/// First IIN octet.
///
/// Bit layout:
/// - Bit 0: all stations (broadcast received)
/// - Bit 1: class 1 events available
/// - Bit 2: class 2 events available
/// - Bit 3: class 3 events available
/// - Bit 4: time synchronization required
/// - Bit 5: local control
/// - Bit 6: device trouble
/// - Bit 7: device restart
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct Iin1(u8);

impl Iin1 {
    pub const BROADCAST: Self = Self(0b0000_0001);
    pub const CLASS_1_EVENTS: Self = Self(0b0000_0010);
    pub const CLASS_2_EVENTS: Self = Self(0b0000_0100);
    pub const CLASS_3_EVENTS: Self = Self(0b0000_1000);
    pub const NEED_TIME: Self = Self(0b0001_0000);
    pub const LOCAL_CONTROL: Self = Self(0b0010_0000);
    pub const DEVICE_TROUBLE: Self = Self(0b0100_0000);
    pub const DEVICE_RESTART: Self = Self(0b1000_0000);

    /// Create from raw byte value.
    #[inline(always)]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Get the raw byte value.
    #[inline(always)]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Check if all bits of `other` are set.
    #[inline(always)]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set or clear the bits of `other`.
    #[inline(always)]
    pub const fn with(self, other: Self, value: bool) -> Self {
        if value {
            Self(self.0 | other.0)
        } else {
            Self(self.0 & !other.0)
        }
    }
}

impl std::ops::BitOr for Iin1 {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Iin1 {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Second IIN octet.
///
/// Bit layout:
/// - Bit 0: function code not supported
/// - Bit 1: requested object unknown
/// - Bit 2: parameter error
/// - Bit 3: event buffer overflow
/// - Bit 4: operation already executing
/// - Bit 5: configuration corrupt
#[derive(Clone, Copy, PartialEq, Eq, Default)]
#[repr(transparent)]
pub struct Iin2(u8);

impl Iin2 {
    pub const NO_FUNC_CODE_SUPPORT: Self = Self(0b0000_0001);
    pub const OBJECT_UNKNOWN: Self = Self(0b0000_0010);
    pub const PARAMETER_ERROR: Self = Self(0b0000_0100);
    pub const EVENT_BUFFER_OVERFLOW: Self = Self(0b0000_1000);
    pub const ALREADY_EXECUTING: Self = Self(0b0001_0000);
    pub const CONFIG_CORRUPT: Self = Self(0b0010_0000);

    /// Create from raw byte value.
    #[inline(always)]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Get the raw byte value.
    #[inline(always)]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Check if all bits of `other` are set.
    #[inline(always)]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set or clear the bits of `other`.
    #[inline(always)]
    pub const fn with(self, other: Self, value: bool) -> Self {
        if value {
            Self(self.0 | other.0)
        } else {
            Self(self.0 & !other.0)
        }
    }

    /// Check if any request-level error bit is set.
    #[inline(always)]
    pub const fn has_request_error(self) -> bool {
        self.0 & (Self::NO_FUNC_CODE_SUPPORT.0 | Self::OBJECT_UNKNOWN.0 | Self::PARAMETER_ERROR.0)
            != 0
    }
}

impl std::ops::BitOr for Iin2 {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Iin2 {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Both IIN octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Iin {
    pub iin1: Iin1,
    pub iin2: Iin2,
}

impl Iin {
    /// Create from both octets.
    #[inline]
    pub const fn new(iin1: Iin1, iin2: Iin2) -> Self {
        Self { iin1, iin2 }
    }

    /// Create from raw bytes.
    #[inline]
    pub const fn from_bytes(iin1: u8, iin2: u8) -> Self {
        Self {
            iin1: Iin1::new(iin1),
            iin2: Iin2::new(iin2),
        }
    }
}

impl std::ops::BitOr for Iin {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            iin1: self.iin1 | rhs.iin1,
            iin2: self.iin2 | rhs.iin2,
        }
    }
}

impl std::ops::BitOr<Iin1> for Iin {
    type Output = Self;

    fn bitor(self, rhs: Iin1) -> Self {
        Self {
            iin1: self.iin1 | rhs,
            iin2: self.iin2,
        }
    }
}

impl std::ops::BitOr<Iin2> for Iin {
    type Output = Self;

    fn bitor(self, rhs: Iin2) -> Self {
        Self {
            iin1: self.iin1,
            iin2: self.iin2 | rhs,
        }
    }
}

const IIN1_NAMES: [&str; 8] = [
    "BROADCAST",
    "CLASS_1_EVENTS",
    "CLASS_2_EVENTS",
    "CLASS_3_EVENTS",
    "NEED_TIME",
    "LOCAL_CONTROL",
    "DEVICE_TROUBLE",
    "DEVICE_RESTART",
];

const IIN2_NAMES: [&str; 8] = [
    "NO_FUNC_CODE_SUPPORT",
    "OBJECT_UNKNOWN",
    "PARAMETER_ERROR",
    "EVENT_BUFFER_OVERFLOW",
    "ALREADY_EXECUTING",
    "CONFIG_CORRUPT",
    "RESERVED_2",
    "RESERVED_1",
];

fn write_bits(
    f: &mut std::fmt::Formatter<'_>,
    value: u8,
    names: &[&str; 8],
    first: &mut bool,
) -> std::fmt::Result {
    for (bit, name) in names.iter().enumerate() {
        if value & (1 << bit) != 0 {
            if !*first {
                f.write_str("|")?;
            }
            *first = false;
            f.write_str(name)?;
        }
    }
    Ok(())
}

impl std::fmt::Debug for Iin1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Iin1(0x{:02X})", self.0)
    }
}

impl std::fmt::Debug for Iin2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Iin2(0x{:02X})", self.0)
    }
}

impl std::fmt::Display for Iin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.iin1.0 == 0 && self.iin2.0 == 0 {
            return f.write_str("IIN(none)");
        }
        f.write_str("IIN(")?;
        let mut first = true;
        write_bits(f, self.iin1.0, &IIN1_NAMES, &mut first)?;
        write_bits(f, self.iin2.0, &IIN2_NAMES, &mut first)?;
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iin1_bits() {
        let iin1 = Iin1::DEVICE_RESTART | Iin1::CLASS_1_EVENTS;
        assert_eq!(iin1.as_u8(), 0x82);
        assert!(iin1.contains(Iin1::DEVICE_RESTART));
        assert!(!iin1.contains(Iin1::NEED_TIME));
        assert_eq!(iin1.with(Iin1::DEVICE_RESTART, false).as_u8(), 0x02);
    }

    #[test]
    fn test_iin2_request_error() {
        assert!(Iin2::OBJECT_UNKNOWN.has_request_error());
        assert!(Iin2::PARAMETER_ERROR.has_request_error());
        assert!(!Iin2::EVENT_BUFFER_OVERFLOW.has_request_error());
        assert!(!Iin2::default().has_request_error());
    }

    #[test]
    fn test_iin_combine() {
        let iin = Iin::default() | Iin1::NEED_TIME | Iin2::NO_FUNC_CODE_SUPPORT;
        assert_eq!(iin, Iin::from_bytes(0x10, 0x01));
    }

    #[test]
    fn test_iin_display() {
        assert_eq!(Iin::default().to_string(), "IIN(none)");
        assert_eq!(
            Iin::from_bytes(0x80, 0x02).to_string(),
            "IIN(DEVICE_RESTART|OBJECT_UNKNOWN)"
        );
    }
}
