//! Measurement types stored in the outstation database.
//!
//! This module defines the eight point kinds, their flags and timestamps,
//! and the event class a point reports its changes in.

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};

/// The eight kinds of points an outstation database stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PointType {
    /// Binary input (g1 / g2)
    BinaryInput = 0,
    /// Double-bit binary input (g3 / g4)
    DoubleBitBinaryInput = 1,
    /// Binary output status (g10 / g11)
    BinaryOutputStatus = 2,
    /// Counter (g20 / g22)
    Counter = 3,
    /// Frozen counter (g21 / g23)
    FrozenCounter = 4,
    /// Analog input (g30 / g32)
    AnalogInput = 5,
    /// Analog output status (g40 / g42)
    AnalogOutputStatus = 6,
    /// Octet string (g110 / g111)
    OctetString = 7,
}

impl PointType {
    /// All point types in class 0 reporting order.
    pub const ALL: [PointType; 8] = [
        Self::BinaryInput,
        Self::DoubleBitBinaryInput,
        Self::BinaryOutputStatus,
        Self::Counter,
        Self::FrozenCounter,
        Self::AnalogInput,
        Self::AnalogOutputStatus,
        Self::OctetString,
    ];

    /// Position of this type in tables indexed by point type.
    #[inline]
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// Static object group of this type.
    #[inline]
    pub const fn static_group(self) -> u8 {
        match self {
            Self::BinaryInput => 1,
            Self::DoubleBitBinaryInput => 3,
            Self::BinaryOutputStatus => 10,
            Self::Counter => 20,
            Self::FrozenCounter => 21,
            Self::AnalogInput => 30,
            Self::AnalogOutputStatus => 40,
            Self::OctetString => 110,
        }
    }

    /// Event object group of this type.
    #[inline]
    pub const fn event_group(self) -> u8 {
        match self {
            Self::BinaryInput => 2,
            Self::DoubleBitBinaryInput => 4,
            Self::BinaryOutputStatus => 11,
            Self::Counter => 22,
            Self::FrozenCounter => 23,
            Self::AnalogInput => 32,
            Self::AnalogOutputStatus => 42,
            Self::OctetString => 111,
        }
    }
}

impl std::fmt::Display for PointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Event class a point reports its changes in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventClass {
    Class1,
    Class2,
    Class3,
}

impl EventClass {
    /// All event classes.
    pub const ALL: [EventClass; 3] = [Self::Class1, Self::Class2, Self::Class3];

    /// Position of this class in tables indexed by class.
    #[inline]
    pub const fn ordinal(self) -> usize {
        match self {
            Self::Class1 => 0,
            Self::Class2 => 1,
            Self::Class3 => 2,
        }
    }
}

/// Set of event classes (used by class reads, unsolicited enable masks and freezes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventClasses {
    pub class1: bool,
    pub class2: bool,
    pub class3: bool,
}

impl EventClasses {
    /// No classes.
    pub const fn none() -> Self {
        Self {
            class1: false,
            class2: false,
            class3: false,
        }
    }

    /// All three classes.
    pub const fn all() -> Self {
        Self {
            class1: true,
            class2: true,
            class3: true,
        }
    }

    /// A set containing a single class.
    pub const fn single(class: EventClass) -> Self {
        Self::none().with(class, true)
    }

    /// Add or remove a class.
    pub const fn with(mut self, class: EventClass, value: bool) -> Self {
        match class {
            EventClass::Class1 => self.class1 = value,
            EventClass::Class2 => self.class2 = value,
            EventClass::Class3 => self.class3 = value,
        }
        self
    }

    /// Check if the set contains `class`.
    #[inline]
    pub const fn contains(&self, class: EventClass) -> bool {
        match class {
            EventClass::Class1 => self.class1,
            EventClass::Class2 => self.class2,
            EventClass::Class3 => self.class3,
        }
    }

    /// Check if the set is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        !(self.class1 || self.class2 || self.class3)
    }

    /// Check if the set contains every class.
    #[inline]
    pub const fn is_all(&self) -> bool {
        self.class1 && self.class2 && self.class3
    }

    /// Union of two sets.
    pub const fn union(self, other: Self) -> Self {
        Self {
            class1: self.class1 || other.class1,
            class2: self.class2 || other.class2,
            class3: self.class3 || other.class3,
        }
    }

    /// Remove every class in `other`.
    pub const fn difference(self, other: Self) -> Self {
        Self {
            class1: self.class1 && !other.class1,
            class2: self.class2 && !other.class2,
            class3: self.class3 && !other.class3,
        }
    }
}

/// Point flags.
///
/// The meaning of bits 5 and 6 depends on the point type; bit 7 carries the
/// state of binary points when flags and value are packed together.
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
#[repr(transparent)]
pub struct Flags(u8);

impl Flags {
    pub const ONLINE: Self = Self(0b0000_0001);
    pub const RESTART: Self = Self(0b0000_0010);
    pub const COMM_LOST: Self = Self(0b0000_0100);
    pub const REMOTE_FORCED: Self = Self(0b0000_1000);
    pub const LOCAL_FORCED: Self = Self(0b0001_0000);
    /// Binary types: chatter filter active
    pub const CHATTER_FILTER: Self = Self(0b0010_0000);
    /// Counter types: rollover
    pub const ROLLOVER: Self = Self(0b0010_0000);
    /// Analog types: over range
    pub const OVER_RANGE: Self = Self(0b0010_0000);
    /// Counter types: discontinuity
    pub const DISCONTINUITY: Self = Self(0b0100_0000);
    /// Analog types: reference error
    pub const REFERENCE_ERR: Self = Self(0b0100_0000);
    /// Binary types: state bit
    pub const STATE: Self = Self(0b1000_0000);

    const STATE_MASK: u8 = 0b1100_0000;

    /// Create from raw byte value.
    #[inline(always)]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Get the raw byte value.
    #[inline(always)]
    pub const fn value(self) -> u8 {
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

    /// Flags with a binary state packed into bit 7.
    #[inline(always)]
    pub(crate) const fn with_bit_state(self, state: bool) -> u8 {
        (self.0 & !Self::STATE.0) | if state { Self::STATE.0 } else { 0 }
    }

    /// Flags with a double-bit state packed into bits 6-7.
    #[inline(always)]
    pub(crate) const fn with_double_bit_state(self, state: DoubleBit) -> u8 {
        (self.0 & !Self::STATE_MASK) | (state.as_u8() << 6)
    }

    /// Flags without the state bits of binary types.
    #[inline(always)]
    pub(crate) const fn without_state(self, mask: u8) -> Self {
        Self(self.0 & !mask)
    }
}

impl std::ops::BitOr for Flags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::fmt::Debug for Flags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Flags(0x{:02X})", self.0)
    }
}

/// 48-bit DNP3 timestamp in milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const MASK_U48: u64 = 0x0000_FFFF_FFFF_FFFF;
    pub const OUT_OF_RANGE: &'static str = "<out of range>";

    /// Create a timestamp from milliseconds (truncated to 48 bits).
    #[inline]
    pub const fn new(value: u64) -> Self {
        Self(value & Self::MASK_U48)
    }

    /// Milliseconds since the epoch.
    #[inline]
    pub const fn raw_value(self) -> u64 {
        self.0
    }

    pub const fn min() -> Self {
        Self::new(u64::MIN)
    }

    pub const fn max() -> Self {
        Self::new(u64::MAX)
    }

    /// Decode from six little-endian bytes.
    pub fn from_le_bytes(bytes: [u8; 6]) -> Self {
        let mut value = 0u64;
        for (i, b) in bytes.iter().enumerate() {
            value |= (*b as u64) << (8 * i);
        }
        Self(value)
    }

    /// Encode to six little-endian bytes.
    pub fn to_le_bytes(self) -> [u8; 6] {
        let b = self.0.to_le_bytes();
        [b[0], b[1], b[2], b[3], b[4], b[5]]
    }

    /// Convert to a UTC datetime, if representable.
    pub fn to_datetime_utc(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0 as i64).single()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime_utc() {
            Some(x) => write!(f, "{}", x.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => f.write_str(Self::OUT_OF_RANGE),
        }
    }
}

/// Timestamp of a measurement together with its synchronization quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Time {
    /// Outstation clock synchronized with the master
    Synchronized(Timestamp),
    /// Outstation clock not synchronized
    Unsynchronized(Timestamp),
}

impl Time {
    pub const fn synchronized(value: u64) -> Self {
        Self::Synchronized(Timestamp::new(value))
    }

    pub const fn unsynchronized(value: u64) -> Self {
        Self::Unsynchronized(Timestamp::new(value))
    }

    /// The underlying timestamp.
    pub const fn timestamp(&self) -> Timestamp {
        match self {
            Self::Synchronized(t) | Self::Unsynchronized(t) => *t,
        }
    }

    pub const fn is_synchronized(&self) -> bool {
        matches!(self, Self::Synchronized(_))
    }
}

/// State of a double-bit binary point.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum DoubleBit {
    /// Transitioning between end states
    #[default]
    Intermediate,
    DeterminedOff,
    DeterminedOn,
    /// Abnormal or custom condition
    Indeterminate,
}

impl DoubleBit {
    /// Create from the lowest two bits of `x`.
    pub const fn from_u8(x: u8) -> Self {
        match x & 0b0000_0011 {
            0b00 => Self::Intermediate,
            0b01 => Self::DeterminedOff,
            0b10 => Self::DeterminedOn,
            _ => Self::Indeterminate,
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Intermediate => 0b00,
            Self::DeterminedOff => 0b01,
            Self::DeterminedOn => 0b10,
            Self::Indeterminate => 0b11,
        }
    }
}

macro_rules! measurement {
    ($(#[$doc:meta])* $name:ident, $value:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name {
            /// Point index
            pub index: u16,
            /// Current value
            pub value: $value,
            /// Point flags
            pub flags: Flags,
            /// Timestamp, `None` if not valid
            pub time: Option<Time>,
        }

        impl $name {
            /// Create a new measurement.
            pub fn new(index: u16, value: $value, flags: Flags, time: Time) -> Self {
                Self {
                    index,
                    value,
                    flags,
                    time: Some(time),
                }
            }

            /// Create a measurement without a valid timestamp.
            pub fn without_time(index: u16, value: $value, flags: Flags) -> Self {
                Self {
                    index,
                    value,
                    flags,
                    time: None,
                }
            }
        }
    };
}

measurement!(
    /// Binary input measurement.
    BinaryInput,
    bool
);
measurement!(
    /// Double-bit binary input measurement.
    DoubleBitBinaryInput,
    DoubleBit
);
measurement!(
    /// Binary output status measurement.
    BinaryOutputStatus,
    bool
);
measurement!(
    /// Counter measurement.
    Counter,
    u32
);
measurement!(
    /// Frozen counter measurement.
    FrozenCounter,
    u32
);
measurement!(
    /// Analog input measurement.
    AnalogInput,
    f64
);
measurement!(
    /// Analog output status measurement.
    AnalogOutputStatus,
    f64
);

/// Octet string value (1 to 255 bytes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OctetString {
    /// Point index
    pub index: u16,
    /// String bytes
    pub value: Bytes,
}

impl OctetString {
    /// Maximum length of an octet string.
    pub const MAX_LENGTH: usize = 255;

    pub fn new(index: u16, value: impl Into<Bytes>) -> Self {
        Self {
            index,
            value: value.into(),
        }
    }
}

/// A measurement of any point type.
#[derive(Debug, Clone, PartialEq)]
pub enum Measurement {
    BinaryInput(BinaryInput),
    DoubleBitBinaryInput(DoubleBitBinaryInput),
    BinaryOutputStatus(BinaryOutputStatus),
    Counter(Counter),
    FrozenCounter(FrozenCounter),
    AnalogInput(AnalogInput),
    AnalogOutputStatus(AnalogOutputStatus),
    OctetString(OctetString),
}

impl Measurement {
    /// Point type of this measurement.
    pub const fn point_type(&self) -> PointType {
        match self {
            Self::BinaryInput(_) => PointType::BinaryInput,
            Self::DoubleBitBinaryInput(_) => PointType::DoubleBitBinaryInput,
            Self::BinaryOutputStatus(_) => PointType::BinaryOutputStatus,
            Self::Counter(_) => PointType::Counter,
            Self::FrozenCounter(_) => PointType::FrozenCounter,
            Self::AnalogInput(_) => PointType::AnalogInput,
            Self::AnalogOutputStatus(_) => PointType::AnalogOutputStatus,
            Self::OctetString(_) => PointType::OctetString,
        }
    }

    /// Point index of this measurement.
    pub const fn index(&self) -> u16 {
        match self {
            Self::BinaryInput(m) => m.index,
            Self::DoubleBitBinaryInput(m) => m.index,
            Self::BinaryOutputStatus(m) => m.index,
            Self::Counter(m) => m.index,
            Self::FrozenCounter(m) => m.index,
            Self::AnalogInput(m) => m.index,
            Self::AnalogOutputStatus(m) => m.index,
            Self::OctetString(m) => m.index,
        }
    }

    /// Flags of this measurement (octet strings have none).
    pub const fn flags(&self) -> Option<Flags> {
        match self {
            Self::BinaryInput(m) => Some(m.flags),
            Self::DoubleBitBinaryInput(m) => Some(m.flags),
            Self::BinaryOutputStatus(m) => Some(m.flags),
            Self::Counter(m) => Some(m.flags),
            Self::FrozenCounter(m) => Some(m.flags),
            Self::AnalogInput(m) => Some(m.flags),
            Self::AnalogOutputStatus(m) => Some(m.flags),
            Self::OctetString(_) => None,
        }
    }

    /// Timestamp of this measurement.
    pub const fn time(&self) -> Option<Time> {
        match self {
            Self::BinaryInput(m) => m.time,
            Self::DoubleBitBinaryInput(m) => m.time,
            Self::BinaryOutputStatus(m) => m.time,
            Self::Counter(m) => m.time,
            Self::FrozenCounter(m) => m.time,
            Self::AnalogInput(m) => m.time,
            Self::AnalogOutputStatus(m) => m.time,
            Self::OctetString(_) => None,
        }
    }

    /// Default value a point holds right after it is added to the database.
    pub fn initial(point_type: PointType, index: u16) -> Self {
        let flags = Flags::RESTART;
        match point_type {
            PointType::BinaryInput => {
                Self::BinaryInput(BinaryInput::without_time(index, false, flags))
            }
            PointType::DoubleBitBinaryInput => Self::DoubleBitBinaryInput(
                DoubleBitBinaryInput::without_time(index, DoubleBit::Intermediate, flags),
            ),
            PointType::BinaryOutputStatus => {
                Self::BinaryOutputStatus(BinaryOutputStatus::without_time(index, false, flags))
            }
            PointType::Counter => Self::Counter(Counter::without_time(index, 0, flags)),
            PointType::FrozenCounter => {
                Self::FrozenCounter(FrozenCounter::without_time(index, 0, flags))
            }
            PointType::AnalogInput => {
                Self::AnalogInput(AnalogInput::without_time(index, 0.0, flags))
            }
            PointType::AnalogOutputStatus => {
                Self::AnalogOutputStatus(AnalogOutputStatus::without_time(index, 0.0, flags))
            }
            PointType::OctetString => {
                Self::OctetString(OctetString::new(index, Bytes::from_static(&[0x00])))
            }
        }
    }
}

macro_rules! measurement_from {
    ($name:ident) => {
        impl From<$name> for Measurement {
            fn from(value: $name) -> Self {
                Self::$name(value)
            }
        }
    };
}

measurement_from!(BinaryInput);
measurement_from!(DoubleBitBinaryInput);
measurement_from!(BinaryOutputStatus);
measurement_from!(Counter);
measurement_from!(FrozenCounter);
measurement_from!(AnalogInput);
measurement_from!(AnalogOutputStatus);
measurement_from!(OctetString);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_to_datetime_cannot_overflow() {
        assert!(Timestamp::new(u64::MAX).to_datetime_utc().is_some());
        assert_eq!(Timestamp::new(u64::MAX).raw_value(), Timestamp::MASK_U48);
    }

    #[test]
    fn test_timestamp_display() {
        assert_eq!(Timestamp::min().to_string(), "1970-01-01T00:00:00.000Z");
        assert_eq!(Timestamp::new(1_500).to_string(), "1970-01-01T00:00:01.500Z");
    }

    #[test]
    fn test_timestamp_bytes() {
        let ts = Timestamp::new(0x0605_0403_0201);
        assert_eq!(ts.to_le_bytes(), [0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
        assert_eq!(Timestamp::from_le_bytes(ts.to_le_bytes()), ts);
    }

    #[test]
    fn test_double_bit_conversion() {
        assert_eq!(DoubleBit::from_u8(0b01), DoubleBit::DeterminedOff);
        assert_eq!(DoubleBit::from_u8(0b1110), DoubleBit::DeterminedOn);
        assert_eq!(DoubleBit::Indeterminate.as_u8(), 0b11);
    }

    #[test]
    fn test_flags_state_packing() {
        let flags = Flags::ONLINE;
        assert_eq!(flags.with_bit_state(true), 0x81);
        assert_eq!(flags.with_bit_state(false), 0x01);
        assert_eq!(
            flags.with_double_bit_state(DoubleBit::DeterminedOn),
            0b1000_0001
        );
        assert_eq!(
            Flags::new(0xC1).without_state(0xC0),
            Flags::ONLINE
        );
    }

    #[test]
    fn test_event_classes() {
        let classes = EventClasses::single(EventClass::Class2);
        assert!(classes.contains(EventClass::Class2));
        assert!(!classes.contains(EventClass::Class1));
        assert!(EventClasses::none().is_empty());
        assert!(EventClasses::all().is_all());
        assert_eq!(
            EventClasses::all().difference(classes),
            EventClasses::single(EventClass::Class1).with(EventClass::Class3, true)
        );
    }

    #[test]
    fn test_measurement_accessors() {
        let m: Measurement = Counter::new(4, 10, Flags::ONLINE, Time::synchronized(5)).into();
        assert_eq!(m.point_type(), PointType::Counter);
        assert_eq!(m.index(), 4);
        assert_eq!(m.flags(), Some(Flags::ONLINE));
        assert_eq!(m.time(), Some(Time::synchronized(5)));

        let initial = Measurement::initial(PointType::OctetString, 2);
        assert_eq!(initial.flags(), None);
        assert_eq!(initial.index(), 2);
    }

    #[test]
    fn test_point_type_groups() {
        assert_eq!(PointType::AnalogInput.static_group(), 30);
        assert_eq!(PointType::AnalogInput.event_group(), 32);
        assert_eq!(PointType::OctetString.event_group(), 111);
        assert_eq!(PointType::BinaryInput.to_string(), "BinaryInput");
    }
}
