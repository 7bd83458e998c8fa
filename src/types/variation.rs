//! DNP3 object group / variation identification.
//!
//! Only the objects an outstation reads, writes or reports are listed.
//! Anything else is answered with the OBJECT_UNKNOWN indication.

/// Supported object group and variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variation {
    // ============================================
    // Binary input
    // ============================================
    /// Binary input, any variation
    Group1Var0,
    /// Binary input with flags
    Group1Var2,
    /// Binary input event, any variation
    Group2Var0,
    /// Binary input event without time
    Group2Var1,
    /// Binary input event with absolute time
    Group2Var2,

    // ============================================
    // Double-bit binary input
    // ============================================
    /// Double-bit binary input, any variation
    Group3Var0,
    /// Double-bit binary input with flags
    Group3Var2,
    /// Double-bit binary input event, any variation
    Group4Var0,
    /// Double-bit binary input event without time
    Group4Var1,
    /// Double-bit binary input event with absolute time
    Group4Var2,

    // ============================================
    // Binary output
    // ============================================
    /// Binary output status, any variation
    Group10Var0,
    /// Binary output status with flags
    Group10Var2,
    /// Binary output event, any variation
    Group11Var0,
    /// Binary output event without time
    Group11Var1,
    /// Binary output event with time
    Group11Var2,
    /// Control relay output block (CROB)
    Group12Var1,

    // ============================================
    // Counters
    // ============================================
    /// Counter, any variation
    Group20Var0,
    /// 32-bit counter with flag
    Group20Var1,
    /// 32-bit counter without flag
    Group20Var5,
    /// Frozen counter, any variation
    Group21Var0,
    /// 32-bit frozen counter with flag
    Group21Var1,
    /// 32-bit frozen counter without flag
    Group21Var9,
    /// Counter event, any variation
    Group22Var0,
    /// 32-bit counter event with flag
    Group22Var1,
    /// 32-bit counter event with flag and time
    Group22Var5,
    /// Frozen counter event, any variation
    Group23Var0,
    /// 32-bit frozen counter event with flag
    Group23Var1,
    /// 32-bit frozen counter event with flag and time
    Group23Var5,

    // ============================================
    // Analog input
    // ============================================
    /// Analog input, any variation
    Group30Var0,
    /// 32-bit analog input with flag
    Group30Var1,
    /// 32-bit analog input without flag
    Group30Var3,
    /// Single-precision analog input with flag
    Group30Var5,
    /// Analog input event, any variation
    Group32Var0,
    /// 32-bit analog input event without time
    Group32Var1,
    /// 32-bit analog input event with time
    Group32Var3,
    /// Single-precision analog input event without time
    Group32Var5,
    /// Single-precision analog input event with time
    Group32Var7,

    // ============================================
    // Analog output
    // ============================================
    /// Analog output status, any variation
    Group40Var0,
    /// 32-bit analog output status with flag
    Group40Var1,
    /// Single-precision analog output status with flag
    Group40Var3,
    /// 32-bit analog output block
    Group41Var1,
    /// 16-bit analog output block
    Group41Var2,
    /// Single-precision analog output block
    Group41Var3,
    /// Double-precision analog output block
    Group41Var4,
    /// Analog output event, any variation
    Group42Var0,
    /// 32-bit analog output event without time
    Group42Var1,
    /// 32-bit analog output event with time
    Group42Var3,
    /// Single-precision analog output event without time
    Group42Var5,
    /// Single-precision analog output event with time
    Group42Var7,

    // ============================================
    // Time and delay
    // ============================================
    /// Absolute time
    Group50Var1,
    /// Coarse time delay (seconds)
    Group52Var1,
    /// Fine time delay (milliseconds)
    Group52Var2,

    // ============================================
    // Class data and indications
    // ============================================
    /// Class 0 (static) data
    Group60Var1,
    /// Class 1 event data
    Group60Var2,
    /// Class 2 event data
    Group60Var3,
    /// Class 3 event data
    Group60Var4,
    /// Internal indications (packed bits)
    Group80Var1,

    // ============================================
    // Octet strings (variation = string length)
    // ============================================
    /// Octet string
    Group110(u8),
    /// Octet string event
    Group111(u8),
}

impl Variation {
    /// Look up a variation from its group and variation numbers.
    pub fn lookup(group: u8, variation: u8) -> Option<Self> {
        let v = match (group, variation) {
            (1, 0) => Self::Group1Var0,
            (1, 2) => Self::Group1Var2,
            (2, 0) => Self::Group2Var0,
            (2, 1) => Self::Group2Var1,
            (2, 2) => Self::Group2Var2,
            (3, 0) => Self::Group3Var0,
            (3, 2) => Self::Group3Var2,
            (4, 0) => Self::Group4Var0,
            (4, 1) => Self::Group4Var1,
            (4, 2) => Self::Group4Var2,
            (10, 0) => Self::Group10Var0,
            (10, 2) => Self::Group10Var2,
            (11, 0) => Self::Group11Var0,
            (11, 1) => Self::Group11Var1,
            (11, 2) => Self::Group11Var2,
            (12, 1) => Self::Group12Var1,
            (20, 0) => Self::Group20Var0,
            (20, 1) => Self::Group20Var1,
            (20, 5) => Self::Group20Var5,
            (21, 0) => Self::Group21Var0,
            (21, 1) => Self::Group21Var1,
            (21, 9) => Self::Group21Var9,
            (22, 0) => Self::Group22Var0,
            (22, 1) => Self::Group22Var1,
            (22, 5) => Self::Group22Var5,
            (23, 0) => Self::Group23Var0,
            (23, 1) => Self::Group23Var1,
            (23, 5) => Self::Group23Var5,
            (30, 0) => Self::Group30Var0,
            (30, 1) => Self::Group30Var1,
            (30, 3) => Self::Group30Var3,
            (30, 5) => Self::Group30Var5,
            (32, 0) => Self::Group32Var0,
            (32, 1) => Self::Group32Var1,
            (32, 3) => Self::Group32Var3,
            (32, 5) => Self::Group32Var5,
            (32, 7) => Self::Group32Var7,
            (40, 0) => Self::Group40Var0,
            (40, 1) => Self::Group40Var1,
            (40, 3) => Self::Group40Var3,
            (41, 1) => Self::Group41Var1,
            (41, 2) => Self::Group41Var2,
            (41, 3) => Self::Group41Var3,
            (41, 4) => Self::Group41Var4,
            (42, 0) => Self::Group42Var0,
            (42, 1) => Self::Group42Var1,
            (42, 3) => Self::Group42Var3,
            (42, 5) => Self::Group42Var5,
            (42, 7) => Self::Group42Var7,
            (50, 1) => Self::Group50Var1,
            (52, 1) => Self::Group52Var1,
            (52, 2) => Self::Group52Var2,
            (60, 1) => Self::Group60Var1,
            (60, 2) => Self::Group60Var2,
            (60, 3) => Self::Group60Var3,
            (60, 4) => Self::Group60Var4,
            (80, 1) => Self::Group80Var1,
            (110, v) => Self::Group110(v),
            (111, v) => Self::Group111(v),
            _ => return None,
        };
        Some(v)
    }

    /// Get the group and variation numbers.
    pub const fn to_group_and_var(self) -> (u8, u8) {
        match self {
            Self::Group1Var0 => (1, 0),
            Self::Group1Var2 => (1, 2),
            Self::Group2Var0 => (2, 0),
            Self::Group2Var1 => (2, 1),
            Self::Group2Var2 => (2, 2),
            Self::Group3Var0 => (3, 0),
            Self::Group3Var2 => (3, 2),
            Self::Group4Var0 => (4, 0),
            Self::Group4Var1 => (4, 1),
            Self::Group4Var2 => (4, 2),
            Self::Group10Var0 => (10, 0),
            Self::Group10Var2 => (10, 2),
            Self::Group11Var0 => (11, 0),
            Self::Group11Var1 => (11, 1),
            Self::Group11Var2 => (11, 2),
            Self::Group12Var1 => (12, 1),
            Self::Group20Var0 => (20, 0),
            Self::Group20Var1 => (20, 1),
            Self::Group20Var5 => (20, 5),
            Self::Group21Var0 => (21, 0),
            Self::Group21Var1 => (21, 1),
            Self::Group21Var9 => (21, 9),
            Self::Group22Var0 => (22, 0),
            Self::Group22Var1 => (22, 1),
            Self::Group22Var5 => (22, 5),
            Self::Group23Var0 => (23, 0),
            Self::Group23Var1 => (23, 1),
            Self::Group23Var5 => (23, 5),
            Self::Group30Var0 => (30, 0),
            Self::Group30Var1 => (30, 1),
            Self::Group30Var3 => (30, 3),
            Self::Group30Var5 => (30, 5),
            Self::Group32Var0 => (32, 0),
            Self::Group32Var1 => (32, 1),
            Self::Group32Var3 => (32, 3),
            Self::Group32Var5 => (32, 5),
            Self::Group32Var7 => (32, 7),
            Self::Group40Var0 => (40, 0),
            Self::Group40Var1 => (40, 1),
            Self::Group40Var3 => (40, 3),
            Self::Group41Var1 => (41, 1),
            Self::Group41Var2 => (41, 2),
            Self::Group41Var3 => (41, 3),
            Self::Group41Var4 => (41, 4),
            Self::Group42Var0 => (42, 0),
            Self::Group42Var1 => (42, 1),
            Self::Group42Var3 => (42, 3),
            Self::Group42Var5 => (42, 5),
            Self::Group42Var7 => (42, 7),
            Self::Group50Var1 => (50, 1),
            Self::Group52Var1 => (52, 1),
            Self::Group52Var2 => (52, 2),
            Self::Group60Var1 => (60, 1),
            Self::Group60Var2 => (60, 2),
            Self::Group60Var3 => (60, 3),
            Self::Group60Var4 => (60, 4),
            Self::Group80Var1 => (80, 1),
            Self::Group110(v) => (110, v),
            Self::Group111(v) => (111, v),
        }
    }

    /// Size in bytes of one object of this variation, if it has a fixed size.
    ///
    /// Returns `None` for "any variation" requests, class objects and bit-packed objects.
    pub const fn fixed_size(self) -> Option<usize> {
        let size = match self {
            Self::Group1Var2
            | Self::Group2Var1
            | Self::Group3Var2
            | Self::Group4Var1
            | Self::Group10Var2
            | Self::Group11Var1 => 1,
            Self::Group2Var2 | Self::Group4Var2 | Self::Group11Var2 => 7,
            Self::Group12Var1 => 11,
            Self::Group20Var1
            | Self::Group21Var1
            | Self::Group22Var1
            | Self::Group23Var1
            | Self::Group30Var1
            | Self::Group30Var5
            | Self::Group32Var1
            | Self::Group32Var5
            | Self::Group40Var1
            | Self::Group40Var3
            | Self::Group41Var1
            | Self::Group41Var3
            | Self::Group42Var1
            | Self::Group42Var5 => 5,
            Self::Group20Var5 | Self::Group21Var9 | Self::Group30Var3 => 4,
            Self::Group22Var5
            | Self::Group23Var5
            | Self::Group32Var3
            | Self::Group32Var7
            | Self::Group42Var3
            | Self::Group42Var7 => 11,
            Self::Group41Var2 => 3,
            Self::Group41Var4 => 9,
            Self::Group50Var1 => 6,
            Self::Group52Var1 | Self::Group52Var2 => 2,
            Self::Group110(v) | Self::Group111(v) => {
                if v == 0 {
                    return None;
                }
                v as usize
            }
            _ => return None,
        };
        Some(size)
    }

    /// Check if this is a command (output control) object.
    pub const fn is_command(self) -> bool {
        matches!(
            self,
            Self::Group12Var1
                | Self::Group41Var1
                | Self::Group41Var2
                | Self::Group41Var3
                | Self::Group41Var4
        )
    }
}

impl std::fmt::Display for Variation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (g, v) = self.to_group_and_var();
        write!(f, "g{}v{}", g, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_round_trip() {
        for group in 0..=255u8 {
            for var in 0..=12u8 {
                if let Some(v) = Variation::lookup(group, var) {
                    assert_eq!(v.to_group_and_var(), (group, var));
                }
            }
        }
    }

    #[test]
    fn test_unknown_variation() {
        assert!(Variation::lookup(1, 1).is_none());
        assert!(Variation::lookup(99, 1).is_none());
        assert!(Variation::lookup(32, 2).is_none());
    }

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(Variation::Group1Var2.fixed_size(), Some(1));
        assert_eq!(Variation::Group2Var2.fixed_size(), Some(7));
        assert_eq!(Variation::Group12Var1.fixed_size(), Some(11));
        assert_eq!(Variation::Group32Var7.fixed_size(), Some(11));
        assert_eq!(Variation::Group41Var2.fixed_size(), Some(3));
        assert_eq!(Variation::Group41Var4.fixed_size(), Some(9));
        assert_eq!(Variation::Group110(5).fixed_size(), Some(5));
        assert_eq!(Variation::Group110(0).fixed_size(), None);
        assert_eq!(Variation::Group60Var1.fixed_size(), None);
        assert_eq!(Variation::Group80Var1.fixed_size(), None);
    }

    #[test]
    fn test_variation_display() {
        assert_eq!(Variation::Group12Var1.to_string(), "g12v1");
        assert_eq!(Variation::Group111(3).to_string(), "g111v3");
    }
}
