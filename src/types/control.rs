//! Output control objects: CROB (g12v1) and analog output blocks (g41v1-4).

use crate::types::Variation;

/// Operation requested by a CROB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpType {
    Nul,
    PulseOn,
    PulseOff,
    LatchOn,
    LatchOff,
    Unknown(u8),
}

impl OpType {
    pub const fn from_u8(x: u8) -> Self {
        match x {
            0 => Self::Nul,
            1 => Self::PulseOn,
            2 => Self::PulseOff,
            3 => Self::LatchOn,
            4 => Self::LatchOff,
            _ => Self::Unknown(x),
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Nul => 0,
            Self::PulseOn => 1,
            Self::PulseOff => 2,
            Self::LatchOn => 3,
            Self::LatchOff => 4,
            Self::Unknown(x) => x,
        }
    }
}

/// Trip/close selector of a CROB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripCloseCode {
    Nul,
    Close,
    Trip,
    Reserved,
}

impl TripCloseCode {
    pub const fn from_u8(x: u8) -> Self {
        match x & 0b11 {
            0 => Self::Nul,
            1 => Self::Close,
            2 => Self::Trip,
            _ => Self::Reserved,
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Nul => 0,
            Self::Close => 1,
            Self::Trip => 2,
            Self::Reserved => 3,
        }
    }
}

/// CROB control code octet.
///
/// ```text
/// +-----+-----+-----+-----+-----+-----+-----+-----+
/// |    TCC    | CR  | QU  |        OP TYPE        |
/// +-----+-----+-----+-----+-----+-----+-----+-----+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlCode {
    pub tcc: TripCloseCode,
    pub clear: bool,
    pub queue: bool,
    pub op_type: OpType,
}

impl ControlCode {
    const TCC_MASK: u8 = 0b1100_0000;
    const CR_MASK: u8 = 0b0010_0000;
    const QU_MASK: u8 = 0b0001_0000;
    const OP_MASK: u8 = 0b0000_1111;

    /// Control code with only an operation type.
    pub const fn from_op_type(op_type: OpType) -> Self {
        Self {
            tcc: TripCloseCode::Nul,
            clear: false,
            queue: false,
            op_type,
        }
    }

    pub const fn from_u8(x: u8) -> Self {
        Self {
            tcc: TripCloseCode::from_u8((x & Self::TCC_MASK) >> 6),
            clear: x & Self::CR_MASK != 0,
            queue: x & Self::QU_MASK != 0,
            op_type: OpType::from_u8(x & Self::OP_MASK),
        }
    }

    pub const fn as_u8(self) -> u8 {
        let mut x = self.tcc.as_u8() << 6;
        if self.clear {
            x |= Self::CR_MASK;
        }
        if self.queue {
            x |= Self::QU_MASK;
        }
        x | (self.op_type.as_u8() & Self::OP_MASK)
    }
}

/// Control relay output block (g12v1), without its status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Group12Var1 {
    pub code: ControlCode,
    pub count: u8,
    pub on_time: u32,
    pub off_time: u32,
}

impl Group12Var1 {
    /// Encoded size including the status octet.
    pub const SIZE: usize = 11;

    pub const fn new(code: ControlCode, count: u8, on_time: u32, off_time: u32) -> Self {
        Self {
            code,
            count,
            on_time,
            off_time,
        }
    }

    /// Parse from 11 bytes, returning the command and its status octet.
    pub fn parse(data: &[u8; Self::SIZE]) -> (Self, u8) {
        (
            Self {
                code: ControlCode::from_u8(data[0]),
                count: data[1],
                on_time: u32::from_le_bytes([data[2], data[3], data[4], data[5]]),
                off_time: u32::from_le_bytes([data[6], data[7], data[8], data[9]]),
            },
            data[10],
        )
    }

    /// Encode with the given status.
    pub fn encode(&self, status: CommandStatus) -> [u8; Self::SIZE] {
        let on = self.on_time.to_le_bytes();
        let off = self.off_time.to_le_bytes();
        [
            self.code.as_u8(),
            self.count,
            on[0],
            on[1],
            on[2],
            on[3],
            off[0],
            off[1],
            off[2],
            off[3],
            status.as_u8(),
        ]
    }
}

/// Status of a command, returned by the control handler and echoed to the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandStatus {
    /// Command accepted, initiated or queued (0)
    Success,
    /// Operate received after the select timeout (1)
    Timeout,
    /// No previous matching select (2)
    NoSelect,
    /// Request not accepted because of formatting errors (3)
    FormatError,
    /// Operation not supported for this point (4)
    NotSupported,
    /// Operation already active on this point (5)
    AlreadyActive,
    /// Hardware problem (6)
    HardwareError,
    /// Point under local control (7)
    Local,
    /// Too many operations requested (8)
    TooManyOps,
    /// Insufficient authorization (9)
    NotAuthorized,
    /// Inhibited by a local automation process (10)
    AutomationInhibit,
    /// Device cannot process more requests right now (11)
    ProcessingLimited,
    /// Value outside the permitted range (12)
    OutOfRange,
    /// Request received and the device will act only on its downstream association (13)
    DownstreamLocal,
    /// Operation already complete (14)
    AlreadyComplete,
    /// Blocked by another condition (15)
    Blocked,
    /// Operation canceled (16)
    Canceled,
    /// Blocked by another master (17)
    BlockedOtherMaster,
    /// Downstream device failure (18)
    DownstreamFail,
    /// Point does not participate in this operation (126)
    NonParticipating,
    /// Any other value
    Unknown(u8),
}

impl CommandStatus {
    pub const fn from_u8(x: u8) -> Self {
        match x {
            0 => Self::Success,
            1 => Self::Timeout,
            2 => Self::NoSelect,
            3 => Self::FormatError,
            4 => Self::NotSupported,
            5 => Self::AlreadyActive,
            6 => Self::HardwareError,
            7 => Self::Local,
            8 => Self::TooManyOps,
            9 => Self::NotAuthorized,
            10 => Self::AutomationInhibit,
            11 => Self::ProcessingLimited,
            12 => Self::OutOfRange,
            13 => Self::DownstreamLocal,
            14 => Self::AlreadyComplete,
            15 => Self::Blocked,
            16 => Self::Canceled,
            17 => Self::BlockedOtherMaster,
            18 => Self::DownstreamFail,
            126 => Self::NonParticipating,
            _ => Self::Unknown(x),
        }
    }

    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Timeout => 1,
            Self::NoSelect => 2,
            Self::FormatError => 3,
            Self::NotSupported => 4,
            Self::AlreadyActive => 5,
            Self::HardwareError => 6,
            Self::Local => 7,
            Self::TooManyOps => 8,
            Self::NotAuthorized => 9,
            Self::AutomationInhibit => 10,
            Self::ProcessingLimited => 11,
            Self::OutOfRange => 12,
            Self::DownstreamLocal => 13,
            Self::AlreadyComplete => 14,
            Self::Blocked => 15,
            Self::Canceled => 16,
            Self::BlockedOtherMaster => 17,
            Self::DownstreamFail => 18,
            Self::NonParticipating => 126,
            Self::Unknown(x) => x,
        }
    }

    /// Outstation is busy with another operation on this point.
    pub const BUSY: Self = Self::AlreadyActive;

    #[inline]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// How an operate was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperateType {
    /// OPERATE following a matching SELECT
    SelectBeforeOperate,
    /// DIRECT_OPERATE
    DirectOperate,
    /// DIRECT_OPERATE_NR
    DirectOperateNoAck,
}

/// An output command of any supported type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// Control relay output block
    G12V1(Group12Var1),
    /// 32-bit analog output
    G41V1(i32),
    /// 16-bit analog output
    G41V2(i16),
    /// Single-precision analog output
    G41V3(f32),
    /// Double-precision analog output
    G41V4(f64),
}

impl Command {
    /// Variation that carries this command.
    pub const fn variation(&self) -> Variation {
        match self {
            Self::G12V1(_) => Variation::Group12Var1,
            Self::G41V1(_) => Variation::Group41Var1,
            Self::G41V2(_) => Variation::Group41Var2,
            Self::G41V3(_) => Variation::Group41Var3,
            Self::G41V4(_) => Variation::Group41Var4,
        }
    }

    /// Check if two commands request exactly the same action.
    ///
    /// Floating point values are compared bit for bit.
    pub fn matches(&self, other: &Command) -> bool {
        match (self, other) {
            (Self::G12V1(a), Self::G12V1(b)) => a == b,
            (Self::G41V1(a), Self::G41V1(b)) => a == b,
            (Self::G41V2(a), Self::G41V2(b)) => a == b,
            (Self::G41V3(a), Self::G41V3(b)) => a.to_bits() == b.to_bits(),
            (Self::G41V4(a), Self::G41V4(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }

    /// Parse one object of `variation`, returning the command and its status octet.
    ///
    /// `data` must hold exactly `variation.fixed_size()` bytes.
    pub fn parse(variation: Variation, data: &[u8]) -> Option<(Self, u8)> {
        let cmd = match variation {
            Variation::Group12Var1 => {
                let bytes: &[u8; Group12Var1::SIZE] = data.try_into().ok()?;
                let (crob, status) = Group12Var1::parse(bytes);
                return Some((Self::G12V1(crob), status));
            }
            Variation::Group41Var1 => {
                let b: [u8; 5] = data.try_into().ok()?;
                (Self::G41V1(i32::from_le_bytes([b[0], b[1], b[2], b[3]])), b[4])
            }
            Variation::Group41Var2 => {
                let b: [u8; 3] = data.try_into().ok()?;
                (Self::G41V2(i16::from_le_bytes([b[0], b[1]])), b[2])
            }
            Variation::Group41Var3 => {
                let b: [u8; 5] = data.try_into().ok()?;
                (Self::G41V3(f32::from_le_bytes([b[0], b[1], b[2], b[3]])), b[4])
            }
            Variation::Group41Var4 => {
                let b: [u8; 9] = data.try_into().ok()?;
                let mut value = [0u8; 8];
                value.copy_from_slice(&b[..8]);
                (Self::G41V4(f64::from_le_bytes(value)), b[8])
            }
            _ => return None,
        };
        Some(cmd)
    }

    /// Encode this command followed by `status`.
    pub fn encode(&self, status: CommandStatus, out: &mut Vec<u8>) {
        match self {
            Self::G12V1(crob) => out.extend_from_slice(&crob.encode(status)),
            Self::G41V1(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::G41V2(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::G41V3(v) => out.extend_from_slice(&v.to_le_bytes()),
            Self::G41V4(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
        if !matches!(self, Self::G12V1(_)) {
            out.push(status.as_u8());
        }
    }
}
