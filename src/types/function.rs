//! DNP3 application function codes.

use crate::error::{Dnp3Error, Result};

/// DNP3 application-layer function code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FunctionCode {
    // ============================================
    // Requests
    // ============================================
    /// Master confirms a response (0x00)
    Confirm = 0x00,

    /// Request objects from the outstation (0x01)
    Read = 0x01,

    /// Store objects in the outstation (0x02)
    Write = 0x02,

    /// Select output points (0x03)
    Select = 0x03,

    /// Operate previously selected output points (0x04)
    Operate = 0x04,

    /// Operate output points without selection (0x05)
    DirectOperate = 0x05,

    /// Direct operate without a response (0x06)
    DirectOperateNoResponse = 0x06,

    /// Copy counters into frozen counters (0x07)
    ImmediateFreeze = 0x07,

    /// Immediate freeze without a response (0x08)
    ImmediateFreezeNoResponse = 0x08,

    /// Freeze and clear counters (0x09)
    FreezeClear = 0x09,

    /// Freeze and clear without a response (0x0A)
    FreezeClearNoResponse = 0x0A,

    /// Freeze at a specified time (0x0B)
    FreezeAtTime = 0x0B,

    /// Freeze at time without a response (0x0C)
    FreezeAtTimeNoResponse = 0x0C,

    /// Perform a cold restart (0x0D)
    ColdRestart = 0x0D,

    /// Perform a warm restart (0x0E)
    WarmRestart = 0x0E,

    /// Initialize data to defaults (0x0F)
    InitializeData = 0x0F,

    /// Initialize an application (0x10)
    InitializeApplication = 0x10,

    /// Start an application (0x11)
    StartApplication = 0x11,

    /// Stop an application (0x12)
    StopApplication = 0x12,

    /// Save configuration (0x13)
    SaveConfiguration = 0x13,

    /// Enable unsolicited responses for event classes (0x14)
    EnableUnsolicited = 0x14,

    /// Disable unsolicited responses for event classes (0x15)
    DisableUnsolicited = 0x15,

    /// Assign points to event classes (0x16)
    AssignClass = 0x16,

    /// Measure the outstation processing delay (0x17)
    DelayMeasure = 0x17,

    /// Record the current time for a later time write (0x18)
    RecordCurrentTime = 0x18,

    // ============================================
    // Responses
    // ============================================
    /// Solicited response (0x81)
    Response = 0x81,

    /// Unsolicited response (0x82)
    UnsolicitedResponse = 0x82,
}

impl FunctionCode {
    /// Create from raw byte value.
    #[inline]
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(Self::Confirm),
            0x01 => Ok(Self::Read),
            0x02 => Ok(Self::Write),
            0x03 => Ok(Self::Select),
            0x04 => Ok(Self::Operate),
            0x05 => Ok(Self::DirectOperate),
            0x06 => Ok(Self::DirectOperateNoResponse),
            0x07 => Ok(Self::ImmediateFreeze),
            0x08 => Ok(Self::ImmediateFreezeNoResponse),
            0x09 => Ok(Self::FreezeClear),
            0x0A => Ok(Self::FreezeClearNoResponse),
            0x0B => Ok(Self::FreezeAtTime),
            0x0C => Ok(Self::FreezeAtTimeNoResponse),
            0x0D => Ok(Self::ColdRestart),
            0x0E => Ok(Self::WarmRestart),
            0x0F => Ok(Self::InitializeData),
            0x10 => Ok(Self::InitializeApplication),
            0x11 => Ok(Self::StartApplication),
            0x12 => Ok(Self::StopApplication),
            0x13 => Ok(Self::SaveConfiguration),
            0x14 => Ok(Self::EnableUnsolicited),
            0x15 => Ok(Self::DisableUnsolicited),
            0x16 => Ok(Self::AssignClass),
            0x17 => Ok(Self::DelayMeasure),
            0x18 => Ok(Self::RecordCurrentTime),
            0x81 => Ok(Self::Response),
            0x82 => Ok(Self::UnsolicitedResponse),
            _ => Err(Dnp3Error::UnknownFunction(value)),
        }
    }

    /// Convert to raw byte value.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Check if this function code is sent by the outstation.
    #[inline]
    pub const fn is_response(&self) -> bool {
        matches!(self, Self::Response | Self::UnsolicitedResponse)
    }

    /// Check if the master expects no response to this function.
    #[inline]
    pub const fn is_no_response(&self) -> bool {
        matches!(
            self,
            Self::Confirm
                | Self::DirectOperateNoResponse
                | Self::ImmediateFreezeNoResponse
                | Self::FreezeClearNoResponse
                | Self::FreezeAtTimeNoResponse
        )
    }

    /// Check if this function may be carried by a broadcast request.
    #[inline]
    pub const fn is_broadcast_allowed(&self) -> bool {
        matches!(
            self,
            Self::Write
                | Self::DirectOperateNoResponse
                | Self::ImmediateFreezeNoResponse
                | Self::FreezeClearNoResponse
                | Self::EnableUnsolicited
                | Self::DisableUnsolicited
                | Self::ColdRestart
                | Self::WarmRestart
        )
    }

    /// Get the protocol name of this function.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Confirm => "CONFIRM",
            Self::Read => "READ",
            Self::Write => "WRITE",
            Self::Select => "SELECT",
            Self::Operate => "OPERATE",
            Self::DirectOperate => "DIRECT_OPERATE",
            Self::DirectOperateNoResponse => "DIRECT_OPERATE_NR",
            Self::ImmediateFreeze => "IMMEDIATE_FREEZE",
            Self::ImmediateFreezeNoResponse => "IMMEDIATE_FREEZE_NR",
            Self::FreezeClear => "FREEZE_CLEAR",
            Self::FreezeClearNoResponse => "FREEZE_CLEAR_NR",
            Self::FreezeAtTime => "FREEZE_AT_TIME",
            Self::FreezeAtTimeNoResponse => "FREEZE_AT_TIME_NR",
            Self::ColdRestart => "COLD_RESTART",
            Self::WarmRestart => "WARM_RESTART",
            Self::InitializeData => "INITIALIZE_DATA",
            Self::InitializeApplication => "INITIALIZE_APPLICATION",
            Self::StartApplication => "START_APPLICATION",
            Self::StopApplication => "STOP_APPLICATION",
            Self::SaveConfiguration => "SAVE_CONFIGURATION",
            Self::EnableUnsolicited => "ENABLE_UNSOLICITED",
            Self::DisableUnsolicited => "DISABLE_UNSOLICITED",
            Self::AssignClass => "ASSIGN_CLASS",
            Self::DelayMeasure => "DELAY_MEASURE",
            Self::RecordCurrentTime => "RECORD_CURRENT_TIME",
            Self::Response => "RESPONSE",
            Self::UnsolicitedResponse => "UNSOLICITED_RESPONSE",
        }
    }
}

impl std::fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for FunctionCode {
    type Error = Dnp3Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value)
    }
}
