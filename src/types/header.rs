//! DNP3 application control field and fragment headers.
//!
//! Every application fragment starts with a control octet followed by a
//! function code. Responses carry two additional IIN octets.

use crate::error::{Dnp3Error, Result};
use crate::types::{FunctionCode, Iin};

/// Size of a request header (control + function).
pub const REQUEST_HEADER_LENGTH: usize = 2;

/// Size of a response header (control + function + IIN).
pub const RESPONSE_HEADER_LENGTH: usize = 4;

/// Application sequence number (0-15).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sequence(u8);

impl Sequence {
    const MASK: u8 = 0x0F;

    /// Create a sequence number from the lower 4 bits of `value`.
    #[inline]
    pub const fn new(value: u8) -> Self {
        Self(value & Self::MASK)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// The sequence number that follows this one.
    #[inline]
    pub const fn next(self) -> Self {
        Self::new(self.0.wrapping_add(1))
    }

    /// The sequence number that precedes this one.
    #[inline]
    pub const fn previous(self) -> Self {
        Self::new(self.0.wrapping_sub(1))
    }
}

impl std::fmt::Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Application control field.
///
/// ```text
/// +-----+-----+-----+-----+-----+-----+-----+-----+
/// | FIR | FIN | CON | UNS |         SEQ           |
/// +-----+-----+-----+-----+-----+-----+-----+-----+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    /// First fragment of a message
    pub fir: bool,
    /// Final fragment of a message
    pub fin: bool,
    /// Confirmation requested
    pub con: bool,
    /// Unsolicited fragment
    pub uns: bool,
    /// Sequence number
    pub seq: Sequence,
}

impl Control {
    const FIR_MASK: u8 = 0b1000_0000;
    const FIN_MASK: u8 = 0b0100_0000;
    const CON_MASK: u8 = 0b0010_0000;
    const UNS_MASK: u8 = 0b0001_0000;

    /// Control field for a single-fragment request.
    #[inline]
    pub const fn request(seq: Sequence) -> Self {
        Self {
            fir: true,
            fin: true,
            con: false,
            uns: false,
            seq,
        }
    }

    /// Control field for a solicited response fragment.
    #[inline]
    pub const fn response(seq: Sequence, fir: bool, fin: bool, con: bool) -> Self {
        Self {
            fir,
            fin,
            con,
            uns: false,
            seq,
        }
    }

    /// Control field for an unsolicited response (always a single fragment, always confirmed).
    #[inline]
    pub const fn unsolicited(seq: Sequence) -> Self {
        Self {
            fir: true,
            fin: true,
            con: true,
            uns: true,
            seq,
        }
    }

    /// Control field for a confirm of a solicited or unsolicited response.
    #[inline]
    pub const fn confirm(seq: Sequence, uns: bool) -> Self {
        Self {
            fir: true,
            fin: true,
            con: false,
            uns,
            seq,
        }
    }

    /// Parse from byte.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        Self {
            fir: value & Self::FIR_MASK != 0,
            fin: value & Self::FIN_MASK != 0,
            con: value & Self::CON_MASK != 0,
            uns: value & Self::UNS_MASK != 0,
            seq: Sequence::new(value),
        }
    }

    /// Encode to byte.
    #[inline]
    pub const fn as_u8(&self) -> u8 {
        let mut x = self.seq.value();
        if self.fir {
            x |= Self::FIR_MASK;
        }
        if self.fin {
            x |= Self::FIN_MASK;
        }
        if self.con {
            x |= Self::CON_MASK;
        }
        if self.uns {
            x |= Self::UNS_MASK;
        }
        x
    }

    /// Check if this control field describes a complete, single-fragment message.
    #[inline]
    pub const fn is_fir_and_fin(&self) -> bool {
        self.fir && self.fin
    }
}

impl std::fmt::Display for Control {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[fir: {} fin: {} con: {} uns: {} seq: {}]",
            self.fir as u8, self.fin as u8, self.con as u8, self.uns as u8, self.seq
        )
    }
}

/// Header of a request fragment received from the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    /// Application control field
    pub control: Control,
    /// Function code
    pub function: FunctionCode,
}

impl RequestHeader {
    /// Create a new request header.
    #[inline]
    pub const fn new(control: Control, function: FunctionCode) -> Self {
        Self { control, function }
    }

    /// Parse from the start of a fragment.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < REQUEST_HEADER_LENGTH {
            return Err(Dnp3Error::insufficient_static("Request header too short"));
        }
        Ok(Self {
            control: Control::from_u8(data[0]),
            function: FunctionCode::from_u8(data[1])?,
        })
    }

    /// Encode to bytes.
    #[inline]
    pub const fn encode(&self) -> [u8; REQUEST_HEADER_LENGTH] {
        [self.control.as_u8(), self.function.as_u8()]
    }
}

impl std::fmt::Display for RequestHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.control, self.function)
    }
}

/// Header of a response fragment sent by the outstation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Application control field
    pub control: Control,
    /// `Response` or `UnsolicitedResponse`
    pub function: FunctionCode,
    /// Internal indications
    pub iin: Iin,
}

impl ResponseHeader {
    /// Create a new response header.
    #[inline]
    pub const fn new(control: Control, function: FunctionCode, iin: Iin) -> Self {
        Self {
            control,
            function,
            iin,
        }
    }

    /// Parse from the start of a fragment.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < RESPONSE_HEADER_LENGTH {
            return Err(Dnp3Error::insufficient_static("Response header too short"));
        }
        Ok(Self {
            control: Control::from_u8(data[0]),
            function: FunctionCode::from_u8(data[1])?,
            iin: Iin::from_bytes(data[2], data[3]),
        })
    }

    /// Encode to bytes.
    #[inline]
    pub const fn encode(&self) -> [u8; RESPONSE_HEADER_LENGTH] {
        [
            self.control.as_u8(),
            self.function.as_u8(),
            self.iin.iin1.as_u8(),
            self.iin.iin2.as_u8(),
        ]
    }
}

impl std::fmt::Display for ResponseHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.control, self.function, self.iin)
    }
}
