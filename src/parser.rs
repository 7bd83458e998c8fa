//! Request fragment parser.
//!
//! This module parses request fragments received from the master into a
//! request header and a list of object headers with typed bodies.

use crate::error::{Dnp3Error, Result};
use crate::types::{
    Command, FunctionCode, QualifierCode, RequestHeader, Timestamp, Variation,
    REQUEST_HEADER_LENGTH,
};

/// A parsed request fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Control field and function code
    pub header: RequestHeader,
    /// Object headers in request order
    pub objects: Vec<ObjectHeader>,
}

/// One object header of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectHeader {
    /// Object group and variation
    pub variation: Variation,
    /// Qualifier code used by the master
    pub qualifier: QualifierCode,
    /// Range and object data
    pub body: HeaderBody,
}

/// Range and object data of an object header.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderBody {
    /// Qualifier 0x06, no range
    AllObjects,
    /// Qualifiers 0x00 / 0x01 without object data
    Range { start: u16, stop: u16 },
    /// Qualifiers 0x07 / 0x08 without object data
    Count(u16),
    /// Index-prefixed command objects (g12v1, g41v1-4)
    Commands(Vec<PrefixedCommand>),
    /// Packed IIN bits (g80v1) over a range
    IinBits { start: u16, values: Vec<bool> },
    /// Absolute times (g50v1)
    Times(Vec<Timestamp>),
}

/// A command object with its index prefix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrefixedCommand {
    pub index: u16,
    pub command: Command,
    /// Status octet as sent by the master
    pub status: u8,
}

struct ReadCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ReadCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    fn read_u8(&mut self) -> Result<u8> {
        let value = *self
            .data
            .get(self.pos)
            .ok_or(Dnp3Error::insufficient_static("Object header truncated"))?;
        self.pos += 1;
        Ok(value)
    }

    fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(count)
            .filter(|end| *end <= self.data.len())
            .ok_or(Dnp3Error::insufficient_static("Object data truncated"))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }
}

/// Parse a complete request fragment.
///
/// # Example
///
/// ```rust,ignore
/// // READ class 1, 2, 3 and 0
/// let request = parse_request(&[0xC0, 0x01, 60, 2, 0x06, 60, 3, 0x06, 60, 4, 0x06, 60, 1, 0x06])?;
/// assert_eq!(request.objects.len(), 4);
/// ```
pub fn parse_request(data: &[u8]) -> Result<Request> {
    let header = RequestHeader::parse(data)?;
    let objects = parse_object_headers(header.function, &data[REQUEST_HEADER_LENGTH..])?;
    Ok(Request { header, objects })
}

/// Parse the object headers that follow the request header.
pub fn parse_object_headers(function: FunctionCode, data: &[u8]) -> Result<Vec<ObjectHeader>> {
    let mut cursor = ReadCursor::new(data);
    let mut headers = Vec::new();

    while !cursor.is_empty() {
        headers.push(parse_object_header(function, &mut cursor)?);
    }

    Ok(headers)
}

fn parse_object_header(function: FunctionCode, cursor: &mut ReadCursor<'_>) -> Result<ObjectHeader> {
    let group = cursor.read_u8()?;
    let var = cursor.read_u8()?;
    let variation = Variation::lookup(group, var).ok_or(Dnp3Error::ObjectUnknown {
        group,
        variation: var,
    })?;
    let qualifier = QualifierCode::parse(cursor.read_u8()?, group, var)?;

    let body = match function {
        FunctionCode::Write => parse_write_body(variation, qualifier, cursor)?,
        FunctionCode::Select
        | FunctionCode::Operate
        | FunctionCode::DirectOperate
        | FunctionCode::DirectOperateNoResponse => {
            parse_command_body(variation, qualifier, cursor)?
        }
        _ => parse_range_body(qualifier, cursor)?,
    };

    Ok(ObjectHeader {
        variation,
        qualifier,
        body,
    })
}

/// Range or count without object data (READ, freeze and unsolicited control requests).
fn parse_range_body(qualifier: QualifierCode, cursor: &mut ReadCursor<'_>) -> Result<HeaderBody> {
    match qualifier {
        QualifierCode::AllObjects => Ok(HeaderBody::AllObjects),
        QualifierCode::Range8 | QualifierCode::Range16 => {
            let (start, stop) = read_range(qualifier, cursor)?;
            Ok(HeaderBody::Range { start, stop })
        }
        QualifierCode::Count8 => Ok(HeaderBody::Count(cursor.read_u8()? as u16)),
        QualifierCode::Count16 => Ok(HeaderBody::Count(cursor.read_u16()?)),
        QualifierCode::CountAndPrefix8 | QualifierCode::CountAndPrefix16 => Err(
            Dnp3Error::bad_range_static("Index prefixes are not valid without object data"),
        ),
    }
}

fn read_range(qualifier: QualifierCode, cursor: &mut ReadCursor<'_>) -> Result<(u16, u16)> {
    let (start, stop) = match qualifier {
        QualifierCode::Range8 => (cursor.read_u8()? as u16, cursor.read_u8()? as u16),
        _ => (cursor.read_u16()?, cursor.read_u16()?),
    };
    if start > stop {
        return Err(Dnp3Error::bad_range_static("Start index greater than stop index"));
    }
    Ok((start, stop))
}

fn read_count(qualifier: QualifierCode, cursor: &mut ReadCursor<'_>) -> Result<u16> {
    match qualifier {
        QualifierCode::Count8 | QualifierCode::CountAndPrefix8 => Ok(cursor.read_u8()? as u16),
        _ => cursor.read_u16(),
    }
}

fn parse_write_body(
    variation: Variation,
    qualifier: QualifierCode,
    cursor: &mut ReadCursor<'_>,
) -> Result<HeaderBody> {
    let (group, var) = variation.to_group_and_var();
    let bad_qualifier = Dnp3Error::BadQualifier {
        group,
        variation: var,
        qualifier: qualifier.as_u8(),
    };

    match variation {
        Variation::Group80Var1 => {
            if !qualifier.is_range() {
                return Err(bad_qualifier);
            }
            let (start, stop) = read_range(qualifier, cursor)?;
            let count = (stop - start) as usize + 1;
            let bytes = cursor.read_bytes(count.div_ceil(8))?;
            let values = (0..count)
                .map(|i| bytes[i / 8] & (1 << (i % 8)) != 0)
                .collect();
            Ok(HeaderBody::IinBits { start, values })
        }
        Variation::Group50Var1 => {
            if !qualifier.is_count() {
                return Err(bad_qualifier);
            }
            let count = read_count(qualifier, cursor)?;
            let mut times = Vec::with_capacity(count as usize);
            for _ in 0..count {
                let bytes = cursor.read_bytes(6)?;
                let mut raw = [0u8; 6];
                raw.copy_from_slice(bytes);
                times.push(Timestamp::from_le_bytes(raw));
            }
            Ok(HeaderBody::Times(times))
        }
        _ => Err(Dnp3Error::ObjectUnknown {
            group,
            variation: var,
        }),
    }
}

fn parse_command_body(
    variation: Variation,
    qualifier: QualifierCode,
    cursor: &mut ReadCursor<'_>,
) -> Result<HeaderBody> {
    let (group, var) = variation.to_group_and_var();
    if !variation.is_command() {
        return Err(Dnp3Error::ObjectUnknown {
            group,
            variation: var,
        });
    }
    if !qualifier.is_prefixed() {
        return Err(Dnp3Error::BadQualifier {
            group,
            variation: var,
            qualifier: qualifier.as_u8(),
        });
    }

    // is_command() guarantees a fixed size
    let size = variation.fixed_size().unwrap_or(0);
    let count = read_count(qualifier, cursor)?;
    let mut commands = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let index = match qualifier {
            QualifierCode::CountAndPrefix8 => cursor.read_u8()? as u16,
            _ => cursor.read_u16()?,
        };
        let (command, status) = Command::parse(variation, cursor.read_bytes(size)?)
            .ok_or(Dnp3Error::insufficient_static("Command object truncated"))?;
        commands.push(PrefixedCommand {
            index,
            command,
            status,
        });
    }
    Ok(HeaderBody::Commands(commands))
}
