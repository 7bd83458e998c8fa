//! DNP3 application-layer type definitions.
//!
//! This module contains the core types shared by the parser, the database
//! and the outstation:
//!
//! - `FunctionCode` - Application function codes
//! - `Control`, `RequestHeader`, `ResponseHeader` - Fragment headers
//! - `Iin` - Internal indications
//! - `QualifierCode`, `Variation` - Object header identification
//! - `Measurement` - Point values of the eight point types
//! - `Command`, `CommandStatus` - Output controls

mod control;
mod function;
mod header;
mod iin;
mod measurement;
mod qualifier;
mod variation;

pub use control::*;
pub use function::*;
pub use header::*;
pub use iin::*;
pub use measurement::*;
pub use qualifier::*;
pub use variation::*;
