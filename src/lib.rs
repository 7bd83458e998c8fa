//! # voltage_dnp3
//!
//! DNP3 (IEEE 1815) outstation application-layer engine for Rust.
//!
//! This crate implements the outstation side of the DNP3 application layer:
//! a point database with event detection, a classified event buffer,
//! solicited and unsolicited responses with confirmation, select-before-operate
//! controls, counter freezes and the internal indications (IIN) a master
//! relies on.
//!
//! ## Features
//!
//! - **Transport agnostic**: Runs over any `AsyncRead + AsyncWrite`
//! - **Event classes**: Class 1/2/3 events with deadbands and overflow policy
//! - **Unsolicited responses**: Confirm timeouts and retries
//! - **Type Safe**: Strong typing for function codes, variations, IIN
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use voltage_dnp3::{
//!     create_outstation, BinaryInput, Database, DefaultHandler, EventBufferConfig,
//!     EventClass, Flags, OutstationConfig, UpdateOptions,
//! };
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> voltage_dnp3::Result<()> {
//!     let mut database = Database::new(EventBufferConfig::default())?;
//!     database.add_binary_input(0, Some(EventClass::Class1), Default::default())?;
//!
//!     let config = OutstationConfig::new(10, 1).allow_unsolicited(true);
//!     let (handle, mut task) = create_outstation(
//!         config,
//!         database,
//!         DefaultHandler,
//!         DefaultHandler,
//!         DefaultHandler,
//!         DefaultHandler,
//!     )?;
//!
//!     // Update points from anywhere
//!     handle.transaction(|db| {
//!         db.update(BinaryInput::without_time(0, true, Flags::ONLINE), UpdateOptions::default())
//!     })?;
//!
//!     // The link adapter exchanges envelope-framed fragments
//!     let listener = TcpListener::bind("0.0.0.0:20000").await?;
//!     loop {
//!         let (stream, _) = listener.accept().await?;
//!         task.run(stream).await.ok();
//!     }
//! }
//! ```
//!
//! ## Protocol Overview
//!
//! Each request fragment carries a 2 byte application header followed by
//! object headers; each response carries a 4 byte header with the IIN.
//!
//! ```text
//! Request:   +---------+----------+------------------------+
//!            | Control | Function | Object headers ...     |
//!            +---------+----------+------------------------+
//! Response:  +---------+----------+------+------+----------+
//!            | Control | Function | IIN1 | IIN2 | Objects  |
//!            +---------+----------+------+------+----------+
//! Control:   FIR | FIN | CON | UNS | SEQ (4 bits)
//! ```
//!
//! Fragments are exchanged with the link adapter in a little-endian envelope:
//!
//! ```text
//! +------------+-------------+--------+------------------+
//! | Length u16 | Destination | Source | Fragment ...     |
//! +------------+-------------+--------+------------------+
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod codec;
pub mod database;
pub mod error;
pub mod event;
pub mod outstation;
pub mod parser;
pub mod types;

// Re-export main types
pub use codec::{Addresses, Fragment, FragmentCodec};
pub use database::*;
pub use error::{Dnp3Error, Result};
pub use event::{EventBuffer, EventBufferConfig, EventSelection, OverflowPolicy};
pub use outstation::*;
pub use parser::{parse_object_headers, parse_request};
pub use types::*;
