//! DNP3 outstation.
//!
//! - `config` - Outstation configuration
//! - `traits` - Application callbacks
//! - `handle` - Shared database handle and outstation handle
//! - `session` - Request/response state machine
//! - `task` - Async task running a session over a transport

mod config;
mod control;
mod handle;
mod response;
mod session;
mod supervisor;
mod task;
mod traits;

pub use config::*;
pub use handle::{DatabaseHandle, OutstationHandle};
pub use task::{create_outstation, OutstationTask};
pub use traits::*;
