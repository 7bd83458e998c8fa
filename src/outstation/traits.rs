//! Callbacks from the outstation into the user application.
//!
//! Every method has a default so an application implements only what it
//! supports. Callbacks run on the session task; the ones receiving a
//! `&mut Database` run inside the database lock.

use crate::database::{Database, FreezeResult, FreezeType};
use crate::types::{
    CommandStatus, FunctionCode, Group12Var1, OperateType, RequestHeader, Sequence, Timestamp,
};

/// IIN bits controlled by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplicationIin {
    /// IIN1.4, the outstation requires time synchronization
    pub need_time: bool,
    /// IIN1.5, some output points are in local mode
    pub local_control: bool,
    /// IIN1.6, abnormal condition
    pub device_trouble: bool,
    /// IIN2.5, corrupt configuration
    pub config_corrupt: bool,
}

/// Time until the outstation is available again after a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartDelay {
    /// Reported in g52v1
    Seconds(u16),
    /// Reported in g52v2
    Milliseconds(u16),
}

/// Outcome of a time write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteTimeResult {
    Ok,
    /// Time value rejected, reported as IIN2.2
    ParameterError,
    /// Time writes not supported, reported as IIN2.0
    NotSupported,
}

/// What the outstation did with a broadcast request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastAction {
    /// Request processed
    Processed,
    /// Broadcast disabled in the configuration
    IgnoredByConfiguration,
    /// Object headers could not be parsed
    BadObjectHeaders,
    /// Function not allowed in broadcast requests
    UnsupportedFunction(FunctionCode),
}

/// Transport session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Application behavior of the outstation.
pub trait OutstationApplication: Send + 'static {
    /// Delay reported in DELAY_MEASURE responses.
    fn processing_delay_ms(&self) -> u16 {
        0
    }

    /// Master wrote the absolute time (g50v1).
    fn write_absolute_time(&mut self, _time: Timestamp) -> WriteTimeResult {
        WriteTimeResult::NotSupported
    }

    /// IIN bits included in every response.
    fn application_iin(&self) -> ApplicationIin {
        ApplicationIin::default()
    }

    /// COLD_RESTART requested, `None` if not supported.
    fn cold_restart(&mut self) -> Option<RestartDelay> {
        None
    }

    /// WARM_RESTART requested, `None` if not supported.
    fn warm_restart(&mut self) -> Option<RestartDelay> {
        None
    }

    /// Freeze all counters, normally through `Database::freeze_all`.
    fn freeze_counters_all(
        &mut self,
        _freeze_type: FreezeType,
        _database: &mut Database,
    ) -> FreezeResult {
        FreezeResult::NotSupported
    }

    /// Freeze counters in `start..=stop`, normally through `Database::freeze_range`.
    fn freeze_counters_range(
        &mut self,
        _start: u16,
        _stop: u16,
        _freeze_type: FreezeType,
        _database: &mut Database,
    ) -> FreezeResult {
        FreezeResult::NotSupported
    }
}

/// Informational notifications of the session state machine.
#[allow(unused_variables)]
pub trait OutstationInformation: Send + 'static {
    /// A request was received while idle.
    fn process_request_from_idle(&mut self, header: RequestHeader) {}

    /// A broadcast request was received.
    fn broadcast_received(&mut self, function: FunctionCode, action: BroadcastAction) {}

    /// A solicited response requiring confirmation was sent.
    fn enter_solicited_confirm_wait(&mut self, ecsn: Sequence) {}

    /// No solicited confirm was received in time.
    fn solicited_confirm_timeout(&mut self, ecsn: Sequence) {}

    /// Solicited confirm with the expected sequence received.
    fn solicited_confirm_received(&mut self, ecsn: Sequence) {}

    /// A new request arrived while waiting for a solicited confirm.
    fn solicited_confirm_wait_new_request(&mut self) {}

    /// Solicited confirm with an unexpected sequence received.
    fn wrong_solicited_confirm_seq(&mut self, ecsn: Sequence, seq: Sequence) {}

    /// Confirm received while not waiting for one.
    fn unexpected_confirm(&mut self, unsolicited: bool, seq: Sequence) {}

    /// An unsolicited response was sent.
    fn enter_unsolicited_confirm_wait(&mut self, ecsn: Sequence) {}

    /// No unsolicited confirm was received in time; `retry` tells whether
    /// the response will be sent again.
    fn unsolicited_confirm_timeout(&mut self, ecsn: Sequence, retry: bool) {}

    /// Unsolicited confirm with the expected sequence received.
    fn unsolicited_confirmed(&mut self, ecsn: Sequence) {}

    /// Master cleared the restart IIN bit.
    fn clear_restart_iin(&mut self) {}
}

/// Handler of output commands.
///
/// Select callbacks must not change outputs; operate callbacks perform them.
pub trait ControlHandler: Send + 'static {
    /// Start of a request containing commands.
    fn begin_fragment(&mut self) {}

    /// End of a request containing commands.
    fn end_fragment(&mut self, _database: &mut Database) {}

    fn select_g12v1(
        &mut self,
        _control: Group12Var1,
        _index: u16,
        _database: &mut Database,
    ) -> CommandStatus {
        CommandStatus::NotSupported
    }

    fn operate_g12v1(
        &mut self,
        _control: Group12Var1,
        _index: u16,
        _op_type: OperateType,
        _database: &mut Database,
    ) -> CommandStatus {
        CommandStatus::NotSupported
    }

    fn select_g41v1(&mut self, _value: i32, _index: u16, _database: &mut Database) -> CommandStatus {
        CommandStatus::NotSupported
    }

    fn operate_g41v1(
        &mut self,
        _value: i32,
        _index: u16,
        _op_type: OperateType,
        _database: &mut Database,
    ) -> CommandStatus {
        CommandStatus::NotSupported
    }

    fn select_g41v2(&mut self, _value: i16, _index: u16, _database: &mut Database) -> CommandStatus {
        CommandStatus::NotSupported
    }

    fn operate_g41v2(
        &mut self,
        _value: i16,
        _index: u16,
        _op_type: OperateType,
        _database: &mut Database,
    ) -> CommandStatus {
        CommandStatus::NotSupported
    }

    fn select_g41v3(&mut self, _value: f32, _index: u16, _database: &mut Database) -> CommandStatus {
        CommandStatus::NotSupported
    }

    fn operate_g41v3(
        &mut self,
        _value: f32,
        _index: u16,
        _op_type: OperateType,
        _database: &mut Database,
    ) -> CommandStatus {
        CommandStatus::NotSupported
    }

    fn select_g41v4(&mut self, _value: f64, _index: u16, _database: &mut Database) -> CommandStatus {
        CommandStatus::NotSupported
    }

    fn operate_g41v4(
        &mut self,
        _value: f64,
        _index: u16,
        _op_type: OperateType,
        _database: &mut Database,
    ) -> CommandStatus {
        CommandStatus::NotSupported
    }
}

/// Listener for transport session state changes.
pub trait ConnectionStateListener: Send + 'static {
    fn on_change(&mut self, _state: ConnectionState) {}
}

/// Implementation of every callback trait with default behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHandler;

impl OutstationApplication for DefaultHandler {}
impl OutstationInformation for DefaultHandler {}
impl ControlHandler for DefaultHandler {}
impl ConnectionStateListener for DefaultHandler {}
