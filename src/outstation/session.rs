//! Request/response state machine.
//!
//! The session processes one fragment, timer expiry or database change at a
//! time and returns the fragments to send. It never blocks and owns no I/O;
//! the task drives it and holds the database lock for the duration of a call.

use std::collections::VecDeque;

use bytes::Bytes;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::config::OutstationConfig;
use super::control::ControlDispatcher;
use super::response::{
    build_read_response, build_unsolicited_response, write_command_echo, write_time_delay,
    ReadTarget, ResponseFragment,
};
use super::supervisor::{RestartOutcome, Supervisor};
use super::traits::{
    BroadcastAction, ConnectionState, ConnectionStateListener, ControlHandler,
    OutstationApplication, OutstationInformation, WriteTimeResult,
};
use crate::codec::{Addresses, Fragment};
use crate::database::{Database, FreezeResult, FreezeType};
use crate::error::Dnp3Error;
use crate::event::EventSelection;
use crate::parser::{parse_object_headers, HeaderBody, ObjectHeader};
use crate::types::{
    Control, EventClass, EventClasses, FunctionCode, Iin, Iin1, Iin2, OperateType,
    RequestHeader, ResponseHeader, Sequence, Variation, REQUEST_HEADER_LENGTH,
    RESPONSE_HEADER_LENGTH,
};

/// User callbacks of one outstation.
pub(crate) struct Handlers {
    pub application: Box<dyn OutstationApplication>,
    pub information: Box<dyn OutstationInformation>,
    pub control: Box<dyn ControlHandler>,
    pub listener: Box<dyn ConnectionStateListener>,
}

/// Session state.
#[derive(Debug)]
enum SessionState {
    Idle,
    SolicitedConfirmWait {
        ecsn: Sequence,
        deadline: Instant,
        /// Events carried by the fragment awaiting confirmation
        selection: EventSelection,
        /// Fragments of the same response not yet sent
        remaining: VecDeque<ResponseFragment>,
    },
    UnsolicitedConfirmWait {
        ecsn: Sequence,
        deadline: Instant,
        retries: usize,
        /// Sent fragment, retransmitted unchanged
        fragment: Fragment,
        selection: EventSelection,
        is_null: bool,
    },
}

#[derive(Debug, Default)]
struct UnsolicitedState {
    /// Classes enabled by ENABLE_UNSOLICITED
    enabled: EventClasses,
    seq: Sequence,
    /// Null unsolicited response not yet confirmed
    null_pending: bool,
    /// After giving up, wait until an event with at least this id exists
    blocked_until: Option<u64>,
}

/// Last non-read request and its response, for answering repeats.
#[derive(Debug)]
struct LastRequest {
    seq: Sequence,
    data: Bytes,
    response: Option<Fragment>,
}

/// Objects and request-error IIN bits of a solicited response.
#[derive(Debug)]
struct Reply {
    fragments: Vec<ResponseFragment>,
    iin2: Iin2,
}

impl Reply {
    fn objects(objects: Vec<u8>) -> Self {
        Self {
            fragments: vec![ResponseFragment::with_objects(objects)],
            iin2: Iin2::default(),
        }
    }

    fn with_iin(iin2: Iin2) -> Self {
        Self {
            fragments: vec![ResponseFragment::default()],
            iin2,
        }
    }
}

fn error_iin(err: &Dnp3Error) -> Iin2 {
    match err {
        Dnp3Error::ObjectUnknown { .. } => Iin2::OBJECT_UNKNOWN,
        Dnp3Error::UnknownFunction(_) => Iin2::NO_FUNC_CODE_SUPPORT,
        _ => Iin2::PARAMETER_ERROR,
    }
}

pub(crate) struct Session {
    config: OutstationConfig,
    state: SessionState,
    controls: ControlDispatcher,
    supervisor: Supervisor,
    handlers: Handlers,
    unsolicited: UnsolicitedState,
    last_request: Option<LastRequest>,
    deferred_read: Option<Fragment>,
}

impl Session {
    pub fn new(config: OutstationConfig, handlers: Handlers) -> Self {
        let controls =
            ControlDispatcher::new(config.select_timeout, config.max_controls_per_request);
        let mut session = Self {
            config,
            state: SessionState::Idle,
            controls,
            supervisor: Supervisor::new(),
            handlers,
            unsolicited: UnsolicitedState::default(),
            last_request: None,
            deferred_read: None,
        };
        session.reset();
        session
    }

    /// Prepare for a new transport session. Restart IIN and the database persist.
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.controls.clear();
        self.last_request = None;
        self.deferred_read = None;
        self.unsolicited.enabled = EventClasses::none();
        self.unsolicited.null_pending = self.config.allow_unsolicited;
        self.unsolicited.blocked_until = None;
    }

    pub fn config(&self) -> &OutstationConfig {
        &self.config
    }

    /// Report a transport session state change to the listener.
    pub fn connection_changed(&mut self, state: ConnectionState) {
        self.supervisor
            .connection_changed(self.handlers.listener.as_mut(), state);
    }

    /// Time at which `on_timeout` must be called.
    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            SessionState::Idle => None,
            SessionState::SolicitedConfirmWait { deadline, .. }
            | SessionState::UnsolicitedConfirmWait { deadline, .. } => Some(*deadline),
        }
    }

    fn reply_addresses(&self) -> Addresses {
        Addresses::new(self.config.master_address, self.config.outstation_address)
    }

    /// Process a received fragment.
    pub fn on_fragment(&mut self, fragment: Fragment, now: Instant, db: &mut Database) -> Vec<Fragment> {
        let mut out = Vec::new();

        if fragment.addresses.is_broadcast() {
            self.handle_broadcast(&fragment, now, db);
            return out;
        }
        if fragment.addresses.destination != self.config.outstation_address {
            debug!(
                "Ignoring fragment for address {}",
                fragment.addresses.destination
            );
            return out;
        }
        if fragment.addresses.source != self.config.master_address {
            warn!(
                "Ignoring fragment from unknown master {}",
                fragment.addresses.source
            );
            return out;
        }

        self.handle_request(fragment, now, db, &mut out);
        out
    }

    fn handle_request(
        &mut self,
        fragment: Fragment,
        now: Instant,
        db: &mut Database,
        out: &mut Vec<Fragment>,
    ) {
        let data = &fragment.data;
        if data.len() < REQUEST_HEADER_LENGTH {
            warn!("Ignoring fragment of {} bytes", data.len());
            return;
        }

        let control = Control::from_u8(data[0]);
        if !control.is_fir_and_fin() {
            warn!("Ignoring multi-fragment request {}", control);
            return;
        }

        let function = match FunctionCode::from_u8(data[1]) {
            Ok(function) => function,
            Err(err) => {
                warn!("{}", err);
                let reply = Reply::with_iin(Iin2::NO_FUNC_CODE_SUPPORT);
                self.send_solicited(control.seq, reply, now, db, out);
                return;
            }
        };

        if function == FunctionCode::Confirm {
            self.handle_confirm(control, now, db, out);
            return;
        }
        if control.uns {
            warn!("Ignoring {} request with UNS bit", function);
            return;
        }

        if function == FunctionCode::Read
            && matches!(self.state, SessionState::UnsolicitedConfirmWait { .. })
        {
            debug!("Deferring READ until unsolicited confirm");
            self.deferred_read = Some(fragment);
            return;
        }

        let header = RequestHeader::new(control, function);
        match self.state {
            SessionState::SolicitedConfirmWait { .. } => {
                debug!("New request while waiting for solicited confirm");
                self.handlers.information.solicited_confirm_wait_new_request();
                self.state = SessionState::Idle;
            }
            SessionState::Idle => self.handlers.information.process_request_from_idle(header),
            SessionState::UnsolicitedConfirmWait { .. } => {}
        }

        if function != FunctionCode::Read {
            if let Some(last) = &self.last_request {
                if last.seq == control.seq && last.data == fragment.data {
                    debug!("Repeated {} request, seq {}", function, control.seq);
                    if let Some(response) = &last.response {
                        out.push(response.clone());
                    }
                    return;
                }
            }
        }

        debug!("Received {}", header);
        let reply = self.process(header, &data[REQUEST_HEADER_LENGTH..], now, db);
        let response = reply.map(|reply| self.send_solicited(control.seq, reply, now, db, out));

        self.last_request = (function != FunctionCode::Read).then(|| LastRequest {
            seq: control.seq,
            data: fragment.data.clone(),
            response,
        });
    }

    fn handle_confirm(
        &mut self,
        control: Control,
        now: Instant,
        db: &mut Database,
        out: &mut Vec<Fragment>,
    ) {
        let seq = control.seq;

        if control.uns {
            let matched = matches!(
                self.state,
                SessionState::UnsolicitedConfirmWait { ecsn, .. } if ecsn == seq
            );
            if !matched {
                debug!("Unexpected unsolicited confirm, seq {}", seq);
                self.handlers.information.unexpected_confirm(true, seq);
                return;
            }

            if let SessionState::UnsolicitedConfirmWait {
                ecsn,
                selection,
                is_null,
                ..
            } = std::mem::replace(&mut self.state, SessionState::Idle)
            {
                let removed = db.events_mut().confirm(&selection);
                debug!("Unsolicited confirm {}, {} events removed", ecsn, removed);
                if is_null {
                    self.unsolicited.null_pending = false;
                }
                self.handlers.information.unsolicited_confirmed(ecsn);
            }
            self.process_deferred(now, db, out);
            return;
        }

        match self.state {
            SessionState::SolicitedConfirmWait { ecsn, .. } if ecsn == seq => {
                if let SessionState::SolicitedConfirmWait {
                    ecsn,
                    selection,
                    mut remaining,
                    ..
                } = std::mem::replace(&mut self.state, SessionState::Idle)
                {
                    let removed = db.events_mut().confirm(&selection);
                    debug!("Solicited confirm {}, {} events removed", ecsn, removed);
                    self.handlers.information.solicited_confirm_received(ecsn);
                    if let Some(next) = remaining.pop_front() {
                        self.send_fragment(ecsn.next(), next, false, remaining, Iin2::default(), now, db, out);
                    }
                }
            }
            SessionState::SolicitedConfirmWait { ecsn, .. } => {
                warn!("Solicited confirm seq {} while expecting {}", seq, ecsn);
                self.handlers.information.wrong_solicited_confirm_seq(ecsn, seq);
            }
            _ => {
                debug!("Unexpected solicited confirm, seq {}", seq);
                self.handlers.information.unexpected_confirm(false, seq);
            }
        }
    }

    /// Handle expiry of the confirm timer.
    pub fn on_timeout(&mut self, now: Instant, db: &mut Database) -> Vec<Fragment> {
        let mut out = Vec::new();
        match self.deadline() {
            Some(deadline) if now >= deadline => {}
            _ => return out,
        }

        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::SolicitedConfirmWait { ecsn, .. } => {
                warn!("Solicited confirm timeout, seq {}", ecsn);
                self.handlers.information.solicited_confirm_timeout(ecsn);
            }
            SessionState::UnsolicitedConfirmWait {
                ecsn,
                retries,
                fragment,
                selection,
                is_null,
                ..
            } => {
                if retries < self.config.max_unsolicited_retries {
                    warn!(
                        "Unsolicited confirm timeout, seq {}, retry {}",
                        ecsn,
                        retries + 1
                    );
                    self.handlers
                        .information
                        .unsolicited_confirm_timeout(ecsn, true);
                    out.push(fragment.clone());
                    self.state = SessionState::UnsolicitedConfirmWait {
                        ecsn,
                        deadline: now + self.config.unsolicited_confirm_timeout,
                        retries: retries + 1,
                        fragment,
                        selection,
                        is_null,
                    };
                } else {
                    warn!("Unsolicited confirm timeout, seq {}, giving up", ecsn);
                    self.handlers
                        .information
                        .unsolicited_confirm_timeout(ecsn, false);
                    self.unsolicited.blocked_until = Some(db.events().next_id());
                    self.process_deferred(now, db, &mut out);
                }
            }
            SessionState::Idle => {}
        }
        out
    }

    /// Send an unsolicited response if one is due.
    pub fn poll_unsolicited(&mut self, now: Instant, db: &mut Database) -> Vec<Fragment> {
        let mut out = Vec::new();
        if !self.config.allow_unsolicited || !matches!(self.state, SessionState::Idle) {
            return out;
        }

        if let Some(blocked) = self.unsolicited.blocked_until {
            if db.events().next_id() <= blocked {
                return out;
            }
            self.unsolicited.blocked_until = None;
        }

        if self.unsolicited.null_pending {
            self.send_unsolicited(ResponseFragment::default(), true, now, db, &mut out);
        } else if !self.unsolicited.enabled.is_empty() {
            let fragment = build_unsolicited_response(
                db.events(),
                self.unsolicited.enabled,
                self.config.max_tx_fragment_size,
            );
            if fragment.has_events() {
                self.send_unsolicited(fragment, false, now, db, &mut out);
            }
        }
        out
    }

    fn process_deferred(&mut self, now: Instant, db: &mut Database, out: &mut Vec<Fragment>) {
        if let Some(fragment) = self.deferred_read.take() {
            debug!("Processing deferred READ");
            self.handle_request(fragment, now, db, out);
        }
    }

    fn handle_broadcast(&mut self, fragment: &Fragment, now: Instant, db: &mut Database) {
        let data = &fragment.data;
        if data.len() < REQUEST_HEADER_LENGTH {
            return;
        }
        let control = Control::from_u8(data[0]);
        let function = match FunctionCode::from_u8(data[1]) {
            Ok(function) => function,
            Err(err) => {
                warn!("Broadcast: {}", err);
                return;
            }
        };
        if !control.is_fir_and_fin() || function == FunctionCode::Confirm {
            return;
        }

        let objects = &data[REQUEST_HEADER_LENGTH..];
        let action = if !self.config.broadcast {
            BroadcastAction::IgnoredByConfiguration
        } else if !function.is_broadcast_allowed() {
            BroadcastAction::UnsupportedFunction(function)
        } else if parse_object_headers(function, objects).is_err() {
            BroadcastAction::BadObjectHeaders
        } else {
            let _ = self.process(RequestHeader::new(control, function), objects, now, db);
            self.supervisor.latch_broadcast();
            BroadcastAction::Processed
        };

        info!("Broadcast {}: {:?}", function, action);
        self.handlers
            .information
            .broadcast_received(function, action);
    }

    /// Execute a request. Returns `None` for functions that are not answered.
    fn process(
        &mut self,
        header: RequestHeader,
        objects: &[u8],
        now: Instant,
        db: &mut Database,
    ) -> Option<Reply> {
        let function = header.function;
        let seq = header.control.seq;

        let headers = match parse_object_headers(function, objects) {
            Ok(headers) => headers,
            Err(err) => {
                warn!("Bad {} request: {}", function, err);
                return (!function.is_no_response()).then(|| Reply::with_iin(error_iin(&err)));
            }
        };

        let controls = &mut self.controls;
        let handler = self.handlers.control.as_mut();
        let reply = match function {
            FunctionCode::Select => controls.select(&headers, seq, now, handler, db),
            FunctionCode::Operate => controls.operate(
                &headers,
                OperateType::SelectBeforeOperate,
                seq,
                now,
                handler,
                db,
            ),
            FunctionCode::DirectOperate => {
                controls.operate(&headers, OperateType::DirectOperate, seq, now, handler, db)
            }
            FunctionCode::DirectOperateNoResponse => {
                controls.operate(
                    &headers,
                    OperateType::DirectOperateNoAck,
                    seq,
                    now,
                    handler,
                    db,
                );
                return None;
            }
            _ => return self.process_non_control(function, &headers, db),
        };
        Some(Reply::objects(write_command_echo(&reply)))
    }

    fn process_non_control(
        &mut self,
        function: FunctionCode,
        headers: &[ObjectHeader],
        db: &mut Database,
    ) -> Option<Reply> {
        match function {
            FunctionCode::Read => Some(self.read(headers, db)),
            FunctionCode::Write => Some(self.write(headers)),
            FunctionCode::ImmediateFreeze => {
                Some(self.freeze(headers, FreezeType::ImmediateFreeze, db))
            }
            FunctionCode::ImmediateFreezeNoResponse => {
                self.freeze(headers, FreezeType::ImmediateFreeze, db);
                None
            }
            FunctionCode::FreezeClear => Some(self.freeze(headers, FreezeType::FreezeAndClear, db)),
            FunctionCode::FreezeClearNoResponse => {
                self.freeze(headers, FreezeType::FreezeAndClear, db);
                None
            }
            FunctionCode::ColdRestart | FunctionCode::WarmRestart => {
                Some(match self.supervisor.restart(function, self.handlers.application.as_mut()) {
                    RestartOutcome::Accepted { variation, delay } => {
                        Reply::objects(write_time_delay(variation, delay))
                    }
                    RestartOutcome::NotSupported => Reply::with_iin(Iin2::NO_FUNC_CODE_SUPPORT),
                })
            }
            FunctionCode::EnableUnsolicited => Some(self.unsolicited_control(headers, true)),
            FunctionCode::DisableUnsolicited => Some(self.unsolicited_control(headers, false)),
            FunctionCode::DelayMeasure => {
                let delay = self.handlers.application.processing_delay_ms();
                Some(Reply::objects(write_time_delay(Variation::Group52Var2, delay)))
            }
            _ => {
                warn!("Unsupported function {}", function);
                (!function.is_no_response()).then(|| Reply::with_iin(Iin2::NO_FUNC_CODE_SUPPORT))
            }
        }
    }

    fn read(&mut self, headers: &[ObjectHeader], db: &Database) -> Reply {
        let mut targets = Vec::new();
        let mut iin2 = Iin2::default();

        for header in headers {
            let (range, limit) = match header.body {
                HeaderBody::AllObjects => (None, None),
                HeaderBody::Range { start, stop } => (Some((start, stop)), None),
                HeaderBody::Count(count) => (None, Some(count as usize)),
                _ => {
                    iin2 |= Iin2::PARAMETER_ERROR;
                    continue;
                }
            };

            let class = match header.variation {
                Variation::Group60Var1 => {
                    targets.extend(ReadTarget::class0());
                    continue;
                }
                Variation::Group60Var2 => Some(EventClass::Class1),
                Variation::Group60Var3 => Some(EventClass::Class2),
                Variation::Group60Var4 => Some(EventClass::Class3),
                _ => None,
            };

            match class {
                Some(class) => targets.push(ReadTarget::ClassEvents {
                    classes: EventClasses::single(class),
                    limit,
                }),
                None => match ReadTarget::from_variation(header.variation, range, limit) {
                    Some(target) => targets.push(target),
                    None => {
                        warn!("READ of {} not supported", header.variation);
                        iin2 |= Iin2::OBJECT_UNKNOWN;
                    }
                },
            }
        }

        if iin2.contains(Iin2::OBJECT_UNKNOWN) {
            return Reply::with_iin(iin2);
        }

        let response = build_read_response(db, &targets, self.config.max_tx_fragment_size);
        if response.bad_range {
            iin2 |= Iin2::PARAMETER_ERROR;
        }
        Reply {
            fragments: response.fragments,
            iin2,
        }
    }

    fn write(&mut self, headers: &[ObjectHeader]) -> Reply {
        let mut iin2 = Iin2::default();

        for header in headers {
            match &header.body {
                HeaderBody::IinBits { start, values } => {
                    for (offset, value) in values.iter().enumerate() {
                        // only DEVICE_RESTART (IIN1.7) may be written, and only cleared
                        if *start as usize + offset == 7 && !value {
                            self.supervisor
                                .clear_restart(self.handlers.information.as_mut());
                        } else {
                            iin2 |= Iin2::PARAMETER_ERROR;
                        }
                    }
                }
                HeaderBody::Times(times) => match times.as_slice() {
                    [time] => match self.handlers.application.write_absolute_time(*time) {
                        WriteTimeResult::Ok => info!("Time written: {}", time),
                        WriteTimeResult::ParameterError => iin2 |= Iin2::PARAMETER_ERROR,
                        WriteTimeResult::NotSupported => iin2 |= Iin2::NO_FUNC_CODE_SUPPORT,
                    },
                    _ => iin2 |= Iin2::PARAMETER_ERROR,
                },
                _ => iin2 |= Iin2::OBJECT_UNKNOWN,
            }
        }

        Reply::with_iin(iin2)
    }

    fn freeze(&mut self, headers: &[ObjectHeader], freeze_type: FreezeType, db: &mut Database) -> Reply {
        let mut iin2 = Iin2::default();
        let application = self.handlers.application.as_mut();

        for header in headers {
            if header.variation != Variation::Group20Var0 {
                iin2 |= Iin2::OBJECT_UNKNOWN;
                continue;
            }
            let result = match header.body {
                HeaderBody::AllObjects => application.freeze_counters_all(freeze_type, db),
                HeaderBody::Range { start, stop } => {
                    application.freeze_counters_range(start, stop, freeze_type, db)
                }
                _ => FreezeResult::ParameterError,
            };
            match result {
                FreezeResult::Success => {}
                FreezeResult::NotSupported => iin2 |= Iin2::NO_FUNC_CODE_SUPPORT,
                FreezeResult::OutOfRange | FreezeResult::ParameterError => {
                    iin2 |= Iin2::PARAMETER_ERROR
                }
            }
        }

        Reply::with_iin(iin2)
    }

    fn unsolicited_control(&mut self, headers: &[ObjectHeader], enable: bool) -> Reply {
        if !self.config.allow_unsolicited {
            return Reply::with_iin(Iin2::NO_FUNC_CODE_SUPPORT);
        }

        let mut classes = EventClasses::none();
        for header in headers {
            let class = match header.variation {
                Variation::Group60Var2 => EventClass::Class1,
                Variation::Group60Var3 => EventClass::Class2,
                Variation::Group60Var4 => EventClass::Class3,
                _ => return Reply::with_iin(Iin2::OBJECT_UNKNOWN),
            };
            classes = classes.with(class, true);
        }

        self.unsolicited.enabled = if enable {
            self.unsolicited.enabled.union(classes)
        } else {
            self.unsolicited.enabled.difference(classes)
        };
        info!("Unsolicited classes: {:?}", self.unsolicited.enabled);
        Reply::with_iin(Iin2::default())
    }

    /// IIN of a fragment emitted now.
    fn iin(&mut self, db: &Database) -> Iin {
        let app = self.handlers.application.application_iin();
        let events = db.events();
        let classes = events.classes_with_events();

        let iin1 = self
            .supervisor
            .take_iin1()
            .with(Iin1::CLASS_1_EVENTS, classes.class1)
            .with(Iin1::CLASS_2_EVENTS, classes.class2)
            .with(Iin1::CLASS_3_EVENTS, classes.class3)
            .with(Iin1::NEED_TIME, app.need_time)
            .with(Iin1::LOCAL_CONTROL, app.local_control)
            .with(Iin1::DEVICE_TROUBLE, app.device_trouble);
        let iin2 = Iin2::default()
            .with(Iin2::EVENT_BUFFER_OVERFLOW, events.is_overflown())
            .with(Iin2::CONFIG_CORRUPT, app.config_corrupt);

        Iin::new(iin1, iin2)
    }

    fn build(
        &mut self,
        control: Control,
        function: FunctionCode,
        objects: &[u8],
        request_iin: Iin2,
        db: &Database,
    ) -> Fragment {
        let iin = self.iin(db) | request_iin;
        let header = ResponseHeader::new(control, function, iin);
        debug!("Sending {} ({} object bytes)", header, objects.len());

        let mut data = Vec::with_capacity(RESPONSE_HEADER_LENGTH + objects.len());
        data.extend_from_slice(&header.encode());
        data.extend_from_slice(objects);
        Fragment::new(self.reply_addresses(), data)
    }

    /// Send the first fragment of a solicited response. Returns it.
    fn send_solicited(
        &mut self,
        seq: Sequence,
        reply: Reply,
        now: Instant,
        db: &Database,
        out: &mut Vec<Fragment>,
    ) -> Fragment {
        let mut fragments: VecDeque<ResponseFragment> = reply.fragments.into();
        let first = fragments.pop_front().unwrap_or_default();
        self.send_fragment(seq, first, true, fragments, reply.iin2, now, db, out)
    }

    #[allow(clippy::too_many_arguments)]
    fn send_fragment(
        &mut self,
        seq: Sequence,
        fragment: ResponseFragment,
        fir: bool,
        remaining: VecDeque<ResponseFragment>,
        request_iin: Iin2,
        now: Instant,
        db: &Database,
        out: &mut Vec<Fragment>,
    ) -> Fragment {
        let fin = remaining.is_empty();
        let con = fragment.has_events() || !fin;
        let control = Control::response(seq, fir, fin, con);
        let sent = self.build(control, FunctionCode::Response, &fragment.objects, request_iin, db);
        out.push(sent.clone());

        if con {
            self.state = SessionState::SolicitedConfirmWait {
                ecsn: seq,
                deadline: now + self.config.solicited_confirm_timeout,
                selection: fragment.selection,
                remaining,
            };
            self.handlers.information.enter_solicited_confirm_wait(seq);
        } else if !matches!(self.state, SessionState::UnsolicitedConfirmWait { .. }) {
            // an unsolicited confirm wait outlives solicited replies
            self.state = SessionState::Idle;
        }
        sent
    }

    fn send_unsolicited(
        &mut self,
        fragment: ResponseFragment,
        is_null: bool,
        now: Instant,
        db: &Database,
        out: &mut Vec<Fragment>,
    ) {
        let seq = self.unsolicited.seq;
        self.unsolicited.seq = seq.next();

        let sent = self.build(
            Control::unsolicited(seq),
            FunctionCode::UnsolicitedResponse,
            &fragment.objects,
            Iin2::default(),
            db,
        );
        out.push(sent.clone());
        info!(
            "Unsolicited response seq {} with {} events",
            seq,
            fragment.selection.len()
        );

        self.state = SessionState::UnsolicitedConfirmWait {
            ecsn: seq,
            deadline: now + self.config.unsolicited_confirm_timeout,
            retries: 0,
            fragment: sent,
            selection: fragment.selection,
            is_null,
        };
        self.handlers.information.enter_unsolicited_confirm_wait(seq);
    }
}
