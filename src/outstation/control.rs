//! Control dispatcher implementing select-before-operate.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::traits::ControlHandler;
use crate::database::Database;
use crate::parser::{HeaderBody, ObjectHeader};
use crate::types::{
    Command, CommandStatus, OpType, OperateType, PointType, QualifierCode, Sequence,
    TripCloseCode, Variation,
};

/// A command together with the status it is echoed with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CommandItem {
    pub index: u16,
    pub command: Command,
    pub status: CommandStatus,
}

/// Commands of one request object header with their outcome.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CommandHeader {
    pub variation: Variation,
    pub qualifier: QualifierCode,
    pub items: Vec<CommandItem>,
}

#[derive(Debug, Clone, Copy)]
struct Selection {
    command: Command,
    seq: Sequence,
    deadline: Instant,
}

/// Remembers selected commands and routes commands to the `ControlHandler`.
#[derive(Debug)]
pub(crate) struct ControlDispatcher {
    select_timeout: Duration,
    max_controls: usize,
    selections: HashMap<(Variation, u16), Selection>,
}

impl ControlDispatcher {
    pub fn new(select_timeout: Duration, max_controls: usize) -> Self {
        Self {
            select_timeout,
            max_controls,
            selections: HashMap::new(),
        }
    }

    /// Forget all selections.
    pub fn clear(&mut self) {
        self.selections.clear();
    }

    /// Number of selections currently remembered.
    pub fn selection_count(&self) -> usize {
        self.selections.len()
    }

    /// Process a SELECT request. Earlier selections are discarded.
    pub fn select(
        &mut self,
        headers: &[ObjectHeader],
        seq: Sequence,
        now: Instant,
        handler: &mut dyn ControlHandler,
        database: &mut Database,
    ) -> Vec<CommandHeader> {
        self.selections.clear();
        let deadline = now + self.select_timeout;

        self.process(headers, handler, database, |dispatcher, index, command, handler, db| {
            let status = dispatch_select(handler, index, command, db);
            if status.is_success() {
                dispatcher.selections.insert(
                    (command.variation(), index),
                    Selection {
                        command,
                        seq,
                        deadline,
                    },
                );
            }
            status
        })
    }

    /// Process an OPERATE, DIRECT_OPERATE or DIRECT_OPERATE_NR request.
    pub fn operate(
        &mut self,
        headers: &[ObjectHeader],
        op_type: OperateType,
        seq: Sequence,
        now: Instant,
        handler: &mut dyn ControlHandler,
        database: &mut Database,
    ) -> Vec<CommandHeader> {
        self.process(headers, handler, database, |dispatcher, index, command, handler, db| {
            if op_type == OperateType::SelectBeforeOperate {
                let key = (command.variation(), index);
                let status = dispatcher.check_selection(key, &command, seq, now);
                if status != CommandStatus::Success {
                    return status;
                }
                dispatcher.selections.remove(&key);
            }
            dispatch_operate(handler, index, command, op_type, db)
        })
    }

    fn check_selection(
        &self,
        key: (Variation, u16),
        command: &Command,
        seq: Sequence,
        now: Instant,
    ) -> CommandStatus {
        match self.selections.get(&key) {
            None => {
                debug!("Operate {} {} without selection", key.0, key.1);
                CommandStatus::NoSelect
            }
            Some(selection) if selection.seq.next() != seq => {
                debug!(
                    "Operate seq {} does not follow select seq {}",
                    seq, selection.seq
                );
                CommandStatus::NoSelect
            }
            Some(selection) if !selection.command.matches(command) => {
                debug!("Operate {} {} does not match selection", key.0, key.1);
                CommandStatus::NoSelect
            }
            Some(selection) if now > selection.deadline => {
                debug!("Selection of {} {} expired", key.0, key.1);
                CommandStatus::NoSelect
            }
            Some(_) => CommandStatus::Success,
        }
    }

    fn process<F>(
        &mut self,
        headers: &[ObjectHeader],
        handler: &mut dyn ControlHandler,
        database: &mut Database,
        mut action: F,
    ) -> Vec<CommandHeader>
    where
        F: FnMut(&mut Self, u16, Command, &mut dyn ControlHandler, &mut Database) -> CommandStatus,
    {
        let mut count = 0usize;
        let mut output = Vec::with_capacity(headers.len());

        handler.begin_fragment();
        for header in headers {
            let commands = match &header.body {
                HeaderBody::Commands(commands) => commands,
                _ => continue,
            };

            let mut items = Vec::with_capacity(commands.len());
            for cmd in commands {
                count += 1;
                let status = if count > self.max_controls {
                    CommandStatus::TooManyOps
                } else if let Some(status) = validate_format(&cmd.command) {
                    status
                } else if !database.contains(output_type(&cmd.command), cmd.index) {
                    debug!("{} {} not configured", header.variation, cmd.index);
                    CommandStatus::NotSupported
                } else {
                    action(self, cmd.index, cmd.command, &mut *handler, &mut *database)
                };
                items.push(CommandItem {
                    index: cmd.index,
                    command: cmd.command,
                    status,
                });
            }

            output.push(CommandHeader {
                variation: header.variation,
                qualifier: header.qualifier,
                items,
            });
        }
        handler.end_fragment(database);

        output
    }
}

fn validate_format(command: &Command) -> Option<CommandStatus> {
    match command {
        Command::G12V1(crob) => match (crob.code.op_type, crob.code.tcc) {
            (OpType::Unknown(_), _) | (_, TripCloseCode::Reserved) => {
                Some(CommandStatus::FormatError)
            }
            _ => None,
        },
        _ => None,
    }
}

/// Output point type a command acts on.
fn output_type(command: &Command) -> PointType {
    match command {
        Command::G12V1(_) => PointType::BinaryOutputStatus,
        _ => PointType::AnalogOutputStatus,
    }
}

fn dispatch_select(
    handler: &mut dyn ControlHandler,
    index: u16,
    command: Command,
    db: &mut Database,
) -> CommandStatus {
    match command {
        Command::G12V1(crob) => handler.select_g12v1(crob, index, db),
        Command::G41V1(value) => handler.select_g41v1(value, index, db),
        Command::G41V2(value) => handler.select_g41v2(value, index, db),
        Command::G41V3(value) => handler.select_g41v3(value, index, db),
        Command::G41V4(value) => handler.select_g41v4(value, index, db),
    }
}

fn dispatch_operate(
    handler: &mut dyn ControlHandler,
    index: u16,
    command: Command,
    op_type: OperateType,
    db: &mut Database,
) -> CommandStatus {
    match command {
        Command::G12V1(crob) => handler.operate_g12v1(crob, index, op_type, db),
        Command::G41V1(value) => handler.operate_g41v1(value, index, op_type, db),
        Command::G41V2(value) => handler.operate_g41v2(value, index, op_type, db),
        Command::G41V3(value) => handler.operate_g41v3(value, index, op_type, db),
        Command::G41V4(value) => handler.operate_g41v4(value, index, op_type, db),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventBufferConfig;
    use crate::parser::PrefixedCommand;
    use crate::types::{ControlCode, Group12Var1};

    #[derive(Default)]
    struct RecordingHandler {
        selects: Vec<u16>,
        operates: Vec<(u16, OperateType)>,
        fragments: usize,
    }

    impl ControlHandler for RecordingHandler {
        fn begin_fragment(&mut self) {
            self.fragments += 1;
        }

        fn select_g12v1(&mut self, _: Group12Var1, index: u16, _: &mut Database) -> CommandStatus {
            self.selects.push(index);
            if index < 10 {
                CommandStatus::Success
            } else {
                CommandStatus::NotSupported
            }
        }

        fn operate_g12v1(
            &mut self,
            _: Group12Var1,
            index: u16,
            op_type: OperateType,
            _: &mut Database,
        ) -> CommandStatus {
            self.operates.push((index, op_type));
            CommandStatus::Success
        }

        fn select_g41v3(&mut self, _: f32, _: u16, _: &mut Database) -> CommandStatus {
            CommandStatus::Success
        }

        fn operate_g41v3(
            &mut self,
            _: f32,
            _: u16,
            _: OperateType,
            _: &mut Database,
        ) -> CommandStatus {
            CommandStatus::Success
        }
    }

    fn crob(op_type: OpType) -> Command {
        Command::G12V1(Group12Var1::new(ControlCode::from_op_type(op_type), 1, 100, 100))
    }

    fn header(commands: &[(u16, Command)]) -> Vec<ObjectHeader> {
        vec![ObjectHeader {
            variation: commands[0].1.variation(),
            qualifier: QualifierCode::CountAndPrefix16,
            body: HeaderBody::Commands(
                commands
                    .iter()
                    .map(|(index, command)| PrefixedCommand {
                        index: *index,
                        command: *command,
                        status: 0,
                    })
                    .collect(),
            ),
        }]
    }

    fn statuses(output: &[CommandHeader]) -> Vec<CommandStatus> {
        output
            .iter()
            .flat_map(|h| h.items.iter().map(|i| i.status))
            .collect()
    }

    fn setup() -> (ControlDispatcher, RecordingHandler, Database) {
        let mut db = Database::new(EventBufferConfig::default()).unwrap();
        for index in 0..=20 {
            db.add_binary_output_status(index, None, Default::default())
                .unwrap();
        }
        for index in 0..4 {
            db.add_analog_output_status(index, None, Default::default())
                .unwrap();
        }
        (
            ControlDispatcher::new(Duration::from_secs(5), 4),
            RecordingHandler::default(),
            db,
        )
    }

    #[test]
    fn test_select_then_operate() {
        let (mut dispatcher, mut handler, mut db) = setup();
        let now = Instant::now();
        let request = header(&[(3, crob(OpType::LatchOn))]);

        let out = dispatcher.select(&request, Sequence::new(4), now, &mut handler, &mut db);
        assert_eq!(statuses(&out), vec![CommandStatus::Success]);
        assert_eq!(dispatcher.selection_count(), 1);

        let out = dispatcher.operate(
            &request,
            OperateType::SelectBeforeOperate,
            Sequence::new(5),
            now + Duration::from_secs(1),
            &mut handler,
            &mut db,
        );
        assert_eq!(statuses(&out), vec![CommandStatus::Success]);
        assert_eq!(handler.operates, vec![(3, OperateType::SelectBeforeOperate)]);
        // selection consumed
        assert_eq!(dispatcher.selection_count(), 0);
        assert_eq!(handler.fragments, 2);
    }

    #[test]
    fn test_operate_without_select() {
        let (mut dispatcher, mut handler, mut db) = setup();
        let request = header(&[(3, crob(OpType::LatchOn))]);
        let out = dispatcher.operate(
            &request,
            OperateType::SelectBeforeOperate,
            Sequence::new(1),
            Instant::now(),
            &mut handler,
            &mut db,
        );
        assert_eq!(statuses(&out), vec![CommandStatus::NoSelect]);
        assert!(handler.operates.is_empty());
    }

    #[test]
    fn test_operate_wrong_sequence() {
        let (mut dispatcher, mut handler, mut db) = setup();
        let now = Instant::now();
        let request = header(&[(3, crob(OpType::LatchOn))]);
        dispatcher.select(&request, Sequence::new(4), now, &mut handler, &mut db);
        let out = dispatcher.operate(
            &request,
            OperateType::SelectBeforeOperate,
            Sequence::new(6),
            now,
            &mut handler,
            &mut db,
        );
        assert_eq!(statuses(&out), vec![CommandStatus::NoSelect]);
    }

    #[test]
    fn test_operate_different_command() {
        let (mut dispatcher, mut handler, mut db) = setup();
        let now = Instant::now();
        dispatcher.select(
            &header(&[(3, crob(OpType::LatchOn))]),
            Sequence::new(4),
            now,
            &mut handler,
            &mut db,
        );
        let out = dispatcher.operate(
            &header(&[(3, crob(OpType::LatchOff))]),
            OperateType::SelectBeforeOperate,
            Sequence::new(5),
            now,
            &mut handler,
            &mut db,
        );
        assert_eq!(statuses(&out), vec![CommandStatus::NoSelect]);
    }

    #[test]
    fn test_operate_after_timeout() {
        let (mut dispatcher, mut handler, mut db) = setup();
        let now = Instant::now();
        let request = header(&[(3, crob(OpType::LatchOn))]);
        dispatcher.select(&request, Sequence::new(4), now, &mut handler, &mut db);
        let out = dispatcher.operate(
            &request,
            OperateType::SelectBeforeOperate,
            Sequence::new(5),
            now + Duration::from_secs(6),
            &mut handler,
            &mut db,
        );
        assert_eq!(statuses(&out), vec![CommandStatus::NoSelect]);
        assert!(handler.operates.is_empty());
    }

    #[test]
    fn test_new_select_supersedes() {
        let (mut dispatcher, mut handler, mut db) = setup();
        let now = Instant::now();
        let first = header(&[(1, crob(OpType::LatchOn))]);
        dispatcher.select(&first, Sequence::new(0), now, &mut handler, &mut db);
        dispatcher.select(
            &header(&[(2, crob(OpType::LatchOn))]),
            Sequence::new(1),
            now,
            &mut handler,
            &mut db,
        );
        let out = dispatcher.operate(
            &first,
            OperateType::SelectBeforeOperate,
            Sequence::new(1),
            now,
            &mut handler,
            &mut db,
        );
        assert_eq!(statuses(&out), vec![CommandStatus::NoSelect]);
    }

    #[test]
    fn test_failed_select_not_recorded() {
        let (mut dispatcher, mut handler, mut db) = setup();
        let out = dispatcher.select(
            &header(&[(20, crob(OpType::LatchOn))]),
            Sequence::new(0),
            Instant::now(),
            &mut handler,
            &mut db,
        );
        assert_eq!(statuses(&out), vec![CommandStatus::NotSupported]);
        assert_eq!(dispatcher.selection_count(), 0);
    }

    #[test]
    fn test_direct_operate_bypasses_selection() {
        let (mut dispatcher, mut handler, mut db) = setup();
        let out = dispatcher.operate(
            &header(&[(7, crob(OpType::PulseOn)), (8, crob(OpType::PulseOff))]),
            OperateType::DirectOperate,
            Sequence::new(9),
            Instant::now(),
            &mut handler,
            &mut db,
        );
        assert_eq!(
            statuses(&out),
            vec![CommandStatus::Success, CommandStatus::Success]
        );
        assert_eq!(
            handler.operates,
            vec![
                (7, OperateType::DirectOperate),
                (8, OperateType::DirectOperate)
            ]
        );
    }

    #[test]
    fn test_too_many_controls() {
        let (mut dispatcher, mut handler, mut db) = setup();
        let commands: Vec<(u16, Command)> = (0..6).map(|i| (i, crob(OpType::LatchOn))).collect();
        let out = dispatcher.operate(
            &header(&commands),
            OperateType::DirectOperate,
            Sequence::new(0),
            Instant::now(),
            &mut handler,
            &mut db,
        );
        let statuses = statuses(&out);
        assert_eq!(&statuses[..4], &[CommandStatus::Success; 4]);
        assert_eq!(&statuses[4..], &[CommandStatus::TooManyOps; 2]);
        assert_eq!(handler.operates.len(), 4);
    }

    #[test]
    fn test_select_unconfigured_point() {
        let (mut dispatcher, mut handler, mut db) = setup();
        let out = dispatcher.select(
            &header(&[(30, crob(OpType::LatchOn))]),
            Sequence::new(0),
            Instant::now(),
            &mut handler,
            &mut db,
        );
        assert_eq!(statuses(&out), vec![CommandStatus::NotSupported]);
        assert!(handler.selects.is_empty());
        assert_eq!(dispatcher.selection_count(), 0);
    }

    #[test]
    fn test_direct_operate_unconfigured_point() {
        let (mut dispatcher, mut handler, mut db) = setup();
        let out = dispatcher.operate(
            &header(&[(1, crob(OpType::PulseOn)), (25, crob(OpType::PulseOn))]),
            OperateType::DirectOperate,
            Sequence::new(0),
            Instant::now(),
            &mut handler,
            &mut db,
        );
        assert_eq!(
            statuses(&out),
            vec![CommandStatus::Success, CommandStatus::NotSupported]
        );
        assert_eq!(handler.operates, vec![(1, OperateType::DirectOperate)]);

        // analog commands check analog output status points
        let out = dispatcher.operate(
            &header(&[(9, Command::G41V3(2.0))]),
            OperateType::DirectOperate,
            Sequence::new(1),
            Instant::now(),
            &mut handler,
            &mut db,
        );
        assert_eq!(statuses(&out), vec![CommandStatus::NotSupported]);
    }

    #[test]
    fn test_format_error() {
        let (mut dispatcher, mut handler, mut db) = setup();
        let out = dispatcher.operate(
            &header(&[(0, crob(OpType::Unknown(9)))]),
            OperateType::DirectOperate,
            Sequence::new(0),
            Instant::now(),
            &mut handler,
            &mut db,
        );
        assert_eq!(statuses(&out), vec![CommandStatus::FormatError]);
        assert!(handler.operates.is_empty());
    }

    #[test]
    fn test_analog_output_select_operate() {
        let (mut dispatcher, mut handler, mut db) = setup();
        let now = Instant::now();
        let request = header(&[(2, Command::G41V3(1.5))]);
        dispatcher.select(&request, Sequence::new(15), now, &mut handler, &mut db);
        let out = dispatcher.operate(
            &request,
            OperateType::SelectBeforeOperate,
            Sequence::new(0),
            now,
            &mut handler,
            &mut db,
        );
        assert_eq!(statuses(&out), vec![CommandStatus::Success]);
    }
}
