//! Response writer.
//!
//! Builds the object section of response fragments: events first
//! (qualifier 0x28, index prefixed) then static data (qualifier 0x01 over
//! contiguous index runs), split at the maximum fragment size. Each fragment
//! remembers the events it carries so a confirm removes exactly those.

use std::collections::BTreeMap;

use tracing::warn;

use super::control::CommandHeader;
use crate::database::Database;
use crate::event::{EventBuffer, EventSelection};
use crate::types::{
    EventClasses, Flags, Measurement, PointType, QualifierCode, Time, Variation,
    RESPONSE_HEADER_LENGTH,
};

/// Object section of one response fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ResponseFragment {
    pub objects: Vec<u8>,
    /// Events written into this fragment
    pub selection: EventSelection,
}

impl ResponseFragment {
    pub fn with_objects(objects: Vec<u8>) -> Self {
        Self {
            objects,
            selection: EventSelection::empty(),
        }
    }

    pub fn has_events(&self) -> bool {
        !self.selection.is_empty()
    }
}

/// What a READ object header asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ReadTarget {
    /// Events of the given classes (g60v2-4)
    ClassEvents {
        classes: EventClasses,
        limit: Option<usize>,
    },
    /// Events of one point type (event group), optionally in a specific variation
    TypeEvents {
        point_type: PointType,
        variation: Option<Variation>,
        limit: Option<usize>,
    },
    /// Current values of one point type (static group or class 0)
    Static {
        point_type: PointType,
        variation: Option<Variation>,
        range: Option<(u16, u16)>,
    },
}

impl ReadTarget {
    /// Targets of a class 0 read.
    pub fn class0() -> impl Iterator<Item = ReadTarget> {
        PointType::ALL.into_iter().map(|point_type| ReadTarget::Static {
            point_type,
            variation: None,
            range: None,
        })
    }

    /// Read target of a data object group/variation, `None` if the object
    /// cannot be read.
    pub fn from_variation(
        variation: Variation,
        range: Option<(u16, u16)>,
        limit: Option<usize>,
    ) -> Option<Self> {
        let (group, var) = variation.to_group_and_var();

        if let Some(point_type) = PointType::ALL.iter().find(|t| t.static_group() == group) {
            let specific = var != 0 && point_type != &PointType::OctetString;
            return Some(Self::Static {
                point_type: *point_type,
                variation: specific.then_some(variation),
                range,
            });
        }

        if let Some(point_type) = PointType::ALL.iter().find(|t| t.event_group() == group) {
            let specific = var != 0 && point_type != &PointType::OctetString;
            return Some(Self::TypeEvents {
                point_type: *point_type,
                variation: specific.then_some(variation),
                limit,
            });
        }

        None
    }
}

/// Objects and outcome of a READ.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReadResponse {
    pub fragments: Vec<ResponseFragment>,
    /// A requested range contained no points
    pub bad_range: bool,
}

/// Build the fragments answering a READ.
pub(crate) fn build_read_response(
    database: &Database,
    targets: &[ReadTarget],
    max_fragment_size: usize,
) -> ReadResponse {
    let mut writer = FragmentWriter::new(max_fragment_size);
    let mut bad_range = false;

    // events of all headers, in insertion order without duplicates
    let mut events: BTreeMap<u64, Option<Variation>> = BTreeMap::new();
    let buffer = database.events();
    for target in targets {
        let (selection, variation) = match *target {
            ReadTarget::ClassEvents { classes, limit } => (
                buffer.select_by_class_limited(classes, limit.unwrap_or(usize::MAX)),
                None,
            ),
            ReadTarget::TypeEvents {
                point_type,
                variation,
                limit,
            } => (
                buffer.select_by_type_limited(point_type, limit.unwrap_or(usize::MAX)),
                variation,
            ),
            ReadTarget::Static { .. } => continue,
        };
        for id in selection.ids() {
            events.entry(*id).or_insert(variation);
        }
    }
    write_events(&mut writer, buffer, &events);

    for target in targets {
        if let ReadTarget::Static {
            point_type,
            variation,
            range,
        } = *target
        {
            if !write_static(&mut writer, database, point_type, variation, range) {
                bad_range = true;
            }
        }
    }

    ReadResponse {
        fragments: writer.finish(),
        bad_range,
    }
}

/// Build one unsolicited fragment carrying as many events of `classes` as fit.
pub(crate) fn build_unsolicited_response(
    buffer: &EventBuffer,
    classes: EventClasses,
    max_fragment_size: usize,
) -> ResponseFragment {
    let mut writer = FragmentWriter::new(max_fragment_size);
    let events: BTreeMap<u64, Option<Variation>> = buffer
        .select_by_class(classes)
        .ids()
        .iter()
        .map(|id| (*id, None))
        .collect();
    write_events(&mut writer, buffer, &events);
    writer.finish().into_iter().next().unwrap_or_default()
}

fn write_events(
    writer: &mut FragmentWriter,
    buffer: &EventBuffer,
    events: &BTreeMap<u64, Option<Variation>>,
) {
    let mut data = Vec::with_capacity(16);
    for (id, requested) in events {
        let event = match buffer.get(*id) {
            Some(event) => event,
            None => continue,
        };

        let variation = match (&event.measurement, requested) {
            (Measurement::OctetString(s), _) => Variation::Group111(s.value.len() as u8),
            (_, Some(variation)) => *variation,
            (_, None) => event.variation,
        };

        data.clear();
        if !encode_object(&event.measurement, variation, &mut data) {
            warn!("Event {} cannot be encoded as {}", id, variation);
            continue;
        }
        writer.push_prefixed(variation, event.measurement.index(), &data);
        writer.current.selection.push(*id);
    }
}

/// Returns `false` if a range was requested and no point exists in it.
fn write_static(
    writer: &mut FragmentWriter,
    database: &Database,
    point_type: PointType,
    requested: Option<Variation>,
    range: Option<(u16, u16)>,
) -> bool {
    let (start, stop) = range.unwrap_or((0, u16::MAX));
    let mut found = false;
    let mut data = Vec::with_capacity(16);

    for (index, point) in database.points_in_range(point_type, start..=stop) {
        found = true;
        let variation = match (&point.value, requested) {
            (Measurement::OctetString(s), _) => Variation::Group110(s.value.len() as u8),
            (_, Some(variation)) => variation,
            (_, None) => point.config.static_variation(),
        };

        data.clear();
        if !encode_object(&point.value, variation, &mut data) {
            warn!("{} {} cannot be encoded as {}", point_type, index, variation);
            continue;
        }
        writer.push_ranged(variation, index, &data);
    }

    found || range.is_none()
}

/// Build the object section echoing control commands with their status.
pub(crate) fn write_command_echo(headers: &[CommandHeader]) -> Vec<u8> {
    let mut out = Vec::new();
    for header in headers {
        let (group, var) = header.variation.to_group_and_var();
        out.extend_from_slice(&[group, var, header.qualifier.as_u8()]);
        let count = header.items.len() as u16;
        match header.qualifier {
            QualifierCode::CountAndPrefix8 => out.push(count as u8),
            _ => out.extend_from_slice(&count.to_le_bytes()),
        }
        for item in &header.items {
            match header.qualifier {
                QualifierCode::CountAndPrefix8 => out.push(item.index as u8),
                _ => out.extend_from_slice(&item.index.to_le_bytes()),
            }
            item.command.encode(item.status, &mut out);
        }
    }
    out
}

/// Build a g52v1 / g52v2 time delay object.
pub(crate) fn write_time_delay(variation: Variation, delay: u16) -> Vec<u8> {
    let (group, var) = variation.to_group_and_var();
    let mut out = vec![group, var, QualifierCode::Count8.as_u8(), 0x01];
    out.extend_from_slice(&delay.to_le_bytes());
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderKind {
    Prefixed,
    Ranged,
}

#[derive(Debug, Clone, Copy)]
struct OpenHeader {
    variation: Variation,
    kind: HeaderKind,
    /// Position of the count (prefixed) or stop index (ranged) field
    field_pos: usize,
    count: u16,
    next_index: Option<u16>,
}

/// Writes object headers into fragments of bounded size.
struct FragmentWriter {
    max_objects: usize,
    fragments: Vec<ResponseFragment>,
    current: ResponseFragment,
    open: Option<OpenHeader>,
}

impl FragmentWriter {
    fn new(max_fragment_size: usize) -> Self {
        Self {
            max_objects: max_fragment_size.saturating_sub(RESPONSE_HEADER_LENGTH),
            fragments: Vec::new(),
            current: ResponseFragment::default(),
            open: None,
        }
    }

    fn fits(&self, len: usize) -> bool {
        self.current.objects.len() + len <= self.max_objects
    }

    fn next_fragment(&mut self) {
        let done = std::mem::take(&mut self.current);
        self.fragments.push(done);
        self.open = None;
    }

    /// Make room for a new header of `len` bytes; `false` if it can never fit.
    fn start_header(&mut self, len: usize, variation: Variation) -> bool {
        self.open = None;
        if len > self.max_objects {
            warn!("{} object too large for a fragment, skipped", variation);
            return false;
        }
        if !self.fits(len) {
            self.next_fragment();
        }
        true
    }

    fn push_prefixed(&mut self, variation: Variation, index: u16, data: &[u8]) {
        if let Some(open) = self.open.as_mut() {
            if open.kind == HeaderKind::Prefixed
                && open.variation == variation
                && open.count < u16::MAX
                && self.current.objects.len() + 2 + data.len() <= self.max_objects
            {
                open.count += 1;
                let pos = open.field_pos;
                let count = open.count;
                self.current.objects[pos..pos + 2].copy_from_slice(&count.to_le_bytes());
                self.current.objects.extend_from_slice(&index.to_le_bytes());
                self.current.objects.extend_from_slice(data);
                return;
            }
        }

        if !self.start_header(3 + 2 + 2 + data.len(), variation) {
            return;
        }
        let (group, var) = variation.to_group_and_var();
        let objects = &mut self.current.objects;
        objects.extend_from_slice(&[group, var, QualifierCode::CountAndPrefix16.as_u8()]);
        let field_pos = objects.len();
        objects.extend_from_slice(&1u16.to_le_bytes());
        objects.extend_from_slice(&index.to_le_bytes());
        objects.extend_from_slice(data);
        self.open = Some(OpenHeader {
            variation,
            kind: HeaderKind::Prefixed,
            field_pos,
            count: 1,
            next_index: None,
        });
    }

    fn push_ranged(&mut self, variation: Variation, index: u16, data: &[u8]) {
        if let Some(open) = self.open.as_mut() {
            if open.kind == HeaderKind::Ranged
                && open.variation == variation
                && open.next_index == Some(index)
                && self.current.objects.len() + data.len() <= self.max_objects
            {
                open.next_index = index.checked_add(1);
                let pos = open.field_pos;
                self.current.objects[pos..pos + 2].copy_from_slice(&index.to_le_bytes());
                self.current.objects.extend_from_slice(data);
                return;
            }
        }

        if !self.start_header(3 + 4 + data.len(), variation) {
            return;
        }
        let (group, var) = variation.to_group_and_var();
        let objects = &mut self.current.objects;
        objects.extend_from_slice(&[group, var, QualifierCode::Range16.as_u8()]);
        objects.extend_from_slice(&index.to_le_bytes());
        let field_pos = objects.len();
        objects.extend_from_slice(&index.to_le_bytes());
        objects.extend_from_slice(data);
        self.open = Some(OpenHeader {
            variation,
            kind: HeaderKind::Ranged,
            field_pos,
            count: 1,
            next_index: index.checked_add(1),
        });
    }

    /// Finished fragments; always at least one.
    fn finish(mut self) -> Vec<ResponseFragment> {
        self.fragments.push(self.current);
        self.fragments
    }
}

fn write_time(time: Option<Time>, out: &mut Vec<u8>) {
    let bytes = time.map(|t| t.timestamp().to_le_bytes()).unwrap_or([0; 6]);
    out.extend_from_slice(&bytes);
}

/// Convert an analog value to i32, flagging values that do not fit.
fn analog_to_i32(value: f64, flags: Flags) -> (i32, Flags) {
    if value.is_nan() {
        (0, flags | Flags::OVER_RANGE)
    } else if value > i32::MAX as f64 {
        (i32::MAX, flags | Flags::OVER_RANGE)
    } else if value < i32::MIN as f64 {
        (i32::MIN, flags | Flags::OVER_RANGE)
    } else {
        (value as i32, flags)
    }
}

/// Convert an analog value to f32, flagging finite values that do not fit.
fn analog_to_f32(value: f64, flags: Flags) -> (f32, Flags) {
    if value.is_finite() && value.abs() > f32::MAX as f64 {
        ((f32::MAX as f64).copysign(value) as f32, flags | Flags::OVER_RANGE)
    } else {
        (value as f32, flags)
    }
}

fn write_analog(
    value: f64,
    flags: Flags,
    time: Option<Time>,
    float: bool,
    with_flags: bool,
    with_time: bool,
    out: &mut Vec<u8>,
) {
    let (bytes, flags) = if float {
        let (v, flags) = analog_to_f32(value, flags);
        (v.to_le_bytes(), flags)
    } else {
        let (v, flags) = analog_to_i32(value, flags);
        (v.to_le_bytes(), flags)
    };
    if with_flags {
        out.push(flags.value());
    }
    out.extend_from_slice(&bytes);
    if with_time {
        write_time(time, out);
    }
}

/// Encode one object of `measurement` in `variation` (static or event).
///
/// Returns `false` if the variation does not belong to the measurement type.
pub(crate) fn encode_object(measurement: &Measurement, variation: Variation, out: &mut Vec<u8>) -> bool {
    use Variation as V;

    match (variation, measurement) {
        (V::Group1Var2 | V::Group2Var1, Measurement::BinaryInput(m)) => {
            out.push(m.flags.with_bit_state(m.value));
        }
        (V::Group2Var2, Measurement::BinaryInput(m)) => {
            out.push(m.flags.with_bit_state(m.value));
            write_time(m.time, out);
        }
        (V::Group3Var2 | V::Group4Var1, Measurement::DoubleBitBinaryInput(m)) => {
            out.push(m.flags.with_double_bit_state(m.value));
        }
        (V::Group4Var2, Measurement::DoubleBitBinaryInput(m)) => {
            out.push(m.flags.with_double_bit_state(m.value));
            write_time(m.time, out);
        }
        (V::Group10Var2 | V::Group11Var1, Measurement::BinaryOutputStatus(m)) => {
            out.push(m.flags.with_bit_state(m.value));
        }
        (V::Group11Var2, Measurement::BinaryOutputStatus(m)) => {
            out.push(m.flags.with_bit_state(m.value));
            write_time(m.time, out);
        }
        (V::Group20Var1 | V::Group22Var1, Measurement::Counter(m)) => {
            out.push(m.flags.value());
            out.extend_from_slice(&m.value.to_le_bytes());
        }
        (V::Group20Var5, Measurement::Counter(m)) => {
            out.extend_from_slice(&m.value.to_le_bytes());
        }
        (V::Group22Var5, Measurement::Counter(m)) => {
            out.push(m.flags.value());
            out.extend_from_slice(&m.value.to_le_bytes());
            write_time(m.time, out);
        }
        (V::Group21Var1 | V::Group23Var1, Measurement::FrozenCounter(m)) => {
            out.push(m.flags.value());
            out.extend_from_slice(&m.value.to_le_bytes());
        }
        (V::Group21Var9, Measurement::FrozenCounter(m)) => {
            out.extend_from_slice(&m.value.to_le_bytes());
        }
        (V::Group23Var5, Measurement::FrozenCounter(m)) => {
            out.push(m.flags.value());
            out.extend_from_slice(&m.value.to_le_bytes());
            write_time(m.time, out);
        }
        (V::Group30Var1 | V::Group32Var1, Measurement::AnalogInput(m)) => {
            write_analog(m.value, m.flags, m.time, false, true, false, out)
        }
        (V::Group30Var3, Measurement::AnalogInput(m)) => {
            write_analog(m.value, m.flags, m.time, false, false, false, out)
        }
        (V::Group30Var5 | V::Group32Var5, Measurement::AnalogInput(m)) => {
            write_analog(m.value, m.flags, m.time, true, true, false, out)
        }
        (V::Group32Var3, Measurement::AnalogInput(m)) => {
            write_analog(m.value, m.flags, m.time, false, true, true, out)
        }
        (V::Group32Var7, Measurement::AnalogInput(m)) => {
            write_analog(m.value, m.flags, m.time, true, true, true, out)
        }
        (V::Group40Var1 | V::Group42Var1, Measurement::AnalogOutputStatus(m)) => {
            write_analog(m.value, m.flags, m.time, false, true, false, out)
        }
        (V::Group40Var3 | V::Group42Var5, Measurement::AnalogOutputStatus(m)) => {
            write_analog(m.value, m.flags, m.time, true, true, false, out)
        }
        (V::Group42Var3, Measurement::AnalogOutputStatus(m)) => {
            write_analog(m.value, m.flags, m.time, false, true, true, out)
        }
        (V::Group42Var7, Measurement::AnalogOutputStatus(m)) => {
            write_analog(m.value, m.flags, m.time, true, true, true, out)
        }
        (V::Group110(_) | V::Group111(_), Measurement::OctetString(m)) => {
            out.extend_from_slice(&m.value);
        }
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outstation::control::CommandItem;
    use crate::database::{AnalogInputConfig, StaticAnalogInputVariation, UpdateOptions};
    use crate::event::EventBufferConfig;
    use crate::types::{
        AnalogInput, BinaryInput, Command, CommandStatus, Counter, DoubleBit,
        DoubleBitBinaryInput, EventClass, OctetString,
    };

    fn database() -> Database {
        Database::new(EventBufferConfig::default()).unwrap()
    }

    #[test]
    fn test_encode_binary_state_in_flags() {
        let mut out = Vec::new();
        let m = Measurement::from(BinaryInput::without_time(0, true, Flags::ONLINE));
        assert!(encode_object(&m, Variation::Group1Var2, &mut out));
        assert_eq!(out, vec![0x81]);

        out.clear();
        let m = Measurement::from(DoubleBitBinaryInput::without_time(
            0,
            DoubleBit::DeterminedOn,
            Flags::ONLINE,
        ));
        assert!(encode_object(&m, Variation::Group3Var2, &mut out));
        assert_eq!(out, vec![0x81]);
    }

    #[test]
    fn test_encode_event_with_time() {
        let mut out = Vec::new();
        let m = Measurement::from(BinaryInput::new(
            0,
            false,
            Flags::ONLINE,
            Time::synchronized(0x0000_0102_0304_0506),
        ));
        assert!(encode_object(&m, Variation::Group2Var2, &mut out));
        assert_eq!(out, vec![0x01, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_encode_counter_variations() {
        let m = Measurement::from(Counter::without_time(0, 0x0102_0304, Flags::ONLINE));
        let mut out = Vec::new();
        assert!(encode_object(&m, Variation::Group20Var1, &mut out));
        assert_eq!(out, vec![0x01, 0x04, 0x03, 0x02, 0x01]);
        out.clear();
        assert!(encode_object(&m, Variation::Group20Var5, &mut out));
        assert_eq!(out, vec![0x04, 0x03, 0x02, 0x01]);
        out.clear();
        assert!(!encode_object(&m, Variation::Group30Var1, &mut out));
    }

    #[test]
    fn test_encode_analog_over_range() {
        let mut out = Vec::new();
        let m = Measurement::from(AnalogInput::without_time(0, 1.0e12, Flags::ONLINE));
        assert!(encode_object(&m, Variation::Group30Var1, &mut out));
        assert_eq!(out[0], (Flags::ONLINE | Flags::OVER_RANGE).value());
        assert_eq!(&out[1..], &i32::MAX.to_le_bytes());

        out.clear();
        assert!(encode_object(&m, Variation::Group30Var5, &mut out));
        assert_eq!(out[0], Flags::ONLINE.value());
        assert_eq!(&out[1..], &1.0e12f32.to_le_bytes());
    }

    #[test]
    fn test_static_read_contiguous_runs() {
        let mut db = database();
        for index in [0, 1, 2, 5] {
            db.add_binary_input(index, None, Default::default()).unwrap();
        }
        let response = build_read_response(&db, &ReadTarget::class0().collect::<Vec<_>>(), 2048);
        assert_eq!(response.fragments.len(), 1);
        // restart flag in every initial value
        assert_eq!(
            response.fragments[0].objects,
            vec![1, 2, 0x01, 0, 0, 2, 0, 0x02, 0x02, 0x02, 1, 2, 0x01, 5, 0, 5, 0, 0x02]
        );
        assert!(!response.bad_range);
    }

    #[test]
    fn test_static_read_specific_variation() {
        let mut db = database();
        db.add_analog_input(
            3,
            None,
            AnalogInputConfig {
                static_variation: StaticAnalogInputVariation::Group30Var5,
                ..Default::default()
            },
        )
        .unwrap();
        db.update(
            AnalogInput::without_time(3, 7.0, Flags::ONLINE),
            UpdateOptions::default(),
        )
        .unwrap();

        let default = build_read_response(
            &db,
            &[ReadTarget::from_variation(Variation::Group30Var0, None, None).unwrap()],
            2048,
        );
        assert_eq!(&default.fragments[0].objects[..2], &[30, 5]);

        let specific = build_read_response(
            &db,
            &[ReadTarget::from_variation(Variation::Group30Var3, None, None).unwrap()],
            2048,
        );
        assert_eq!(
            specific.fragments[0].objects,
            vec![30, 3, 0x01, 3, 0, 3, 0, 7, 0, 0, 0]
        );
    }

    #[test]
    fn test_static_read_empty_range() {
        let mut db = database();
        db.add_counter(0, None, Default::default()).unwrap();
        let response = build_read_response(
            &db,
            &[ReadTarget::from_variation(Variation::Group20Var0, Some((4, 9)), None).unwrap()],
            2048,
        );
        assert!(response.bad_range);
    }

    #[test]
    fn test_events_before_static() {
        let mut db = database();
        db.add_binary_input(0, Some(EventClass::Class1), Default::default())
            .unwrap();
        db.update(
            BinaryInput::without_time(0, true, Flags::ONLINE),
            UpdateOptions::default(),
        )
        .unwrap();

        let mut targets = vec![ReadTarget::ClassEvents {
            classes: EventClasses::all(),
            limit: None,
        }];
        targets.extend(ReadTarget::class0());
        let response = build_read_response(&db, &targets, 2048);

        let objects = &response.fragments[0].objects;
        assert_eq!(&objects[..8], &[2, 1, 0x28, 1, 0, 0, 0, 0x81]);
        assert_eq!(&objects[8..], &[1, 2, 0x01, 0, 0, 0, 0, 0x81]);
        assert_eq!(response.fragments[0].selection.len(), 1);
    }

    #[test]
    fn test_events_not_duplicated() {
        let mut db = database();
        db.add_binary_input(0, Some(EventClass::Class1), Default::default())
            .unwrap();
        db.update(
            BinaryInput::without_time(0, true, Flags::ONLINE),
            UpdateOptions::default(),
        )
        .unwrap();
        let targets = [
            ReadTarget::ClassEvents {
                classes: EventClasses::single(EventClass::Class1),
                limit: None,
            },
            ReadTarget::from_variation(Variation::Group2Var0, None, None).unwrap(),
        ];
        let response = build_read_response(&db, &targets, 2048);
        assert_eq!(response.fragments[0].selection.len(), 1);
    }

    #[test]
    fn test_fragmentation() {
        let mut db = database();
        for index in 0..100 {
            db.add_analog_input(index, Some(EventClass::Class2), Default::default())
                .unwrap();
            db.update(
                AnalogInput::without_time(index, index as f64, Flags::ONLINE),
                UpdateOptions::default(),
            )
            .unwrap();
        }

        let targets = [ReadTarget::ClassEvents {
            classes: EventClasses::all(),
            limit: None,
        }];
        let response = build_read_response(&db, &targets, 249);
        // each event is 7 bytes: 2 byte index + 5 byte g32v1
        assert!(response.fragments.len() > 1);
        let total: usize = response.fragments.iter().map(|f| f.selection.len()).sum();
        assert_eq!(total, 100);
        for fragment in &response.fragments {
            assert!(fragment.objects.len() + RESPONSE_HEADER_LENGTH <= 249);
            // each fragment starts with a complete header
            assert_eq!(&fragment.objects[..3], &[32, 1, 0x28]);
        }
    }

    #[test]
    fn test_octet_string_variation_from_length() {
        let mut db = database();
        db.add_octet_string(4, Some(EventClass::Class3), Default::default())
            .unwrap();
        db.update(OctetString::new(4, &b"abc"[..]), UpdateOptions::default())
            .unwrap();

        let fragment = build_unsolicited_response(db.events(), EventClasses::all(), 2048);
        assert_eq!(
            fragment.objects,
            vec![111, 3, 0x28, 1, 0, 4, 0, b'a', b'b', b'c']
        );
    }

    #[test]
    fn test_unsolicited_single_fragment() {
        let mut db = database();
        for index in 0..100 {
            db.add_counter(index, Some(EventClass::Class1), Default::default())
                .unwrap();
            db.update(
                Counter::without_time(index, 1, Flags::ONLINE),
                UpdateOptions::default(),
            )
            .unwrap();
        }
        let fragment = build_unsolicited_response(db.events(), EventClasses::all(), 249);
        assert!(fragment.selection.len() < 100);
        assert!(fragment.objects.len() + RESPONSE_HEADER_LENGTH <= 249);
    }

    #[test]
    fn test_command_echo() {
        let headers = vec![CommandHeader {
            variation: Variation::Group41Var2,
            qualifier: QualifierCode::CountAndPrefix8,
            items: vec![CommandItem {
                index: 3,
                command: Command::G41V2(10),
                status: CommandStatus::NotSupported,
            }],
        }];
        assert_eq!(
            write_command_echo(&headers),
            vec![41, 2, 0x17, 1, 3, 10, 0, 4]
        );
    }

    #[test]
    fn test_time_delay() {
        assert_eq!(
            write_time_delay(Variation::Group52Var2, 0x0102),
            vec![52, 2, 0x07, 1, 0x02, 0x01]
        );
    }
}
