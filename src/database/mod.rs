//! Point database.
//!
//! The database stores the current value of every configured point and the
//! buffer of events recorded from updates. It is shared between the
//! application (through transactions on a `DatabaseHandle`) and the session
//! that reads it to build responses.
//!
//! # Example
//!
//! ```rust,ignore
//! use voltage_dnp3::database::{Database, UpdateOptions};
//! use voltage_dnp3::{AnalogInput, AnalogInputConfig, EventBufferConfig, EventClass, Flags};
//!
//! let mut db = Database::new(EventBufferConfig::default())?;
//! db.add_analog_input(0, Some(EventClass::Class2), AnalogInputConfig::default())?;
//! let recorded = db.update(
//!     AnalogInput::without_time(0, 12.5, Flags::ONLINE),
//!     UpdateOptions::default(),
//! )?;
//! assert!(recorded);
//! ```

mod config;
mod freeze;

pub use config::*;
pub use freeze::*;

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use tracing::debug;

use crate::error::{Dnp3Error, Result};
use crate::event::{EventBuffer, EventBufferConfig};
use crate::types::{
    AnalogInput, AnalogOutputStatus, BinaryInput, BinaryOutputStatus, Counter,
    DoubleBitBinaryInput, EventClass, FrozenCounter, Measurement, OctetString, PointType,
};

/// When an update records an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventMode {
    /// Record an event if the value or the flags changed
    #[default]
    Detect,
    /// Always record an event
    Force,
    /// Never record an event
    Suppress,
}

/// Options of a single point update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Replace the current (static) value
    pub update_static: bool,
    pub event_mode: EventMode,
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            update_static: true,
            event_mode: EventMode::Detect,
        }
    }
}

impl UpdateOptions {
    pub const fn new(update_static: bool, event_mode: EventMode) -> Self {
        Self {
            update_static,
            event_mode,
        }
    }

    /// Update the static value without recording an event.
    pub const fn no_event() -> Self {
        Self::new(true, EventMode::Suppress)
    }

    /// Update the static value and always record an event.
    pub const fn force_event() -> Self {
        Self::new(true, EventMode::Force)
    }
}

/// A configured point.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// Class events are recorded in, `None` for static-only points
    pub class: Option<EventClass>,
    pub config: PointConfig,
    /// Current value
    pub value: Measurement,
    /// Value last recorded as an event, the reference for change detection
    reported: Measurement,
}

impl Point {
    fn new(class: Option<EventClass>, config: PointConfig, index: u16) -> Self {
        let value = Measurement::initial(config.point_type(), index);
        Self {
            class,
            config,
            reported: value.clone(),
            value,
        }
    }

    /// Check if `new` differs from the last reported value under the
    /// point's comparison policy.
    fn is_change(&self, new: &Measurement) -> bool {
        if self.reported.flags() != new.flags() {
            return true;
        }

        match (&self.reported, new, &self.config) {
            (Measurement::BinaryInput(old), Measurement::BinaryInput(new), _) => {
                old.value != new.value
            }
            (Measurement::DoubleBitBinaryInput(old), Measurement::DoubleBitBinaryInput(new), _) => {
                old.value != new.value
            }
            (Measurement::BinaryOutputStatus(old), Measurement::BinaryOutputStatus(new), _) => {
                old.value != new.value
            }
            (Measurement::Counter(old), Measurement::Counter(new), PointConfig::Counter(c)) => {
                exceeds_counter_deadband(old.value, new.value, c.deadband)
            }
            (
                Measurement::FrozenCounter(old),
                Measurement::FrozenCounter(new),
                PointConfig::FrozenCounter(c),
            ) => exceeds_counter_deadband(old.value, new.value, c.deadband),
            (
                Measurement::AnalogInput(old),
                Measurement::AnalogInput(new),
                PointConfig::AnalogInput(c),
            ) => exceeds_analog_deadband(old.value, new.value, c.deadband),
            (
                Measurement::AnalogOutputStatus(old),
                Measurement::AnalogOutputStatus(new),
                PointConfig::AnalogOutputStatus(c),
            ) => exceeds_analog_deadband(old.value, new.value, c.deadband),
            (Measurement::OctetString(old), Measurement::OctetString(new), _) => {
                old.value != new.value
            }
            _ => true,
        }
    }
}

fn exceeds_counter_deadband(old: u32, new: u32, deadband: u32) -> bool {
    let diff = new.wrapping_sub(old).min(old.wrapping_sub(new));
    diff > deadband
}

fn exceeds_analog_deadband(old: f64, new: f64, deadband: f64) -> bool {
    match (old.is_nan(), new.is_nan()) {
        (true, true) => false,
        (false, false) => (new - old).abs() > deadband,
        _ => true,
    }
}

/// Points and events of one outstation.
#[derive(Debug, Clone)]
pub struct Database {
    points: BTreeMap<(PointType, u16), Point>,
    events: EventBuffer,
}

macro_rules! add_point {
    ($(#[$doc:meta])* $fn_name:ident, $config:ident) => {
        $(#[$doc])*
        pub fn $fn_name(
            &mut self,
            index: u16,
            class: Option<EventClass>,
            config: $config,
        ) -> Result<()> {
            self.add(index, class, config)
        }
    };
}

macro_rules! get_point {
    ($(#[$doc:meta])* $fn_name:ident, $variant:ident, $ty:ident) => {
        $(#[$doc])*
        pub fn $fn_name(&self, index: u16) -> Result<$ty> {
            match self.get(PointType::$variant, index)? {
                Measurement::$variant(value) => Ok(value),
                _ => Err(Dnp3Error::UnknownIndex {
                    point_type: PointType::$variant,
                    index,
                }),
            }
        }
    };
}

impl Database {
    /// Create an empty database.
    pub fn new(config: EventBufferConfig) -> Result<Self> {
        Ok(Self {
            points: BTreeMap::new(),
            events: EventBuffer::new(config)?,
        })
    }

    /// Add a point of the type of `config`.
    ///
    /// The point holds its initial value (RESTART flag, no time) until updated.
    pub fn add(
        &mut self,
        index: u16,
        class: Option<EventClass>,
        config: impl Into<PointConfig>,
    ) -> Result<()> {
        let config = config.into();
        let point_type = config.point_type();

        if self.points.contains_key(&(point_type, index)) {
            return Err(Dnp3Error::DuplicateIndex { point_type, index });
        }

        self.points
            .insert((point_type, index), Point::new(class, config, index));
        debug!("Added {} {} in {:?}", point_type, index, class);
        Ok(())
    }

    add_point!(
        /// Add a binary input.
        add_binary_input,
        BinaryInputConfig
    );
    add_point!(
        /// Add a double-bit binary input.
        add_double_bit_binary_input,
        DoubleBitBinaryInputConfig
    );
    add_point!(
        /// Add a binary output status.
        add_binary_output_status,
        BinaryOutputStatusConfig
    );
    add_point!(
        /// Add a counter.
        add_counter,
        CounterConfig
    );
    add_point!(
        /// Add a frozen counter.
        add_frozen_counter,
        FrozenCounterConfig
    );
    add_point!(
        /// Add an analog input.
        add_analog_input,
        AnalogInputConfig
    );
    add_point!(
        /// Add an analog output status.
        add_analog_output_status,
        AnalogOutputStatusConfig
    );
    add_point!(
        /// Add an octet string.
        add_octet_string,
        OctetStringConfig
    );

    /// Remove a point. Events it already recorded stay buffered.
    pub fn remove(&mut self, point_type: PointType, index: u16) -> bool {
        self.points.remove(&(point_type, index)).is_some()
    }

    /// Update a point.
    ///
    /// Returns `true` if an event was recorded.
    pub fn update(
        &mut self,
        measurement: impl Into<Measurement>,
        options: UpdateOptions,
    ) -> Result<bool> {
        let measurement = measurement.into();
        let point_type = measurement.point_type();
        let index = measurement.index();

        if let Measurement::OctetString(value) = &measurement {
            if value.value.is_empty() || value.value.len() > OctetString::MAX_LENGTH {
                return Err(Dnp3Error::invalid_value_static(
                    "Octet string length must be 1 to 255 bytes",
                ));
            }
        }

        let point = self
            .points
            .get_mut(&(point_type, index))
            .ok_or(Dnp3Error::UnknownIndex { point_type, index })?;

        let is_event = match options.event_mode {
            EventMode::Detect => point.is_change(&measurement),
            EventMode::Force => true,
            EventMode::Suppress => false,
        };

        if options.update_static {
            point.value = measurement.clone();
        }

        let class = match point.class {
            Some(class) if is_event => class,
            _ => return Ok(false),
        };

        let variation = point.config.event_variation();
        point.reported = measurement.clone();
        Ok(self.events.push(class, variation, measurement).is_some())
    }

    /// Current value of a point.
    pub fn get(&self, point_type: PointType, index: u16) -> Result<Measurement> {
        self.point(point_type, index)
            .map(|p| p.value.clone())
            .ok_or(Dnp3Error::UnknownIndex { point_type, index })
    }

    get_point!(
        /// Current value of a binary input.
        get_binary_input,
        BinaryInput,
        BinaryInput
    );
    get_point!(
        /// Current value of a double-bit binary input.
        get_double_bit_binary_input,
        DoubleBitBinaryInput,
        DoubleBitBinaryInput
    );
    get_point!(
        /// Current value of a binary output status.
        get_binary_output_status,
        BinaryOutputStatus,
        BinaryOutputStatus
    );
    get_point!(
        /// Current value of a counter.
        get_counter,
        Counter,
        Counter
    );
    get_point!(
        /// Current value of a frozen counter.
        get_frozen_counter,
        FrozenCounter,
        FrozenCounter
    );
    get_point!(
        /// Current value of an analog input.
        get_analog_input,
        AnalogInput,
        AnalogInput
    );
    get_point!(
        /// Current value of an analog output status.
        get_analog_output_status,
        AnalogOutputStatus,
        AnalogOutputStatus
    );
    get_point!(
        /// Current value of an octet string.
        get_octet_string,
        OctetString,
        OctetString
    );

    /// A configured point.
    pub fn point(&self, point_type: PointType, index: u16) -> Option<&Point> {
        self.points.get(&(point_type, index))
    }

    /// Check if a point is configured.
    pub fn contains(&self, point_type: PointType, index: u16) -> bool {
        self.points.contains_key(&(point_type, index))
    }

    /// Points of one type in index order.
    pub fn points(&self, point_type: PointType) -> impl Iterator<Item = (u16, &Point)> {
        self.points_in_range(point_type, 0..=u16::MAX)
    }

    /// Points of one type within an inclusive index range, in index order.
    pub fn points_in_range(
        &self,
        point_type: PointType,
        range: RangeInclusive<u16>,
    ) -> impl Iterator<Item = (u16, &Point)> {
        let (start, end) = range.into_inner();
        self.points
            .range((point_type, start)..=(point_type, end))
            .map(|((_, index), point)| (*index, point))
    }

    /// Number of points of one type.
    pub fn count(&self, point_type: PointType) -> usize {
        self.points(point_type).count()
    }

    /// Total number of configured points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Buffered events.
    pub fn events(&self) -> &EventBuffer {
        &self.events
    }

    pub(crate) fn events_mut(&mut self) -> &mut EventBuffer {
        &mut self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;
    use crate::types::{DoubleBit, EventClasses, Flags, Time};

    fn database() -> Database {
        Database::new(EventBufferConfig::default()).unwrap()
    }

    #[test]
    fn test_add_duplicate_index() {
        let mut db = database();
        db.add_binary_input(3, Some(EventClass::Class1), Default::default())
            .unwrap();
        let err = db
            .add_binary_input(3, None, Default::default())
            .unwrap_err();
        assert!(matches!(
            err,
            Dnp3Error::DuplicateIndex {
                point_type: PointType::BinaryInput,
                index: 3
            }
        ));
        // same index, other type
        db.add_counter(3, None, Default::default()).unwrap();
    }

    #[test]
    fn test_initial_value_has_restart_flag() {
        let mut db = database();
        db.add_analog_input(0, None, Default::default()).unwrap();
        let value = db.get_analog_input(0).unwrap();
        assert_eq!(value.flags, Flags::RESTART);
        assert_eq!(value.time, None);
    }

    #[test]
    fn test_update_unknown_index() {
        let mut db = database();
        let err = db
            .update(
                BinaryInput::without_time(9, true, Flags::ONLINE),
                UpdateOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Dnp3Error::UnknownIndex { index: 9, .. }));
        assert!(matches!(
            db.get(PointType::Counter, 0),
            Err(Dnp3Error::UnknownIndex { .. })
        ));
    }

    #[test]
    fn test_update_detects_change() {
        let mut db = database();
        db.add_binary_input(0, Some(EventClass::Class1), Default::default())
            .unwrap();

        let value = BinaryInput::without_time(0, true, Flags::ONLINE);
        assert!(db.update(value, UpdateOptions::default()).unwrap());
        // same value and flags
        assert!(!db.update(value, UpdateOptions::default()).unwrap());
        // flags change only
        let value = BinaryInput::without_time(0, true, Flags::ONLINE | Flags::LOCAL_FORCED);
        assert!(db.update(value, UpdateOptions::default()).unwrap());

        assert_eq!(db.events().len(), 2);
        assert_eq!(db.get_binary_input(0).unwrap(), value);
    }

    #[test]
    fn test_class1_scan_reports_single_changed_input() {
        let mut db = database();
        for index in 0..10 {
            db.add_binary_input(index, Some(EventClass::Class1), Default::default())
                .unwrap();
        }
        db.update(
            BinaryInput::without_time(7, true, Flags::ONLINE),
            UpdateOptions::default(),
        )
        .unwrap();

        let selection = db
            .events()
            .select_by_class(EventClasses::single(EventClass::Class1));
        let events: Vec<&Event> = db.events().selected(&selection).collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].point_type(), PointType::BinaryInput);
        assert_eq!(events[0].measurement.index(), 7);
        assert!(matches!(
            events[0].measurement,
            Measurement::BinaryInput(BinaryInput { value: true, .. })
        ));
    }

    #[test]
    fn test_update_event_modes() {
        let mut db = database();
        db.add_double_bit_binary_input(0, Some(EventClass::Class2), Default::default())
            .unwrap();

        let value =
            DoubleBitBinaryInput::without_time(0, DoubleBit::DeterminedOn, Flags::ONLINE);
        assert!(!db.update(value, UpdateOptions::no_event()).unwrap());
        assert_eq!(db.events().len(), 0);
        assert_eq!(db.get_double_bit_binary_input(0).unwrap(), value);

        assert!(db.update(value, UpdateOptions::force_event()).unwrap());
        assert_eq!(db.events().class_count(EventClass::Class2), 1);
    }

    #[test]
    fn test_update_without_static() {
        let mut db = database();
        db.add_binary_output_status(0, Some(EventClass::Class1), Default::default())
            .unwrap();

        let value = BinaryOutputStatus::without_time(0, true, Flags::ONLINE);
        assert!(db
            .update(value, UpdateOptions::new(false, EventMode::Detect))
            .unwrap());
        assert_eq!(
            db.get_binary_output_status(0).unwrap().flags,
            Flags::RESTART
        );
    }

    #[test]
    fn test_point_without_class_never_records() {
        let mut db = database();
        db.add_counter(0, None, Default::default()).unwrap();
        let value = Counter::without_time(0, 100, Flags::ONLINE);
        assert!(!db.update(value, UpdateOptions::force_event()).unwrap());
        assert!(db.events().is_empty());
        assert_eq!(db.get_counter(0).unwrap().value, 100);
    }

    #[test]
    fn test_counter_deadband() {
        let mut db = database();
        let config = CounterConfig {
            deadband: 5,
            ..Default::default()
        };
        db.add_counter(0, Some(EventClass::Class1), config).unwrap();

        assert!(db
            .update(
                Counter::without_time(0, 10, Flags::ONLINE),
                UpdateOptions::default()
            )
            .unwrap());
        assert!(!db
            .update(
                Counter::without_time(0, 15, Flags::ONLINE),
                UpdateOptions::default()
            )
            .unwrap());
        // compared to the last reported value, not the last static value
        assert!(db
            .update(
                Counter::without_time(0, 16, Flags::ONLINE),
                UpdateOptions::default()
            )
            .unwrap());
        // wrapping difference
        assert!(!exceeds_counter_deadband(u32::MAX - 1, 2, 5));
        assert!(exceeds_counter_deadband(u32::MAX - 10, 2, 5));
    }

    #[test]
    fn test_analog_deadband() {
        let mut db = database();
        let config = AnalogInputConfig {
            deadband: 0.5,
            ..Default::default()
        };
        db.add_analog_input(0, Some(EventClass::Class3), config)
            .unwrap();

        let update = |db: &mut Database, value: f64| {
            db.update(
                AnalogInput::without_time(0, value, Flags::ONLINE),
                UpdateOptions::default(),
            )
            .unwrap()
        };
        assert!(update(&mut db, 1.0));
        assert!(!update(&mut db, 1.4));
        assert!(update(&mut db, 1.6));
    }

    #[test]
    fn test_analog_nan_rule() {
        assert!(!exceeds_analog_deadband(f64::NAN, f64::NAN, 0.0));
        assert!(exceeds_analog_deadband(1.0, f64::NAN, 0.0));
        assert!(exceeds_analog_deadband(f64::NAN, 1.0, 100.0));
        assert!(!exceeds_analog_deadband(2.0, 2.0, 0.0));
        assert!(exceeds_analog_deadband(2.0, 2.000001, 0.0));
        assert!(!exceeds_analog_deadband(f64::INFINITY, f64::INFINITY, 0.0));
    }

    #[test]
    fn test_octet_string_length() {
        let mut db = database();
        db.add_octet_string(0, Some(EventClass::Class1), OctetStringConfig)
            .unwrap();

        assert!(db
            .update(OctetString::new(0, vec![]), UpdateOptions::default())
            .is_err());
        assert!(db
            .update(OctetString::new(0, vec![0u8; 256]), UpdateOptions::default())
            .is_err());
        assert!(db
            .update(OctetString::new(0, vec![0x41; 255]), UpdateOptions::default())
            .unwrap());
        assert_eq!(db.get_octet_string(0).unwrap().value.len(), 255);
    }

    #[test]
    fn test_event_snapshot_is_immutable() {
        let mut db = database();
        db.add_analog_output_status(0, Some(EventClass::Class1), Default::default())
            .unwrap();
        let first = AnalogOutputStatus::new(0, 1.0, Flags::ONLINE, Time::synchronized(10));
        db.update(first, UpdateOptions::default()).unwrap();
        db.update(
            AnalogOutputStatus::new(0, 2.0, Flags::ONLINE, Time::synchronized(20)),
            UpdateOptions::default(),
        )
        .unwrap();

        let selection = db.events().select_by_class(EventClasses::all());
        let events: Vec<_> = db.events().selected(&selection).collect();
        assert_eq!(events[0].measurement, Measurement::from(first));
        assert_eq!(events[0].variation, crate::types::Variation::Group42Var1);
    }

    #[test]
    fn test_points_in_range_and_remove() {
        let mut db = database();
        for index in [0, 2, 5, 9] {
            db.add_counter(index, None, Default::default()).unwrap();
        }
        db.add_frozen_counter(3, None, Default::default()).unwrap();

        let indices: Vec<u16> = db
            .points_in_range(PointType::Counter, 2..=5)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(indices, vec![2, 5]);
        assert_eq!(db.count(PointType::Counter), 4);

        assert!(db.remove(PointType::Counter, 5));
        assert!(!db.remove(PointType::Counter, 5));
        assert_eq!(db.count(PointType::Counter), 3);
        assert_eq!(db.len(), 4);
    }
}
