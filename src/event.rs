//! Classified event buffer.
//!
//! Events are kept in a single queue ordered by event id (insertion order).
//! Capacity is enforced per point type and event class. Reading events never
//! removes them; only a confirm of the fragment that carried them does.

use std::collections::VecDeque;

use tracing::warn;

use crate::error::{Dnp3Error, Result};
use crate::types::{EventClass, EventClasses, Measurement, PointType, Variation};

/// Default number of events buffered per point type and class.
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// What happens when an event arrives for a full (type, class) queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Evict the oldest event of the same type and class
    #[default]
    DropOldest,
    /// Discard the new event
    DropNewest,
}

/// Event buffer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBufferConfig {
    /// Capacity per event class, indexed by point type ordinal
    pub capacities: [usize; 8],
    /// Overflow behavior
    pub overflow_policy: OverflowPolicy,
}

impl Default for EventBufferConfig {
    fn default() -> Self {
        Self::all_types(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventBufferConfig {
    /// Same capacity for every point type.
    pub fn all_types(capacity: usize) -> Self {
        Self {
            capacities: [capacity; 8],
            overflow_policy: OverflowPolicy::default(),
        }
    }

    /// Set the capacity of one point type.
    pub fn capacity(mut self, point_type: PointType, capacity: usize) -> Self {
        self.capacities[point_type.ordinal()] = capacity;
        self
    }

    /// Set the overflow policy.
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Capacity of one point type.
    pub fn capacity_of(&self, point_type: PointType) -> usize {
        self.capacities[point_type.ordinal()]
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        for point_type in PointType::ALL {
            if self.capacity_of(point_type) == 0 {
                return Err(Dnp3Error::invalid_config(format!(
                    "Event capacity for {} must be greater than zero",
                    point_type
                )));
            }
        }
        Ok(())
    }
}

/// An immutable snapshot of a point change.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Monotonically increasing id
    pub id: u64,
    pub class: EventClass,
    /// Event variation the point is configured with
    pub variation: Variation,
    pub measurement: Measurement,
}

impl Event {
    #[inline]
    pub fn point_type(&self) -> PointType {
        self.measurement.point_type()
    }
}

/// Ids of events carried by one response fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventSelection {
    ids: Vec<u64>,
}

impl EventSelection {
    /// An empty selection.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in insertion order.
    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.binary_search(&id).is_ok()
    }

    /// Add an id; ids must be pushed in increasing order.
    pub(crate) fn push(&mut self, id: u64) {
        debug_assert!(self.ids.last().map_or(true, |last| *last < id));
        self.ids.push(id);
    }
}

/// Bounded, classified event storage.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    config: EventBufferConfig,
    events: VecDeque<Event>,
    counts: [[usize; 3]; 8],
    next_id: u64,
    overflow: bool,
}

impl EventBuffer {
    /// Create an event buffer, rejecting zero capacities.
    pub fn new(config: EventBufferConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            events: VecDeque::new(),
            counts: [[0; 3]; 8],
            next_id: 0,
            overflow: false,
        })
    }

    pub fn config(&self) -> &EventBufferConfig {
        &self.config
    }

    /// Append an event. Returns the id assigned to it, or `None` if it was
    /// discarded under `OverflowPolicy::DropNewest`.
    pub fn push(
        &mut self,
        class: EventClass,
        variation: Variation,
        measurement: Measurement,
    ) -> Option<u64> {
        let point_type = measurement.point_type();
        let capacity = self.config.capacity_of(point_type);

        if self.count(point_type, class) >= capacity {
            self.overflow = true;
            match self.config.overflow_policy {
                OverflowPolicy::DropNewest => {
                    warn!(
                        "Event buffer full for {} {:?}, discarding new event",
                        point_type, class
                    );
                    return None;
                }
                OverflowPolicy::DropOldest => {
                    warn!(
                        "Event buffer full for {} {:?}, discarding oldest event",
                        point_type, class
                    );
                    if let Some(pos) = self
                        .events
                        .iter()
                        .position(|e| e.class == class && e.point_type() == point_type)
                    {
                        self.events.remove(pos);
                        self.counts[point_type.ordinal()][class.ordinal()] -= 1;
                    }
                }
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.counts[point_type.ordinal()][class.ordinal()] += 1;
        self.events.push_back(Event {
            id,
            class,
            variation,
            measurement,
        });
        Some(id)
    }

    /// All buffered events in the requested classes.
    pub fn select_by_class(&self, classes: EventClasses) -> EventSelection {
        self.select(|e| classes.contains(e.class), usize::MAX)
    }

    /// At most `limit` buffered events in the requested classes.
    pub fn select_by_class_limited(&self, classes: EventClasses, limit: usize) -> EventSelection {
        self.select(|e| classes.contains(e.class), limit)
    }

    /// All buffered events of one point type, any class.
    pub fn select_by_type(&self, point_type: PointType) -> EventSelection {
        self.select(|e| e.point_type() == point_type, usize::MAX)
    }

    /// At most `limit` buffered events of one point type.
    pub fn select_by_type_limited(&self, point_type: PointType, limit: usize) -> EventSelection {
        self.select(|e| e.point_type() == point_type, limit)
    }

    fn select(&self, filter: impl Fn(&Event) -> bool, limit: usize) -> EventSelection {
        let mut selection = EventSelection::empty();
        for event in self.events.iter().filter(|e| filter(e)).take(limit) {
            selection.push(event.id);
        }
        selection
    }

    /// Look up a buffered event by id.
    pub fn get(&self, id: u64) -> Option<&Event> {
        self.events
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .and_then(|pos| self.events.get(pos))
    }

    /// Buffered events of a selection, skipping ones already removed.
    pub fn selected<'a>(
        &'a self,
        selection: &'a EventSelection,
    ) -> impl Iterator<Item = &'a Event> + 'a {
        selection.ids().iter().filter_map(move |id| self.get(*id))
    }

    /// Remove exactly the selected events that are still buffered.
    ///
    /// Returns the number of events removed. Removing any event clears the
    /// overflow indication.
    pub fn confirm(&mut self, selection: &EventSelection) -> usize {
        if selection.is_empty() {
            return 0;
        }

        let counts = &mut self.counts;
        let before = self.events.len();
        self.events.retain(|e| {
            if selection.contains(e.id) {
                counts[e.point_type().ordinal()][e.class.ordinal()] -= 1;
                false
            } else {
                true
            }
        });

        let removed = before - self.events.len();
        if removed > 0 {
            self.overflow = false;
        }
        removed
    }

    /// Number of buffered events of one type and class.
    pub fn count(&self, point_type: PointType, class: EventClass) -> usize {
        self.counts[point_type.ordinal()][class.ordinal()]
    }

    /// Number of buffered events in one class.
    pub fn class_count(&self, class: EventClass) -> usize {
        self.counts.iter().map(|c| c[class.ordinal()]).sum()
    }

    /// Classes with at least one buffered event.
    pub fn classes_with_events(&self) -> EventClasses {
        EventClass::ALL
            .iter()
            .fold(EventClasses::none(), |acc, class| {
                acc.with(*class, self.class_count(*class) > 0)
            })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Check if an event was lost since the last confirm.
    pub fn is_overflown(&self) -> bool {
        self.overflow
    }

    /// Id the next pushed event will receive.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }
}
