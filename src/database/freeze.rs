//! Counter freeze operations.
//!
//! Freezing copies the value, flags and time of a counter into the frozen
//! counter at the same index. Counters without a frozen counter are skipped.

use tracing::{debug, warn};

use super::{Database, UpdateOptions};
use crate::types::{Counter, EventClasses, FrozenCounter, Measurement, PointType};

/// Kind of freeze requested by the master.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeType {
    /// Copy counters into frozen counters
    ImmediateFreeze,
    /// Copy counters into frozen counters, then reset the counters to zero
    FreezeAndClear,
}

/// Outcome of a freeze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreezeResult {
    Success,
    /// No counter exists in the requested range
    OutOfRange,
    /// Request parameters are not valid
    ParameterError,
    /// The outstation does not support the freeze
    NotSupported,
}

impl Database {
    /// Freeze every counter.
    pub fn freeze_all(&mut self, freeze_type: FreezeType) -> FreezeResult {
        let indices: Vec<u16> = self.points(PointType::Counter).map(|(i, _)| i).collect();
        self.freeze_indices(&indices, freeze_type);
        FreezeResult::Success
    }

    /// Freeze the counters assigned to the given classes.
    ///
    /// Counters without an event class are only frozen when all classes are
    /// requested.
    pub fn freeze_classes(&mut self, freeze_type: FreezeType, classes: EventClasses) -> FreezeResult {
        let indices: Vec<u16> = self
            .points(PointType::Counter)
            .filter(|(_, point)| match point.class {
                Some(class) => classes.contains(class),
                None => classes.is_all(),
            })
            .map(|(i, _)| i)
            .collect();
        self.freeze_indices(&indices, freeze_type);
        FreezeResult::Success
    }

    /// Freeze the counters in the inclusive range `start..=stop`.
    pub fn freeze_range(&mut self, start: u16, stop: u16, freeze_type: FreezeType) -> FreezeResult {
        if start > stop {
            return FreezeResult::Success;
        }

        let indices: Vec<u16> = self
            .points_in_range(PointType::Counter, start..=stop)
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            return FreezeResult::OutOfRange;
        }

        self.freeze_indices(&indices, freeze_type);
        FreezeResult::Success
    }

    fn freeze_indices(&mut self, indices: &[u16], freeze_type: FreezeType) {
        let mut frozen = 0usize;
        for &index in indices {
            let counter = match self.get(PointType::Counter, index) {
                Ok(Measurement::Counter(counter)) => counter,
                _ => continue,
            };

            if self.contains(PointType::FrozenCounter, index) {
                let value = FrozenCounter {
                    index,
                    value: counter.value,
                    flags: counter.flags,
                    time: counter.time,
                };
                // index is known to exist
                if self.update(value, UpdateOptions::default()).is_ok() {
                    frozen += 1;
                }
            }

            if freeze_type == FreezeType::FreezeAndClear {
                let cleared = Counter { value: 0, ..counter };
                if let Err(err) = self.update(cleared, UpdateOptions::default()) {
                    warn!("Counter {} not cleared: {}", index, err);
                }
            }
        }
        debug!("{:?}: {} frozen counters updated", freeze_type, frozen);
    }
}
