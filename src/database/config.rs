//! Per-point configuration.
//!
//! Each point type selects the variation it reports in static (class 0 and
//! variation 0) reads and the variation its events are recorded with.
//! Counters and analogs also carry a deadband.

use crate::types::{PointType, Variation};

macro_rules! variation_choice {
    ($(#[$doc:meta])* $name:ident { $default:ident $(, $other:ident)* }) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub enum $name {
            #[default]
            $default,
            $($other,)*
        }

        impl $name {
            /// Object variation on the wire.
            pub const fn variation(self) -> Variation {
                match self {
                    Self::$default => Variation::$default,
                    $(Self::$other => Variation::$other,)*
                }
            }
        }
    };
}

variation_choice!(
    /// Static binary input variation.
    StaticBinaryInputVariation { Group1Var2 }
);
variation_choice!(
    /// Binary input event variation.
    EventBinaryInputVariation { Group2Var1, Group2Var2 }
);
variation_choice!(
    /// Static double-bit binary input variation.
    StaticDoubleBitBinaryInputVariation { Group3Var2 }
);
variation_choice!(
    /// Double-bit binary input event variation.
    EventDoubleBitBinaryInputVariation { Group4Var1, Group4Var2 }
);
variation_choice!(
    /// Static binary output status variation.
    StaticBinaryOutputStatusVariation { Group10Var2 }
);
variation_choice!(
    /// Binary output status event variation.
    EventBinaryOutputStatusVariation { Group11Var1, Group11Var2 }
);
variation_choice!(
    /// Static counter variation.
    StaticCounterVariation { Group20Var1, Group20Var5 }
);
variation_choice!(
    /// Counter event variation.
    EventCounterVariation { Group22Var1, Group22Var5 }
);
variation_choice!(
    /// Static frozen counter variation.
    StaticFrozenCounterVariation { Group21Var1, Group21Var9 }
);
variation_choice!(
    /// Frozen counter event variation.
    EventFrozenCounterVariation { Group23Var1, Group23Var5 }
);
variation_choice!(
    /// Static analog input variation.
    StaticAnalogInputVariation { Group30Var1, Group30Var3, Group30Var5 }
);
variation_choice!(
    /// Analog input event variation.
    EventAnalogInputVariation { Group32Var1, Group32Var3, Group32Var5, Group32Var7 }
);
variation_choice!(
    /// Static analog output status variation.
    StaticAnalogOutputStatusVariation { Group40Var1, Group40Var3 }
);
variation_choice!(
    /// Analog output status event variation.
    EventAnalogOutputStatusVariation { Group42Var1, Group42Var3, Group42Var5, Group42Var7 }
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinaryInputConfig {
    pub static_variation: StaticBinaryInputVariation,
    pub event_variation: EventBinaryInputVariation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DoubleBitBinaryInputConfig {
    pub static_variation: StaticDoubleBitBinaryInputVariation,
    pub event_variation: EventDoubleBitBinaryInputVariation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BinaryOutputStatusConfig {
    pub static_variation: StaticBinaryOutputStatusVariation,
    pub event_variation: EventBinaryOutputStatusVariation,
}

/// Counter configuration. Changes of at most `deadband` do not produce events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterConfig {
    pub static_variation: StaticCounterVariation,
    pub event_variation: EventCounterVariation,
    pub deadband: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrozenCounterConfig {
    pub static_variation: StaticFrozenCounterVariation,
    pub event_variation: EventFrozenCounterVariation,
    pub deadband: u32,
}

/// Analog input configuration. A deadband of 0.0 reports every change.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalogInputConfig {
    pub static_variation: StaticAnalogInputVariation,
    pub event_variation: EventAnalogInputVariation,
    pub deadband: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AnalogOutputStatusConfig {
    pub static_variation: StaticAnalogOutputStatusVariation,
    pub event_variation: EventAnalogOutputStatusVariation,
    pub deadband: f64,
}

/// Octet strings report in g110 / g111 with the variation equal to their length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OctetStringConfig;

/// Configuration of a point of any type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointConfig {
    BinaryInput(BinaryInputConfig),
    DoubleBitBinaryInput(DoubleBitBinaryInputConfig),
    BinaryOutputStatus(BinaryOutputStatusConfig),
    Counter(CounterConfig),
    FrozenCounter(FrozenCounterConfig),
    AnalogInput(AnalogInputConfig),
    AnalogOutputStatus(AnalogOutputStatusConfig),
    OctetString(OctetStringConfig),
}

impl PointConfig {
    /// Default configuration of a point type.
    pub fn default_for(point_type: PointType) -> Self {
        match point_type {
            PointType::BinaryInput => Self::BinaryInput(Default::default()),
            PointType::DoubleBitBinaryInput => Self::DoubleBitBinaryInput(Default::default()),
            PointType::BinaryOutputStatus => Self::BinaryOutputStatus(Default::default()),
            PointType::Counter => Self::Counter(Default::default()),
            PointType::FrozenCounter => Self::FrozenCounter(Default::default()),
            PointType::AnalogInput => Self::AnalogInput(Default::default()),
            PointType::AnalogOutputStatus => Self::AnalogOutputStatus(Default::default()),
            PointType::OctetString => Self::OctetString(OctetStringConfig),
        }
    }

    pub const fn point_type(&self) -> PointType {
        match self {
            Self::BinaryInput(_) => PointType::BinaryInput,
            Self::DoubleBitBinaryInput(_) => PointType::DoubleBitBinaryInput,
            Self::BinaryOutputStatus(_) => PointType::BinaryOutputStatus,
            Self::Counter(_) => PointType::Counter,
            Self::FrozenCounter(_) => PointType::FrozenCounter,
            Self::AnalogInput(_) => PointType::AnalogInput,
            Self::AnalogOutputStatus(_) => PointType::AnalogOutputStatus,
            Self::OctetString(_) => PointType::OctetString,
        }
    }

    /// Variation used for class 0 and variation 0 reads.
    ///
    /// Octet strings return `Group110(0)`; the writer substitutes the length.
    pub const fn static_variation(&self) -> Variation {
        match self {
            Self::BinaryInput(c) => c.static_variation.variation(),
            Self::DoubleBitBinaryInput(c) => c.static_variation.variation(),
            Self::BinaryOutputStatus(c) => c.static_variation.variation(),
            Self::Counter(c) => c.static_variation.variation(),
            Self::FrozenCounter(c) => c.static_variation.variation(),
            Self::AnalogInput(c) => c.static_variation.variation(),
            Self::AnalogOutputStatus(c) => c.static_variation.variation(),
            Self::OctetString(_) => Variation::Group110(0),
        }
    }

    /// Variation events of the point are recorded with.
    ///
    /// Octet strings return `Group111(0)`; the writer substitutes the length.
    pub const fn event_variation(&self) -> Variation {
        match self {
            Self::BinaryInput(c) => c.event_variation.variation(),
            Self::DoubleBitBinaryInput(c) => c.event_variation.variation(),
            Self::BinaryOutputStatus(c) => c.event_variation.variation(),
            Self::Counter(c) => c.event_variation.variation(),
            Self::FrozenCounter(c) => c.event_variation.variation(),
            Self::AnalogInput(c) => c.event_variation.variation(),
            Self::AnalogOutputStatus(c) => c.event_variation.variation(),
            Self::OctetString(_) => Variation::Group111(0),
        }
    }
}

macro_rules! point_config_from {
    ($($variant:ident => $name:ident),* $(,)?) => {
        $(
            impl From<$name> for PointConfig {
                fn from(config: $name) -> Self {
                    Self::$variant(config)
                }
            }
        )*
    };
}

point_config_from!(
    BinaryInput => BinaryInputConfig,
    DoubleBitBinaryInput => DoubleBitBinaryInputConfig,
    BinaryOutputStatus => BinaryOutputStatusConfig,
    Counter => CounterConfig,
    FrozenCounter => FrozenCounterConfig,
    AnalogInput => AnalogInputConfig,
    AnalogOutputStatus => AnalogOutputStatusConfig,
    OctetString => OctetStringConfig,
);
