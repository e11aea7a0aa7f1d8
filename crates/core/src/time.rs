//! Checkpoint time metadata
//!
//! A `TimeSnapshot` is the scalar state stamped on every checkpoint: step
//! index, time value, time-step and previous time-step. A snapshot is valid
//! iff its index is positive; an invalid snapshot is the protocol's signal
//! for "no usable checkpoint here".

use crate::types::{Label, Scalar};

/// Names of the four time attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeAttribute {
    /// Step index
    Index,
    /// Time value
    Value,
    /// Time-step
    DeltaT,
    /// Previous time-step
    DeltaT0,
}

impl TimeAttribute {
    /// All time attributes, in storage order
    pub const ALL: [TimeAttribute; 4] = [
        TimeAttribute::Index,
        TimeAttribute::Value,
        TimeAttribute::DeltaT,
        TimeAttribute::DeltaT0,
    ];

    /// Attribute name within the time namespace
    pub fn name(self) -> &'static str {
        match self {
            TimeAttribute::Index => "index",
            TimeAttribute::Value => "value",
            TimeAttribute::DeltaT => "deltaT",
            TimeAttribute::DeltaT0 => "deltaT0",
        }
    }
}

/// Scalar checkpoint metadata
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeSnapshot {
    index: Label,
    value: Scalar,
    delta_t: Scalar,
    delta_t0: Scalar,
}

impl TimeSnapshot {
    /// Construct from components
    pub fn new(index: Label, value: Scalar, delta_t: Scalar, delta_t0: Scalar) -> Self {
        TimeSnapshot {
            index,
            value,
            delta_t,
            delta_t0,
        }
    }

    /// An invalid snapshot (index 0)
    pub fn invalid() -> Self {
        TimeSnapshot::default()
    }

    /// Step index
    pub fn index(&self) -> Label {
        self.index
    }

    /// Time value
    pub fn value(&self) -> Scalar {
        self.value
    }

    /// Time-step
    pub fn delta_t(&self) -> Scalar {
        self.delta_t
    }

    /// Previous time-step
    pub fn delta_t0(&self) -> Scalar {
        self.delta_t0
    }

    /// Has valid content
    pub fn is_valid(&self) -> bool {
        self.index > 0
    }

    /// Instance name for this time (shortest round-trip form of the value)
    pub fn time_name(&self) -> String {
        time_name(self.value)
    }
}

/// Instance name for a time value
///
/// Uses the shortest representation that parses back to the same value,
/// so `0.1` is named `"0.1"` and `2.0` is named `"2"`.
pub fn time_name(value: Scalar) -> String {
    format!("{}", value)
}
