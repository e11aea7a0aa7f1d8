//! Time snapshot persistence
//!
//! Four attributes under the time namespace. Reading is lenient: absent
//! values read as zero, so a container without time attributes yields an
//! invalid snapshot rather than an error.

use meshstate_core::naming::time_attribute;
use meshstate_core::{TimeAttribute, TimeSnapshot};
use meshstate_storage::{AttributeStore, OutputEngine};
use tracing::debug;

/// Record `snapshot` in the engine's attributes
pub fn write_time(engine: &mut OutputEngine, snapshot: &TimeSnapshot) {
    engine.put_attribute(time_attribute(TimeAttribute::Index.name()), snapshot.index());
    engine.put_attribute(time_attribute(TimeAttribute::Value.name()), snapshot.value());
    engine.put_attribute(time_attribute(TimeAttribute::DeltaT.name()), snapshot.delta_t());
    engine.put_attribute(time_attribute(TimeAttribute::DeltaT0.name()), snapshot.delta_t0());
}

/// Read the time snapshot from `attributes`
pub fn read_time(attributes: &AttributeStore) -> TimeSnapshot {
    let real = |attr: TimeAttribute| -> f64 {
        attributes
            .attribute_if_present::<f64>(&time_attribute(attr.name()))
            .unwrap_or(0.0)
    };
    let index = attributes
        .attribute_if_present::<i64>(&time_attribute(TimeAttribute::Index.name()))
        .unwrap_or(0);
    let snapshot = TimeSnapshot::new(
        index,
        real(TimeAttribute::Value),
        real(TimeAttribute::DeltaT),
        real(TimeAttribute::DeltaT0),
    );
    debug!(
        index,
        value = snapshot.value(),
        valid = snapshot.is_valid(),
        "Read time snapshot"
    );
    snapshot
}
