//! meshstate - parallel checkpoint/restart for mesh-based simulations
//!
//! Serializes region meshes, fields and particle clouds into
//! self-describing per-participant containers, and restores them on a
//! later run, possibly with a different number of participants.
//!
//! # Quick Start
//!
//! ```ignore
//! use meshstate::{CheckpointConfig, CheckpointWriter, Participant, TimeSnapshot};
//!
//! let config = CheckpointConfig::new("checkpointData");
//! let mut writer = CheckpointWriter::new(&config, Participant::serial())?;
//! writer.write(&TimeSnapshot::new(1, 0.1, 0.1, 0.1), &[&region])?;
//! ```
//!
//! # Architecture
//!
//! - `meshstate-core`: naming scheme, host data model, errors
//! - `meshstate-storage`: container backend, attributes, variable and byte-stream codecs
//! - `meshstate-durability`: codecs, sessions, restart resolution, configuration

pub use meshstate_core::{
    naming, Cloud, CloudField, CloudInfo, CloudValues, ElementKind, Error, ErrorKind, Extent,
    FaceList, Field, FieldInfo, FieldLocation, HostRegion, Label, MeshExtents, MeshUpdate,
    NameFilter, Patch, PatchEntry, PatchField, PolyMesh, ProcAddressing, RegionState, Result,
    Scalar, TimeSnapshot, ValueKind, Zone, ZoneKind,
};
pub use meshstate_durability::{
    find_times, CheckpointConfig, CheckpointReader, CheckpointWriter, ConfigError, Instant,
    RegionConfig, RegionControl, RestartError, RestartPolicy, RestartResolver, StopPolicy,
    WriteSummary,
};
pub use meshstate_storage::{
    AttributeStore, AttributeValue, InputContainer, Layout, Location, OutputEngine, Participant,
    StreamFormat, TypeSizes,
};
