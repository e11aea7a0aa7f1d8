//! Core types for meshstate
//!
//! This crate defines the foundational types shared by the storage and
//! durability layers:
//! - Naming: canonical container paths for regions, meshes, fields, clouds
//! - ElementKind / Extent: the closed set of stored element types and the
//!   local/global/offset addressing of distributed arrays
//! - FieldInfo / CloudInfo: identity records used as composite keys
//! - TimeSnapshot: scalar checkpoint metadata (index, value, deltaT, deltaT0)
//! - PolyMesh / Field / Cloud: the host data model handed to the codecs
//! - HostRegion: the seam through which a host simulation exposes a region
//! - NamePattern / NameFilter: inclusion/exclusion of entities by name
//! - Error: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cloud;
pub mod error;
pub mod field;
pub mod host;
pub mod info;
pub mod mesh;
pub mod naming;
pub mod pattern;
pub mod time;
pub mod types;

pub use cloud::{Cloud, CloudField, CloudValues};
pub use error::{Error, ErrorKind, Result};
pub use field::{Field, FieldLocation, PatchEntry, PatchField, ValueKind};
pub use host::{HostRegion, RegionState};
pub use info::{CloudInfo, FieldInfo};
pub use mesh::{FaceList, MeshExtents, MeshUpdate, Patch, PolyMesh, ProcAddressing, Zone, ZoneKind};
pub use pattern::{NameFilter, NamePattern, PatternError};
pub use time::{time_name, TimeAttribute, TimeSnapshot};
pub use types::{ElementKind, Extent, Label, Scalar};
