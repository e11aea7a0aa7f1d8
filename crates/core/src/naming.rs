//! Naming scheme for container paths
//!
//! Pure functions mapping (region, entity kind, entity name) to the
//! canonical variable/attribute path `<region>/<kind>/<entity>`. Paths are
//! case-sensitive and are never normalized.
//!
//! ```text
//! /meshstate/<name>            global attributes
//! /time/<name>                 time attributes
//! <region>/polyMesh/<name>     mesh variables and attributes
//! <region>/field/<name>        field variables and attributes
//! <region>/cloud/<name>/...    cloud variables and attributes
//! ```

/// Path separator
pub const SEPARATOR: char = '/';

/// Namespace for global attributes
pub const GLOBAL_NAMESPACE: &str = "/meshstate";

/// Namespace for time attributes
pub const TIME_NAMESPACE: &str = "/time";

/// Default region name when none is configured
pub const DEFAULT_REGION: &str = "region0";

/// Kind of entity addressed below a region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Discretized fields
    Field,
    /// Mesh geometry
    Mesh,
    /// Particle clouds
    Cloud,
}

impl EntityKind {
    /// Path component for this kind
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Field => "field",
            EntityKind::Mesh => "polyMesh",
            EntityKind::Cloud => "cloud",
        }
    }
}

/// Join two path components with the separator
///
/// An empty `leaf` returns `base` unchanged.
pub fn join(base: &str, leaf: &str) -> String {
    if leaf.is_empty() {
        base.to_string()
    } else if base.is_empty() {
        leaf.to_string()
    } else {
        format!("{}{}{}", base, SEPARATOR, leaf)
    }
}

/// Path for a region
pub fn region_path(region: &str) -> String {
    region.to_string()
}

/// Prefix under which all entities of `kind` live for `region`
pub fn entity_prefix(region: &str, kind: EntityKind) -> String {
    join(&region_path(region), kind.as_str())
}

/// Path for an entity of `kind` named `name` in `region`
pub fn entity_path(region: &str, kind: EntityKind, name: &str) -> String {
    join(&entity_prefix(region, kind), name)
}

/// Path name for fields: `<region>/field/<name>`
pub fn field_path(region: &str, name: &str) -> String {
    entity_path(region, EntityKind::Field, name)
}

/// Path name for meshes: `<region>/polyMesh/<name>`
pub fn mesh_path(region: &str, name: &str) -> String {
    entity_path(region, EntityKind::Mesh, name)
}

/// Path name for clouds: `<region>/cloud/<name>`
pub fn cloud_path(region: &str, name: &str) -> String {
    entity_path(region, EntityKind::Cloud, name)
}

/// Path of a global attribute
pub fn global_attribute(name: &str) -> String {
    join(GLOBAL_NAMESPACE, name)
}

/// Path of a time attribute
pub fn time_attribute(name: &str) -> String {
    join(TIME_NAMESPACE, name)
}

/// Extract the region name from a variable path
///
/// Returns everything before the first separator. Fragile: assumes the
/// region name itself contains no separator. Prefer carrying the region
/// alongside the path; use this only when nothing else is known.
pub fn region_of(path: &str) -> &str {
    match path.find(SEPARATOR) {
        Some(i) => &path[..i],
        None => path,
    }
}

/// Final component of a path
pub fn leaf_of(path: &str) -> &str {
    match path.rfind(SEPARATOR) {
        Some(i) => &path[i + 1..],
        None => path,
    }
}
