//! Identity records for fields and clouds
//!
//! `FieldInfo` and `CloudInfo` name an entity within a region together with
//! its declared class tag. They are the unit of "what is available in this
//! file" produced by a metadata scan, and are ordered/hashed on
//! `(region, name, type_tag)` so they can be used as composite keys.

use crate::naming;
use std::fmt;

/// Identity of a field: region, field name and class tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldInfo {
    region: String,
    name: String,
    type_tag: String,
}

impl FieldInfo {
    /// Construct from components
    pub fn new(
        region: impl Into<String>,
        name: impl Into<String>,
        type_tag: impl Into<String>,
    ) -> Self {
        FieldInfo {
            region: region.into(),
            name: name.into(),
            type_tag: type_tag.into(),
        }
    }

    /// Construct from a variable path and class tag
    ///
    /// The region is derived with [`naming::region_of`], which assumes the
    /// region name contains no separator.
    pub fn from_variable(path: &str, type_tag: impl Into<String>) -> Self {
        FieldInfo::new(naming::region_of(path), naming::leaf_of(path), type_tag)
    }

    /// The region name
    pub fn region(&self) -> &str {
        &self.region
    }

    /// The field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The class tag (e.g. `volScalarField`)
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Prefix under which fields of this region live
    pub fn path(&self) -> String {
        naming::field_path(&self.region, "")
    }

    /// Full variable name
    pub fn full_name(&self) -> String {
        naming::field_path(&self.region, &self.name)
    }
}

impl fmt::Display for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.full_name(), self.type_tag)
    }
}

/// Identity of a cloud: region, cloud name and class tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CloudInfo {
    region: String,
    name: String,
    type_tag: String,
}

impl CloudInfo {
    /// Construct from components
    pub fn new(
        region: impl Into<String>,
        name: impl Into<String>,
        type_tag: impl Into<String>,
    ) -> Self {
        CloudInfo {
            region: region.into(),
            name: name.into(),
            type_tag: type_tag.into(),
        }
    }

    /// Construct from a variable path and class tag
    pub fn from_variable(path: &str, type_tag: impl Into<String>) -> Self {
        CloudInfo::new(naming::region_of(path), naming::leaf_of(path), type_tag)
    }

    /// The region name
    pub fn region(&self) -> &str {
        &self.region
    }

    /// The cloud name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The class tag of the cloud
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Prefix under which clouds of this region live
    pub fn path(&self) -> String {
        naming::cloud_path(&self.region, "")
    }

    /// Full variable name
    pub fn full_name(&self) -> String {
        naming::cloud_path(&self.region, &self.name)
    }
}

impl fmt::Display for CloudInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.full_name(), self.type_tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_field_info_paths() {
        let info = FieldInfo::new("region0", "U", "volVectorField");
        assert_eq!(info.full_name(), "region0/field/U");
        assert_eq!(info.path(), "region0/field");
        assert_eq!(info.to_string(), "region0/field/U volVectorField");
    }

    #[test]
    fn test_field_info_from_variable() {
        let info = FieldInfo::from_variable("fluid/field/p", "volScalarField");
        assert_eq!(info.region(), "fluid");
        assert_eq!(info.name(), "p");
        assert_eq!(info.type_tag(), "volScalarField");
    }

    #[test]
    fn test_cloud_info_paths() {
        let info = CloudInfo::from_variable("region0/cloud/spray", "basicKinematicCloud");
        assert_eq!(info.region(), "region0");
        assert_eq!(info.name(), "spray");
        assert_eq!(info.full_name(), "region0/cloud/spray");
    }

    #[test]
    fn test_info_as_composite_key() {
        let mut set = BTreeSet::new();
        set.insert(FieldInfo::new("a", "p", "volScalarField"));
        set.insert(FieldInfo::new("b", "p", "volScalarField"));
        set.insert(FieldInfo::new("a", "p", "volScalarField"));
        assert_eq!(set.len(), 2);
    }
}
