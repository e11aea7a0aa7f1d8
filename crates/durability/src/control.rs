//! Per-region write control
//!
//! Decides which fields and clouds of a region go into a checkpoint.

use meshstate_core::{Cloud, Field, NameFilter};

/// Selection rules for one region
#[derive(Debug, Clone)]
pub struct RegionControl {
    name: String,
    explicit_write: bool,
    fields: NameFilter,
    clouds: NameFilter,
}

impl RegionControl {
    /// Control that writes every auto-write field and every cloud
    pub fn new(name: impl Into<String>) -> Self {
        RegionControl {
            name: name.into(),
            explicit_write: false,
            fields: NameFilter::default(),
            clouds: NameFilter::default(),
        }
    }

    /// Only write requested entities, ignoring the auto-write flag
    pub fn with_explicit_write(mut self, explicit: bool) -> Self {
        self.explicit_write = explicit;
        self
    }

    /// Set the field filter
    pub fn with_fields(mut self, filter: NameFilter) -> Self {
        self.fields = filter;
        self
    }

    /// Set the cloud filter
    pub fn with_clouds(mut self, filter: NameFilter) -> Self {
        self.clouds = filter;
        self
    }

    /// Region name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True if only requested entities are written
    pub fn explicit_write(&self) -> bool {
        self.explicit_write
    }

    /// Field filter
    pub fn field_filter(&self) -> &NameFilter {
        &self.fields
    }

    /// Cloud filter
    pub fn cloud_filter(&self) -> &NameFilter {
        &self.clouds
    }

    /// True if `field` should be written
    pub fn accepts_field(&self, field: &Field) -> bool {
        self.fields
            .accepts(&field.name, field.auto_write && !self.explicit_write)
    }

    /// True if `cloud` should be written
    pub fn accepts_cloud(&self, cloud: &Cloud) -> bool {
        self.clouds.accepts(&cloud.name, !self.explicit_write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshstate_core::ValueKind;

    fn field(name: &str, auto_write: bool) -> Field {
        let mut f = Field::new(name, "volScalarField", ValueKind::Scalar, Vec::new());
        f.auto_write = auto_write;
        f
    }

    #[test]
    fn test_auto_write_default() {
        let ctrl = RegionControl::new("region0");
        assert!(ctrl.accepts_field(&field("p", true)));
        assert!(!ctrl.accepts_field(&field("gradP", false)));
        assert!(ctrl.accepts_cloud(&Cloud::new("spray", "basicKinematicCloud", 0)));
    }

    #[test]
    fn test_requested_overrides_auto_write() {
        let ctrl = RegionControl::new("region0")
            .with_fields(NameFilter::new(&["grad.*"], &[]).unwrap());
        assert!(ctrl.accepts_field(&field("gradP", false)));
    }

    #[test]
    fn test_explicit_write() {
        let ctrl = RegionControl::new("region0")
            .with_explicit_write(true)
            .with_fields(NameFilter::new(&["U"], &[]).unwrap());
        assert!(ctrl.accepts_field(&field("U", true)));
        assert!(!ctrl.accepts_field(&field("p", true)));
        assert!(!ctrl.accepts_cloud(&Cloud::new("spray", "basicKinematicCloud", 0)));
    }

    #[test]
    fn test_ignored_wins() {
        let ctrl = RegionControl::new("region0")
            .with_fields(NameFilter::new(&["U"], &["U"]).unwrap())
            .with_clouds(NameFilter::new::<&str>(&[], &["spray"]).unwrap());
        assert!(!ctrl.accepts_field(&field("U", true)));
        assert!(!ctrl.accepts_cloud(&Cloud::new("spray", "basicKinematicCloud", 0)));
    }
}
