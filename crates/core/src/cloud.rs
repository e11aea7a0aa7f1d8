//! Particle cloud data model

use crate::info::CloudInfo;
use crate::types::{Extent, Label, Scalar};

/// Per-particle values of one cloud sub-field
#[derive(Debug, Clone, PartialEq)]
pub enum CloudValues {
    /// Integer values (ids, cell indices, flags)
    Label(Vec<Label>),
    /// Real values, flattened with `components` per particle
    Scalar {
        /// Components per particle
        components: usize,
        /// Flattened values
        values: Vec<Scalar>,
    },
}

impl CloudValues {
    /// Components per particle
    pub fn components(&self) -> usize {
        match self {
            CloudValues::Label(_) => 1,
            CloudValues::Scalar { components, .. } => *components,
        }
    }

    /// Number of particles covered
    pub fn n_particles(&self) -> usize {
        match self {
            CloudValues::Label(v) => v.len(),
            CloudValues::Scalar { components, values } => values.len() / (*components).max(1),
        }
    }

    /// Type name recorded in container metadata
    pub fn type_name(&self) -> &'static str {
        match self {
            CloudValues::Label(_) => "label",
            CloudValues::Scalar { .. } => "scalar",
        }
    }
}

/// One named sub-field of a cloud
#[derive(Debug, Clone, PartialEq)]
pub struct CloudField {
    /// Sub-field name (e.g. `d`, `U`, `origId`)
    pub name: String,
    /// Per-particle values
    pub values: CloudValues,
}

impl CloudField {
    /// Construct from components
    pub fn new(name: impl Into<String>, values: CloudValues) -> Self {
        CloudField {
            name: name.into(),
            values,
        }
    }
}

/// A named particle collection
#[derive(Debug, Clone, PartialEq)]
pub struct Cloud {
    /// Cloud name
    pub name: String,
    /// Declared class tag
    pub class: String,
    /// Particle extent of this participant
    pub extent: Extent,
    /// Sub-fields, in write order
    pub fields: Vec<CloudField>,
}

impl Cloud {
    /// Construct a serial cloud
    pub fn new(name: impl Into<String>, class: impl Into<String>, n_particles: usize) -> Self {
        Cloud {
            name: name.into(),
            class: class.into(),
            extent: Extent::serial(n_particles),
            fields: Vec::new(),
        }
    }

    /// Set the particle extent
    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = extent;
        self
    }

    /// Add a sub-field
    pub fn with_field(mut self, field: CloudField) -> Self {
        self.fields.push(field);
        self
    }

    /// Number of local particles
    pub fn n_particles(&self) -> usize {
        self.extent.local
    }

    /// Names of the sub-fields present
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }

    /// Look up a sub-field by name
    pub fn field(&self, name: &str) -> Option<&CloudField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Identity record for this cloud in `region`
    pub fn info(&self, region: &str) -> CloudInfo {
        CloudInfo::new(region, self.name.clone(), self.class.clone())
    }
}
