//! Discretized field data model
//!
//! A field has flat interior values (one tuple per cell or point) and an
//! ordered list of boundary patch records. Patch records are heterogeneous:
//! each patch type carries its own parameter set, so they are modelled as
//! keyed [`PatchEntry`] trees rather than flat arrays.

use crate::info::FieldInfo;
use crate::types::Scalar;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Component type of a field's values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    /// One component
    Scalar,
    /// Three components
    Vector,
    /// One component (isotropic tensor)
    SphericalTensor,
    /// Six components
    SymmTensor,
    /// Nine components
    Tensor,
}

impl ValueKind {
    /// All value kinds
    pub const ALL: [ValueKind; 5] = [
        ValueKind::Scalar,
        ValueKind::Vector,
        ValueKind::SphericalTensor,
        ValueKind::SymmTensor,
        ValueKind::Tensor,
    ];

    /// Number of components per tuple
    pub fn n_components(self) -> usize {
        match self {
            ValueKind::Scalar | ValueKind::SphericalTensor => 1,
            ValueKind::Vector => 3,
            ValueKind::SymmTensor => 6,
            ValueKind::Tensor => 9,
        }
    }

    /// Name as recorded in container metadata
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Scalar => "scalar",
            ValueKind::Vector => "vector",
            ValueKind::SphericalTensor => "sphericalTensor",
            ValueKind::SymmTensor => "symmTensor",
            ValueKind::Tensor => "tensor",
        }
    }

    /// Parse a value kind name
    pub fn from_name(name: &str) -> Option<ValueKind> {
        ValueKind::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// Where a field's interior values live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldLocation {
    /// One tuple per cell
    Cell,
    /// One tuple per point
    Point,
}

impl FieldLocation {
    /// Name as recorded in container metadata
    pub fn name(self) -> &'static str {
        match self {
            FieldLocation::Cell => "cell",
            FieldLocation::Point => "point",
        }
    }

    /// Parse a location name
    pub fn from_name(name: &str) -> Option<FieldLocation> {
        match name {
            "cell" => Some(FieldLocation::Cell),
            "point" => Some(FieldLocation::Point),
            _ => None,
        }
    }
}

/// One entry of a patch record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PatchEntry {
    /// A bare word (e.g. an interpolation scheme name)
    Word(String),
    /// An integer parameter
    Label(i64),
    /// A real parameter
    Scalar(#[serde(with = "text_scalar")] Scalar),
    /// A uniform value (one tuple)
    Uniform(#[serde(with = "text_scalar_list")] Vec<Scalar>),
    /// Per-face values, flattened
    NonUniform {
        /// Components per tuple
        components: usize,
        /// Flattened values
        #[serde(with = "text_scalar_list")]
        values: Vec<Scalar>,
    },
    /// Nested sub-dictionary
    Dict(BTreeMap<String, PatchEntry>),
}

/// Scalar that survives text formats
///
/// Human-readable formats have no number for NaN or infinity, so those are
/// written as the keywords `nan`, `inf` and `-inf`. Binary formats store
/// the bits unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TextScalar(Scalar);

impl Serialize for TextScalar {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let v = self.0;
        if !serializer.is_human_readable() || v.is_finite() {
            serializer.serialize_f64(v)
        } else if v.is_nan() {
            serializer.serialize_str("nan")
        } else if v > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }
}

impl<'de> Deserialize<'de> for TextScalar {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ScalarVisitor;

        impl serde::de::Visitor<'_> for ScalarVisitor {
            type Value = TextScalar;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a number or one of \"nan\", \"inf\", \"-inf\"")
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<TextScalar, E> {
                Ok(TextScalar(v))
            }

            fn visit_f32<E: serde::de::Error>(self, v: f32) -> Result<TextScalar, E> {
                Ok(TextScalar(v as Scalar))
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<TextScalar, E> {
                Ok(TextScalar(v as Scalar))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<TextScalar, E> {
                Ok(TextScalar(v as Scalar))
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<TextScalar, E> {
                match v {
                    "nan" => Ok(TextScalar(Scalar::NAN)),
                    "inf" => Ok(TextScalar(Scalar::INFINITY)),
                    "-inf" => Ok(TextScalar(Scalar::NEG_INFINITY)),
                    other => Err(E::invalid_value(serde::de::Unexpected::Str(other), &self)),
                }
            }
        }

        if deserializer.is_human_readable() {
            deserializer.deserialize_any(ScalarVisitor)
        } else {
            deserializer.deserialize_f64(ScalarVisitor)
        }
    }
}

mod text_scalar {
    use super::{Scalar, TextScalar};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(v: &Scalar, serializer: S) -> Result<S::Ok, S::Error> {
        TextScalar(*v).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Scalar, D::Error> {
        TextScalar::deserialize(deserializer).map(|s| s.0)
    }
}

mod text_scalar_list {
    use super::{Scalar, TextScalar};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[Scalar], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(|v| TextScalar(*v)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Scalar>, D::Error> {
        let list = Vec::<TextScalar>::deserialize(deserializer)?;
        Ok(list.into_iter().map(|s| s.0).collect())
    }
}

/// Boundary condition record for one patch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchField {
    /// Patch name
    pub patch: String,
    /// Patch field type (e.g. `fixedValue`, `zeroGradient`)
    pub patch_type: String,
    /// Type-specific parameters
    pub entries: BTreeMap<String, PatchEntry>,
}

impl PatchField {
    /// Construct a patch record without parameters
    pub fn new(patch: impl Into<String>, patch_type: impl Into<String>) -> Self {
        PatchField {
            patch: patch.into(),
            patch_type: patch_type.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Add a parameter
    pub fn with_entry(mut self, key: impl Into<String>, entry: PatchEntry) -> Self {
        self.entries.insert(key.into(), entry);
        self
    }
}

/// A discretized field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Field name
    pub name: String,
    /// Declared class tag (e.g. `volScalarField`)
    pub class: String,
    /// Component type
    pub kind: ValueKind,
    /// Where interior values live
    pub location: FieldLocation,
    /// Physical dimensions exponents
    pub dimensions: [Scalar; 7],
    /// Flattened interior values
    pub internal: Vec<Scalar>,
    /// Boundary patch records, in patch order
    pub boundary: Vec<PatchField>,
    /// Whether the host marks this field for automatic writing
    pub auto_write: bool,
}

impl Field {
    /// Construct a cell field without boundary records
    pub fn new(
        name: impl Into<String>,
        class: impl Into<String>,
        kind: ValueKind,
        internal: Vec<Scalar>,
    ) -> Self {
        Field {
            name: name.into(),
            class: class.into(),
            kind,
            location: FieldLocation::Cell,
            dimensions: [0.0; 7],
            internal,
            boundary: Vec::new(),
            auto_write: true,
        }
    }

    /// Set the boundary records
    pub fn with_boundary(mut self, boundary: Vec<PatchField>) -> Self {
        self.boundary = boundary;
        self
    }

    /// Set the value location
    pub fn with_location(mut self, location: FieldLocation) -> Self {
        self.location = location;
        self
    }

    /// Set the dimensions
    pub fn with_dimensions(mut self, dimensions: [Scalar; 7]) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Number of interior tuples
    pub fn n_values(&self) -> usize {
        self.internal.len() / self.kind.n_components()
    }

    /// Identity record for this field in `region`
    pub fn info(&self, region: &str) -> FieldInfo {
        FieldInfo::new(region, self.name.clone(), self.class.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind_components() {
        assert_eq!(ValueKind::Scalar.n_components(), 1);
        assert_eq!(ValueKind::Vector.n_components(), 3);
        assert_eq!(ValueKind::SymmTensor.n_components(), 6);
        assert_eq!(ValueKind::Tensor.n_components(), 9);
    }

    #[test]
    fn test_value_kind_names_roundtrip() {
        for kind in ValueKind::ALL {
            assert_eq!(ValueKind::from_name(kind.name()), Some(kind));
        }
    }

    #[test]
    fn test_field_n_values() {
        let f = Field::new("U", "volVectorField", ValueKind::Vector, vec![0.0; 12]);
        assert_eq!(f.n_values(), 4);
        assert_eq!(f.info("region0").full_name(), "region0/field/U");
    }

    #[test]
    fn test_patch_record_serializes() {
        let patch = PatchField::new("inlet", "fixedValue")
            .with_entry("value", PatchEntry::Uniform(vec![1.0, 0.0, 0.0]));
        let json = serde_json::to_string(&patch).unwrap();
        let back: PatchField = serde_json::from_str(&json).unwrap();
        assert_eq!(back, patch);
    }

    #[test]
    fn test_non_finite_patch_values_in_text() {
        let patch = PatchField::new("walls", "fixedValue")
            .with_entry("value", PatchEntry::Scalar(Scalar::INFINITY))
            .with_entry("refValue", PatchEntry::Uniform(vec![1.5, Scalar::NEG_INFINITY]))
            .with_entry(
                "gradient",
                PatchEntry::NonUniform {
                    components: 1,
                    values: vec![Scalar::NAN, 2.0],
                },
            );
        let json = serde_json::to_string(&patch).unwrap();
        assert!(json.contains("\"inf\"") && json.contains("\"-inf\"") && json.contains("\"nan\""));

        let back: PatchField = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entries["value"], PatchEntry::Scalar(Scalar::INFINITY));
        assert_eq!(
            back.entries["refValue"],
            PatchEntry::Uniform(vec![1.5, Scalar::NEG_INFINITY])
        );
        match &back.entries["gradient"] {
            PatchEntry::NonUniform { components, values } => {
                assert_eq!(*components, 1);
                assert!(values[0].is_nan());
                assert_eq!(values[1], 2.0);
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_scalar_keyword_rejected() {
        let json = r#"{"Scalar":"infinity"}"#;
        assert!(serde_json::from_str::<PatchEntry>(json).is_err());
        let back: PatchEntry = serde_json::from_str(r#"{"Scalar":3}"#).unwrap();
        assert_eq!(back, PatchEntry::Scalar(3.0));
    }
}
