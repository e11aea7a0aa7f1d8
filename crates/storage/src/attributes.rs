//! Attribute store
//!
//! Attributes are small named values (scalars or fixed lists) attached to a
//! checkpoint. Each path is defined once per checkpoint. Reads come in two
//! flavours: mandatory reads fail with a typed error naming the path, while
//! optional reads report absence through their return value and leave the
//! destination untouched.

use meshstate_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// A stored attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Integer scalar
    Int(i64),
    /// Real scalar
    Real(f64),
    /// String scalar
    Text(String),
    /// Integer list
    IntList(Vec<i64>),
    /// Real list
    RealList(Vec<f64>),
    /// String list
    TextList(Vec<String>),
}

impl AttributeValue {
    /// Name of the value's type, used in mismatch errors
    pub fn type_name(&self) -> &'static str {
        match self {
            AttributeValue::Int(_) => "int",
            AttributeValue::Real(_) => "real",
            AttributeValue::Text(_) => "text",
            AttributeValue::IntList(_) => "int list",
            AttributeValue::RealList(_) => "real list",
            AttributeValue::TextList(_) => "text list",
        }
    }
}

/// Rust types that can be stored as attributes
pub trait AttributeType: Sized {
    /// Type name, matching [`AttributeValue::type_name`]
    const TYPE_NAME: &'static str;

    /// Wrap into a stored value
    fn into_value(self) -> AttributeValue;

    /// Extract from a stored value of the matching type
    fn from_value(value: &AttributeValue) -> Option<Self>;
}

macro_rules! attribute_type {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl AttributeType for $ty {
            const TYPE_NAME: &'static str = $name;

            fn into_value(self) -> AttributeValue {
                AttributeValue::$variant(self)
            }

            fn from_value(value: &AttributeValue) -> Option<Self> {
                match value {
                    AttributeValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for AttributeValue {
            fn from(v: $ty) -> Self {
                AttributeValue::$variant(v)
            }
        }
    };
}

attribute_type!(i64, Int, "int");
attribute_type!(f64, Real, "real");
attribute_type!(String, Text, "text");
attribute_type!(Vec<i64>, IntList, "int list");
attribute_type!(Vec<f64>, RealList, "real list");
attribute_type!(Vec<String>, TextList, "text list");

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

/// Attributes of one checkpoint, keyed by path
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeStore {
    values: BTreeMap<String, AttributeValue>,
}

impl AttributeStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Define an attribute
    ///
    /// A path may be defined once; a second definition is a programming
    /// error. Debug builds panic, release builds keep the first value and
    /// return `false`.
    pub fn put(&mut self, path: impl Into<String>, value: impl Into<AttributeValue>) -> bool {
        let path = path.into();
        if self.values.contains_key(&path) {
            debug_assert!(false, "attribute {path} defined twice");
            warn!(path = %path, "Ignoring duplicate attribute definition");
            return false;
        }
        self.values.insert(path, value.into());
        true
    }

    /// Stored value at `path`
    pub fn value(&self, path: &str) -> Option<&AttributeValue> {
        self.values.get(path)
    }

    /// True if `path` is defined
    pub fn has_attribute(&self, path: &str) -> bool {
        self.values.contains_key(path)
    }

    /// Read an attribute into `out`
    ///
    /// Returns `Ok(true)` when the value was read. When the attribute is
    /// absent or of another type, a mandatory read fails and an optional
    /// read returns `Ok(false)` with `out` unchanged.
    pub fn get<T: AttributeType>(&self, path: &str, out: &mut T, mandatory: bool) -> Result<bool> {
        let Some(value) = self.values.get(path) else {
            return if mandatory {
                Err(Error::MissingAttribute {
                    path: path.to_string(),
                })
            } else {
                Ok(false)
            };
        };
        match T::from_value(value) {
            Some(v) => {
                *out = v;
                Ok(true)
            }
            None if mandatory => Err(Error::AttributeTypeMismatch {
                path: path.to_string(),
                stored: value.type_name(),
                requested: T::TYPE_NAME,
            }),
            None => {
                warn!(
                    path = %path,
                    stored = value.type_name(),
                    requested = T::TYPE_NAME,
                    "Optional attribute has unexpected type"
                );
                Ok(false)
            }
        }
    }

    /// Mandatory read
    pub fn attribute<T: AttributeType + Default>(&self, path: &str) -> Result<T> {
        let mut out = T::default();
        self.get(path, &mut out, true)?;
        Ok(out)
    }

    /// Optional read
    pub fn attribute_if_present<T: AttributeType + Default>(&self, path: &str) -> Option<T> {
        let mut out = T::default();
        match self.get(path, &mut out, false) {
            Ok(true) => Some(out),
            _ => None,
        }
    }

    /// All attribute paths, in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Attribute paths starting with `prefix`
    pub fn paths_under<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .range(prefix.to_string()..)
            .map(|(k, _)| k.as_str())
            .take_while(move |k| k.starts_with(prefix))
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no attributes are defined
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Add entries from `other` that are not already defined here
    pub(crate) fn merge_missing(&mut self, other: AttributeStore) {
        for (path, value) in other.values {
            self.values.entry(path).or_insert(value);
        }
    }
}
