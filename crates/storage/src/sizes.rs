//! Type-size negotiation
//!
//! Writers record the byte width they used for index-typed (label) and
//! real-valued (scalar) data as global attributes. Readers inspect those
//! markers on open; when they are missing the native widths are assumed.

use meshstate_core::naming::global_attribute;
use meshstate_core::{ElementKind, Error, Label, Result, Scalar};
use tracing::warn;

use crate::attributes::AttributeStore;

/// Marker attribute holding the label width
pub const LABEL_WIDTH_ATTRIBUTE: &str = "label";

/// Marker attribute holding the scalar width
pub const SCALAR_WIDTH_ATTRIBUTE: &str = "scalar";

/// Label and scalar widths of one container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeSizes {
    label: usize,
    scalar: usize,
}

impl Default for TypeSizes {
    fn default() -> Self {
        TypeSizes::native()
    }
}

impl TypeSizes {
    /// Widths of the host's [`Label`] and [`Scalar`]
    pub fn native() -> Self {
        TypeSizes {
            label: std::mem::size_of::<Label>(),
            scalar: std::mem::size_of::<Scalar>(),
        }
    }

    /// Explicit widths in bytes (4 or 8 each)
    pub fn new(label: usize, scalar: usize) -> Result<Self> {
        if ElementKind::label_of_width(label).is_none() {
            return Err(Error::InvalidOperation(format!(
                "unsupported label width {label}"
            )));
        }
        if ElementKind::scalar_of_width(scalar).is_none() {
            return Err(Error::InvalidOperation(format!(
                "unsupported scalar width {scalar}"
            )));
        }
        Ok(TypeSizes { label, scalar })
    }

    /// Label width in bytes
    pub fn label_width(&self) -> usize {
        self.label
    }

    /// Scalar width in bytes
    pub fn scalar_width(&self) -> usize {
        self.scalar
    }

    /// Element kind used for labels
    pub fn label_kind(&self) -> ElementKind {
        if self.label == 4 {
            ElementKind::I32
        } else {
            ElementKind::I64
        }
    }

    /// Element kind used for scalars
    pub fn scalar_kind(&self) -> ElementKind {
        if self.scalar == 4 {
            ElementKind::F32
        } else {
            ElementKind::F64
        }
    }

    /// Stored element kind for host values of `host` kind
    pub fn stored_kind(&self, host: ElementKind) -> ElementKind {
        if host.is_integer() {
            self.label_kind()
        } else if host.is_float() {
            self.scalar_kind()
        } else {
            host
        }
    }

    /// Record the width markers
    pub fn put(&self, attributes: &mut AttributeStore) {
        attributes.put(global_attribute(LABEL_WIDTH_ATTRIBUTE), self.label as i64);
        attributes.put(global_attribute(SCALAR_WIDTH_ATTRIBUTE), self.scalar as i64);
    }

    /// Learn the writer's widths from the markers in `attributes`
    ///
    /// Missing or unusable markers fall back to the native widths.
    pub fn negotiate(attributes: &AttributeStore) -> Self {
        let native = TypeSizes::native();
        let read = |name: &str, fallback: usize| -> usize {
            let path = global_attribute(name);
            match attributes.attribute_if_present::<i64>(&path) {
                Some(w) if w == 4 || w == 8 => w as usize,
                Some(w) => {
                    warn!(path = %path, width = w, "Unsupported width marker, using native width");
                    fallback
                }
                None => {
                    warn!(path = %path, "Width marker missing, using native width");
                    fallback
                }
            }
        };
        TypeSizes {
            label: read(LABEL_WIDTH_ATTRIBUTE, native.label),
            scalar: read(SCALAR_WIDTH_ATTRIBUTE, native.scalar),
        }
    }
}
