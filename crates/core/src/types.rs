//! Element kinds and distributed-array addressing
//!
//! Stored data uses a small closed set of element kinds. Host-side values
//! are always [`Label`] (64-bit) and [`Scalar`] (64-bit); the writer may
//! narrow them to 32-bit on the way out and the reader widens or narrows
//! them back with range checks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host index type (cell/face/point ids, counts)
pub type Label = i64;

/// Host floating-point type
pub type Scalar = f64;

/// Element type of a stored variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementKind {
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 32-bit IEEE float
    F32,
    /// 64-bit IEEE float
    F64,
    /// Raw bytes (byte-stream records)
    U8,
}

impl ElementKind {
    /// All element kinds
    pub const ALL: [ElementKind; 5] = [
        ElementKind::I32,
        ElementKind::I64,
        ElementKind::F32,
        ElementKind::F64,
        ElementKind::U8,
    ];

    /// Width of one element in bytes
    pub fn width(self) -> usize {
        match self {
            ElementKind::I32 | ElementKind::F32 => 4,
            ElementKind::I64 | ElementKind::F64 => 8,
            ElementKind::U8 => 1,
        }
    }

    /// True for the signed integer kinds
    pub fn is_integer(self) -> bool {
        matches!(self, ElementKind::I32 | ElementKind::I64)
    }

    /// True for the floating-point kinds
    pub fn is_float(self) -> bool {
        matches!(self, ElementKind::F32 | ElementKind::F64)
    }

    /// Integer kind with the given byte width
    pub fn label_of_width(width: usize) -> Option<ElementKind> {
        match width {
            4 => Some(ElementKind::I32),
            8 => Some(ElementKind::I64),
            _ => None,
        }
    }

    /// Float kind with the given byte width
    pub fn scalar_of_width(width: usize) -> Option<ElementKind> {
        match width {
            4 => Some(ElementKind::F32),
            8 => Some(ElementKind::F64),
            _ => None,
        }
    }

    /// Type name as recorded in container metadata
    pub fn name(self) -> &'static str {
        match self {
            ElementKind::I32 => "int32",
            ElementKind::I64 => "int64",
            ElementKind::F32 => "float32",
            ElementKind::F64 => "float64",
            ElementKind::U8 => "uint8",
        }
    }

    /// Parse a type name
    pub fn from_name(name: &str) -> Option<ElementKind> {
        ElementKind::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Addressing of one participant's slice of a distributed array
///
/// Counts are in tuples (a vector field with 10 cells has `local == 10`).
/// Across all writing participants the local counts sum to `global` and
/// the offsets partition `[0, global)`; the codecs do not verify this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent {
    /// Number of tuples owned by this participant
    pub local: usize,
    /// Number of tuples across all participants
    pub global: usize,
    /// Global index of this participant's first tuple
    pub offset: usize,
}

impl Extent {
    /// Create an extent from its components
    pub fn new(local: usize, global: usize, offset: usize) -> Self {
        Extent {
            local,
            global,
            offset,
        }
    }

    /// Extent of a serial (single participant) array
    pub fn serial(count: usize) -> Self {
        Extent::new(count, count, 0)
    }

    /// Extent of participant `rank` given every participant's local count
    ///
    /// The offset is the prefix sum of the counts of lower ranks.
    pub fn from_counts(counts: &[usize], rank: usize) -> Self {
        let offset = counts[..rank.min(counts.len())].iter().sum();
        let local = counts.get(rank).copied().unwrap_or(0);
        Extent::new(local, counts.iter().sum(), offset)
    }

    /// Exclusive end of this participant's range
    pub fn end(&self) -> usize {
        self.offset + self.local
    }

    /// True if the range lies within `[0, global)`
    pub fn is_consistent(&self) -> bool {
        self.end() <= self.global
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_widths() {
        assert_eq!(ElementKind::I32.width(), 4);
        assert_eq!(ElementKind::I64.width(), 8);
        assert_eq!(ElementKind::F32.width(), 4);
        assert_eq!(ElementKind::F64.width(), 8);
        assert_eq!(ElementKind::U8.width(), 1);
    }

    #[test]
    fn test_element_kind_names_roundtrip() {
        for kind in ElementKind::ALL {
            assert_eq!(ElementKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ElementKind::from_name("complex"), None);
    }

    #[test]
    fn test_kind_of_width() {
        assert_eq!(ElementKind::label_of_width(4), Some(ElementKind::I32));
        assert_eq!(ElementKind::label_of_width(8), Some(ElementKind::I64));
        assert_eq!(ElementKind::scalar_of_width(4), Some(ElementKind::F32));
        assert_eq!(ElementKind::scalar_of_width(2), None);
    }

    #[test]
    fn test_extent_from_counts() {
        let counts = [3, 0, 5, 2];
        assert_eq!(Extent::from_counts(&counts, 0), Extent::new(3, 10, 0));
        assert_eq!(Extent::from_counts(&counts, 1), Extent::new(0, 10, 3));
        assert_eq!(Extent::from_counts(&counts, 2), Extent::new(5, 10, 3));
        assert_eq!(Extent::from_counts(&counts, 3), Extent::new(2, 10, 8));
        assert!(Extent::from_counts(&counts, 3).is_consistent());
    }

    #[test]
    fn test_serial_extent() {
        let e = Extent::serial(7);
        assert_eq!(e.end(), 7);
        assert!(e.is_consistent());
        assert!(!Extent::new(4, 5, 2).is_consistent());
    }
}
