//! Width-aware element conversion
//!
//! Host buffers are typed Rust slices; container blocks are little-endian
//! byte runs of one [`ElementKind`]. Conversion between the two goes
//! through an intermediate [`Wide`] value so every (host, stored) pair is
//! handled by one path. Narrowing is range-checked element by element and
//! reports the index of the first value that does not fit.

use byteorder::{ByteOrder, LittleEndian};
use meshstate_core::{ElementKind, Error, Result};

/// Widest representation of one element
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Wide {
    /// Signed integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Raw byte
    Byte(u8),
}

/// Host element types accepted by the variable codec
pub trait Element: Copy + Default + std::fmt::Debug + Send + Sync + 'static {
    /// Element kind of the host representation
    const KIND: ElementKind;

    /// Widen to the intermediate representation
    fn to_wide(self) -> Wide;

    /// Narrow from the intermediate representation; `None` if out of range
    fn from_wide(wide: Wide) -> Option<Self>;
}

impl Element for i32 {
    const KIND: ElementKind = ElementKind::I32;

    fn to_wide(self) -> Wide {
        Wide::Int(self as i64)
    }

    fn from_wide(wide: Wide) -> Option<Self> {
        match wide {
            Wide::Int(v) => i32::try_from(v).ok(),
            _ => None,
        }
    }
}

impl Element for i64 {
    const KIND: ElementKind = ElementKind::I64;

    fn to_wide(self) -> Wide {
        Wide::Int(self)
    }

    fn from_wide(wide: Wide) -> Option<Self> {
        match wide {
            Wide::Int(v) => Some(v),
            _ => None,
        }
    }
}

impl Element for f32 {
    const KIND: ElementKind = ElementKind::F32;

    fn to_wide(self) -> Wide {
        Wide::Float(self as f64)
    }

    fn from_wide(wide: Wide) -> Option<Self> {
        match wide {
            Wide::Float(v) => narrow_f64(v),
            _ => None,
        }
    }
}

impl Element for f64 {
    const KIND: ElementKind = ElementKind::F64;

    fn to_wide(self) -> Wide {
        Wide::Float(self)
    }

    fn from_wide(wide: Wide) -> Option<Self> {
        match wide {
            Wide::Float(v) => Some(v),
            _ => None,
        }
    }
}

impl Element for u8 {
    const KIND: ElementKind = ElementKind::U8;

    fn to_wide(self) -> Wide {
        Wide::Byte(self)
    }

    fn from_wide(wide: Wide) -> Option<Self> {
        match wide {
            Wide::Byte(v) => Some(v),
            _ => None,
        }
    }
}

/// Finite values beyond the `f32` range are rejected; NaN and infinities
/// pass through.
fn narrow_f64(v: f64) -> Option<f32> {
    if v.is_finite() && v.abs() > f32::MAX as f64 {
        None
    } else {
        Some(v as f32)
    }
}

/// True if values stored as `stored` can be read into `requested`
///
/// Conversion stays within one class: integers to integers, floats to
/// floats, bytes to bytes.
pub fn compatible(stored: ElementKind, requested: ElementKind) -> bool {
    (stored.is_integer() && requested.is_integer())
        || (stored.is_float() && requested.is_float())
        || (stored == ElementKind::U8 && requested == ElementKind::U8)
}

/// Write one wide value as `kind`; false if it does not fit
fn write_wide(kind: ElementKind, wide: Wide, chunk: &mut [u8]) -> bool {
    match (kind, wide) {
        (ElementKind::I32, Wide::Int(v)) => match i32::try_from(v) {
            Ok(v) => {
                LittleEndian::write_i32(chunk, v);
                true
            }
            Err(_) => false,
        },
        (ElementKind::I64, Wide::Int(v)) => {
            LittleEndian::write_i64(chunk, v);
            true
        }
        (ElementKind::F32, Wide::Float(v)) => match narrow_f64(v) {
            Some(v) => {
                LittleEndian::write_f32(chunk, v);
                true
            }
            None => false,
        },
        (ElementKind::F64, Wide::Float(v)) => {
            LittleEndian::write_f64(chunk, v);
            true
        }
        (ElementKind::U8, Wide::Byte(v)) => {
            chunk[0] = v;
            true
        }
        _ => false,
    }
}

fn read_wide(kind: ElementKind, chunk: &[u8]) -> Wide {
    match kind {
        ElementKind::I32 => Wide::Int(LittleEndian::read_i32(chunk) as i64),
        ElementKind::I64 => Wide::Int(LittleEndian::read_i64(chunk)),
        ElementKind::F32 => Wide::Float(LittleEndian::read_f32(chunk) as f64),
        ElementKind::F64 => Wide::Float(LittleEndian::read_f64(chunk)),
        ElementKind::U8 => Wide::Byte(chunk[0]),
    }
}

/// Encode host values as `target` elements
pub fn encode<T: Element>(path: &str, data: &[T], target: ElementKind) -> Result<Vec<u8>> {
    if !compatible(T::KIND, target) {
        return Err(Error::TypeMismatch {
            path: path.to_string(),
            stored: target,
            requested: T::KIND,
        });
    }
    let width = target.width();
    let mut bytes = vec![0u8; data.len() * width];
    for (index, (value, chunk)) in data.iter().zip(bytes.chunks_exact_mut(width)).enumerate() {
        if !write_wide(target, value.to_wide(), chunk) {
            return Err(Error::NarrowingOverflow {
                path: path.to_string(),
                index,
                stored: T::KIND,
                requested: target,
            });
        }
    }
    Ok(bytes)
}

/// Decode `stored` elements into a host slice of the same length
pub fn decode_into<T: Element>(
    path: &str,
    stored: ElementKind,
    bytes: &[u8],
    out: &mut [T],
) -> Result<()> {
    if !compatible(stored, T::KIND) {
        return Err(Error::TypeMismatch {
            path: path.to_string(),
            stored,
            requested: T::KIND,
        });
    }
    let width = stored.width();
    if bytes.len() != out.len() * width {
        return Err(Error::SizeMismatch {
            path: path.to_string(),
            expected: bytes.len() / width,
            actual: out.len(),
        });
    }
    for (index, (slot, chunk)) in out.iter_mut().zip(bytes.chunks_exact(width)).enumerate() {
        *slot = T::from_wide(read_wide(stored, chunk)).ok_or_else(|| Error::NarrowingOverflow {
            path: path.to_string(),
            index,
            stored,
            requested: T::KIND,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_narrow_labels_in_range() {
        let bytes = encode("p", &[1i64, -7, 1 << 30], ElementKind::I32).unwrap();
        assert_eq!(bytes.len(), 12);
        let mut out = [0i64; 3];
        decode_into("p", ElementKind::I32, &bytes, &mut out).unwrap();
        assert_eq!(out, [1, -7, 1 << 30]);
    }

    #[test]
    fn test_narrow_labels_out_of_range() {
        let err = encode("owner", &[0i64, 1 << 40], ElementKind::I32).unwrap_err();
        match err {
            Error::NarrowingOverflow { path, index, .. } => {
                assert_eq!(path, "owner");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_wide_into_narrow_host() {
        let bytes = encode("x", &[5i64, i64::MAX], ElementKind::I64).unwrap();
        let mut out = [0i32; 2];
        let err = decode_into("x", ElementKind::I64, &bytes, &mut out).unwrap_err();
        assert!(matches!(err, Error::NarrowingOverflow { index: 1, .. }));
    }

    #[test]
    fn test_float_narrowing() {
        let bytes = encode("T", &[0.5f64, 300.0], ElementKind::F32).unwrap();
        let mut out = [0f64; 2];
        decode_into("T", ElementKind::F32, &bytes, &mut out).unwrap();
        assert_eq!(out, [0.5, 300.0]);

        assert!(encode("T", &[1e300f64], ElementKind::F32).is_err());
        assert!(encode("T", &[f64::INFINITY], ElementKind::F32).is_ok());
    }

    #[test]
    fn test_class_mismatch() {
        let err = encode("U", &[1.0f64], ElementKind::I64).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        let bytes = encode("U", &[1.0f64], ElementKind::F64).unwrap();
        let mut out = [0i64; 1];
        let err = decode_into("U", ElementKind::F64, &bytes, &mut out).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_decode_length_mismatch() {
        let bytes = encode("c", &[1i64, 2], ElementKind::I64).unwrap();
        let mut out = [0i64; 3];
        assert!(matches!(
            decode_into("c", ElementKind::I64, &bytes, &mut out),
            Err(Error::SizeMismatch { expected: 2, actual: 3, .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_i32_range_roundtrips_through_narrow_storage(values in proptest::collection::vec(any::<i32>(), 0..64)) {
            let wide: Vec<i64> = values.iter().map(|&v| v as i64).collect();
            let bytes = encode("p", &wide, ElementKind::I32).unwrap();
            let mut out = vec![0i64; wide.len()];
            decode_into("p", ElementKind::I32, &bytes, &mut out).unwrap();
            prop_assert_eq!(out, wide);
        }

        #[test]
        fn prop_f32_values_survive_widening(values in proptest::collection::vec(any::<f32>().prop_filter("finite", |v| v.is_finite()), 0..64)) {
            let bytes = encode("s", &values, ElementKind::F64).unwrap();
            let mut out = vec![0f32; values.len()];
            decode_into("s", ElementKind::F64, &bytes, &mut out).unwrap();
            prop_assert_eq!(out, values);
        }
    }
}
