//! Variable codec
//!
//! Typed puts and gets on top of the byte-level engine and input container.
//! Host values are converted to the engine's stored widths on write and
//! back to the host type on read; see [`crate::element`].

use meshstate_core::{Error, Extent, Label, Result};

use crate::element::{decode_into, encode, Element};
use crate::engine::OutputEngine;
use crate::input::InputContainer;

impl OutputEngine {
    /// Declare a global array and put this participant's slice
    ///
    /// `data` holds `extent.local` tuples of `components` values. Offsets
    /// across participants are the caller's responsibility.
    pub fn define_and_put<T: Element>(
        &mut self,
        path: &str,
        data: &[T],
        components: usize,
        extent: Extent,
    ) -> Result<()> {
        if data.len() != extent.local * components {
            return Err(Error::SizeMismatch {
                path: path.to_string(),
                expected: extent.local * components,
                actual: data.len(),
            });
        }
        let kind = self.sizes().stored_kind(T::KIND);
        let bytes = encode(path, data, kind)?;
        self.put_global_bytes(path, kind, components, extent, bytes)
    }

    /// Put a per-participant block of `components`-tuples
    pub fn put_local<T: Element>(&mut self, path: &str, data: &[T], components: usize) -> Result<()> {
        let components = components.max(1);
        if data.len() % components != 0 {
            return Err(Error::SizeMismatch {
                path: path.to_string(),
                expected: data.len() - data.len() % components,
                actual: data.len(),
            });
        }
        let kind = self.sizes().stored_kind(T::KIND);
        let bytes = encode(path, data, kind)?;
        self.put_local_bytes(path, kind, components, data.len() / components, bytes)
    }

    /// Put one label per participant as a global array of length `nprocs`
    pub fn put_label_variable(&mut self, path: &str, value: Label) -> Result<()> {
        let participant = self.participant();
        let extent = Extent::new(1, participant.nprocs, participant.rank);
        self.define_and_put(path, &[value], 1, extent)
    }
}

impl InputContainer {
    /// Read this participant's selection of `path` into `out`
    ///
    /// Without `allow_resize`, `out` must already hold exactly the selected
    /// number of values.
    pub fn get<T: Element>(&self, path: &str, out: &mut Vec<T>, allow_resize: bool) -> Result<()> {
        let selection = self.selection(path)?;
        let n = selection.count * selection.components;
        if !allow_resize && out.len() != n {
            return Err(Error::SizeMismatch {
                path: path.to_string(),
                expected: n,
                actual: out.len(),
            });
        }
        out.resize(n, T::default());
        decode_into(path, selection.kind, &selection.bytes, out)
    }

    /// Like [`InputContainer::get`], returning `Ok(false)` if `path` is absent
    pub fn get_if_present<T: Element>(
        &self,
        path: &str,
        out: &mut Vec<T>,
        allow_resize: bool,
    ) -> Result<bool> {
        if !self.has_variable(path) {
            return Ok(false);
        }
        self.get(path, out, allow_resize)?;
        Ok(true)
    }

    /// Read this participant's value of a one-label-per-participant variable
    pub fn get_label_variable(&self, path: &str) -> Result<Label> {
        let mut values: Vec<Label> = Vec::new();
        self.get(path, &mut values, true)?;
        match values.as_slice() {
            [value] => Ok(*value),
            other => Err(Error::partition(
                path,
                format!("expected one value for this participant, found {}", other.len()),
            )),
        }
    }
}
