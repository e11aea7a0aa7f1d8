//! Input container
//!
//! Opens every container file of an instance, merges their attributes and
//! variable blocks, and serves this reader's selection of each variable.
//!
//! # Selection
//!
//! - Global arrays: when the reader runs with the writer's process count it
//!   receives the range its own rank wrote. Otherwise the global array is
//!   split evenly, rank `r` of `n` receiving `[g*r/n, g*(r+1)/n)`, so a
//!   single reader receives the whole array in offset order.
//! - Local blocks: only readable with the writer's process count; rank `r`
//!   receives the block rank `r` wrote.

use std::collections::BTreeMap;

use meshstate_core::naming::global_attribute;
use meshstate_core::{ElementKind, Error, Result};
use tracing::{debug, warn};

use crate::attributes::AttributeStore;
use crate::engine::COMPLETED_ATTRIBUTE;
use crate::format::{read_container, read_header};
use crate::handle::BackendHandle;
use crate::image::{Participant, StoredVariable, VariableShape};
use crate::layout::Location;
use crate::sizes::TypeSizes;

/// Shape summary of a stored variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableInfo {
    /// Element type as stored
    pub kind: ElementKind,
    /// Components per tuple
    pub components: usize,
    /// Global tuple count, `None` for local blocks
    pub global_count: Option<usize>,
}

/// This reader's part of one variable
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Element type as stored
    pub kind: ElementKind,
    /// Components per tuple
    pub components: usize,
    /// Number of tuples selected
    pub count: usize,
    /// Little-endian element bytes
    pub bytes: Vec<u8>,
}

/// Quick status of an instance, used to screen restart candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceStatus {
    /// Process count recorded by the writers (zero if no file exists)
    pub nprocs: usize,
    /// Number of container files found
    pub files: usize,
    /// Every rank file is present and carries the completed marker
    pub complete: bool,
}

/// Merged, read-only view of one checkpoint instance
#[derive(Debug)]
pub struct InputContainer {
    location: Location,
    reader: Participant,
    writer_nprocs: usize,
    complete: bool,
    attributes: AttributeStore,
    variables: BTreeMap<String, StoredVariable>,
    sizes: TypeSizes,
    handle: BackendHandle,
}

impl InputContainer {
    /// Open the instance at `location` for `reader`
    pub fn open(location: Location, reader: Participant) -> Result<Self> {
        let files = location.container_files()?;
        if files.is_empty() {
            return Err(Error::Backend(format!(
                "no container files at {}",
                location.path().display()
            )));
        }

        let mut writer_nprocs = None;
        let mut complete = true;
        let mut attributes = AttributeStore::new();
        let mut variables: BTreeMap<String, StoredVariable> = BTreeMap::new();

        for (rank, path) in &files {
            let loaded = read_container(path)?;
            let header = loaded.header.participant();
            if header.rank != *rank {
                return Err(Error::Backend(format!(
                    "{} holds rank {}",
                    path.display(),
                    header.rank
                )));
            }
            match writer_nprocs {
                None => writer_nprocs = Some(header.nprocs),
                Some(n) if n != header.nprocs => {
                    return Err(Error::Backend(format!(
                        "{} written by {} participants, expected {}",
                        path.display(),
                        header.nprocs,
                        n
                    )));
                }
                Some(_) => {}
            }

            let image = loaded.image;
            complete &= image
                .attributes
                .has_attribute(&global_attribute(COMPLETED_ATTRIBUTE));
            attributes.merge_missing(image.attributes);
            for (name, var) in image.variables {
                match variables.get_mut(&name) {
                    None => {
                        variables.insert(name, var);
                    }
                    Some(existing) => {
                        if existing.kind != var.kind
                            || existing.components != var.components
                            || existing.shape != var.shape
                        {
                            return Err(Error::Backend(format!(
                                "variable {name} declared inconsistently across ranks"
                            )));
                        }
                        existing.blocks.extend(var.blocks);
                    }
                }
            }
        }

        let writer_nprocs = writer_nprocs.unwrap_or(1);
        if files.len() != writer_nprocs {
            return Err(Error::Backend(format!(
                "{}: found {} of {} rank files",
                location.path().display(),
                files.len(),
                writer_nprocs
            )));
        }

        let sizes = TypeSizes::negotiate(&attributes);
        debug!(
            path = %location.path().display(),
            writer_nprocs,
            reader_rank = reader.rank,
            reader_nprocs = reader.nprocs,
            variables = variables.len(),
            complete,
            "Opened input container"
        );

        Ok(InputContainer {
            location,
            reader,
            writer_nprocs,
            complete,
            attributes,
            variables,
            sizes,
            handle: BackendHandle::acquire(),
        })
    }

    /// Screen an instance without merging it
    pub fn probe(location: &Location) -> Result<InstanceStatus> {
        let files = location.container_files()?;
        let Some((_, first)) = files.first() else {
            return Ok(InstanceStatus {
                nprocs: 0,
                files: 0,
                complete: false,
            });
        };
        let nprocs = read_header(first)?.participant().nprocs;
        let mut complete = files.len() == nprocs;
        if complete {
            for (_, path) in &files {
                let loaded = read_container(path)?;
                if !loaded
                    .image
                    .attributes
                    .has_attribute(&global_attribute(COMPLETED_ATTRIBUTE))
                {
                    complete = false;
                    break;
                }
            }
        }
        Ok(InstanceStatus {
            nprocs,
            files: files.len(),
            complete,
        })
    }

    /// Instance location
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Reading participant
    pub fn reader(&self) -> Participant {
        self.reader
    }

    /// Process count of the writers
    pub fn writer_nprocs(&self) -> usize {
        self.writer_nprocs
    }

    /// True if every writer closed its file
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Merged attributes
    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }

    /// Negotiated widths
    pub fn sizes(&self) -> TypeSizes {
        self.sizes
    }

    /// Backend handle held by this container
    pub fn handle(&self) -> &BackendHandle {
        &self.handle
    }

    /// True if `path` names a variable
    pub fn has_variable(&self, path: &str) -> bool {
        self.variables.contains_key(path)
    }

    /// Shape summary of `path`
    pub fn variable(&self, path: &str) -> Option<VariableInfo> {
        self.variables.get(path).map(|v| VariableInfo {
            kind: v.kind,
            components: v.components,
            global_count: v.global_count(),
        })
    }

    /// All variable paths, sorted
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// This reader's selection of `path`
    pub fn selection(&self, path: &str) -> Result<Selection> {
        let mut bytes = Vec::new();
        let (kind, components, count) = self.read_bytes_into(path, &mut bytes)?;
        Ok(Selection {
            kind,
            components,
            count,
            bytes,
        })
    }

    fn lookup(&self, path: &str) -> Result<&StoredVariable> {
        self.variables
            .get(path)
            .ok_or_else(|| Error::MissingVariable {
                path: path.to_string(),
            })
    }

    fn global_range(&self, var: &StoredVariable, global: usize) -> (usize, usize) {
        if self.writer_nprocs == self.reader.nprocs {
            match var.block_of(self.reader.rank) {
                Some(b) => (b.offset, b.offset + b.count),
                None => (0, 0),
            }
        } else {
            let n = self.reader.nprocs;
            let r = self.reader.rank;
            (global * r / n, global * (r + 1) / n)
        }
    }

    /// Tuple range `[start, end)` this reader selects from a global array
    ///
    /// `None` for local blocks.
    pub fn selected_range(&self, path: &str) -> Result<Option<(usize, usize)>> {
        let var = self.lookup(path)?;
        Ok(var
            .global_count()
            .map(|global| self.global_range(var, global)))
    }

    /// Append this reader's selection of `path` to `out`
    ///
    /// Returns the stored kind, components and selected tuple count.
    pub fn read_bytes_into(
        &self,
        path: &str,
        out: &mut Vec<u8>,
    ) -> Result<(ElementKind, usize, usize)> {
        let var = self.lookup(path)?;
        let tuple_bytes = var.components * var.kind.width();
        for block in &var.blocks {
            if block.bytes.len() != block.count * tuple_bytes {
                return Err(Error::Backend(format!(
                    "block of {path} from rank {} is corrupt",
                    block.rank
                )));
            }
        }

        let count = match var.shape {
            VariableShape::Local => {
                if self.writer_nprocs != self.reader.nprocs {
                    return Err(Error::partition(
                        path,
                        format!(
                            "per-participant data written by {} participants cannot be read by {}",
                            self.writer_nprocs, self.reader.nprocs
                        ),
                    ));
                }
                let block = var.block_of(self.reader.rank).ok_or_else(|| {
                    Error::partition(path, format!("no block for rank {}", self.reader.rank))
                })?;
                out.extend_from_slice(&block.bytes);
                block.count
            }
            VariableShape::Global { count: global } => {
                let (start, end) = self.global_range(var, global);
                assemble(path, var, start, end, tuple_bytes, out)?;
                end - start
            }
        };
        Ok((var.kind, var.components, count))
    }
}

/// Copy tuples `[start, end)` of a global variable out of its blocks
fn assemble(
    path: &str,
    var: &StoredVariable,
    start: usize,
    end: usize,
    tuple_bytes: usize,
    out: &mut Vec<u8>,
) -> Result<()> {
    let mut blocks: Vec<_> = var.blocks.iter().collect();
    blocks.sort_by_key(|b| b.offset);

    let mut cursor = start;
    for block in blocks {
        if cursor >= end {
            break;
        }
        let block_end = block.offset + block.count;
        if block_end <= cursor {
            continue;
        }
        if block.offset > cursor {
            warn!(path, gap_start = cursor, gap_end = block.offset, "Gap in global array");
            return Err(Error::partition(
                path,
                format!("no data for tuples [{}, {})", cursor, block.offset),
            ));
        }
        let take_end = end.min(block_end);
        let lo = (cursor - block.offset) * tuple_bytes;
        let hi = (take_end - block.offset) * tuple_bytes;
        out.extend_from_slice(&block.bytes[lo..hi]);
        cursor = take_end;
    }
    if cursor < end {
        return Err(Error::partition(
            path,
            format!("no data for tuples [{}, {})", cursor, end),
        ));
    }
    Ok(())
}
