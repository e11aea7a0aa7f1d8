//! Output engine
//!
//! One participant's writer for one checkpoint instance. The lifecycle is
//! `open → (begin_step → put* → end_step)* → close`. Variables may only be
//! put inside a step; attributes may be put at any time before close and
//! are visible to [`OutputEngine::attributes`] immediately.
//!
//! The container file is rewritten atomically at every `end_step`. `close`
//! adds the `completed` marker and writes the final file, so an instance
//! whose writer failed part way never carries the marker.

use meshstate_core::naming::global_attribute;
use meshstate_core::{ElementKind, Error, Extent, Result};
use tracing::{debug, info};

use crate::attributes::{AttributeStore, AttributeValue};
use crate::codec::{get_codec, StorageCodec};
use crate::format::{write_container, CONTAINER_FORMAT_VERSION};
use crate::handle::BackendHandle;
use crate::image::{Block, ContainerImage, Participant, StoredVariable, VariableShape};
use crate::layout::Location;
use crate::sizes::TypeSizes;

/// Global attribute marking a fully written instance
pub const COMPLETED_ATTRIBUTE: &str = "completed";

/// Global attribute holding the container format version
pub const VERSION_ATTRIBUTE: &str = "version";

/// Global attribute holding the number of writing participants
pub const NPROCS_ATTRIBUTE: &str = "nProcs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Open,
    InStep,
}

/// Writer for one participant's container file
pub struct OutputEngine {
    location: Location,
    participant: Participant,
    sizes: TypeSizes,
    codec: Box<dyn StorageCodec>,
    image: ContainerImage,
    state: EngineState,
    steps: u64,
    handle: BackendHandle,
}

impl std::fmt::Debug for OutputEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputEngine")
            .field("location", &self.location)
            .field("participant", &self.participant)
            .field("sizes", &self.sizes)
            .field("codec", &self.codec.codec_id())
            .field("state", &self.state)
            .field("steps", &self.steps)
            .finish()
    }
}

impl OutputEngine {
    /// Open an engine writing `participant`'s file at `location`
    ///
    /// Records the format version, process count and width markers.
    pub fn open(
        location: Location,
        participant: Participant,
        sizes: TypeSizes,
        codec_id: &str,
    ) -> Result<Self> {
        if participant.nprocs == 0 || participant.rank >= participant.nprocs {
            return Err(Error::InvalidOperation(format!(
                "invalid participant: rank {} of {}",
                participant.rank, participant.nprocs
            )));
        }
        location.container_file(participant)?;
        let codec = get_codec(codec_id).map_err(|e| Error::Backend(e.to_string()))?;
        location.prepare()?;

        let mut image = ContainerImage::default();
        image.attributes.put(
            global_attribute(VERSION_ATTRIBUTE),
            CONTAINER_FORMAT_VERSION as i64,
        );
        image
            .attributes
            .put(global_attribute(NPROCS_ATTRIBUTE), participant.nprocs as i64);
        sizes.put(&mut image.attributes);

        debug!(
            path = %location.path().display(),
            rank = participant.rank,
            nprocs = participant.nprocs,
            "Opened output engine"
        );

        Ok(OutputEngine {
            location,
            participant,
            sizes,
            codec,
            image,
            state: EngineState::Open,
            steps: 0,
            handle: BackendHandle::acquire(),
        })
    }

    /// Instance location
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Writing participant
    pub fn participant(&self) -> Participant {
        self.participant
    }

    /// Stored widths
    pub fn sizes(&self) -> TypeSizes {
        self.sizes
    }

    /// Backend handle held by this engine
    pub fn handle(&self) -> &BackendHandle {
        &self.handle
    }

    /// Number of completed steps
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// True between `begin_step` and `end_step`
    pub fn in_step(&self) -> bool {
        self.state == EngineState::InStep
    }

    /// Attributes defined so far
    pub fn attributes(&self) -> &AttributeStore {
        &self.image.attributes
    }

    /// Define an attribute; see [`AttributeStore::put`]
    pub fn put_attribute(&mut self, path: impl Into<String>, value: impl Into<AttributeValue>) -> bool {
        self.image.attributes.put(path, value)
    }

    /// True if the variable has been put
    pub fn has_variable(&self, path: &str) -> bool {
        self.image.variables.contains_key(path)
    }

    /// Variable paths put so far
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.image.variables.keys().map(String::as_str)
    }

    /// Start a step
    pub fn begin_step(&mut self) -> Result<()> {
        if self.state == EngineState::InStep {
            return Err(Error::InvalidOperation("begin_step inside a step".into()));
        }
        self.state = EngineState::InStep;
        Ok(())
    }

    /// Finish a step and flush the container file
    pub fn end_step(&mut self) -> Result<()> {
        if self.state != EngineState::InStep {
            return Err(Error::InvalidOperation("end_step outside a step".into()));
        }
        self.flush()?;
        self.state = EngineState::Open;
        self.steps += 1;
        Ok(())
    }

    /// Mark the instance complete and write the final file
    ///
    /// An open step is ended first.
    pub fn close(mut self) -> Result<()> {
        if self.state == EngineState::InStep {
            debug!(rank = self.participant.rank, "Ending open step at close");
            self.state = EngineState::Open;
            self.steps += 1;
        }
        self.image
            .attributes
            .put(global_attribute(COMPLETED_ATTRIBUTE), 1i64);
        self.flush()?;
        info!(
            path = %self.location.path().display(),
            rank = self.participant.rank,
            variables = self.image.variables.len(),
            attributes = self.image.attributes.len(),
            "Closed output engine"
        );
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let file = self.location.container_file(self.participant)?;
        write_container(&file, self.participant, self.codec.as_ref(), &self.image)?;
        Ok(())
    }

    fn check_put(&self, path: &str) -> Result<()> {
        if self.state != EngineState::InStep {
            return Err(Error::InvalidOperation(format!(
                "variable {path} put outside a step"
            )));
        }
        if self.image.variables.contains_key(path) {
            return Err(Error::InvalidOperation(format!(
                "variable {path} defined twice"
            )));
        }
        Ok(())
    }

    fn check_bytes(path: &str, kind: ElementKind, tuples: usize, components: usize, bytes: &[u8]) -> Result<()> {
        let expected = tuples * components;
        if bytes.len() != expected * kind.width() {
            return Err(Error::SizeMismatch {
                path: path.to_string(),
                expected,
                actual: bytes.len() / kind.width(),
            });
        }
        Ok(())
    }

    /// Put this participant's slice of a global array
    ///
    /// `extent` counts tuples of `components` elements of `kind`.
    pub fn put_global_bytes(
        &mut self,
        path: &str,
        kind: ElementKind,
        components: usize,
        extent: Extent,
        bytes: Vec<u8>,
    ) -> Result<()> {
        self.check_put(path)?;
        if !extent.is_consistent() {
            return Err(Error::partition(
                path,
                format!(
                    "slice [{}, {}) exceeds global count {}",
                    extent.offset,
                    extent.end(),
                    extent.global
                ),
            ));
        }
        Self::check_bytes(path, kind, extent.local, components, &bytes)?;
        debug!(path, %kind, local = extent.local, global = extent.global, offset = extent.offset, "Put global variable");
        self.image.variables.insert(
            path.to_string(),
            StoredVariable {
                kind,
                components,
                shape: VariableShape::Global {
                    count: extent.global,
                },
                blocks: vec![Block {
                    rank: self.participant.rank,
                    offset: extent.offset,
                    count: extent.local,
                    bytes,
                }],
            },
        );
        Ok(())
    }

    /// Put a per-participant block with no global addressing
    pub fn put_local_bytes(
        &mut self,
        path: &str,
        kind: ElementKind,
        components: usize,
        count: usize,
        bytes: Vec<u8>,
    ) -> Result<()> {
        self.check_put(path)?;
        Self::check_bytes(path, kind, count, components, &bytes)?;
        debug!(path, %kind, count, "Put local variable");
        self.image.variables.insert(
            path.to_string(),
            StoredVariable {
                kind,
                components,
                shape: VariableShape::Local,
                blocks: vec![Block {
                    rank: self.participant.rank,
                    offset: 0,
                    count,
                    bytes,
                }],
            },
        );
        Ok(())
    }
}
