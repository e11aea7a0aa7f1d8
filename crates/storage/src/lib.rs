//! Container backend for meshstate
//!
//! This crate implements the self-describing container that checkpoints are
//! written into:
//! - OutputEngine: per-participant writer with open/step/close lifecycle
//! - InputContainer: merged reader over all participants' files
//! - AttributeStore: define-once attributes with mandatory/optional reads
//! - TypeSizes: label/scalar width negotiation
//! - Variable codec: typed global arrays, local blocks, per-participant labels
//! - Byte-stream codec: serde records in opaque byte variables
//! - BackendHandle: process-wide backend state and scratch buffer
//! - StorageCodec seam and crash-safe, checksummed container files

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attributes;
pub mod codec;
pub mod element;
pub mod engine;
pub mod format;
pub mod handle;
pub mod image;
pub mod input;
pub mod layout;
pub mod sizes;
pub mod stream;
pub mod variable;

pub use attributes::{AttributeStore, AttributeType, AttributeValue};
pub use codec::{get_codec, CodecError, IdentityCodec, StorageCodec, DEFAULT_CODEC_ID};
pub use element::Element;
pub use engine::{OutputEngine, COMPLETED_ATTRIBUTE, NPROCS_ATTRIBUTE, VERSION_ATTRIBUTE};
pub use format::{FormatError, CONTAINER_FORMAT_VERSION};
pub use handle::BackendHandle;
pub use image::Participant;
pub use input::{InputContainer, InstanceStatus, Selection, VariableInfo};
pub use layout::{Layout, Location, FILE_EXTENSION};
pub use sizes::TypeSizes;
pub use stream::StreamFormat;
