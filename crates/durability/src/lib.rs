//! Checkpoint/restart sessions for meshstate
//!
//! This crate composes the container backend into checkpoints:
//!
//! - Topology tracking: decides whether mesh geometry is rewritten or referenced
//! - Mesh, field and cloud codecs
//! - Time snapshot persistence
//! - Writer and reader sessions
//! - Restart resolution over a directory of instants
//! - Stop policy and region selection
//! - TOML configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cloud;
pub mod config;
pub mod control;
pub mod field;
pub mod mesh;
pub mod policy;
pub mod reader;
pub mod restart;
pub mod time;
pub mod tracker;
pub mod writer;

pub use config::{CheckpointConfig, ConfigError, RegionConfig, CONFIG_FILE_NAME};
pub use control::RegionControl;
pub use policy::{RestartPolicy, StopControl, StopPolicy};
pub use reader::CheckpointReader;
pub use restart::{find_times, restart_candidates, Instant, RestartError, RestartResolver};
pub use time::{read_time, write_time};
pub use tracker::{MeshPlan, TopologyRecord, TopologyTracker};
pub use writer::{CheckpointWriter, WriteSummary, REGIONS_ATTRIBUTE};
