//! On-disk location of one checkpoint instance
//!
//! ```text
//! <data_dir>/
//! ├── 0.1/                    # directory layout
//! │   ├── rank-000000.blk
//! │   └── rank-000001.blk
//! └── 0.2.ckpt                # single-file layout (serial runs only)
//! ```

use std::path::{Path, PathBuf};

use meshstate_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::image::Participant;

/// Extension of single-file instances
pub const FILE_EXTENSION: &str = "ckpt";

/// Extension of per-rank files inside a directory instance
pub const RANK_FILE_EXTENSION: &str = "blk";

/// Instance layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// One directory per instance holding one file per rank
    #[default]
    Directory,
    /// One file per instance (legacy, serial only)
    File,
}

impl Layout {
    /// Keyword used in configuration
    pub fn name(self) -> &'static str {
        match self {
            Layout::Directory => "directory",
            Layout::File => "file",
        }
    }
}

/// File name of `rank`'s container inside a directory instance
pub fn rank_file_name(rank: usize) -> String {
    format!("rank-{:06}.{}", rank, RANK_FILE_EXTENSION)
}

/// Parse a rank from a rank file name
///
/// Returns None if the file name doesn't match the expected format.
pub fn parse_rank_file_name(file_name: &str) -> Option<usize> {
    let stem = file_name
        .strip_prefix("rank-")?
        .strip_suffix(RANK_FILE_EXTENSION)?
        .strip_suffix('.')?;
    stem.parse().ok()
}

/// Where one checkpoint instance lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// Directory instance
    Directory(PathBuf),
    /// Single-file instance
    File(PathBuf),
}

impl Location {
    /// Location of the instance named `instance` under `data_dir`
    pub fn new(data_dir: &Path, instance: &str, layout: Layout) -> Self {
        match layout {
            Layout::Directory => Location::Directory(data_dir.join(instance)),
            Layout::File => {
                Location::File(data_dir.join(format!("{}.{}", instance, FILE_EXTENSION)))
            }
        }
    }

    /// Path of the directory or file
    pub fn path(&self) -> &Path {
        match self {
            Location::Directory(p) | Location::File(p) => p,
        }
    }

    /// Layout of this location
    pub fn layout(&self) -> Layout {
        match self {
            Location::Directory(_) => Layout::Directory,
            Location::File(_) => Layout::File,
        }
    }

    /// Container file of `participant`
    ///
    /// Single-file instances only accept a serial participant.
    pub fn container_file(&self, participant: Participant) -> Result<PathBuf> {
        match self {
            Location::Directory(dir) => Ok(dir.join(rank_file_name(participant.rank))),
            Location::File(file) if !participant.is_parallel() => Ok(file.clone()),
            Location::File(file) => Err(Error::InvalidOperation(format!(
                "single-file instance {} cannot hold {} participants",
                file.display(),
                participant.nprocs
            ))),
        }
    }

    /// Create the directory that will hold the container files
    pub fn prepare(&self) -> Result<()> {
        match self {
            Location::Directory(dir) => std::fs::create_dir_all(dir)?,
            Location::File(file) => {
                if let Some(parent) = file.parent() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }
        Ok(())
    }

    /// Existing container files, sorted by rank
    pub fn container_files(&self) -> Result<Vec<(usize, PathBuf)>> {
        match self {
            Location::File(file) => {
                if file.is_file() {
                    Ok(vec![(0, file.clone())])
                } else {
                    Ok(Vec::new())
                }
            }
            Location::Directory(dir) => {
                let mut files = Vec::new();
                if !dir.is_dir() {
                    return Ok(files);
                }
                for entry in std::fs::read_dir(dir)? {
                    let entry = entry?;
                    let name = entry.file_name().to_string_lossy().to_string();
                    if let Some(rank) = parse_rank_file_name(&name) {
                        files.push((rank, entry.path()));
                    }
                }
                files.sort_by_key(|(rank, _)| *rank);
                Ok(files)
            }
        }
    }
}
