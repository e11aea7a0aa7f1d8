//! Restart resolution
//!
//! Scans a data directory for checkpoint instants, in either layout, and
//! resolves a [`RestartPolicy`] to one of them. Instants are ordered by
//! their numeric time value; among equal values the lexicographically
//! greater name wins, and a directory instance shadows a single-file
//! instance of the same name.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use meshstate_core::{Scalar, TimeSnapshot};
use meshstate_storage::{InputContainer, Layout, Location, Participant, FILE_EXTENSION};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::policy::RestartPolicy;
use crate::time::read_time;

/// Restart failures
///
/// All of these are fatal for startup.
#[derive(Debug, Error)]
pub enum RestartError {
    /// No instant matches the requested time
    #[error("No checkpoint at time {time}")]
    NotFound {
        /// Requested time
        time: Scalar,
    },

    /// The data directory holds no usable instants
    #[error("No checkpoints in {}", dir.display())]
    NoCheckpoints {
        /// Data directory
        dir: PathBuf,
    },

    /// The resolved instant could not be opened or scanned
    #[error("Checkpoint {instance} is unusable: {source}")]
    Unusable {
        /// Instance name
        instance: String,
        /// Underlying error
        #[source]
        source: meshstate_core::Error,
    },

    /// The resolved instant carries no valid time snapshot
    #[error("Checkpoint {instance} has no valid time snapshot")]
    InvalidTime {
        /// Instance name
        instance: String,
    },

    /// Directory scan failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One checkpoint instant found on disk
#[derive(Debug, Clone, PartialEq)]
pub struct Instant {
    /// Instance name (the time name)
    pub name: String,
    /// Time value parsed from the name
    pub value: Scalar,
    /// Where the instance lives
    pub location: Location,
}

fn parse_time(name: &str) -> Option<Scalar> {
    name.parse::<Scalar>().ok().filter(|t| t.is_finite())
}

/// Enumerate the instants under `dir`, sorted by time
///
/// A missing directory yields an empty list.
pub fn find_times(dir: &Path) -> std::io::Result<Vec<Instant>> {
    let mut found: BTreeMap<String, Instant> = BTreeMap::new();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };

        if path.is_dir() {
            if let Some(value) = parse_time(file_name) {
                found.insert(
                    file_name.to_string(),
                    Instant {
                        name: file_name.to_string(),
                        value,
                        location: Location::new(dir, file_name, Layout::Directory),
                    },
                );
            }
        } else if let Some(stem) = file_name
            .strip_suffix(FILE_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
        {
            if let Some(value) = parse_time(stem) {
                found.entry(stem.to_string()).or_insert_with(|| Instant {
                    name: stem.to_string(),
                    value,
                    location: Location::new(dir, stem, Layout::File),
                });
            }
        }
    }

    let mut instants: Vec<Instant> = found.into_values().collect();
    instants.sort_by(|a, b| a.value.total_cmp(&b.value).then_with(|| a.name.cmp(&b.name)));
    Ok(instants)
}

/// Instants that may be restarted from
///
/// Instances that parse but lack rank files or the completion marker are
/// dropped with a warning. Instances that fail to parse are kept so that
/// selecting one reports the failure.
pub fn restart_candidates(dir: &Path) -> std::io::Result<Vec<Instant>> {
    let mut candidates = Vec::new();
    for instant in find_times(dir)? {
        match InputContainer::probe(&instant.location) {
            Ok(status) if status.complete => candidates.push(instant),
            Ok(status) => warn!(
                instance = %instant.name,
                files = status.files,
                nprocs = status.nprocs,
                "Excluding incomplete checkpoint"
            ),
            Err(e) => {
                debug!(instance = %instant.name, error = %e, "Checkpoint failed probe");
                candidates.push(instant);
            }
        }
    }
    Ok(candidates)
}

/// Resolves a restart policy against a data directory
#[derive(Debug, Clone, Copy)]
pub struct RestartResolver {
    policy: RestartPolicy,
    tolerance: Scalar,
}

impl RestartResolver {
    /// Create a resolver with relative time tolerance `tolerance`
    pub fn new(policy: RestartPolicy, tolerance: Scalar) -> Self {
        RestartResolver { policy, tolerance }
    }

    /// Configured policy
    pub fn policy(&self) -> RestartPolicy {
        self.policy
    }

    /// True if `value` matches `time` within tolerance
    pub fn matches(&self, value: Scalar, time: Scalar) -> bool {
        (value - time).abs() <= self.tolerance * time.abs().max(1.0)
    }

    /// Pick the instant to restart from
    ///
    /// `None` never touches the filesystem.
    pub fn resolve(&self, dir: &Path) -> Result<Option<Instant>, RestartError> {
        let chosen = match self.policy {
            RestartPolicy::None => return Ok(None),
            RestartPolicy::Latest => restart_candidates(dir)?
                .pop()
                .ok_or_else(|| RestartError::NoCheckpoints {
                    dir: dir.to_path_buf(),
                })?,
            RestartPolicy::Time(time) => restart_candidates(dir)?
                .into_iter()
                .rev()
                .find(|i| self.matches(i.value, time))
                .ok_or(RestartError::NotFound { time })?,
        };
        info!(policy = self.policy.keyword(), instance = %chosen.name, "Resolved restart instant");
        Ok(Some(chosen))
    }
}

/// Open `instant` for `reader` and read its time snapshot
///
/// Failure to open or an invalid snapshot is a restart failure.
pub fn open_instant(
    instant: &Instant,
    reader: Participant,
) -> Result<(InputContainer, TimeSnapshot), RestartError> {
    let input = InputContainer::open(instant.location.clone(), reader).map_err(|source| {
        RestartError::Unusable {
            instance: instant.name.clone(),
            source,
        }
    })?;
    let time = read_time(input.attributes());
    if !time.is_valid() {
        return Err(RestartError::InvalidTime {
            instance: instant.name.clone(),
        });
    }
    Ok((input, time))
}
