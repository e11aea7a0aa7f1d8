//! Checkpoint configuration via TOML
//!
//! Mirrors the keys a host passes to the checkpoint function object:
//! where instances live, stored widths, layout, restart and stop policies,
//! and per-region selection patterns. Keyword fields are kept as strings in
//! the file and parsed into policies on demand.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use meshstate_core::naming::{DEFAULT_REGION, SEPARATOR};
use meshstate_core::{NameFilter, PatternError, Scalar};
use meshstate_storage::{get_codec, Layout, StreamFormat, TypeSizes};

use crate::control::RegionControl;
use crate::policy::{RestartPolicy, StopPolicy};

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "meshstate.toml";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Config file could not be written
    #[error("Failed to write config file '{path}': {source}")]
    Write {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// TOML parse error
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Label or scalar width not 4 or 8
    #[error("Invalid {which} width {width}: expected 4 or 8")]
    InvalidWidth {
        /// "label" or "scalar"
        which: &'static str,
        /// Configured width
        width: usize,
    },

    /// Unknown storage codec
    #[error("Unknown storage codec '{0}'")]
    InvalidCodec(String),

    /// Unknown restart keyword
    #[error("Invalid restart_from '{0}': expected \"none\", \"restartTime\" or \"latestTime\"")]
    InvalidRestart(String),

    /// `restartTime` without a time
    #[error("restart_from = \"restartTime\" requires restart_time")]
    MissingRestartTime,

    /// Unknown stop keyword
    #[error("Invalid stop_at '{0}': expected \"none\", \"now\" or \"stopTime\"")]
    InvalidStop(String),

    /// `stopTime` without a time
    #[error("stop_at = \"stopTime\" requires stop_time")]
    MissingStopTime,

    /// Bad name pattern in a region section
    #[error("Region '{region}': {source}")]
    InvalidPattern {
        /// Region name
        region: String,
        /// Pattern error
        #[source]
        source: PatternError,
    },

    /// Region name that cannot form variable paths, or is listed twice
    #[error("Invalid region name '{region}': {reason}")]
    InvalidRegion {
        /// Region name
        region: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Non-positive or non-finite tolerance
    #[error("Invalid time_tolerance {0}: must be positive and finite")]
    InvalidTolerance(Scalar),
}

/// Per-region selection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Region name
    pub name: String,
    /// Only write requested fields and clouds
    #[serde(default)]
    pub explicit_write: bool,
    /// Field patterns to write
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub write_fields: Vec<String>,
    /// Field patterns never written
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_fields: Vec<String>,
    /// Cloud patterns to write
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub write_clouds: Vec<String>,
    /// Cloud patterns never written
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_clouds: Vec<String>,
}

impl RegionConfig {
    /// Region with default selection
    pub fn new(name: impl Into<String>) -> Self {
        RegionConfig {
            name: name.into(),
            explicit_write: false,
            write_fields: Vec::new(),
            ignore_fields: Vec::new(),
            write_clouds: Vec::new(),
            ignore_clouds: Vec::new(),
        }
    }

    /// Compile into a [`RegionControl`]
    pub fn control(&self) -> Result<RegionControl, ConfigError> {
        let wrap = |source| ConfigError::InvalidPattern {
            region: self.name.clone(),
            source,
        };
        let fields = NameFilter::new(&self.write_fields, &self.ignore_fields).map_err(wrap)?;
        let clouds = NameFilter::new(&self.write_clouds, &self.ignore_clouds).map_err(wrap)?;
        Ok(RegionControl::new(&self.name)
            .with_explicit_write(self.explicit_write)
            .with_fields(fields)
            .with_clouds(clouds))
    }
}

/// Checkpoint configuration loaded from `meshstate.toml`.
///
/// # Example
///
/// ```toml
/// data_dir = "checkpointData"
/// restart_from = "latestTime"
///
/// [[regions]]
/// name = "fluid"
/// ignore_fields = ["grad.*"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Directory holding the instances
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Stored label width in bytes
    #[serde(default = "default_width")]
    pub label_width: usize,
    /// Stored scalar width in bytes
    #[serde(default = "default_width")]
    pub scalar_width: usize,
    /// Instance layout
    #[serde(default)]
    pub layout: Layout,
    /// Byte-stream encoding
    #[serde(default)]
    pub stream_format: StreamFormat,
    /// Storage codec id
    #[serde(default = "default_codec")]
    pub codec: String,
    /// Restart keyword: `"none"`, `"restartTime"` or `"latestTime"`
    #[serde(default = "default_none")]
    pub restart_from: String,
    /// Time to restart from with `"restartTime"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_time: Option<Scalar>,
    /// Stop keyword: `"none"`, `"now"` or `"stopTime"`
    #[serde(default = "default_none")]
    pub stop_at: String,
    /// Time to stop at with `"stopTime"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<Scalar>,
    /// Relative tolerance when matching a restart time
    #[serde(default = "default_tolerance")]
    pub time_tolerance: Scalar,
    /// Region sections; empty means the default region only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<RegionConfig>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("checkpointData")
}

fn default_width() -> usize {
    8
}

fn default_codec() -> String {
    meshstate_storage::DEFAULT_CODEC_ID.to_string()
}

fn default_none() -> String {
    "none".to_string()
}

fn default_tolerance() -> Scalar {
    1e-8
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        CheckpointConfig {
            data_dir: default_data_dir(),
            label_width: default_width(),
            scalar_width: default_width(),
            layout: Layout::default(),
            stream_format: StreamFormat::default(),
            codec: default_codec(),
            restart_from: default_none(),
            restart_time: None,
            stop_at: default_none(),
            stop_time: None,
            time_tolerance: default_tolerance(),
            regions: Vec::new(),
        }
    }
}

impl CheckpointConfig {
    /// Default configuration rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        CheckpointConfig {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Set the stored widths
    pub fn with_widths(mut self, label_width: usize, scalar_width: usize) -> Self {
        self.label_width = label_width;
        self.scalar_width = scalar_width;
        self
    }

    /// Set the layout
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the byte-stream encoding
    pub fn with_stream_format(mut self, format: StreamFormat) -> Self {
        self.stream_format = format;
        self
    }

    /// Set the restart policy
    pub fn with_restart(mut self, policy: RestartPolicy) -> Self {
        self.restart_from = policy.keyword().to_string();
        self.restart_time = match policy {
            RestartPolicy::Time(t) => Some(t),
            _ => None,
        };
        self
    }

    /// Set the stop policy
    pub fn with_stop(mut self, policy: StopPolicy) -> Self {
        self.stop_at = policy.keyword().to_string();
        self.stop_time = match policy {
            StopPolicy::Time(t) => Some(t),
            _ => None,
        };
        self
    }

    /// Set the restart time tolerance
    pub fn with_time_tolerance(mut self, tolerance: Scalar) -> Self {
        self.time_tolerance = tolerance;
        self
    }

    /// Add a region section
    pub fn with_region(mut self, region: RegionConfig) -> Self {
        self.regions.push(region);
        self
    }

    /// Parse the restart keyword
    pub fn restart_policy(&self) -> Result<RestartPolicy, ConfigError> {
        match self.restart_from.as_str() {
            "none" => Ok(RestartPolicy::None),
            "latestTime" => Ok(RestartPolicy::Latest),
            "restartTime" => self
                .restart_time
                .map(RestartPolicy::Time)
                .ok_or(ConfigError::MissingRestartTime),
            other => Err(ConfigError::InvalidRestart(other.to_string())),
        }
    }

    /// Parse the stop keyword
    pub fn stop_policy(&self) -> Result<StopPolicy, ConfigError> {
        match self.stop_at.as_str() {
            "none" => Ok(StopPolicy::None),
            "now" => Ok(StopPolicy::Now),
            "stopTime" => self
                .stop_time
                .map(StopPolicy::Time)
                .ok_or(ConfigError::MissingStopTime),
            other => Err(ConfigError::InvalidStop(other.to_string())),
        }
    }

    /// Stored widths
    pub fn type_sizes(&self) -> Result<TypeSizes, ConfigError> {
        for (which, width) in [("label", self.label_width), ("scalar", self.scalar_width)] {
            if width != 4 && width != 8 {
                return Err(ConfigError::InvalidWidth { which, width });
            }
        }
        TypeSizes::new(self.label_width, self.scalar_width).map_err(|_| ConfigError::InvalidWidth {
            which: "label",
            width: self.label_width,
        })
    }

    /// Compiled region controls, in configuration order
    ///
    /// Region names must be non-empty, unique and free of the path
    /// separator.
    pub fn region_controls(&self) -> Result<Vec<RegionControl>, ConfigError> {
        if self.regions.is_empty() {
            return Ok(vec![RegionControl::new(DEFAULT_REGION)]);
        }
        for (i, region) in self.regions.iter().enumerate() {
            let reason = if region.name.is_empty() {
                Some("empty name")
            } else if region.name.contains(SEPARATOR) {
                Some("contains the path separator")
            } else if self.regions[..i].iter().any(|r| r.name == region.name) {
                Some("listed more than once")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(ConfigError::InvalidRegion {
                    region: region.name.clone(),
                    reason,
                });
            }
        }
        self.regions.iter().map(RegionConfig::control).collect()
    }

    /// Check every setting
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.type_sizes()?;
        get_codec(&self.codec).map_err(|_| ConfigError::InvalidCodec(self.codec.clone()))?;
        self.restart_policy()?;
        self.stop_policy()?;
        if !(self.time_tolerance.is_finite() && self.time_tolerance > 0.0) {
            return Err(ConfigError::InvalidTolerance(self.time_tolerance));
        }
        self.region_controls()?;
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# meshstate checkpoint configuration
#
# Directory holding one instance per checkpoint time
data_dir = "checkpointData"

# Stored widths in bytes (4 or 8)
label_width = 8
scalar_width = 8

# Instance layout: "directory" (one file per process) or "file" (serial only)
layout = "directory"

# Boundary/patch record encoding: "binary" or "text"
stream_format = "binary"

# Storage codec
codec = "identity"

# Restart: "none", "restartTime" (with restart_time) or "latestTime"
restart_from = "none"
# restart_time = 0.5

# Stop after a checkpoint: "none", "now" or "stopTime" (with stop_time)
stop_at = "none"
# stop_time = 1.0

# Relative tolerance when matching restart_time
time_tolerance = 1e-8

# Per-region selection. Without any [[regions]] only "region0" is written.
# [[regions]]
# name = "fluid"
# explicit_write = false
# write_fields = ["U", "p"]
# ignore_fields = ["grad.*"]
# write_clouds = []
# ignore_clouds = []
"#
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CheckpointConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize this config to TOML and write it to `path`
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
