//! Byte-stream codec
//!
//! Records without a flat numeric shape (boundary patch descriptions, patch
//! layouts) are serialized through serde into one opaque per-participant
//! byte variable. The representation is recorded in a `format` attribute
//! next to the variable so the reader decodes with the same one.
//!
//! Encoding and decoding run through the backend's scratch buffer. The
//! serializer grows the scratch buffer, and the engine keeps one exact-size
//! copy of the encoded bytes until the container file is flushed.

use meshstate_core::naming::join;
use meshstate_core::{ElementKind, Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::OutputEngine;
use crate::input::InputContainer;

/// Attribute leaf recording a stream's representation
pub const FORMAT_ATTRIBUTE: &str = "format";

/// Representation of a byte-stream record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamFormat {
    /// MessagePack with named fields
    #[default]
    Binary,
    /// JSON text
    Text,
}

impl StreamFormat {
    /// Keyword used in configuration and in the format attribute
    pub fn name(self) -> &'static str {
        match self {
            StreamFormat::Binary => "binary",
            StreamFormat::Text => "text",
        }
    }

    /// Parse a keyword
    pub fn from_name(name: &str) -> Option<StreamFormat> {
        match name {
            "binary" => Some(StreamFormat::Binary),
            "text" => Some(StreamFormat::Text),
            _ => None,
        }
    }
}

impl OutputEngine {
    /// Serialize `record` into the byte variable `path`
    pub fn put_stream<S: Serialize + ?Sized>(
        &mut self,
        path: &str,
        record: &S,
        format: StreamFormat,
    ) -> Result<()> {
        let handle = self.handle().clone();
        let bytes = handle.with_scratch(|buf| -> Result<Vec<u8>> {
            match format {
                StreamFormat::Binary => rmp_serde::encode::write_named(buf, record)
                    .map_err(|e| Error::stream(path, e))?,
                StreamFormat::Text => {
                    serde_json::to_writer(&mut *buf, record).map_err(|e| Error::stream(path, e))?
                }
            }
            Ok(buf.clone())
        })?;
        debug!(path, format = format.name(), bytes = bytes.len(), "Put byte stream");
        self.put_local_bytes(path, ElementKind::U8, 1, bytes.len(), bytes)?;
        self.put_attribute(join(path, FORMAT_ATTRIBUTE), format.name());
        Ok(())
    }
}

impl InputContainer {
    /// Representation of the stream at `path`
    pub fn stream_format(&self, path: &str) -> Result<StreamFormat> {
        let attr = join(path, FORMAT_ATTRIBUTE);
        match self.attributes().attribute_if_present::<String>(&attr) {
            None => {
                warn!(path, "Byte stream has no format attribute, assuming binary");
                Ok(StreamFormat::Binary)
            }
            Some(name) => StreamFormat::from_name(&name)
                .ok_or_else(|| Error::stream(path, format!("unknown stream format '{name}'"))),
        }
    }

    /// Decode the byte variable `path` into a record
    pub fn get_stream<D: DeserializeOwned>(&self, path: &str) -> Result<D> {
        let format = self.stream_format(path)?;
        self.handle().with_scratch(|buf| {
            let (kind, _, _) = self.read_bytes_into(path, buf)?;
            if kind != ElementKind::U8 {
                return Err(Error::TypeMismatch {
                    path: path.to_string(),
                    stored: kind,
                    requested: ElementKind::U8,
                });
            }
            match format {
                StreamFormat::Binary => {
                    rmp_serde::from_slice(buf).map_err(|e| Error::stream(path, e))
                }
                StreamFormat::Text => serde_json::from_slice(buf).map_err(|e| Error::stream(path, e)),
            }
        })
    }
}
