//! Storage codec trait definitions.

/// Transformation applied to container payloads.
///
/// Codecs must be `Send + Sync`; one instance is shared by every container
/// file an engine writes.
///
/// # Codec Identity
///
/// Each codec has a unique identifier that is stored in the container file
/// header so the reader can pick the same codec when opening.
pub trait StorageCodec: Send + Sync {
    /// Encode a payload for storage.
    fn encode(&self, data: &[u8]) -> Vec<u8>;

    /// Decode a stored payload.
    ///
    /// Returns an error if the data cannot be decoded.
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Unique codec identifier.
    fn codec_id(&self) -> &str;
}

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Decoding failed (invalid or corrupted payload).
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Unknown codec identifier.
    #[error("Unknown codec: {0}")]
    UnknownCodec(String),

    /// Codec id is longer than the header can record.
    #[error("Codec id too long: {0}")]
    IdTooLong(String),
}
