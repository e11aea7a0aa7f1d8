//! Storage codec abstraction.
//!
//! Every container payload passes through a codec between the MessagePack
//! image and the bytes on disk. The codec id is recorded in each container
//! file header so a reader can select the matching codec on open.
//!
//! # Usage
//!
//! ```
//! use meshstate_storage::codec::get_codec;
//!
//! let codec = get_codec("identity").unwrap();
//! let encoded = codec.encode(b"payload");
//! assert_eq!(codec.decode(&encoded).unwrap(), b"payload");
//! ```

mod identity;
mod traits;

pub use identity::IdentityCodec;
pub use traits::{CodecError, StorageCodec};

/// Id of the codec used when none is configured
pub const DEFAULT_CODEC_ID: &str = "identity";

/// Get a codec by its identifier.
///
/// # Known Codecs
///
/// - `"identity"`: No-op codec (pass-through)
pub fn get_codec(codec_id: &str) -> Result<Box<dyn StorageCodec>, CodecError> {
    match codec_id {
        "identity" => Ok(Box::new(IdentityCodec)),
        _ => Err(CodecError::UnknownCodec(codec_id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_identity_codec() {
        let codec = get_codec(DEFAULT_CODEC_ID).unwrap();
        assert_eq!(codec.codec_id(), "identity");
    }

    #[test]
    fn test_get_unknown_codec() {
        let result = get_codec("zstd");
        assert!(matches!(result, Err(CodecError::UnknownCodec(ref id)) if id == "zstd"));
    }
}
