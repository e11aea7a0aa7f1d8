//! Identity codec (no transformation).

use super::traits::{CodecError, StorageCodec};

/// Pass-through codec; container payloads are stored as produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl StorageCodec for IdentityCodec {
    fn encode(&self, data: &[u8]) -> Vec<u8> {
        data.to_vec()
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }

    fn codec_id(&self) -> &str {
        "identity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_passes_bytes_through() {
        let codec = IdentityCodec;
        let data = vec![0x4d, 0x53, 0x43, 0x4b, 0x00];
        let encoded = codec.encode(&data);
        assert_eq!(encoded, data);
        assert_eq!(codec.decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_identity_empty_payload() {
        let codec = IdentityCodec;
        assert!(codec.encode(&[]).is_empty());
        assert!(codec.decode(&[]).unwrap().is_empty());
    }
}
