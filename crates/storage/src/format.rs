//! Container file format
//!
//! Each participant persists its [`ContainerImage`] to one file.
//!
//! # File Structure
//!
//! ```text
//! +------------------+ 0
//! | ContainerHeader  | 32 bytes
//! +------------------+ 32
//! | Codec ID         | header.codec_id_len bytes
//! +------------------+
//! | Payload          | codec-encoded MessagePack image
//! +------------------+
//! | Footer CRC32     | 4 bytes (over everything above)
//! +------------------+
//! ```
//!
//! Files are replaced atomically: write to a temporary sibling, fsync,
//! rename over the final path, fsync the parent directory. A reader sees
//! either the previous complete file or the new one.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::codec::{get_codec, CodecError, StorageCodec};
use crate::image::{ContainerImage, Participant};

/// Magic bytes: "MSCK"
pub const CONTAINER_MAGIC: [u8; 4] = *b"MSCK";

/// Container format version
pub const CONTAINER_FORMAT_VERSION: u32 = 1;

/// Header size in bytes
pub const CONTAINER_HEADER_SIZE: usize = 32;

/// Fixed-size container file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Magic bytes
    pub magic: [u8; 4],
    /// Format version
    pub format_version: u32,
    /// Writing participant's rank
    pub rank: u32,
    /// Number of writing participants
    pub nprocs: u32,
    /// Length of the codec id that follows the header
    pub codec_id_len: u8,
    /// Reserved for future use
    pub reserved: [u8; 15],
}

impl ContainerHeader {
    /// Create a header for `participant`
    pub fn new(participant: Participant, codec_id_len: u8) -> Self {
        ContainerHeader {
            magic: CONTAINER_MAGIC,
            format_version: CONTAINER_FORMAT_VERSION,
            rank: participant.rank as u32,
            nprocs: participant.nprocs as u32,
            codec_id_len,
            reserved: [0u8; 15],
        }
    }

    /// Writing participant
    pub fn participant(&self) -> Participant {
        Participant::new(self.rank as usize, self.nprocs as usize)
    }

    /// Serialize header to bytes
    pub fn to_bytes(&self) -> [u8; CONTAINER_HEADER_SIZE] {
        let mut bytes = [0u8; CONTAINER_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.format_version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.rank.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.nprocs.to_le_bytes());
        bytes[16] = self.codec_id_len;
        bytes[17..32].copy_from_slice(&self.reserved);
        bytes
    }

    /// Parse header from bytes
    pub fn from_bytes(bytes: &[u8; CONTAINER_HEADER_SIZE]) -> Option<Self> {
        Some(ContainerHeader {
            magic: bytes[0..4].try_into().ok()?,
            format_version: u32::from_le_bytes(bytes[4..8].try_into().ok()?),
            rank: u32::from_le_bytes(bytes[8..12].try_into().ok()?),
            nprocs: u32::from_le_bytes(bytes[12..16].try_into().ok()?),
            codec_id_len: bytes[16],
            reserved: bytes[17..32].try_into().ok()?,
        })
    }

    /// Validate magic, version and participant fields
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.magic != CONTAINER_MAGIC {
            return Err(FormatError::InvalidMagic {
                expected: CONTAINER_MAGIC,
                actual: self.magic,
            });
        }
        if self.format_version > CONTAINER_FORMAT_VERSION {
            return Err(FormatError::UnsupportedVersion {
                version: self.format_version,
                max_supported: CONTAINER_FORMAT_VERSION,
            });
        }
        if self.nprocs == 0 || self.rank >= self.nprocs {
            return Err(FormatError::InvalidParticipant {
                rank: self.rank,
                nprocs: self.nprocs,
            });
        }
        Ok(())
    }
}

/// Errors reading or writing a container file
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File shorter than header plus footer
    #[error("Container file too small: {size} bytes")]
    FileTooSmall {
        /// Actual file size
        size: usize,
    },

    /// Invalid magic bytes
    #[error("Invalid magic bytes: expected {expected:?}, got {actual:?}")]
    InvalidMagic {
        /// Expected magic bytes
        expected: [u8; 4],
        /// Actual magic bytes found
        actual: [u8; 4],
    },

    /// Unsupported format version
    #[error("Unsupported container version {version}, max supported is {max_supported}")]
    UnsupportedVersion {
        /// Version found in the file
        version: u32,
        /// Maximum supported version
        max_supported: u32,
    },

    /// Rank and process count are inconsistent
    #[error("Invalid participant in header: rank {rank} of {nprocs}")]
    InvalidParticipant {
        /// Rank in the header
        rank: u32,
        /// Process count in the header
        nprocs: u32,
    },

    /// Codec id is not valid UTF-8
    #[error("Invalid codec id in header")]
    InvalidCodecId,

    /// Codec failure
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Footer checksum does not match the contents
    #[error("CRC mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        /// CRC stored in the footer
        stored: u32,
        /// CRC computed over the contents
        computed: u32,
    },

    /// Image could not be serialized
    #[error("Image encode error: {0}")]
    Encode(String),

    /// Image could not be deserialized
    #[error("Image decode error: {0}")]
    Decode(String),
}

impl From<FormatError> for meshstate_core::Error {
    fn from(e: FormatError) -> Self {
        match e {
            FormatError::Io(io) => meshstate_core::Error::Io(io),
            other => meshstate_core::Error::Backend(other.to_string()),
        }
    }
}

/// A container file after validation
#[derive(Debug, Clone)]
pub struct LoadedContainer {
    /// File header
    pub header: ContainerHeader,
    /// Codec used for the payload
    pub codec_id: String,
    /// Decoded image
    pub image: ContainerImage,
}

/// Atomically write `image` to `path`
///
/// Returns the footer CRC.
pub fn write_container(
    path: &Path,
    participant: Participant,
    codec: &dyn StorageCodec,
    image: &ContainerImage,
) -> Result<u32, FormatError> {
    let codec_id = codec.codec_id();
    let codec_id_len =
        u8::try_from(codec_id.len()).map_err(|_| CodecError::IdTooLong(codec_id.to_string()))?;
    let header = ContainerHeader::new(participant, codec_id_len);
    let payload = codec.encode(
        &image
            .to_bytes()
            .map_err(|e| FormatError::Encode(e.to_string()))?,
    );

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&header.to_bytes());
    hasher.update(codec_id.as_bytes());
    hasher.update(&payload);
    let crc = hasher.finalize();

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = parent.join(format!(".{}.tmp", file_name));

    // Step 1: write to temporary file
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&temp_path)?;
    file.write_all(&header.to_bytes())?;
    file.write_all(codec_id.as_bytes())?;
    file.write_all(&payload)?;
    file.write_all(&crc.to_le_bytes())?;

    // Step 2: fsync the file
    file.sync_all()?;
    drop(file);

    // Step 3: atomic rename
    std::fs::rename(&temp_path, path)?;

    // Step 4: fsync parent directory
    File::open(parent)?.sync_all()?;

    debug!(
        path = %path.display(),
        rank = participant.rank,
        bytes = payload.len(),
        crc,
        "Wrote container file"
    );
    Ok(crc)
}

/// Read and validate a container file
///
/// The codec is selected from the id recorded in the header.
pub fn read_container(path: &Path) -> Result<LoadedContainer, FormatError> {
    let mut data = Vec::new();
    File::open(path)?.read_to_end(&mut data)?;

    if data.len() < CONTAINER_HEADER_SIZE + 4 {
        return Err(FormatError::FileTooSmall { size: data.len() });
    }

    let (body, footer) = data.split_at(data.len() - 4);
    let stored_crc = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);
    let computed_crc = crc32fast::hash(body);
    if stored_crc != computed_crc {
        return Err(FormatError::CrcMismatch {
            stored: stored_crc,
            computed: computed_crc,
        });
    }

    let mut header_bytes = [0u8; CONTAINER_HEADER_SIZE];
    header_bytes.copy_from_slice(&body[..CONTAINER_HEADER_SIZE]);
    let header = ContainerHeader::from_bytes(&header_bytes).ok_or(FormatError::InvalidMagic {
        expected: CONTAINER_MAGIC,
        actual: [0u8; 4],
    })?;
    header.validate()?;

    let rest = &body[CONTAINER_HEADER_SIZE..];
    let id_len = header.codec_id_len as usize;
    if rest.len() < id_len {
        return Err(FormatError::FileTooSmall { size: data.len() });
    }
    let codec_id =
        String::from_utf8(rest[..id_len].to_vec()).map_err(|_| FormatError::InvalidCodecId)?;
    let codec = get_codec(&codec_id)?;
    let payload = codec.decode(&rest[id_len..])?;
    let image =
        ContainerImage::from_bytes(&payload).map_err(|e| FormatError::Decode(e.to_string()))?;

    Ok(LoadedContainer {
        header,
        codec_id,
        image,
    })
}

/// Read only the header of a container file
pub fn read_header(path: &Path) -> Result<ContainerHeader, FormatError> {
    let mut file = File::open(path)?;
    let mut header_bytes = [0u8; CONTAINER_HEADER_SIZE];
    file.read_exact(&mut header_bytes).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            FormatError::FileTooSmall { size: 0 }
        } else {
            FormatError::Io(e)
        }
    })?;
    let header = ContainerHeader::from_bytes(&header_bytes).ok_or(FormatError::InvalidMagic {
        expected: CONTAINER_MAGIC,
        actual: [0u8; 4],
    })?;
    header.validate()?;
    Ok(header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::IdentityCodec;
    use tempfile::tempdir;

    fn sample_image() -> ContainerImage {
        let mut image = ContainerImage::default();
        image.attributes.put("/time/index", 4i64);
        image.attributes.put("/time/value", 0.25f64);
        image
    }

    #[test]
    fn test_header_roundtrip() {
        let header = ContainerHeader::new(Participant::new(2, 8), 8);
        let parsed = ContainerHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.participant(), Participant::new(2, 8));
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_header_rejects_bad_participant() {
        let mut header = ContainerHeader::new(Participant::serial(), 8);
        header.rank = 1;
        assert!(matches!(
            header.validate(),
            Err(FormatError::InvalidParticipant { rank: 1, nprocs: 1 })
        ));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rank-000000.blk");
        let image = sample_image();

        let crc = write_container(&path, Participant::serial(), &IdentityCodec, &image).unwrap();
        let loaded = read_container(&path).unwrap();
        assert_eq!(loaded.image, image);
        assert_eq!(loaded.codec_id, "identity");
        assert_eq!(loaded.header.participant(), Participant::serial());

        let data = std::fs::read(&path).unwrap();
        assert_eq!(&data[data.len() - 4..], &crc.to_le_bytes());
        assert!(!dir.path().join(".rank-000000.blk.tmp").exists());
    }

    #[test]
    fn test_rewrite_replaces_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0.1.ckpt");
        write_container(&path, Participant::serial(), &IdentityCodec, &ContainerImage::default())
            .unwrap();
        write_container(&path, Participant::serial(), &IdentityCodec, &sample_image()).unwrap();
        assert_eq!(read_container(&path).unwrap().image, sample_image());
    }

    #[test]
    fn test_detects_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rank-000000.blk");
        write_container(&path, Participant::serial(), &IdentityCodec, &sample_image()).unwrap();

        let mut data = std::fs::read(&path).unwrap();
        let mid = data.len() / 2;
        data[mid] ^= 0xFF;
        std::fs::write(&path, &data).unwrap();

        assert!(matches!(
            read_container(&path),
            Err(FormatError::CrcMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rank-000000.blk");
        std::fs::write(&path, b"MSCK").unwrap();
        assert!(matches!(
            read_container(&path),
            Err(FormatError::FileTooSmall { size: 4 })
        ));
        assert!(read_header(&path).is_err());
    }
}
