//! In-memory image of one participant's container file
//!
//! The image is what an output engine accumulates between steps and what
//! the file format persists: the attributes plus every variable block this
//! participant wrote.

use crate::attributes::AttributeStore;
use meshstate_core::ElementKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity of one writer or reader within a parallel run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// Zero-based rank
    pub rank: usize,
    /// Number of participants
    pub nprocs: usize,
}

impl Participant {
    /// Create a participant
    pub fn new(rank: usize, nprocs: usize) -> Self {
        Participant { rank, nprocs }
    }

    /// The only participant of a serial run
    pub fn serial() -> Self {
        Participant::new(0, 1)
    }

    /// True for rank zero
    pub fn is_master(&self) -> bool {
        self.rank == 0
    }

    /// True if there is more than one participant
    pub fn is_parallel(&self) -> bool {
        self.nprocs > 1
    }
}

/// How a variable's blocks relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableShape {
    /// A global array of `count` tuples; blocks own disjoint ranges
    Global {
        /// Global tuple count
        count: usize,
    },
    /// Independent per-participant blocks with no global addressing
    Local,
}

/// One participant's contribution to a variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Writing participant
    pub rank: usize,
    /// Global offset in tuples (zero for local blocks)
    pub offset: usize,
    /// Number of tuples
    pub count: usize,
    /// Little-endian element bytes
    pub bytes: Vec<u8>,
}

/// A variable with all blocks known to this image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredVariable {
    /// Element type as stored
    pub kind: ElementKind,
    /// Components per tuple
    pub components: usize,
    /// Global or local addressing
    pub shape: VariableShape,
    /// Blocks, in the order they were added
    pub blocks: Vec<Block>,
}

impl StoredVariable {
    /// Global tuple count, or `None` for local variables
    pub fn global_count(&self) -> Option<usize> {
        match self.shape {
            VariableShape::Global { count } => Some(count),
            VariableShape::Local => None,
        }
    }

    /// Block written by `rank`
    pub fn block_of(&self, rank: usize) -> Option<&Block> {
        self.blocks.iter().find(|b| b.rank == rank)
    }
}

/// Attributes and variables of one container file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerImage {
    /// Attribute store
    pub attributes: AttributeStore,
    /// Variables keyed by path
    pub variables: BTreeMap<String, StoredVariable>,
}

impl ContainerImage {
    /// Serialize to MessagePack
    pub fn to_bytes(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::to_vec_named(self)
    }

    /// Deserialize from MessagePack
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_participant_roles() {
        assert!(Participant::serial().is_master());
        assert!(!Participant::serial().is_parallel());
        assert!(Participant::new(3, 4).is_parallel());
        assert!(!Participant::new(3, 4).is_master());
    }

    #[test]
    fn test_image_survives_messagepack() {
        let mut image = ContainerImage::default();
        image.attributes.put("/time/index", 3i64);
        image.variables.insert(
            "region0/polyMesh/owner".to_string(),
            StoredVariable {
                kind: ElementKind::I32,
                components: 1,
                shape: VariableShape::Local,
                blocks: vec![Block {
                    rank: 0,
                    offset: 0,
                    count: 2,
                    bytes: vec![0, 0, 0, 0, 1, 0, 0, 0],
                }],
            },
        );
        let bytes = image.to_bytes().unwrap();
        let back = ContainerImage::from_bytes(&bytes).unwrap();
        assert_eq!(back, image);
        assert_eq!(back.variables["region0/polyMesh/owner"].global_count(), None);
    }
}
