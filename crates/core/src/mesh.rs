//! Mesh geometry data model
//!
//! `PolyMesh` is the per-participant view of a polyhedral mesh: point
//! coordinates, variable-degree face connectivity, owner/neighbour cell
//! addressing, boundary patches, named zones and (optionally) the mapping
//! from local to global ids.

use crate::types::{Extent, Label, Scalar};
use serde::{Deserialize, Serialize};

/// Outcome of comparing a region's mesh state against the last checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshUpdate {
    /// Neither points nor topology changed; geometry is not re-emitted
    Unchanged,
    /// Topology identical, coordinates changed; only points are re-emitted
    PointsMoved,
    /// Full re-emission of points, faces, addressing and zones
    TopoChange,
}

impl MeshUpdate {
    /// True if point coordinates must be written
    pub fn writes_points(self) -> bool {
        !matches!(self, MeshUpdate::Unchanged)
    }

    /// True if connectivity, addressing and zones must be written
    pub fn writes_faces(self) -> bool {
        matches!(self, MeshUpdate::TopoChange)
    }
}

/// Variable-degree face connectivity as offsets plus a flat index list
///
/// Face `i` uses `indices[offsets[i]..offsets[i + 1]]`; `offsets` always has
/// one more entry than there are faces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceList {
    offsets: Vec<Label>,
    indices: Vec<Label>,
}

impl Default for FaceList {
    fn default() -> Self {
        FaceList {
            offsets: vec![0],
            indices: Vec::new(),
        }
    }
}

impl FaceList {
    /// Build from per-face point lists
    pub fn from_faces<F: AsRef<[Label]>>(faces: &[F]) -> Self {
        let mut offsets = Vec::with_capacity(faces.len() + 1);
        let mut indices = Vec::new();
        offsets.push(0);
        for face in faces {
            indices.extend_from_slice(face.as_ref());
            offsets.push(indices.len() as Label);
        }
        FaceList { offsets, indices }
    }

    /// Build from raw offsets and indices
    ///
    /// Returns `None` unless the offsets start at zero, are non-decreasing
    /// and end at `indices.len()`.
    pub fn from_parts(offsets: Vec<Label>, indices: Vec<Label>) -> Option<Self> {
        let starts_at_zero = offsets.first() == Some(&0);
        let ends_at_len = offsets.last().map(|&l| l as usize) == Some(indices.len());
        let monotone = offsets.windows(2).all(|w| w[0] <= w[1]);
        if starts_at_zero && ends_at_len && monotone {
            Some(FaceList { offsets, indices })
        } else {
            None
        }
    }

    /// Number of faces
    pub fn len(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// True if there are no faces
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point indices of face `i`
    pub fn face(&self, i: usize) -> &[Label] {
        let start = self.offsets[i] as usize;
        let end = self.offsets[i + 1] as usize;
        &self.indices[start..end]
    }

    /// Iterate over faces
    pub fn iter(&self) -> impl Iterator<Item = &[Label]> + '_ {
        (0..self.len()).map(move |i| self.face(i))
    }

    /// Offsets array
    pub fn offsets(&self) -> &[Label] {
        &self.offsets
    }

    /// Flat index array
    pub fn indices(&self) -> &[Label] {
        &self.indices
    }
}

/// A boundary patch: a contiguous range of faces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patch {
    /// Patch name
    pub name: String,
    /// Patch type (e.g. `wall`, `patch`, `processor`)
    pub patch_type: String,
    /// First face of the patch
    pub start: Label,
    /// Number of faces
    pub size: Label,
}

impl Patch {
    /// Construct from components
    pub fn new(name: impl Into<String>, patch_type: impl Into<String>, start: Label, size: Label) -> Self {
        Patch {
            name: name.into(),
            patch_type: patch_type.into(),
            start,
            size,
        }
    }

    /// True for inter-process patches, which differ per participant
    pub fn is_processor(&self) -> bool {
        self.patch_type.starts_with("processor")
    }
}

/// Kind of mesh zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ZoneKind {
    /// Point zone
    Point,
    /// Face zone
    Face,
    /// Cell zone
    Cell,
}

impl ZoneKind {
    /// All zone kinds
    pub const ALL: [ZoneKind; 3] = [ZoneKind::Point, ZoneKind::Face, ZoneKind::Cell];

    /// Path component for zones of this kind
    pub fn as_str(self) -> &'static str {
        match self {
            ZoneKind::Point => "pointZones",
            ZoneKind::Face => "faceZones",
            ZoneKind::Cell => "cellZones",
        }
    }
}

/// Named membership list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Zone name
    pub name: String,
    /// Member indices
    pub indices: Vec<Label>,
}

impl Zone {
    /// Construct from components
    pub fn new(name: impl Into<String>, indices: Vec<Label>) -> Self {
        Zone {
            name: name.into(),
            indices,
        }
    }
}

/// Local-to-global id mapping of a decomposed mesh
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcAddressing {
    /// Global id of each local point
    pub points: Vec<Label>,
    /// Global id of each local face
    pub faces: Vec<Label>,
    /// Global id of each local cell
    pub cells: Vec<Label>,
}

/// Distributed-array extents of a region's mesh entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshExtents {
    /// Point extent
    pub points: Extent,
    /// Face extent
    pub faces: Extent,
    /// Cell extent
    pub cells: Extent,
}

impl MeshExtents {
    /// Extents of a serial mesh
    pub fn serial(mesh: &PolyMesh) -> Self {
        MeshExtents {
            points: Extent::serial(mesh.n_points()),
            faces: Extent::serial(mesh.n_faces()),
            cells: Extent::serial(mesh.n_cells()),
        }
    }
}

/// Per-participant polyhedral mesh
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PolyMesh {
    /// Point coordinates
    pub points: Vec<[Scalar; 3]>,
    /// Face-to-point connectivity
    pub faces: FaceList,
    /// Owner cell of each face
    pub owner: Vec<Label>,
    /// Neighbour cell of each internal face
    pub neighbour: Vec<Label>,
    /// Number of cells
    pub n_cells: usize,
    /// Boundary patches, in face order
    pub patches: Vec<Patch>,
    /// Point zones
    pub point_zones: Vec<Zone>,
    /// Face zones
    pub face_zones: Vec<Zone>,
    /// Cell zones
    pub cell_zones: Vec<Zone>,
    /// Local-to-global addressing (decomposed meshes only)
    pub addressing: Option<ProcAddressing>,
}

impl PolyMesh {
    /// Number of points
    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    /// Number of faces
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// Number of cells
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// Number of internal faces
    pub fn n_internal_faces(&self) -> usize {
        self.neighbour.len()
    }

    /// Zones of the given kind
    pub fn zones(&self, kind: ZoneKind) -> &[Zone] {
        match kind {
            ZoneKind::Point => &self.point_zones,
            ZoneKind::Face => &self.face_zones,
            ZoneKind::Cell => &self.cell_zones,
        }
    }

    /// Mutable zones of the given kind
    pub fn zones_mut(&mut self, kind: ZoneKind) -> &mut Vec<Zone> {
        match kind {
            ZoneKind::Point => &mut self.point_zones,
            ZoneKind::Face => &mut self.face_zones,
            ZoneKind::Cell => &mut self.cell_zones,
        }
    }

    /// Patches that are not inter-process patches
    pub fn non_processor_patches(&self) -> impl Iterator<Item = &Patch> {
        self.patches.iter().filter(|p| !p.is_processor())
    }
}
