//! Host simulation seam
//!
//! The codecs never own simulation state. A host exposes each region
//! through [`HostRegion`]; [`RegionState`] is a plain owned implementation
//! for hosts that already hold their data in these types (and for tests).

use crate::cloud::Cloud;
use crate::field::Field;
use crate::mesh::{MeshExtents, PolyMesh};
use crate::types::Scalar;

/// Per-region view of the host simulation
pub trait HostRegion {
    /// Region name
    fn name(&self) -> &str;

    /// Time at which point coordinates last changed
    fn points_time(&self) -> Scalar;

    /// Time at which face/cell topology last changed
    fn topo_time(&self) -> Scalar;

    /// Mesh geometry
    fn mesh(&self) -> &PolyMesh;

    /// Distributed-array extents of the mesh entities
    fn extents(&self) -> MeshExtents;

    /// Field registry, in write order
    fn fields(&self) -> &[Field];

    /// Particle clouds, in write order
    fn clouds(&self) -> &[Cloud];
}

/// Owned region state
#[derive(Debug, Clone, Default)]
pub struct RegionState {
    /// Region name
    pub name: String,
    /// Time of last point motion
    pub points_time: Scalar,
    /// Time of last topology change
    pub topo_time: Scalar,
    /// Mesh geometry
    pub mesh: PolyMesh,
    /// Extents (serial extents of `mesh` when `None`)
    pub extents: Option<MeshExtents>,
    /// Fields
    pub fields: Vec<Field>,
    /// Clouds
    pub clouds: Vec<Cloud>,
}

impl RegionState {
    /// Construct a serial region around a mesh
    pub fn new(name: impl Into<String>, mesh: PolyMesh) -> Self {
        RegionState {
            name: name.into(),
            mesh,
            ..Default::default()
        }
    }

    /// Set explicit distributed extents
    pub fn with_extents(mut self, extents: MeshExtents) -> Self {
        self.extents = Some(extents);
        self
    }

    /// Add a field
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a cloud
    pub fn with_cloud(mut self, cloud: Cloud) -> Self {
        self.clouds.push(cloud);
        self
    }

    /// Record that points moved at `time`
    pub fn move_points(&mut self, time: Scalar) {
        self.points_time = time;
    }

    /// Record that the topology changed at `time`
    pub fn change_topology(&mut self, time: Scalar) {
        self.topo_time = time;
        self.points_time = time;
    }
}

impl HostRegion for RegionState {
    fn name(&self) -> &str {
        &self.name
    }

    fn points_time(&self) -> Scalar {
        self.points_time
    }

    fn topo_time(&self) -> Scalar {
        self.topo_time
    }

    fn mesh(&self) -> &PolyMesh {
        &self.mesh
    }

    fn extents(&self) -> MeshExtents {
        self.extents.unwrap_or_else(|| MeshExtents::serial(&self.mesh))
    }

    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn clouds(&self) -> &[Cloud] {
        &self.clouds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceList;

    #[test]
    fn test_serial_extents_default() {
        let mesh = PolyMesh {
            points: vec![[0.0; 3]; 4],
            faces: FaceList::from_faces(&[vec![0, 1, 2]]),
            owner: vec![0],
            n_cells: 1,
            ..Default::default()
        };
        let region = RegionState::new("region0", mesh);
        let ext = region.extents();
        assert_eq!(ext.points.global, 4);
        assert_eq!(ext.faces.local, 1);
        assert_eq!(ext.cells.offset, 0);
    }

    #[test]
    fn test_change_topology_moves_points() {
        let mut region = RegionState::new("region0", PolyMesh::default());
        region.change_topology(0.5);
        assert_eq!(region.topo_time(), 0.5);
        assert_eq!(region.points_time(), 0.5);
        region.move_points(0.7);
        assert_eq!(region.topo_time(), 0.5);
        assert_eq!(region.points_time(), 0.7);
    }
}
