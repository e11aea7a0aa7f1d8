//! Shared fixtures for checkpoint integration tests

#![allow(dead_code)]

use meshstate_core::{
    Cloud, CloudField, CloudValues, Extent, FaceList, Field, FieldLocation, MeshExtents, Patch,
    PatchEntry, PatchField, PolyMesh, RegionState, TimeSnapshot, ValueKind, Zone,
};

/// Route tracing output through the test harness
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Two hexahedra side by side
pub fn two_cell_mesh() -> PolyMesh {
    let mut points = Vec::new();
    for k in 0..2 {
        for j in 0..2 {
            for i in 0..3 {
                points.push([i as f64 * 0.5, j as f64, k as f64]);
            }
        }
    }
    let faces = FaceList::from_faces(&[
        vec![1, 7, 10, 4],
        vec![0, 6, 9, 3],
        vec![2, 5, 11, 8],
        vec![0, 1, 4, 3],
        vec![1, 2, 5, 4],
        vec![6, 9, 10, 7],
        vec![7, 10, 11, 8],
        vec![0, 6, 7, 1],
        vec![1, 7, 8, 2],
        vec![3, 4, 10, 9],
        vec![4, 5, 11, 10],
    ]);
    PolyMesh {
        points,
        faces,
        owner: vec![0, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1],
        neighbour: vec![1],
        n_cells: 2,
        patches: vec![
            Patch::new("inlet", "patch", 1, 1),
            Patch::new("outlet", "patch", 2, 1),
            Patch::new("walls", "wall", 3, 8),
        ],
        point_zones: vec![Zone::new("probe", vec![4])],
        face_zones: vec![Zone::new("baffle", vec![0])],
        cell_zones: vec![Zone::new("porous", vec![1])],
        addressing: None,
    }
}

/// Pressure with a mixed set of boundary records
pub fn pressure() -> Field {
    Field::new("p", "volScalarField", ValueKind::Scalar, vec![101325.0, 101300.5])
        .with_dimensions([1.0, -1.0, -2.0, 0.0, 0.0, 0.0, 0.0])
        .with_boundary(vec![
            PatchField::new("inlet", "zeroGradient"),
            PatchField::new("outlet", "fixedValue")
                .with_entry("value", PatchEntry::Uniform(vec![101300.0])),
            PatchField::new("walls", "zeroGradient"),
        ])
}

/// Velocity with a non-uniform inlet
pub fn velocity() -> Field {
    Field::new(
        "U",
        "volVectorField",
        ValueKind::Vector,
        vec![1.0, 0.0, 0.0, 0.75, 0.25, 0.0],
    )
    .with_dimensions([0.0, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0])
    .with_boundary(vec![
        PatchField::new("inlet", "fixedValue").with_entry(
            "value",
            PatchEntry::NonUniform {
                components: 3,
                values: vec![1.0, 0.0, 0.0],
            },
        ),
        PatchField::new("outlet", "inletOutlet")
            .with_entry("inletValue", PatchEntry::Uniform(vec![0.0, 0.0, 0.0]))
            .with_entry("phi", PatchEntry::Word("phi".into())),
        PatchField::new("walls", "noSlip"),
    ])
}

/// Point field
pub fn displacement(mesh: &PolyMesh) -> Field {
    let values = (0..mesh.n_points() * 3).map(|i| i as f64 * 0.125).collect();
    Field::new("pointDisplacement", "pointVectorField", ValueKind::Vector, values)
        .with_location(FieldLocation::Point)
}

/// Three-parcel spray cloud
pub fn spray() -> Cloud {
    Cloud::new("spray", "basicKinematicCloud", 3)
        .with_field(CloudField::new("origId", CloudValues::Label(vec![7, 8, 9])))
        .with_field(CloudField::new(
            "d",
            CloudValues::Scalar {
                components: 1,
                values: vec![0.000244140625, 0.0001220703125, 0.00048828125],
            },
        ))
        .with_field(CloudField::new(
            "U",
            CloudValues::Scalar {
                components: 3,
                values: vec![1.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0, 0.25, 0.75],
            },
        ))
}

/// Serial region holding the fixtures above
pub fn region(name: &str) -> RegionState {
    let mesh = two_cell_mesh();
    let disp = displacement(&mesh);
    RegionState::new(name, mesh)
        .with_field(pressure())
        .with_field(velocity())
        .with_field(disp)
        .with_cloud(spray())
}

/// Region of participant `rank` holding `counts[rank]` cells of a field
/// whose values are their global cell ids
pub fn partitioned_region(counts: &[usize], rank: usize) -> RegionState {
    let cells = Extent::from_counts(counts, rank);
    let mesh = PolyMesh {
        points: (0..cells.local)
            .map(|i| [(cells.offset + i) as f64, 0.0, 0.0])
            .collect(),
        n_cells: cells.local,
        ..Default::default()
    };
    let values = (cells.offset..cells.end()).map(|i| i as f64).collect();
    let field = Field::new("T", "volScalarField", ValueKind::Scalar, values);
    let parcels = Cloud::new("tracers", "passiveCloud", 0)
        .with_extent(cells)
        .with_field(CloudField::new(
            "origId",
            CloudValues::Label((cells.offset..cells.end()).map(|i| i as i64).collect()),
        ));
    RegionState::new("region0", mesh)
        .with_extents(MeshExtents {
            points: cells,
            faces: Extent::from_counts(&vec![0; counts.len()], rank),
            cells,
        })
        .with_field(field)
        .with_cloud(parcels)
}

/// Snapshot at step `index` of a run with a fixed time step of 0.1
pub fn snapshot(index: i64) -> TimeSnapshot {
    let value = (index as f64 * 0.1 * 1e6).round() / 1e6;
    TimeSnapshot::new(index, value, 0.1, 0.1)
}
