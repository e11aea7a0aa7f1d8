//! Mesh codec
//!
//! Layout under `<region>/polyMesh/`:
//!
//! | Path | Shape | Written when |
//! |---|---|---|
//! | `pointsInstance`, `facesInstance` | text attributes | always |
//! | `points` | global, 3 components | points moved or topology changed |
//! | `faces/offsets`, `faces/indices` | local blocks | topology changed |
//! | `owner`, `neighbour` | local blocks | topology changed |
//! | `nCells` | one label per participant | topology changed |
//! | `boundary` | byte stream of the patch list | topology changed |
//! | `patch-names`, `patch-types` | text list attributes | topology changed |
//! | `pointZones/<name>` (and face/cell) | local blocks | topology changed |
//! | `pointZones` (and face/cell) | text list attribute of zone names | topology changed |
//! | `{point,face,cell}ProcAddressing` | global arrays | topology changed, decomposed meshes |
//!
//! When a part is not written, the instance attributes name the checkpoint
//! that holds it.

use meshstate_core::naming::{join, mesh_path};
use meshstate_core::{
    Error, FaceList, HostRegion, Label, Patch, PolyMesh, ProcAddressing, Result, Scalar, Zone,
    ZoneKind,
};
use meshstate_storage::{InputContainer, OutputEngine, StreamFormat};
use tracing::debug;

use crate::tracker::MeshPlan;

/// Attribute naming the instance that holds the points
pub const POINTS_INSTANCE: &str = "pointsInstance";
/// Attribute naming the instance that holds the connectivity
pub const FACES_INSTANCE: &str = "facesInstance";

const POINTS: &str = "points";
const FACE_OFFSETS: &str = "faces/offsets";
const FACE_INDICES: &str = "faces/indices";
const OWNER: &str = "owner";
const NEIGHBOUR: &str = "neighbour";
const N_CELLS: &str = "nCells";
const BOUNDARY: &str = "boundary";
const PATCH_NAMES: &str = "patch-names";
const PATCH_TYPES: &str = "patch-types";
const POINT_ADDRESSING: &str = "pointProcAddressing";
const FACE_ADDRESSING: &str = "faceProcAddressing";
const CELL_ADDRESSING: &str = "cellProcAddressing";

/// Write `host`'s mesh according to `plan`
pub fn write_mesh(
    engine: &mut OutputEngine,
    host: &dyn HostRegion,
    plan: &MeshPlan,
    format: StreamFormat,
) -> Result<()> {
    let region = host.name();
    let mesh = host.mesh();
    let extents = host.extents();

    engine.put_attribute(mesh_path(region, POINTS_INSTANCE), plan.points_instance.as_str());
    engine.put_attribute(mesh_path(region, FACES_INSTANCE), plan.faces_instance.as_str());

    if plan.update.writes_points() {
        let flat: Vec<Scalar> = mesh.points.iter().flatten().copied().collect();
        engine.define_and_put(&mesh_path(region, POINTS), &flat, 3, extents.points)?;
    }

    if plan.update.writes_faces() {
        engine.put_local(&mesh_path(region, FACE_OFFSETS), mesh.faces.offsets(), 1)?;
        engine.put_local(&mesh_path(region, FACE_INDICES), mesh.faces.indices(), 1)?;
        engine.put_local(&mesh_path(region, OWNER), &mesh.owner, 1)?;
        engine.put_local(&mesh_path(region, NEIGHBOUR), &mesh.neighbour, 1)?;
        engine.put_label_variable(&mesh_path(region, N_CELLS), mesh.n_cells as Label)?;
        write_patches(engine, region, mesh, format)?;
        write_zones(engine, region, mesh)?;
        if let Some(addressing) = &mesh.addressing {
            engine.define_and_put(
                &mesh_path(region, POINT_ADDRESSING),
                &addressing.points,
                1,
                extents.points,
            )?;
            engine.define_and_put(
                &mesh_path(region, FACE_ADDRESSING),
                &addressing.faces,
                1,
                extents.faces,
            )?;
            engine.define_and_put(
                &mesh_path(region, CELL_ADDRESSING),
                &addressing.cells,
                1,
                extents.cells,
            )?;
        }
    }

    debug!(
        region,
        update = ?plan.update,
        points = mesh.n_points(),
        faces = mesh.n_faces(),
        cells = mesh.n_cells(),
        "Wrote mesh"
    );
    Ok(())
}

fn write_patches(
    engine: &mut OutputEngine,
    region: &str,
    mesh: &PolyMesh,
    format: StreamFormat,
) -> Result<()> {
    let (names, types): (Vec<String>, Vec<String>) = mesh
        .non_processor_patches()
        .map(|p| (p.name.clone(), p.patch_type.clone()))
        .unzip();
    engine.put_attribute(mesh_path(region, PATCH_NAMES), names);
    engine.put_attribute(mesh_path(region, PATCH_TYPES), types);
    engine.put_stream(&mesh_path(region, BOUNDARY), &mesh.patches, format)
}

fn write_zones(engine: &mut OutputEngine, region: &str, mesh: &PolyMesh) -> Result<()> {
    for kind in ZoneKind::ALL {
        let zones = mesh.zones(kind);
        if zones.is_empty() {
            continue;
        }
        let base = mesh_path(region, kind.as_str());
        let names: Vec<String> = zones.iter().map(|z| z.name.clone()).collect();
        for zone in zones {
            engine.put_local(&join(&base, &zone.name), &zone.indices, 1)?;
        }
        engine.put_attribute(base, names);
    }
    Ok(())
}

/// Instances holding the points and the connectivity of `region`
///
/// Falls back to `current` when the attributes are absent.
pub fn mesh_instances(input: &InputContainer, region: &str, current: &str) -> (String, String) {
    let attrs = input.attributes();
    let points = attrs
        .attribute_if_present::<String>(&mesh_path(region, POINTS_INSTANCE))
        .unwrap_or_else(|| current.to_string());
    let faces = attrs
        .attribute_if_present::<String>(&mesh_path(region, FACES_INSTANCE))
        .unwrap_or_else(|| current.to_string());
    (points, faces)
}

/// Read point coordinates of `region`
pub fn read_points(input: &InputContainer, region: &str) -> Result<Vec<[Scalar; 3]>> {
    let path = mesh_path(region, POINTS);
    let mut flat: Vec<Scalar> = Vec::new();
    input.get(&path, &mut flat, true)?;
    if flat.len() % 3 != 0 {
        return Err(Error::Backend(format!("{path}: not a list of 3-vectors")));
    }
    Ok(flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
}

/// Read everything but the point coordinates of `region`
pub fn read_topology(input: &InputContainer, region: &str) -> Result<PolyMesh> {
    let mut offsets: Vec<Label> = Vec::new();
    let mut indices: Vec<Label> = Vec::new();
    input.get(&mesh_path(region, FACE_OFFSETS), &mut offsets, true)?;
    input.get(&mesh_path(region, FACE_INDICES), &mut indices, true)?;
    let faces = FaceList::from_parts(offsets, indices).ok_or_else(|| {
        Error::Backend(format!(
            "{}: inconsistent face offsets",
            mesh_path(region, FACE_OFFSETS)
        ))
    })?;

    let mut mesh = PolyMesh {
        faces,
        ..Default::default()
    };
    input.get(&mesh_path(region, OWNER), &mut mesh.owner, true)?;
    input.get(&mesh_path(region, NEIGHBOUR), &mut mesh.neighbour, true)?;
    let n_cells = input.get_label_variable(&mesh_path(region, N_CELLS))?;
    mesh.n_cells = usize::try_from(n_cells).map_err(|_| {
        Error::Backend(format!("{}: negative cell count", mesh_path(region, N_CELLS)))
    })?;
    mesh.patches = input.get_stream::<Vec<Patch>>(&mesh_path(region, BOUNDARY))?;

    for kind in ZoneKind::ALL {
        let base = mesh_path(region, kind.as_str());
        let names: Vec<String> = input
            .attributes()
            .attribute_if_present(&base)
            .unwrap_or_default();
        for name in names {
            let mut indices: Vec<Label> = Vec::new();
            input.get(&join(&base, &name), &mut indices, true)?;
            mesh.zones_mut(kind).push(Zone::new(name, indices));
        }
    }

    let point_addressing = mesh_path(region, POINT_ADDRESSING);
    if input.has_variable(&point_addressing) {
        let mut addressing = ProcAddressing::default();
        input.get(&point_addressing, &mut addressing.points, true)?;
        input.get(&mesh_path(region, FACE_ADDRESSING), &mut addressing.faces, true)?;
        input.get(&mesh_path(region, CELL_ADDRESSING), &mut addressing.cells, true)?;
        mesh.addressing = Some(addressing);
    }
    Ok(mesh)
}

/// Names and types of the non-processor patches of `region`
pub fn read_patch_attributes(input: &InputContainer, region: &str) -> Result<Vec<(String, String)>> {
    let names: Vec<String> = input.attributes().attribute(&mesh_path(region, PATCH_NAMES))?;
    let types: Vec<String> = input.attributes().attribute(&mesh_path(region, PATCH_TYPES))?;
    if names.len() != types.len() {
        return Err(Error::Backend(format!(
            "{}: {} names but {} types",
            mesh_path(region, PATCH_NAMES),
            names.len(),
            types.len()
        )));
    }
    Ok(names.into_iter().zip(types).collect())
}
