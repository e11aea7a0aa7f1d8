//! Field codec
//!
//! A field `<region>/field/<name>` is stored as:
//! - the interior values, a global array with one tuple per cell or point
//! - attributes `class`, `type`, `location` and `dimensions`
//! - `boundaryField`, a byte stream holding the ordered patch records

use meshstate_core::naming::{field_path, join};
use meshstate_core::{
    Error, Extent, Field, FieldInfo, FieldLocation, MeshExtents, PatchField, Result, Scalar,
    ValueKind,
};
use meshstate_storage::{InputContainer, OutputEngine, StreamFormat};
use tracing::{debug, warn};

/// Attribute holding the class tag
pub const CLASS_ATTRIBUTE: &str = "class";
/// Attribute holding the value kind
pub const TYPE_ATTRIBUTE: &str = "type";
/// Attribute holding the value location
pub const LOCATION_ATTRIBUTE: &str = "location";
/// Attribute holding the dimension exponents
pub const DIMENSIONS_ATTRIBUTE: &str = "dimensions";
/// Byte stream holding the patch records
pub const BOUNDARY_STREAM: &str = "boundaryField";

/// Extent of `location` values in `extents`
pub fn field_extent(extents: &MeshExtents, location: FieldLocation) -> Extent {
    match location {
        FieldLocation::Cell => extents.cells,
        FieldLocation::Point => extents.points,
    }
}

/// Write `field` of `region`
pub fn write_field(
    engine: &mut OutputEngine,
    region: &str,
    field: &Field,
    extent: Extent,
    format: StreamFormat,
) -> Result<()> {
    let path = field_path(region, &field.name);
    engine.define_and_put(&path, &field.internal, field.kind.n_components(), extent)?;
    engine.put_attribute(join(&path, CLASS_ATTRIBUTE), field.class.as_str());
    engine.put_attribute(join(&path, TYPE_ATTRIBUTE), field.kind.name());
    engine.put_attribute(join(&path, LOCATION_ATTRIBUTE), field.location.name());
    engine.put_attribute(join(&path, DIMENSIONS_ATTRIBUTE), field.dimensions.to_vec());
    engine.put_stream(&join(&path, BOUNDARY_STREAM), &field.boundary, format)?;
    debug!(path = %path, class = %field.class, values = field.n_values(), patches = field.boundary.len(), "Wrote field");
    Ok(())
}

fn read_kind(input: &InputContainer, path: &str) -> Result<ValueKind> {
    let name: String = input.attributes().attribute(&join(path, TYPE_ATTRIBUTE))?;
    ValueKind::from_name(&name)
        .ok_or_else(|| Error::Backend(format!("{path}: unknown value type '{name}'")))
}

fn read_boundary(input: &InputContainer, path: &str) -> Result<Vec<PatchField>> {
    let stream = join(path, BOUNDARY_STREAM);
    if input.has_variable(&stream) {
        input.get_stream(&stream)
    } else {
        Ok(Vec::new())
    }
}

/// Read the field named by `info`
pub fn read_field(input: &InputContainer, info: &FieldInfo) -> Result<Field> {
    let path = info.full_name();
    let kind = read_kind(input, &path)?;
    let attrs = input.attributes();
    let location = attrs
        .attribute_if_present::<String>(&join(&path, LOCATION_ATTRIBUTE))
        .and_then(|name| FieldLocation::from_name(&name))
        .unwrap_or(FieldLocation::Cell);

    let mut field = Field::new(info.name(), info.type_tag(), kind, Vec::new()).with_location(location);
    if let Some(dims) = attrs.attribute_if_present::<Vec<Scalar>>(&join(&path, DIMENSIONS_ATTRIBUTE)) {
        match <[Scalar; 7]>::try_from(dims) {
            Ok(dims) => field.dimensions = dims,
            Err(dims) => warn!(
                path = %path,
                entries = dims.len(),
                "Dimensions attribute does not hold 7 exponents, ignoring"
            ),
        }
    }
    input.get(&path, &mut field.internal, true)?;
    field.boundary = read_boundary(input, &path)?;
    debug!(path = %path, values = field.n_values(), "Read field");
    Ok(field)
}

/// Restore `field` of `region` in place
///
/// The stored class must match and the interior size must already equal
/// the stored size; the boundary records are replaced.
pub fn restore_field(input: &InputContainer, region: &str, field: &mut Field) -> Result<()> {
    let path = field_path(region, &field.name);
    if !input.has_variable(&path) {
        return Err(Error::MissingVariable { path });
    }
    let class: String = input.attributes().attribute(&join(&path, CLASS_ATTRIBUTE))?;
    if class != field.class {
        return Err(Error::InvalidOperation(format!(
            "{path}: stored class {class} cannot restore {}",
            field.class
        )));
    }
    let kind = read_kind(input, &path)?;
    if kind != field.kind {
        return Err(Error::InvalidOperation(format!(
            "{path}: stored type {} cannot restore {}",
            kind.name(),
            field.kind.name()
        )));
    }
    input.get(&path, &mut field.internal, false)?;
    field.boundary = read_boundary(input, &path)?;
    debug!(path = %path, "Restored field");
    Ok(())
}
