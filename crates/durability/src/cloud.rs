//! Cloud codec
//!
//! A cloud `<region>/cloud/<name>` carries attributes `class`, `nParcels`
//! (global particle count), `names` and `types` listing the sub-fields
//! present, and one global array per sub-field at `<cloud>/<sub>`.
//! Readers discover the sub-fields from `names` without prior schema.

use meshstate_core::naming::{cloud_path, join};
use meshstate_core::{
    Cloud, CloudField, CloudInfo, CloudValues, Error, Extent, Label, Result, Scalar,
};
use meshstate_storage::{InputContainer, OutputEngine};
use tracing::debug;

/// Attribute holding the cloud class tag
pub const CLASS_ATTRIBUTE: &str = "class";
/// Attribute holding the global particle count
pub const PARCELS_ATTRIBUTE: &str = "nParcels";
/// Attribute listing the sub-field names
pub const NAMES_ATTRIBUTE: &str = "names";
/// Attribute listing the sub-field types
pub const TYPES_ATTRIBUTE: &str = "types";

/// Write `cloud` of `region`
pub fn write_cloud(engine: &mut OutputEngine, region: &str, cloud: &Cloud) -> Result<()> {
    let path = cloud_path(region, &cloud.name);
    for sub in &cloud.fields {
        let var = join(&path, &sub.name);
        match &sub.values {
            CloudValues::Label(values) => engine.define_and_put(&var, values, 1, cloud.extent)?,
            CloudValues::Scalar { components, values } => {
                engine.define_and_put(&var, values, *components, cloud.extent)?
            }
        }
    }
    let names = cloud.field_names();
    let types: Vec<String> = cloud
        .fields
        .iter()
        .map(|f| f.values.type_name().to_string())
        .collect();
    engine.put_attribute(join(&path, CLASS_ATTRIBUTE), cloud.class.as_str());
    engine.put_attribute(join(&path, PARCELS_ATTRIBUTE), cloud.extent.global as i64);
    engine.put_attribute(join(&path, NAMES_ATTRIBUTE), names);
    engine.put_attribute(join(&path, TYPES_ATTRIBUTE), types);
    debug!(path = %path, parcels = cloud.extent.local, fields = cloud.fields.len(), "Wrote cloud");
    Ok(())
}

/// Read the cloud named by `info`
pub fn read_cloud(input: &InputContainer, info: &CloudInfo) -> Result<Cloud> {
    let path = info.full_name();
    let attrs = input.attributes();
    let global: i64 = attrs.attribute(&join(&path, PARCELS_ATTRIBUTE))?;
    let names: Vec<String> = attrs.attribute(&join(&path, NAMES_ATTRIBUTE))?;
    let types: Vec<String> = attrs.attribute(&join(&path, TYPES_ATTRIBUTE))?;
    if names.len() != types.len() {
        return Err(Error::Backend(format!(
            "{path}: {} sub-field names but {} types",
            names.len(),
            types.len()
        )));
    }

    let global = usize::try_from(global)
        .map_err(|_| Error::Backend(format!("{path}: negative particle count")))?;
    let mut cloud = Cloud::new(info.name(), info.type_tag(), 0);
    let mut extent = None;
    for (name, type_name) in names.into_iter().zip(types) {
        let var = join(&path, &name);
        let values = match type_name.as_str() {
            "label" => {
                let mut values: Vec<Label> = Vec::new();
                input.get(&var, &mut values, true)?;
                CloudValues::Label(values)
            }
            "scalar" => {
                let components = input
                    .variable(&var)
                    .ok_or_else(|| Error::MissingVariable { path: var.clone() })?
                    .components;
                let mut values: Vec<Scalar> = Vec::new();
                input.get(&var, &mut values, true)?;
                CloudValues::Scalar { components, values }
            }
            other => {
                return Err(Error::Backend(format!(
                    "{var}: unknown sub-field type '{other}'"
                )))
            }
        };
        if extent.is_none() {
            if let Some((start, end)) = input.selected_range(&var)? {
                extent = Some(Extent::new(end - start, global, start));
            }
        }
        cloud.fields.push(CloudField::new(name, values));
    }
    cloud.extent = extent.unwrap_or_else(|| Extent::new(0, global, 0));
    debug!(path = %path, parcels = cloud.extent.local, "Read cloud");
    Ok(cloud)
}
