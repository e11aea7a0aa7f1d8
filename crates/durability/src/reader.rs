//! Checkpoint reader session
//!
//! Opening a reader runs the metadata scan: the region list, then per
//! region the fields and clouds with their class tags. Targeted reads come
//! after, so callers can filter by name before touching bulk data.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use meshstate_core::naming::{
    cloud_path, entity_prefix, field_path, global_attribute, join, region_of, EntityKind,
};
use meshstate_core::{
    Cloud, CloudInfo, Error, Field, FieldInfo, NameFilter, PolyMesh, Result, TimeSnapshot,
};
use meshstate_storage::{InputContainer, Layout, Location, Participant, TypeSizes};
use tracing::{debug, info, warn};

use crate::cloud::{self, read_cloud};
use crate::field::{self, read_field, restore_field};
use crate::mesh::{mesh_instances, read_patch_attributes, read_points, read_topology};
use crate::restart::{open_instant, Instant, RestartError};
use crate::time::read_time;
use crate::writer::REGIONS_ATTRIBUTE;

/// Reader session over one checkpoint instance
#[derive(Debug)]
pub struct CheckpointReader {
    data_dir: PathBuf,
    instance: String,
    input: InputContainer,
    time: TimeSnapshot,
    regions: Vec<String>,
    fields: BTreeMap<String, Vec<FieldInfo>>,
    clouds: BTreeMap<String, Vec<CloudInfo>>,
}

fn locate(data_dir: &Path, instance: &str) -> Location {
    let dir = Location::new(data_dir, instance, Layout::Directory);
    if dir.path().is_dir() {
        dir
    } else {
        Location::new(data_dir, instance, Layout::File)
    }
}

impl CheckpointReader {
    /// Open the instance named `instance` under `data_dir`
    pub fn open(data_dir: &Path, instance: &str, reader: Participant) -> Result<Self> {
        let input = InputContainer::open(locate(data_dir, instance), reader)?;
        let time = read_time(input.attributes());
        Ok(Self::scan(data_dir, instance, input, time))
    }

    /// Open a resolved restart instant
    pub fn open_instant(
        data_dir: &Path,
        instant: &Instant,
        reader: Participant,
    ) -> std::result::Result<Self, RestartError> {
        let (input, time) = open_instant(instant, reader)?;
        Ok(Self::scan(data_dir, &instant.name, input, time))
    }

    fn scan(data_dir: &Path, instance: &str, input: InputContainer, time: TimeSnapshot) -> Self {
        let attrs = input.attributes();
        let regions = attrs
            .attribute_if_present::<Vec<String>>(&global_attribute(REGIONS_ATTRIBUTE))
            .unwrap_or_else(|| {
                let mut found: Vec<String> = input
                    .variable_names()
                    .map(region_of)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string)
                    .collect();
                found.dedup();
                found
            });

        let mut fields = BTreeMap::new();
        let mut clouds = BTreeMap::new();
        for region in &regions {
            let mut infos = Vec::new();
            for name in entity_names(&input, region, EntityKind::Field) {
                let class = join(&field_path(region, &name), field::CLASS_ATTRIBUTE);
                match attrs.attribute_if_present::<String>(&class) {
                    Some(tag) => infos.push(FieldInfo::new(region.as_str(), name, tag)),
                    None => warn!(region = %region, field = %name, "Field without class, skipping"),
                }
            }
            fields.insert(region.clone(), infos);

            let mut infos = Vec::new();
            for name in entity_names(&input, region, EntityKind::Cloud) {
                let class = join(&cloud_path(region, &name), cloud::CLASS_ATTRIBUTE);
                match attrs.attribute_if_present::<String>(&class) {
                    Some(tag) => infos.push(CloudInfo::new(region.as_str(), name, tag)),
                    None => warn!(region = %region, cloud = %name, "Cloud without class, skipping"),
                }
            }
            clouds.insert(region.clone(), infos);
        }

        info!(
            instance,
            index = time.index(),
            regions = regions.len(),
            fields = fields.values().map(Vec::len).sum::<usize>(),
            clouds = clouds.values().map(Vec::len).sum::<usize>(),
            "Opened checkpoint"
        );
        CheckpointReader {
            data_dir: data_dir.to_path_buf(),
            instance: instance.to_string(),
            input,
            time,
            regions,
            fields,
            clouds,
        }
    }

    /// Instance name
    pub fn instance(&self) -> &str {
        &self.instance
    }

    /// Time snapshot stored in the instance
    pub fn time(&self) -> TimeSnapshot {
        self.time
    }

    /// Widths the writer used
    pub fn sizes(&self) -> TypeSizes {
        self.input.sizes()
    }

    /// Underlying input container
    pub fn input(&self) -> &InputContainer {
        &self.input
    }

    /// Regions present, in write order
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Every field found by the scan
    pub fn fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.values().flatten()
    }

    /// Fields of `region`
    pub fn fields_in(&self, region: &str) -> &[FieldInfo] {
        self.fields.get(region).map(Vec::as_slice).unwrap_or_default()
    }

    /// Fields of `region` passing `filter`
    ///
    /// Without requested patterns every field not ignored passes.
    pub fn select_fields(&self, region: &str, filter: &NameFilter) -> Vec<&FieldInfo> {
        let implicit = !filter.has_requests();
        self.fields_in(region)
            .iter()
            .filter(|info| filter.accepts(info.name(), implicit))
            .collect()
    }

    /// Every cloud found by the scan
    pub fn clouds(&self) -> impl Iterator<Item = &CloudInfo> {
        self.clouds.values().flatten()
    }

    /// Clouds of `region`
    pub fn clouds_in(&self, region: &str) -> &[CloudInfo] {
        self.clouds.get(region).map(Vec::as_slice).unwrap_or_default()
    }

    /// Clouds of `region` passing `filter`
    pub fn select_clouds(&self, region: &str, filter: &NameFilter) -> Vec<&CloudInfo> {
        let implicit = !filter.has_requests();
        self.clouds_in(region)
            .iter()
            .filter(|info| filter.accepts(info.name(), implicit))
            .collect()
    }

    /// Read a field
    pub fn read_field(&self, info: &FieldInfo) -> Result<Field> {
        read_field(&self.input, info)
    }

    /// Restore `field` of `region` in place
    pub fn restore_field(&self, region: &str, field: &mut Field) -> Result<()> {
        restore_field(&self.input, region, field)
    }

    /// Read a cloud
    pub fn read_cloud(&self, info: &CloudInfo) -> Result<Cloud> {
        read_cloud(&self.input, info)
    }

    /// Read the mesh of `region`
    ///
    /// Parts not written in this instance are read from the instance the
    /// back-references name.
    pub fn read_mesh(&self, region: &str) -> Result<PolyMesh> {
        let (points_instance, faces_instance) = mesh_instances(&self.input, region, &self.instance);
        let mut mesh = self.with_instance(&faces_instance, |input| read_topology(input, region))?;
        mesh.points = self.with_instance(&points_instance, |input| read_points(input, region))?;
        debug!(
            region,
            points_instance = %points_instance,
            faces_instance = %faces_instance,
            "Read mesh"
        );
        Ok(mesh)
    }

    /// Names and types of the non-processor patches of `region`
    pub fn patches(&self, region: &str) -> Result<Vec<(String, String)>> {
        let (_, faces_instance) = mesh_instances(&self.input, region, &self.instance);
        self.with_instance(&faces_instance, |input| read_patch_attributes(input, region))
    }

    fn with_instance<R>(
        &self,
        instance: &str,
        f: impl FnOnce(&InputContainer) -> Result<R>,
    ) -> Result<R> {
        if instance == self.instance {
            return f(&self.input);
        }
        let location = locate(&self.data_dir, instance);
        let sibling = InputContainer::open(location, self.input.reader()).map_err(|e| {
            Error::Backend(format!(
                "instance {} referenced by {}: {}",
                instance, self.instance, e
            ))
        })?;
        f(&sibling)
    }
}

/// Names of the entities of `kind` in `region`
///
/// Uses the name list attribute; falls back to variables directly below
/// the entity prefix.
fn entity_names(input: &InputContainer, region: &str, kind: EntityKind) -> Vec<String> {
    let prefix = entity_prefix(region, kind);
    if let Some(names) = input.attributes().attribute_if_present::<Vec<String>>(&prefix) {
        return names;
    }
    let below = format!("{prefix}/");
    let mut names: Vec<String> = input
        .variable_names()
        .filter_map(|v| v.strip_prefix(below.as_str()))
        .filter_map(|rest| rest.split('/').next())
        .map(str::to_string)
        .collect();
    names.dedup();
    names
}
