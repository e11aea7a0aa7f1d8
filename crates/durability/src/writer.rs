//! Checkpoint writer session
//!
//! One writer per participant. Each call to [`CheckpointWriter::write`]
//! produces one instance named after the simulation time:
//!
//! 1. open an output engine and stamp the base and time attributes
//! 2. per configured region: plan the mesh update, write the mesh, then
//!    the accepted fields and clouds with their name lists
//! 3. end the step and close, which flushes the container file and marks
//!    it completed
//! 4. commit the mesh plans to the topology tracker
//!
//! Any failure before step 4 leaves the tracker untouched, so the next
//! checkpoint rewrites the full mesh.

use std::path::{Path, PathBuf};

use meshstate_core::naming::{entity_prefix, global_attribute, EntityKind};
use meshstate_core::{
    Error, HostRegion, Label, MeshUpdate, Result, Scalar, TimeSnapshot,
};
use meshstate_storage::{Layout, Location, OutputEngine, Participant, StreamFormat, TypeSizes};
use tracing::{debug, info, warn};

use crate::cloud::write_cloud;
use crate::config::{CheckpointConfig, ConfigError};
use crate::control::RegionControl;
use crate::field::{field_extent, write_field};
use crate::mesh::write_mesh;
use crate::policy::{RestartPolicy, StopControl};
use crate::reader::CheckpointReader;
use crate::restart::{RestartError, RestartResolver};
use crate::time::write_time;
use crate::tracker::{MeshPlan, TopologyTracker};

/// Global attribute listing the regions in a checkpoint
pub const REGIONS_ATTRIBUTE: &str = "regions";

/// What one checkpoint wrote
#[derive(Debug, Clone, PartialEq)]
pub struct WriteSummary {
    /// Instance name
    pub instance: String,
    /// Instance location
    pub location: Location,
    /// Mesh update per region, in write order
    pub regions: Vec<(String, MeshUpdate)>,
    /// Number of fields written
    pub fields: usize,
    /// Number of clouds written
    pub clouds: usize,
}

/// Writer session for one participant
#[derive(Debug)]
pub struct CheckpointWriter {
    data_dir: PathBuf,
    participant: Participant,
    sizes: TypeSizes,
    layout: Layout,
    stream_format: StreamFormat,
    codec: String,
    regions: Vec<RegionControl>,
    resolver: RestartResolver,
    stop: StopControl,
    tracker: TopologyTracker,
    restart_index: Option<Label>,
}

impl CheckpointWriter {
    /// Create a writer from a validated configuration
    pub fn new(config: &CheckpointConfig, participant: Participant) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(CheckpointWriter {
            data_dir: config.data_dir.clone(),
            participant,
            sizes: config.type_sizes()?,
            layout: config.layout,
            stream_format: config.stream_format,
            codec: config.codec.clone(),
            regions: config.region_controls()?,
            resolver: RestartResolver::new(config.restart_policy()?, config.time_tolerance),
            stop: StopControl::new(config.stop_policy()?),
            tracker: TopologyTracker::new(),
            restart_index: None,
        })
    }

    /// Data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// This participant
    pub fn participant(&self) -> Participant {
        self.participant
    }

    /// Region controls, in write order
    pub fn regions(&self) -> &[RegionControl] {
        &self.regions
    }

    /// Topology tracker
    pub fn tracker(&self) -> &TopologyTracker {
        &self.tracker
    }

    /// Time index restarted from, if any
    pub fn restart_index(&self) -> Option<Label> {
        self.restart_index
    }

    /// Resolve the restart policy and open the chosen instant
    ///
    /// Returns `Ok(None)` when restarting is disabled. A successful restart
    /// disables the policy and remembers the time index so the same
    /// instant is not written again.
    pub fn restart(&mut self) -> std::result::Result<Option<CheckpointReader>, RestartError> {
        let Some(instant) = self.resolver.resolve(&self.data_dir)? else {
            return Ok(None);
        };
        let reader = CheckpointReader::open_instant(&self.data_dir, &instant, self.participant)?;
        self.restart_index = Some(reader.time().index());
        self.resolver = RestartResolver::new(RestartPolicy::None, 0.0);
        info!(
            instance = %instant.name,
            index = reader.time().index(),
            "Restarting from checkpoint"
        );
        Ok(Some(reader))
    }

    /// Write a checkpoint of `hosts` at `time`
    ///
    /// Returns `Ok(None)` when `time` is the instant restarted from.
    pub fn write(
        &mut self,
        time: &TimeSnapshot,
        hosts: &[&dyn HostRegion],
    ) -> Result<Option<WriteSummary>> {
        if !time.is_valid() {
            return Err(Error::InvalidOperation(format!(
                "cannot checkpoint time index {}",
                time.index()
            )));
        }
        if !time.value().is_finite() {
            return Err(Error::InvalidOperation(format!(
                "cannot checkpoint non-finite time {}",
                time.value()
            )));
        }
        if self.restart_index == Some(time.index()) {
            debug!(index = time.index(), "Skipping checkpoint of restart time");
            return Ok(None);
        }

        let instance = time.time_name();
        let location = Location::new(&self.data_dir, &instance, self.layout);
        let mut engine = OutputEngine::open(location.clone(), self.participant, self.sizes, &self.codec)?;
        write_time(&mut engine, time);

        engine.begin_step()?;
        let mut plans: Vec<(String, MeshPlan)> = Vec::new();
        let mut fields = 0;
        let mut clouds = 0;
        for control in &self.regions {
            let region = control.name();
            let Some(host) = hosts.iter().find(|h| h.name() == region) else {
                warn!(region, "Region not provided by host, skipping");
                continue;
            };
            let plan = self
                .tracker
                .plan(region, host.points_time(), host.topo_time(), &instance);
            write_mesh(&mut engine, *host, &plan, self.stream_format)?;

            let extents = host.extents();
            let mut field_names = Vec::new();
            for field in host.fields().iter().filter(|f| control.accepts_field(f)) {
                let extent = field_extent(&extents, field.location);
                write_field(&mut engine, region, field, extent, self.stream_format)?;
                field_names.push(field.name.clone());
            }
            fields += field_names.len();
            engine.put_attribute(entity_prefix(region, EntityKind::Field), field_names);

            let mut cloud_names = Vec::new();
            for cloud in host.clouds().iter().filter(|c| control.accepts_cloud(c)) {
                write_cloud(&mut engine, region, cloud)?;
                cloud_names.push(cloud.name.clone());
            }
            clouds += cloud_names.len();
            engine.put_attribute(entity_prefix(region, EntityKind::Cloud), cloud_names);

            plans.push((region.to_string(), plan));
        }
        let names: Vec<String> = plans.iter().map(|(r, _)| r.clone()).collect();
        engine.put_attribute(global_attribute(REGIONS_ATTRIBUTE), names);
        engine.end_step()?;
        engine.close()?;

        for (region, plan) in &plans {
            self.tracker.commit(region, plan);
        }
        let summary = WriteSummary {
            instance,
            location,
            regions: plans.into_iter().map(|(r, p)| (r, p.update)).collect(),
            fields,
            clouds,
        };
        info!(
            instance = %summary.instance,
            index = time.index(),
            rank = self.participant.rank,
            regions = summary.regions.len(),
            fields,
            clouds,
            "Wrote checkpoint"
        );
        Ok(Some(summary))
    }

    /// Evaluate the stop policy at `time`
    ///
    /// True at most once per session.
    pub fn should_stop(&mut self, time: Scalar) -> bool {
        let stop = self.stop.check(time);
        if stop {
            info!(time, policy = self.stop.policy().keyword(), "Stop requested");
        }
        stop
    }
}
