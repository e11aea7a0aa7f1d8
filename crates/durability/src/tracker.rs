//! Topology change tracking
//!
//! For each region the tracker remembers the point/topology change times
//! and the instances where points and faces were last written. Before a
//! checkpoint it compares the host's current times against that record and
//! produces a [`MeshPlan`]; the record only advances when the caller
//! commits the plan after a successful write.

use meshstate_core::{MeshUpdate, Scalar};
use rustc_hash::FxHashMap;
use tracing::debug;

/// State recorded at the last successful checkpoint of a region
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyRecord {
    /// Points change time at that checkpoint
    pub points_time: Scalar,
    /// Topology change time at that checkpoint
    pub topo_time: Scalar,
    /// Instance holding the point coordinates
    pub points_instance: String,
    /// Instance holding connectivity, addressing and zones
    pub faces_instance: String,
}

/// What to write for one region's mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPlan {
    /// Kind of update
    pub update: MeshUpdate,
    /// Instance holding point coordinates after this checkpoint
    pub points_instance: String,
    /// Instance holding connectivity after this checkpoint
    pub faces_instance: String,
    /// Host points change time
    pub points_time: Scalar,
    /// Host topology change time
    pub topo_time: Scalar,
}

/// Per-region records keyed by region name
#[derive(Debug, Clone, Default)]
pub struct TopologyTracker {
    records: FxHashMap<String, TopologyRecord>,
}

impl TopologyTracker {
    /// Create a tracker with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record for `region`, if one was committed
    pub fn record(&self, region: &str) -> Option<&TopologyRecord> {
        self.records.get(region)
    }

    /// Decide what the checkpoint named `instance` must write for `region`
    pub fn plan(
        &self,
        region: &str,
        points_time: Scalar,
        topo_time: Scalar,
        instance: &str,
    ) -> MeshPlan {
        let (update, points_instance, faces_instance) = match self.records.get(region) {
            None => (MeshUpdate::TopoChange, instance, instance),
            Some(r) if r.topo_time != topo_time => (MeshUpdate::TopoChange, instance, instance),
            Some(r) if r.points_time != points_time => {
                (MeshUpdate::PointsMoved, instance, r.faces_instance.as_str())
            }
            Some(r) => (
                MeshUpdate::Unchanged,
                r.points_instance.as_str(),
                r.faces_instance.as_str(),
            ),
        };
        debug!(region, instance, ?update, points_instance, faces_instance, "Planned mesh update");
        MeshPlan {
            update,
            points_instance: points_instance.to_string(),
            faces_instance: faces_instance.to_string(),
            points_time,
            topo_time,
        }
    }

    /// Adopt `plan` as the record for `region`
    pub fn commit(&mut self, region: &str, plan: &MeshPlan) {
        self.records.insert(
            region.to_string(),
            TopologyRecord {
                points_time: plan.points_time,
                topo_time: plan.topo_time,
                points_instance: plan.points_instance.clone(),
                faces_instance: plan.faces_instance.clone(),
            },
        );
    }

    /// Forget all history, forcing the next checkpoint to write full meshes
    pub fn reset(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_write_is_full() {
        let tracker = TopologyTracker::new();
        let plan = tracker.plan("region0", 0.0, 0.0, "0.1");
        assert_eq!(plan.update, MeshUpdate::TopoChange);
        assert_eq!(plan.faces_instance, "0.1");
    }

    #[test]
    fn test_unchanged_references_previous() {
        let mut tracker = TopologyTracker::new();
        let first = tracker.plan("region0", 0.0, 0.0, "0.1");
        tracker.commit("region0", &first);

        let second = tracker.plan("region0", 0.0, 0.0, "0.2");
        assert_eq!(second.update, MeshUpdate::Unchanged);
        assert_eq!(second.points_instance, "0.1");
        assert_eq!(second.faces_instance, "0.1");
    }

    #[test]
    fn test_points_moved() {
        let mut tracker = TopologyTracker::new();
        let first = tracker.plan("region0", 0.0, 0.0, "0.1");
        tracker.commit("region0", &first);

        let second = tracker.plan("region0", 0.15, 0.0, "0.2");
        assert_eq!(second.update, MeshUpdate::PointsMoved);
        assert_eq!(second.points_instance, "0.2");
        assert_eq!(second.faces_instance, "0.1");
    }

    #[test]
    fn test_topology_change() {
        let mut tracker = TopologyTracker::new();
        let first = tracker.plan("region0", 0.0, 0.0, "0.1");
        tracker.commit("region0", &first);
        let second = tracker.plan("region0", 0.15, 0.15, "0.2");
        assert_eq!(second.update, MeshUpdate::TopoChange);
        assert_eq!(second.faces_instance, "0.2");
    }

    #[test]
    fn test_uncommitted_plan_leaves_record() {
        let mut tracker = TopologyTracker::new();
        let first = tracker.plan("region0", 0.0, 0.0, "0.1");
        tracker.commit("region0", &first);

        // planned but never committed (write failed)
        let _ = tracker.plan("region0", 0.3, 0.3, "0.2");
        assert_eq!(tracker.record("region0").unwrap().faces_instance, "0.1");
        assert_eq!(
            tracker.plan("region0", 0.3, 0.3, "0.3").update,
            MeshUpdate::TopoChange
        );
    }

    #[test]
    fn test_regions_tracked_independently() {
        let mut tracker = TopologyTracker::new();
        let plan = tracker.plan("fluid", 0.0, 0.0, "0.1");
        tracker.commit("fluid", &plan);
        assert_eq!(tracker.plan("solid", 0.0, 0.0, "0.2").update, MeshUpdate::TopoChange);
        tracker.reset();
        assert!(tracker.record("fluid").is_none());
    }
}
