//! Restart resolution and session policies
//!
//! These tests verify that:
//! 1. latest / by-time / none resolve to the right instant
//! 2. Incomplete or invalid instants are handled as restart failures
//! 3. A restarted writer skips the restart time and stops on request

mod common;

use std::path::Path;

use common::*;
use meshstate_core::{HostRegion, TimeSnapshot};
use meshstate_durability::{
    find_times, CheckpointConfig, CheckpointWriter, RestartError, RestartPolicy, RestartResolver,
    StopPolicy,
};
use meshstate_storage::{Layout, Participant};
use tempfile::TempDir;

/// Write checkpoints at steps 1, 2 and 5 (times 0.1, 0.2, 0.5)
fn write_history(config: &CheckpointConfig) {
    let host = region("region0");
    let hosts: [&dyn HostRegion; 1] = [&host];
    let mut writer = CheckpointWriter::new(config, Participant::serial()).unwrap();
    for index in [1, 2, 5] {
        writer.write(&snapshot(index), &hosts).unwrap();
    }
}

fn resolve(dir: &Path, policy: RestartPolicy) -> Result<Option<String>, RestartError> {
    RestartResolver::new(policy, 1e-8)
        .resolve(dir)
        .map(|i| i.map(|i| i.name))
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_resolve_latest() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"));
    write_history(&config);
    assert_eq!(
        resolve(&config.data_dir, RestartPolicy::Latest).unwrap(),
        Some("0.5".to_string())
    );
}

#[test]
fn test_resolve_by_time() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"));
    write_history(&config);
    assert_eq!(
        resolve(&config.data_dir, RestartPolicy::Time(0.2)).unwrap(),
        Some("0.2".to_string())
    );
    assert_eq!(
        resolve(&config.data_dir, RestartPolicy::Time(0.1 + 0.1)).unwrap(),
        Some("0.2".to_string())
    );

    let err = resolve(&config.data_dir, RestartPolicy::Time(0.3)).unwrap_err();
    assert!(matches!(err, RestartError::NotFound { time } if time == 0.3));
}

#[test]
fn test_resolve_none_never_opens() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"));
    write_history(&config);

    // corrupt every instance; none must still succeed
    for instant in find_times(&config.data_dir).unwrap() {
        std::fs::remove_dir_all(instant.location.path()).unwrap();
        std::fs::create_dir(instant.location.path()).unwrap();
    }
    assert_eq!(resolve(&config.data_dir, RestartPolicy::None).unwrap(), None);
}

#[test]
fn test_incomplete_instance_excluded() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"));
    write_history(&config);

    // a later instance with no rank files, as left by an interrupted write
    std::fs::create_dir(config.data_dir.join("0.7")).unwrap();
    assert_eq!(find_times(&config.data_dir).unwrap().len(), 4);
    assert_eq!(
        resolve(&config.data_dir, RestartPolicy::Latest).unwrap(),
        Some("0.5".to_string())
    );
}

#[test]
fn test_unreadable_instance_is_restart_failure() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data")).with_restart(RestartPolicy::Latest);
    write_history(&config);

    let file = config.data_dir.join("0.5").join("rank-000000.blk");
    let mut bytes = std::fs::read(&file).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0xff;
    std::fs::write(&file, bytes).unwrap();

    let mut writer = CheckpointWriter::new(&config, Participant::serial()).unwrap();
    match writer.restart() {
        Err(RestartError::Unusable { instance, .. }) => assert_eq!(instance, "0.5"),
        other => panic!("expected an unusable checkpoint, got {:?}", other.map(|r| r.is_some())),
    }
}

#[test]
fn test_invalid_time_is_restart_failure() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    let location = meshstate_storage::Location::new(&data, "0.4", Layout::Directory);
    let mut engine = meshstate_storage::OutputEngine::open(
        location,
        Participant::serial(),
        meshstate_storage::TypeSizes::native(),
        "identity",
    )
    .unwrap();
    meshstate_durability::write_time(&mut engine, &TimeSnapshot::new(0, 0.4, 0.1, 0.1));
    engine.close().unwrap();

    let config = CheckpointConfig::new(&data).with_restart(RestartPolicy::Time(0.4));
    let mut writer = CheckpointWriter::new(&config, Participant::serial()).unwrap();
    assert!(matches!(
        writer.restart(),
        Err(RestartError::InvalidTime { ref instance }) if instance == "0.4"
    ));
}

#[test]
fn test_legacy_file_layout_is_found() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data")).with_layout(Layout::File);
    write_history(&config);
    let instants = find_times(&config.data_dir).unwrap();
    assert!(instants.iter().all(|i| i.location.layout() == Layout::File));
    assert_eq!(
        resolve(&config.data_dir, RestartPolicy::Time(0.1)).unwrap(),
        Some("0.1".to_string())
    );
}

// ============================================================================
// Writer policies
// ============================================================================

#[test]
fn test_restart_skips_same_index_and_disables() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data")).with_restart(RestartPolicy::Latest);
    write_history(&config);

    let mut writer = CheckpointWriter::new(&config, Participant::serial()).unwrap();
    let reader = writer.restart().unwrap().unwrap();
    assert_eq!(reader.instance(), "0.5");
    assert_eq!(reader.time(), snapshot(5));
    assert_eq!(writer.restart_index(), Some(5));
    assert_eq!(reader.read_mesh("region0").unwrap(), two_cell_mesh());

    let host = region("region0");
    assert!(writer.write(&snapshot(5), &[&host]).unwrap().is_none());
    assert!(writer.write(&snapshot(6), &[&host]).unwrap().is_some());

    // the policy fires once per session
    assert!(writer.restart().unwrap().is_none());
}

#[test]
fn test_restart_reads_back_referenced_mesh() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data")).with_restart(RestartPolicy::Time(0.2));
    write_history(&config);

    let mut writer = CheckpointWriter::new(&config, Participant::serial()).unwrap();
    let reader = writer.restart().unwrap().unwrap();
    assert!(!reader.input().has_variable("region0/polyMesh/points"));
    assert_eq!(reader.read_mesh("region0").unwrap(), two_cell_mesh());
    let p = reader.read_field(&reader.fields_in("region0")[0]).unwrap();
    assert_eq!(p, pressure());
}

#[test]
fn test_no_restart_when_disabled() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"));
    let mut writer = CheckpointWriter::new(&config, Participant::serial()).unwrap();
    assert!(writer.restart().unwrap().is_none());
    assert_eq!(writer.restart_index(), None);
}

#[test]
fn test_stop_policy() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data")).with_stop(StopPolicy::Time(0.3));
    let mut writer = CheckpointWriter::new(&config, Participant::serial()).unwrap();
    assert!(!writer.should_stop(0.2));
    assert!(writer.should_stop(0.3));
    assert!(!writer.should_stop(0.4));
}

#[test]
fn test_invalid_snapshot_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"));
    let mut writer = CheckpointWriter::new(&config, Participant::serial()).unwrap();
    let host = region("region0");
    assert!(writer.write(&TimeSnapshot::invalid(), &[&host]).is_err());
    assert!(find_times(&config.data_dir).unwrap().is_empty());
}

#[test]
fn test_non_finite_time_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"));
    let mut writer = CheckpointWriter::new(&config, Participant::serial()).unwrap();
    let host = region("region0");
    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        let err = writer
            .write(&TimeSnapshot::new(3, value, 0.1, 0.1), &[&host])
            .unwrap_err();
        assert!(matches!(err, meshstate_core::Error::InvalidOperation(_)));
    }
    let written = std::fs::read_dir(&config.data_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(written, 0);
    assert!(writer.tracker().record("region0").is_none());
}
