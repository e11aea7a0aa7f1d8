//! Write-then-read tests for meshes, fields, clouds and attributes
//!
//! These tests verify that a checkpoint read back reproduces:
//! 1. Point coordinates, connectivity, patches and zones
//! 2. Field interior values and boundary records
//! 3. Cloud sub-fields discovered from the name list
//! 4. The same values when stored with 4-byte widths

mod common;

use common::*;
use meshstate_core::{
    Error, ErrorKind, Field, FieldInfo, HostRegion, NameFilter, PatchEntry, PatchField, ValueKind,
};
use meshstate_durability::{
    CheckpointConfig, CheckpointReader, CheckpointWriter, RegionConfig,
};
use meshstate_storage::{Layout, Participant, StreamFormat};
use tempfile::TempDir;

fn write_one(config: &CheckpointConfig, hosts: &[&dyn HostRegion]) {
    let mut writer = CheckpointWriter::new(config, Participant::serial()).unwrap();
    let summary = writer.write(&snapshot(1), hosts).unwrap().unwrap();
    assert_eq!(summary.instance, "0.1");
}

fn assert_region_roundtrip(config: CheckpointConfig) {
    init_tracing();
    let host = region("region0");
    write_one(&config, &[&host]);

    let reader = CheckpointReader::open(&config.data_dir, "0.1", Participant::serial()).unwrap();
    assert_eq!(reader.regions(), &["region0".to_string()]);
    assert_eq!(reader.time(), snapshot(1));

    let mesh = reader.read_mesh("region0").unwrap();
    assert_eq!(mesh, host.mesh);

    for field in &host.fields {
        let info = FieldInfo::new("region0", field.name.as_str(), field.class.as_str());
        let read = reader.read_field(&info).unwrap();
        assert_eq!(&read, field);
    }

    let clouds: Vec<_> = reader.clouds_in("region0").to_vec();
    assert_eq!(clouds.len(), 1);
    let cloud = reader.read_cloud(&clouds[0]).unwrap();
    assert_eq!(cloud, host.clouds[0]);
}

// ============================================================================
// Round trips
// ============================================================================

#[test]
fn test_roundtrip_native_widths() {
    let dir = TempDir::new().unwrap();
    assert_region_roundtrip(CheckpointConfig::new(dir.path().join("data")));
}

#[test]
fn test_roundtrip_narrow_widths() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data")).with_widths(4, 4);
    assert_region_roundtrip(config.clone());

    let reader = CheckpointReader::open(&config.data_dir, "0.1", Participant::serial()).unwrap();
    assert_eq!(reader.sizes().label_width(), 4);
    assert_eq!(reader.sizes().scalar_width(), 4);
}

#[test]
fn test_roundtrip_text_streams_single_file() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"))
        .with_layout(Layout::File)
        .with_stream_format(StreamFormat::Text);
    assert_region_roundtrip(config.clone());
    assert!(config.data_dir.join("0.1.ckpt").is_file());
}

#[test]
fn test_non_finite_boundary_values_roundtrip() {
    init_tracing();
    for format in [StreamFormat::Text, StreamFormat::Binary] {
        let dir = TempDir::new().unwrap();
        let config = CheckpointConfig::new(dir.path().join("data")).with_stream_format(format);
        let mut host = region("region0");
        host.fields[0].boundary[2] = PatchField::new("walls", "fixedValue")
            .with_entry("value", PatchEntry::Scalar(f64::INFINITY))
            .with_entry("refValue", PatchEntry::Uniform(vec![f64::NEG_INFINITY]));
        write_one(&config, &[&host]);

        let reader = CheckpointReader::open(&config.data_dir, "0.1", Participant::serial()).unwrap();
        let p = reader
            .read_field(&FieldInfo::new("region0", "p", "volScalarField"))
            .unwrap();
        assert_eq!(p, host.fields[0], "format = {}", format.name());
    }
}

#[test]
fn test_narrowing_overflow_fails_write() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data")).with_widths(4, 8);
    let mut host = region("region0");
    host.clouds[0].fields[0] = meshstate_core::CloudField::new(
        "origId",
        meshstate_core::CloudValues::Label(vec![1, i64::MAX, 3]),
    );

    let mut writer = CheckpointWriter::new(&config, Participant::serial()).unwrap();
    let err = writer.write(&snapshot(1), &[&host]).unwrap_err();
    assert!(matches!(err, Error::NarrowingOverflow { index: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    assert!(writer.tracker().record("region0").is_none());
}

// ============================================================================
// Metadata scan and selection
// ============================================================================

#[test]
fn test_scan_lists_fields_with_classes() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"));
    write_one(&config, &[&region("region0")]);

    let reader = CheckpointReader::open(&config.data_dir, "0.1", Participant::serial()).unwrap();
    let mut names: Vec<(String, String)> = reader
        .fields()
        .map(|f| (f.name().to_string(), f.type_tag().to_string()))
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            ("U".to_string(), "volVectorField".to_string()),
            ("p".to_string(), "volScalarField".to_string()),
            ("pointDisplacement".to_string(), "pointVectorField".to_string()),
        ]
    );

    let filter = NameFilter::new(&["p.*"], &["pointDisplacement"]).unwrap();
    let selected: Vec<&str> = reader
        .select_fields("region0", &filter)
        .into_iter()
        .map(|f| f.name())
        .collect();
    assert_eq!(selected, vec!["p"]);
}

#[test]
fn test_region_control_selects_fields() {
    let dir = TempDir::new().unwrap();
    let mut host = region("fluid");
    host.fields[0].auto_write = false;
    let config = CheckpointConfig::new(dir.path().join("data")).with_region(RegionConfig {
        ignore_fields: vec!["point.*".into()],
        ignore_clouds: vec!["spray".into()],
        ..RegionConfig::new("fluid")
    });
    write_one(&config, &[&host]);

    let reader = CheckpointReader::open(&config.data_dir, "0.1", Participant::serial()).unwrap();
    let names: Vec<&str> = reader.fields_in("fluid").iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["U"]);
    assert!(reader.clouds_in("fluid").is_empty());
}

#[test]
fn test_missing_host_region_is_skipped() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"))
        .with_region(RegionConfig::new("fluid"))
        .with_region(RegionConfig::new("solid"));
    let mut writer = CheckpointWriter::new(&config, Participant::serial()).unwrap();
    let host = region("fluid");
    let summary = writer.write(&snapshot(1), &[&host]).unwrap().unwrap();
    assert_eq!(summary.regions.len(), 1);

    let reader = CheckpointReader::open(&config.data_dir, "0.1", Participant::serial()).unwrap();
    assert_eq!(reader.regions(), &["fluid".to_string()]);
}

#[test]
fn test_patch_attributes() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"));
    let mut host = region("region0");
    host.mesh
        .patches
        .push(meshstate_core::Patch::new("procBoundary0to1", "processor", 11, 0));
    write_one(&config, &[&host]);

    let reader = CheckpointReader::open(&config.data_dir, "0.1", Participant::serial()).unwrap();
    let patches = reader.patches("region0").unwrap();
    assert_eq!(
        patches,
        vec![
            ("inlet".to_string(), "patch".to_string()),
            ("outlet".to_string(), "patch".to_string()),
            ("walls".to_string(), "wall".to_string()),
        ]
    );
    assert_eq!(reader.read_mesh("region0").unwrap().patches.len(), 4);
}

// ============================================================================
// Restore into existing fields
// ============================================================================

#[test]
fn test_restore_field_in_place() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"));
    write_one(&config, &[&region("region0")]);
    let reader = CheckpointReader::open(&config.data_dir, "0.1", Participant::serial()).unwrap();

    let mut p = Field::new("p", "volScalarField", ValueKind::Scalar, vec![0.0; 2]);
    reader.restore_field("region0", &mut p).unwrap();
    assert_eq!(p.internal, pressure().internal);
    assert_eq!(p.boundary, pressure().boundary);
}

#[test]
fn test_restore_field_size_mismatch() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"));
    write_one(&config, &[&region("region0")]);
    let reader = CheckpointReader::open(&config.data_dir, "0.1", Participant::serial()).unwrap();

    let mut p = Field::new("p", "volScalarField", ValueKind::Scalar, vec![0.0; 3]);
    let err = reader.restore_field("region0", &mut p).unwrap_err();
    assert!(matches!(err, Error::SizeMismatch { expected: 2, actual: 3, .. }));
    assert_eq!(err.kind(), ErrorKind::Partition);
    assert!(!err.is_fatal_for_session());
}

#[test]
fn test_restore_field_class_mismatch() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"));
    write_one(&config, &[&region("region0")]);
    let reader = CheckpointReader::open(&config.data_dir, "0.1", Participant::serial()).unwrap();

    let mut p = Field::new("p", "surfaceScalarField", ValueKind::Scalar, vec![0.0; 2]);
    assert!(reader.restore_field("region0", &mut p).is_err());

    let mut missing = Field::new("k", "volScalarField", ValueKind::Scalar, vec![0.0; 2]);
    let err = reader.restore_field("region0", &mut missing).unwrap_err();
    assert!(matches!(err, Error::MissingVariable { .. }));
    assert_eq!(err.kind(), ErrorKind::Schema);
}

// ============================================================================
// Attribute semantics
// ============================================================================

#[test]
fn test_mandatory_and_optional_attributes() {
    let dir = TempDir::new().unwrap();
    let config = CheckpointConfig::new(dir.path().join("data"));
    write_one(&config, &[&region("region0")]);
    let reader = CheckpointReader::open(&config.data_dir, "0.1", Participant::serial()).unwrap();
    let attrs = reader.input().attributes();

    let class: String = attrs.attribute("region0/field/p/class").unwrap();
    assert_eq!(class, "volScalarField");

    let err = attrs.attribute::<String>("region0/field/k/class").unwrap_err();
    assert!(matches!(err, Error::MissingAttribute { ref path } if path == "region0/field/k/class"));

    let mut out = String::from("unchanged");
    let found = attrs.get("region0/field/k/class", &mut out, false).unwrap();
    assert!(!found);
    assert_eq!(out, "unchanged");
    assert!(attrs.attribute_if_present::<i64>("/meshstate/nProcs").is_some());
}
