//! Integration tests replaying recorded channel updates

use contact_sensor_agent::activity::create_shared_log;
use contact_sensor_agent::core::{DeviceKind, Role, SnapshotBuilder};
use contact_sensor_agent::replay::{InputSource, Replayer, UpdateReader};
use std::path::PathBuf;

fn demo_session() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join("orf_session.jsonl")
}

fn replay(source: InputSource) -> Replayer {
    let reader = UpdateReader::spawn(source, 4).expect("Failed to start reader");
    let mut replayer = Replayer::new(create_shared_log());
    replayer.run_to_end(reader.receiver());
    reader.join().expect("Reader failed");
    replayer
}

fn feature(replayer: &Replayer, kind: DeviceKind, id: &str, name: &str) -> f64 {
    replayer
        .devices()
        .get(kind, id)
        .expect("device missing")
        .sources()
        .into_iter()
        .find(|s| s.feature_name == name)
        .map(|s| s.value)
        .expect("feature missing")
}

#[test]
fn test_demo_session_detects_length_despite_stale_samples() {
    let replayer = replay(InputSource::File(demo_session()));
    let mouth = replayer.devices().get(DeviceKind::Orf, "mouth").unwrap();

    let length = mouth.detector(Role::Others).length().unwrap();
    assert!((length - 0.40).abs() < 1e-6, "length {length}");
    assert_eq!(mouth.detector(Role::Others).samples().len(), 8);
    assert!(mouth.detector(Role::Others).fallback().is_some());
    assert_eq!(mouth.detector(Role::Own).length(), None);
    assert_eq!(mouth.version(), Some(9));

    let pen = feature(&replayer, DeviceKind::Orf, "mouth", "penOthersNew");
    assert!((pen - 0.5).abs() < 1e-6, "pen {pen}");
    assert_eq!(
        feature(&replayer, DeviceKind::Orf, "mouth", "penOthers"),
        pen
    );
    assert_eq!(
        feature(&replayer, DeviceKind::Orf, "mouth", "touchOthers"),
        0.35
    );
}

#[test]
fn test_demo_session_gating_and_tps() {
    let replayer = replay(InputSource::File(demo_session()));
    assert_eq!(replayer.devices().len(), 3);

    assert_eq!(feature(&replayer, DeviceKind::Pen, "tail", "touchSelf"), 0.0);
    assert_eq!(feature(&replayer, DeviceKind::Pen, "tail", "penOthers"), 0.25);
    assert_eq!(
        feature(&replayer, DeviceKind::Orf, "legacy", "penOthers"),
        0.6
    );

    let stats = replayer.log().stats();
    assert_eq!(stats.malformed_lines, 0);
    assert_eq!(stats.updates_received, 21);
    assert_eq!(stats.samples_recorded, 11);
    assert_eq!(stats.fallback_updates, 1);
}

#[test]
fn test_snapshot_and_status_from_replay() {
    let replayer = replay(InputSource::File(demo_session()));

    let snapshot = SnapshotBuilder::new().build(replayer.devices());
    assert_eq!(snapshot.devices.len(), 3);
    assert_eq!(snapshot.sources.len(), 9 + 1 + 5);

    let status = replayer.devices().status();
    assert!(status.contains("Orf:mouth"));
    assert!(status.contains("  Nearby penetrator length: 0.40m"));
    assert!(status.contains("  penOthersNew=50%"));
    assert!(status.contains("  version=9"));
    assert!(status.contains("Pen:tail"));
    assert!(status.contains("  version=unknown"));
}

#[test]
fn test_missing_input_file_is_an_error() {
    let path = std::env::temp_dir().join("contact-sensor-does-not-exist.jsonl");
    let _ = std::fs::remove_file(&path);
    assert!(UpdateReader::spawn(InputSource::File(path), 4).is_err());
}

#[test]
fn test_malformed_lines_are_skipped() {
    let path = std::env::temp_dir().join("contact-sensor-malformed-test.jsonl");
    std::fs::write(
        &path,
        "{\"device\":\"Pen\",\"id\":\"p\",\"key\":\"PenSelf\",\"value\":0.4}\n\
         not json at all\n\
         {\"device\":\"Pen\",\"id\":\"p\",\"key\":\"PenSelf\",\"value\":0.6}\n",
    )
    .unwrap();

    let replayer = replay(InputSource::File(path.clone()));
    assert_eq!(replayer.log().stats().malformed_lines, 1);
    assert_eq!(feature(&replayer, DeviceKind::Pen, "p", "penSelf"), 0.6);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_invalid_utf8_line_is_skipped() {
    let path = std::env::temp_dir().join("contact-sensor-invalid-utf8-test.jsonl");
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"{\"device\":\"Pen\",\"id\":\"p\",\"key\":\"PenSelf\",\"value\":0.4}\n");
    bytes.extend_from_slice(b"\xff\xfe garbage\n");
    bytes.extend_from_slice(b"{\"device\":\"Pen\",\"id\":\"p\",\"key\":\"PenSelf\",\"value\":0.6}\n");
    std::fs::write(&path, bytes).unwrap();

    let replayer = replay(InputSource::File(path.clone()));
    let stats = replayer.log().stats();
    assert_eq!(stats.malformed_lines, 1);
    assert_eq!(stats.updates_received, 2);
    assert_eq!(feature(&replayer, DeviceKind::Pen, "p", "penSelf"), 0.6);

    let _ = std::fs::remove_file(&path);
}
