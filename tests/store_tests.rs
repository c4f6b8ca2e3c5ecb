mod common;

use common::{base_time, metadata, seeded_store, solid_png};
use hindsight::FrameStore;
use tempfile::TempDir;

#[test]
fn append_then_list_round_trips_metadata() {
    let (_dir, store) = seeded_store(&["Safari", "Terminal"]);

    let frames = store.list().expect("list");
    assert_eq!(frames.len(), 2);

    let first = &frames[0];
    assert_eq!(first.application_name, "Safari");
    assert_eq!(first.window_title.as_deref(), Some("Safari window"));
    assert_eq!(first.background_applications, vec!["Finder".to_string()]);
    assert!(first.is_first_of_session);
    assert_eq!(first.timestamp, base_time());

    assert!(!frames[1].is_first_of_session);
}

#[test]
fn list_orders_by_timestamp_regardless_of_append_order() {
    let dir = TempDir::new().unwrap();
    let store = FrameStore::new(dir.path()).unwrap();

    store
        .append(&metadata("Later", 5000), &solid_png(2, 2, [1, 2, 3]))
        .unwrap();
    store
        .append(&metadata("Earlier", 1000), &solid_png(2, 2, [4, 5, 6]))
        .unwrap();

    let frames = store.list().unwrap();
    assert_eq!(frames[0].application_name, "Earlier");
    assert_eq!(frames[1].application_name, "Later");
}

#[test]
fn read_bytes_returns_stored_image_or_none() {
    let (_dir, store) = seeded_store(&["Safari"]);
    let frames = store.list().unwrap();

    let bytes = store
        .read_bytes(&frames[0].filename)
        .expect("read")
        .expect("present");
    assert_eq!(bytes, solid_png(4, 4, [0, 0, 255]));

    assert!(store.read_bytes("screenshot-missing.png").unwrap().is_none());
}

#[test]
fn sidecar_uses_camel_case_record_layout() {
    let (dir, store) = seeded_store(&["Safari"]);
    let frames = store.list().unwrap();
    let sidecar_path = dir
        .path()
        .join(frames[0].filename.replace(".png", ".json"));

    let raw = std::fs::read_to_string(sidecar_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["applicationName"], "Safari");
    assert_eq!(value["windowTitle"], "Safari window");
    assert_eq!(value["isFirstFrameOfSession"], true);
    assert!(value["openApplications"].is_array());
    assert!(value["timestamp"].is_string());
}

#[test]
fn frame_without_sidecar_falls_back_to_unknown() {
    let (dir, store) = seeded_store(&["Safari"]);

    // An image artifact with no sidecar still shows up, labeled Unknown,
    // with its timestamp recovered from the filename.
    let orphan = dir.path().join("screenshot-2026-08-07T10-00-30-000Z.png");
    std::fs::write(orphan, solid_png(2, 2, [9, 9, 9])).unwrap();

    let frames = store.list().unwrap();
    assert_eq!(frames.len(), 2);
    let orphan_frame = &frames[1];
    assert_eq!(orphan_frame.application_name, "Unknown");
    assert!(orphan_frame.window_title.is_none());
    assert_eq!(
        orphan_frame.timestamp,
        base_time() + chrono::Duration::seconds(30)
    );
}

#[test]
fn empty_store_lists_nothing() {
    let dir = TempDir::new().unwrap();
    let store = FrameStore::new(dir.path()).unwrap();
    assert!(store.list().unwrap().is_empty());
}
