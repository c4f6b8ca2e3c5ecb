#![allow(dead_code)]

use std::io::Cursor;

use chrono::{DateTime, Duration, TimeZone, Utc};
use hindsight::{FrameMetadata, FrameStore};
use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

/// In-memory PNG of a single solid color.
pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("png encode");
    bytes
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap()
}

pub fn metadata(app: &str, offset_ms: i64) -> FrameMetadata {
    FrameMetadata {
        timestamp: base_time() + Duration::milliseconds(offset_ms),
        application_name: app.to_string(),
        window_title: Some(format!("{app} window")),
        background_applications: vec!["Finder".to_string()],
        is_first_of_session: offset_ms == 0,
    }
}

/// A scratch store populated with one distinctly-colored frame per entry of
/// `apps`, spaced one second apart.
pub fn seeded_store(apps: &[&str]) -> (TempDir, FrameStore) {
    let dir = TempDir::new().expect("temp dir");
    let store = FrameStore::new(dir.path()).expect("store");
    for (i, app) in apps.iter().enumerate() {
        let color = [(i * 40) as u8, 0, 255 - (i * 40) as u8];
        store
            .append(&metadata(app, i as i64 * 1000), &solid_png(4, 4, color))
            .expect("append");
    }
    (dir, store)
}
