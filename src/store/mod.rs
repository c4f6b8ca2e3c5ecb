//! Durable ordered log of captured frames.
//!
//! Each retained frame is one PNG artifact plus a JSON sidecar sharing the
//! same base name. Files are append-only; the engine never mutates or deletes
//! existing frames, so concurrent readers always see a consistent prefix.

mod models;

pub use models::{Frame, FrameMetadata, FrameSidecar};

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use log::warn;

const FRAME_PREFIX: &str = "screenshot-";
const FRAME_EXT: &str = "png";
const SIDECAR_EXT: &str = "json";

/// File-backed frame store rooted at a single directory.
#[derive(Clone)]
pub struct FrameStore {
    dir: Arc<PathBuf>,
}

impl FrameStore {
    /// Open a store at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create frame directory {}", dir.display()))?;
        Ok(Self { dir: Arc::new(dir) })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Persist one frame: image artifact first, then its sidecar record.
    /// Timestamps are truncated to millisecond resolution so the in-memory
    /// frame round-trips through the filename and sidecar unchanged.
    pub fn append(&self, meta: &FrameMetadata, bytes: &[u8]) -> Result<Frame> {
        let timestamp = meta.timestamp.trunc_subsecs(3);
        let filename = frame_filename(timestamp);
        let image_path = self.dir.join(&filename);
        let sidecar_path = image_path.with_extension(SIDECAR_EXT);

        fs::write(&image_path, bytes)
            .with_context(|| format!("failed to write frame {}", image_path.display()))?;

        let sidecar = FrameSidecar {
            application_name: meta.application_name.clone(),
            window_title: meta
                .window_title
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            timestamp,
            open_applications: meta.background_applications.clone(),
            is_first_frame_of_session: meta.is_first_of_session,
        };
        let json = serde_json::to_string_pretty(&sidecar)?;
        fs::write(&sidecar_path, json)
            .with_context(|| format!("failed to write sidecar {}", sidecar_path.display()))?;

        Ok(Frame {
            filename,
            timestamp,
            application_name: meta.application_name.clone(),
            window_title: meta.window_title.clone(),
            background_applications: meta.background_applications.clone(),
            is_first_of_session: meta.is_first_of_session,
        })
    }

    /// List all frames in non-decreasing timestamp order.
    ///
    /// A frame whose sidecar is missing or unreadable still appears, labeled
    /// "Unknown", with its timestamp recovered from the filename. A single
    /// bad record never fails the whole listing.
    pub fn list(&self) -> Result<Vec<Frame>> {
        let entries = fs::read_dir(self.dir.as_ref())
            .with_context(|| format!("failed to read frame directory {}", self.dir.display()))?;

        let mut frames = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FRAME_EXT) {
                continue;
            }
            let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            match self.read_sidecar(&path.with_extension(SIDECAR_EXT)) {
                Some(sidecar) => frames.push(Frame {
                    filename: filename.to_string(),
                    timestamp: sidecar.timestamp,
                    application_name: sidecar.application_name,
                    window_title: Some(sidecar.window_title),
                    background_applications: sidecar.open_applications,
                    is_first_of_session: sidecar.is_first_frame_of_session,
                }),
                None => match parse_frame_timestamp(filename) {
                    Some(timestamp) => frames.push(Frame {
                        filename: filename.to_string(),
                        timestamp,
                        application_name: "Unknown".to_string(),
                        window_title: None,
                        background_applications: Vec::new(),
                        is_first_of_session: false,
                    }),
                    None => {
                        warn!("skipping frame with no sidecar and unparseable name: {filename}");
                    }
                },
            }
        }

        frames.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Ok(frames)
    }

    /// Read the raw image bytes for a frame key. `None` when the frame does
    /// not exist; IO failures beyond that are surfaced.
    pub fn read_bytes(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        let path = self.dir.join(filename);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => {
                Err(err).with_context(|| format!("failed to read frame {}", path.display()))
            }
        }
    }

    fn read_sidecar(&self, path: &std::path::Path) -> Option<FrameSidecar> {
        let contents = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(sidecar) => Some(sidecar),
            Err(err) => {
                warn!("unreadable sidecar {}: {err}", path.display());
                None
            }
        }
    }
}

/// `screenshot-2026-08-07T12-34-56-789Z.png` — RFC-3339 with `:` and `.`
/// flattened so the key is filesystem-safe on every platform.
fn frame_filename(timestamp: DateTime<Utc>) -> String {
    let stamp = timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{FRAME_PREFIX}{stamp}.{FRAME_EXT}")
}

fn parse_frame_timestamp(filename: &str) -> Option<DateTime<Utc>> {
    let stem = filename
        .strip_prefix(FRAME_PREFIX)?
        .strip_suffix(&format!(".{FRAME_EXT}"))?;
    let naive = NaiveDateTime::parse_from_str(stem, "%Y-%m-%dT%H-%M-%S-%3fZ").ok()?;
    Some(DateTime::from_naive_utc_and_offset(naive, Utc))
}
