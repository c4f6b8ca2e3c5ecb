//! Frame data model.
//!
//! Represents a single retained visual sample and the sidecar record that
//! persists alongside its image artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One retained frame as listed by the store. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Unique key within a store; derived from the capture timestamp.
    pub filename: String,
    pub timestamp: DateTime<Utc>,
    /// "Unknown" when the identity resolver could not name the application.
    pub application_name: String,
    pub window_title: Option<String>,
    pub background_applications: Vec<String>,
    pub is_first_of_session: bool,
}

/// Metadata supplied when appending a frame; the store derives the filename.
#[derive(Debug, Clone)]
pub struct FrameMetadata {
    pub timestamp: DateTime<Utc>,
    pub application_name: String,
    pub window_title: Option<String>,
    pub background_applications: Vec<String>,
    pub is_first_of_session: bool,
}

/// On-disk sidecar record, keyed by the same base name as the image artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSidecar {
    pub application_name: String,
    pub window_title: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub open_applications: Vec<String>,
    #[serde(default)]
    pub is_first_frame_of_session: bool,
}
