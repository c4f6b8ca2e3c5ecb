//! Engine-to-UI notifications.
//!
//! The presentation layer subscribes to a channel of serializable events;
//! emitting with no subscriber is a no-op, never an error.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Why a frame is being resolved. The UI shows auxiliary panels (background
/// application list) only for user-driven seeks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadKind {
    UserSeek,
    ProgrammaticAdvance,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum EngineEvent {
    PositionChanged {
        position: f64,
    },
    FrameResolved {
        filename: String,
        index: usize,
        kind: LoadKind,
        blended: bool,
    },
    PlaybackChanged {
        playing: bool,
        speed: f64,
    },
}

/// Cheap-to-clone sender handle shared by the engine components.
#[derive(Clone, Default)]
pub struct EventSink {
    tx: Option<UnboundedSender<EngineEvent>>,
}

impl EventSink {
    /// Create a connected sink plus the receiving end for the UI.
    pub fn channel() -> (Self, UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink that drops every event; used when no UI is attached.
    pub fn disconnected() -> Self {
        Self { tx: None }
    }

    pub fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
