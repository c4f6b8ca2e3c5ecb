//! Contracts for the platform collaborators the engine consumes.
//!
//! The engine never implements screen acquisition or window enumeration
//! itself; hosts plug in implementations of these traits (platform bridges,
//! test fakes).

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Best-effort snapshot of the active application as reported by the host
/// platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveApplication {
    pub application_name: String,
    pub window_title: String,
    pub open_applications: Vec<String>,
}

impl ActiveApplication {
    /// Sentinel substituted whenever the resolver fails; a resolver error is
    /// never fatal to a capture session.
    pub fn unknown() -> Self {
        Self {
            application_name: "Unknown".to_string(),
            window_title: "Unknown".to_string(),
            open_applications: Vec::new(),
        }
    }
}

/// Produces raw image samples from a display source.
pub trait FrameSource: Send + Sync {
    /// Open the underlying source. Failure here is the only error surfaced
    /// out of `CaptureController::start`.
    fn open(&self) -> Result<()>;

    /// Acquire one raw image sample, or `None` when no sample is available
    /// right now. Errors are treated the same as `None` by the sampler.
    fn acquire(&self) -> Result<Option<Vec<u8>>>;
}

/// Resolves the identity of the frontmost application.
pub trait IdentityResolver: Send + Sync {
    fn resolve_active_application(&self) -> Result<ActiveApplication>;
}
