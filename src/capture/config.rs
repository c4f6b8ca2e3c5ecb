use tokio::time::Duration;

/// Tunable knobs for a capture session.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// One sample per tick.
    pub interval: Duration,

    /// A session ends automatically once this many samples have been
    /// acquired (kept or dropped).
    pub max_samples: u32,

    /// Upper bound on a single capture tick; a wedged collaborator call
    /// skips the tick instead of stalling the session.
    pub capture_timeout: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_samples: 30,
            capture_timeout: Duration::from_secs(10),
        }
    }
}
