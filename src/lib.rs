//! hindsight — activity capture and timeline engine.
//!
//! Periodically samples a visual activity stream, deduplicates near-identical
//! frames, and replays the retained sequence as a scrubbable timeline of
//! application usage. Screen acquisition, window enumeration, and rendering
//! live outside this crate behind the [`providers`] traits and the engine
//! event channel.

mod capture;
mod events;
mod playback;
mod providers;
mod scrub;
mod stats;
mod store;
mod timeline;

pub use capture::similarity;
pub use capture::{CaptureConfig, CaptureController, FrameVerdict};
pub use events::{EngineEvent, EventSink, LoadKind};
pub use playback::{PlaybackScheduler, PLAYBACK_BASE_STEP, PLAYBACK_SPEEDS, PLAYBACK_TICK};
pub use providers::{ActiveApplication, FrameSource, IdentityResolver};
pub use scrub::{
    AdvanceResult, FrameCache, ResolvedFrame, ScrubEngine, StepOutcome, StepResult, WheelClass,
};
pub use stats::{compute_usage, AppUsageStats, UsageStats, IDLE_THRESHOLD_MS};
pub use store::{Frame, FrameMetadata, FrameSidecar, FrameStore};
pub use timeline::{application_color, build_segments, ApplicationSegment, SEGMENT_TAIL_MS};

/// Initialize logging (reads `RUST_LOG`; `HINDSIGHT_DEBUG=1` raises the
/// default level to debug).
pub fn init_logging() {
    let debug_mode = std::env::var("HINDSIGHT_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    env_logger::Builder::from_default_env()
        .filter_level(if debug_mode {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();
}
