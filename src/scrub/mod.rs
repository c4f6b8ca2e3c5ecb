//! Continuous-position scrubbing: input-to-position mapping with momentum
//! and snapping, plus frame resolution with the tri-bucket blend policy.

mod cache;
mod engine;
mod state;

pub use cache::{FrameCache, DEFAULT_CACHE_CAPACITY};
pub use engine::{AdvanceResult, ResolvedFrame, ScrubEngine, StepResult};
pub use state::{AdvanceOutcome, ScrubState, StepOutcome, WheelClass, WheelMove};
