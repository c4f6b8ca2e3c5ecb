//! Sampling pipeline: periodic acquisition, near-duplicate gating, and
//! persistence of the frames that survive.

mod config;
mod controller;
mod sampler;
pub mod similarity;

pub use config::CaptureConfig;
pub use controller::CaptureController;
pub use similarity::FrameVerdict;
