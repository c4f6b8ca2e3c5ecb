//! Timeline index: turns the flat ordered frame list into application-usage
//! segments.

mod color;
mod segments;

pub use color::application_color;
pub use segments::{build_segments, ApplicationSegment, SEGMENT_TAIL_MS};
