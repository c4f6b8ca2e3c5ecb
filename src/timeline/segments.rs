use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::store::Frame;

use super::color::application_color;

/// Trailing span granted to the final frame, which has no successor to close
/// its interval.
pub const SEGMENT_TAIL_MS: i64 = 2000;

/// A maximal run of consecutive frames sharing an application name. Derived
/// on demand; never persisted. The interval is half-open: `[start, end)`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSegment {
    pub application_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub color: &'static str,
}

/// Consolidate an ordered frame list into application segments.
///
/// Segments partition the full timespan with no gaps or overlaps, and two
/// adjacent segments never share an application name. Keying is plain string
/// equality.
pub fn build_segments(frames: &[Frame]) -> Vec<ApplicationSegment> {
    let mut segments: Vec<ApplicationSegment> = Vec::new();
    let mut open: Option<ApplicationSegment> = None;

    for (i, frame) in frames.iter().enumerate() {
        // The last frame extends by a fixed tail instead of a successor.
        let end_time = match frames.get(i + 1) {
            Some(next) => next.timestamp,
            None => frame.timestamp + Duration::milliseconds(SEGMENT_TAIL_MS),
        };

        match &mut open {
            Some(segment) if segment.application_name == frame.application_name => {
                segment.end_time = end_time;
            }
            _ => {
                if let Some(done) = open.take() {
                    segments.push(done);
                }
                open = Some(ApplicationSegment {
                    application_name: frame.application_name.clone(),
                    start_time: frame.timestamp,
                    end_time,
                    color: application_color(&frame.application_name),
                });
            }
        }
    }

    if let Some(done) = open {
        segments.push(done);
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn frame(app: &str, offset_ms: i64) -> Frame {
        let base = Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap();
        Frame {
            filename: format!("screenshot-{offset_ms}.png"),
            timestamp: base + Duration::milliseconds(offset_ms),
            application_name: app.to_string(),
            window_title: None,
            background_applications: Vec::new(),
            is_first_of_session: false,
        }
    }

    #[test]
    fn empty_input_yields_no_segments() {
        assert!(build_segments(&[]).is_empty());
    }

    #[test]
    fn single_frame_spans_the_fixed_tail() {
        let frames = vec![frame("Safari", 0)];
        let segments = build_segments(&frames);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].start_time, frames[0].timestamp);
        assert_eq!(
            segments[0].end_time,
            frames[0].timestamp + Duration::milliseconds(SEGMENT_TAIL_MS)
        );
    }

    #[test]
    fn consecutive_same_app_frames_merge() {
        let frames = vec![
            frame("Safari", 0),
            frame("Safari", 1000),
            frame("Terminal", 2000),
            frame("Terminal", 3000),
            frame("Safari", 4000),
        ];
        let segments = build_segments(&frames);
        let names: Vec<&str> = segments
            .iter()
            .map(|s| s.application_name.as_str())
            .collect();
        assert_eq!(names, ["Safari", "Terminal", "Safari"]);
    }

    #[test]
    fn segments_partition_the_timeline() {
        let frames = vec![
            frame("A", 0),
            frame("A", 1500),
            frame("B", 3000),
            frame("C", 3200),
            frame("C", 9000),
        ];
        let segments = build_segments(&frames);

        // Full coverage: first start, last end.
        assert_eq!(segments[0].start_time, frames[0].timestamp);
        assert_eq!(
            segments.last().unwrap().end_time,
            frames.last().unwrap().timestamp + Duration::milliseconds(SEGMENT_TAIL_MS)
        );

        // No gaps, no overlaps, no adjacent duplicates.
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end_time, pair[1].start_time);
            assert_ne!(pair[0].application_name, pair[1].application_name);
        }
    }

    #[test]
    fn colors_are_stable_per_application() {
        let frames = vec![frame("A", 0), frame("B", 1000), frame("A", 2000)];
        let segments = build_segments(&frames);
        assert_eq!(segments[0].color, segments[2].color);
    }
}
