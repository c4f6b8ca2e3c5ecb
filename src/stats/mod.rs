//! Usage statistics: idle detection and per-application time bucketing over
//! the retained frame sequence.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::store::Frame;

/// A gap between consecutive frames longer than this is idle time, excluded
/// from every application bucket.
pub const IDLE_THRESHOLD_MS: i64 = 5000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUsageStats {
    pub application_name: String,
    pub total_time_ms: i64,
    /// Share of *active* (non-idle) time, not of total time.
    pub percentage: f64,
    pub screenshot_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub app_stats: Vec<AppUsageStats>,
    pub total_time_ms: i64,
    pub idle_time_ms: i64,
}

/// Aggregate an ordered frame list into usage totals.
///
/// Each consecutive pair contributes its time difference either to idle time
/// (gap above the threshold) or to the earlier frame's application. The last
/// frame closes no interval but still counts as seen. Always holds:
/// `total_time_ms == idle_time_ms + Σ app_stats[].total_time_ms`.
pub fn compute_usage(frames: &[Frame]) -> UsageStats {
    if frames.is_empty() {
        return UsageStats::default();
    }

    // Every observed application gets a bucket, even one whose only interval
    // was swallowed by an idle gap.
    let mut buckets: HashMap<&str, (i64, u64)> = HashMap::new();
    for frame in frames {
        buckets.entry(frame.application_name.as_str()).or_default();
    }

    let mut total_time_ms: i64 = 0;
    let mut idle_time_ms: i64 = 0;

    for pair in frames.windows(2) {
        let diff = (pair[1].timestamp - pair[0].timestamp).num_milliseconds();
        if diff > IDLE_THRESHOLD_MS {
            idle_time_ms += diff;
        } else if let Some(bucket) = buckets.get_mut(pair[0].application_name.as_str()) {
            bucket.0 += diff;
            bucket.1 += 1;
        }
        total_time_ms += diff;
    }

    if let Some(last) = frames.last() {
        if let Some(bucket) = buckets.get_mut(last.application_name.as_str()) {
            bucket.1 += 1;
        }
    }

    let active_time_ms = total_time_ms - idle_time_ms;
    let mut app_stats: Vec<AppUsageStats> = buckets
        .into_iter()
        .map(|(name, (time_ms, count))| AppUsageStats {
            application_name: name.to_string(),
            total_time_ms: time_ms,
            percentage: if active_time_ms > 0 {
                time_ms as f64 / active_time_ms as f64 * 100.0
            } else {
                0.0
            },
            screenshot_count: count,
        })
        .collect();

    app_stats.sort_by(|a, b| {
        b.total_time_ms
            .cmp(&a.total_time_ms)
            .then_with(|| a.application_name.cmp(&b.application_name))
    });

    UsageStats {
        app_stats,
        total_time_ms,
        idle_time_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn frame(app: &str, offset_ms: i64) -> Frame {
        let base = Utc.with_ymd_and_hms(2026, 8, 7, 9, 0, 0).unwrap();
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
    fn empty_input_yields_zeroed_stats() {
        let stats = compute_usage(&[]);
        assert!(stats.app_stats.is_empty());
        assert_eq!(stats.total_time_ms, 0);
        assert_eq!(stats.idle_time_ms, 0);
    }

    #[test]
    fn idle_gap_is_excluded_from_application_time() {
        // Frames at t=0 (AppA), t=1000 (AppA), t=7000 (AppB): the 6000 ms
        // jump is idle, leaving AppA with the full active second.
        let frames = vec![frame("AppA", 0), frame("AppA", 1000), frame("AppB", 7000)];
        let stats = compute_usage(&frames);

        assert_eq!(stats.total_time_ms, 7000);
        assert_eq!(stats.idle_time_ms, 6000);

        let app_a = stats
            .app_stats
            .iter()
            .find(|s| s.application_name == "AppA")
            .unwrap();
        assert_eq!(app_a.total_time_ms, 1000);
        assert!((app_a.percentage - 100.0).abs() < 1e-6);
        assert_eq!(app_a.screenshot_count, 1);

        // AppB closed no interval but was still seen once.
        let app_b = stats
            .app_stats
            .iter()
            .find(|s| s.application_name == "AppB")
            .unwrap();
        assert_eq!(app_b.total_time_ms, 0);
        assert_eq!(app_b.screenshot_count, 1);
    }

    #[test]
    fn totals_balance_across_idle_and_buckets() {
        let frames = vec![
            frame("A", 0),
            frame("B", 2000),
            frame("B", 10_000),
            frame("C", 11_000),
            frame("A", 30_000),
        ];
        let stats = compute_usage(&frames);
        let bucket_sum: i64 = stats.app_stats.iter().map(|s| s.total_time_ms).sum();
        assert_eq!(stats.total_time_ms, stats.idle_time_ms + bucket_sum);
    }

    #[test]
    fn all_idle_input_has_zero_percentages() {
        let frames = vec![frame("A", 0), frame("B", 10_000)];
        let stats = compute_usage(&frames);
        assert_eq!(stats.idle_time_ms, 10_000);
        for bucket in &stats.app_stats {
            assert_eq!(bucket.percentage, 0.0);
        }
    }

    #[test]
    fn app_stats_sorted_by_time_descending() {
        let frames = vec![
            frame("Short", 0),
            frame("Long", 1000),
            frame("Long", 3000),
            frame("Long", 5000),
        ];
        let stats = compute_usage(&frames);
        assert_eq!(stats.app_stats[0].application_name, "Long");
        assert!(stats.app_stats[0].total_time_ms >= stats.app_stats[1].total_time_ms);
    }
}
