use image::GenericImageView;
use log::{debug, warn};

/// Per-channel distance above this fraction of full scale marks a pixel as
/// changed.
const PIXEL_TOLERANCE: f32 = 0.3;

/// Frames at or below this similarity are kept; anything more similar is a
/// duplicate. Tunable constant, not derived.
const SIMILARITY_KEEP_MAX: f64 = 0.98;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameVerdict {
    Keep,
    Drop,
}

/// Decide whether `current` is different enough from the last retained frame
/// to be worth keeping. Pure; the caller persists the outcome.
///
/// Boundary frames are never dropped: the first and last sample of a session
/// always survive so the session has a visible start and end.
pub fn decide(
    previous: Option<&[u8]>,
    current: &[u8],
    is_first: bool,
    is_last: bool,
) -> FrameVerdict {
    let Some(previous) = previous else {
        return FrameVerdict::Keep;
    };
    if is_first || is_last {
        return FrameVerdict::Keep;
    }

    let (prev_img, curr_img) = match (
        image::load_from_memory(previous),
        image::load_from_memory(current),
    ) {
        (Ok(prev), Ok(curr)) => (prev, curr),
        _ => {
            warn!("frame decode failed during comparison, keeping sample");
            return FrameVerdict::Keep;
        }
    };

    if prev_img.dimensions() != curr_img.dimensions() {
        warn!(
            "frame dimensions changed ({:?} -> {:?}), keeping sample",
            prev_img.dimensions(),
            curr_img.dimensions()
        );
        return FrameVerdict::Keep;
    }

    let (width, height) = curr_img.dimensions();
    let prev_rgba = prev_img.to_rgba8();
    let curr_rgba = curr_img.to_rgba8();
    let tolerance = (PIXEL_TOLERANCE * 255.0) as i16;

    let mut changed: u64 = 0;
    for (prev_px, curr_px) in prev_rgba.pixels().zip(curr_rgba.pixels()) {
        let mismatch = prev_px
            .0
            .iter()
            .zip(curr_px.0.iter())
            .take(3)
            .any(|(a, b)| (*a as i16 - *b as i16).abs() > tolerance);
        if mismatch {
            changed += 1;
        }
    }

    let total = width as f64 * height as f64;
    let similarity = 1.0 - changed as f64 / total;
    debug!("frame similarity: {similarity:.4}");

    if similarity <= SIMILARITY_KEEP_MAX {
        FrameVerdict::Keep
    } else {
        FrameVerdict::Drop
    }
}
