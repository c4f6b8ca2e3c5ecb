use tokio::time::Duration;

const TRACKPAD_SENSITIVITY: f64 = 0.3;
const WHEEL_SENSITIVITY: f64 = 0.8;
const TRACKPAD_TRIGGER_THRESHOLD: f64 = 10.0;
const WHEEL_TRIGGER_THRESHOLD: f64 = 25.0;
const TRACKPAD_DELTA_DIVISOR: f64 = 100.0;
const WHEEL_DELTA_DIVISOR: f64 = 50.0;
/// Largest position change a single wheel emission may produce, in indices.
const MAX_WHEEL_STEP: f64 = 2.0;
/// Fraction of the accumulator retained after an emission (momentum feel).
const WHEEL_RETENTION: f64 = 0.4;
const TRACKPAD_SETTLE_MS: u64 = 200;
const WHEEL_SETTLE_MS: u64 = 100;
/// Drag multiplier: a full-track drag sweeps the whole sequence twice over.
const DRAG_SENSITIVITY: f64 = 2.0;

/// Input class inferred per wheel event. Trackpads deliver many small
/// deltas (and horizontal components), so they get a lower sensitivity and a
/// lower trigger threshold than a detented mouse wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelClass {
    Trackpad,
    Wheel,
}

impl WheelClass {
    pub fn classify(delta_x: f64, delta_y: f64) -> Self {
        if delta_x.abs() > 0.0 || delta_y.abs() < 40.0 {
            WheelClass::Trackpad
        } else {
            WheelClass::Wheel
        }
    }

    fn sensitivity(self) -> f64 {
        match self {
            WheelClass::Trackpad => TRACKPAD_SENSITIVITY,
            WheelClass::Wheel => WHEEL_SENSITIVITY,
        }
    }

    fn trigger_threshold(self) -> f64 {
        match self {
            WheelClass::Trackpad => TRACKPAD_TRIGGER_THRESHOLD,
            WheelClass::Wheel => WHEEL_TRIGGER_THRESHOLD,
        }
    }

    fn delta_divisor(self) -> f64 {
        match self {
            WheelClass::Trackpad => TRACKPAD_DELTA_DIVISOR,
            WheelClass::Wheel => WHEEL_DELTA_DIVISOR,
        }
    }

    pub fn settle_delay(self) -> Duration {
        match self {
            WheelClass::Trackpad => Duration::from_millis(TRACKPAD_SETTLE_MS),
            WheelClass::Wheel => Duration::from_millis(WHEEL_SETTLE_MS),
        }
    }
}

/// A wheel emission: the new continuous position plus how long to wait for
/// further events before snapping to an integer frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelMove {
    pub position: f64,
    pub settle_after: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Moved(usize),
    /// Already at the final frame; autoplay uses this to stop.
    EndReached,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvanceOutcome {
    pub position: f64,
    pub end_reached: bool,
}

/// Continuous scrub position plus the transient input-tracking state.
///
/// Pure with respect to time and IO: every mutation is a function of the
/// current state and one input event, which keeps concurrent events
/// serialized by the single lock around this struct.
#[derive(Debug, Default)]
pub struct ScrubState {
    position: f64,
    /// Index of the frame currently shown; used to detect boundary
    /// crossings that require a fresh load.
    current_index: usize,
    wheel_accumulator: f64,
    /// -1.0, 0.0 (none) or 1.0.
    last_wheel_direction: f64,
    drag_anchor: Option<f64>,
}

impl ScrubState {
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Record that the engine now displays `index`; returns true when that
    /// is a change requiring a load.
    pub fn mark_displayed(&mut self, index: usize) -> bool {
        if self.current_index == index {
            return false;
        }
        self.current_index = index;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Clamp `index` into range and land on it exactly (no fractional part).
    pub fn seek_to_index(&mut self, index: usize, frame_count: usize) -> Option<usize> {
        if frame_count == 0 {
            return None;
        }
        let clamped = index.min(frame_count - 1);
        self.position = clamped as f64;
        Some(clamped)
    }

    /// Map a track fraction to an exact continuous position, returning the
    /// nearest integer frame for display. The fractional position is kept
    /// for the indicator.
    pub fn seek_to_fraction(&mut self, fraction: f64, frame_count: usize) -> Option<(f64, usize)> {
        if frame_count == 0 {
            return None;
        }
        let span = (frame_count - 1) as f64;
        let position = (fraction.clamp(0.0, 1.0)) * span;
        self.position = position;
        let nearest = (position.round() as usize).min(frame_count - 1);
        Some((position, nearest))
    }

    /// Snapshot the position a drag will accumulate onto.
    pub fn begin_drag(&mut self) {
        self.drag_anchor = Some(self.position);
    }

    /// Apply a horizontal drag distance against the snapshot taken at
    /// drag-start, not the live position.
    pub fn drag_by(
        &mut self,
        delta_pixels: f64,
        track_width_pixels: f64,
        frame_count: usize,
    ) -> Option<f64> {
        if frame_count == 0 || track_width_pixels <= 0.0 {
            return None;
        }
        let anchor = *self.drag_anchor.get_or_insert(self.position);
        let span = (frame_count - 1) as f64;
        let delta = -(delta_pixels / track_width_pixels) * span * DRAG_SENSITIVITY;
        self.position = (anchor + delta).clamp(0.0, span);
        Some(self.position)
    }

    /// Finish a drag: snap to the nearest integer frame.
    pub fn end_drag(&mut self, frame_count: usize) -> Option<usize> {
        self.drag_anchor = None;
        self.snap_to_nearest(frame_count)
    }

    /// Accumulate one wheel event, emitting a position change once the
    /// accumulator reaches the class threshold or the direction reverses.
    pub fn wheel(&mut self, delta_x: f64, delta_y: f64, frame_count: usize) -> Option<WheelMove> {
        if frame_count == 0 {
            return None;
        }

        let class = WheelClass::classify(delta_x, delta_y);
        let primary_delta = if delta_x.abs() > delta_y.abs() {
            delta_x
        } else {
            delta_y
        };
        if primary_delta == 0.0 {
            return None;
        }

        self.wheel_accumulator += primary_delta;
        let direction = if primary_delta > 0.0 { 1.0 } else { -1.0 };
        let threshold = class.trigger_threshold();

        let reversed = direction != self.last_wheel_direction && self.last_wheel_direction != 0.0;
        if self.wheel_accumulator.abs() < threshold && !reversed {
            return None;
        }

        // A reversal answers immediately: the accumulator restarts at the
        // signed threshold rather than zero so the response stays snappy.
        if direction != self.last_wheel_direction {
            self.wheel_accumulator = direction * threshold;
        }
        self.last_wheel_direction = direction;

        let move_amount = (self.wheel_accumulator / class.delta_divisor())
            .abs()
            .min(MAX_WHEEL_STEP)
            * class.sensitivity()
            * direction;

        let span = (frame_count - 1) as f64;
        self.position = (self.position + move_amount).clamp(0.0, span);

        // Decay instead of zeroing, so a sustained gesture keeps momentum.
        self.wheel_accumulator *= WHEEL_RETENTION;

        Some(WheelMove {
            position: self.position,
            settle_after: class.settle_delay(),
        })
    }

    /// Wheel input went quiet: snap to the nearest integer frame and forget
    /// the gesture direction.
    pub fn settle(&mut self, frame_count: usize) -> Option<usize> {
        self.last_wheel_direction = 0.0;
        self.snap_to_nearest(frame_count)
    }

    /// Move exactly one integer frame. At the upper bound this reports
    /// `EndReached` instead of moving.
    pub fn step(&mut self, direction: i32, frame_count: usize) -> StepOutcome {
        if frame_count == 0 {
            return StepOutcome::Unchanged;
        }
        let last = frame_count - 1;
        let current = (self.position.round() as usize).min(last);

        if direction > 0 {
            if current >= last {
                return StepOutcome::EndReached;
            }
            self.position = (current + 1) as f64;
            StepOutcome::Moved(current + 1)
        } else {
            if current == 0 {
                return StepOutcome::Unchanged;
            }
            self.position = (current - 1) as f64;
            StepOutcome::Moved(current - 1)
        }
    }

    /// Advance the position by a playback step, clamping at the final index.
    pub fn advance(&mut self, step: f64, frame_count: usize) -> AdvanceOutcome {
        if frame_count == 0 {
            return AdvanceOutcome {
                position: 0.0,
                end_reached: true,
            };
        }
        let span = (frame_count - 1) as f64;
        let next = self.position + step;
        if next >= span {
            self.position = span;
            AdvanceOutcome {
                position: span,
                end_reached: true,
            }
        } else {
            self.position = next.max(0.0);
            AdvanceOutcome {
                position: self.position,
                end_reached: false,
            }
        }
    }

    fn snap_to_nearest(&mut self, frame_count: usize) -> Option<usize> {
        if frame_count == 0 {
            return None;
        }
        let snapped = (self.position.round() as usize).min(frame_count - 1);
        self.position = snapped as f64;
        Some(snapped)
    }

    #[cfg(test)]
    pub(crate) fn wheel_accumulator(&self) -> f64 {
        self.wheel_accumulator
    }
}
