use std::sync::{Arc, Mutex, RwLock};

use anyhow::{Context, Result};
use log::{debug, error};
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::events::{EngineEvent, EventSink, LoadKind};
use crate::store::{Frame, FrameStore};

use super::cache::{FrameCache, DEFAULT_CACHE_CAPACITY};
use super::state::{ScrubState, StepOutcome};

/// Lower interpolation bucket boundary: below this fraction the earlier
/// frame is shown as-is.
const BLEND_LOWER_BOUND: f64 = 0.33;
/// Upper bucket boundary: at or above this fraction the later frame wins.
const BLEND_UPPER_BOUND: f64 = 0.67;

/// A frame resolved for display, possibly a cached mid-blend between two
/// neighbors.
#[derive(Debug, Clone)]
pub struct ResolvedFrame {
    pub index: usize,
    pub filename: String,
    pub data: Arc<Vec<u8>>,
    pub blended: bool,
}

/// Result of one integer step.
#[derive(Debug)]
pub struct StepResult {
    pub frame: Option<ResolvedFrame>,
    pub end_reached: bool,
}

/// Result of one playback advance.
#[derive(Debug)]
pub struct AdvanceResult {
    pub position: f64,
    pub frame: Option<ResolvedFrame>,
    pub end_reached: bool,
}

struct EngineInner {
    store: FrameStore,
    frames: RwLock<Vec<Frame>>,
    state: Mutex<ScrubState>,
    cache: FrameCache,
    settle_timer: Mutex<Option<JoinHandle<()>>>,
    events: EventSink,
}

/// Continuous-position scrubbing over the frame index space.
///
/// Input handlers serialize on the single state lock, so concurrent events
/// apply in arrival order; byte loads happen off the lock and catch up with
/// the position afterwards.
#[derive(Clone)]
pub struct ScrubEngine {
    inner: Arc<EngineInner>,
}

impl ScrubEngine {
    pub fn new(store: FrameStore, events: EventSink) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                frames: RwLock::new(Vec::new()),
                state: Mutex::new(ScrubState::default()),
                cache: FrameCache::new(DEFAULT_CACHE_CAPACITY),
                settle_timer: Mutex::new(None),
                events,
            }),
        }
    }

    /// Re-read the frame list from the store, reset the position to the
    /// start, and warm the first frame. Returns the frame count.
    pub async fn reload(&self) -> Result<usize> {
        let frames = {
            let store = self.inner.store.clone();
            tokio::task::spawn_blocking(move || store.list())
                .await
                .context("frame list worker join failed")??
        };
        let count = frames.len();
        *self.write_frames() = frames;
        self.lock_state().reset();
        self.emit(EngineEvent::PositionChanged { position: 0.0 });
        if count > 0 {
            self.load_frame(0, LoadKind::ProgrammaticAdvance).await?;
        }
        Ok(count)
    }

    pub fn frame_count(&self) -> usize {
        self.read_frames().len()
    }

    pub fn position(&self) -> f64 {
        self.lock_state().position()
    }

    pub fn frames(&self) -> Vec<Frame> {
        self.read_frames().clone()
    }

    /// Land exactly on an integer frame (clamped into range).
    pub async fn seek_to_index(
        &self,
        index: usize,
        kind: LoadKind,
    ) -> Result<Option<ResolvedFrame>> {
        let count = self.frame_count();
        let Some(target) = self.lock_state().seek_to_index(index, count) else {
            return Ok(None);
        };
        self.emit(EngineEvent::PositionChanged {
            position: target as f64,
        });
        self.lock_state().mark_displayed(target);
        self.load_frame(target, kind).await
    }

    /// Click-to-seek: store the exact fractional position, display the
    /// nearest integer frame.
    pub async fn seek_to_fraction(&self, fraction: f64) -> Result<Option<ResolvedFrame>> {
        let count = self.frame_count();
        let Some((position, nearest)) = self.lock_state().seek_to_fraction(fraction, count) else {
            return Ok(None);
        };
        self.emit(EngineEvent::PositionChanged { position });
        self.lock_state().mark_displayed(nearest);
        self.load_frame(nearest, LoadKind::UserSeek).await
    }

    pub fn begin_drag(&self) {
        self.lock_state().begin_drag();
    }

    pub async fn drag_by(
        &self,
        delta_pixels: f64,
        track_width_pixels: f64,
    ) -> Result<Option<ResolvedFrame>> {
        let count = self.frame_count();
        let Some(position) =
            self.lock_state()
                .drag_by(delta_pixels, track_width_pixels, count)
        else {
            return Ok(None);
        };
        self.emit(EngineEvent::PositionChanged { position });
        self.display_at(position, LoadKind::ProgrammaticAdvance).await
    }

    pub async fn end_drag(&self) -> Result<Option<ResolvedFrame>> {
        let count = self.frame_count();
        let Some(snapped) = self.lock_state().end_drag(count) else {
            return Ok(None);
        };
        self.emit(EngineEvent::PositionChanged {
            position: snapped as f64,
        });
        self.display_at(snapped as f64, LoadKind::ProgrammaticAdvance)
            .await
    }

    /// Accumulate one wheel event. Emissions update the position right away
    /// and (re)arm the settle timer that snaps to an integer frame once the
    /// gesture goes quiet.
    pub async fn wheel(&self, delta_x: f64, delta_y: f64) -> Result<Option<ResolvedFrame>> {
        let count = self.frame_count();
        let Some(emission) = self.lock_state().wheel(delta_x, delta_y, count) else {
            return Ok(None);
        };
        self.emit(EngineEvent::PositionChanged {
            position: emission.position,
        });
        self.arm_settle_timer(emission.settle_after);
        self.display_at(emission.position, LoadKind::ProgrammaticAdvance)
            .await
    }

    /// Keyboard/button prev-next: exactly one integer frame, or an
    /// end-reached signal at the upper bound.
    pub async fn step_frame(&self, direction: i32) -> Result<StepResult> {
        let count = self.frame_count();
        let outcome = self.lock_state().step(direction, count);
        match outcome {
            StepOutcome::Moved(index) => {
                self.emit(EngineEvent::PositionChanged {
                    position: index as f64,
                });
                self.lock_state().mark_displayed(index);
                let frame = self.load_frame(index, LoadKind::UserSeek).await?;
                Ok(StepResult {
                    frame,
                    end_reached: false,
                })
            }
            StepOutcome::EndReached => Ok(StepResult {
                frame: None,
                end_reached: true,
            }),
            StepOutcome::Unchanged => Ok(StepResult {
                frame: None,
                end_reached: false,
            }),
        }
    }

    /// Advance the position by a playback step. Boundary crossings surface
    /// the new integer frame as a programmatic load; the fractional
    /// remainder resolves through the blend policy.
    pub async fn advance(&self, step: f64) -> Result<AdvanceResult> {
        let count = self.frame_count();
        let outcome = self.lock_state().advance(step, count);
        if count == 0 {
            return Ok(AdvanceResult {
                position: 0.0,
                frame: None,
                end_reached: true,
            });
        }
        self.emit(EngineEvent::PositionChanged {
            position: outcome.position,
        });
        let frame = self
            .display_at(outcome.position, LoadKind::ProgrammaticAdvance)
            .await?;
        Ok(AdvanceResult {
            position: outcome.position,
            frame,
            end_reached: outcome.end_reached,
        })
    }

    /// Resolve a continuous position to a display frame using the
    /// tri-bucket policy: below 0.33 the earlier frame, above 0.67 the later
    /// frame, and in between a per-pair cached blend. The blend is a
    /// deterministic endpoint selection, computed once per pair and reused
    /// verbatim thereafter.
    pub async fn resolve_interpolated(&self, position: f64) -> Result<Option<ResolvedFrame>> {
        let count = self.frame_count();
        if count == 0 {
            return Ok(None);
        }
        let last = count - 1;
        let index = (position.floor().max(0.0) as usize).min(last);
        let fraction = (position - index as f64).max(0.0);

        if fraction <= 0.0 || index >= last {
            return self.frame_at(index).await;
        }

        if fraction < BLEND_LOWER_BOUND {
            return self.frame_at(index).await;
        }
        if fraction >= BLEND_UPPER_BOUND {
            return self.frame_at(index + 1).await;
        }

        let blend_key = format!("interp-{}-{}-mid", index, index + 1);
        if let Some(data) = self.inner.cache.get(&blend_key) {
            return Ok(Some(ResolvedFrame {
                index,
                filename: blend_key,
                data,
                blended: true,
            }));
        }

        // Not a pixel blend: a biased endpoint selection, kept deliberately
        // naive for output compatibility.
        let source = if fraction <= 0.5 { index } else { index + 1 };
        let Some(chosen) = self.frame_bytes(source).await? else {
            return Ok(None);
        };
        self.inner.cache.insert(blend_key.clone(), Arc::clone(&chosen));
        Ok(Some(ResolvedFrame {
            index,
            filename: blend_key,
            data: chosen,
            blended: true,
        }))
    }

    /// Load and surface the frame for `position`: the integer part when it
    /// crossed a boundary since the last load, plus the blended result for
    /// any fractional remainder.
    async fn display_at(&self, position: f64, kind: LoadKind) -> Result<Option<ResolvedFrame>> {
        let count = self.frame_count();
        if count == 0 {
            return Ok(None);
        }
        let last = count - 1;
        let index = (position.floor().max(0.0) as usize).min(last);

        let mut shown = None;
        if self.lock_state().mark_displayed(index) {
            shown = self.load_frame(index, kind).await?;
        }

        let fraction = position - index as f64;
        if fraction > 0.0 && index < last {
            if let Some(resolved) = self.resolve_interpolated(position).await? {
                self.emit(EngineEvent::FrameResolved {
                    filename: resolved.filename.clone(),
                    index: resolved.index,
                    kind,
                    blended: resolved.blended,
                });
                shown = Some(resolved);
            }
        }
        Ok(shown)
    }

    /// Fetch one integer frame (cache first), emit its resolution event, and
    /// warm its neighbors in the background.
    async fn load_frame(&self, index: usize, kind: LoadKind) -> Result<Option<ResolvedFrame>> {
        let Some(filename) = self.filename_at(index) else {
            return Ok(None);
        };
        let Some(data) = self.frame_bytes(index).await? else {
            debug!("frame bytes missing for {filename}");
            return Ok(None);
        };

        self.emit(EngineEvent::FrameResolved {
            filename: filename.clone(),
            index,
            kind,
            blended: false,
        });
        self.preload_adjacent(index);

        Ok(Some(ResolvedFrame {
            index,
            filename,
            data,
            blended: false,
        }))
    }

    async fn frame_at(&self, index: usize) -> Result<Option<ResolvedFrame>> {
        let Some(filename) = self.filename_at(index) else {
            return Ok(None);
        };
        let Some(data) = self.frame_bytes(index).await? else {
            return Ok(None);
        };
        Ok(Some(ResolvedFrame {
            index,
            filename,
            data,
            blended: false,
        }))
    }

    async fn frame_bytes(&self, index: usize) -> Result<Option<Arc<Vec<u8>>>> {
        let Some(filename) = self.filename_at(index) else {
            return Ok(None);
        };
        if let Some(cached) = self.inner.cache.get(&filename) {
            return Ok(Some(cached));
        }
        let bytes = {
            let store = self.inner.store.clone();
            let name = filename.clone();
            tokio::task::spawn_blocking(move || store.read_bytes(&name))
                .await
                .context("frame read worker join failed")??
        };
        let Some(bytes) = bytes else {
            return Ok(None);
        };
        let data = Arc::new(bytes);
        self.inner.cache.insert(filename, Arc::clone(&data));
        Ok(Some(data))
    }

    /// Keep the previous and next frame warm for smoother scrubbing.
    fn preload_adjacent(&self, index: usize) {
        let engine = self.clone();
        tokio::spawn(async move {
            let count = engine.frame_count();
            if count <= 1 {
                return;
            }
            let neighbors = [index.saturating_sub(1), (index + 1).min(count - 1)];
            for neighbor in neighbors {
                if neighbor == index {
                    continue;
                }
                if let Some(filename) = engine.filename_at(neighbor) {
                    if engine.inner.cache.contains(&filename) {
                        continue;
                    }
                    if let Err(err) = engine.frame_bytes(neighbor).await {
                        debug!("preload of frame {neighbor} failed: {err:#}");
                    }
                }
            }
        });
    }

    /// Replace any pending settle timer; when it fires, the position snaps
    /// to the nearest integer frame and direction tracking resets.
    fn arm_settle_timer(&self, delay: Duration) {
        let engine = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let count = engine.frame_count();
            let Some(snapped) = engine.lock_state().settle(count) else {
                return;
            };
            engine.emit(EngineEvent::PositionChanged {
                position: snapped as f64,
            });
            if let Err(err) = engine
                .display_at(snapped as f64, LoadKind::ProgrammaticAdvance)
                .await
            {
                error!("settle load failed: {err:#}");
            }
        });

        let mut guard = self
            .inner
            .settle_timer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = guard.replace(handle) {
            previous.abort();
        }
    }

    fn filename_at(&self, index: usize) -> Option<String> {
        self.read_frames().get(index).map(|f| f.filename.clone())
    }

    fn emit(&self, event: EngineEvent) {
        self.inner.events.emit(event);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ScrubState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_frames(&self) -> std::sync::RwLockReadGuard<'_, Vec<Frame>> {
        self.inner
            .frames
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_frames(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Frame>> {
        self.inner
            .frames
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
