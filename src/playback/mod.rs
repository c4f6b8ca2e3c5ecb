//! Autoplay: ticks the scrub position forward at a configurable speed and
//! stops at the end of the sequence.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use log::error;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration};

use crate::events::{EngineEvent, EventSink, LoadKind};
use crate::scrub::{ResolvedFrame, ScrubEngine};

pub const PLAYBACK_TICK: Duration = Duration::from_millis(100);
/// Position advance per tick at 1x speed.
pub const PLAYBACK_BASE_STEP: f64 = 0.1;
pub const PLAYBACK_SPEEDS: [f64; 4] = [0.25, 0.5, 1.0, 2.0];

struct SchedulerInner {
    engine: ScrubEngine,
    events: EventSink,
    playing: AtomicBool,
    speed_index: AtomicUsize,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

/// `Stopped`/`Playing` scheduler over a [`ScrubEngine`].
#[derive(Clone)]
pub struct PlaybackScheduler {
    inner: Arc<SchedulerInner>,
}

impl PlaybackScheduler {
    pub fn new(engine: ScrubEngine, events: EventSink) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                engine,
                events,
                playing: AtomicBool::new(false),
                // Index of 1.0 in PLAYBACK_SPEEDS.
                speed_index: AtomicUsize::new(2),
                ticker: Mutex::new(None),
            }),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.inner.playing.load(Ordering::SeqCst)
    }

    pub fn speed(&self) -> f64 {
        PLAYBACK_SPEEDS[self.inner.speed_index.load(Ordering::SeqCst) % PLAYBACK_SPEEDS.len()]
    }

    /// Start playing. At the last frame the position rewinds to the start
    /// first; on an empty sequence this is a no-op.
    pub async fn play(&self) -> Result<()> {
        if self.is_playing() {
            return Ok(());
        }
        let count = self.inner.engine.frame_count();
        if count == 0 {
            return Ok(());
        }

        if self.inner.engine.position() >= (count - 1) as f64 {
            self.inner
                .engine
                .seek_to_index(0, LoadKind::ProgrammaticAdvance)
                .await?;
        }

        self.inner.playing.store(true, Ordering::SeqCst);
        self.emit_state();
        self.spawn_ticker();
        Ok(())
    }

    /// Stop playing and cancel the pending tick. Idempotent.
    pub async fn pause(&self) {
        self.inner.playing.store(false, Ordering::SeqCst);
        self.cancel_ticker();
        self.emit_state();
    }

    pub async fn toggle(&self) -> Result<()> {
        if self.is_playing() {
            self.pause().await;
            Ok(())
        } else {
            self.play().await
        }
    }

    /// Cycle to the next playback speed; a running ticker restarts at the
    /// new cadence.
    pub async fn cycle_speed(&self) -> f64 {
        let next =
            (self.inner.speed_index.load(Ordering::SeqCst) + 1) % PLAYBACK_SPEEDS.len();
        self.inner.speed_index.store(next, Ordering::SeqCst);
        if self.is_playing() {
            self.spawn_ticker();
        }
        self.emit_state();
        self.speed()
    }

    /// Prev/next frame. At the upper bound the engine reports end-reached,
    /// which stops a running autoplay instead of moving.
    pub async fn step_frame(&self, direction: i32) -> Result<Option<ResolvedFrame>> {
        let result = self.inner.engine.step_frame(direction).await?;
        if result.end_reached && self.is_playing() {
            self.pause().await;
        }
        Ok(result.frame)
    }

    fn spawn_ticker(&self) {
        let scheduler = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(PLAYBACK_TICK);
            // Swallow the immediate first tick so the first advance lands a
            // full interval after play().
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !scheduler.is_playing() {
                    break;
                }
                let step = PLAYBACK_BASE_STEP * scheduler.speed();
                match scheduler.inner.engine.advance(step).await {
                    Ok(outcome) if outcome.end_reached => {
                        scheduler.inner.playing.store(false, Ordering::SeqCst);
                        scheduler.emit_state();
                        break;
                    }
                    Ok(_) => {}
                    Err(err) => {
                        error!("playback tick failed: {err:#}");
                        scheduler.inner.playing.store(false, Ordering::SeqCst);
                        scheduler.emit_state();
                        break;
                    }
                }
            }
        });

        let mut guard = self
            .inner
            .ticker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = guard.replace(handle) {
            previous.abort();
        }
    }

    fn cancel_ticker(&self) {
        let mut guard = self
            .inner
            .ticker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = guard.take() {
            handle.abort();
        }
    }

    fn emit_state(&self) {
        self.inner.events.emit(EngineEvent::PlaybackChanged {
            playing: self.is_playing(),
            speed: self.speed(),
        });
    }
}
