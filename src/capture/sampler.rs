use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::providers::{ActiveApplication, FrameSource, IdentityResolver};
use crate::store::{FrameMetadata, FrameStore};

use super::config::CaptureConfig;
use super::similarity::{self, FrameVerdict};

/// Mutable state of one start-to-stop capture run. Owned by the loop task;
/// no module-level globals.
struct CaptureSession {
    id: String,
    samples_taken: u32,
    last_retained: Option<Arc<Vec<u8>>>,
}

impl CaptureSession {
    fn new(id: String) -> Self {
        Self {
            id,
            samples_taken: 0,
            last_retained: None,
        }
    }
}

/// Periodic sampling loop for one session. Runs until the sample allowance is
/// exhausted or the token is cancelled; per-tick failures are logged and
/// skipped, never fatal.
pub async fn capture_loop(
    session_id: String,
    store: FrameStore,
    source: Arc<dyn FrameSource>,
    resolver: Arc<dyn IdentityResolver>,
    config: CaptureConfig,
    cancel_token: CancellationToken,
) {
    let mut ticker = interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut session = CaptureSession::new(session_id);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let timestamp = Utc::now();
                let fut = perform_sample(
                    timestamp,
                    &store,
                    &source,
                    &resolver,
                    &config,
                    &mut session,
                );

                match timeout(config.capture_timeout, fut).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        error!("capture tick failed for session {}: {err:?}", session.id)
                    }
                    Err(_) => warn!(
                        "capture tick timeout (> {:?}) for session {}",
                        config.capture_timeout, session.id
                    ),
                }

                if session.samples_taken >= config.max_samples {
                    info!(
                        "session {} reached {} samples, stopping",
                        session.id, config.max_samples
                    );
                    break;
                }
            }
            _ = cancel_token.cancelled() => {
                info!("capture loop for session {} shutting down", session.id);
                break;
            }
        }
    }
}

async fn perform_sample(
    timestamp: DateTime<Utc>,
    store: &FrameStore,
    source: &Arc<dyn FrameSource>,
    resolver: &Arc<dyn IdentityResolver>,
    config: &CaptureConfig,
    session: &mut CaptureSession,
) -> Result<()> {
    // Identity resolution is best effort; errors map to the sentinel.
    let identity = {
        let resolver = Arc::clone(resolver);
        tokio::task::spawn_blocking(move || resolver.resolve_active_application())
            .await
            .context("identity resolver worker join failed")?
            .unwrap_or_else(|err| {
                warn!("active application resolution failed: {err:#}");
                ActiveApplication::unknown()
            })
    };

    // No frame means this tick never happened: the sample counter does not
    // advance.
    let bytes = {
        let source = Arc::clone(source);
        match tokio::task::spawn_blocking(move || source.acquire())
            .await
            .context("frame source worker join failed")?
        {
            Ok(Some(bytes)) => Arc::new(bytes),
            Ok(None) => {
                debug!("no frame available, skipping tick");
                return Ok(());
            }
            Err(err) => {
                warn!("frame acquisition failed: {err:#}");
                return Ok(());
            }
        }
    };

    let is_first = session.samples_taken == 0;
    let is_last = session.samples_taken + 1 >= config.max_samples;

    // Compare against the last *retained* frame, not the last sampled one.
    let verdict = {
        let previous = session.last_retained.clone();
        let current = Arc::clone(&bytes);
        tokio::task::spawn_blocking(move || {
            similarity::decide(previous.as_deref().map(Vec::as_slice), &current, is_first, is_last)
        })
        .await
        .context("similarity worker join failed")?
    };

    match verdict {
        FrameVerdict::Keep => {
            let meta = FrameMetadata {
                timestamp,
                application_name: identity.application_name,
                window_title: Some(identity.window_title),
                background_applications: identity.open_applications,
                is_first_of_session: is_first,
            };
            let frame = {
                let store = store.clone();
                let bytes = Arc::clone(&bytes);
                tokio::task::spawn_blocking(move || store.append(&meta, &bytes))
                    .await
                    .context("store append worker join failed")?
                    .context("failed to persist frame")?
            };
            session.last_retained = Some(bytes);
            info!(
                "retained frame {} ({}) for session {}",
                frame.filename, frame.application_name, session.id
            );
        }
        FrameVerdict::Drop => {
            debug!("dropping near-identical sample for session {}", session.id);
        }
    }

    // Elapsed samples advance regardless of keep/drop so the session stays
    // wall-clock bounded.
    session.samples_taken += 1;
    Ok(())
}
