use std::sync::Arc;

use anyhow::Context;
use log::{error, info};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::providers::{FrameSource, IdentityResolver};
use crate::store::FrameStore;

use super::config::CaptureConfig;
use super::sampler::capture_loop;

struct ControllerInner {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

/// Drives capture sessions: `Idle -> Sampling -> Idle`, with an automatic
/// return to idle once the sample allowance is spent.
#[derive(Clone)]
pub struct CaptureController {
    store: FrameStore,
    source: Arc<dyn FrameSource>,
    resolver: Arc<dyn IdentityResolver>,
    config: CaptureConfig,
    inner: Arc<Mutex<ControllerInner>>,
}

impl CaptureController {
    pub fn new(
        store: FrameStore,
        source: Arc<dyn FrameSource>,
        resolver: Arc<dyn IdentityResolver>,
        config: CaptureConfig,
    ) -> Self {
        Self {
            store,
            source,
            resolver,
            config,
            inner: Arc::new(Mutex::new(ControllerInner {
                handle: None,
                cancel_token: None,
            })),
        }
    }

    /// Start a new capture session. Returns `false` when the frame source
    /// cannot be opened; any session already running is torn down first so
    /// its tick timer is never left to fire stale.
    pub async fn start(&self) -> bool {
        self.shutdown_existing().await;

        if let Err(err) = self.source.open() {
            error!("frame source could not be opened: {err:#}");
            return false;
        }

        let session_id = Uuid::new_v4().to_string();
        info!("starting capture session {session_id}");

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(capture_loop(
            session_id,
            self.store.clone(),
            Arc::clone(&self.source),
            Arc::clone(&self.resolver),
            self.config.clone(),
            cancel_token.clone(),
        ));

        let mut inner = self.inner.lock().await;
        inner.handle = Some(handle);
        inner.cancel_token = Some(cancel_token);
        true
    }

    /// Stop the current session if any. Always succeeds; idempotent.
    pub async fn stop(&self) -> bool {
        self.shutdown_existing().await;
        true
    }

    /// Whether a session is currently sampling. A loop that exhausted its
    /// sample allowance counts as idle even before `stop` is called.
    pub async fn is_sampling(&self) -> bool {
        let inner = self.inner.lock().await;
        inner
            .handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    async fn shutdown_existing(&self) {
        let (token, handle) = {
            let mut inner = self.inner.lock().await;
            (inner.cancel_token.take(), inner.handle.take())
        };

        if let Some(token) = token {
            token.cancel();
        }
        if let Some(handle) = handle {
            if let Err(err) = handle.await.context("capture loop task failed to join") {
                error!("{err:#}");
            }
        }
    }
}
