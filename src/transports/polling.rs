use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{EventTransport, TransportState};
use crate::api::GetUpdatesParams;
use crate::client::{ClientInner, Evogram};
use crate::error::{Error, Result};
use crate::update::Update;

/// Long-poll settings.
#[derive(Debug, Clone)]
pub struct PollingOptions {
    /// Seconds the Bot API may hold a `getUpdates` call open.
    pub timeout: u32,
    /// Maximum updates per batch, 1-100.
    pub limit: Option<u32>,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            timeout: 30,
            limit: None,
        }
    }
}

#[derive(Default)]
struct PollingState {
    enabled: AtomicBool,
    generation: AtomicU64,
    /// Next update id to request; 0 until the first update is confirmed.
    offset: AtomicI64,
    workers: AtomicUsize,
}

impl PollingState {
    fn is_current(&self, generation: u64) -> bool {
        self.enabled.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }
}

/// Pull transport: a `getUpdates` loop on a background task.
pub struct Polling {
    client: Weak<ClientInner>,
    error_backoff: Duration,
    state: Arc<PollingState>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Polling {
    pub(crate) fn new(client: Weak<ClientInner>, error_backoff: Duration) -> Self {
        Self {
            client,
            error_backoff,
            state: Arc::new(PollingState::default()),
            worker: Mutex::new(None),
        }
    }

    /// Id of the next update that will be requested.
    pub fn offset(&self) -> i64 {
        self.state.offset.load(Ordering::SeqCst)
    }

    /// Number of polling loops currently alive. At most one once a stopped
    /// loop has finished its in-flight request.
    pub fn active_workers(&self) -> usize {
        self.state.workers.load(Ordering::SeqCst)
    }

    /// Waits for the most recently started loop to exit. Returns immediately
    /// when it was never started.
    pub async fn join(&self) {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Polling worker panicked: {}", e);
            }
        }
    }
}

#[async_trait]
impl EventTransport for Polling {
    type Params = PollingOptions;

    async fn start(&self, options: PollingOptions) -> Result<()> {
        if self.state.enabled.swap(true, Ordering::SeqCst) {
            debug!("Polling already running");
            return Ok(());
        }
        if self.client.strong_count() == 0 {
            self.state.enabled.store(false, Ordering::SeqCst);
            return Err(Error::ClientDropped);
        }

        let generation = self.state.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let worker = tokio::spawn(run(
            self.client.clone(),
            self.state.clone(),
            generation,
            options,
            self.error_backoff,
        ));
        *self.worker.lock().unwrap_or_else(PoisonError::into_inner) = Some(worker);

        info!("Polling started");
        Ok(())
    }

    fn stop(&self) {
        if self.state.enabled.swap(false, Ordering::SeqCst) {
            self.state.generation.fetch_add(1, Ordering::SeqCst);
            info!("Polling stopped");
        }
    }

    fn state(&self) -> TransportState {
        if self.state.enabled.load(Ordering::SeqCst) {
            TransportState::Enabled
        } else {
            TransportState::Disabled
        }
    }
}

impl std::fmt::Debug for Polling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Polling")
            .field("state", &self.state())
            .field("offset", &self.offset())
            .field("error_backoff", &self.error_backoff)
            .finish()
    }
}

async fn run(
    client: Weak<ClientInner>,
    state: Arc<PollingState>,
    generation: u64,
    options: PollingOptions,
    error_backoff: Duration,
) {
    state.workers.fetch_add(1, Ordering::SeqCst);

    while state.is_current(generation) {
        let Some(client) = client.upgrade().map(Evogram::from_inner) else {
            debug!("Client dropped, polling loop exiting");
            break;
        };

        if let Err(e) = poll_once(&client, &state, generation, &options).await {
            error!("Polling failed: {}", e.report());
            drop(client);
            if !error_backoff.is_zero() {
                tokio::time::sleep(error_backoff).await;
            }
        }
    }

    state.workers.fetch_sub(1, Ordering::SeqCst);
    debug!("Polling loop {} exited", generation);
}

/// Fetches one batch and dispatches it in order. The offset moves past an
/// update only once its handlers succeeded, so a failing update is fetched
/// again on the next round.
async fn poll_once(
    client: &Evogram,
    state: &PollingState,
    generation: u64,
    options: &PollingOptions,
) -> Result<()> {
    let offset = state.offset.load(Ordering::SeqCst);
    let params = GetUpdatesParams {
        offset: (offset != 0).then_some(offset),
        limit: options.limit,
        timeout: Some(options.timeout),
        allowed_updates: Some(client.updates().allowed_updates()),
    };

    // Decoded one by one so that a payload this crate cannot model is
    // skipped instead of failing the whole batch forever.
    let batch: Vec<Value> = client.api().call("getUpdates", Some(&params)).await?;
    for raw in batch {
        if !state.is_current(generation) {
            break;
        }

        let id = raw.get("update_id").and_then(Value::as_i64);
        match serde_json::from_value::<Update>(raw) {
            Ok(update) => client.updates().dispatch(&update).await?,
            Err(e) => warn!("Skipping undecodable update {:?}: {}", id, e),
        }
        if let Some(id) = id {
            state.offset.store(id + 1, Ordering::SeqCst);
        }
    }
    Ok(())
}
