use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock, Weak};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use super::{EventTransport, TransportState};
use crate::api::SetWebhookParams;
use crate::client::{ClientInner, Evogram};
use crate::error::{Error, Result};
use crate::update::Update;

/// Header the Bot API uses to echo `secret_token` back on every push.
pub const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Default)]
pub struct WebhookOptions {
    /// Passed to `setWebhook` as is.
    pub params: SetWebhookParams,
    /// Local port to listen on; 8080 when unset, an ephemeral one when 0.
    pub port: Option<u16>,
}

impl WebhookOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            params: SetWebhookParams::new(url),
            port: None,
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn secret_token(mut self, secret_token: impl Into<String>) -> Self {
        self.params.secret_token = Some(secret_token.into());
        self
    }
}

/// Path and secret the listener accepts. Shared with the router so that a
/// restart with a different URL reuses it.
#[derive(Default)]
struct Route {
    path: RwLock<String>,
    secret_token: RwLock<Option<String>>,
}

#[derive(Clone)]
struct ReceiverState {
    client: Weak<ClientInner>,
    route: Arc<Route>,
}

struct Running {
    shutdown: oneshot::Sender<()>,
    addr: SocketAddr,
    // Detached on stop; the server drains in-flight requests on its own.
    _server: JoinHandle<()>,
}

/// Push transport: registers the webhook with the Bot API and serves it.
pub struct Webhook {
    client: Weak<ClientInner>,
    enabled: AtomicBool,
    route: Arc<Route>,
    router: OnceLock<Router>,
    start_lock: tokio::sync::Mutex<()>,
    running: Mutex<Option<Running>>,
}

impl Webhook {
    pub(crate) fn new(client: Weak<ClientInner>) -> Self {
        Self {
            client,
            enabled: AtomicBool::new(false),
            route: Arc::new(Route::default()),
            router: OnceLock::new(),
            start_lock: tokio::sync::Mutex::new(()),
            running: Mutex::new(None),
        }
    }

    /// Address the listener is bound to while enabled.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|running| running.addr)
    }

    /// Path requests must be posted to, taken from the last started URL.
    pub fn path(&self) -> String {
        self.route
            .path
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn router(&self) -> Router {
        self.router
            .get_or_init(|| {
                Router::new().fallback(receive).with_state(ReceiverState {
                    client: self.client.clone(),
                    route: self.route.clone(),
                })
            })
            .clone()
    }
}

fn webhook_path(raw: &str) -> Result<String> {
    let url = Url::parse(raw).map_err(|_| Error::InvalidWebhookUrl(raw.to_string()))?;
    if url.scheme().is_empty() || url.host_str().is_none() || url.cannot_be_a_base() {
        return Err(Error::InvalidWebhookUrl(raw.to_string()));
    }
    Ok(url.path().to_string())
}

#[async_trait]
impl EventTransport for Webhook {
    type Params = WebhookOptions;

    async fn start(&self, options: WebhookOptions) -> Result<()> {
        let _guard = self.start_lock.lock().await;
        if self.enabled.load(Ordering::SeqCst) {
            debug!("Webhook already running");
            return Ok(());
        }

        let path = webhook_path(&options.params.url)?;
        let client = self
            .client
            .upgrade()
            .map(Evogram::from_inner)
            .ok_or(Error::ClientDropped)?;

        client.api().set_webhook(&options.params).await?;

        let port = options.port.unwrap_or(DEFAULT_PORT);
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
            .await
            .map_err(|source| Error::Bind { port, source })?;
        let addr = listener
            .local_addr()
            .map_err(|source| Error::Bind { port, source })?;

        *self.route.path.write().unwrap_or_else(PoisonError::into_inner) = path.clone();
        *self
            .route
            .secret_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = options.params.secret_token.clone();

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let router = self.router();
        let server = tokio::spawn(async move {
            let result = axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = result {
                error!("Webhook server failed: {}", e);
            }
        });

        *self.running.lock().unwrap_or_else(PoisonError::into_inner) = Some(Running {
            shutdown,
            addr,
            _server: server,
        });
        self.enabled.store(true, Ordering::SeqCst);

        info!("Webhook listening on {} at {}", addr, path);
        Ok(())
    }

    fn stop(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        let running = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(running) = running {
            let _ = running.shutdown.send(());
            info!("Webhook on {} stopped", running.addr);
        }
    }

    fn state(&self) -> TransportState {
        if self.enabled.load(Ordering::SeqCst) {
            TransportState::Enabled
        } else {
            TransportState::Disabled
        }
    }
}

impl std::fmt::Debug for Webhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Webhook")
            .field("state", &self.state())
            .field("path", &self.path())
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

async fn receive(
    State(state): State<ReceiverState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let expected_path = state
        .route
        .path
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    if method != Method::POST || uri.path() != expected_path {
        return StatusCode::OK;
    }

    let secret = state
        .route
        .secret_token
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    if let Some(secret) = secret {
        let given = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|value| value.to_str().ok());
        if given != Some(secret.as_str()) {
            warn!("Rejected webhook request without a valid secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!("Rejected malformed webhook body: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };

    let Some(client) = state.client.upgrade().map(Evogram::from_inner) else {
        return StatusCode::SERVICE_UNAVAILABLE;
    };
    // Handler failures are logged, never reported back to the Bot API.
    if let Err(e) = client.updates().dispatch(&update).await {
        error!("Handling webhook update {} failed: {}", update.id, e.report());
    }
    StatusCode::OK
}
