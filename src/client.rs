use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde_json::Value;

use crate::api::{Api, DEFAULT_API_URL};
use crate::config::Config;
use crate::contexts::{
    decorate, ContextFactory, ContextKind, ContextManager, Decorated, FromDecorated,
};
use crate::error::Result;
use crate::updates::Updates;

const DEFAULT_POLLING_ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub(crate) struct ClientInner {
    api: Api,
    contexts: RwLock<ContextManager>,
    updates: Updates,
}

/// Entry point: the Bot API surface, the decoration registry and the
/// update dispatcher of one bot. Cloning is cheap and shares all three.
#[derive(Clone)]
pub struct Evogram {
    inner: Arc<ClientInner>,
}

pub struct EvogramBuilder {
    token: String,
    api_url: String,
    contexts: ContextManager,
    polling_error_backoff: Duration,
    http: Option<reqwest::Client>,
}

impl EvogramBuilder {
    /// Base URL of the Bot API server, e.g. a self-hosted one.
    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Decoration registry to start from instead of the built-in one.
    pub fn contexts(mut self, contexts: ContextManager) -> Self {
        self.contexts = contexts;
        self
    }

    /// Pause after a failed polling round. Zero retries immediately.
    pub fn polling_error_backoff(mut self, backoff: Duration) -> Self {
        self.polling_error_backoff = backoff;
        self
    }

    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> Evogram {
        let api = Api::new(self.http.unwrap_or_default(), self.api_url, self.token);
        let contexts = RwLock::new(self.contexts);
        let backoff = self.polling_error_backoff;

        let inner = Arc::new_cyclic(|weak| ClientInner {
            api,
            contexts,
            updates: Updates::new(weak.clone(), backoff),
        });
        Evogram { inner }
    }
}

impl Evogram {
    pub fn new(token: impl Into<String>) -> Self {
        Self::builder(token).build()
    }

    pub fn builder(token: impl Into<String>) -> EvogramBuilder {
        EvogramBuilder {
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            contexts: ContextManager::default(),
            polling_error_backoff: DEFAULT_POLLING_ERROR_BACKOFF,
            http: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::builder(config.bot.token.clone())
            .api_url(config.bot.api_url.clone())
            .polling_error_backoff(Duration::from_secs(config.polling.error_backoff_secs))
            .build()
    }

    pub(crate) fn from_inner(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    pub fn api(&self) -> &Api {
        &self.inner.api
    }

    pub fn updates(&self) -> &Updates {
        &self.inner.updates
    }

    /// Replaces the wrapper `kind` payloads are decorated into.
    pub fn set_context(&self, kind: ContextKind, factory: ContextFactory) {
        self.inner
            .contexts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_context(kind, factory);
    }

    /// Makes `kind` payloads reach handlers undecorated.
    pub fn delete_context(&self, kind: ContextKind) {
        self.inner
            .contexts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .delete_context(kind);
    }

    /// Decorates `raw` with whatever is currently registered for `kind`.
    pub fn context(&self, kind: ContextKind, raw: Value) -> Result<Decorated> {
        let factory = self
            .inner
            .contexts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .factory(kind);
        decorate(factory, self, raw)
    }

    /// Decorates `raw` and converts it to `C`.
    pub fn context_as<C: FromDecorated>(&self, kind: ContextKind, raw: Value) -> Result<C> {
        let decorated = self.context(kind, raw)?;
        C::from_decorated(self, decorated)
    }
}

impl std::fmt::Debug for Evogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evogram")
            .field("api_url", &self.inner.api.api_url())
            .field("updates", &self.inner.updates)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contexts::{factory, Context, LocationContext, MessageContext};
    use crate::types::Location;
    use serde_json::json;

    struct Pin {
        client: Evogram,
        source: Location,
    }

    impl Context for Pin {
        type Source = Location;

        fn new(client: Evogram, source: Location) -> Self {
            Self { client, source }
        }

        fn source(&self) -> &Location {
            &self.source
        }

        fn client(&self) -> &Evogram {
            &self.client
        }
    }

    fn client() -> Evogram {
        Evogram::builder("123:SECRET")
            .api_url("http://127.0.0.1:9/")
            .build()
    }

    #[tokio::test]
    async fn test_send_message_scenario() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/sendMessage")
            .match_body(mockito::Matcher::Json(json!({ "chat_id": 42, "text": "hi" })))
            .with_body(
                json!({
                    "ok": true,
                    "result": {
                        "message_id": 7,
                        "chat": { "id": 42, "type": "private" },
                        "date": 1234,
                        "text": "hi"
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = Evogram::builder("TEST_TOKEN").api_url(server.url()).build();
        let sent = client
            .api()
            .send_message(&crate::api::SendMessageParams::new(42, "hi"))
            .await
            .unwrap();
        let message = MessageContext::new(client.clone(), sent);
        assert_eq!(message.id(), 7);
        assert_eq!(message.chat().id(), 42);
        mock.assert_async().await;
    }

    #[test]
    fn test_context_overrides_are_per_client() {
        let first = client();
        let second = client();
        first.set_context(ContextKind::Location, factory::<Pin>());

        let raw = json!({ "latitude": 1.0, "longitude": 2.0 });
        let pin: Pin = first.context_as(ContextKind::Location, raw.clone()).unwrap();
        assert_eq!(pin.source().longitude, 2.0);
        assert!(first
            .context(ContextKind::Location, raw.clone())
            .unwrap()
            .downcast::<LocationContext>()
            .is_err());

        let location: LocationContext = second.context_as(ContextKind::Location, raw).unwrap();
        assert_eq!(location.latitude(), 1.0);
    }

    #[test]
    fn test_debug_hides_token() {
        let rendered = format!("{:?}", client());
        assert!(!rendered.contains("SECRET"));
        assert!(rendered.contains("http://127.0.0.1:9"));
    }

    #[test]
    fn test_last_handle_frees_client() {
        let client = client();
        client.updates().on_message(|_: Value| async { anyhow::Ok(()) });
        let weak = Arc::downgrade(&client.inner);
        drop(client);
        assert!(weak.upgrade().is_none());
    }
}
