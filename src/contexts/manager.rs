use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use super::*;
use crate::client::Evogram;
use crate::error::Result;

/// Builds a boxed wrapper from a raw payload.
pub type ContextFactory = Arc<dyn Fn(Evogram, Value) -> Result<Box<dyn Any + Send>> + Send + Sync>;

/// Factory producing the wrapper type `C`.
pub fn factory<C: Context>() -> ContextFactory {
    Arc::new(|client, raw| {
        let context = C::from_value(client, raw)?;
        Ok(Box::new(context) as Box<dyn Any + Send>)
    })
}

/// Registry of the wrapper each [`ContextKind`] decorates into.
#[derive(Clone)]
pub struct ContextManager {
    factories: HashMap<ContextKind, ContextFactory>,
}

impl ContextManager {
    /// A registry with no factories: every payload passes through raw.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn set_context(&mut self, kind: ContextKind, factory: ContextFactory) -> &mut Self {
        self.factories.insert(kind, factory);
        self
    }

    /// Registers the wrapper type `C` for `kind`.
    pub fn set<C: Context>(&mut self, kind: ContextKind) -> &mut Self {
        self.set_context(kind, factory::<C>())
    }

    pub fn delete_context(&mut self, kind: ContextKind) -> &mut Self {
        self.factories.remove(&kind);
        self
    }

    pub fn has_context(&self, kind: ContextKind) -> bool {
        self.factories.contains_key(&kind)
    }

    pub fn factory(&self, kind: ContextKind) -> Option<ContextFactory> {
        self.factories.get(&kind).cloned()
    }

    /// Decorates `raw` with the factory registered for `kind`, or passes it
    /// through untouched when there is none.
    pub fn get_context(&self, client: &Evogram, kind: ContextKind, raw: Value) -> Result<Decorated> {
        decorate(self.factory(kind), client, raw)
    }
}

pub(crate) fn decorate(
    factory: Option<ContextFactory>,
    client: &Evogram,
    raw: Value,
) -> Result<Decorated> {
    match factory {
        Some(factory) => {
            let context = factory(client.clone(), raw.clone())?;
            Ok(Decorated::Context { context, raw })
        }
        None => Ok(Decorated::Raw(raw)),
    }
}

impl Default for ContextManager {
    fn default() -> Self {
        let mut manager = Self::empty();
        manager
            .set::<MessageContext>(ContextKind::Message)
            .set::<IncomingMessageContext>(ContextKind::IncomingMessage)
            .set::<ForwardMessageContext>(ContextKind::ForwardMessage)
            .set::<UserContext>(ContextKind::User)
            .set::<BotContext>(ContextKind::Bot)
            .set::<ChatContext>(ContextKind::Chat)
            .set::<DetailedChatContext>(ContextKind::DetailedChat)
            .set::<ChatInviteLinkContext>(ContextKind::ChatInviteLink)
            .set::<ChatJoinRequestContext>(ContextKind::ChatJoinRequest)
            .set::<ChatMemberContext>(ContextKind::ChatMember)
            .set::<ChatMemberUpdatedContext>(ContextKind::ChatMemberUpdated)
            .set::<ForumTopicContext>(ContextKind::ForumTopic)
            .set::<CallbackQueryContext>(ContextKind::CallbackQuery)
            .set::<InlineQueryContext>(ContextKind::InlineQuery)
            .set::<ChosenInlineResultContext>(ContextKind::ChosenInlineResult)
            .set::<ShippingQueryContext>(ContextKind::ShippingQuery)
            .set::<PreCheckoutQueryContext>(ContextKind::PreCheckoutQuery)
            .set::<OrderInfoContext>(ContextKind::OrderInfo)
            .set::<PollContext>(ContextKind::Poll)
            .set::<PollAnswerContext>(ContextKind::PollAnswer)
            .set::<LocationContext>(ContextKind::Location)
            .set::<VenueContext>(ContextKind::Venue)
            .set::<ContactContext>(ContextKind::Contact);
        manager
    }
}

impl std::fmt::Debug for ContextManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.factories.keys().collect();
        kinds.sort();
        f.debug_struct("ContextManager").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Location;
    use serde_json::json;

    struct Pin {
        client: Evogram,
        source: Location,
    }

    simple_context!(Pin, Location);

    fn client() -> Evogram {
        Evogram::builder("TEST_TOKEN")
            .api_url("http://127.0.0.1:9")
            .build()
    }

    #[test]
    fn test_defaults_cover_every_kind() {
        let manager = ContextManager::default();
        assert!(manager.has_context(ContextKind::Message));
        assert!(manager.has_context(ContextKind::ChatMemberUpdated));
        assert!(manager.has_context(ContextKind::Contact));
        assert!(!ContextManager::empty().has_context(ContextKind::Message));
    }

    #[test]
    fn test_deleted_kind_passes_raw_through() {
        let client = client();
        let mut manager = ContextManager::default();
        manager.delete_context(ContextKind::Location);

        let raw = json!({ "latitude": 1.0, "longitude": 2.0 });
        let decorated = manager
            .get_context(&client, ContextKind::Location, raw.clone())
            .unwrap();
        assert!(!decorated.is_decorated());
        assert_eq!(decorated.raw(), &raw);
    }

    #[test]
    fn test_custom_factory_replaces_default() {
        let client = client();
        let mut manager = ContextManager::default();
        manager.set::<Pin>(ContextKind::Location);

        let decorated = manager
            .get_context(
                &client,
                ContextKind::Location,
                json!({ "latitude": 5.0, "longitude": 6.0 }),
            )
            .unwrap();
        let pin = decorated.downcast::<Pin>().ok().unwrap();
        assert_eq!(pin.source().latitude, 5.0);
    }

    #[test]
    fn test_factory_errors_on_bad_payload() {
        let client = client();
        let manager = ContextManager::default();
        let result = manager.get_context(&client, ContextKind::Location, json!("nope"));
        assert!(result.is_err());
    }
}
