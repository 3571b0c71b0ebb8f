//! Decoration layer: typed wrappers that pair a wire entity with the client
//! so handlers can act on it directly (`message.reply("...")`).
//!
//! Which wrapper an update payload becomes is decided at run time by the
//! [`ContextManager`], keyed by [`ContextKind`]. Handlers name the type they
//! want and [`FromDecorated`] bridges the two: a matching wrapper is taken
//! as is, anything else is rebuilt from the raw payload.

mod chat;
mod chat_member;
mod inline;
mod location;
mod manager;
mod message;
mod payments;
mod poll;
mod user;

pub use chat::{
    ChatContext, ChatInviteLinkContext, ChatJoinRequestContext, DetailedChatContext,
    ForumTopicContext, ForumTopicSource, ForumTopicUpdate,
};
pub use chat_member::{ChatMemberContext, ChatMemberUpdatedContext};
pub use inline::{CallbackQueryContext, ChosenInlineResultContext, InlineQueryContext};
pub use location::{ContactContext, LocationContext, VenueContext};
pub use manager::{factory, ContextFactory, ContextManager};
pub(crate) use manager::decorate;
pub use message::{ForwardInfo, ForwardMessageContext, IncomingMessageContext, MessageContext};
pub use payments::{OrderInfoContext, PreCheckoutQueryContext, ShippingQueryContext};
pub use poll::{PollAnswerContext, PollContext};
pub use user::{BotContext, UserContext};

use std::any::Any;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::Evogram;
use crate::error::{Error, Result};
use crate::types::ChatId;

/// A wire entity bound to the client that received it.
pub trait Context: Sized + Send + 'static {
    type Source: DeserializeOwned + Serialize + Send;

    fn new(client: Evogram, source: Self::Source) -> Self;

    fn source(&self) -> &Self::Source;

    fn client(&self) -> &Evogram;

    /// Builds the wrapper from a JSON payload.
    fn from_value(client: Evogram, raw: Value) -> Result<Self> {
        let source = serde_json::from_value(raw).map_err(|source| Error::ContextDecode {
            context: std::any::type_name::<Self>(),
            source,
        })?;
        Ok(Self::new(client, source))
    }
}

/// Implements [`Context`] for a wrapper made of exactly `client` and `source`.
macro_rules! simple_context {
    ($name:ident, $source:ty) => {
        impl $crate::contexts::Context for $name {
            type Source = $source;

            fn new(client: $crate::client::Evogram, source: Self::Source) -> Self {
                Self { client, source }
            }

            fn source(&self) -> &Self::Source {
                &self.source
            }

            fn client(&self) -> &$crate::client::Evogram {
                &self.client
            }
        }
    };
}
pub(crate) use simple_context;

/// Tags of the entities a factory can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContextKind {
    Message,
    IncomingMessage,
    ForwardMessage,
    User,
    Bot,
    Chat,
    DetailedChat,
    ChatInviteLink,
    ChatJoinRequest,
    ChatMember,
    ChatMemberUpdated,
    ForumTopic,
    CallbackQuery,
    InlineQuery,
    ChosenInlineResult,
    ShippingQuery,
    PreCheckoutQuery,
    OrderInfo,
    Poll,
    PollAnswer,
    Location,
    Venue,
    Contact,
}

/// Output of the decoration step: a boxed wrapper when a factory was
/// registered for the kind, the untouched payload otherwise.
pub enum Decorated {
    Context {
        context: Box<dyn Any + Send>,
        raw: Value,
    },
    Raw(Value),
}

impl Decorated {
    pub fn raw(&self) -> &Value {
        match self {
            Decorated::Context { raw, .. } | Decorated::Raw(raw) => raw,
        }
    }

    pub fn into_raw(self) -> Value {
        match self {
            Decorated::Context { raw, .. } | Decorated::Raw(raw) => raw,
        }
    }

    pub fn is_decorated(&self) -> bool {
        matches!(self, Decorated::Context { .. })
    }

    /// Takes the wrapper out if it is a `T`; gives `self` back otherwise.
    pub fn downcast<T: Any>(self) -> std::result::Result<T, Self> {
        match self {
            Decorated::Context { context, raw } => match context.downcast::<T>() {
                Ok(context) => Ok(*context),
                Err(context) => Err(Decorated::Context { context, raw }),
            },
            raw @ Decorated::Raw(_) => Err(raw),
        }
    }
}

impl std::fmt::Debug for Decorated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decorated::Context { raw, .. } => f.debug_struct("Context").field("raw", raw).finish(),
            Decorated::Raw(raw) => f.debug_tuple("Raw").field(raw).finish(),
        }
    }
}

/// Produces a handler argument from a decorated payload.
pub trait FromDecorated: Sized + Send + 'static {
    fn from_decorated(client: &Evogram, decorated: Decorated) -> Result<Self>;
}

impl<C: Context> FromDecorated for C {
    fn from_decorated(client: &Evogram, decorated: Decorated) -> Result<Self> {
        match decorated.downcast::<C>() {
            Ok(context) => Ok(context),
            Err(other) => C::from_value(client.clone(), other.into_raw()),
        }
    }
}

impl FromDecorated for Value {
    fn from_decorated(_client: &Evogram, decorated: Decorated) -> Result<Self> {
        Ok(decorated.into_raw())
    }
}

impl FromDecorated for Decorated {
    fn from_decorated(_client: &Evogram, decorated: Decorated) -> Result<Self> {
        Ok(decorated)
    }
}

/// An entity together with the chat it belongs to, for wrappers whose
/// follow-up calls need a `chat_id` the entity itself does not carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InChat<T> {
    pub chat_id: ChatId,
    pub entity: T,
}

impl<T> InChat<T> {
    pub fn new(chat_id: impl Into<ChatId>, entity: T) -> Self {
        Self {
            chat_id: chat_id.into(),
            entity,
        }
    }
}

/// Bot API dates are Unix seconds.
pub(crate) fn unix_time(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}
