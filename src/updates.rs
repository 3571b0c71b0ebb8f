//! Handler registration and dispatch, plus ownership of the two transports.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;

use futures::future::{self, BoxFuture, FutureExt};
use tracing::debug;

use crate::client::{ClientInner, Evogram};
use crate::contexts::{
    CallbackQueryContext, ChatJoinRequestContext, ChatMemberUpdatedContext,
    ChosenInlineResultContext, Decorated, FromDecorated, InlineQueryContext, MessageContext,
    PollAnswerContext, PollContext, PreCheckoutQueryContext, ShippingQueryContext,
};
use crate::error::{Error, Result};
use crate::transports::{Polling, Webhook};
use crate::update::{Update, UpdateType};

/// A registered callback, already bridged from [`Decorated`] to its argument type.
pub type Handler = Arc<dyn Fn(Evogram, Decorated) -> BoxFuture<'static, Result<()>> + Send + Sync>;

pub struct Updates {
    client: Weak<ClientInner>,
    handlers: RwLock<HashMap<UpdateType, Vec<Handler>>>,
    polling: Polling,
    webhook: Webhook,
}

macro_rules! shortcut {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $default:ty) => {
        $(#[$doc])*
        #[doc = concat!("Usually called with [`", stringify!($default), "`].")]
        pub fn $name<C, F, Fut>(&self, handler: F) -> &Self
        where
            C: FromDecorated,
            F: Fn(C) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
        {
            self.on(UpdateType::$variant, handler)
        }
    };
}

impl Updates {
    pub(crate) fn new(client: Weak<ClientInner>, polling_error_backoff: Duration) -> Self {
        Self {
            polling: Polling::new(client.clone(), polling_error_backoff),
            webhook: Webhook::new(client.clone()),
            handlers: RwLock::new(HashMap::new()),
            client,
        }
    }

    pub fn polling(&self) -> &Polling {
        &self.polling
    }

    pub fn webhook(&self) -> &Webhook {
        &self.webhook
    }

    /// Appends `handler` to the list for `update_type`. Handlers run in
    /// registration order and receive the update's payload decorated as `C`.
    pub fn on<C, F, Fut>(&self, update_type: UpdateType, handler: F) -> &Self
    where
        C: FromDecorated,
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let wrapped: Handler = Arc::new(move |client: Evogram, decorated: Decorated| {
            match C::from_decorated(&client, decorated) {
                Ok(argument) => handler(argument).map(|r| r.map_err(Error::Handler)).boxed(),
                Err(e) => future::ready(Err(e)).boxed(),
            }
        });

        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(update_type)
            .or_default()
            .push(wrapped);
        debug!("Registered handler for {}", update_type);
        self
    }

    shortcut!(on_message, Message, MessageContext);
    shortcut!(on_edited_message, EditedMessage, MessageContext);
    shortcut!(on_channel_post, ChannelPost, MessageContext);
    shortcut!(on_edited_channel_post, EditedChannelPost, MessageContext);
    shortcut!(on_inline_query, InlineQuery, InlineQueryContext);
    shortcut!(on_chosen_inline_result, ChosenInlineResult, ChosenInlineResultContext);
    shortcut!(on_callback_query, CallbackQuery, CallbackQueryContext);
    shortcut!(on_shipping_query, ShippingQuery, ShippingQueryContext);
    shortcut!(on_pre_checkout_query, PreCheckoutQuery, PreCheckoutQueryContext);
    shortcut!(on_poll, Poll, PollContext);
    shortcut!(on_poll_answer, PollAnswer, PollAnswerContext);
    shortcut!(
        /// Changes of the bot's own membership.
        on_my_chat_member,
        MyChatMember,
        ChatMemberUpdatedContext
    );
    shortcut!(
        /// Changes of other members; only delivered to chat administrators.
        on_chat_member,
        ChatMember,
        ChatMemberUpdatedContext
    );
    shortcut!(on_chat_join_request, ChatJoinRequest, ChatJoinRequestContext);

    /// Drops every registered handler.
    pub fn clear(&self) -> &Self {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self
    }

    pub fn clear_type(&self, update_type: UpdateType) -> &Self {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&update_type);
        self
    }

    pub fn handler_count(&self, update_type: UpdateType) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&update_type)
            .map_or(0, Vec::len)
    }

    /// Update types with at least one handler, in wire order.
    pub fn allowed_updates(&self) -> Vec<UpdateType> {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        UpdateType::ALL
            .into_iter()
            .filter(|ty| handlers.get(ty).is_some_and(|list| !list.is_empty()))
            .collect()
    }

    fn handlers_for(&self, update_type: UpdateType) -> Vec<Handler> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&update_type)
            .cloned()
            .unwrap_or_default()
    }

    /// Runs the handlers registered for the update's type one after another.
    /// The first failing handler stops the rest and its error is returned.
    pub async fn dispatch(&self, update: &Update) -> Result<()> {
        let Some(update_type) = update.update_type() else {
            debug!("Update {} carries no known payload, skipping", update.id);
            return Ok(());
        };

        let handlers = self.handlers_for(update_type);
        if handlers.is_empty() {
            return Ok(());
        }

        let client = self
            .client
            .upgrade()
            .map(Evogram::from_inner)
            .ok_or(Error::ClientDropped)?;
        let payload = update.payload();

        debug!(
            "Dispatching update {} ({}) to {} handler(s)",
            update.id,
            update_type,
            handlers.len()
        );
        for handler in handlers {
            let decorated = client.context(update_type.context_kind(), payload.clone())?;
            handler(client.clone(), decorated).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Updates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Updates")
            .field("allowed_updates", &self.allowed_updates())
            .field("polling", &self.polling)
            .field("webhook", &self.webhook)
            .finish()
    }
}
