use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    simple_context, unix_time, BotContext, ChatContext, Context, ContactContext, ForumTopicContext,
    ForumTopicSource, ForumTopicUpdate, LocationContext, PollContext, UserContext, VenueContext,
};
use crate::api::{
    ChatAction, EditMessageCaptionParams, EditMessageTextParams, EditResult, ForwardMessageParams,
    MessageTarget, PinChatMessageParams, SendChatActionParams, SendMessageParams,
};
use crate::client::Evogram;
use crate::error::Result;
use crate::types::{
    Animation, Audio, Chat, ChatId, Dice, Document, InlineKeyboardMarkup, Message, MessageEntity,
    PhotoSize, Sticker, User, Video, VideoNote, Voice,
};

/// A message received in an update.
pub struct MessageContext {
    client: Evogram,
    source: Message,
}

simple_context!(MessageContext, Message);

impl MessageContext {
    pub fn id(&self) -> i64 {
        self.source.message_id
    }

    pub fn text(&self) -> Option<&str> {
        self.source.text.as_deref()
    }

    pub fn caption(&self) -> Option<&str> {
        self.source.caption.as_deref()
    }

    /// Entities of the text, or of the caption for media messages.
    pub fn entities(&self) -> &[MessageEntity] {
        self.source
            .entities
            .as_deref()
            .or(self.source.caption_entities.as_deref())
            .unwrap_or_default()
    }

    pub fn thread_id(&self) -> Option<i64> {
        self.source.message_thread_id
    }

    pub fn user(&self) -> Option<UserContext> {
        self.source.from.clone().map(|user| {
            UserContext::in_chat(self.client.clone(), user, self.source.chat.id)
        })
    }

    pub fn via_bot(&self) -> Option<UserContext> {
        self.source
            .via_bot
            .clone()
            .map(|user| UserContext::new(self.client.clone(), user))
    }

    pub fn chat(&self) -> ChatContext {
        ChatContext::new(self.client.clone(), self.source.chat.clone())
    }

    pub fn sender_chat(&self) -> Option<ChatContext> {
        self.source
            .sender_chat
            .clone()
            .map(|chat| ChatContext::new(self.client.clone(), chat))
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        unix_time(self.source.date)
    }

    pub fn edit_date(&self) -> Option<DateTime<Utc>> {
        self.source.edit_date.and_then(unix_time)
    }

    pub fn forward(&self) -> Option<ForwardMessageContext> {
        ForwardInfo::from_message(&self.source)
            .map(|info| ForwardMessageContext::new(self.client.clone(), info))
    }

    pub fn reply_message(&self) -> Option<MessageContext> {
        self.source
            .reply_to_message
            .as_deref()
            .cloned()
            .map(|message| MessageContext::new(self.client.clone(), message))
    }

    pub fn location(&self) -> Option<LocationContext> {
        self.source
            .location
            .map(|location| LocationContext::new(self.client.clone(), location))
    }

    pub fn venue(&self) -> Option<VenueContext> {
        self.source
            .venue
            .clone()
            .map(|venue| VenueContext::new(self.client.clone(), venue))
    }

    pub fn contact(&self) -> Option<ContactContext> {
        self.source
            .contact
            .clone()
            .map(|contact| ContactContext::new(self.client.clone(), contact))
    }

    pub fn poll(&self) -> Option<PollContext> {
        self.source
            .poll
            .clone()
            .map(|poll| PollContext::new(self.client.clone(), poll))
    }

    /// The forum topic this service message reports on, if any.
    pub fn forum_topic(&self) -> Option<ForumTopicContext> {
        let message = &self.source;
        let (update, name, icon_color, icon_custom_emoji_id) =
            if let Some(created) = &message.forum_topic_created {
                (
                    ForumTopicUpdate::Created,
                    Some(created.name.clone()),
                    Some(created.icon_color),
                    created.icon_custom_emoji_id.clone(),
                )
            } else if let Some(edited) = &message.forum_topic_edited {
                (
                    ForumTopicUpdate::Edited,
                    edited.name.clone(),
                    None,
                    edited.icon_custom_emoji_id.clone(),
                )
            } else if message.forum_topic_closed.is_some() {
                (ForumTopicUpdate::Closed, None, None, None)
            } else if message.forum_topic_reopened.is_some() {
                (ForumTopicUpdate::Reopened, None, None, None)
            } else if message.general_forum_topic_hidden.is_some() {
                (ForumTopicUpdate::GeneralHidden, None, None, None)
            } else if message.general_forum_topic_unhidden.is_some() {
                (ForumTopicUpdate::GeneralUnhidden, None, None, None)
            } else {
                return None;
            };

        let source = ForumTopicSource {
            chat_id: ChatId::Id(message.chat.id),
            message_thread_id: message.message_thread_id,
            name,
            icon_color,
            icon_custom_emoji_id,
            update: Some(update),
        };
        Some(ForumTopicContext::new(self.client.clone(), source))
    }

    pub fn new_chat_members(&self) -> Vec<UserContext> {
        self.source
            .new_chat_members
            .iter()
            .flatten()
            .map(|user| UserContext::in_chat(self.client.clone(), user.clone(), self.source.chat.id))
            .collect()
    }

    pub fn left_chat_member(&self) -> Option<UserContext> {
        self.source
            .left_chat_member
            .clone()
            .map(|user| UserContext::in_chat(self.client.clone(), user, self.source.chat.id))
    }

    pub fn pinned_message(&self) -> Option<MessageContext> {
        self.source
            .pinned_message
            .as_deref()
            .cloned()
            .map(|message| MessageContext::new(self.client.clone(), message))
    }

    pub fn photo(&self) -> Option<&[PhotoSize]> {
        self.source.photo.as_deref()
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.source.animation.as_ref()
    }

    pub fn audio(&self) -> Option<&Audio> {
        self.source.audio.as_ref()
    }

    pub fn document(&self) -> Option<&Document> {
        self.source.document.as_ref()
    }

    pub fn sticker(&self) -> Option<&Sticker> {
        self.source.sticker.as_ref()
    }

    pub fn video(&self) -> Option<&Video> {
        self.source.video.as_ref()
    }

    pub fn video_note(&self) -> Option<&VideoNote> {
        self.source.video_note.as_ref()
    }

    pub fn voice(&self) -> Option<&Voice> {
        self.source.voice.as_ref()
    }

    pub fn dice(&self) -> Option<&Dice> {
        self.source.dice.as_ref()
    }

    pub fn media_group_id(&self) -> Option<&str> {
        self.source.media_group_id.as_deref()
    }

    pub fn reply_markup(&self) -> Option<&InlineKeyboardMarkup> {
        self.source.reply_markup.as_ref()
    }

    pub fn author_signature(&self) -> Option<&str> {
        self.source.author_signature.as_deref()
    }

    pub fn has_protected_content(&self) -> bool {
        self.source.has_protected_content.unwrap_or(false)
    }

    pub fn is_topic_message(&self) -> bool {
        self.source.is_topic_message.unwrap_or(false)
    }

    pub fn is_automatic_forward(&self) -> bool {
        self.source.is_automatic_forward.unwrap_or(false)
    }

    /// Sends `text` to this message's chat and thread.
    pub async fn send(&self, text: impl Into<String>) -> Result<IncomingMessageContext> {
        self.send_with(text, |_| {}).await
    }

    /// Like [`MessageContext::send`], letting `customize` adjust the parameters.
    pub async fn send_with(
        &self,
        text: impl Into<String>,
        customize: impl FnOnce(&mut SendMessageParams),
    ) -> Result<IncomingMessageContext> {
        let mut params = SendMessageParams::new(self.source.chat.id, text);
        params.options.message_thread_id = self.source.message_thread_id;
        customize(&mut params);

        let message = self.client.api().send_message(&params).await?;
        Ok(IncomingMessageContext::new(self.client.clone(), message))
    }

    pub async fn reply(&self, text: impl Into<String>) -> Result<IncomingMessageContext> {
        self.reply_with(text, |_| {}).await
    }

    pub async fn reply_with(
        &self,
        text: impl Into<String>,
        customize: impl FnOnce(&mut SendMessageParams),
    ) -> Result<IncomingMessageContext> {
        let message_id = self.source.message_id;
        self.send_with(text, |params| {
            params.options.reply_to_message_id = Some(message_id);
            customize(params);
        })
        .await
    }

    pub async fn delete(&self) -> Result<bool> {
        self.client
            .api()
            .delete_message(&ChatId::Id(self.source.chat.id), self.source.message_id)
            .await
    }

    /// Forwards this message to `chat_id`.
    pub async fn forward_to(&self, chat_id: impl Into<ChatId>) -> Result<IncomingMessageContext> {
        let mut params =
            ForwardMessageParams::new(chat_id, self.source.chat.id, self.source.message_id);
        params.message_thread_id = self.source.message_thread_id;

        let message = self.client.api().forward_message(&params).await?;
        Ok(IncomingMessageContext::new(self.client.clone(), message))
    }

    pub async fn pin(&self, disable_notification: bool) -> Result<bool> {
        let mut params = PinChatMessageParams::new(self.source.chat.id, self.source.message_id);
        params.disable_notification = Some(disable_notification);
        self.client.api().pin_chat_message(&params).await
    }

    pub async fn unpin(&self) -> Result<bool> {
        self.client
            .api()
            .unpin_chat_message(
                &ChatId::Id(self.source.chat.id),
                Some(self.source.message_id),
            )
            .await
    }

    pub async fn send_action(&self, action: ChatAction) -> Result<bool> {
        let mut params = SendChatActionParams::new(self.source.chat.id, action);
        params.message_thread_id = self.source.message_thread_id;
        self.client.api().send_chat_action(&params).await
    }
}

/// A message the bot itself sent; adds editing on top of [`MessageContext`].
pub struct IncomingMessageContext {
    message: MessageContext,
}

impl Context for IncomingMessageContext {
    type Source = Message;

    fn new(client: Evogram, source: Message) -> Self {
        Self {
            message: MessageContext::new(client, source),
        }
    }

    fn source(&self) -> &Message {
        self.message.source()
    }

    fn client(&self) -> &Evogram {
        self.message.client()
    }
}

impl std::ops::Deref for IncomingMessageContext {
    type Target = MessageContext;

    fn deref(&self) -> &MessageContext {
        &self.message
    }
}

impl IncomingMessageContext {
    /// The sender, which for these messages is the bot.
    pub fn bot(&self) -> Option<BotContext> {
        self.source()
            .from
            .clone()
            .map(|user| BotContext::new(self.client().clone(), user))
    }

    /// Replaces the caption of media messages, the text of anything else.
    pub async fn edit(&self, text: impl Into<String>) -> Result<Option<IncomingMessageContext>> {
        let source = self.source();
        let target = MessageTarget::chat(source.chat.id, source.message_id);
        let api = self.client().api();

        let result = if source.has_caption_media() {
            api.edit_message_caption(&EditMessageCaptionParams::new(target, text))
                .await?
        } else {
            api.edit_message_text(&EditMessageTextParams::new(target, text))
                .await?
        };

        Ok(into_incoming(self.client(), result))
    }

    pub async fn edit_text_with(
        &self,
        text: impl Into<String>,
        customize: impl FnOnce(&mut EditMessageTextParams),
    ) -> Result<Option<IncomingMessageContext>> {
        let source = self.source();
        let mut params =
            EditMessageTextParams::new(MessageTarget::chat(source.chat.id, source.message_id), text);
        customize(&mut params);

        let result = self.client().api().edit_message_text(&params).await?;
        Ok(into_incoming(self.client(), result))
    }
}

fn into_incoming(client: &Evogram, result: EditResult) -> Option<IncomingMessageContext> {
    result
        .into_message()
        .map(|message| IncomingMessageContext::new(client.clone(), message))
}

/// The forwarding header of a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardInfo {
    pub forward_from: Option<User>,
    pub forward_from_chat: Option<Chat>,
    pub forward_from_message_id: Option<i64>,
    pub forward_signature: Option<String>,
    pub forward_sender_name: Option<String>,
    pub forward_date: i64,
}

impl ForwardInfo {
    pub fn from_message(message: &Message) -> Option<Self> {
        let forward_date = message.forward_date?;
        Some(Self {
            forward_from: message.forward_from.clone(),
            forward_from_chat: message.forward_from_chat.clone(),
            forward_from_message_id: message.forward_from_message_id,
            forward_signature: message.forward_signature.clone(),
            forward_sender_name: message.forward_sender_name.clone(),
            forward_date,
        })
    }
}

pub struct ForwardMessageContext {
    client: Evogram,
    source: ForwardInfo,
}

simple_context!(ForwardMessageContext, ForwardInfo);

impl ForwardMessageContext {
    /// Original message id, for messages forwarded from channels.
    pub fn id(&self) -> Option<i64> {
        self.source.forward_from_message_id
    }

    pub fn user(&self) -> Option<UserContext> {
        self.source
            .forward_from
            .clone()
            .map(|user| UserContext::new(self.client.clone(), user))
    }

    pub fn chat(&self) -> Option<ChatContext> {
        self.source
            .forward_from_chat
            .clone()
            .map(|chat| ChatContext::new(self.client.clone(), chat))
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        unix_time(self.source.forward_date)
    }

    pub fn signature(&self) -> Option<&str> {
        self.source.forward_signature.as_deref()
    }

    /// Set for users who hide their account in forwards.
    pub fn sender_name(&self) -> Option<&str> {
        self.source.forward_sender_name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::{json, Value};

    fn message_json() -> Value {
        json!({
            "message_id": 5,
            "message_thread_id": 77,
            "from": { "id": 1, "is_bot": false, "first_name": "Ann", "username": "ann" },
            "chat": { "id": 42, "type": "supergroup", "title": "Club", "is_forum": true },
            "date": 1700000000,
            "text": "ping",
            "forward_from": { "id": 3, "is_bot": false, "first_name": "Bob" },
            "forward_date": 1690000000
        })
    }

    fn sent_json(id: i64, extra: Value) -> String {
        let mut result = json!({
            "message_id": id,
            "from": { "id": 99, "is_bot": true, "first_name": "Evo" },
            "chat": { "id": 42, "type": "supergroup" },
            "date": 1700000001
        });
        if let (Some(target), Some(extra)) = (result.as_object_mut(), extra.as_object()) {
            for (key, value) in extra {
                target.insert(key.clone(), value.clone());
            }
        }
        json!({ "ok": true, "result": result }).to_string()
    }

    fn client(server: &mockito::Server) -> Evogram {
        Evogram::builder("TEST_TOKEN").api_url(server.url()).build()
    }

    #[tokio::test]
    async fn test_getters() {
        let server = mockito::Server::new_async().await;
        let message = MessageContext::from_value(client(&server), message_json()).unwrap();

        assert_eq!(message.id(), 5);
        assert_eq!(message.text(), Some("ping"));
        assert_eq!(message.chat().id(), 42);
        assert_eq!(message.user().map(|u| u.appeal()), Some("@ann".to_string()));
        assert_eq!(message.date().map(|d| d.timestamp()), Some(1700000000));

        let forward = message.forward().unwrap();
        assert_eq!(forward.user().map(|u| u.id()), Some(3));
        assert!(message.reply_message().is_none());
        assert!(message.forum_topic().is_none());
    }

    #[tokio::test]
    async fn test_reply_targets_chat_thread_and_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/sendMessage")
            .match_body(Matcher::Json(json!({
                "chat_id": 42,
                "text": "pong",
                "message_thread_id": 77,
                "reply_to_message_id": 5
            })))
            .with_body(sent_json(6, json!({ "text": "pong" })))
            .create_async()
            .await;

        let message = MessageContext::from_value(client(&server), message_json()).unwrap();
        let sent = message.reply("pong").await.unwrap();
        assert_eq!(sent.id(), 6);
        assert_eq!(sent.bot().map(|b| b.id()), Some(99));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_with_customizes_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/sendMessage")
            .match_body(Matcher::PartialJson(json!({ "parse_mode": "HTML" })))
            .with_body(sent_json(6, json!({})))
            .create_async()
            .await;

        let message = MessageContext::from_value(client(&server), message_json()).unwrap();
        message
            .send_with("<b>hi</b>", |p| p.parse_mode = Some("HTML".into()))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_edit_text_message_uses_edit_message_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/editMessageText")
            .match_body(Matcher::Json(
                json!({ "chat_id": 42, "message_id": 6, "text": "edited" }),
            ))
            .with_body(sent_json(6, json!({ "text": "edited" })))
            .create_async()
            .await;

        let client = client(&server);
        let sent = IncomingMessageContext::from_value(
            client,
            json!({
                "message_id": 6,
                "chat": { "id": 42, "type": "supergroup" },
                "date": 1700000001,
                "text": "draft"
            }),
        )
        .unwrap();
        let edited = sent.edit("edited").await.unwrap().unwrap();
        assert_eq!(edited.text(), Some("edited"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_edit_photo_message_uses_edit_message_caption() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/editMessageCaption")
            .match_body(Matcher::Json(
                json!({ "chat_id": 42, "message_id": 6, "caption": "new caption" }),
            ))
            .with_body(sent_json(6, json!({ "caption": "new caption" })))
            .create_async()
            .await;

        let sent = IncomingMessageContext::from_value(
            client(&server),
            json!({
                "message_id": 6,
                "chat": { "id": 42, "type": "supergroup" },
                "date": 1700000001,
                "photo": [{ "file_id": "p", "file_unique_id": "u", "width": 1, "height": 1 }]
            }),
        )
        .unwrap();
        let edited = sent.edit("new caption").await.unwrap().unwrap();
        assert_eq!(edited.caption(), Some("new caption"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_forum_topic_from_service_message() {
        let server = mockito::Server::new_async().await;
        let mut raw = message_json();
        raw["forum_topic_created"] = json!({ "name": "Ideas", "icon_color": 7322096 });

        let message = MessageContext::from_value(client(&server), raw).unwrap();
        let topic = message.forum_topic().unwrap();
        assert_eq!(topic.id(), Some(77));
        assert_eq!(topic.name(), Some("Ideas"));
        assert!(!topic.is_general());
    }
}
