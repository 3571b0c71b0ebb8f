use serde::{Deserialize, Serialize};

use super::Api;
use crate::error::Result;
use crate::types::{
    ChatId, InlineKeyboardMarkup, Message, MessageEntity, MessageId, Poll, PollType, ReplyMarkup,
};

/// Delivery options shared by every `send*` method.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SendOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protect_content: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_sending_without_reply: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<ReplyMarkup>,
}

/// Which message an `edit*` method applies to: a chat message or an inline one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageTarget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<ChatId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_message_id: Option<String>,
}

impl MessageTarget {
    pub fn chat(chat_id: impl Into<ChatId>, message_id: i64) -> Self {
        Self {
            chat_id: Some(chat_id.into()),
            message_id: Some(message_id),
            inline_message_id: None,
        }
    }

    pub fn inline(inline_message_id: impl Into<String>) -> Self {
        Self {
            inline_message_id: Some(inline_message_id.into()),
            ..Default::default()
        }
    }
}

/// Edits of inline messages return `true` instead of the edited message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EditResult {
    Message(Box<Message>),
    Inline(bool),
}

impl EditResult {
    pub fn into_message(self) -> Option<Message> {
        match self {
            EditResult::Message(message) => Some(*message),
            EditResult::Inline(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatAction {
    Typing,
    UploadPhoto,
    RecordVideo,
    UploadVideo,
    RecordVoice,
    UploadVoice,
    UploadDocument,
    ChooseSticker,
    FindLocation,
    RecordVideoNote,
    UploadVideoNote,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageParams {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<MessageEntity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
    #[serde(flatten)]
    pub options: SendOptions,
}

impl SendMessageParams {
    pub fn new(chat_id: impl Into<ChatId>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: text.into(),
            parse_mode: None,
            entities: None,
            disable_web_page_preview: None,
            options: SendOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ForwardMessageParams {
    pub chat_id: ChatId,
    pub from_chat_id: ChatId,
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protect_content: Option<bool>,
}

impl ForwardMessageParams {
    pub fn new(chat_id: impl Into<ChatId>, from_chat_id: impl Into<ChatId>, message_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            from_chat_id: from_chat_id.into(),
            message_id,
            message_thread_id: None,
            disable_notification: None,
            protect_content: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CopyMessageParams {
    pub chat_id: ChatId,
    pub from_chat_id: ChatId,
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption_entities: Option<Vec<MessageEntity>>,
    #[serde(flatten)]
    pub options: SendOptions,
}

impl CopyMessageParams {
    pub fn new(chat_id: impl Into<ChatId>, from_chat_id: impl Into<ChatId>, message_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            from_chat_id: from_chat_id.into(),
            message_id,
            caption: None,
            parse_mode: None,
            caption_entities: None,
            options: SendOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendLocationParams {
    pub chat_id: ChatId,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_accuracy: Option<f64>,
    /// Seconds the location stays live, 60 to 86400.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_period: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proximity_alert_radius: Option<u32>,
    #[serde(flatten)]
    pub options: SendOptions,
}

impl SendLocationParams {
    pub fn new(chat_id: impl Into<ChatId>, latitude: f64, longitude: f64) -> Self {
        Self {
            chat_id: chat_id.into(),
            latitude,
            longitude,
            horizontal_accuracy: None,
            live_period: None,
            heading: None,
            proximity_alert_radius: None,
            options: SendOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageLiveLocationParams {
    #[serde(flatten)]
    pub target: MessageTarget,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal_accuracy: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proximity_alert_radius: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl EditMessageLiveLocationParams {
    pub fn new(target: MessageTarget, latitude: f64, longitude: f64) -> Self {
        Self {
            target,
            latitude,
            longitude,
            horizontal_accuracy: None,
            heading: None,
            proximity_alert_radius: None,
            reply_markup: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StopMessageLiveLocationParams {
    #[serde(flatten)]
    pub target: MessageTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl StopMessageLiveLocationParams {
    pub fn new(target: MessageTarget) -> Self {
        Self {
            target,
            reply_markup: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendVenueParams {
    pub chat_id: ChatId,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foursquare_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foursquare_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_place_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub google_place_type: Option<String>,
    #[serde(flatten)]
    pub options: SendOptions,
}

impl SendVenueParams {
    pub fn new(
        chat_id: impl Into<ChatId>,
        latitude: f64,
        longitude: f64,
        title: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            latitude,
            longitude,
            title: title.into(),
            address: address.into(),
            foursquare_id: None,
            foursquare_type: None,
            google_place_id: None,
            google_place_type: None,
            options: SendOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendContactParams {
    pub chat_id: ChatId,
    pub phone_number: String,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vcard: Option<String>,
    #[serde(flatten)]
    pub options: SendOptions,
}

impl SendContactParams {
    pub fn new(
        chat_id: impl Into<ChatId>,
        phone_number: impl Into<String>,
        first_name: impl Into<String>,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            phone_number: phone_number.into(),
            first_name: first_name.into(),
            last_name: None,
            vcard: None,
            options: SendOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendPollParams {
    pub chat_id: ChatId,
    pub question: String,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_anonymous: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub poll_type: Option<PollType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allows_multiple_answers: Option<bool>,
    /// Required for quizzes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation_parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_period: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_closed: Option<bool>,
    #[serde(flatten)]
    pub send_options: SendOptions,
}

impl SendPollParams {
    pub fn new(chat_id: impl Into<ChatId>, question: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            question: question.into(),
            options,
            is_anonymous: None,
            poll_type: None,
            allows_multiple_answers: None,
            correct_option_id: None,
            explanation: None,
            explanation_parse_mode: None,
            open_period: None,
            close_date: None,
            is_closed: None,
            send_options: SendOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StopPollParams {
    pub chat_id: ChatId,
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl StopPollParams {
    pub fn new(chat_id: impl Into<ChatId>, message_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id,
            reply_markup: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendDiceParams {
    pub chat_id: ChatId,
    /// One of 🎲 🎯 🏀 ⚽ 🎳 🎰; 🎲 when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(flatten)]
    pub options: SendOptions,
}

impl SendDiceParams {
    pub fn new(chat_id: impl Into<ChatId>) -> Self {
        Self {
            chat_id: chat_id.into(),
            emoji: None,
            options: SendOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SendChatActionParams {
    pub chat_id: ChatId,
    pub action: ChatAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
}

impl SendChatActionParams {
    pub fn new(chat_id: impl Into<ChatId>, action: ChatAction) -> Self {
        Self {
            chat_id: chat_id.into(),
            action,
            message_thread_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageTextParams {
    #[serde(flatten)]
    pub target: MessageTarget,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<MessageEntity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_web_page_preview: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl EditMessageTextParams {
    pub fn new(target: MessageTarget, text: impl Into<String>) -> Self {
        Self {
            target,
            text: text.into(),
            parse_mode: None,
            entities: None,
            disable_web_page_preview: None,
            reply_markup: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageCaptionParams {
    #[serde(flatten)]
    pub target: MessageTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption_entities: Option<Vec<MessageEntity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl EditMessageCaptionParams {
    pub fn new(target: MessageTarget, caption: impl Into<String>) -> Self {
        Self {
            target,
            caption: Some(caption.into()),
            parse_mode: None,
            caption_entities: None,
            reply_markup: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageReplyMarkupParams {
    #[serde(flatten)]
    pub target: MessageTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl EditMessageReplyMarkupParams {
    pub fn new(target: MessageTarget, reply_markup: Option<InlineKeyboardMarkup>) -> Self {
        Self {
            target,
            reply_markup,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PinChatMessageParams {
    pub chat_id: ChatId,
    pub message_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_notification: Option<bool>,
}

impl PinChatMessageParams {
    pub fn new(chat_id: impl Into<ChatId>, message_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_id,
            disable_notification: None,
        }
    }
}

#[derive(Serialize)]
struct ChatMessageRef<'a> {
    chat_id: &'a ChatId,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_id: Option<i64>,
}

impl Api {
    pub async fn send_message(&self, params: &SendMessageParams) -> Result<Message> {
        self.call("sendMessage", Some(params)).await
    }

    pub async fn forward_message(&self, params: &ForwardMessageParams) -> Result<Message> {
        self.call("forwardMessage", Some(params)).await
    }

    pub async fn copy_message(&self, params: &CopyMessageParams) -> Result<MessageId> {
        self.call("copyMessage", Some(params)).await
    }

    pub async fn send_location(&self, params: &SendLocationParams) -> Result<Message> {
        self.call("sendLocation", Some(params)).await
    }

    pub async fn edit_message_live_location(
        &self,
        params: &EditMessageLiveLocationParams,
    ) -> Result<EditResult> {
        self.call("editMessageLiveLocation", Some(params)).await
    }

    pub async fn stop_message_live_location(
        &self,
        params: &StopMessageLiveLocationParams,
    ) -> Result<EditResult> {
        self.call("stopMessageLiveLocation", Some(params)).await
    }

    pub async fn send_venue(&self, params: &SendVenueParams) -> Result<Message> {
        self.call("sendVenue", Some(params)).await
    }

    pub async fn send_contact(&self, params: &SendContactParams) -> Result<Message> {
        self.call("sendContact", Some(params)).await
    }

    pub async fn send_poll(&self, params: &SendPollParams) -> Result<Message> {
        self.call("sendPoll", Some(params)).await
    }

    pub async fn stop_poll(&self, params: &StopPollParams) -> Result<Poll> {
        self.call("stopPoll", Some(params)).await
    }

    pub async fn send_dice(&self, params: &SendDiceParams) -> Result<Message> {
        self.call("sendDice", Some(params)).await
    }

    pub async fn send_chat_action(&self, params: &SendChatActionParams) -> Result<bool> {
        self.call("sendChatAction", Some(params)).await
    }

    pub async fn edit_message_text(&self, params: &EditMessageTextParams) -> Result<EditResult> {
        self.call("editMessageText", Some(params)).await
    }

    pub async fn edit_message_caption(
        &self,
        params: &EditMessageCaptionParams,
    ) -> Result<EditResult> {
        self.call("editMessageCaption", Some(params)).await
    }

    pub async fn edit_message_reply_markup(
        &self,
        params: &EditMessageReplyMarkupParams,
    ) -> Result<EditResult> {
        self.call("editMessageReplyMarkup", Some(params)).await
    }

    pub async fn delete_message(&self, chat_id: &ChatId, message_id: i64) -> Result<bool> {
        let params = ChatMessageRef {
            chat_id,
            message_id: Some(message_id),
        };
        self.call("deleteMessage", Some(&params)).await
    }

    pub async fn pin_chat_message(&self, params: &PinChatMessageParams) -> Result<bool> {
        self.call("pinChatMessage", Some(params)).await
    }

    /// Unpins `message_id`, or the most recent pinned message when `None`.
    pub async fn unpin_chat_message(&self, chat_id: &ChatId, message_id: Option<i64>) -> Result<bool> {
        let params = ChatMessageRef {
            chat_id,
            message_id,
        };
        self.call("unpinChatMessage", Some(&params)).await
    }

    pub async fn unpin_all_chat_messages(&self, chat_id: &ChatId) -> Result<bool> {
        let params = ChatMessageRef {
            chat_id,
            message_id: None,
        };
        self.call("unpinAllChatMessages", Some(&params)).await
    }
}
