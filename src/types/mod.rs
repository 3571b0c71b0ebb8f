//! Serde shapes of the Bot API objects this crate reads and writes.
//!
//! Rarely used, deeply nested payloads (games, invoices, passport data, video
//! chat service messages) are kept as [`serde_json::Value`].

mod bot;
mod chat;
mod markup;
mod message;
mod payments;
mod poll;
mod query;
mod user;

pub use bot::{
    BotCommand, BotCommandScope, File, MenuButton, UserProfilePhotos, WebAppInfo, WebhookInfo,
};
pub use chat::{
    Chat, ChatAdministratorRights, ChatInviteLink, ChatJoinRequest, ChatLocation, ChatMember,
    ChatMemberAdministrator, ChatMemberBanned, ChatMemberLeft, ChatMemberMember,
    ChatMemberOwner, ChatMemberRestricted, ChatMemberUpdated, ChatPermissions, ChatPhoto,
    ChatType, ForumTopic, ForumTopicCreated, ForumTopicEdited,
};
pub use markup::{
    ForceReply, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, ReplyKeyboardMarkup,
    ReplyKeyboardRemove, ReplyMarkup,
};
pub use message::{
    Animation, Audio, Contact, Dice, Document, Location, Message, MessageEntity, MessageId,
    PhotoSize, Sticker, Venue, Video, VideoNote, Voice,
};
pub use payments::{
    LabeledPrice, OrderInfo, PreCheckoutQuery, ShippingAddress, ShippingOption, ShippingQuery,
};
pub use poll::{Poll, PollAnswer, PollOption, PollType};
pub use query::{
    CallbackQuery, ChosenInlineResult, InlineQuery, InlineQueryResult,
    InlineQueryResultArticle, InlineQueryResultPhoto, InputMessageContent,
};
pub use user::User;

use serde::{Deserialize, Serialize};

/// Target chat: a numeric identifier or a `@username` of a channel/supergroup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

impl From<i32> for ChatId {
    fn from(id: i32) -> Self {
        ChatId::Id(id.into())
    }
}

impl From<&str> for ChatId {
    fn from(username: &str) -> Self {
        ChatId::Username(username.to_string())
    }
}

impl From<String> for ChatId {
    fn from(username: String) -> Self {
        ChatId::Username(username)
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatId::Id(id) => write!(f, "{}", id),
            ChatId::Username(name) => write!(f, "{}", name),
        }
    }
}

/// A file to send: already on the Bot API servers, reachable by URL, or
/// uploaded from memory with `multipart/form-data`.
#[derive(Clone, PartialEq)]
pub enum InputFile {
    FileId(String),
    Url(String),
    Memory { file_name: String, data: Vec<u8> },
}

impl InputFile {
    pub fn file_id(id: impl Into<String>) -> Self {
        InputFile::FileId(id.into())
    }

    pub fn url(url: impl Into<String>) -> Self {
        InputFile::Url(url.into())
    }

    pub fn memory(file_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        InputFile::Memory {
            file_name: file_name.into(),
            data: data.into(),
        }
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, InputFile::Memory { .. })
    }
}

impl std::fmt::Debug for InputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFile::FileId(id) => f.debug_tuple("FileId").field(id).finish(),
            InputFile::Url(url) => f.debug_tuple("Url").field(url).finish(),
            InputFile::Memory { file_name, data } => f
                .debug_struct("Memory")
                .field("file_name", file_name)
                .field("len", &data.len())
                .finish(),
        }
    }
}

// In-memory uploads never reach the JSON encoder: the multipart path strips
// them out first, so they serialize as their file name only.
impl Serialize for InputFile {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            InputFile::FileId(value) | InputFile::Url(value) => serializer.serialize_str(value),
            InputFile::Memory { file_name, .. } => serializer.serialize_str(file_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_id_serializes_untagged() {
        assert_eq!(serde_json::to_value(ChatId::from(42)).unwrap(), json!(42));
        assert_eq!(
            serde_json::to_value(ChatId::from("@channel")).unwrap(),
            json!("@channel")
        );
    }

    #[test]
    fn test_input_file_debug_hides_bytes() {
        let file = InputFile::memory("a.png", vec![0u8; 1024]);
        let debug = format!("{:?}", file);
        assert!(debug.contains("a.png"));
        assert!(debug.contains("1024"));
        assert!(file.is_upload());
        assert!(!InputFile::file_id("abc").is_upload());
    }
}
