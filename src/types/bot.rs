use serde::{Deserialize, Serialize};

use super::{ChatId, PhotoSize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

impl BotCommand {
    pub fn new(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: description.into(),
        }
    }
}

/// Which users a command list applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BotCommandScope {
    Default,
    AllPrivateChats,
    AllGroupChats,
    AllChatAdministrators,
    Chat { chat_id: ChatId },
    ChatAdministrators { chat_id: ChatId },
    ChatMember { chat_id: ChatId, user_id: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppInfo {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MenuButton {
    Commands,
    WebApp { text: String, web_app: WebAppInfo },
    Default,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookInfo {
    /// Empty when the bot uses `getUpdates`.
    pub url: String,
    pub has_custom_certificate: bool,
    pub pending_update_count: u32,
    pub ip_address: Option<String>,
    pub last_error_date: Option<i64>,
    pub last_error_message: Option<String>,
    pub last_synchronization_error_date: Option<i64>,
    pub max_connections: Option<u32>,
    pub allowed_updates: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub file_id: String,
    pub file_unique_id: String,
    pub file_size: Option<u64>,
    /// Use `https://api.telegram.org/file/bot<token>/<file_path>` to download.
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfilePhotos {
    pub total_count: u32,
    pub photos: Vec<Vec<PhotoSize>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_scope_tagging() {
        let scope = BotCommandScope::ChatMember {
            chat_id: ChatId::from(-100),
            user_id: 3,
        };
        assert_eq!(
            serde_json::to_value(&scope).unwrap(),
            json!({ "type": "chat_member", "chat_id": -100, "user_id": 3 })
        );
        assert_eq!(
            serde_json::to_value(BotCommandScope::AllPrivateChats).unwrap(),
            json!({ "type": "all_private_chats" })
        );
    }

    #[test]
    fn test_menu_button_decodes_web_app() {
        let button: MenuButton = serde_json::from_value(json!({
            "type": "web_app",
            "text": "Open",
            "web_app": { "url": "https://example.com" }
        }))
        .unwrap();
        assert_eq!(
            button,
            MenuButton::WebApp {
                text: "Open".into(),
                web_app: WebAppInfo {
                    url: "https://example.com".into()
                }
            }
        );
    }
}
