use serde::Serialize;

use super::Api;
use crate::error::Result;
use crate::types::{BotCommand, BotCommandScope, ChatAdministratorRights, MenuButton, User};

#[derive(Debug, Clone, Serialize)]
pub struct SetMyCommandsParams {
    pub commands: Vec<BotCommand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<BotCommandScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl SetMyCommandsParams {
    pub fn new(commands: Vec<BotCommand>) -> Self {
        Self {
            commands,
            scope: None,
            language_code: None,
        }
    }
}

/// Selects a command list for `getMyCommands` and `deleteMyCommands`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommandScopeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<BotCommandScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SetChatMenuButtonParams {
    /// Private chat to change; the default button when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_button: Option<MenuButton>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SetMyDefaultAdministratorRightsParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rights: Option<ChatAdministratorRights>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub for_channels: Option<bool>,
}

#[derive(Serialize)]
struct ChatMenuButtonQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    chat_id: Option<i64>,
}

#[derive(Serialize)]
struct DefaultRightsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    for_channels: Option<bool>,
}

impl Api {
    pub async fn get_me(&self) -> Result<User> {
        self.request("getMe").await
    }

    /// Logs the bot out of the cloud Bot API server before moving it to a local one.
    pub async fn log_out(&self) -> Result<bool> {
        self.request("logOut").await
    }

    pub async fn close(&self) -> Result<bool> {
        self.request("close").await
    }

    pub async fn set_my_commands(&self, params: &SetMyCommandsParams) -> Result<bool> {
        self.call("setMyCommands", Some(params)).await
    }

    pub async fn delete_my_commands(&self, params: &CommandScopeParams) -> Result<bool> {
        self.call("deleteMyCommands", Some(params)).await
    }

    pub async fn get_my_commands(&self, params: &CommandScopeParams) -> Result<Vec<BotCommand>> {
        self.call("getMyCommands", Some(params)).await
    }

    pub async fn set_chat_menu_button(&self, params: &SetChatMenuButtonParams) -> Result<bool> {
        self.call("setChatMenuButton", Some(params)).await
    }

    pub async fn get_chat_menu_button(&self, chat_id: Option<i64>) -> Result<MenuButton> {
        self.call("getChatMenuButton", Some(&ChatMenuButtonQuery { chat_id }))
            .await
    }

    pub async fn set_my_default_administrator_rights(
        &self,
        params: &SetMyDefaultAdministratorRightsParams,
    ) -> Result<bool> {
        self.call("setMyDefaultAdministratorRights", Some(params))
            .await
    }

    pub async fn get_my_default_administrator_rights(
        &self,
        for_channels: Option<bool>,
    ) -> Result<ChatAdministratorRights> {
        self.call(
            "getMyDefaultAdministratorRights",
            Some(&DefaultRightsQuery { for_channels }),
        )
        .await
    }
}
