use tokio::sync::OnceCell;

use super::{simple_context, ChatMemberContext, Context, InChat};
use crate::api::{
    CommandScopeParams, GetUserProfilePhotosParams, SetChatMenuButtonParams, SetMyCommandsParams,
    SetMyDefaultAdministratorRightsParams,
};
use crate::client::Evogram;
use crate::error::Result;
use crate::types::{
    BotCommand, ChatAdministratorRights, ChatId, ChatMember, MenuButton, User, UserProfilePhotos,
};

pub struct UserContext {
    client: Evogram,
    source: User,
    chat_id: Option<ChatId>,
    member: OnceCell<ChatMember>,
}

impl Context for UserContext {
    type Source = User;

    fn new(client: Evogram, source: User) -> Self {
        Self {
            client,
            source,
            chat_id: None,
            member: OnceCell::new(),
        }
    }

    fn source(&self) -> &User {
        &self.source
    }

    fn client(&self) -> &Evogram {
        &self.client
    }
}

impl UserContext {
    /// A user seen in `chat_id`, which enables [`UserContext::member`].
    pub fn in_chat(client: Evogram, source: User, chat_id: impl Into<ChatId>) -> Self {
        let mut user = Self::new(client, source);
        user.chat_id = Some(chat_id.into());
        user
    }

    pub fn id(&self) -> i64 {
        self.source.id
    }

    pub fn first_name(&self) -> &str {
        &self.source.first_name
    }

    pub fn last_name(&self) -> Option<&str> {
        self.source.last_name.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.source.username.as_deref()
    }

    pub fn is_bot(&self) -> bool {
        self.source.is_bot
    }

    pub fn is_premium(&self) -> bool {
        self.source.is_premium.unwrap_or(false)
    }

    /// IETF language tag of the user's client.
    pub fn language_code(&self) -> Option<&str> {
        self.source.language_code.as_deref()
    }

    pub fn full_name(&self) -> String {
        match &self.source.last_name {
            Some(last_name) => format!("{} {}", self.source.first_name, last_name)
                .trim_end()
                .to_string(),
            None => self.source.first_name.clone(),
        }
    }

    /// `@username` when the user has one, the full name otherwise.
    pub fn appeal(&self) -> String {
        match &self.source.username {
            Some(username) => format!("@{}", username),
            None => self.full_name(),
        }
    }

    pub fn chat_id(&self) -> Option<&ChatId> {
        self.chat_id.as_ref()
    }

    pub async fn profile_photos(&self, offset: Option<u32>, limit: Option<u32>) -> Result<UserProfilePhotos> {
        let mut params = GetUserProfilePhotosParams::new(self.source.id);
        params.offset = offset;
        params.limit = limit;
        self.client.api().get_user_profile_photos(&params).await
    }

    /// Membership in the chat the user was seen in, fetched once per wrapper.
    /// `None` when the user is not bound to a chat.
    pub async fn member(&self) -> Result<Option<ChatMemberContext>> {
        let Some(chat_id) = &self.chat_id else {
            return Ok(None);
        };

        let member = self
            .member
            .get_or_try_init(|| self.client.api().get_chat_member(chat_id, self.source.id))
            .await?;

        Ok(Some(ChatMemberContext::new(
            self.client.clone(),
            InChat::new(chat_id.clone(), member.clone()),
        )))
    }
}

/// The bot's own account, as returned by `getMe` or as the sender of its messages.
pub struct BotContext {
    client: Evogram,
    source: User,
}

simple_context!(BotContext, User);

impl BotContext {
    pub fn id(&self) -> i64 {
        self.source.id
    }

    pub fn username(&self) -> Option<&str> {
        self.source.username.as_deref()
    }

    pub fn user(&self) -> UserContext {
        UserContext::new(self.client.clone(), self.source.clone())
    }

    pub fn can_join_groups(&self) -> bool {
        self.source.can_join_groups.unwrap_or(false)
    }

    pub fn supports_inline_queries(&self) -> bool {
        self.source.supports_inline_queries.unwrap_or(false)
    }

    pub async fn commands(&self, params: &CommandScopeParams) -> Result<Vec<BotCommand>> {
        self.client.api().get_my_commands(params).await
    }

    pub async fn set_commands(&self, commands: Vec<BotCommand>) -> Result<bool> {
        self.client
            .api()
            .set_my_commands(&SetMyCommandsParams::new(commands))
            .await
    }

    pub async fn delete_commands(&self, params: &CommandScopeParams) -> Result<bool> {
        self.client.api().delete_my_commands(params).await
    }

    pub async fn set_menu_button(&self, params: &SetChatMenuButtonParams) -> Result<bool> {
        self.client.api().set_chat_menu_button(params).await
    }

    pub async fn menu_button(&self, chat_id: Option<i64>) -> Result<MenuButton> {
        self.client.api().get_chat_menu_button(chat_id).await
    }

    pub async fn set_default_administrator_rights(
        &self,
        params: &SetMyDefaultAdministratorRightsParams,
    ) -> Result<bool> {
        self.client
            .api()
            .set_my_default_administrator_rights(params)
            .await
    }

    pub async fn default_administrator_rights(
        &self,
        for_channels: bool,
    ) -> Result<ChatAdministratorRights> {
        self.client
            .api()
            .get_my_default_administrator_rights(Some(for_channels))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn user(username: Option<&str>, last_name: Option<&str>) -> User {
        serde_json::from_value(json!({
            "id": 5,
            "is_bot": false,
            "first_name": "Ada",
            "last_name": last_name,
            "username": username
        }))
        .unwrap()
    }

    fn offline_client() -> Evogram {
        Evogram::builder("TEST_TOKEN")
            .api_url("http://127.0.0.1:9")
            .build()
    }

    #[test]
    fn test_appeal_prefers_username() {
        let client = offline_client();
        let with_username = UserContext::new(client.clone(), user(Some("ada"), Some("Lovelace")));
        assert_eq!(with_username.appeal(), "@ada");

        let without = UserContext::new(client, user(None, Some("Lovelace")));
        assert_eq!(without.appeal(), "Ada Lovelace");
        assert_eq!(without.full_name(), "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_member_requires_chat() {
        let user = UserContext::new(offline_client(), user(None, None));
        assert!(user.member().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_member_is_fetched_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/getChatMember")
            .match_body(Matcher::Json(json!({ "chat_id": -100, "user_id": 5 })))
            .with_body(
                json!({
                    "ok": true,
                    "result": {
                        "status": "member",
                        "user": { "id": 5, "is_bot": false, "first_name": "Ada" }
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let client = Evogram::builder("TEST_TOKEN").api_url(server.url()).build();
        let user = UserContext::in_chat(client, user(None, None), -100);

        let first = user.member().await.unwrap().unwrap();
        let second = user.member().await.unwrap().unwrap();
        assert_eq!(first.status(), "member");
        assert_eq!(second.status(), "member");
        mock.assert_async().await;
    }
}
