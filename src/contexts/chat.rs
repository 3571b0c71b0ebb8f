use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::{simple_context, unix_time, Context, InChat, LocationContext, MessageContext, UserContext};
use crate::api::{
    CreateChatInviteLinkParams, EditChatInviteLinkParams, EditForumTopicParams, InviteLinkOptions,
    SetChatPhotoParams,
};
use crate::client::Evogram;
use crate::error::{Error, Result};
use crate::types::{
    Chat, ChatId, ChatInviteLink, ChatJoinRequest, ChatPermissions, ChatPhoto, ChatType, InputFile,
};

pub struct ChatContext {
    client: Evogram,
    source: Chat,
    detailed: OnceCell<Chat>,
}

impl Context for ChatContext {
    type Source = Chat;

    fn new(client: Evogram, source: Chat) -> Self {
        Self {
            client,
            source,
            detailed: OnceCell::new(),
        }
    }

    fn source(&self) -> &Chat {
        &self.source
    }

    fn client(&self) -> &Evogram {
        &self.client
    }
}

impl ChatContext {
    pub fn id(&self) -> i64 {
        self.source.id
    }

    pub fn chat_type(&self) -> ChatType {
        self.source.chat_type
    }

    /// Title, else `@`-less username, else the private chat's full name.
    pub fn title(&self) -> String {
        chat_title(&self.source)
    }

    pub fn is_forum(&self) -> bool {
        self.source.is_forum.unwrap_or(false)
    }

    fn chat_id(&self) -> ChatId {
        ChatId::Id(self.source.id)
    }

    pub async fn export_invite_link(&self) -> Result<String> {
        self.client.api().export_chat_invite_link(&self.chat_id()).await
    }

    pub async fn create_invite_link(&self, options: InviteLinkOptions) -> Result<ChatInviteLinkContext> {
        let params = CreateChatInviteLinkParams {
            chat_id: self.chat_id(),
            options,
        };
        let link = self.client.api().create_chat_invite_link(&params).await?;
        Ok(ChatInviteLinkContext::new(
            self.client.clone(),
            InChat::new(self.source.id, link),
        ))
    }

    pub async fn set_photo(&self, photo: InputFile) -> Result<bool> {
        self.client
            .api()
            .set_chat_photo(&SetChatPhotoParams::new(self.source.id, photo))
            .await
    }

    pub async fn set_title(&self, title: &str) -> Result<bool> {
        self.client.api().set_chat_title(&self.chat_id(), title).await
    }

    pub async fn set_description(&self, description: Option<&str>) -> Result<bool> {
        self.client
            .api()
            .set_chat_description(&self.chat_id(), description)
            .await
    }

    pub async fn leave(&self) -> Result<bool> {
        self.client.api().leave_chat(&self.chat_id()).await
    }

    /// Full chat information from `getChat`. Fetched on first use and kept
    /// for the lifetime of this wrapper.
    pub async fn detailed(&self) -> Result<DetailedChatContext> {
        let chat_id = self.chat_id();
        let chat = self
            .detailed
            .get_or_try_init(|| self.client.api().get_chat(&chat_id))
            .await?;
        Ok(DetailedChatContext::new(self.client.clone(), chat.clone()))
    }
}

fn chat_title(chat: &Chat) -> String {
    if let Some(title) = &chat.title {
        return title.clone();
    }
    if let Some(username) = &chat.username {
        return username.clone();
    }
    [chat.first_name.as_deref(), chat.last_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A chat as returned by `getChat`.
pub struct DetailedChatContext {
    client: Evogram,
    source: Chat,
}

simple_context!(DetailedChatContext, Chat);

impl DetailedChatContext {
    pub fn id(&self) -> i64 {
        self.source.id
    }

    pub fn title(&self) -> String {
        chat_title(&self.source)
    }

    pub fn chat(&self) -> ChatContext {
        ChatContext::new(self.client.clone(), self.source.clone())
    }

    pub fn photo(&self) -> Option<&ChatPhoto> {
        self.source.photo.as_ref()
    }

    pub fn pinned_message(&self) -> Option<MessageContext> {
        self.source
            .pinned_message
            .as_deref()
            .cloned()
            .map(|message| MessageContext::new(self.client.clone(), message))
    }

    pub fn permissions(&self) -> Option<&ChatPermissions> {
        self.source.permissions.as_ref()
    }

    pub fn location(&self) -> Option<LocationContext> {
        self.source
            .location
            .as_ref()
            .map(|chat_location| LocationContext::new(self.client.clone(), chat_location.location))
    }

    pub fn active_usernames(&self) -> &[String] {
        self.source.active_usernames.as_deref().unwrap_or_default()
    }

    /// Bio for private chats, description otherwise.
    pub fn description(&self) -> Option<&str> {
        self.source
            .bio
            .as_deref()
            .or(self.source.description.as_deref())
    }

    pub fn invite_link(&self) -> Option<&str> {
        self.source.invite_link.as_deref()
    }

    pub fn slow_mode_delay(&self) -> Option<u32> {
        self.source.slow_mode_delay
    }

    pub fn message_auto_delete_time(&self) -> Option<u32> {
        self.source.message_auto_delete_time
    }

    pub fn has_protected_content(&self) -> bool {
        self.source.has_protected_content.unwrap_or(false)
    }

    pub fn has_hidden_members(&self) -> bool {
        self.source.has_hidden_members.unwrap_or(false)
    }

    pub fn join_by_request(&self) -> bool {
        self.source.join_by_request.unwrap_or(false)
    }

    pub fn sticker_set_name(&self) -> Option<&str> {
        self.source.sticker_set_name.as_deref()
    }

    pub fn linked_chat_id(&self) -> Option<i64> {
        self.source.linked_chat_id
    }
}

pub struct ChatInviteLinkContext {
    client: Evogram,
    source: InChat<ChatInviteLink>,
}

simple_context!(ChatInviteLinkContext, InChat<ChatInviteLink>);

impl ChatInviteLinkContext {
    pub fn link(&self) -> &str {
        &self.source.entity.invite_link
    }

    pub fn creator(&self) -> UserContext {
        UserContext::new(self.client.clone(), self.source.entity.creator.clone())
    }

    pub fn name(&self) -> Option<&str> {
        self.source.entity.name.as_deref()
    }

    pub fn expire_date(&self) -> Option<DateTime<Utc>> {
        self.source.entity.expire_date.and_then(unix_time)
    }

    pub fn member_limit(&self) -> Option<u32> {
        self.source.entity.member_limit
    }

    pub fn creates_join_request(&self) -> bool {
        self.source.entity.creates_join_request
    }

    pub fn is_primary(&self) -> bool {
        self.source.entity.is_primary
    }

    pub fn is_revoked(&self) -> bool {
        self.source.entity.is_revoked
    }

    pub fn pending_join_request_count(&self) -> Option<u32> {
        self.source.entity.pending_join_request_count
    }

    pub async fn edit(&self, options: InviteLinkOptions) -> Result<ChatInviteLinkContext> {
        let mut params =
            EditChatInviteLinkParams::new(self.source.chat_id.clone(), self.link());
        params.options = options;
        let link = self.client.api().edit_chat_invite_link(&params).await?;
        Ok(Self::new(
            self.client.clone(),
            InChat::new(self.source.chat_id.clone(), link),
        ))
    }

    pub async fn revoke(&self) -> Result<ChatInviteLinkContext> {
        let link = self
            .client
            .api()
            .revoke_chat_invite_link(&self.source.chat_id, self.link())
            .await?;
        Ok(Self::new(
            self.client.clone(),
            InChat::new(self.source.chat_id.clone(), link),
        ))
    }
}

pub struct ChatJoinRequestContext {
    client: Evogram,
    source: ChatJoinRequest,
}

simple_context!(ChatJoinRequestContext, ChatJoinRequest);

impl ChatJoinRequestContext {
    pub fn chat(&self) -> ChatContext {
        ChatContext::new(self.client.clone(), self.source.chat.clone())
    }

    pub fn user(&self) -> UserContext {
        UserContext::in_chat(
            self.client.clone(),
            self.source.from.clone(),
            self.source.chat.id,
        )
    }

    pub fn link(&self) -> Option<ChatInviteLinkContext> {
        self.source.invite_link.clone().map(|link| {
            ChatInviteLinkContext::new(self.client.clone(), InChat::new(self.source.chat.id, link))
        })
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        unix_time(self.source.date)
    }

    /// Private chat with the applicant, usable for 5 minutes after the request.
    pub fn user_chat_id(&self) -> i64 {
        self.source.user_chat_id
    }

    pub fn bio(&self) -> Option<&str> {
        self.source.bio.as_deref()
    }

    pub async fn approve(&self) -> Result<bool> {
        self.client
            .api()
            .approve_chat_join_request(&ChatId::Id(self.source.chat.id), self.source.from.id)
            .await
    }

    pub async fn decline(&self) -> Result<bool> {
        self.client
            .api()
            .decline_chat_join_request(&ChatId::Id(self.source.chat.id), self.source.from.id)
            .await
    }
}

/// Service event a forum topic wrapper was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForumTopicUpdate {
    Created,
    Edited,
    Closed,
    Reopened,
    GeneralHidden,
    GeneralUnhidden,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumTopicSource {
    pub chat_id: ChatId,
    pub message_thread_id: Option<i64>,
    pub name: Option<String>,
    pub icon_color: Option<i64>,
    pub icon_custom_emoji_id: Option<String>,
    pub update: Option<ForumTopicUpdate>,
}

pub struct ForumTopicContext {
    client: Evogram,
    source: ForumTopicSource,
}

simple_context!(ForumTopicContext, ForumTopicSource);

impl ForumTopicContext {
    pub fn id(&self) -> Option<i64> {
        self.source.message_thread_id
    }

    pub fn name(&self) -> Option<&str> {
        self.source.name.as_deref()
    }

    pub fn icon_color(&self) -> Option<i64> {
        self.source.icon_color
    }

    pub fn icon_custom_emoji_id(&self) -> Option<&str> {
        self.source.icon_custom_emoji_id.as_deref()
    }

    pub fn update(&self) -> Option<ForumTopicUpdate> {
        self.source.update
    }

    /// Only the General-topic service events identify the General topic.
    pub fn is_general(&self) -> bool {
        matches!(
            self.source.update,
            Some(ForumTopicUpdate::GeneralHidden | ForumTopicUpdate::GeneralUnhidden)
        )
    }

    fn thread_id(&self) -> Result<i64> {
        self.source
            .message_thread_id
            .ok_or_else(|| Error::InvalidParams("forum topic has no message_thread_id".into()))
    }

    /// Renames the topic or changes its icon. The General topic only accepts
    /// a new name.
    pub async fn edit(&self, name: Option<&str>, icon_custom_emoji_id: Option<&str>) -> Result<bool> {
        let api = self.client.api();
        if self.is_general() {
            let name = name.ok_or_else(|| {
                Error::InvalidParams("the General topic can only be edited with a name".into())
            })?;
            return api.edit_general_forum_topic(&self.source.chat_id, name).await;
        }

        let mut params = EditForumTopicParams::new(self.source.chat_id.clone(), self.thread_id()?);
        params.name = name.map(str::to_string);
        params.icon_custom_emoji_id = icon_custom_emoji_id.map(str::to_string);
        api.edit_forum_topic(&params).await
    }

    pub async fn close(&self) -> Result<bool> {
        let api = self.client.api();
        if self.is_general() {
            api.close_general_forum_topic(&self.source.chat_id).await
        } else {
            api.close_forum_topic(&self.source.chat_id, self.thread_id()?)
                .await
        }
    }

    pub async fn reopen(&self) -> Result<bool> {
        let api = self.client.api();
        if self.is_general() {
            api.reopen_general_forum_topic(&self.source.chat_id).await
        } else {
            api.reopen_forum_topic(&self.source.chat_id, self.thread_id()?)
                .await
        }
    }

    /// Deletes the topic with all its messages. The General topic cannot be deleted.
    pub async fn delete(&self) -> Result<bool> {
        self.client
            .api()
            .delete_forum_topic(&self.source.chat_id, self.thread_id()?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client(server: &mockito::Server) -> Evogram {
        Evogram::builder("TEST_TOKEN").api_url(server.url()).build()
    }

    fn topic(update: Option<ForumTopicUpdate>) -> ForumTopicSource {
        ForumTopicSource {
            chat_id: ChatId::Id(-100),
            message_thread_id: Some(12),
            name: None,
            icon_color: None,
            icon_custom_emoji_id: None,
            update,
        }
    }

    #[tokio::test]
    async fn test_title_falls_back_to_names() {
        let server = mockito::Server::new_async().await;
        let chat = ChatContext::from_value(
            client(&server),
            json!({ "id": 1, "type": "private", "first_name": "Ada", "last_name": "Lovelace" }),
        )
        .unwrap();
        assert_eq!(chat.title(), "Ada Lovelace");
        assert!(!chat.is_forum());
    }

    #[tokio::test]
    async fn test_detailed_chat_is_fetched_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/getChat")
            .match_body(Matcher::Json(json!({ "chat_id": -100 })))
            .with_body(
                json!({
                    "ok": true,
                    "result": {
                        "id": -100,
                        "type": "supergroup",
                        "title": "Club",
                        "description": "A club",
                        "slow_mode_delay": 10
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let chat = ChatContext::from_value(
            client(&server),
            json!({ "id": -100, "type": "supergroup", "title": "Club" }),
        )
        .unwrap();

        let first = chat.detailed().await.unwrap();
        let second = chat.detailed().await.unwrap();
        assert_eq!(first.description(), Some("A club"));
        assert_eq!(second.slow_mode_delay(), Some(10));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_general_topic_uses_general_methods() {
        let mut server = mockito::Server::new_async().await;
        let general = server
            .mock("POST", "/botTEST_TOKEN/closeGeneralForumTopic")
            .match_body(Matcher::Json(json!({ "chat_id": -100 })))
            .with_body(json!({ "ok": true, "result": true }).to_string())
            .create_async()
            .await;
        let regular = server
            .mock("POST", "/botTEST_TOKEN/closeForumTopic")
            .match_body(Matcher::Json(json!({ "chat_id": -100, "message_thread_id": 12 })))
            .with_body(json!({ "ok": true, "result": true }).to_string())
            .create_async()
            .await;

        let client = client(&server);
        let hidden = ForumTopicContext::new(
            client.clone(),
            topic(Some(ForumTopicUpdate::GeneralHidden)),
        );
        assert!(hidden.is_general());
        assert!(hidden.close().await.unwrap());

        let created = ForumTopicContext::new(client, topic(Some(ForumTopicUpdate::Created)));
        assert!(created.close().await.unwrap());

        general.assert_async().await;
        regular.assert_async().await;
    }

    #[tokio::test]
    async fn test_general_topic_edit_requires_name() {
        let server = mockito::Server::new_async().await;
        let hidden = ForumTopicContext::new(
            client(&server),
            topic(Some(ForumTopicUpdate::GeneralUnhidden)),
        );
        let err = hidden.edit(None, Some("emoji")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
    }
}
