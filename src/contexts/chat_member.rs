use chrono::{DateTime, Utc};

use super::{simple_context, unix_time, ChatContext, ChatInviteLinkContext, Context, InChat, UserContext};
use crate::api::{
    BanChatMemberParams, PromoteChatMemberParams, RestrictChatMemberParams, UnbanChatMemberParams,
};
use crate::client::Evogram;
use crate::error::{Error, Result};
use crate::types::{
    ChatAdministratorRights, ChatMember, ChatMemberUpdated, ChatPermissions,
};

/// A change of someone's membership, from `my_chat_member` or `chat_member`.
pub struct ChatMemberUpdatedContext {
    client: Evogram,
    source: ChatMemberUpdated,
}

simple_context!(ChatMemberUpdatedContext, ChatMemberUpdated);

impl ChatMemberUpdatedContext {
    pub fn chat(&self) -> ChatContext {
        ChatContext::new(self.client.clone(), self.source.chat.clone())
    }

    /// Who performed the change.
    pub fn user(&self) -> UserContext {
        UserContext::in_chat(
            self.client.clone(),
            self.source.from.clone(),
            self.source.chat.id,
        )
    }

    pub fn date(&self) -> Option<DateTime<Utc>> {
        unix_time(self.source.date)
    }

    pub fn link(&self) -> Option<ChatInviteLinkContext> {
        self.source.invite_link.clone().map(|link| {
            ChatInviteLinkContext::new(self.client.clone(), InChat::new(self.source.chat.id, link))
        })
    }

    pub fn old_chat_member(&self) -> ChatMemberContext {
        self.member(&self.source.old_chat_member)
    }

    pub fn new_chat_member(&self) -> ChatMemberContext {
        self.member(&self.source.new_chat_member)
    }

    fn member(&self, member: &ChatMember) -> ChatMemberContext {
        ChatMemberContext::new(
            self.client.clone(),
            InChat::new(self.source.chat.id, member.clone()),
        )
    }
}

/// Membership of one user in one chat. Which actions make sense depends on
/// the status; the Bot API rejects the rest.
pub struct ChatMemberContext {
    client: Evogram,
    source: InChat<ChatMember>,
}

simple_context!(ChatMemberContext, InChat<ChatMember>);

impl ChatMemberContext {
    pub fn member(&self) -> &ChatMember {
        &self.source.entity
    }

    pub fn user(&self) -> UserContext {
        UserContext::in_chat(
            self.client.clone(),
            self.source.entity.user().clone(),
            self.source.chat_id.clone(),
        )
    }

    pub fn status(&self) -> &'static str {
        self.source.entity.status()
    }

    pub fn is_owner(&self) -> bool {
        matches!(self.source.entity, ChatMember::Owner(_))
    }

    pub fn is_administrator(&self) -> bool {
        matches!(
            self.source.entity,
            ChatMember::Owner(_) | ChatMember::Administrator(_)
        )
    }

    /// Whether the user is currently in the chat, restricted members included.
    pub fn is_member(&self) -> bool {
        match &self.source.entity {
            ChatMember::Owner(_) | ChatMember::Administrator(_) | ChatMember::Member(_) => true,
            ChatMember::Restricted(restricted) => restricted.is_member,
            ChatMember::Left(_) | ChatMember::Banned(_) => false,
        }
    }

    pub fn is_banned(&self) -> bool {
        matches!(self.source.entity, ChatMember::Banned(_))
    }

    pub fn custom_title(&self) -> Option<&str> {
        match &self.source.entity {
            ChatMember::Owner(owner) => owner.custom_title.as_deref(),
            ChatMember::Administrator(admin) => admin.custom_title.as_deref(),
            _ => None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        match &self.source.entity {
            ChatMember::Owner(owner) => owner.is_anonymous,
            ChatMember::Administrator(admin) => admin.rights.is_anonymous,
            _ => false,
        }
    }

    pub fn rights(&self) -> Option<&ChatAdministratorRights> {
        match &self.source.entity {
            ChatMember::Administrator(admin) => Some(&admin.rights),
            _ => None,
        }
    }

    pub fn permissions(&self) -> Option<&ChatPermissions> {
        match &self.source.entity {
            ChatMember::Restricted(restricted) => Some(&restricted.permissions),
            _ => None,
        }
    }

    /// End of a restriction or ban; `None` when it is permanent or absent.
    pub fn until_date(&self) -> Option<DateTime<Utc>> {
        let until = match &self.source.entity {
            ChatMember::Restricted(restricted) => restricted.until_date,
            ChatMember::Banned(banned) => banned.until_date,
            _ => return None,
        };
        if until == 0 {
            None
        } else {
            unix_time(until)
        }
    }

    fn user_id(&self) -> i64 {
        self.source.entity.user().id
    }

    pub async fn ban(&self, until_date: Option<i64>, revoke_messages: bool) -> Result<bool> {
        let mut params = BanChatMemberParams::new(self.source.chat_id.clone(), self.user_id());
        params.until_date = until_date;
        params.revoke_messages = Some(revoke_messages);
        self.client.api().ban_chat_member(&params).await
    }

    pub async fn ban_sender_chat(&self) -> Result<bool> {
        self.client
            .api()
            .ban_chat_sender_chat(&self.source.chat_id, self.user_id())
            .await
    }

    pub async fn unban(&self) -> Result<bool> {
        let mut params = UnbanChatMemberParams::new(self.source.chat_id.clone(), self.user_id());
        params.only_if_banned = Some(true);
        self.client.api().unban_chat_member(&params).await
    }

    pub async fn restrict(&self, permissions: ChatPermissions, until_date: Option<i64>) -> Result<bool> {
        let mut params =
            RestrictChatMemberParams::new(self.source.chat_id.clone(), self.user_id(), permissions);
        params.until_date = until_date;
        self.client.api().restrict_chat_member(&params).await
    }

    pub async fn promote(&self, rights: ChatAdministratorRights) -> Result<bool> {
        let mut params = PromoteChatMemberParams::new(self.source.chat_id.clone(), self.user_id());
        params.rights = rights;
        self.client.api().promote_chat_member(&params).await
    }

    /// Revokes every administrator right.
    pub async fn demote(&self) -> Result<bool> {
        self.promote(ChatAdministratorRights {
            can_post_messages: Some(false),
            can_edit_messages: Some(false),
            can_pin_messages: Some(false),
            can_manage_topics: Some(false),
            ..ChatAdministratorRights::default()
        })
        .await
    }

    pub async fn set_custom_title(&self, custom_title: &str) -> Result<bool> {
        if !matches!(self.source.entity, ChatMember::Administrator(_)) {
            return Err(Error::InvalidParams(
                "custom titles can only be set for administrators".into(),
            ));
        }
        self.client
            .api()
            .set_chat_administrator_custom_title(&self.source.chat_id, self.user_id(), custom_title)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn update_json() -> serde_json::Value {
        json!({
            "chat": { "id": -100, "type": "supergroup", "title": "Club" },
            "from": { "id": 1, "is_bot": false, "first_name": "Owner" },
            "date": 1700000000,
            "old_chat_member": {
                "status": "member",
                "user": { "id": 5, "is_bot": false, "first_name": "Eve" }
            },
            "new_chat_member": {
                "status": "restricted",
                "user": { "id": 5, "is_bot": false, "first_name": "Eve" },
                "is_member": true,
                "can_send_messages": false,
                "until_date": 0
            }
        })
    }

    fn client(server: &mockito::Server) -> Evogram {
        Evogram::builder("TEST_TOKEN").api_url(server.url()).build()
    }

    #[tokio::test]
    async fn test_members_carry_the_chat() {
        let server = mockito::Server::new_async().await;
        let update = ChatMemberUpdatedContext::from_value(client(&server), update_json()).unwrap();

        let old = update.old_chat_member();
        let new = update.new_chat_member();
        assert_eq!(old.status(), "member");
        assert_eq!(new.status(), "restricted");
        assert!(new.is_member());
        assert!(new.until_date().is_none());
        assert_eq!(
            new.permissions().and_then(|p| p.can_send_messages),
            Some(false)
        );
        assert_eq!(update.chat().title(), "Club");
    }

    #[tokio::test]
    async fn test_ban_targets_member_in_chat() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/banChatMember")
            .match_body(Matcher::Json(json!({
                "chat_id": -100,
                "user_id": 5,
                "revoke_messages": true
            })))
            .with_body(json!({ "ok": true, "result": true }).to_string())
            .create_async()
            .await;

        let update = ChatMemberUpdatedContext::from_value(client(&server), update_json()).unwrap();
        assert!(update.new_chat_member().ban(None, true).await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_demote_revokes_every_right() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/promoteChatMember")
            .match_body(Matcher::PartialJson(json!({
                "chat_id": -100,
                "user_id": 5,
                "is_anonymous": false,
                "can_manage_chat": false,
                "can_pin_messages": false,
                "can_manage_topics": false
            })))
            .with_body(json!({ "ok": true, "result": true }).to_string())
            .create_async()
            .await;

        let update = ChatMemberUpdatedContext::from_value(client(&server), update_json()).unwrap();
        assert!(update.old_chat_member().demote().await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_custom_title_needs_administrator() {
        let server = mockito::Server::new_async().await;
        let update = ChatMemberUpdatedContext::from_value(client(&server), update_json()).unwrap();
        let err = update
            .old_chat_member()
            .set_custom_title("Chief")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParams(_)));
    }
}
