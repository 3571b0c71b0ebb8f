use serde::Serialize;

use super::Api;
use crate::error::Result;
use crate::types::{
    Chat, ChatAdministratorRights, ChatId, ChatInviteLink, ChatMember, ChatPermissions, ForumTopic,
};

/// Parameters of methods that only need the chat.
#[derive(Serialize)]
struct ChatRef<'a> {
    chat_id: &'a ChatId,
}

#[derive(Serialize)]
struct ChatUserRef<'a> {
    chat_id: &'a ChatId,
    user_id: i64,
}

#[derive(Serialize)]
struct SenderChatRef<'a> {
    chat_id: &'a ChatId,
    sender_chat_id: i64,
}

#[derive(Serialize)]
struct TopicRef<'a> {
    chat_id: &'a ChatId,
    message_thread_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BanChatMemberParams {
    pub chat_id: ChatId,
    pub user_id: i64,
    /// Unix time; bans shorter than 30 s or longer than 366 days are forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoke_messages: Option<bool>,
}

impl BanChatMemberParams {
    pub fn new(chat_id: impl Into<ChatId>, user_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            user_id,
            until_date: None,
            revoke_messages: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UnbanChatMemberParams {
    pub chat_id: ChatId,
    pub user_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_if_banned: Option<bool>,
}

impl UnbanChatMemberParams {
    pub fn new(chat_id: impl Into<ChatId>, user_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            user_id,
            only_if_banned: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RestrictChatMemberParams {
    pub chat_id: ChatId,
    pub user_id: i64,
    pub permissions: ChatPermissions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_independent_chat_permissions: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until_date: Option<i64>,
}

impl RestrictChatMemberParams {
    pub fn new(chat_id: impl Into<ChatId>, user_id: i64, permissions: ChatPermissions) -> Self {
        Self {
            chat_id: chat_id.into(),
            user_id,
            permissions,
            use_independent_chat_permissions: None,
            until_date: None,
        }
    }
}

/// Every right left unset is revoked, so `new` alone demotes the member.
#[derive(Debug, Clone, Serialize)]
pub struct PromoteChatMemberParams {
    pub chat_id: ChatId,
    pub user_id: i64,
    #[serde(flatten)]
    pub rights: ChatAdministratorRights,
}

impl PromoteChatMemberParams {
    pub fn new(chat_id: impl Into<ChatId>, user_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            user_id,
            rights: ChatAdministratorRights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SetChatPermissionsParams {
    pub chat_id: ChatId,
    pub permissions: ChatPermissions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_independent_chat_permissions: Option<bool>,
}

impl SetChatPermissionsParams {
    pub fn new(chat_id: impl Into<ChatId>, permissions: ChatPermissions) -> Self {
        Self {
            chat_id: chat_id.into(),
            permissions,
            use_independent_chat_permissions: None,
        }
    }
}

/// Options of `createChatInviteLink` and `editChatInviteLink`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct InviteLinkOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creates_join_request: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateChatInviteLinkParams {
    pub chat_id: ChatId,
    #[serde(flatten)]
    pub options: InviteLinkOptions,
}

impl CreateChatInviteLinkParams {
    pub fn new(chat_id: impl Into<ChatId>) -> Self {
        Self {
            chat_id: chat_id.into(),
            options: InviteLinkOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EditChatInviteLinkParams {
    pub chat_id: ChatId,
    pub invite_link: String,
    #[serde(flatten)]
    pub options: InviteLinkOptions,
}

impl EditChatInviteLinkParams {
    pub fn new(chat_id: impl Into<ChatId>, invite_link: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            invite_link: invite_link.into(),
            options: InviteLinkOptions::default(),
        }
    }
}

#[derive(Serialize)]
struct InviteLinkRef<'a> {
    chat_id: &'a ChatId,
    invite_link: &'a str,
}

#[derive(Serialize)]
struct CustomTitleParams<'a> {
    chat_id: &'a ChatId,
    user_id: i64,
    custom_title: &'a str,
}

#[derive(Serialize)]
struct TitleParams<'a> {
    chat_id: &'a ChatId,
    title: &'a str,
}

#[derive(Serialize)]
struct DescriptionParams<'a> {
    chat_id: &'a ChatId,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

#[derive(Serialize)]
struct StickerSetParams<'a> {
    chat_id: &'a ChatId,
    sticker_set_name: &'a str,
}

#[derive(Serialize)]
struct GeneralTopicNameParams<'a> {
    chat_id: &'a ChatId,
    name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateForumTopicParams {
    pub chat_id: ChatId,
    pub name: String,
    /// One of the six colors the Bot API accepts, as RGB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_custom_emoji_id: Option<String>,
}

impl CreateForumTopicParams {
    pub fn new(chat_id: impl Into<ChatId>, name: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            name: name.into(),
            icon_color: None,
            icon_custom_emoji_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EditForumTopicParams {
    pub chat_id: ChatId,
    pub message_thread_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_custom_emoji_id: Option<String>,
}

impl EditForumTopicParams {
    pub fn new(chat_id: impl Into<ChatId>, message_thread_id: i64) -> Self {
        Self {
            chat_id: chat_id.into(),
            message_thread_id,
            name: None,
            icon_custom_emoji_id: None,
        }
    }
}

impl Api {
    pub async fn ban_chat_member(&self, params: &BanChatMemberParams) -> Result<bool> {
        self.call("banChatMember", Some(params)).await
    }

    pub async fn unban_chat_member(&self, params: &UnbanChatMemberParams) -> Result<bool> {
        self.call("unbanChatMember", Some(params)).await
    }

    pub async fn restrict_chat_member(&self, params: &RestrictChatMemberParams) -> Result<bool> {
        self.call("restrictChatMember", Some(params)).await
    }

    pub async fn promote_chat_member(&self, params: &PromoteChatMemberParams) -> Result<bool> {
        self.call("promoteChatMember", Some(params)).await
    }

    pub async fn set_chat_administrator_custom_title(
        &self,
        chat_id: &ChatId,
        user_id: i64,
        custom_title: &str,
    ) -> Result<bool> {
        let params = CustomTitleParams {
            chat_id,
            user_id,
            custom_title,
        };
        self.call("setChatAdministratorCustomTitle", Some(&params))
            .await
    }

    pub async fn ban_chat_sender_chat(&self, chat_id: &ChatId, sender_chat_id: i64) -> Result<bool> {
        let params = SenderChatRef {
            chat_id,
            sender_chat_id,
        };
        self.call("banChatSenderChat", Some(&params)).await
    }

    pub async fn unban_chat_sender_chat(
        &self,
        chat_id: &ChatId,
        sender_chat_id: i64,
    ) -> Result<bool> {
        let params = SenderChatRef {
            chat_id,
            sender_chat_id,
        };
        self.call("unbanChatSenderChat", Some(&params)).await
    }

    pub async fn set_chat_permissions(&self, params: &SetChatPermissionsParams) -> Result<bool> {
        self.call("setChatPermissions", Some(params)).await
    }

    /// Replaces the primary invite link and returns the new one.
    pub async fn export_chat_invite_link(&self, chat_id: &ChatId) -> Result<String> {
        self.call("exportChatInviteLink", Some(&ChatRef { chat_id }))
            .await
    }

    pub async fn create_chat_invite_link(
        &self,
        params: &CreateChatInviteLinkParams,
    ) -> Result<ChatInviteLink> {
        self.call("createChatInviteLink", Some(params)).await
    }

    pub async fn edit_chat_invite_link(
        &self,
        params: &EditChatInviteLinkParams,
    ) -> Result<ChatInviteLink> {
        self.call("editChatInviteLink", Some(params)).await
    }

    pub async fn revoke_chat_invite_link(
        &self,
        chat_id: &ChatId,
        invite_link: &str,
    ) -> Result<ChatInviteLink> {
        let params = InviteLinkRef {
            chat_id,
            invite_link,
        };
        self.call("revokeChatInviteLink", Some(&params)).await
    }

    pub async fn approve_chat_join_request(&self, chat_id: &ChatId, user_id: i64) -> Result<bool> {
        self.call("approveChatJoinRequest", Some(&ChatUserRef { chat_id, user_id }))
            .await
    }

    pub async fn decline_chat_join_request(&self, chat_id: &ChatId, user_id: i64) -> Result<bool> {
        self.call("declineChatJoinRequest", Some(&ChatUserRef { chat_id, user_id }))
            .await
    }

    pub async fn delete_chat_photo(&self, chat_id: &ChatId) -> Result<bool> {
        self.call("deleteChatPhoto", Some(&ChatRef { chat_id })).await
    }

    pub async fn set_chat_title(&self, chat_id: &ChatId, title: &str) -> Result<bool> {
        self.call("setChatTitle", Some(&TitleParams { chat_id, title }))
            .await
    }

    /// Clears the description when `description` is `None`.
    pub async fn set_chat_description(
        &self,
        chat_id: &ChatId,
        description: Option<&str>,
    ) -> Result<bool> {
        let params = DescriptionParams {
            chat_id,
            description,
        };
        self.call("setChatDescription", Some(&params)).await
    }

    pub async fn leave_chat(&self, chat_id: &ChatId) -> Result<bool> {
        self.call("leaveChat", Some(&ChatRef { chat_id })).await
    }

    pub async fn get_chat(&self, chat_id: &ChatId) -> Result<Chat> {
        self.call("getChat", Some(&ChatRef { chat_id })).await
    }

    pub async fn get_chat_administrators(&self, chat_id: &ChatId) -> Result<Vec<ChatMember>> {
        self.call("getChatAdministrators", Some(&ChatRef { chat_id }))
            .await
    }

    pub async fn get_chat_member_count(&self, chat_id: &ChatId) -> Result<u32> {
        self.call("getChatMemberCount", Some(&ChatRef { chat_id }))
            .await
    }

    pub async fn get_chat_member(&self, chat_id: &ChatId, user_id: i64) -> Result<ChatMember> {
        self.call("getChatMember", Some(&ChatUserRef { chat_id, user_id }))
            .await
    }

    pub async fn set_chat_sticker_set(
        &self,
        chat_id: &ChatId,
        sticker_set_name: &str,
    ) -> Result<bool> {
        let params = StickerSetParams {
            chat_id,
            sticker_set_name,
        };
        self.call("setChatStickerSet", Some(&params)).await
    }

    pub async fn delete_chat_sticker_set(&self, chat_id: &ChatId) -> Result<bool> {
        self.call("deleteChatStickerSet", Some(&ChatRef { chat_id }))
            .await
    }

    pub async fn create_forum_topic(&self, params: &CreateForumTopicParams) -> Result<ForumTopic> {
        self.call("createForumTopic", Some(params)).await
    }

    pub async fn edit_forum_topic(&self, params: &EditForumTopicParams) -> Result<bool> {
        self.call("editForumTopic", Some(params)).await
    }

    pub async fn close_forum_topic(&self, chat_id: &ChatId, message_thread_id: i64) -> Result<bool> {
        let params = TopicRef {
            chat_id,
            message_thread_id,
        };
        self.call("closeForumTopic", Some(&params)).await
    }

    pub async fn reopen_forum_topic(&self, chat_id: &ChatId, message_thread_id: i64) -> Result<bool> {
        let params = TopicRef {
            chat_id,
            message_thread_id,
        };
        self.call("reopenForumTopic", Some(&params)).await
    }

    pub async fn delete_forum_topic(&self, chat_id: &ChatId, message_thread_id: i64) -> Result<bool> {
        let params = TopicRef {
            chat_id,
            message_thread_id,
        };
        self.call("deleteForumTopic", Some(&params)).await
    }

    pub async fn unpin_all_forum_topic_messages(
        &self,
        chat_id: &ChatId,
        message_thread_id: i64,
    ) -> Result<bool> {
        let params = TopicRef {
            chat_id,
            message_thread_id,
        };
        self.call("unpinAllForumTopicMessages", Some(&params)).await
    }

    pub async fn edit_general_forum_topic(&self, chat_id: &ChatId, name: &str) -> Result<bool> {
        let params = GeneralTopicNameParams { chat_id, name };
        self.call("editGeneralForumTopic", Some(&params)).await
    }

    pub async fn close_general_forum_topic(&self, chat_id: &ChatId) -> Result<bool> {
        self.call("closeGeneralForumTopic", Some(&ChatRef { chat_id }))
            .await
    }

    pub async fn reopen_general_forum_topic(&self, chat_id: &ChatId) -> Result<bool> {
        self.call("reopenGeneralForumTopic", Some(&ChatRef { chat_id }))
            .await
    }

    pub async fn hide_general_forum_topic(&self, chat_id: &ChatId) -> Result<bool> {
        self.call("hideGeneralForumTopic", Some(&ChatRef { chat_id }))
            .await
    }

    pub async fn unhide_general_forum_topic(&self, chat_id: &ChatId) -> Result<bool> {
        self.call("unhideGeneralForumTopic", Some(&ChatRef { chat_id }))
            .await
    }
}
