//! The update envelope and its discriminant.
//!
//! On the wire an update is an identifier plus at most one populated variant
//! field. Here it is a sum type: [`Update::kind`] holds exactly one variant,
//! picked as the first populated field in [`UpdateType::ALL`] order, so an
//! envelope that (against the Bot API contract) carries several variants still
//! resolves deterministically. The chosen field's JSON is kept verbatim next
//! to the typed variant, so nothing the Bot API sends is lost on the way to
//! handlers.

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::contexts::ContextKind;
use crate::types::{
    CallbackQuery, ChatJoinRequest, ChatMemberUpdated, ChosenInlineResult, InlineQuery, Message,
    Poll, PollAnswer, PreCheckoutQuery, ShippingQuery,
};

/// Name of the populated variant field, spelled as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateType {
    Message,
    EditedMessage,
    ChannelPost,
    EditedChannelPost,
    InlineQuery,
    ChosenInlineResult,
    CallbackQuery,
    ShippingQuery,
    PreCheckoutQuery,
    Poll,
    PollAnswer,
    MyChatMember,
    ChatMember,
    ChatJoinRequest,
}

impl UpdateType {
    /// Every discriminant, in the order fields are checked.
    pub const ALL: [UpdateType; 14] = [
        UpdateType::Message,
        UpdateType::EditedMessage,
        UpdateType::ChannelPost,
        UpdateType::EditedChannelPost,
        UpdateType::InlineQuery,
        UpdateType::ChosenInlineResult,
        UpdateType::CallbackQuery,
        UpdateType::ShippingQuery,
        UpdateType::PreCheckoutQuery,
        UpdateType::Poll,
        UpdateType::PollAnswer,
        UpdateType::MyChatMember,
        UpdateType::ChatMember,
        UpdateType::ChatJoinRequest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateType::Message => "message",
            UpdateType::EditedMessage => "edited_message",
            UpdateType::ChannelPost => "channel_post",
            UpdateType::EditedChannelPost => "edited_channel_post",
            UpdateType::InlineQuery => "inline_query",
            UpdateType::ChosenInlineResult => "chosen_inline_result",
            UpdateType::CallbackQuery => "callback_query",
            UpdateType::ShippingQuery => "shipping_query",
            UpdateType::PreCheckoutQuery => "pre_checkout_query",
            UpdateType::Poll => "poll",
            UpdateType::PollAnswer => "poll_answer",
            UpdateType::MyChatMember => "my_chat_member",
            UpdateType::ChatMember => "chat_member",
            UpdateType::ChatJoinRequest => "chat_join_request",
        }
    }

    /// The decoration applied to this variant's payload before it reaches handlers.
    pub fn context_kind(&self) -> ContextKind {
        match self {
            UpdateType::Message
            | UpdateType::EditedMessage
            | UpdateType::ChannelPost
            | UpdateType::EditedChannelPost => ContextKind::Message,
            UpdateType::InlineQuery => ContextKind::InlineQuery,
            UpdateType::ChosenInlineResult => ContextKind::ChosenInlineResult,
            UpdateType::CallbackQuery => ContextKind::CallbackQuery,
            UpdateType::ShippingQuery => ContextKind::ShippingQuery,
            UpdateType::PreCheckoutQuery => ContextKind::PreCheckoutQuery,
            UpdateType::Poll => ContextKind::Poll,
            UpdateType::PollAnswer => ContextKind::PollAnswer,
            UpdateType::MyChatMember | UpdateType::ChatMember => ContextKind::ChatMemberUpdated,
            UpdateType::ChatJoinRequest => ContextKind::ChatJoinRequest,
        }
    }
}

impl std::fmt::Display for UpdateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UpdateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpdateType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown update type: {}", s))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateKind {
    Message(Message),
    EditedMessage(Message),
    ChannelPost(Message),
    EditedChannelPost(Message),
    InlineQuery(InlineQuery),
    ChosenInlineResult(ChosenInlineResult),
    CallbackQuery(CallbackQuery),
    ShippingQuery(ShippingQuery),
    PreCheckoutQuery(PreCheckoutQuery),
    Poll(Poll),
    PollAnswer(PollAnswer),
    MyChatMember(ChatMemberUpdated),
    ChatMember(ChatMemberUpdated),
    ChatJoinRequest(ChatJoinRequest),
    /// No known variant field was populated.
    Unknown,
}

impl UpdateKind {
    pub fn update_type(&self) -> Option<UpdateType> {
        let update_type = match self {
            UpdateKind::Message(_) => UpdateType::Message,
            UpdateKind::EditedMessage(_) => UpdateType::EditedMessage,
            UpdateKind::ChannelPost(_) => UpdateType::ChannelPost,
            UpdateKind::EditedChannelPost(_) => UpdateType::EditedChannelPost,
            UpdateKind::InlineQuery(_) => UpdateType::InlineQuery,
            UpdateKind::ChosenInlineResult(_) => UpdateType::ChosenInlineResult,
            UpdateKind::CallbackQuery(_) => UpdateType::CallbackQuery,
            UpdateKind::ShippingQuery(_) => UpdateType::ShippingQuery,
            UpdateKind::PreCheckoutQuery(_) => UpdateType::PreCheckoutQuery,
            UpdateKind::Poll(_) => UpdateType::Poll,
            UpdateKind::PollAnswer(_) => UpdateType::PollAnswer,
            UpdateKind::MyChatMember(_) => UpdateType::MyChatMember,
            UpdateKind::ChatMember(_) => UpdateType::ChatMember,
            UpdateKind::ChatJoinRequest(_) => UpdateType::ChatJoinRequest,
            UpdateKind::Unknown => return None,
        };
        Some(update_type)
    }

    /// Re-encodes the typed variant. Fields this crate does not model are
    /// lost; [`Update::payload`] keeps them.
    pub fn to_value(&self) -> serde_json::Result<Value> {
        match self {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m) => serde_json::to_value(m),
            UpdateKind::InlineQuery(q) => serde_json::to_value(q),
            UpdateKind::ChosenInlineResult(r) => serde_json::to_value(r),
            UpdateKind::CallbackQuery(q) => serde_json::to_value(q),
            UpdateKind::ShippingQuery(q) => serde_json::to_value(q),
            UpdateKind::PreCheckoutQuery(q) => serde_json::to_value(q),
            UpdateKind::Poll(p) => serde_json::to_value(p),
            UpdateKind::PollAnswer(a) => serde_json::to_value(a),
            UpdateKind::MyChatMember(u) | UpdateKind::ChatMember(u) => serde_json::to_value(u),
            UpdateKind::ChatJoinRequest(r) => serde_json::to_value(r),
            UpdateKind::Unknown => Ok(Value::Null),
        }
    }

    fn decode(update_type: UpdateType, payload: Value) -> serde_json::Result<Self> {
        use serde_json::from_value;

        Ok(match update_type {
            UpdateType::Message => UpdateKind::Message(from_value(payload)?),
            UpdateType::EditedMessage => UpdateKind::EditedMessage(from_value(payload)?),
            UpdateType::ChannelPost => UpdateKind::ChannelPost(from_value(payload)?),
            UpdateType::EditedChannelPost => UpdateKind::EditedChannelPost(from_value(payload)?),
            UpdateType::InlineQuery => UpdateKind::InlineQuery(from_value(payload)?),
            UpdateType::ChosenInlineResult => UpdateKind::ChosenInlineResult(from_value(payload)?),
            UpdateType::CallbackQuery => UpdateKind::CallbackQuery(from_value(payload)?),
            UpdateType::ShippingQuery => UpdateKind::ShippingQuery(from_value(payload)?),
            UpdateType::PreCheckoutQuery => UpdateKind::PreCheckoutQuery(from_value(payload)?),
            UpdateType::Poll => UpdateKind::Poll(from_value(payload)?),
            UpdateType::PollAnswer => UpdateKind::PollAnswer(from_value(payload)?),
            UpdateType::MyChatMember => UpdateKind::MyChatMember(from_value(payload)?),
            UpdateType::ChatMember => UpdateKind::ChatMember(from_value(payload)?),
            UpdateType::ChatJoinRequest => UpdateKind::ChatJoinRequest(from_value(payload)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    /// Monotonically increasing identifier, used as the polling cursor.
    pub id: i64,
    pub kind: UpdateKind,
    /// The variant field exactly as received; `Null` for [`UpdateKind::Unknown`].
    payload: Value,
}

impl Update {
    /// Builds an update from a typed variant; its payload is the re-encoded variant.
    pub fn new(id: i64, kind: UpdateKind) -> serde_json::Result<Self> {
        let payload = kind.to_value()?;
        Ok(Self { id, kind, payload })
    }

    pub fn update_type(&self) -> Option<UpdateType> {
        self.kind.update_type()
    }

    /// The populated variant field as it arrived on the wire, unknown fields
    /// included. This is what context factories and raw handlers receive.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The message carried by any of the four message variants.
    pub fn message(&self) -> Option<&Message> {
        match &self.kind {
            UpdateKind::Message(m)
            | UpdateKind::EditedMessage(m)
            | UpdateKind::ChannelPost(m)
            | UpdateKind::EditedChannelPost(m) => Some(m),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Update {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = Map::<String, Value>::deserialize(deserializer)?;
        let id = match fields.get("update_id") {
            Some(id) => id
                .as_i64()
                .ok_or_else(|| D::Error::custom("update_id is not an integer"))?,
            None => return Err(D::Error::missing_field("update_id")),
        };

        // First populated field in ALL order wins; null counts as absent.
        for update_type in UpdateType::ALL {
            let payload = match fields.remove(update_type.as_str()) {
                Some(Value::Null) | None => continue,
                Some(payload) => payload,
            };
            let kind = UpdateKind::decode(update_type, payload.clone()).map_err(|e| {
                D::Error::custom(format_args!("invalid `{}` payload: {}", update_type, e))
            })?;
            return Ok(Update { id, kind, payload });
        }

        Ok(Update {
            id,
            kind: UpdateKind::Unknown,
            payload: Value::Null,
        })
    }
}

impl Serialize for Update {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let update_type = self.update_type();
        let mut map = serializer.serialize_map(Some(1 + usize::from(update_type.is_some())))?;
        map.serialize_entry("update_id", &self.id)?;
        if let Some(update_type) = update_type {
            map.serialize_entry(update_type.as_str(), &self.payload)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message_json(id: i64) -> Value {
        json!({
            "message_id": id,
            "chat": { "id": 42, "type": "private", "first_name": "Ann" },
            "date": 1700000000,
            "text": "hello"
        })
    }

    fn callback_json() -> Value {
        json!({
            "id": "cb-1",
            "from": { "id": 1, "is_bot": false, "first_name": "Ann" },
            "chat_instance": "ci",
            "data": "press"
        })
    }

    #[test]
    fn test_message_update_discriminant() {
        let update: Update =
            serde_json::from_value(json!({ "update_id": 10, "message": message_json(1) }))
                .unwrap();
        assert_eq!(update.id, 10);
        assert_eq!(update.update_type(), Some(UpdateType::Message));
        assert_eq!(update.message().map(|m| m.message_id), Some(1));
    }

    #[test]
    fn test_empty_update_has_no_discriminant() {
        let update: Update = serde_json::from_value(json!({ "update_id": 3 })).unwrap();
        assert_eq!(update.kind, UpdateKind::Unknown);
        assert_eq!(update.update_type(), None);
        assert!(update.payload().is_null());
    }

    #[test]
    fn test_unrecognised_variant_field_is_unknown() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 4,
            "message_reaction": { "anything": true }
        }))
        .unwrap();
        assert_eq!(update.update_type(), None);
    }

    #[test]
    fn test_multiple_variants_first_in_field_order_wins() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 5,
            "callback_query": callback_json(),
            "message": message_json(2)
        }))
        .unwrap();
        assert_eq!(update.update_type(), Some(UpdateType::Message));
    }

    #[test]
    fn test_chosen_inline_result_precedes_callback_query() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 6,
            "callback_query": callback_json(),
            "chosen_inline_result": {
                "result_id": "r",
                "from": { "id": 1, "is_bot": false, "first_name": "Ann" },
                "query": "q"
            }
        }))
        .unwrap();
        assert_eq!(update.update_type(), Some(UpdateType::ChosenInlineResult));
    }

    #[test]
    fn test_serialize_writes_single_variant_field() {
        let update: Update =
            serde_json::from_value(json!({ "update_id": 11, "callback_query": callback_json() }))
                .unwrap();
        let value = serde_json::to_value(&update).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["update_id"], json!(11));
        assert_eq!(object["callback_query"]["id"], json!("cb-1"));
    }

    #[test]
    fn test_payload_keeps_unmodelled_fields() {
        let mut message = message_json(7);
        message["link_preview_options"] = json!({ "is_disabled": true });
        let raw = json!({ "update_id": 12, "message": message.clone() });

        let update: Update = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(update.payload(), &message);
        assert_eq!(update.message().and_then(|m| m.text.as_deref()), Some("hello"));
        assert_eq!(serde_json::to_value(&update).unwrap(), raw);
    }

    #[test]
    fn test_null_variant_field_counts_as_absent() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 13,
            "message": null,
            "callback_query": callback_json()
        }))
        .unwrap();
        assert_eq!(update.update_type(), Some(UpdateType::CallbackQuery));
        assert_eq!(update.payload(), &callback_json());
    }

    #[test]
    fn test_envelope_errors() {
        assert!(serde_json::from_value::<Update>(json!({ "message": message_json(1) })).is_err());
        assert!(serde_json::from_value::<Update>(json!({
            "update_id": 1,
            "message": { "message_id": "not a number" }
        }))
        .is_err());
    }

    #[test]
    fn test_new_reencodes_typed_variant() {
        let message: Message = serde_json::from_value(message_json(3)).unwrap();
        let update = Update::new(20, UpdateKind::Message(message)).unwrap();
        assert_eq!(update.payload()["message_id"], json!(3));
        assert_eq!(update.update_type(), Some(UpdateType::Message));
    }

    #[test]
    fn test_update_type_wire_spelling() {
        for update_type in UpdateType::ALL {
            let encoded = serde_json::to_value(update_type).unwrap();
            assert_eq!(encoded, json!(update_type.as_str()));
            assert_eq!(update_type.as_str().parse::<UpdateType>(), Ok(update_type));
        }
        assert!("edited_poll".parse::<UpdateType>().is_err());
    }

    #[test]
    fn test_member_updates_share_a_context_kind() {
        assert_eq!(
            UpdateType::MyChatMember.context_kind(),
            UpdateType::ChatMember.context_kind()
        );
        assert_eq!(UpdateType::ChannelPost.context_kind(), ContextKind::Message);
    }
}
