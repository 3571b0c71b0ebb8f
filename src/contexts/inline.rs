use super::{simple_context, Context, LocationContext, MessageContext, UserContext};
use crate::api::{AnswerCallbackQueryParams, AnswerInlineQueryParams};
use crate::client::Evogram;
use crate::error::Result;
use crate::types::{CallbackQuery, ChatType, ChosenInlineResult, InlineQuery, InlineQueryResult};

/// A press on an inline keyboard button.
pub struct CallbackQueryContext {
    client: Evogram,
    source: CallbackQuery,
}

simple_context!(CallbackQueryContext, CallbackQuery);

impl CallbackQueryContext {
    pub fn id(&self) -> &str {
        &self.source.id
    }

    pub fn data(&self) -> Option<&str> {
        self.source.data.as_deref()
    }

    pub fn user(&self) -> UserContext {
        match &self.source.message {
            Some(message) => {
                UserContext::in_chat(self.client.clone(), self.source.from.clone(), message.chat.id)
            }
            None => UserContext::new(self.client.clone(), self.source.from.clone()),
        }
    }

    /// The message carrying the button; absent for inline-mode messages.
    pub fn message(&self) -> Option<MessageContext> {
        self.source
            .message
            .clone()
            .map(|message| MessageContext::new(self.client.clone(), message))
    }

    pub fn inline_message_id(&self) -> Option<&str> {
        self.source.inline_message_id.as_deref()
    }

    pub fn chat_instance(&self) -> &str {
        &self.source.chat_instance
    }

    pub fn game_short_name(&self) -> Option<&str> {
        self.source.game_short_name.as_deref()
    }

    /// Stops the client-side loading indicator without showing anything.
    pub async fn answer(&self) -> Result<bool> {
        self.answer_with(|_| {}).await
    }

    /// Shows `text` as a notification, or as an alert when `show_alert` is set.
    pub async fn notify(&self, text: &str, show_alert: bool) -> Result<bool> {
        self.answer_with(|params| {
            params.text = Some(text.to_string());
            params.show_alert = Some(show_alert);
        })
        .await
    }

    pub async fn answer_with<F>(&self, customize: F) -> Result<bool>
    where
        F: FnOnce(&mut AnswerCallbackQueryParams),
    {
        let mut params = AnswerCallbackQueryParams::new(self.source.id.clone());
        customize(&mut params);
        self.client.api().answer_callback_query(&params).await
    }
}

pub struct InlineQueryContext {
    client: Evogram,
    source: InlineQuery,
}

simple_context!(InlineQueryContext, InlineQuery);

impl InlineQueryContext {
    pub fn id(&self) -> &str {
        &self.source.id
    }

    pub fn query(&self) -> &str {
        &self.source.query
    }

    pub fn offset(&self) -> &str {
        &self.source.offset
    }

    pub fn chat_type(&self) -> Option<ChatType> {
        self.source.chat_type
    }

    pub fn user(&self) -> UserContext {
        UserContext::new(self.client.clone(), self.source.from.clone())
    }

    /// Sender location, only for bots that request it.
    pub fn location(&self) -> Option<LocationContext> {
        self.source
            .location
            .map(|location| LocationContext::new(self.client.clone(), location))
    }

    pub async fn answer(&self, results: Vec<InlineQueryResult>) -> Result<bool> {
        self.answer_with(results, |_| {}).await
    }

    pub async fn answer_with<F>(&self, results: Vec<InlineQueryResult>, customize: F) -> Result<bool>
    where
        F: FnOnce(&mut AnswerInlineQueryParams),
    {
        let mut params = AnswerInlineQueryParams::new(self.source.id.clone(), results);
        customize(&mut params);
        self.client.api().answer_inline_query(&params).await
    }
}

/// An inline result the user picked. Results cannot be answered, only
/// inspected; the message can be edited through `inline_message_id`.
pub struct ChosenInlineResultContext {
    client: Evogram,
    source: ChosenInlineResult,
}

simple_context!(ChosenInlineResultContext, ChosenInlineResult);

impl ChosenInlineResultContext {
    pub fn id(&self) -> &str {
        &self.source.result_id
    }

    pub fn query(&self) -> &str {
        &self.source.query
    }

    pub fn inline_message_id(&self) -> Option<&str> {
        self.source.inline_message_id.as_deref()
    }

    pub fn user(&self) -> UserContext {
        UserContext::new(self.client.clone(), self.source.from.clone())
    }

    pub fn location(&self) -> Option<LocationContext> {
        self.source
            .location
            .map(|location| LocationContext::new(self.client.clone(), location))
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

    fn callback_json() -> serde_json::Value {
        json!({
            "id": "cb-1",
            "from": { "id": 7, "is_bot": false, "first_name": "Ada" },
            "chat_instance": "ci",
            "data": "vote:yes",
            "message": {
                "message_id": 10,
                "date": 1700000000,
                "chat": { "id": 42, "type": "private", "first_name": "Ada" },
                "text": "Vote?"
            }
        })
    }

    #[tokio::test]
    async fn test_callback_exposes_message_and_chat_bound_user() {
        let server = mockito::Server::new_async().await;
        let query = CallbackQueryContext::from_value(client(&server), callback_json()).unwrap();

        assert_eq!(query.data(), Some("vote:yes"));
        assert_eq!(query.message().unwrap().id(), 10);
        assert_eq!(
            query.user().chat_id().map(ToString::to_string).as_deref(),
            Some("42")
        );
    }

    #[tokio::test]
    async fn test_notify_sends_alert() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/answerCallbackQuery")
            .match_body(Matcher::Json(json!({
                "callback_query_id": "cb-1",
                "text": "Counted",
                "show_alert": true
            })))
            .with_body(json!({ "ok": true, "result": true }).to_string())
            .create_async()
            .await;

        let query = CallbackQueryContext::from_value(client(&server), callback_json()).unwrap();
        assert!(query.notify("Counted", true).await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_inline_answer_uses_query_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/answerInlineQuery")
            .match_body(Matcher::PartialJson(json!({
                "inline_query_id": "iq-1",
                "cache_time": 0
            })))
            .with_body(json!({ "ok": true, "result": true }).to_string())
            .create_async()
            .await;

        let query = InlineQueryContext::from_value(
            client(&server),
            json!({
                "id": "iq-1",
                "from": { "id": 7, "is_bot": false, "first_name": "Ada" },
                "query": "cats",
                "offset": ""
            }),
        )
        .unwrap();

        let results = vec![InlineQueryResult::article("1", "Cat", "meow")];
        assert!(query
            .answer_with(results, |params| params.cache_time = Some(0))
            .await
            .unwrap());
        mock.assert_async().await;
    }
}
