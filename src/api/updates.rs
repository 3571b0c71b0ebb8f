use serde::Serialize;

use super::{Api, InputFiles};
use crate::error::Result;
use crate::types::{InputFile, WebhookInfo};
use crate::update::{Update, UpdateType};

#[derive(Debug, Clone, Default, Serialize)]
pub struct GetUpdatesParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Long-poll timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<UpdateType>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SetWebhookParams {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<InputFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connections: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_updates: Option<Vec<UpdateType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_pending_updates: Option<bool>,
    /// Echoed back in `X-Telegram-Bot-Api-Secret-Token` on every push.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<String>,
}

impl SetWebhookParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

impl InputFiles for SetWebhookParams {
    fn input_files(&self) -> Vec<(&'static str, &InputFile)> {
        self.certificate
            .iter()
            .map(|file| ("certificate", file))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeleteWebhookParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_pending_updates: Option<bool>,
}

impl Api {
    pub async fn get_updates(&self, params: &GetUpdatesParams) -> Result<Vec<Update>> {
        self.call("getUpdates", Some(params)).await
    }

    pub async fn set_webhook(&self, params: &SetWebhookParams) -> Result<bool> {
        self.upload("setWebhook", params).await
    }

    pub async fn delete_webhook(&self, params: &DeleteWebhookParams) -> Result<bool> {
        self.call("deleteWebhook", Some(params)).await
    }

    pub async fn get_webhook_info(&self) -> Result<WebhookInfo> {
        self.request("getWebhookInfo").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_updates_sends_cursor_and_filter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/getUpdates")
            .match_body(Matcher::Json(json!({
                "offset": 11,
                "timeout": 30,
                "allowed_updates": ["message", "callback_query"]
            })))
            .with_body(
                json!({
                    "ok": true,
                    "result": [
                        { "update_id": 11, "poll_answer": {
                            "poll_id": "p", "option_ids": [0],
                            "user": { "id": 1, "is_bot": false, "first_name": "Ann" }
                        } },
                        { "update_id": 12 }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let api = Api::new(reqwest::Client::new(), server.url(), "TEST_TOKEN");
        let params = GetUpdatesParams {
            offset: Some(11),
            timeout: Some(30),
            allowed_updates: Some(vec![UpdateType::Message, UpdateType::CallbackQuery]),
            ..Default::default()
        };
        let updates = api.get_updates(&params).await.unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].update_type(), Some(UpdateType::PollAnswer));
        assert_eq!(updates[1].update_type(), None);
        mock.assert_async().await;
    }

    #[test]
    fn test_set_webhook_skips_absent_fields() {
        let mut params = SetWebhookParams::new("https://bot.example.com/hook");
        params.secret_token = Some("s3cret".into());
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({ "url": "https://bot.example.com/hook", "secret_token": "s3cret" })
        );
        assert!(params.input_files().is_empty());
    }
}
