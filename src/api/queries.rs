use serde::Serialize;

use super::Api;
use crate::error::Result;
use crate::types::{InlineQueryResult, ShippingOption};

#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackQueryParams {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Show an alert instead of a notification at the top of the chat.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_alert: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_time: Option<u32>,
}

impl AnswerCallbackQueryParams {
    pub fn new(callback_query_id: impl Into<String>) -> Self {
        Self {
            callback_query_id: callback_query_id.into(),
            text: None,
            show_alert: None,
            url: None,
            cache_time: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerInlineQueryParams {
    pub inline_query_id: String,
    pub results: Vec<InlineQueryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_personal: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<String>,
}

impl AnswerInlineQueryParams {
    pub fn new(inline_query_id: impl Into<String>, results: Vec<InlineQueryResult>) -> Self {
        Self {
            inline_query_id: inline_query_id.into(),
            results,
            cache_time: None,
            is_personal: None,
            next_offset: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerShippingQueryParams {
    pub shipping_query_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_options: Option<Vec<ShippingOption>>,
    /// Required when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AnswerShippingQueryParams {
    pub fn accept(shipping_query_id: impl Into<String>, options: Vec<ShippingOption>) -> Self {
        Self {
            shipping_query_id: shipping_query_id.into(),
            ok: true,
            shipping_options: Some(options),
            error_message: None,
        }
    }

    pub fn reject(shipping_query_id: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            shipping_query_id: shipping_query_id.into(),
            ok: false,
            shipping_options: None,
            error_message: Some(error_message.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerPreCheckoutQueryParams {
    pub pre_checkout_query_id: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AnswerPreCheckoutQueryParams {
    pub fn accept(pre_checkout_query_id: impl Into<String>) -> Self {
        Self {
            pre_checkout_query_id: pre_checkout_query_id.into(),
            ok: true,
            error_message: None,
        }
    }

    pub fn reject(
        pre_checkout_query_id: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            pre_checkout_query_id: pre_checkout_query_id.into(),
            ok: false,
            error_message: Some(error_message.into()),
        }
    }
}

impl Api {
    pub async fn answer_callback_query(&self, params: &AnswerCallbackQueryParams) -> Result<bool> {
        self.call("answerCallbackQuery", Some(params)).await
    }

    pub async fn answer_inline_query(&self, params: &AnswerInlineQueryParams) -> Result<bool> {
        self.call("answerInlineQuery", Some(params)).await
    }

    pub async fn answer_shipping_query(&self, params: &AnswerShippingQueryParams) -> Result<bool> {
        self.call("answerShippingQuery", Some(params)).await
    }

    pub async fn answer_pre_checkout_query(
        &self,
        params: &AnswerPreCheckoutQueryParams,
    ) -> Result<bool> {
        self.call("answerPreCheckoutQuery", Some(params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_rejected_shipping_query_has_no_options() {
        let params = AnswerShippingQueryParams::reject("sq-1", "We don't ship there");
        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            json!({
                "shipping_query_id": "sq-1",
                "ok": false,
                "error_message": "We don't ship there"
            })
        );
    }

    #[tokio::test]
    async fn test_answer_inline_query_sends_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/answerInlineQuery")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({ "inline_query_id": "iq" })),
                Matcher::Regex(r#""type":"article""#.to_string()),
                Matcher::Regex(r#""title":"Echo""#.to_string()),
            ]))
            .with_body(json!({ "ok": true, "result": true }).to_string())
            .create_async()
            .await;

        let api = Api::new(reqwest::Client::new(), server.url(), "TEST_TOKEN");
        let params = AnswerInlineQueryParams::new(
            "iq",
            vec![InlineQueryResult::article("1", "Echo", "echo")],
        );
        assert!(api.answer_inline_query(&params).await.unwrap());
        mock.assert_async().await;
    }
}
