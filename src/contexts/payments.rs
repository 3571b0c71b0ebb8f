use super::{simple_context, Context, UserContext};
use crate::api::{AnswerPreCheckoutQueryParams, AnswerShippingQueryParams};
use crate::client::Evogram;
use crate::error::Result;
use crate::types::{OrderInfo, PreCheckoutQuery, ShippingAddress, ShippingOption, ShippingQuery};

pub struct ShippingQueryContext {
    client: Evogram,
    source: ShippingQuery,
}

simple_context!(ShippingQueryContext, ShippingQuery);

impl ShippingQueryContext {
    pub fn id(&self) -> &str {
        &self.source.id
    }

    pub fn user(&self) -> UserContext {
        UserContext::new(self.client.clone(), self.source.from.clone())
    }

    pub fn payload(&self) -> &str {
        &self.source.invoice_payload
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.source.shipping_address
    }

    pub async fn accept(&self, options: Vec<ShippingOption>) -> Result<bool> {
        self.answer(&AnswerShippingQueryParams::accept(self.source.id.clone(), options))
            .await
    }

    pub async fn reject(&self, error_message: &str) -> Result<bool> {
        self.answer(&AnswerShippingQueryParams::reject(
            self.source.id.clone(),
            error_message,
        ))
        .await
    }

    async fn answer(&self, params: &AnswerShippingQueryParams) -> Result<bool> {
        self.client.api().answer_shipping_query(params).await
    }
}

/// Final confirmation before the payment is charged. Must be answered
/// within ten seconds.
pub struct PreCheckoutQueryContext {
    client: Evogram,
    source: PreCheckoutQuery,
}

simple_context!(PreCheckoutQueryContext, PreCheckoutQuery);

impl PreCheckoutQueryContext {
    pub fn id(&self) -> &str {
        &self.source.id
    }

    pub fn user(&self) -> UserContext {
        UserContext::new(self.client.clone(), self.source.from.clone())
    }

    /// ISO 4217 currency code.
    pub fn currency(&self) -> &str {
        &self.source.currency
    }

    /// Total price in the smallest units of the currency.
    pub fn amount(&self) -> i64 {
        self.source.total_amount
    }

    pub fn payload(&self) -> &str {
        &self.source.invoice_payload
    }

    pub fn shipping_option_id(&self) -> Option<&str> {
        self.source.shipping_option_id.as_deref()
    }

    pub fn order_info(&self) -> Option<OrderInfoContext> {
        self.source
            .order_info
            .clone()
            .map(|info| OrderInfoContext::new(self.client.clone(), info))
    }

    pub async fn accept(&self) -> Result<bool> {
        self.client
            .api()
            .answer_pre_checkout_query(&AnswerPreCheckoutQueryParams::accept(self.source.id.clone()))
            .await
    }

    pub async fn reject(&self, error_message: &str) -> Result<bool> {
        self.client
            .api()
            .answer_pre_checkout_query(&AnswerPreCheckoutQueryParams::reject(
                self.source.id.clone(),
                error_message,
            ))
            .await
    }
}

pub struct OrderInfoContext {
    client: Evogram,
    source: OrderInfo,
}

simple_context!(OrderInfoContext, OrderInfo);

impl OrderInfoContext {
    pub fn name(&self) -> Option<&str> {
        self.source.name.as_deref()
    }

    pub fn phone_number(&self) -> Option<&str> {
        self.source.phone_number.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.source.email.as_deref()
    }

    pub fn shipping_address(&self) -> Option<&ShippingAddress> {
        self.source.shipping_address.as_ref()
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

    #[tokio::test]
    async fn test_shipping_reject_carries_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/answerShippingQuery")
            .match_body(Matcher::Json(json!({
                "shipping_query_id": "sq-1",
                "ok": false,
                "error_message": "We do not ship there"
            })))
            .with_body(json!({ "ok": true, "result": true }).to_string())
            .create_async()
            .await;

        let query = ShippingQueryContext::from_value(
            client(&server),
            json!({
                "id": "sq-1",
                "from": { "id": 7, "is_bot": false, "first_name": "Ada" },
                "invoice_payload": "order-9",
                "shipping_address": {
                    "country_code": "AQ",
                    "state": "",
                    "city": "McMurdo",
                    "street_line1": "Hut 1",
                    "street_line2": "",
                    "post_code": "0000"
                }
            }),
        )
        .unwrap();

        assert_eq!(query.shipping_address().city, "McMurdo");
        assert!(query.reject("We do not ship there").await.unwrap());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_pre_checkout_accept() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/answerPreCheckoutQuery")
            .match_body(Matcher::Json(json!({
                "pre_checkout_query_id": "pc-1",
                "ok": true
            })))
            .with_body(json!({ "ok": true, "result": true }).to_string())
            .create_async()
            .await;

        let query = PreCheckoutQueryContext::from_value(
            client(&server),
            json!({
                "id": "pc-1",
                "from": { "id": 7, "is_bot": false, "first_name": "Ada" },
                "currency": "EUR",
                "total_amount": 1250,
                "invoice_payload": "order-9",
                "order_info": { "email": "ada@example.com" }
            }),
        )
        .unwrap();

        assert_eq!(query.amount(), 1250);
        assert_eq!(
            query.order_info().unwrap().email(),
            Some("ada@example.com")
        );
        assert!(query.accept().await.unwrap());
        mock.assert_async().await;
    }
}
