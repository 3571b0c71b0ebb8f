//! Bot API transport and the typed method surface.
//!
//! Every method goes through [`Api::call`]: a JSON `POST` to
//! `<api_url>/bot<token>/<method>` whose `{ ok, result, ... }` envelope is
//! unwrapped into either the decoded result or a [`TelegramError`]. Methods
//! that can carry a file body go through [`Api::upload`] instead, which
//! switches to `multipart/form-data` when an in-memory file is present.

mod bot;
mod chats;
mod media;
mod messages;
mod queries;
mod updates;

pub use bot::*;
pub use chats::*;
pub use media::*;
pub use messages::*;
pub use queries::*;
pub use updates::*;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, ResponseParameters, Result, TelegramError};
use crate::types::InputFile;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Parameter structs that may carry files list them here so that
/// [`Api::upload`] can move in-memory ones into multipart parts.
pub trait InputFiles {
    fn input_files(&self) -> Vec<(&'static str, &InputFile)>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    result: Option<Value>,
    error_code: Option<i64>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Clone)]
pub struct Api {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl Api {
    pub fn new(http: reqwest::Client, api_url: impl Into<String>, token: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            api_url,
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Invokes `method` with JSON parameters and decodes its `result`.
    pub async fn call<P, R>(&self, method: &str, params: Option<&P>) -> Result<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = params
            .map(serde_json::to_value)
            .transpose()
            .map_err(|source| Error::Encode {
                method: method.to_string(),
                source,
            })?;

        debug!("Calling Bot API method {}", method);

        let mut request = self.http.post(self.endpoint(method));
        if let Some(body) = &payload {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|source| Error::Http {
            method: method.to_string(),
            source,
        })?;

        self.read_response(method, response, payload).await
    }

    /// Invokes a method that takes no parameters.
    pub async fn request<R: DeserializeOwned>(&self, method: &str) -> Result<R> {
        self.call::<Value, R>(method, None).await
    }

    /// Like [`Api::call`], but sends `multipart/form-data` when `params`
    /// holds at least one [`InputFile::Memory`].
    pub async fn upload<P, R>(&self, method: &str, params: &P) -> Result<R>
    where
        P: Serialize + InputFiles,
        R: DeserializeOwned,
    {
        let files: Vec<_> = params
            .input_files()
            .into_iter()
            .filter(|(_, file)| file.is_upload())
            .collect();
        if files.is_empty() {
            return self.call(method, Some(params)).await;
        }

        let payload = serde_json::to_value(params).map_err(|source| Error::Encode {
            method: method.to_string(),
            source,
        })?;

        let mut form = Form::new();
        if let Value::Object(fields) = &payload {
            for (key, value) in fields {
                if files.iter().any(|(name, _)| name == key) {
                    continue;
                }
                let text = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                form = form.text(key.clone(), text);
            }
        }
        for (name, file) in files {
            if let InputFile::Memory { file_name, data } = file {
                form = form.part(name, Part::bytes(data.clone()).file_name(file_name.clone()));
            }
        }

        debug!("Uploading to Bot API method {}", method);

        let response = self
            .http
            .post(self.endpoint(method))
            .multipart(form)
            .send()
            .await
            .map_err(|source| Error::Http {
                method: method.to_string(),
                source,
            })?;

        self.read_response(method, response, Some(payload)).await
    }

    async fn read_response<R: DeserializeOwned>(
        &self,
        method: &str,
        response: reqwest::Response,
        payload: Option<Value>,
    ) -> Result<R> {
        let body = response.bytes().await.map_err(|source| Error::Http {
            method: method.to_string(),
            source,
        })?;
        let envelope: ApiResponse =
            serde_json::from_slice(&body).map_err(|source| Error::Decode {
                method: method.to_string(),
                source,
            })?;

        if !envelope.ok {
            let error = TelegramError::new(
                envelope.error_code.unwrap_or_default(),
                envelope.description.unwrap_or_default(),
                envelope.parameters,
                method,
                payload,
            );
            debug!("Bot API method {} failed: {}", method, error);
            return Err(error.into());
        }

        serde_json::from_value(envelope.result.unwrap_or(Value::Null)).map_err(|source| {
            Error::Decode {
                method: method.to_string(),
                source,
            }
        })
    }
}

impl std::fmt::Debug for Api {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Api")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatId, Message, User};
    use mockito::Matcher;
    use serde_json::json;

    fn api(server: &mockito::Server) -> Api {
        Api::new(reqwest::Client::new(), server.url(), "TEST_TOKEN")
    }

    #[tokio::test]
    async fn test_call_decodes_result() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/getMe")
            .with_body(
                json!({
                    "ok": true,
                    "result": { "id": 1, "is_bot": true, "first_name": "Evo", "username": "evo_bot" }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let me: User = api(&server).request("getMe").await.unwrap();
        assert_eq!(me.id, 1);
        assert_eq!(me.username.as_deref(), Some("evo_bot"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_call_sends_json_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/sendMessage")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({ "chat_id": 42, "text": "hi" })))
            .with_body(
                json!({
                    "ok": true,
                    "result": {
                        "message_id": 7,
                        "chat": { "id": 42, "type": "private" },
                        "date": 1700000000,
                        "text": "hi"
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let params = SendMessageParams::new(ChatId::Id(42), "hi");
        let message: Message = api(&server)
            .call("sendMessage", Some(&params))
            .await
            .unwrap();
        assert_eq!(message.message_id, 7);
        assert_eq!(message.chat.id, 42);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_sees_params_as_encoded() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/botTEST_TOKEN/sendMessage")
            .with_body_from_request(|request| {
                let params: Value = serde_json::from_slice(request.body().unwrap()).unwrap();
                json!({ "ok": true, "result": params }).to_string().into_bytes()
            })
            .create_async()
            .await;

        let mut params = SendMessageParams::new(ChatId::Id(42), "*hi*");
        params.parse_mode = Some("MarkdownV2".to_string());
        params.options.reply_to_message_id = Some(3);
        let echoed: Value = api(&server)
            .call("sendMessage", Some(&params))
            .await
            .unwrap();

        assert_eq!(
            echoed,
            json!({
                "chat_id": 42,
                "text": "*hi*",
                "parse_mode": "MarkdownV2",
                "reply_to_message_id": 3
            })
        );
        assert!(echoed.get("entities").is_none());
        assert!(echoed.get("disable_web_page_preview").is_none());
        assert!(echoed.get("options").is_none());
    }

    #[tokio::test]
    async fn test_error_envelope_becomes_telegram_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/botTEST_TOKEN/sendMessage")
            .with_status(429)
            .with_body(
                json!({
                    "ok": false,
                    "error_code": 429,
                    "description": "Too Many Requests: retry after 5",
                    "parameters": { "retry_after": 5 }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let params = json!({ "chat_id": 1, "text": "x" });
        let err = api(&server)
            .call::<_, Value>("sendMessage", Some(&params))
            .await
            .unwrap_err();

        let telegram = err.as_telegram().expect("telegram error");
        assert_eq!(telegram.code(), 429);
        assert_eq!(telegram.retry_after(), Some(5));
        assert_eq!(telegram.method(), "sendMessage");
        assert_eq!(telegram.payload(), Some(&params));
    }

    #[tokio::test]
    async fn test_undecodable_body_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/botTEST_TOKEN/getMe")
            .with_status(502)
            .with_body("<html>Bad Gateway</html>")
            .create_async()
            .await;

        let err = api(&server).request::<Value>("getMe").await.unwrap_err();
        assert!(matches!(err, Error::Decode { ref method, .. } if method == "getMe"));
    }

    #[tokio::test]
    async fn test_upload_without_memory_file_uses_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/sendPhoto")
            .match_body(Matcher::Json(json!({ "chat_id": 5, "photo": "AgACfileid" })))
            .with_body(json!({ "ok": true, "result": true }).to_string())
            .create_async()
            .await;

        let params = SendPhotoParams::new(ChatId::Id(5), InputFile::file_id("AgACfileid"));
        let ok: bool = api(&server).upload("sendPhoto", &params).await.unwrap();
        assert!(ok);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_with_memory_file_uses_multipart() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/botTEST_TOKEN/sendDocument")
            .match_header(
                "content-type",
                Matcher::Regex("^multipart/form-data".to_string()),
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex(r#"name="chat_id""#.to_string()),
                Matcher::Regex(r#"filename="notes.txt""#.to_string()),
                Matcher::Regex("file body".to_string()),
                Matcher::Regex(r#"name="disable_notification""#.to_string()),
            ]))
            .with_body(json!({ "ok": true, "result": true }).to_string())
            .create_async()
            .await;

        let mut params = SendDocumentParams::new(
            ChatId::Id(5),
            InputFile::memory("notes.txt", b"file body".to_vec()),
        );
        params.options.disable_notification = Some(true);
        let ok: bool = api(&server).upload("sendDocument", &params).await.unwrap();
        assert!(ok);
        mock.assert_async().await;
    }

    #[test]
    fn test_debug_hides_token() {
        let api = Api::new(reqwest::Client::new(), "https://api.telegram.org/", "SECRET");
        let printed = format!("{:?}", api);
        assert!(!printed.contains("SECRET"));
        assert_eq!(api.api_url(), "https://api.telegram.org");
    }
}
