use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extra information the Bot API attaches to some failed requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrate_to_chat_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// The Bot API answered with `ok: false`.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{code}: {description}")]
pub struct TelegramError {
    code: i64,
    description: String,
    parameters: Option<ResponseParameters>,
    method: String,
    payload: Option<Value>,
}

impl TelegramError {
    pub fn new(
        code: i64,
        description: impl Into<String>,
        parameters: Option<ResponseParameters>,
        method: impl Into<String>,
        payload: Option<Value>,
    ) -> Self {
        Self {
            code,
            description: description.into(),
            parameters,
            method: method.into(),
            payload,
        }
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn params(&self) -> Option<&ResponseParameters> {
        self.parameters.as_ref()
    }

    /// Seconds to wait before repeating the request, for flood-control errors.
    pub fn retry_after(&self) -> Option<u64> {
        self.parameters.as_ref().and_then(|p| p.retry_after)
    }

    /// Name of the method that failed.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Parameters that were sent with the failed call, if any.
    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Telegram(#[from] TelegramError),

    #[error("HTTP request for `{method}` failed")]
    Http {
        method: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode response of `{method}`")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode parameters for `{method}`")]
    Encode {
        method: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid webhook URL `{0}`")]
    InvalidWebhookUrl(String),

    #[error("failed to bind webhook listener on port {port}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build `{context}` from update payload")]
    ContextDecode {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    #[error("the client owning this transport has been dropped")]
    ClientDropped,

    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl Error {
    /// Returns the Bot API error if this failure came from an `ok: false` response.
    pub fn as_telegram(&self) -> Option<&TelegramError> {
        match self {
            Error::Telegram(e) => Some(e),
            _ => None,
        }
    }

    /// This error's message followed by each underlying cause, `: `-separated.
    pub fn report(&self) -> String {
        let mut report = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            report.push_str(": ");
            report.push_str(&cause.to_string());
            source = cause.source();
        }
        report
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
