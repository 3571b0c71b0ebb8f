//! Update delivery: pull ([`Polling`]) and push ([`Webhook`]).
//!
//! Both feed [`Updates::dispatch`](crate::updates::Updates::dispatch) and
//! are owned by the client's [`Updates`](crate::updates::Updates).

mod polling;
mod webhook;

pub use polling::{Polling, PollingOptions};
pub use webhook::{Webhook, WebhookOptions, SECRET_TOKEN_HEADER};

use async_trait::async_trait;

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Disabled,
    Enabled,
}

#[async_trait]
pub trait EventTransport: Send + Sync {
    type Params: Send;

    /// Begins delivering updates. Starting an enabled transport does nothing.
    async fn start(&self, params: Self::Params) -> Result<()>;

    /// Stops accepting new work. Anything already in flight runs to completion.
    fn stop(&self);

    fn state(&self) -> TransportState;
}
