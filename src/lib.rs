//! Telegram Bot API client with typed methods, long-poll and webhook update
//! delivery, and context wrappers that let handlers act on what they receive.
//!
//! ```no_run
//! use evogram::contexts::MessageContext;
//! use evogram::transports::{EventTransport, PollingOptions};
//! use evogram::Evogram;
//!
//! # async fn run() -> evogram::Result<()> {
//! let client = Evogram::new("123456:TOKEN");
//! client.updates().on_message(|message: MessageContext| async move {
//!     message.reply("pong").await?;
//!     anyhow::Ok(())
//! });
//! client.updates().polling().start(PollingOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod contexts;
pub mod error;
pub mod transports;
pub mod types;
pub mod update;
pub mod updates;

pub use client::{Evogram, EvogramBuilder};
pub use error::{Error, Result, TelegramError};
pub use update::{Update, UpdateKind, UpdateType};
