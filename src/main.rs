use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use evogram::config::Config;
use evogram::contexts::{CallbackQueryContext, MessageContext};
use evogram::transports::EventTransport;
use evogram::Evogram;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,evogram=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let client = Evogram::from_config(&config);
    let me = client.api().get_me().await.context("Failed to reach the Bot API")?;
    info!(
        "Running as @{}",
        me.username.as_deref().unwrap_or(me.first_name.as_str())
    );

    client
        .updates()
        .on_message(|message: MessageContext| async move {
            if let Some(text) = message.text() {
                message.reply(text).await?;
            }
            anyhow::Ok(())
        })
        .on_callback_query(|query: CallbackQueryContext| async move {
            query.notify(query.data().unwrap_or_default(), false).await?;
            anyhow::Ok(())
        });

    match &config.webhook {
        Some(webhook) => {
            client.updates().webhook().start(webhook.options()).await?;
        }
        None => {
            client
                .updates()
                .polling()
                .start(config.polling.options())
                .await?;
        }
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutting down...");

    client.updates().webhook().stop();
    client.updates().polling().stop();
    Ok(())
}
