mod bot;
mod checker;
mod config;
mod telegram;
mod wa;

use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::prelude::*;

use bot::BotState;
use checker::{BatchVerifier, PresenceCache};
use config::Config;
use telegram::TelegramClient;
use wa::{WaBridge, spawn_session_supervisor};

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "nomorbot.json".to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_dir = config.data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).ok();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("nomorbot.log"))
        .expect("Failed to open log file");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(
                    tracing_subscriber::EnvFilter::from_default_env()
                        .add_directive(tracing::Level::INFO.into()),
                ),
        )
        .init();

    info!("🚀 Starting nomorbot...");
    info!("Loaded config from {config_path}");
    info!("Bridge: {}", config.bridge_url);

    let bot = Bot::new(&config.telegram_bot_token);
    let telegram = Arc::new(TelegramClient::new(bot.clone()));

    let bridge = Arc::new(WaBridge::new(config.bridge_url.clone()));
    spawn_session_supervisor(bridge.clone(), Duration::from_secs(config.session_poll_secs));

    let verifier = BatchVerifier::new(
        bridge.clone(),
        Arc::new(PresenceCache::new()),
        config.max_batch_size,
        Duration::from_millis(config.check_delay_ms),
    );

    let state = Arc::new(BotState {
        telegram,
        bridge,
        verifier,
    });

    let handler = Update::filter_message().endpoint(bot::handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
