//! Message handling: commands, QR relay, and batch runs.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use tracing::{debug, info};

use crate::checker::batch::{BatchError, BatchSink, BatchVerifier};
use crate::checker::report::progress_text;
use crate::telegram::TelegramClient;
use crate::wa::WaBridge;

const WELCOME: &str =
    "Selamat Datang kaum Rebahan - Send Nomor Lu Bot Akan Memproses max50";
const QR_CAPTION: &str = "📱 Scan QR untuk login WhatsApp.";
const QR_UNAVAILABLE: &str = "✅ WhatsApp sudah terhubung / QR belum tersedia.";
const NO_NUMBERS: &str = "⚠️ Kirim daftar nomor, satu per baris.";

pub struct BotState {
    pub telegram: Arc<TelegramClient>,
    pub bridge: Arc<WaBridge>,
    pub verifier: BatchVerifier<WaBridge>,
}

/// Sends one progress message and edits it in place as the batch advances.
pub struct TelegramBatchSink {
    telegram: Arc<TelegramClient>,
    chat_id: i64,
    progress_id: Option<i64>,
}

impl TelegramBatchSink {
    pub fn new(telegram: Arc<TelegramClient>, chat_id: i64) -> Self {
        Self {
            telegram,
            chat_id,
            progress_id: None,
        }
    }
}

#[async_trait]
impl BatchSink for TelegramBatchSink {
    async fn progress(&mut self, checked: usize, total: usize) {
        let text = progress_text(checked, total);
        match self.progress_id {
            None => {
                self.progress_id = self.telegram.send_message(self.chat_id, &text).await.ok();
            }
            Some(id) => {
                // Awaited before the next check starts, so edits stay ordered
                self.telegram.edit_message(self.chat_id, id, &text).await.ok();
            }
        }
    }

    async fn report(&mut self, text: &str) {
        self.telegram.send_html(self.chat_id, text).await.ok();
    }
}

pub async fn handle_message(msg: Message, state: Arc<BotState>) -> ResponseResult<()> {
    let chat_id = msg.chat.id.0;

    let Some(text) = msg.text().map(str::trim) else {
        return Ok(());
    };
    if text.is_empty() {
        return Ok(());
    }

    let username = msg
        .from
        .as_ref()
        .and_then(|u| u.username.as_deref())
        .unwrap_or("unknown");
    let preview: String = text.chars().take(50).collect();
    info!("📨 {} ({}): \"{}\"", username, chat_id, preview);

    if text == "/start" {
        state.telegram.send_message(chat_id, WELCOME).await.ok();
        return Ok(());
    }

    if text.eq_ignore_ascii_case("qr") {
        match state.bridge.qr_image() {
            Some(png) => {
                state
                    .telegram
                    .send_image(chat_id, png, Some(QR_CAPTION))
                    .await
                    .ok();
            }
            None => {
                state.telegram.send_message(chat_id, QR_UNAVAILABLE).await.ok();
            }
        }
        return Ok(());
    }

    // Anything else is a newline-delimited number list
    run_batch(&state, chat_id, text).await;
    Ok(())
}

async fn run_batch(state: &BotState, chat_id: i64, text: &str) {
    let mut sink = TelegramBatchSink::new(state.telegram.clone(), chat_id);
    match state.verifier.process_batch(text, &mut sink).await {
        Ok(()) => {}
        Err(BatchError::NoValidNumbers) => {
            state.telegram.send_message(chat_id, NO_NUMBERS).await.ok();
        }
        Err(BatchError::BatchTooLarge(count)) => {
            let reply = format!(
                "⚠️ Maksimal {} nomor per request! Anda mengirim {count} nomor.",
                state.verifier.max_batch_size()
            );
            state.telegram.send_message(chat_id, &reply).await.ok();
        }
        Err(BatchError::CheckerNotReady) => {
            // Fail quiet: no reply while the session is still logging in
            debug!("Batch from chat {chat_id} dropped: checker not ready");
        }
    }
}
