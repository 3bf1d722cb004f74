//! WhatsApp bridge client: session state, QR relay, presence checks.
//!
//! Talks to a local whatsapp-web.js sidecar over HTTP. The bridge owns the
//! browser session and its persistence; this side mirrors the session state
//! and restarts the session with bounded backoff when it drops.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use tracing::{info, warn};

use crate::checker::batch::{CheckerError, PresenceChecker};

/// Backoff bounds for session restarts.
const RESTART_BACKOFF_MIN: Duration = Duration::from_secs(1);
const RESTART_BACKOFF_MAX: Duration = Duration::from_secs(60);

/// Where the login session currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Bridge starting up or browser session booting.
    Connecting,
    /// Login QR issued; payload is the decoded PNG.
    QrPending(Vec<u8>),
    Ready,
    Disconnected,
}

#[derive(Deserialize)]
struct SessionResponse {
    state: String,
    qr: Option<String>,
}

#[derive(Deserialize)]
struct RegisteredResponse {
    registered: bool,
}

/// Client for the WhatsApp bridge sidecar.
pub struct WaBridge {
    base_url: String,
    client: reqwest::Client,
    state: RwLock<SessionState>,
}

impl WaBridge {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            state: RwLock::new(SessionState::Connecting),
        }
    }

    /// The pending login QR image, if one is waiting to be scanned.
    pub fn qr_image(&self) -> Option<Vec<u8>> {
        match &*self.state.read().expect("session state lock poisoned") {
            SessionState::QrPending(png) => Some(png.clone()),
            _ => None,
        }
    }

    async fn fetch_session(&self) -> Result<SessionState, String> {
        let url = format!("{}/session", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("HTTP error: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Bridge error {status}"));
        }

        let parsed: SessionResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse session response: {e}"))?;

        parse_session(parsed)
    }

    async fn restart_session(&self) -> Result<(), String> {
        let url = format!("{}/session/start", self.base_url);
        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|e| format!("HTTP error: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("Bridge error {}", response.status()));
        }
        Ok(())
    }

    fn set_state(&self, next: SessionState) {
        let mut state = self.state.write().expect("session state lock poisoned");
        if *state != next {
            match next {
                SessionState::QrPending(_) => info!("✅ New login QR issued"),
                SessionState::Ready => info!("✅ WhatsApp session ready"),
                SessionState::Disconnected => warn!("⚠️ WhatsApp session disconnected"),
                SessionState::Connecting => {}
            }
            *state = next;
        }
    }
}

fn parse_session(response: SessionResponse) -> Result<SessionState, String> {
    match response.state.as_str() {
        "ready" => Ok(SessionState::Ready),
        "disconnected" => Ok(SessionState::Disconnected),
        "qr" => {
            let encoded = response.qr.ok_or("QR state without payload")?;
            let png = base64::engine::general_purpose::STANDARD
                .decode(encoded.as_bytes())
                .map_err(|e| format!("Failed to decode QR: {e}"))?;
            Ok(SessionState::QrPending(png))
        }
        other => Err(format!("Unknown session state: {other}")),
    }
}

/// Poll the bridge and keep the mirrored session state current.
///
/// On disconnect the session is restarted with exponential backoff, bounded
/// at `RESTART_BACKOFF_MAX`; the backoff resets once the session recovers.
pub fn spawn_session_supervisor(bridge: Arc<WaBridge>, poll_interval: Duration) {
    tokio::spawn(async move {
        let mut backoff = RESTART_BACKOFF_MIN;
        let mut interval = tokio::time::interval(poll_interval);
        loop {
            interval.tick().await;
            match bridge.fetch_session().await {
                Ok(SessionState::Disconnected) => {
                    bridge.set_state(SessionState::Disconnected);
                    warn!("⚠️ Restarting session in {backoff:?}");
                    tokio::time::sleep(backoff).await;
                    if let Err(e) = bridge.restart_session().await {
                        warn!("Session restart failed: {e}");
                    }
                    backoff = (backoff * 2).min(RESTART_BACKOFF_MAX);
                }
                Ok(state) => {
                    if state == SessionState::Ready {
                        backoff = RESTART_BACKOFF_MIN;
                    }
                    bridge.set_state(state);
                }
                Err(e) => {
                    warn!("Session poll failed: {e}");
                }
            }
        }
    });
}

#[async_trait]
impl PresenceChecker for WaBridge {
    fn is_ready(&self) -> bool {
        matches!(
            *self.state.read().expect("session state lock poisoned"),
            SessionState::Ready
        )
    }

    async fn is_registered(&self, number: &str) -> Result<bool, CheckerError> {
        let url = format!("{}/registered/{}", self.base_url, number);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CheckerError(format!("HTTP error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckerError(format!("Bridge error {status}")));
        }

        let parsed: RegisteredResponse = response
            .json()
            .await
            .map_err(|e| CheckerError(format!("Failed to parse check response: {e}")))?;

        Ok(parsed.registered)
    }
}
