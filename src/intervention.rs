//! Emergency sentinel detection
//!
//! Only a committed reply is ever inspected. Matching against fragments as
//! they stream in would misfire whenever the sentinel is split across chunks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Reserved reply that asks for a human
pub const DEFAULT_SENTINEL: &str = "_HELP";

/// How the trimmed reply is compared to the sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// The whole reply is the sentinel
    #[default]
    Exact,
    /// The reply starts with the sentinel
    Prefix,
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(MatchPolicy::Exact),
            "prefix" => Ok(MatchPolicy::Prefix),
            other => Err(format!(
                "unknown sentinel policy '{other}' (expected 'exact' or 'prefix')"
            )),
        }
    }
}

/// Result of inspecting one committed turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterventionSignal {
    pub turn_index: usize,
    pub triggered: bool,
    pub detected_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct InterventionDetector {
    sentinel: String,
    policy: MatchPolicy,
}

impl Default for InterventionDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SENTINEL, MatchPolicy::Exact)
    }
}

impl InterventionDetector {
    pub fn new(sentinel: impl Into<String>, policy: MatchPolicy) -> Self {
        Self {
            sentinel: sentinel.into(),
            policy,
        }
    }

    pub fn inspect(&self, turn_index: usize, committed: &str) -> InterventionSignal {
        let content = committed.trim();
        let triggered = match self.policy {
            MatchPolicy::Exact => content == self.sentinel,
            MatchPolicy::Prefix => content.starts_with(self.sentinel.as_str()),
        };

        if triggered {
            tracing::error!(turn_index, sentinel = %self.sentinel, "Intervention sentinel detected");
        }

        InterventionSignal {
            turn_index,
            triggered,
            detected_at: Utc::now(),
        }
    }
}

// ============================================================================
// Notification
// ============================================================================

/// Receives triggered signals and alerts a human
#[async_trait]
pub trait InterventionNotifier: Send + Sync {
    async fn notify(&self, signal: &InterventionSignal) -> Result<(), String>;
}

#[async_trait]
impl<T: InterventionNotifier + ?Sized> InterventionNotifier for Arc<T> {
    async fn notify(&self, signal: &InterventionSignal) -> Result<(), String> {
        (**self).notify(signal).await
    }
}

/// Reports the signal on stderr and in the log
pub struct LogNotifier;

#[async_trait]
impl InterventionNotifier for LogNotifier {
    async fn notify(&self, signal: &InterventionSignal) -> Result<(), String> {
        tracing::error!(
            turn_index = signal.turn_index,
            detected_at = %signal.detected_at,
            "Intervention requested"
        );
        eprintln!("\n*** INTERVENTION REQUESTED: get someone to check on the user now ***");
        Ok(())
    }
}

/// POSTs the signal as JSON to a configured endpoint
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| format!("Failed to build webhook client: {e}"))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl InterventionNotifier for WebhookNotifier {
    async fn notify(&self, signal: &InterventionSignal) -> Result<(), String> {
        let response = self
            .client
            .post(&self.url)
            .json(signal)
            .send()
            .await
            .map_err(|e| format!("Webhook request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("Webhook returned {status}"));
        }
        tracing::info!(url = %self.url, turn_index = signal.turn_index, "Intervention webhook delivered");
        Ok(())
    }
}
