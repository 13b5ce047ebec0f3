use crate::error::AlerterError;
use async_trait::async_trait;
use configuration::TelegramConfig;
use core_types::EnrichedBalance;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Serialize;

pub mod error;
pub mod format;

pub use format::{change_pct, format_daily_summary, format_error};

/// Outbound operator notifications.
///
/// Delivery failures are logged by the implementation and never returned:
/// a broken notification channel must not stop trading.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_error(&self, message: &str);

    /// `previous` is zero when no earlier day has been logged.
    async fn notify_daily_summary(
        &self,
        current: Decimal,
        previous: Decimal,
        balances: &[EnrichedBalance],
    );
}

/// Stand-in used when no notification channel is configured.
#[derive(Debug, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify_error(&self, message: &str) {
        tracing::debug!(message, "Notifications disabled; error not sent.");
    }

    async fn notify_daily_summary(&self, current: Decimal, _: Decimal, _: &[EnrichedBalance]) {
        tracing::debug!(%current, "Notifications disabled; daily summary not sent.");
    }
}

/// The JSON payload for the Telegram `sendMessage` endpoint.
#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str, // To allow for formatting like bold, italics etc.
}

/// A client for sending messages to the Telegram Bot API.
pub struct TelegramAlerter {
    client: Client,
    token: String,
    chat_id: String,
    balance_threshold: Decimal,
    quote_currency: String,
}

impl TelegramAlerter {
    /// Creates a new `TelegramAlerter`.
    ///
    /// Returns `None` if the token or chat_id is missing from the configuration,
    /// allowing the system to gracefully disable alerting. `balance_threshold`
    /// hides small holdings from the daily breakdown.
    pub fn new(config: &TelegramConfig, balance_threshold: Decimal, quote_currency: &str) -> Option<Self> {
        if config.token.is_empty() || config.chat_id.is_empty() {
            tracing::warn!("Telegram alerter is not configured (missing token or chat_id).");
            return None;
        }
        Some(Self {
            client: Client::new(),
            token: config.token.clone(),
            chat_id: config.chat_id.clone(),
            balance_threshold,
            quote_currency: quote_currency.to_string(),
        })
    }

    /// Sends a text message to the configured Telegram chat.
    pub async fn send_message(&self, message: &str) -> Result<(), AlerterError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);

        let payload = SendMessagePayload {
            chat_id: &self.chat_id,
            text: message,
            parse_mode: "MarkdownV2", // Use Markdown for rich formatting
        };

        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(AlerterError::ApiError(error_text));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramAlerter {
    async fn notify_error(&self, message: &str) {
        if let Err(e) = self.send_message(&format_error(message)).await {
            tracing::error!(error = %e, "Failed to send Telegram error notification.");
        }
    }

    async fn notify_daily_summary(
        &self,
        current: Decimal,
        previous: Decimal,
        balances: &[EnrichedBalance],
    ) {
        let text = format_daily_summary(
            current,
            previous,
            balances,
            self.balance_threshold,
            &self.quote_currency,
        );
        match self.send_message(&text).await {
            Ok(()) => tracing::info!("Daily summary sent."),
            Err(e) => tracing::error!(error = %e, "Failed to send Telegram daily summary."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_chat_id_disables_telegram() {
        let config = TelegramConfig { token: "123:abc".into(), chat_id: String::new() };
        assert!(TelegramAlerter::new(&config, Decimal::ZERO, "USDT").is_none());
    }

    #[tokio::test]
    async fn disabled_notifier_accepts_everything() {
        let notifier = DisabledNotifier;
        notifier.notify_error("boom").await;
        notifier.notify_daily_summary(Decimal::ONE, Decimal::ZERO, &[]).await;
    }
}
