// src/services/notifier.rs

//! Notification transport and message formatting.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::Posting;
use crate::utils::report;

/// Delivers messages to a recipient.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a preformatted message.
    async fn send(&self, recipient: &str, text: &str) -> Result<()>;

    /// Announce a newly discovered posting.
    async fn notify_posting(&self, recipient: &str, posting: &Posting) -> Result<()> {
        self.send(recipient, &format_posting_message(posting)).await
    }
}

/// Format a posting into a multi-line announcement.
pub fn format_posting_message(posting: &Posting) -> String {
    let mut message = String::from("New Intern Position Found!\n\n");
    message.push_str(&format!("Company: {}\n", posting.company));
    message.push_str(&format!("Title: {}\n", posting.title));
    if let Some(location) = posting.location.as_deref().filter(|l| !l.is_empty()) {
        message.push_str(&format!("Location: {}\n", location));
    }
    message.push_str(&format!("Apply: {}\n", posting.url));
    message
}

/// Format the message sent when a run found nothing new.
pub fn format_no_news_message(
    sources_checked: usize,
    postings_seen: usize,
    source_names: &[&str],
) -> String {
    format!(
        "Intern Job Tracker Update\n\nChecked {} sources\nFound {} job listings\nNo new positions found\n\nTracking: {}",
        sources_checked,
        postings_seen,
        report::name_list(source_names, 4)
    )
}

/// Posts messages to a chat webhook as `{"text": ...}`.
pub struct WebhookNotifier {
    webhook_url: String,
    client: Client,
}

impl WebhookNotifier {
    /// Create a notifier whose posts give up after `timeout`.
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            webhook_url: webhook_url.into(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, recipient: &str, text: &str) -> Result<()> {
        let body = if recipient.is_empty() {
            serde_json::json!({ "text": text })
        } else {
            serde_json::json!({ "text": text, "channel": recipient })
        };

        self.client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::notify(format!("webhook post failed: {e}")))?
            .error_for_status()
            .map_err(|e| AppError::notify(format!("webhook rejected message: {e}")))?;
        Ok(())
    }
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, text: &str) -> Result<()> {
        let to = if recipient.is_empty() { "-" } else { recipient };
        log::info!("[notify -> {}]\n{}", to, text);
        Ok(())
    }
}
