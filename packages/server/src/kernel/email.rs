//! Email notifier adapters.
//!
//! `HttpEmailNotifier` posts to an HTTP mail API (the transactional-mail
//! provider is configured via EMAIL_API_URL/EMAIL_API_KEY); `NoopEmailNotifier`
//! stands in when no provider is configured.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error};

use super::traits::EmailNotifier;

pub struct HttpEmailNotifier {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl HttpEmailNotifier {
    pub fn new(api_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }
}

#[async_trait]
impl EmailNotifier for HttpEmailNotifier {
    async fn notify_new_message(&self, to: &str, sender_name: &str) -> Result<()> {
        debug!(to = %to, "Sending new-message email notification");

        let body = json!({
            "to": to,
            "subject": format!("{} sent you a message on Skillswap", sender_name),
            "template": "new_private_message",
            "variables": { "sender_name": sender_name },
        });

        let mut request = self
            .client
            .post(&self.api_url)
            .timeout(std::time::Duration::from_secs(10))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(error = %e, "Email API request failed");
            anyhow!("Email API request failed: {}", e)
        })?;

        if !response.status().is_success() {
            return Err(anyhow!("Email API returned {}", response.status()));
        }

        Ok(())
    }
}

/// No-op notifier used when EMAIL_API_URL is unset.
pub struct NoopEmailNotifier;

#[async_trait]
impl EmailNotifier for NoopEmailNotifier {
    async fn notify_new_message(&self, to: &str, _sender_name: &str) -> Result<()> {
        debug!(to = %to, "Email notifications disabled, skipping");
        Ok(())
    }
}
