// System
use std::sync::Arc;
use std::time::Duration;

// Third Party
use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use tracing::{error, info};

// Local
use crate::error::{ConfigError, DeliveryError};
use crate::events::NotificationResult;

/// Upper bound on a single webhook request, including connect and response.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);
const USERNAME: &str = "k8s-pod-monitor";
const ICON: &str = ":robot_face:";

/// Delivers one text message somewhere. Failures are reported, never raised.
#[async_trait]
pub trait Notify: Send + Sync {
    async fn send(&self, message: &str) -> NotificationResult;
}

#[async_trait]
impl<T: Notify + ?Sized> Notify for Arc<T> {
    async fn send(&self, message: &str) -> NotificationResult {
        (**self).send(message).await
    }
}

#[derive(Serialize)]
struct SlackPayload<'a> {
    text: &'a str,
    username: &'a str,
    #[serde(rename = "icon_emoji")]
    icon: &'a str,
}

/// Posts messages to a Slack incoming webhook. One attempt per message, no retries.
pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: Url,
}

impl SlackNotifier {
    pub fn new(webhook_url: Url) -> Result<Self, ConfigError> {
        Self::with_timeout(webhook_url, DELIVERY_TIMEOUT)
    }

    pub fn with_timeout(webhook_url: Url, timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(Self {
            client,
            webhook_url,
        })
    }

    async fn post(&self, message: &str) -> Result<(), DeliveryError> {
        let payload = SlackPayload {
            text: message,
            username: USERNAME,
            icon: ICON,
        };
        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(DeliveryError::Transport)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DeliveryError::Status(status))
        }
    }
}

#[async_trait]
impl Notify for SlackNotifier {
    async fn send(&self, message: &str) -> NotificationResult {
        match self.post(message).await {
            Ok(()) => {
                info!("Slack message sent successfully: {}", message);
                NotificationResult::delivered()
            }
            Err(error) => {
                error!("Failed to send Slack message: {}", error);
                NotificationResult::failed()
            }
        }
    }
}
