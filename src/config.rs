// System
use std::time::Duration;

// Third Party
use clap::Parser;
use reqwest::Url;

// Local
use crate::error::ConfigError;
use crate::utils::MAX_WATCH_TIMEOUT_SECONDS;

/// Command line and environment settings for the operator.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "pod-monitor",
    about = "Watches pod lifecycle events in a namespace and posts them to a Slack webhook"
)]
pub struct OperatorArgs {
    #[arg(
        long,
        env = "SLACK_WEBHOOK_URL",
        hide_env_values = true,
        help = "Slack incoming webhook URL notifications are posted to"
    )]
    pub slack_webhook_url: Option<String>,

    #[arg(
        long,
        env = "NAMESPACE",
        default_value = "default",
        help = "Kubernetes namespace to watch"
    )]
    pub namespace: String,

    #[arg(
        long,
        env = "HEALTH_PORT",
        default_value_t = 8080,
        help = "Port the liveness endpoint listens on"
    )]
    pub health_port: u16,

    #[arg(
        long,
        env = "WATCH_TIMEOUT_SECONDS",
        default_value_t = 60,
        help = "Server-side timeout after which a watch session is reopened"
    )]
    pub watch_timeout_seconds: u32,

    #[arg(
        long,
        env = "WATCH_BACKOFF_SECONDS",
        default_value_t = 5,
        help = "Delay before reopening a watch session after an error"
    )]
    pub watch_backoff_seconds: u64,
}

/// Validated operator settings.
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    pub webhook_url: Url,
    pub namespace: String,
    pub health_port: u16,
    pub session_timeout: Duration,
    pub backoff: Duration,
}

impl OperatorConfig {
    pub fn health_addr(&self) -> String {
        format!("0.0.0.0:{}", self.health_port)
    }
}

impl OperatorArgs {
    pub fn into_config(self) -> Result<OperatorConfig, ConfigError> {
        let raw_url = self
            .slack_webhook_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::MissingWebhookUrl)?;
        let webhook_url = Url::parse(raw_url.trim()).map_err(|e| ConfigError::InvalidWebhookUrl {
            url: raw_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(webhook_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidWebhookUrl {
                url: raw_url,
                reason: format!("unsupported scheme `{}`", webhook_url.scheme()),
            });
        }

        if self.watch_timeout_seconds == 0
            || self.watch_timeout_seconds > MAX_WATCH_TIMEOUT_SECONDS
        {
            return Err(ConfigError::InvalidWatchTimeout {
                given: self.watch_timeout_seconds,
                max: MAX_WATCH_TIMEOUT_SECONDS,
            });
        }

        Ok(OperatorConfig {
            webhook_url,
            namespace: self.namespace,
            health_port: self.health_port,
            session_timeout: Duration::from_secs(u64::from(self.watch_timeout_seconds)),
            backoff: Duration::from_secs(self.watch_backoff_seconds),
        })
    }
}
