// Third Party
use kube::error::ErrorResponse;
use thiserror::Error;

/// Problems found while assembling the operator. All of these abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SLACK_WEBHOOK_URL environment variable is required")]
    MissingWebhookUrl,
    #[error("invalid webhook URL `{url}`: {reason}")]
    InvalidWebhookUrl { url: String, reason: String },
    #[error("watch timeout must be between 1 and {max} seconds, got {given}")]
    InvalidWatchTimeout { given: u32, max: u32 },
    #[error("failed to build webhook HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("no usable Kubernetes credentials (in-cluster: {in_cluster}; kubeconfig: {kubeconfig})")]
    Credentials {
        in_cluster: String,
        kubeconfig: String,
    },
    #[error("failed to create Kubernetes client: {0}")]
    Client(#[source] kube::Error),
}

/// Failures while opening or reading a watch session. Always recoverable.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to open watch session: {0}")]
    Connect(#[source] kube::Error),
    #[error("watch error event from API server: {0}")]
    Api(ErrorResponse),
    #[error("watch stream broken: {0}")]
    Transport(#[source] kube::Error),
}

impl StreamError {
    /// The API server no longer holds history for the requested resourceVersion.
    pub fn is_expired(&self) -> bool {
        match self {
            StreamError::Api(response) => response.code == 410,
            StreamError::Connect(kube::Error::Api(response))
            | StreamError::Transport(kube::Error::Api(response)) => response.code == 410,
            _ => false,
        }
    }
}

/// A single webhook delivery that did not go through.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("webhook responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("webhook request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum HealthError {
    #[error("health server on {addr} failed: {source}")]
    Serve {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
