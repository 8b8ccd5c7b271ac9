pub mod config;
pub mod error;
pub mod events;
pub mod filter;
pub mod health;
pub mod notifier;
pub mod utils;
pub mod watcher;

// Third Party
use kube::Client;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

// Local
use crate::config::OperatorConfig;
use crate::error::ConfigError;
use crate::health::HealthResponder;
use crate::notifier::{Notify, SlackNotifier};
use crate::utils::connect_client;
use crate::watcher::{KubePodEventSource, PodEventSource, WatchLoop};

/// Runs the health server in the background and the watch loop on the current task until
/// `token` is cancelled, then waits for the health server to shut down. A health server
/// failure is logged by its own task and leaves the watch loop running.
pub async fn supervise<S: PodEventSource, N: Notify>(
    watch: WatchLoop<S, N>,
    health: HealthResponder,
    token: CancellationToken,
) {
    let health_task = health.spawn(token.clone());

    // Cancels on drop, which also covers a panicking watch loop.
    let guard = token.drop_guard();
    watch.run().await;
    drop(guard);

    if let Err(e) = health_task.await {
        error!("Health server task failed: {}", e);
    }
}

/// Watches pods in one namespace and posts their lifecycle to Slack.
pub struct Operator {
    namespace: String,
    token: CancellationToken,
    watch: WatchLoop<KubePodEventSource, SlackNotifier>,
    health: HealthResponder,
}

impl Operator {
    /// Connect to the cluster and assemble all components.
    pub async fn new(config: OperatorConfig) -> Result<Self, ConfigError> {
        let client = connect_client().await?;
        Self::with_client(config, &client)
    }

    pub fn with_client(config: OperatorConfig, client: &Client) -> Result<Self, ConfigError> {
        let token = CancellationToken::new();
        let notifier = SlackNotifier::new(config.webhook_url.clone())?;
        let source = KubePodEventSource::new(client, &config.namespace);
        let watch = WatchLoop::new(source, notifier, token.clone())
            .with_session_timeout(config.session_timeout)
            .with_backoff(config.backoff);
        let health = HealthResponder::new(config.health_addr());
        Ok(Self {
            namespace: config.namespace,
            token,
            watch,
            health,
        })
    }

    /// The shutdown token shared by the watch loop and the health server.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn stop(&self) {
        info!("Stopping Pod Monitor Operator...");
        self.token.cancel();
    }

    /// Blocks until stopped.
    pub async fn run(self) {
        info!(
            "Starting Pod Monitor Operator for namespace: {}",
            self.namespace
        );
        supervise(self.watch, self.health, self.token).await;
        info!("Pod Monitor Operator stopped");
    }
}
