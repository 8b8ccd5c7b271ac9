// Third Party
use kube::{
    config::{Config, KubeConfigOptions},
    Client,
};
use signal_hook::{
    consts::{SIGINT, SIGTERM},
    iterator::Signals,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

// Local
use crate::error::ConfigError;

/// Pods in this namespace belong to the cluster itself.
pub const SYSTEM_NAMESPACE: &str = "kube-system";
/// Label keys starting with this prefix mark system components.
pub const SYSTEM_LABEL_PREFIX: &str = "k8s-app";
/// Largest server-side watch timeout the API client accepts.
pub const MAX_WATCH_TIMEOUT_SECONDS: u32 = 294;

/// Install the global tracing subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init_tracing(crate_name: &str, level: tracing::Level) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,{}={}", crate_name, level).to_lowercase())
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Cancel `token` on the first SIGINT/SIGTERM. A second signal exits immediately.
pub fn setup_exit_hooks(token: CancellationToken) -> Result<(), std::io::Error> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::Builder::new()
        .name("exit-hooks".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                if token.is_cancelled() {
                    warn!("Received signal {} during shutdown, exiting now", signal);
                    std::process::exit(128 + signal);
                }
                info!("Received signal {}, shutting down...", signal);
                token.cancel();
            }
        })?;
    Ok(())
}

/// Build a cluster client from the in-cluster service account, falling back to the local
/// kubeconfig.
pub async fn connect_client() -> Result<Client, ConfigError> {
    let config = match Config::incluster() {
        Ok(config) => {
            info!("Loaded in-cluster Kubernetes config");
            config
        }
        Err(in_cluster) => {
            debug!("In-cluster config unavailable: {}", in_cluster);
            let config = Config::from_kubeconfig(&KubeConfigOptions::default())
                .await
                .map_err(|kubeconfig| ConfigError::Credentials {
                    in_cluster: in_cluster.to_string(),
                    kubeconfig: kubeconfig.to_string(),
                })?;
            info!("Loaded local Kubernetes config");
            config
        }
    };
    Client::try_from(config).map_err(ConfigError::Client)
}
