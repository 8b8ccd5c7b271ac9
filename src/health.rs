//! Liveness endpoint for the orchestrator.
//!
//! `/health` answers healthy as long as the process can serve HTTP. It does not reflect the
//! state of the watch session.

// System
use std::time::Duration;

// Third Party
use chrono::{DateTime, Utc};
use poem::{
    get, handler,
    listener::{Listener, TcpListener},
    web::Json,
    Route, Server,
};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

// Local
use crate::error::HealthError;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[handler]
async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
    })
}

pub struct HealthResponder {
    listen_addr: String,
}

impl HealthResponder {
    pub fn new(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
        }
    }

    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    /// Routes served by the responder. Unknown paths fall through to 404.
    pub fn routes() -> Route {
        Route::new().at("/health", get(health))
    }

    /// Bind the listening socket, then serve until `token` is cancelled.
    pub async fn run(self, token: CancellationToken) -> Result<(), HealthError> {
        let acceptor = TcpListener::bind(self.listen_addr.clone())
            .into_acceptor()
            .await
            .map_err(|source| HealthError::Serve {
                addr: self.listen_addr.clone(),
                source,
            })?;
        info!("Health server started on {}", self.listen_addr);

        let result = Server::new_with_acceptor(acceptor)
            .run_with_graceful_shutdown(
                Self::routes(),
                async move { token.cancelled().await },
                Some(SHUTDOWN_GRACE),
            )
            .await;
        match result {
            Ok(()) => {
                info!("Health server stopped");
                Ok(())
            }
            Err(source) => Err(HealthError::Serve {
                addr: self.listen_addr,
                source,
            }),
        }
    }

    /// Run in a background task. A failure is logged as soon as it happens.
    pub fn spawn(self, token: CancellationToken) -> JoinHandle<Result<(), HealthError>> {
        tokio::spawn(async move {
            let result = self.run(token).await;
            if let Err(e) = &result {
                error!("{}", e);
            }
            result
        })
    }
}
