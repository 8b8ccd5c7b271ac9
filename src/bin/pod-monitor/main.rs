// System
use std::process::ExitCode;

// Third Party
use clap::Parser;
use tracing::error;

// Local
use pod_monitor::{
    config::OperatorArgs,
    utils::{init_tracing, setup_exit_hooks},
    Operator,
};

#[tokio::main]
async fn main() -> Result<ExitCode, anyhow::Error> {
    init_tracing("pod_monitor", tracing::Level::INFO);

    let config = match OperatorArgs::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Fatal error: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    let operator = match Operator::new(config).await {
        Ok(operator) => operator,
        Err(e) => {
            error!("Fatal error: {}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    setup_exit_hooks(operator.token())?;

    operator.run().await;
    Ok(ExitCode::SUCCESS)
}
