mod bootstrap_helpers;

use std::sync::Arc;

use anyhow::Result;
use archiver_cli::{ArchiverConfig, Cli};
use archiver_runtime::{ArchiveWorkflow, ArchiveWorkflowConfig};
use archiver_slack::{SlackApiClient, SlackApiClientConfig};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use crate::bootstrap_helpers::{init_tracing, spawn_shutdown_listener};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbosity);
    let config = ArchiverConfig::from_cli(&cli)?;

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    let client = SlackApiClient::new(slack_client_config(&config), cancel.clone())?;
    check_app_token(&client).await;

    let workflow = ArchiveWorkflow::new(Arc::new(client), workflow_config(&config), cancel);
    let report = workflow.run().await?;
    if report.archive_failures > 0 || report.join_failures > 0 {
        tracing::warn!(
            join_failures = report.join_failures,
            archive_failures = report.archive_failures,
            "run finished with per-channel failures"
        );
    }
    Ok(())
}

fn slack_client_config(config: &ArchiverConfig) -> SlackApiClientConfig {
    SlackApiClientConfig {
        api_base: config.slack_api_base.clone(),
        bot_token: config.bot_token.clone(),
        app_token: config.app_token.clone(),
        request_timeout_ms: config.request_timeout_ms,
    }
}

fn workflow_config(config: &ArchiverConfig) -> ArchiveWorkflowConfig {
    ArchiveWorkflowConfig {
        threshold_days: config.archive_threshold_days,
        count_bot_activity: config.count_bot_activity,
        dry_run: config.dry_run,
    }
}

async fn check_app_token(client: &SlackApiClient) {
    match client.open_socket_connection().await {
        Ok(Some(_)) => tracing::debug!("slack app token accepted"),
        Ok(None) => tracing::debug!("no slack app token configured"),
        Err(error) => tracing::warn!(error = %error, "slack app token check failed"),
    }
}
