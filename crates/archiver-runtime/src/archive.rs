//! Archiver stage.

use anyhow::{Context, Result};
use archiver_slack::{Channel, ChannelApi};
use tokio_util::sync::CancellationToken;

use crate::ensure_not_cancelled;

const ALREADY_ARCHIVED: &str = "already_archived";

#[derive(Debug, Default)]
pub struct ArchiveOutcome {
    pub archived: Vec<Channel>,
    pub already_archived: usize,
    pub planned: usize,
    pub failures: usize,
}

/// Archives each channel in order. One failure never blocks the rest.
pub async fn archive_channels(
    api: &dyn ChannelApi,
    channels: Vec<Channel>,
    dry_run: bool,
    cancel: &CancellationToken,
) -> Result<ArchiveOutcome> {
    let mut outcome = ArchiveOutcome::default();

    for channel in channels {
        ensure_not_cancelled(cancel, "archiving")?;

        if dry_run {
            tracing::info!(
                channel = %channel.name,
                channel_id = %channel.id,
                "dry run: would archive channel"
            );
            outcome.planned = outcome.planned.saturating_add(1);
            continue;
        }

        tracing::info!(channel = %channel.name, channel_id = %channel.id, "archiving channel");
        match api.archive_channel(&channel.id).await {
            Ok(()) => outcome.archived.push(channel),
            Err(error) if error.api_code() == Some(ALREADY_ARCHIVED) => {
                tracing::debug!(channel = %channel.name, "channel was already archived");
                outcome.already_archived = outcome.already_archived.saturating_add(1);
            }
            Err(error) if error.is_cancelled() => {
                return Err(error)
                    .with_context(|| format!("failed to archive channel {}", channel.name));
            }
            Err(error) => {
                // TODO: post a notice in the channel when archiving fails.
                tracing::error!(
                    channel = %channel.name,
                    channel_id = %channel.id,
                    error = %error,
                    "failed to archive channel"
                );
                outcome.failures = outcome.failures.saturating_add(1);
            }
        }
    }

    Ok(outcome)
}
