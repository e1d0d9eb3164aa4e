//! Membership reconciler: joins public channels the bot can see but is not in.

use anyhow::{Context, Result};
use archiver_slack::{Channel, ChannelApi};
use tokio_util::sync::CancellationToken;

use crate::ensure_not_cancelled;

#[derive(Debug, Default)]
pub struct MembershipOutcome {
    /// Channels the bot belongs to after reconciliation.
    pub members: Vec<Channel>,
    pub joined: usize,
    pub skipped_private: usize,
    pub skipped_dry_run: usize,
    pub join_failures: usize,
}

/// Joins every public channel whose membership flag is false.
///
/// Private channels are never joined. A failed join is logged and the channel
/// skipped; credential, transport and cancellation failures abort the run.
pub async fn reconcile_membership(
    api: &dyn ChannelApi,
    channels: Vec<Channel>,
    dry_run: bool,
    cancel: &CancellationToken,
) -> Result<MembershipOutcome> {
    let mut outcome = MembershipOutcome::default();

    for mut channel in channels {
        ensure_not_cancelled(cancel, "membership reconciliation")?;

        if channel.is_member {
            outcome.members.push(channel);
            continue;
        }

        if channel.is_private {
            tracing::info!(
                channel = %channel.name,
                channel_id = %channel.id,
                "skipping private channel; invite the archiver manually to include it"
            );
            outcome.skipped_private = outcome.skipped_private.saturating_add(1);
            continue;
        }

        if dry_run {
            tracing::info!(
                channel = %channel.name,
                channel_id = %channel.id,
                "dry run: would join public channel"
            );
            outcome.skipped_dry_run = outcome.skipped_dry_run.saturating_add(1);
            continue;
        }

        tracing::debug!(
            channel = %channel.name,
            channel_id = %channel.id,
            "not a member of public channel, joining"
        );
        match api.join_channel(&channel.id).await {
            Ok(()) => {
                channel.is_member = true;
                outcome.joined = outcome.joined.saturating_add(1);
                outcome.members.push(channel);
            }
            Err(error) if error.is_unrecoverable() => {
                return Err(error)
                    .with_context(|| format!("failed to join channel {}", channel.name));
            }
            Err(error) => {
                tracing::warn!(
                    channel = %channel.name,
                    channel_id = %channel.id,
                    error = %error,
                    "failed to join channel; skipping"
                );
                outcome.join_failures = outcome.join_failures.saturating_add(1);
            }
        }
    }

    Ok(outcome)
}
