//! Sequences discovery, membership reconciliation, evaluation and archiving.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use archiver_core::{current_unix_timestamp, lookback_boundary};
use archiver_slack::ChannelApi;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::archivability::{find_archivable_channels, ActivityPolicy};
use crate::archive::archive_channels;
use crate::directory::list_unarchived_channels;
use crate::membership::reconcile_membership;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Immutable settings for one workflow run.
pub struct ArchiveWorkflowConfig {
    pub threshold_days: u32,
    pub count_bot_activity: bool,
    pub dry_run: bool,
}

impl ArchiveWorkflowConfig {
    pub fn activity_policy(&self) -> ActivityPolicy {
        ActivityPolicy {
            count_bot_activity: self.count_bot_activity,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// Counters collected over one run.
pub struct RunReport {
    pub started_unix: u64,
    pub duration_ms: u64,
    pub discovered: usize,
    pub joined: usize,
    pub join_failures: usize,
    pub skipped_private: usize,
    pub skipped_dry_run_joins: usize,
    pub evaluated: usize,
    pub kept: usize,
    pub indeterminate: usize,
    pub archivable: usize,
    pub archived: usize,
    pub already_archived: usize,
    pub archive_failures: usize,
    pub planned_archives: usize,
    pub archived_channel_ids: Vec<String>,
}

impl RunReport {
    fn log_summary(&self, dry_run: bool) {
        tracing::info!(
            dry_run,
            discovered = self.discovered,
            joined = self.joined,
            join_failures = self.join_failures,
            skipped_private = self.skipped_private,
            skipped_dry_run_joins = self.skipped_dry_run_joins,
            evaluated = self.evaluated,
            kept = self.kept,
            indeterminate = self.indeterminate,
            archivable = self.archivable,
            archived = self.archived,
            already_archived = self.already_archived,
            archive_failures = self.archive_failures,
            planned_archives = self.planned_archives,
            duration_ms = self.duration_ms,
            "auto-archive run complete"
        );
        if let Some(unevaluated) = self.dry_run_unevaluated() {
            tracing::info!(
                unevaluated,
                "dry run: public channels the bot has not joined were not evaluated; a real run may archive more"
            );
        }
    }

    /// Public channels a dry run skipped joining, and therefore never evaluated.
    pub fn dry_run_unevaluated(&self) -> Option<usize> {
        (self.skipped_dry_run_joins > 0).then_some(self.skipped_dry_run_joins)
    }
}

pub struct ArchiveWorkflow {
    api: Arc<dyn ChannelApi>,
    config: ArchiveWorkflowConfig,
    cancel: CancellationToken,
}

impl ArchiveWorkflow {
    pub fn new(
        api: Arc<dyn ChannelApi>,
        config: ArchiveWorkflowConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            api,
            config,
            cancel,
        }
    }

    pub async fn run(&self) -> Result<RunReport> {
        self.run_at(Utc::now()).await
    }

    /// Runs every stage once with the activity window ending at `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunReport> {
        let started = Instant::now();
        let api = self.api.as_ref();
        let mut report = RunReport {
            started_unix: current_unix_timestamp(),
            ..RunReport::default()
        };

        let identity = api
            .auth_identity()
            .await
            .context("failed to resolve slack bot identity")?;
        tracing::info!(
            user_id = %identity.user_id,
            user = identity.user.as_deref().unwrap_or("unknown"),
            team = identity.team.as_deref().unwrap_or("unknown"),
            "authenticated with slack"
        );

        tracing::debug!("getting channels");
        let channels = list_unarchived_channels(api).await?;
        report.discovered = channels.len();
        tracing::info!(channels = channels.len(), "discovered unarchived channels");

        let membership =
            reconcile_membership(api, channels, self.config.dry_run, &self.cancel).await?;
        report.joined = membership.joined;
        report.join_failures = membership.join_failures;
        report.skipped_private = membership.skipped_private;
        report.skipped_dry_run_joins = membership.skipped_dry_run;
        report.evaluated = membership.members.len();

        let boundary = lookback_boundary(now, self.config.threshold_days);
        tracing::info!(
            threshold_days = self.config.threshold_days,
            oldest = %boundary.to_rfc3339(),
            channels = membership.members.len(),
            "evaluating channel activity"
        );
        let evaluation = find_archivable_channels(
            api,
            membership.members,
            boundary,
            self.config.activity_policy(),
            &self.cancel,
        )
        .await?;
        report.kept = evaluation.kept;
        report.indeterminate = evaluation.indeterminate;
        report.archivable = evaluation.archivable.len();

        let archived =
            archive_channels(api, evaluation.archivable, self.config.dry_run, &self.cancel)
                .await?;
        report.archived = archived.archived.len();
        report.already_archived = archived.already_archived;
        report.archive_failures = archived.failures;
        report.planned_archives = archived.planned;
        report.archived_channel_ids = archived
            .archived
            .into_iter()
            .map(|channel| channel.id)
            .collect();

        report.duration_ms = started.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        report.log_summary(self.config.dry_run);
        Ok(report)
    }
}
