//! Channel auto-archive workflow.
//!
//! Runs four sequential stages against a [`ChannelApi`](archiver_slack::ChannelApi):
//! directory listing, membership reconciliation, archivability evaluation and
//! archiving. Each stage is a plain async function over owned channel lists so
//! it can be exercised on its own.

pub mod archivability;
pub mod archive;
pub mod directory;
pub mod membership;
pub mod workflow;

#[cfg(test)]
mod test_support;

use anyhow::{bail, Result};
use tokio_util::sync::CancellationToken;

pub use archivability::{
    evaluate_channel, find_archivable_channels, is_archivable, is_qualifying_activity,
    ActivityPolicy, ChannelVerdict, EvaluationOutcome, KeepReason,
};
pub use archive::{archive_channels, ArchiveOutcome};
pub use directory::list_unarchived_channels;
pub use membership::{reconcile_membership, MembershipOutcome};
pub use workflow::{ArchiveWorkflow, ArchiveWorkflowConfig, RunReport};

pub(crate) fn ensure_not_cancelled(cancel: &CancellationToken, stage: &str) -> Result<()> {
    if cancel.is_cancelled() {
        bail!("run cancelled during {stage}");
    }
    Ok(())
}
