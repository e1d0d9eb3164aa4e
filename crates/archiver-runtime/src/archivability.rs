//! Archivability evaluator.
//!
//! A channel is kept when its history window holds at least one message that
//! counts as activity; an empty window, or one holding only system
//! notifications, makes it archivable. History failures leave a channel
//! undecided, so it is neither kept nor archived.

use std::collections::HashSet;

use anyhow::{Context, Result};
use archiver_core::format_slack_ts;
use archiver_slack::{Channel, ChannelApi, HistoryQuery, Message, MessageSubtype, SlackApiError};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::ensure_not_cancelled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Decides which message subtypes count as activity.
pub struct ActivityPolicy {
    pub count_bot_activity: bool,
}

impl Default for ActivityPolicy {
    fn default() -> Self {
        Self {
            count_bot_activity: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepReason {
    HumanActivity,
    BotActivity,
    GeneralChannel,
}

impl KeepReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HumanActivity => "human_activity",
            Self::BotActivity => "bot_activity",
            Self::GeneralChannel => "general_channel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelVerdict {
    Archivable,
    Keep(KeepReason),
}

#[derive(Debug, Default)]
pub struct EvaluationOutcome {
    pub archivable: Vec<Channel>,
    pub kept: usize,
    pub indeterminate: usize,
}

pub fn is_qualifying_activity(subtype: &MessageSubtype, policy: ActivityPolicy) -> bool {
    match subtype {
        MessageSubtype::Human => true,
        MessageSubtype::Bot => policy.count_bot_activity,
        MessageSubtype::System(_) => false,
    }
}

pub fn first_qualifying_message(messages: &[Message], policy: ActivityPolicy) -> Option<&Message> {
    messages
        .iter()
        .find(|message| is_qualifying_activity(&message.subtype, policy))
}

pub fn is_archivable(messages: &[Message], policy: ActivityPolicy) -> bool {
    first_qualifying_message(messages, policy).is_none()
}

/// Reads a channel's history from `oldest` onwards and classifies it.
///
/// Paging stops at the first qualifying message.
pub async fn evaluate_channel(
    api: &dyn ChannelApi,
    channel: &Channel,
    oldest: &str,
    policy: ActivityPolicy,
) -> Result<ChannelVerdict, SlackApiError> {
    if channel.is_general {
        return Ok(ChannelVerdict::Keep(KeepReason::GeneralChannel));
    }

    let mut cursor: Option<String> = None;
    let mut seen_cursors = HashSet::new();
    let mut scanned = 0_usize;
    loop {
        let page = api
            .channel_history(&HistoryQuery {
                channel_id: channel.id.clone(),
                oldest: oldest.to_string(),
                cursor: cursor.take(),
            })
            .await?;
        scanned = scanned.saturating_add(page.messages.len());

        for message in &page.messages {
            tracing::trace!(
                channel = %channel.name,
                ts = %message.ts,
                subtype = message.subtype.as_str(),
                text = %message.text,
                "inspecting message"
            );
        }

        if let Some(message) = first_qualifying_message(&page.messages, policy) {
            let reason = match message.subtype {
                MessageSubtype::Bot => KeepReason::BotActivity,
                _ => KeepReason::HumanActivity,
            };
            tracing::debug!(
                channel = %channel.name,
                ts = %message.ts,
                scanned,
                reason = reason.as_str(),
                "found qualifying activity"
            );
            return Ok(ChannelVerdict::Keep(reason));
        }

        match page.next_cursor {
            Some(next) => {
                if !seen_cursors.insert(next.clone()) {
                    return Err(SlackApiError::api("conversations.history", "repeated_cursor"));
                }
                cursor = Some(next);
            }
            None => break,
        }
    }

    tracing::debug!(
        channel = %channel.name,
        scanned,
        "no qualifying activity in window"
    );
    Ok(ChannelVerdict::Archivable)
}

/// Partitions member channels into archivable and kept sets.
///
/// Channels whose history cannot be read are counted as indeterminate and
/// never archived. Cancellation aborts the evaluation.
pub async fn find_archivable_channels(
    api: &dyn ChannelApi,
    channels: Vec<Channel>,
    boundary: DateTime<Utc>,
    policy: ActivityPolicy,
    cancel: &CancellationToken,
) -> Result<EvaluationOutcome> {
    let oldest = format_slack_ts(boundary);
    let mut outcome = EvaluationOutcome::default();

    for channel in channels {
        ensure_not_cancelled(cancel, "archivability evaluation")?;
        tracing::debug!(
            channel = %channel.name,
            channel_id = %channel.id,
            "checking if channel should be archived"
        );

        match evaluate_channel(api, &channel, &oldest, policy).await {
            Ok(ChannelVerdict::Archivable) => {
                tracing::info!(channel = %channel.name, "channel is archivable");
                outcome.archivable.push(channel);
            }
            Ok(ChannelVerdict::Keep(reason)) => {
                tracing::debug!(
                    channel = %channel.name,
                    reason = reason.as_str(),
                    "keeping channel"
                );
                outcome.kept = outcome.kept.saturating_add(1);
            }
            Err(error) if error.is_cancelled() => {
                return Err(error).with_context(|| {
                    format!("failed to evaluate channel {}", channel.name)
                });
            }
            Err(error) => {
                tracing::warn!(
                    channel = %channel.name,
                    channel_id = %channel.id,
                    error = %error,
                    "could not determine if channel is archivable"
                );
                outcome.indeterminate = outcome.indeterminate.saturating_add(1);
            }
        }
    }

    Ok(outcome)
}
