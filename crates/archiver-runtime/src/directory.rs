//! Channel directory reader.

use std::collections::HashSet;

use anyhow::{bail, Context, Result};
use archiver_slack::{Channel, ChannelApi};

/// Lists every non-archived channel visible to the bot, following cursors until exhausted.
pub async fn list_unarchived_channels(api: &dyn ChannelApi) -> Result<Vec<Channel>> {
    let mut channels = Vec::new();
    let mut seen_ids = HashSet::new();
    let mut seen_cursors = HashSet::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0_usize;

    loop {
        let page = api
            .list_channels(cursor.as_deref())
            .await
            .context("failed to list slack channels")?;
        pages = pages.saturating_add(1);
        tracing::debug!(
            page = pages,
            page_channels = page.channels.len(),
            has_more = page.next_cursor.is_some(),
            "fetched channel directory page"
        );

        for channel in page.channels {
            if channel.is_archived {
                continue;
            }
            if seen_ids.insert(channel.id.clone()) {
                channels.push(channel);
            }
        }

        match page.next_cursor {
            Some(next) => {
                if !seen_cursors.insert(next.clone()) {
                    bail!("slack conversations.list returned repeated cursor '{next}'");
                }
                cursor = Some(next);
            }
            None => break,
        }
    }

    Ok(channels)
}
