//! In-memory `ChannelApi` used by workflow unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use archiver_core::format_slack_ts;
use archiver_slack::{
    AuthIdentity, Channel, ChannelApi, ChannelPage, HistoryPage, HistoryQuery, Message,
    MessageSubtype, SlackApiError,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy)]
pub(crate) enum FakeFailure {
    Api(&'static str),
    Status(u16),
    Cancelled,
}

impl FakeFailure {
    fn to_error(self, method: &str) -> SlackApiError {
        match self {
            Self::Api(code) => SlackApiError::api(method, code),
            Self::Status(status) => SlackApiError::HttpStatus {
                method: method.to_string(),
                status,
                body: String::new(),
            },
            Self::Cancelled => SlackApiError::cancelled(method),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FakeCall {
    AuthIdentity,
    List(Option<String>),
    Join(String),
    History {
        channel_id: String,
        oldest: String,
        cursor: Option<String>,
    },
    Archive(String),
}

#[derive(Default)]
pub(crate) struct FakeChannelApi {
    channel_pages: Vec<Vec<Channel>>,
    history: HashMap<String, Vec<Message>>,
    history_page_size: usize,
    identity_failure: Option<FakeFailure>,
    list_failure: Option<FakeFailure>,
    join_failures: HashMap<String, FakeFailure>,
    history_failures: HashMap<String, FakeFailure>,
    archive_failures: HashMap<String, FakeFailure>,
    calls: Mutex<Vec<FakeCall>>,
    joined: Mutex<HashSet<String>>,
    archived: Mutex<HashSet<String>>,
}

impl FakeChannelApi {
    pub(crate) fn with_channels(self, channels: Vec<Channel>) -> Self {
        self.with_channel_pages(vec![channels])
    }

    pub(crate) fn with_channel_pages(mut self, pages: Vec<Vec<Channel>>) -> Self {
        self.channel_pages = pages;
        self
    }

    pub(crate) fn with_history(mut self, channel_id: &str, messages: Vec<Message>) -> Self {
        self.history.insert(channel_id.to_string(), messages);
        self
    }

    pub(crate) fn with_history_page_size(mut self, page_size: usize) -> Self {
        self.history_page_size = page_size;
        self
    }

    pub(crate) fn with_identity_failure(mut self, failure: FakeFailure) -> Self {
        self.identity_failure = Some(failure);
        self
    }

    pub(crate) fn with_list_failure(mut self, failure: FakeFailure) -> Self {
        self.list_failure = Some(failure);
        self
    }

    pub(crate) fn with_join_failure(mut self, channel_id: &str, failure: FakeFailure) -> Self {
        self.join_failures.insert(channel_id.to_string(), failure);
        self
    }

    pub(crate) fn with_history_failure(mut self, channel_id: &str, failure: FakeFailure) -> Self {
        self.history_failures.insert(channel_id.to_string(), failure);
        self
    }

    pub(crate) fn with_archive_failure(mut self, channel_id: &str, failure: FakeFailure) -> Self {
        self.archive_failures.insert(channel_id.to_string(), failure);
        self
    }

    pub(crate) fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn join_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                FakeCall::Join(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn archive_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                FakeCall::Archive(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn history_calls(&self, channel_id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| {
                matches!(call, FakeCall::History { channel_id: id, .. } if id == channel_id)
            })
            .count()
    }

    fn record(&self, call: FakeCall) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

#[async_trait]
impl ChannelApi for FakeChannelApi {
    async fn auth_identity(&self) -> Result<AuthIdentity, SlackApiError> {
        self.record(FakeCall::AuthIdentity);
        if let Some(failure) = self.identity_failure {
            return Err(failure.to_error("auth.test"));
        }
        Ok(AuthIdentity {
            user_id: "UBOT".to_string(),
            user: Some("auto-archiver".to_string()),
            team: Some("Test Team".to_string()),
        })
    }

    async fn list_channels(&self, cursor: Option<&str>) -> Result<ChannelPage, SlackApiError> {
        self.record(FakeCall::List(cursor.map(str::to_string)));
        if let Some(failure) = self.list_failure {
            return Err(failure.to_error("conversations.list"));
        }
        let index = cursor
            .and_then(|cursor| cursor.strip_prefix("page-"))
            .and_then(|index| index.parse::<usize>().ok())
            .unwrap_or(0);
        let joined = self.joined.lock().expect("joined lock").clone();
        let archived = self.archived.lock().expect("archived lock").clone();
        let channels = self
            .channel_pages
            .get(index)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|channel| !archived.contains(&channel.id))
            .map(|mut channel| {
                if joined.contains(&channel.id) {
                    channel.is_member = true;
                }
                channel
            })
            .collect();
        let next_cursor = (index + 1 < self.channel_pages.len()).then(|| format!("page-{}", index + 1));
        Ok(ChannelPage {
            channels,
            next_cursor,
        })
    }

    async fn join_channel(&self, channel_id: &str) -> Result<(), SlackApiError> {
        self.record(FakeCall::Join(channel_id.to_string()));
        if let Some(failure) = self.join_failures.get(channel_id) {
            return Err(failure.to_error("conversations.join"));
        }
        self.joined
            .lock()
            .expect("joined lock")
            .insert(channel_id.to_string());
        Ok(())
    }

    async fn channel_history(&self, query: &HistoryQuery) -> Result<HistoryPage, SlackApiError> {
        self.record(FakeCall::History {
            channel_id: query.channel_id.clone(),
            oldest: query.oldest.clone(),
            cursor: query.cursor.clone(),
        });
        if let Some(failure) = self.history_failures.get(&query.channel_id) {
            return Err(failure.to_error("conversations.history"));
        }
        let oldest = ts_seconds(&query.oldest).expect("oldest bound should parse");
        let window = self
            .history
            .get(&query.channel_id)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|message| {
                ts_seconds(&message.ts).is_some_and(|seconds| seconds >= oldest)
            })
            .collect::<Vec<_>>();

        let offset = query
            .cursor
            .as_deref()
            .and_then(|cursor| cursor.strip_prefix("offset-"))
            .and_then(|offset| offset.parse::<usize>().ok())
            .unwrap_or(0);
        let page_size = if self.history_page_size == 0 {
            window.len().max(1)
        } else {
            self.history_page_size
        };
        let end = offset.saturating_add(page_size).min(window.len());
        let messages = window.get(offset..end).map(<[Message]>::to_vec).unwrap_or_default();
        let next_cursor = (end < window.len()).then(|| format!("offset-{end}"));
        Ok(HistoryPage {
            messages,
            next_cursor,
        })
    }

    async fn archive_channel(&self, channel_id: &str) -> Result<(), SlackApiError> {
        self.record(FakeCall::Archive(channel_id.to_string()));
        if let Some(failure) = self.archive_failures.get(channel_id) {
            return Err(failure.to_error("conversations.archive"));
        }
        self.archived
            .lock()
            .expect("archived lock")
            .insert(channel_id.to_string());
        Ok(())
    }
}

/// Whole seconds of a Slack `ts`. Bounds are whole seconds and inclusive, so
/// comparing seconds is enough to apply `oldest`.
fn ts_seconds(raw: &str) -> Option<i64> {
    raw.split('.').next()?.parse().ok()
}

fn channel(id: &str, name: &str) -> Channel {
    Channel {
        id: id.to_string(),
        name: name.to_string(),
        is_member: false,
        is_archived: false,
        is_private: false,
        is_general: false,
    }
}

pub(crate) fn public_channel(id: &str, name: &str, is_member: bool) -> Channel {
    Channel {
        is_member,
        ..channel(id, name)
    }
}

pub(crate) fn private_channel(id: &str, name: &str, is_member: bool) -> Channel {
    Channel {
        is_member,
        is_private: true,
        ..channel(id, name)
    }
}

pub(crate) fn archived_channel(id: &str, name: &str) -> Channel {
    Channel {
        is_archived: true,
        ..channel(id, name)
    }
}

pub(crate) fn general_channel(id: &str) -> Channel {
    Channel {
        is_member: true,
        is_general: true,
        ..channel(id, "general")
    }
}

pub(crate) fn message_at(instant: DateTime<Utc>, subtype: MessageSubtype) -> Message {
    Message::new(format!("{}.000100", format_slack_ts(instant)), "text", subtype)
}
