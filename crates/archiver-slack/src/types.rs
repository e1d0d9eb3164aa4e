use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BOT_MESSAGE_SUBTYPE: &str = "bot_message";

/// Slack error codes that invalidate every subsequent call made with the same token.
const CREDENTIAL_ERROR_CODES: &[&str] = &[
    "not_authed",
    "invalid_auth",
    "account_inactive",
    "token_revoked",
    "token_expired",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Snapshot of a conversation as returned by `conversations.list`.
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_general: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Message classification derived from the Slack `subtype` field.
pub enum MessageSubtype {
    /// No subtype: an ordinary message typed by a person.
    Human,
    /// The `bot_message` subtype.
    Bot,
    /// Any other named subtype (joins, topic changes, pins, ...).
    System(String),
}

impl MessageSubtype {
    pub fn from_wire(raw: Option<&str>) -> Self {
        match raw {
            None | Some("") => Self::Human,
            Some(BOT_MESSAGE_SUBTYPE) => Self::Bot,
            Some(other) => Self::System(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Human => "",
            Self::Bot => BOT_MESSAGE_SUBTYPE,
            Self::System(name) => name.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub ts: String,
    pub text: String,
    pub subtype: MessageSubtype,
}

impl Message {
    pub fn new(ts: impl Into<String>, text: impl Into<String>, subtype: MessageSubtype) -> Self {
        Self {
            ts: ts.into(),
            text: text.into(),
            subtype,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// One page of `conversations.list`.
pub struct ChannelPage {
    pub channels: Vec<Channel>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Parameters for one `conversations.history` page.
pub struct HistoryQuery {
    pub channel_id: String,
    /// Inclusive lower bound in Slack timestamp format.
    pub oldest: String,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// One page of `conversations.history`.
pub struct HistoryPage {
    pub messages: Vec<Message>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Identity reported by `auth.test` for the bot token.
pub struct AuthIdentity {
    pub user_id: String,
    pub user: Option<String>,
    pub team: Option<String>,
}

#[derive(Debug, Error)]
/// Enumerates supported `SlackApiError` values.
pub enum SlackApiError {
    #[error("slack api {method} request failed: {source}")]
    Transport {
        method: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("slack api {method} failed with status {status}: {body}")]
    HttpStatus {
        method: String,
        status: u16,
        body: String,
    },
    #[error("slack {method} failed: {code}")]
    Api { method: String, code: String },
    #[error("failed to decode slack {method}: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("slack api {method} cancelled")]
    Cancelled { method: String },
}

impl SlackApiError {
    pub fn api(method: &str, code: impl Into<String>) -> Self {
        Self::Api {
            method: method.to_string(),
            code: code.into(),
        }
    }

    pub fn cancelled(method: &str) -> Self {
        Self::Cancelled {
            method: method.to_string(),
        }
    }

    /// Slack error code carried by an `ok=false` response.
    pub fn api_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// True when no later call in the same run can be expected to succeed.
    pub fn is_unrecoverable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Cancelled { .. } => true,
            Self::Api { code, .. } => CREDENTIAL_ERROR_CODES.contains(&code.as_str()),
            Self::HttpStatus { status, .. } => *status == 401 || *status == 403,
            Self::Decode { .. } => false,
        }
    }
}

#[async_trait]
/// Remote channel capabilities consumed by the archive workflow.
pub trait ChannelApi: Send + Sync {
    async fn auth_identity(&self) -> Result<AuthIdentity, SlackApiError>;

    async fn list_channels(&self, cursor: Option<&str>) -> Result<ChannelPage, SlackApiError>;

    async fn join_channel(&self, channel_id: &str) -> Result<(), SlackApiError>;

    async fn channel_history(&self, query: &HistoryQuery) -> Result<HistoryPage, SlackApiError>;

    async fn archive_channel(&self, channel_id: &str) -> Result<(), SlackApiError>;
}
