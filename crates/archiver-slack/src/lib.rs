//! Slack Web API boundary for the channel auto-archiver.
//!
//! Exposes the `ChannelApi` capability trait consumed by the workflow, the
//! channel/message domain types, and the reqwest-backed `SlackApiClient`.

mod client;
mod types;

pub use client::{SlackApiClient, SlackApiClientConfig, DEFAULT_SLACK_API_BASE};
pub use types::{
    AuthIdentity, Channel, ChannelApi, ChannelPage, HistoryPage, HistoryQuery, Message,
    MessageSubtype, SlackApiError,
};
