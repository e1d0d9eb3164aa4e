//! Slack Web API client used by the archive workflow.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::types::{
    AuthIdentity, Channel, ChannelApi, ChannelPage, HistoryPage, HistoryQuery, Message,
    MessageSubtype, SlackApiError,
};

pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";

const CONVERSATION_TYPES: &str = "public_channel,private_channel";
const PAGE_LIMIT: &str = "200";
const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Clone, Deserialize)]
struct SlackAuthTestResponse {
    ok: bool,
    user_id: Option<String>,
    user: Option<String>,
    team: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackOpenSocketResponse {
    ok: bool,
    url: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SlackResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackConversationsListResponse {
    ok: bool,
    #[serde(default)]
    channels: Vec<Channel>,
    #[serde(default)]
    response_metadata: Option<SlackResponseMetadata>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackHistoryMessage {
    #[serde(default)]
    ts: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    subtype: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackConversationsHistoryResponse {
    ok: bool,
    #[serde(default)]
    messages: Vec<SlackHistoryMessage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    response_metadata: Option<SlackResponseMetadata>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackAckResponse {
    ok: bool,
    error: Option<String>,
    warning: Option<String>,
}

#[derive(Debug, Clone)]
/// Connection settings for [`SlackApiClient`].
pub struct SlackApiClientConfig {
    pub api_base: String,
    pub bot_token: String,
    pub app_token: Option<String>,
    pub request_timeout_ms: u64,
}

#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    app_token: Option<String>,
    cancel: CancellationToken,
}

impl SlackApiClient {
    /// Builds a client whose requests fail with `Cancelled` once `cancel` fires.
    pub fn new(config: SlackApiClientConfig, cancel: CancellationToken) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("slack-auto-archiver"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms.max(1)))
            .build()
            .context("failed to create slack api client")?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.trim().to_string(),
            app_token: config
                .app_token
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty()),
            cancel,
        })
    }

    /// Checks the app-level token through `apps.connections.open`.
    ///
    /// Returns `Ok(None)` when no app token is configured.
    pub async fn open_socket_connection(&self) -> Result<Option<String>, SlackApiError> {
        let Some(app_token) = self.app_token.as_deref() else {
            return Ok(None);
        };
        let method = "apps.connections.open";
        let response: SlackOpenSocketResponse = self
            .request_json(
                method,
                self.http.post(self.method_url(method)).bearer_auth(app_token),
            )
            .await?;
        ensure_ok(method, response.ok, response.error)?;
        Ok(response.url.filter(|value| !value.trim().is_empty()))
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base)
    }

    async fn cancellable<F>(&self, method: &str, future: F) -> Result<F::Output, SlackApiError>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(SlackApiError::cancelled(method)),
            output = future => Ok(output),
        }
    }

    /// Sends one request and decodes its JSON body. Failed calls are never reattempted.
    async fn request_json<T>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SlackApiError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .cancellable(method, request.send())
            .await?
            .map_err(|source| SlackApiError::Transport {
                method: method.to_string(),
                source,
            })?;
        let status = response.status();
        let body = self.cancellable(method, response.text()).await?;

        if !status.is_success() {
            return Err(SlackApiError::HttpStatus {
                method: method.to_string(),
                status: status.as_u16(),
                body: truncate_for_error(&body.unwrap_or_default(), ERROR_BODY_MAX_CHARS),
            });
        }

        let body = body.map_err(|source| SlackApiError::Transport {
            method: method.to_string(),
            source,
        })?;
        serde_json::from_str::<T>(&body).map_err(|source| SlackApiError::Decode {
            method: method.to_string(),
            source,
        })
    }

    async fn post_channel_action(&self, method: &str, channel_id: &str) -> Result<(), SlackApiError> {
        let payload = json!({ "channel": channel_id });
        let response: SlackAckResponse = self
            .request_json(
                method,
                self.http
                    .post(self.method_url(method))
                    .bearer_auth(&self.bot_token)
                    .json(&payload),
            )
            .await?;
        ensure_ok(method, response.ok, response.error)?;
        if let Some(warning) = response.warning.filter(|value| !value.is_empty()) {
            tracing::debug!(method, channel_id, warning = %warning, "slack returned warning");
        }
        Ok(())
    }
}

#[async_trait]
impl ChannelApi for SlackApiClient {
    async fn auth_identity(&self) -> Result<AuthIdentity, SlackApiError> {
        let method = "auth.test";
        let response: SlackAuthTestResponse = self
            .request_json(
                method,
                self.http
                    .post(self.method_url(method))
                    .bearer_auth(&self.bot_token),
            )
            .await?;
        ensure_ok(method, response.ok, response.error)?;
        let user_id = response
            .user_id
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| SlackApiError::api(method, "missing_user_id"))?;
        Ok(AuthIdentity {
            user_id,
            user: response.user,
            team: response.team,
        })
    }

    async fn list_channels(&self, cursor: Option<&str>) -> Result<ChannelPage, SlackApiError> {
        let method = "conversations.list";
        let mut query = vec![
            ("exclude_archived", "true"),
            ("types", CONVERSATION_TYPES),
            ("limit", PAGE_LIMIT),
        ];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor));
        }
        let response: SlackConversationsListResponse = self
            .request_json(
                method,
                self.http
                    .get(self.method_url(method))
                    .bearer_auth(&self.bot_token)
                    .query(&query),
            )
            .await?;
        ensure_ok(method, response.ok, response.error)?;
        Ok(ChannelPage {
            channels: response.channels,
            next_cursor: next_cursor(response.response_metadata),
        })
    }

    async fn join_channel(&self, channel_id: &str) -> Result<(), SlackApiError> {
        self.post_channel_action("conversations.join", channel_id)
            .await
    }

    async fn channel_history(&self, query: &HistoryQuery) -> Result<HistoryPage, SlackApiError> {
        let method = "conversations.history";
        let mut params = vec![
            ("channel", query.channel_id.as_str()),
            ("oldest", query.oldest.as_str()),
            ("inclusive", "true"),
            ("limit", PAGE_LIMIT),
        ];
        if let Some(cursor) = query.cursor.as_deref() {
            params.push(("cursor", cursor));
        }
        let response: SlackConversationsHistoryResponse = self
            .request_json(
                method,
                self.http
                    .get(self.method_url(method))
                    .bearer_auth(&self.bot_token)
                    .query(&params),
            )
            .await?;
        ensure_ok(method, response.ok, response.error)?;
        let messages = response
            .messages
            .into_iter()
            .map(|message| Message {
                subtype: MessageSubtype::from_wire(message.subtype.as_deref()),
                ts: message.ts,
                text: message.text,
            })
            .collect();
        let next_cursor = if response.has_more {
            next_cursor(response.response_metadata)
        } else {
            None
        };
        Ok(HistoryPage {
            messages,
            next_cursor,
        })
    }

    async fn archive_channel(&self, channel_id: &str) -> Result<(), SlackApiError> {
        self.post_channel_action("conversations.archive", channel_id)
            .await
    }
}

fn ensure_ok(method: &str, ok: bool, error: Option<String>) -> Result<(), SlackApiError> {
    if ok {
        return Ok(());
    }
    Err(SlackApiError::api(
        method,
        error.unwrap_or_else(|| "unknown_error".to_string()),
    ))
}

fn truncate_for_error(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated = value.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

fn next_cursor(metadata: Option<SlackResponseMetadata>) -> Option<String> {
    metadata
        .and_then(|metadata| metadata.next_cursor)
        .map(|cursor| cursor.trim().to_string())
        .filter(|cursor| !cursor.is_empty())
}
