use anyhow::{Context, Result};

use crate::{resolve_non_empty_cli_value, validate_archiver_cli, Cli};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Settings resolved once at startup and passed by value to the run.
pub struct ArchiverConfig {
    pub bot_token: String,
    pub app_token: Option<String>,
    pub verbosity: u8,
    pub archive_threshold_days: u32,
    pub count_bot_activity: bool,
    pub dry_run: bool,
    pub slack_api_base: String,
    pub request_timeout_ms: u64,
}

impl ArchiverConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        validate_archiver_cli(cli)?;
        let bot_token = resolve_non_empty_cli_value(cli.slack_bot_token.as_deref())
            .context("--slack-bot-token (or AUTO_ARCHIVER_BOT_TOKEN) is required")?;

        Ok(Self {
            bot_token,
            app_token: resolve_non_empty_cli_value(cli.slack_app_token.as_deref()),
            verbosity: cli.verbosity,
            archive_threshold_days: cli.archive_threshold_days,
            count_bot_activity: cli.count_bot_activity,
            dry_run: cli.dry_run,
            slack_api_base: cli.slack_api_base.trim().trim_end_matches('/').to_string(),
            request_timeout_ms: cli.request_timeout_ms,
        })
    }
}
