use anyhow::{bail, Result};

use crate::Cli;

/// Returns the trimmed value when it is present and non-empty.
pub fn resolve_non_empty_cli_value(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Rejects configurations that would fail before the first Slack call.
pub fn validate_archiver_cli(cli: &Cli) -> Result<()> {
    if resolve_non_empty_cli_value(cli.slack_bot_token.as_deref()).is_none() {
        bail!("--slack-bot-token (or AUTO_ARCHIVER_BOT_TOKEN) is required");
    }
    if cli.slack_app_token.is_some()
        && resolve_non_empty_cli_value(cli.slack_app_token.as_deref()).is_none()
    {
        bail!("--slack-app-token cannot be empty when provided");
    }
    let api_base = cli.slack_api_base.trim();
    if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
        bail!("--slack-api-base must be an http(s) URL");
    }
    Ok(())
}
