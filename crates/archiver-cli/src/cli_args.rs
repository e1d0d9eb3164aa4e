use clap::{ArgAction, Parser};

fn parse_threshold_days(value: &str) -> Result<u32, String> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("archive threshold must be a whole number of days >= 0: {error}"))
}

fn parse_verbosity(value: &str) -> Result<u8, String> {
    value
        .trim()
        .parse::<u8>()
        .map_err(|error| format!("verbosity must be a non-negative integer: {error}"))
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "auto-archiver",
    about = "Join public Slack channels and archive the ones without recent human activity",
    version
)]
pub struct Cli {
    #[arg(
        long = "slack-app-token",
        env = "AUTO_ARCHIVER_APP_TOKEN",
        hide_env_values = true,
        help = "Slack app-level token (xapp-...), checked with apps.connections.open before the run"
    )]
    pub slack_app_token: Option<String>,

    #[arg(
        long = "slack-bot-token",
        env = "AUTO_ARCHIVER_BOT_TOKEN",
        hide_env_values = true,
        help = "Slack bot token for Web API calls (xoxb-...)"
    )]
    pub slack_bot_token: Option<String>,

    #[arg(
        long = "verbosity",
        env = "AUTO_ARCHIVER_VERBOSITY",
        default_value = "0",
        value_parser = parse_verbosity,
        help = "Log verbosity: 0 = info, 1 = debug, 2 or more = trace (RUST_LOG overrides)"
    )]
    pub verbosity: u8,

    #[arg(
        long = "archive-threshold-days",
        env = "AUTO_ARCHIVER_ARCHIVE_THRESHOLD",
        value_parser = parse_threshold_days,
        help = "Archive channels without qualifying activity in this many days"
    )]
    pub archive_threshold_days: u32,

    #[arg(
        long = "count-bot-activity",
        env = "AUTO_ARCHIVER_COUNT_BOT_ACTIVITY",
        default_value_t = true,
        action = ArgAction::Set,
        help = "Treat bot_message posts as activity that keeps a channel open"
    )]
    pub count_bot_activity: bool,

    #[arg(
        long = "dry-run",
        env = "AUTO_ARCHIVER_DRY_RUN",
        default_value_t = false,
        help = "Evaluate channels and log the archive plan without joining or archiving; public channels the bot has not joined are not evaluated, so the plan can undercount a real run"
    )]
    pub dry_run: bool,

    #[arg(
        long = "slack-api-base",
        env = "AUTO_ARCHIVER_SLACK_API_BASE",
        default_value = "https://slack.com/api",
        help = "Slack Web API base URL"
    )]
    pub slack_api_base: String,

    #[arg(
        long = "request-timeout-ms",
        env = "AUTO_ARCHIVER_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Per-request timeout for Slack Web API calls"
    )]
    pub request_timeout_ms: u64,
}
