//! Foundational low-level utilities shared across archiver crates.
//!
//! Provides the clock and Slack timestamp helpers used to compute activity
//! windows.

pub mod time_utils;

pub use time_utils::{current_unix_timestamp, format_slack_ts, lookback_boundary};
