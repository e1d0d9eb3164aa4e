use chrono::{DateTime, Duration, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

/// Returns the current Unix timestamp in seconds.
pub fn current_unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Returns the start of the activity window that ends at `now`.
///
/// A zero-day window starts at `now` itself. Windows reaching before the Unix
/// epoch clamp to the epoch, which is the earliest bound Slack accepts.
pub fn lookback_boundary(now: DateTime<Utc>, threshold_days: u32) -> DateTime<Utc> {
    let window = Duration::seconds(i64::from(threshold_days) * SECONDS_PER_DAY);
    now.checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .max(DateTime::<Utc>::UNIX_EPOCH)
}

/// Formats an instant as a Slack message timestamp bound (whole Unix seconds).
pub fn format_slack_ts(instant: DateTime<Utc>) -> String {
    instant.timestamp().to_string()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::{format_slack_ts, lookback_boundary};

    #[test]
    fn unit_lookback_boundary_subtracts_whole_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap();
        let boundary = lookback_boundary(now, 30);
        assert_eq!(boundary, Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap());
        assert_eq!(now - boundary, Duration::days(30));
    }

    #[test]
    fn unit_lookback_boundary_zero_days_is_now() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(lookback_boundary(now, 0), now);
    }

    #[test]
    fn regression_lookback_boundary_handles_max_threshold() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let boundary = lookback_boundary(now, u32::MAX);
        assert_eq!(boundary, DateTime::<Utc>::UNIX_EPOCH);
    }

    #[test]
    fn regression_lookback_boundary_never_precedes_unix_epoch() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let oldest = format_slack_ts(lookback_boundary(now, 25_000));
        assert!(!oldest.starts_with('-'));
        assert_eq!(oldest, "0");
    }

    #[test]
    fn unit_format_slack_ts_uses_whole_seconds() {
        let instant = Utc.timestamp_opt(1_700_000_000, 999_000_000).unwrap();
        assert_eq!(format_slack_ts(instant), "1700000000");
    }
}
