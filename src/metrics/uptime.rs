use chrono::{DateTime, TimeDelta, Utc};

/// Time since `boot_time_seconds` (unix), e.g. `"3 days, 4:05:06"`.
pub fn format_uptime(boot_time_seconds: u64, now: DateTime<Utc>) -> String {
    let boot = i64::try_from(boot_time_seconds)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .unwrap_or(now);
    format_elapsed(now.signed_duration_since(boot).max(TimeDelta::zero()))
}

fn format_elapsed(elapsed: TimeDelta) -> String {
    let days = elapsed.num_days();
    let rest = elapsed.num_seconds() - days * 86_400;
    let clock = format!("{}:{:02}:{:02}", rest / 3600, (rest % 3600) / 60, rest % 60);
    match days {
        0 => clock,
        1 => format!("1 day, {}", clock),
        n => format!("{} days, {}", n, clock),
    }
}
