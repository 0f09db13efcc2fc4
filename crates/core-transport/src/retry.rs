//! The rate-limit retry schedule: fixed at three attempts, exponential
//! backoff starting at one second when the remote doesn't specify
//! `Retry-After`. Not user-tunable (design note: deliberate simplification).

use std::time::Duration;

pub const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_SECS: [u64; 3] = [1, 2, 4];

/// Duration to wait before the next attempt, given the response that just
/// came back 429 and how many retries have already happened (0-indexed).
/// Prefers the `Retry-After` header (interpreted as whole seconds) over the
/// fixed schedule.
pub fn wait_duration(response: &reqwest::Response, attempt: u32) -> Duration {
    if let Some(header) = response.headers().get("retry-after") {
        if let Ok(s) = header.to_str() {
            if let Ok(secs) = s.trim().parse::<u64>() {
                return Duration::from_secs(secs);
            }
        }
    }
    let idx = (attempt as usize).min(BACKOFF_SECS.len() - 1);
    Duration::from_secs(BACKOFF_SECS[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_schedule_doubles_without_retry_after_header() {
        assert_eq!(BACKOFF_SECS[0], 1);
        assert_eq!(BACKOFF_SECS[1], 2);
        assert_eq!(BACKOFF_SECS[2], 4);
    }
}
