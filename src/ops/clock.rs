// * Wall-clock helpers shared by the redirect store and audit reports

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the UNIX epoch; 0 if the system clock is before it
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_unix_is_after_2020() {
        assert!(now_unix() > 1_577_836_800);
    }
}
