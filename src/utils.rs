use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn current_time_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_time_is_recent() {
        let now = current_time_millis();
        // After 2023-01-01 and before 2100-01-01.
        assert!(now > 1_672_531_200_000);
        assert!(now < 4_102_444_800_000);
    }
}
