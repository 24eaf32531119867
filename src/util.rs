use anyhow::{Context, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current epoch time in milliseconds for record timestamps.
pub fn now_epoch_ms() -> Result<u64> {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("compute timestamp")?
        .as_millis();
    u64::try_from(millis).context("timestamp overflows u64")
}

/// Truncate to at most `max_chars` characters, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Render an epoch timestamp as `YYYY-MM-DD HH:MM:SS` UTC.
pub fn format_epoch_ms(epoch_ms: u64) -> String {
    i64::try_from(epoch_ms)
        .ok()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| format!("{epoch_ms}ms"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_epoch_ms_renders_utc() {
        assert_eq!(format_epoch_ms(0), "1970-01-01 00:00:00");
        assert_eq!(format_epoch_ms(1_700_000_000_000), "2023-11-14 22:13:20");
    }

    #[test]
    fn truncate_chars_respects_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
