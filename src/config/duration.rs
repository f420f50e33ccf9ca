//! Duration parsing utilities.

use anyhow::Context;
use std::time::Duration;

/// Parse a duration string like "1d", "6h", "30m", "300s" or "300".
/// Supports:
/// - Plain numbers (interpreted as seconds): "300"
/// - Seconds suffix: "300s"
/// - Minutes suffix: "30m"
/// - Hours suffix: "6h"
/// - Days suffix: "1d"
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    if s.is_empty() {
        anyhow::bail!("Empty duration string");
    }

    let (num_str, unit_secs, unit) = match s.char_indices().last() {
        Some((i, 'd')) => (&s[..i], 86_400, "days"),
        Some((i, 'h')) => (&s[..i], 3_600, "hours"),
        Some((i, 'm')) => (&s[..i], 60, "minutes"),
        Some((i, 's')) => (&s[..i], 1, "seconds"),
        _ => (s, 1, "duration"),
    };

    let value: u64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid {unit} value: {num_str}"))?;
    let secs = value
        .checked_mul(unit_secs)
        .with_context(|| format!("Duration too large: {s}"))?;
    Ok(Duration::from_secs(secs))
}
