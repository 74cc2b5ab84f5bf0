//! Display helpers for log lines.

use trio_types::Amount;

/// Format a duration in seconds as a short human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Render a smallest-unit amount as a decimal with `decimals` fractional
/// digits, trailing zeros trimmed. `format_units(1_500_000_000, 9)` is `"1.5"`.
pub fn format_units(amount: Amount, decimals: u32) -> String {
    let raw = amount.raw();
    let Some(scale) = 10u128.checked_pow(decimals) else {
        return raw.to_string();
    };
    let whole = raw / scale;
    let frac = raw % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = decimals as usize);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(3_661), "1h 1m");
        assert_eq!(format_duration(14 * 86_400 + 600), "14d 0h");
    }

    #[test]
    fn units() {
        assert_eq!(format_units(Amount::new(1_500_000_000), 9), "1.5");
        assert_eq!(format_units(Amount::new(2_000_000_000), 9), "2");
        assert_eq!(format_units(Amount::new(1), 9), "0.000000001");
        assert_eq!(format_units(Amount::new(42), 0), "42");
    }
}
