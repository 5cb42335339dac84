/// Compact magnitude: `1.2K`, `15K`, `3.4M`; `N/A` when undefined.
pub(crate) fn format_number(value: Option<f64>) -> String {
    format_compact(value, "")
}

/// Like [`format_number`] with a euro prefix after the sign: `-€1.5K`.
pub(crate) fn format_currency(value: Option<f64>) -> String {
    format_compact(value, "€")
}

fn format_compact(value: Option<f64>, prefix: &str) -> String {
    let Some(v) = value.filter(|v| v.is_finite()) else {
        return "N/A".to_string();
    };
    let sign = if v < 0.0 { "-" } else { "" };
    let a = v.abs();
    if a >= 1_000_000.0 {
        format!("{sign}{prefix}{:.1}M", a / 1_000_000.0)
    } else if a >= 10_000.0 {
        format!("{sign}{prefix}{:.0}K", a / 1_000.0)
    } else if a >= 1_000.0 {
        format!("{sign}{prefix}{:.1}K", a / 1_000.0)
    } else {
        format!("{sign}{prefix}{a:.0}")
    }
}

/// One-decimal percentage, `N/A` when undefined.
pub(crate) fn format_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.1}%"),
        _ => "N/A".to_string(),
    }
}

/// Pad or truncate to exactly `width` characters.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let n = s.chars().count();
    if n > width {
        let mut out: String = s.chars().take(width.saturating_sub(2)).collect();
        out.push_str("..");
        out
    } else {
        format!("{s}{}", " ".repeat(width - n))
    }
}
