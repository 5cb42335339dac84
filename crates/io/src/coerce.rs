//! Field-level value coercion. Anything that does not parse becomes `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

fn non_blank(raw: &str) -> Option<&str> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(s)
    }
}

pub fn text(raw: &str) -> Option<String> {
    non_blank(raw).map(String::from)
}

/// Identifier columns arrive as floats from spreadsheets (`1234.0`).
pub fn identifier(raw: &str) -> Option<String> {
    let s = non_blank(raw)?;
    if let Some(int_part) = s.strip_suffix(".0") {
        if !int_part.is_empty() && int_part.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
            return Some(int_part.to_string());
        }
    }
    Some(s.to_string())
}

/// Plain decimal, thousands-separated (`1,234.5`) or with a decimal comma
/// (`150,00`). Any other use of commas is unparseable.
pub fn number(raw: &str) -> Option<f64> {
    let s = non_blank(raw)?;
    let n = match s.parse::<f64>() {
        Ok(n) => n,
        Err(_) if is_thousands_grouped(s) => s.replace(',', "").parse::<f64>().ok()?,
        Err(_) if s.matches(',').count() == 1 && !s.contains('.') => s.replace(',', ".").parse::<f64>().ok()?,
        Err(_) => return None,
    };
    n.is_finite().then_some(n)
}

/// `-?d{1,3}(,ddd)+(.d+)?`
fn is_thousands_grouped(s: &str) -> bool {
    let unsigned = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };
    if frac.is_some_and(|f| f.is_empty() || !f.bytes().all(|b| b.is_ascii_digit())) {
        return false;
    }
    let mut groups = int_part.split(',');
    let lead_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()));
    let rest: Vec<&str> = groups.collect();
    lead_ok && !rest.is_empty() && rest.iter().all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y", "%Y/%m/%d"];

pub fn datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = non_blank(raw)?;
    // ISO exports with an offset keep their wall-clock time
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    let s = s.strip_suffix('Z').unwrap_or(s);
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

pub fn boolean(raw: &str) -> Option<bool> {
    let s = non_blank(raw)?;
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" => Some(true),
        "false" | "no" | "n" => Some(false),
        other => other.parse::<f64>().ok().map(|n| n != 0.0),
    }
}

/// Excel serial day number (1900 date system) to a timestamp.
pub fn excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(chrono::Duration::milliseconds(millis))
}
