use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use ratatui::style::Color;
use std::collections::{BTreeSet, HashMap};

/// Parses the timestamp shapes the backend emits: RFC 3339, naive
/// `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS` (taken as UTC), plain
/// dates, and unix seconds or milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ts.with_timezone(&Utc));
    }

    for pattern in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    let numeric = trimmed.parse::<i64>().ok()?;
    if numeric > 10_000_000_000 {
        Utc.timestamp_millis_opt(numeric).single()
    } else {
        Utc.timestamp_opt(numeric, 0).single()
    }
}

/// Compact relative time, e.g. "5m ago". Timestamps in the future read as
/// "just now"; anything older than a year falls back to the date.
pub fn time_ago(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - ts).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    let minutes = secs / 60;
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    let days = hours / 24;
    if days < 7 {
        return format!("{}d ago", days);
    }
    if days < 365 {
        return format!("{}w ago", days / 7);
    }
    ts.format("%Y-%m-%d").to_string()
}

/// `time_ago` over a raw backend string; unparseable input is shown as-is.
pub fn time_ago_str(raw: &str, now: DateTime<Utc>) -> String {
    match parse_timestamp(raw) {
        Some(ts) => time_ago(ts, now),
        None if raw.trim().is_empty() => "-".to_string(),
        None => raw.trim().to_string(),
    }
}

/// `$1.23K`, `-$4.50M`, `$12.34`.
pub fn money(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    if abs >= 1_000_000_000.0 {
        format!("{}${:.2}B", sign, abs / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{}${:.2}M", sign, abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{}${:.2}K", sign, abs / 1_000.0)
    } else {
        format!("{}${:.2}", sign, abs)
    }
}

pub fn signed_pct(value: f64) -> String {
    if !value.is_finite() {
        return "-".to_string();
    }
    format!("{:+.2}%", value)
}

pub fn compact_count(value: u64) -> String {
    if value >= 1_000_000 {
        format!("{:.1}M", value as f64 / 1_000_000.0)
    } else if value >= 1_000 {
        format!("{:.1}K", value as f64 / 1_000.0)
    } else {
        value.to_string()
    }
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let kept: String = single_line.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept)
}

pub const TICKER_PALETTE: [Color; 12] = [
    Color::Rgb(59, 130, 246),
    Color::Rgb(34, 197, 94),
    Color::Rgb(250, 204, 21),
    Color::Rgb(168, 85, 247),
    Color::Rgb(251, 146, 60),
    Color::Rgb(34, 211, 238),
    Color::Rgb(239, 68, 68),
    Color::Rgb(236, 72, 153),
    Color::Rgb(132, 204, 22),
    Color::Rgb(20, 184, 166),
    Color::Rgb(148, 163, 184),
    Color::Rgb(217, 119, 6),
];

/// FNV-1a over the upper-cased ticker.
fn ticker_hash(ticker: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in ticker.trim().to_ascii_uppercase().bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// Color for a ticker seen on its own. Same ticker, same color, every run.
pub fn ticker_color(ticker: &str) -> Color {
    TICKER_PALETTE[(ticker_hash(ticker) % TICKER_PALETTE.len() as u64) as usize]
}

/// Colors for a set of tickers shown together. Tickers are sorted before
/// assignment, so a given set always maps the same way regardless of the
/// order the backend returned it in, and no two of the first
/// `TICKER_PALETTE.len()` tickers share a color.
#[derive(Clone, Debug, Default)]
pub struct TickerPalette {
    colors: HashMap<String, Color>,
}

impl TickerPalette {
    pub fn assign<'a, I>(tickers: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let unique: BTreeSet<String> = tickers
            .into_iter()
            .map(|t| t.trim().to_ascii_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
        let colors = unique
            .into_iter()
            .enumerate()
            .map(|(idx, ticker)| (ticker, TICKER_PALETTE[idx % TICKER_PALETTE.len()]))
            .collect();
        Self { colors }
    }

    pub fn color(&self, ticker: &str) -> Color {
        self.colors
            .get(&ticker.trim().to_ascii_uppercase())
            .copied()
            .unwrap_or_else(|| ticker_color(ticker))
    }
}
