//! Display formatting shared by the view models (es-ES conventions).

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use enterprisepro_core::employee::MAX_PERFORMANCE_SCORE;

const MONTHS_SHORT: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sept", "oct", "nov", "dic",
];

const AVATAR_COLORS: [&str; 8] = [
    "#2563eb", "#7c3aed", "#dc2626", "#ea580c", "#d97706", "#059669", "#0d9488", "#4338ca",
];

/// `1234567.5` → `"1.234.567,50 US$"`.
///
/// Follows es-ES grouping: four-digit amounts are not grouped.
pub fn format_currency(amount: f64) -> String {
    let negative = amount < 0.0;
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let grouped = if whole.len() > 4 {
        let mut out = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                out.push('.');
            }
            out.push(ch);
        }
        out
    } else {
        whole
    };

    let sign = if negative { "-" } else { "" };
    format!("{sign}{grouped},{fraction:02} US$")
}

/// `2024-01-15` → `"15 ene 2024"`.
pub fn format_date(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        MONTHS_SHORT[date.month0() as usize],
        date.year()
    )
}

/// Parse a backend date or timestamp and format it; unparseable input is returned as is.
pub fn format_date_str(raw: &str) -> String {
    parse_date(raw).map(format_date).unwrap_or_else(|| raw.to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw.get(..10).unwrap_or(raw), "%Y-%m-%d").ok()
}

/// "Hoy", "Ayer", "Hace N días", "Hace N semanas", then the absolute date.
pub fn format_relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds().unsigned_abs();
    let days = seconds.div_ceil(86_400);

    match days {
        0 => "Hoy".to_string(),
        1 => "Ayer".to_string(),
        2..=6 => format!("Hace {days} días"),
        7..=29 => format!("Hace {} semanas", days.div_ceil(7)),
        _ => format_date(at.date_naive()),
    }
}

/// Upper-cased first letters of the first and last name.
pub fn initials(first_name: &str, last_name: &str) -> String {
    first_name
        .chars()
        .next()
        .into_iter()
        .chain(last_name.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Stable avatar background color for a display name.
pub fn avatar_color(name: &str) -> &'static str {
    let hash = name.encode_utf16().fold(0i32, |acc, unit| {
        acc.wrapping_shl(5).wrapping_sub(acc).wrapping_add(i32::from(unit))
    });
    AVATAR_COLORS[(i64::from(hash).unsigned_abs() % AVATAR_COLORS.len() as u64) as usize]
}

/// Star rating out of five: full stars, an optional half star, then empty ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StarRating {
    pub full: u8,
    pub half: bool,
    pub empty: u8,
}

impl StarRating {
    pub fn from_score(score: f64) -> Self {
        let score = if score.is_finite() {
            score.clamp(0.0, MAX_PERFORMANCE_SCORE)
        } else {
            0.0
        };
        let full = score.floor() as u8;
        let half = score.fract() >= 0.5 && full < 5;
        let empty = 5 - full - u8::from(half);
        Self { full, half, empty }
    }

    /// Text rendering, e.g. `★★★⯪☆`.
    pub fn render(&self) -> String {
        let mut out = "★".repeat(self.full as usize);
        if self.half {
            out.push('⯪');
        }
        out.push_str(&"☆".repeat(self.empty as usize));
        out
    }
}

pub fn ease_out_quart(t: f64) -> f64 {
    1.0 - (1.0 - t.clamp(0.0, 1.0)).powi(4)
}

/// Intermediate values of a counter animating from `start` to `end`.
///
/// Produces `frames` values; the last one is exactly `end`.
pub fn counter_frames(start: f64, end: f64, frames: usize) -> Vec<f64> {
    if frames == 0 {
        return Vec::new();
    }
    (1..=frames)
        .map(|i| {
            if i == frames {
                end
            } else {
                start + (end - start) * ease_out_quart(i as f64 / frames as f64)
            }
        })
        .collect()
}
