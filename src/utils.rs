use std::time::Duration;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use rand::{Rng, distr::Alphanumeric};
use thiserror::Error;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const PITCH_CLASSES: [&str; 12] = [
    "C", "C♯", "D", "D♯", "E", "F", "F♯", "G", "G♯", "A", "A♯", "B",
];

/// A calendar month in a given year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(YearMonth { year, month })
    }

    pub fn of(date: &DateTime<Utc>) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// "March 2024"
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Missing required parameter: {0}")]
pub struct MissingParameter(pub &'static str);

/// Unwraps an identifier the command cannot run without.
pub fn require_param(name: &'static str, value: Option<String>) -> Result<String, MissingParameter> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(MissingParameter(name))
}

/// Parses `YYYY-MM`; without input the previous calendar month is used.
pub fn parse_year_month(value: Option<&str>, today: NaiveDate) -> Result<YearMonth, String> {
    match value {
        Some(raw) => {
            let (year, month) = raw
                .split_once('-')
                .ok_or_else(|| format!("Expected YYYY-MM, got {}", raw))?;
            let year = year
                .parse::<i32>()
                .map_err(|_| format!("Invalid year in {}", raw))?;
            let month = month
                .parse::<u32>()
                .map_err(|_| format!("Invalid month in {}", raw))?;
            YearMonth::new(year, month).ok_or_else(|| format!("Month out of range in {}", raw))
        }
        None => {
            let (year, month) = if today.month() == 1 {
                (today.year() - 1, 12)
            } else {
                (today.year(), today.month() - 1)
            };
            Ok(YearMonth { year, month })
        }
    }
}

pub fn generate_state_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

/// "4m 05s"
pub fn seconds_to_minutes(seconds: u64) -> String {
    format!("{}m {:02}s", seconds / 60, seconds % 60)
}

pub fn key_to_string(key: i32) -> String {
    usize::try_from(key)
        .ok()
        .and_then(|k| PITCH_CLASSES.get(k))
        .map(|k| k.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

pub fn relative_date_string(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - date).num_days();
    match days {
        d if d < 0 => date.format("%Y-%m-%d").to_string(),
        0 => "today".to_string(),
        1 => "yesterday".to_string(),
        d if d < 30 => format!("{} days ago", d),
        d if d < 365 => match d / 30 {
            1 => "1 month ago".to_string(),
            m => format!("{} months ago", m),
        },
        d => match d / 365 {
            1 => "1 year ago".to_string(),
            y => format!("{} years ago", y),
        },
    }
}

pub fn optional_or_na<T, F>(value: Option<T>, render: F) -> String
where
    F: FnOnce(T) -> String,
{
    value.map(render).unwrap_or_else(|| "N/A".to_string())
}

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
