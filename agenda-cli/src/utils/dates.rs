//! Date and duration parsing for command arguments.
//!
//! Strict ISO forms are tried first, then natural language via fuzzydate.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// `input` as a date, or `fallback` when absent.
pub fn parse_date_or(input: Option<&str>, fallback: NaiveDate) -> Result<NaiveDate> {
    input.map(parse_date).transpose().map(|d| d.unwrap_or(fallback))
}

pub fn parse_date(input: &str) -> Result<NaiveDate> {
    if let Ok(date) = agenda_core::date_range::parse_date(input) {
        return Ok(date);
    }

    fuzzy(input).map(|dt| dt.date())
}

pub fn parse_datetime(input: &str) -> Result<NaiveDateTime> {
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(input.trim(), format) {
            return Ok(dt);
        }
    }

    fuzzy(input)
}

/// Event length, e.g. "30m" or "2h".
pub fn parse_duration(input: &str) -> Result<Duration> {
    let std_dur = humantime::parse_duration(input)
        .with_context(|| format!("Could not parse duration: \"{}\"", input))?;
    Duration::from_std(std_dur).context("Duration too large")
}

/// Interval between sweeps; must be non-zero.
pub fn parse_interval(input: &str) -> Result<std::time::Duration> {
    let interval = humantime::parse_duration(input)
        .with_context(|| format!("Could not parse interval: \"{}\"", input))?;
    if interval.is_zero() {
        anyhow::bail!("Interval must be greater than zero");
    }
    Ok(interval)
}

fn fuzzy(input: &str) -> Result<NaiveDateTime> {
    let expanded = expand_abbreviations(input);
    fuzzydate::parse(&expanded).map_err(|_| anyhow::anyhow!("Could not parse date: \"{}\"", input))
}

/// Expand common abbreviations that fuzzydate doesn't handle.
fn expand_abbreviations(input: &str) -> String {
    let abbrevs = [
        ("mon", "monday"),
        ("tue", "tuesday"),
        ("tues", "tuesday"),
        ("wed", "wednesday"),
        ("thu", "thursday"),
        ("thurs", "thursday"),
        ("fri", "friday"),
        ("sat", "saturday"),
        ("sun", "sunday"),
        ("jan", "january"),
        ("feb", "february"),
        ("mar", "march"),
        ("apr", "april"),
        ("jun", "june"),
        ("jul", "july"),
        ("aug", "august"),
        ("sep", "september"),
        ("sept", "september"),
        ("oct", "october"),
        ("nov", "november"),
        ("dec", "december"),
    ];

    input
        .to_lowercase()
        .split_whitespace()
        .map(|word| {
            abbrevs
                .iter()
                .find(|(abbr, _)| *abbr == word)
                .map(|(_, full)| (*full).to_string())
                .unwrap_or_else(|| word.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}
