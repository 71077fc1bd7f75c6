//! Parsing of loosely-typed rule input into strict rules.
//!
//! Form and command-line input arrives as optional strings. `RuleDraft`
//! collects them and `RuleDraft::validate` either produces a rule the
//! recurrence engine can rely on or says which field is wrong.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DEFAULT_DURATION_MINUTES;
use crate::priority::Priority;
use crate::rule::{Frequency, RecurringActivityRule, parse_time_of_day};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' has invalid value '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("duration must be positive, got {0} minutes")]
    NonPositiveDuration(i64),
}

impl ValidationError {
    fn invalid(field: &'static str, value: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Raw rule input. Every field is optional and unparsed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<String>,
    pub day_of_week: Option<String>,
    pub day_of_month: Option<String>,
    pub time_of_day: Option<String>,
    pub duration_minutes: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub active: Option<String>,
}

impl RuleDraft {
    /// Validate into a new rule with a fresh id.
    pub fn validate(&self) -> Result<RecurringActivityRule, ValidationError> {
        let name = non_empty(&self.name).ok_or(ValidationError::MissingField("name"))?;

        let frequency_raw =
            non_empty(&self.frequency).ok_or(ValidationError::MissingField("frequency"))?;
        let frequency: Frequency = frequency_raw
            .parse()
            .map_err(|e: String| ValidationError::invalid("frequency", frequency_raw, e))?;

        let mut rule = RecurringActivityRule::new(name, frequency);
        rule.description = non_empty(&self.description).map(str::to_string);

        match frequency {
            Frequency::Daily => {}
            Frequency::Weekly => {
                let raw = non_empty(&self.day_of_week)
                    .ok_or(ValidationError::MissingField("day_of_week"))?;
                rule.day_of_week = Some(parse_day_of_week(raw)?);
            }
            Frequency::Monthly => {
                let raw = non_empty(&self.day_of_month)
                    .ok_or(ValidationError::MissingField("day_of_month"))?;
                rule.day_of_month = Some(parse_bounded("day_of_month", raw, 1, 31)?);
            }
        }

        // An absent time is fine (engine uses 09:00); a present one must parse.
        if let Some(raw) = non_empty(&self.time_of_day) {
            let time = parse_time_of_day(raw)
                .ok_or_else(|| ValidationError::invalid("time_of_day", raw, "expected HH:MM"))?;
            rule.time_of_day = Some(time.format("%H:%M").to_string());
        }

        let duration = match non_empty(&self.duration_minutes) {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| {
                    ValidationError::invalid("duration_minutes", raw, "expected minutes")
                })?,
            None => i64::from(DEFAULT_DURATION_MINUTES),
        };
        if duration <= 0 {
            return Err(ValidationError::NonPositiveDuration(duration));
        }
        rule.duration_minutes = Some(duration);

        rule.category = non_empty(&self.category).unwrap_or_default().to_string();

        if let Some(raw) = non_empty(&self.priority) {
            rule.priority = raw
                .parse::<Priority>()
                .map_err(|e| ValidationError::invalid("priority", raw, e))?;
        }

        if let Some(raw) = non_empty(&self.active) {
            rule.active = parse_bool(raw)
                .ok_or_else(|| ValidationError::invalid("active", raw, "expected true/false"))?;
        }

        Ok(rule)
    }

    /// Validate and keep the identity of an existing rule (for updates).
    pub fn validate_update(
        &self,
        existing: &RecurringActivityRule,
    ) -> Result<RecurringActivityRule, ValidationError> {
        let mut rule = self.validate()?;
        rule.id = existing.id.clone();
        rule.created_at = existing.created_at;
        Ok(rule)
    }

    /// Validate and stamp the creation time.
    pub fn validate_new(
        &self,
        now: NaiveDateTime,
    ) -> Result<RecurringActivityRule, ValidationError> {
        let mut rule = self.validate()?;
        rule.created_at = Some(now);
        Ok(rule)
    }
}

/// Checks a stored rule without reparsing; used before materializing.
pub fn check_rule(rule: &RecurringActivityRule) -> Result<(), ValidationError> {
    match rule.frequency {
        Frequency::Daily => {}
        Frequency::Weekly => match rule.day_of_week {
            None => return Err(ValidationError::MissingField("day_of_week")),
            Some(d) if d > 6 => {
                return Err(ValidationError::invalid("day_of_week", &d.to_string(), "expected 0-6"));
            }
            Some(_) => {}
        },
        Frequency::Monthly => match rule.day_of_month {
            None => return Err(ValidationError::MissingField("day_of_month")),
            Some(d) if !(1..=31).contains(&d) => {
                let raw = d.to_string();
                return Err(ValidationError::invalid("day_of_month", &raw, "expected 1-31"));
            }
            Some(_) => {}
        },
    }

    match rule.duration_minutes {
        Some(m) if m <= 0 => Err(ValidationError::NonPositiveDuration(m)),
        _ => Ok(()),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bounded(field: &'static str, raw: &str, min: u8, max: u8) -> Result<u8, ValidationError> {
    let value: u8 = raw
        .parse()
        .map_err(|_| ValidationError::invalid(field, raw, "expected a number"))?;
    if value < min || value > max {
        return Err(ValidationError::invalid(
            field,
            raw,
            format!("expected {}-{}", min, max),
        ));
    }
    Ok(value)
}

/// Accepts 0-6 (0 = Sunday) or an English weekday name.
fn parse_day_of_week(raw: &str) -> Result<u8, ValidationError> {
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return parse_bounded("day_of_week", raw, 0, 6);
    }

    match raw.parse::<chrono::Weekday>() {
        Ok(weekday) => Ok(weekday.num_days_from_sunday() as u8),
        Err(_) => Err(ValidationError::invalid(
            "day_of_week",
            raw,
            "expected 0-6 or a weekday name",
        )),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
