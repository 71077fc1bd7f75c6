//! Recurring activity rules.
//!
//! A rule describes an activity that repeats daily, on one weekday, or on
//! one day of the month. Rules are stored as entered; fields that only make
//! sense for one frequency are optional, and the recurrence engine treats a
//! rule missing what its frequency needs as one that never fires.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_DURATION_MINUTES, DEFAULT_START_HOUR};
use crate::priority::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(format!("unknown frequency '{}'", other)),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringActivityRule {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub frequency: Frequency,

    /// 0 = Sunday .. 6 = Saturday. Only read for weekly rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,
    /// 1..=31. Only read for monthly rules; never clamped to the month length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u8>,

    /// Raw `HH:MM` local time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,

    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub priority: Priority,
    pub active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

impl RecurringActivityRule {
    /// An active rule with a fresh id and no frequency-specific fields set.
    pub fn new(name: impl Into<String>, frequency: Frequency) -> Self {
        RecurringActivityRule {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: None,
            frequency,
            day_of_week: None,
            day_of_month: None,
            time_of_day: None,
            duration_minutes: None,
            category: String::new(),
            priority: Priority::default(),
            active: true,
            created_at: None,
        }
    }

    /// Start time of each occurrence, falling back to 09:00 when the stored
    /// value is missing or not `HH:MM`.
    pub fn start_time(&self) -> NaiveTime {
        self.time_of_day
            .as_deref()
            .and_then(parse_time_of_day)
            .unwrap_or_else(default_start_time)
    }

    /// Duration in minutes, `None` if the stored value is not positive.
    pub fn effective_duration(&self) -> Option<u32> {
        match self.duration_minutes {
            None => Some(DEFAULT_DURATION_MINUTES),
            Some(m) if m > 0 => u32::try_from(m).ok(),
            Some(_) => None,
        }
    }
}

impl fmt::Display for RecurringActivityRule {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Parse `HH:MM` (seconds tolerated) into a time of day.
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .ok()
}

pub fn default_start_time() -> NaiveTime {
    NaiveTime::from_hms_opt(DEFAULT_START_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly(day: u8) -> RecurringActivityRule {
        let mut rule = RecurringActivityRule::new("Palestra", Frequency::Weekly);
        rule.day_of_week = Some(day);
        rule
    }

    #[test]
    fn start_time_parses_hh_mm() {
        let mut rule = weekly(1);
        rule.time_of_day = Some("18:30".to_string());
        assert_eq!(rule.start_time(), NaiveTime::from_hms_opt(18, 30, 0).unwrap());
    }

    #[test]
    fn start_time_defaults_to_nine() {
        let mut rule = weekly(1);
        assert_eq!(rule.start_time(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());

        rule.time_of_day = Some("half past six".to_string());
        assert_eq!(rule.start_time(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());

        rule.time_of_day = Some("25:00".to_string());
        assert_eq!(rule.start_time(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn duration_defaults_and_rejects_non_positive() {
        let mut rule = weekly(1);
        assert_eq!(rule.effective_duration(), Some(60));

        rule.duration_minutes = Some(45);
        assert_eq!(rule.effective_duration(), Some(45));

        rule.duration_minutes = Some(0);
        assert_eq!(rule.effective_duration(), None);

        rule.duration_minutes = Some(-10);
        assert_eq!(rule.effective_duration(), None);
    }

    #[test]
    fn frequency_round_trips_through_strings() {
        assert_eq!("Weekly".parse::<Frequency>(), Ok(Frequency::Weekly));
        assert_eq!(Frequency::Monthly.to_string(), "monthly");
        assert!("yearly".parse::<Frequency>().is_err());
    }
}
