//! Appointments stored in the event store.
//!
//! Ad-hoc appointments and materialized recurring occurrences share this
//! shape; the latter have `is_recurring` set and usually a `source_rule_id`.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::priority::Priority;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    Rescheduled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Rescheduled => "rescheduled",
        }
    }
}

/// A stored appointment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub status: AppointmentStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Set for rows written by materialization
    #[serde(default)]
    pub is_recurring: bool,
    /// Weak back-reference to the rule a materialized row came from.
    /// Deleting the rule leaves the row in place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_rule_id: Option<String>,
}

impl Appointment {
    pub fn start_date(&self) -> NaiveDate {
        self.start_time.date()
    }

    /// Whether this row is a materialized copy of `rule_id` (matched on the
    /// back-reference, or on title for rows written without one).
    pub fn materializes(&self, rule_id: &str, rule_name: &str) -> bool {
        if !self.is_recurring {
            return false;
        }
        match &self.source_rule_id {
            Some(source) => source == rule_id,
            None => self.title == rule_name,
        }
    }
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// An appointment that has not been stored yet; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAppointment {
    pub title: String,
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub location: Option<String>,
    pub attendees: Vec<String>,
    pub status: AppointmentStatus,
    pub priority: Priority,
    pub category: Option<String>,
    pub is_recurring: bool,
    pub source_rule_id: Option<String>,
}

impl NewAppointment {
    /// A scheduled, non-recurring appointment.
    pub fn new(
        title: impl Into<String>,
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
    ) -> Self {
        NewAppointment {
            title: title.into(),
            description: None,
            start_time,
            end_time,
            location: None,
            attendees: Vec::new(),
            status: AppointmentStatus::Scheduled,
            priority: Priority::default(),
            category: None,
            is_recurring: false,
            source_rule_id: None,
        }
    }

    pub fn into_appointment(self, id: String) -> Appointment {
        Appointment {
            id,
            title: self.title,
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            location: self.location,
            attendees: self.attendees,
            status: self.status,
            priority: self.priority,
            category: self.category,
            is_recurring: self.is_recurring,
            source_rule_id: self.source_rule_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn materializes_prefers_back_reference() {
        let mut row = NewAppointment::new("Palestra", at(2024, 3, 11, 9), at(2024, 3, 11, 10))
            .into_appointment("a1".to_string());
        assert!(!row.materializes("rule-1", "Palestra"), "ad-hoc rows never match");

        row.is_recurring = true;
        assert!(row.materializes("rule-1", "Palestra"), "title fallback");

        row.source_rule_id = Some("rule-2".to_string());
        assert!(!row.materializes("rule-1", "Palestra"));
        assert!(row.materializes("rule-2", "Something else"));
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&AppointmentStatus::Rescheduled).unwrap();
        assert_eq!(json, "\"rescheduled\"");
    }
}
