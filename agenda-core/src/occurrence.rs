use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::appointment::{AppointmentStatus, NewAppointment};
use crate::priority::Priority;

/// One concrete instance of a rule on one date.
///
/// Never stored as-is: either shown live on the calendar or turned into an
/// appointment row by materialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub rule_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub category: String,
    pub priority: Priority,
    pub is_recurring: bool,
}

impl Occurrence {
    pub fn date(&self) -> NaiveDate {
        self.start_time.date()
    }

    /// The appointment row written when this occurrence is materialized.
    pub fn to_new_appointment(&self) -> NewAppointment {
        NewAppointment {
            title: self.title.clone(),
            description: self.description.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            location: None,
            attendees: Vec::new(),
            status: AppointmentStatus::Scheduled,
            priority: self.priority,
            category: (!self.category.is_empty()).then(|| self.category.clone()),
            is_recurring: true,
            source_rule_id: Some(self.rule_id.clone()),
        }
    }
}
