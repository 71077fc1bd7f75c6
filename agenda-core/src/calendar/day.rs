//! Calendar day buckets and the entries they hold.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::appointment::Appointment;
use crate::constants::DEFAULT_DURATION_MINUTES;
use crate::occurrence::Occurrence;
use crate::priority::Priority;
use crate::rule::default_start_time;
use crate::task::{Task, TaskStatus};

/// A task deadline drawn on the calendar as if it were an appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskEvent {
    pub task_id: String,
    pub title: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: TaskStatus,
    pub priority: Priority,
    pub is_task: bool,
}

impl TaskEvent {
    /// 09:00-10:00 on `date`.
    pub fn project(task: &Task, date: NaiveDate) -> Self {
        let start_time = date.and_time(default_start_time());
        TaskEvent {
            task_id: task.id.clone(),
            title: task.title.clone(),
            start_time,
            end_time: start_time + Duration::minutes(i64::from(DEFAULT_DURATION_MINUTES)),
            status: task.status,
            priority: task.priority,
            is_task: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalendarEntry {
    Appointment(Appointment),
    Occurrence(Occurrence),
    Task(TaskEvent),
}

impl CalendarEntry {
    pub fn title(&self) -> &str {
        match self {
            CalendarEntry::Appointment(a) => &a.title,
            CalendarEntry::Occurrence(o) => &o.title,
            CalendarEntry::Task(t) => &t.title,
        }
    }

    pub fn start_time(&self) -> NaiveDateTime {
        match self {
            CalendarEntry::Appointment(a) => a.start_time,
            CalendarEntry::Occurrence(o) => o.start_time,
            CalendarEntry::Task(t) => t.start_time,
        }
    }

    pub fn end_time(&self) -> NaiveDateTime {
        match self {
            CalendarEntry::Appointment(a) => a.end_time,
            CalendarEntry::Occurrence(o) => o.end_time,
            CalendarEntry::Task(t) => t.end_time,
        }
    }

    pub fn priority(&self) -> Priority {
        match self {
            CalendarEntry::Appointment(a) => a.priority,
            CalendarEntry::Occurrence(o) => o.priority,
            CalendarEntry::Task(t) => t.priority,
        }
    }

    pub fn is_task(&self) -> bool {
        matches!(self, CalendarEntry::Task(_))
    }

    /// Live projections and materialized rows both count as recurring.
    pub fn is_recurring(&self) -> bool {
        match self {
            CalendarEntry::Appointment(a) => a.is_recurring,
            CalendarEntry::Occurrence(o) => o.is_recurring,
            CalendarEntry::Task(_) => false,
        }
    }
}

impl fmt::Display for CalendarEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_current_period: bool,
    pub is_today: bool,
    /// Appointments, then live projections, then task deadlines
    pub events: Vec<CalendarEntry>,
}

impl CalendarDay {
    pub fn new(date: NaiveDate, is_current_period: bool, today: NaiveDate) -> Self {
        CalendarDay {
            date,
            is_current_period,
            is_today: date == today,
            events: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
