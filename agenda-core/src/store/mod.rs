//! Data-access traits for rules, appointments and tasks.
//!
//! The core only talks to storage through these traits. Calls are async and
//! may be remote; every failure surfaces as `AgendaError::StoreUnavailable`
//! (or `DuplicateOccurrence` from stores that enforce uniqueness).

mod local;
mod lock;
mod memory;

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::appointment::{Appointment, NewAppointment};
use crate::error::{AgendaError, AgendaResult};
use crate::rule::{Frequency, RecurringActivityRule};
use crate::task::Task;

pub use local::LocalStore;
pub use memory::MemoryStore;

#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn list_rules(&self) -> AgendaResult<Vec<RecurringActivityRule>>;

    /// Active rules, optionally restricted to one frequency.
    async fn list_active(
        &self,
        frequency: Option<Frequency>,
    ) -> AgendaResult<Vec<RecurringActivityRule>> {
        Ok(self
            .list_rules()
            .await?
            .into_iter()
            .filter(|r| r.active && frequency.is_none_or(|f| r.frequency == f))
            .collect())
    }

    async fn get_rule(&self, id: &str) -> AgendaResult<Option<RecurringActivityRule>>;

    async fn create_rule(&self, rule: RecurringActivityRule) -> AgendaResult<RecurringActivityRule>;

    async fn update_rule(&self, rule: RecurringActivityRule) -> AgendaResult<RecurringActivityRule>;

    /// Hard delete. Materialized appointments are left untouched.
    async fn delete_rule(&self, id: &str) -> AgendaResult<()>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, appointment: NewAppointment) -> AgendaResult<Appointment>;

    /// Appointments whose start date lies in `from..=to`, ordered by start time.
    async fn query_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AgendaResult<Vec<Appointment>>;

    /// Whether a recurring appointment titled `title` starts within `from..=to`.
    async fn exists_recurring_between(
        &self,
        title: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AgendaResult<bool> {
        Ok(self
            .query_by_date_range(from, to)
            .await?
            .iter()
            .any(|a| a.is_recurring && a.title == title))
    }

    async fn exists_recurring_on_date(&self, title: &str, date: NaiveDate) -> AgendaResult<bool> {
        self.exists_recurring_between(title, date, date).await
    }

    async fn delete_appointment(&self, id: &str) -> AgendaResult<()>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks due within `from..=to`. Tasks without a due date are never returned.
    async fn list_due_between(&self, from: NaiveDate, to: NaiveDate) -> AgendaResult<Vec<Task>>;

    async fn list_by_due_date(&self, date: NaiveDate) -> AgendaResult<Vec<Task>> {
        self.list_due_between(date, date).await
    }

    async fn create_task(&self, task: Task) -> AgendaResult<Task>;
}

/// Uniqueness key of a materialized row: `(title, start_date)`.
/// File-system failures of the local store.
pub(crate) fn unavailable(path: &Path, e: std::io::Error) -> AgendaError {
    AgendaError::store("local", format!("{}: {}", path.display(), e))
}

pub(crate) fn duplicates(existing: &[Appointment], new: &NewAppointment) -> bool {
    new.is_recurring
        && existing.iter().any(|a| {
            a.is_recurring && a.title == new.title && a.start_date() == new.start_time.date()
        })
}
