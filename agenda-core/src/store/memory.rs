//! In-process store, used by tests and embedding callers.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use super::{EventStore, RuleStore, TaskStore, duplicates};
use crate::appointment::{Appointment, NewAppointment};
use crate::error::{AgendaError, AgendaResult};
use crate::rule::RecurringActivityRule;
use crate::task::Task;

#[derive(Default)]
pub struct MemoryStore {
    rules: Mutex<Vec<RecurringActivityRule>>,
    appointments: Mutex<Vec<Appointment>>,
    tasks: Mutex<Vec<Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<RecurringActivityRule>) -> Self {
        MemoryStore {
            rules: Mutex::new(rules),
            ..Default::default()
        }
    }

    /// Snapshot of every stored appointment, in insertion order.
    pub async fn appointments(&self) -> Vec<Appointment> {
        self.appointments.lock().await.clone()
    }

    /// Adds an appointment as-is, bypassing the uniqueness check.
    /// Lets tests reproduce rows written by older, unguarded writers.
    pub async fn push_appointment(&self, appointment: Appointment) {
        self.appointments.lock().await.push(appointment);
    }
}

#[async_trait]
impl RuleStore for MemoryStore {
    async fn list_rules(&self) -> AgendaResult<Vec<RecurringActivityRule>> {
        Ok(self.rules.lock().await.clone())
    }

    async fn get_rule(&self, id: &str) -> AgendaResult<Option<RecurringActivityRule>> {
        Ok(self.rules.lock().await.iter().find(|r| r.id == id).cloned())
    }

    async fn create_rule(
        &self,
        rule: RecurringActivityRule,
    ) -> AgendaResult<RecurringActivityRule> {
        self.rules.lock().await.push(rule.clone());
        Ok(rule)
    }

    async fn update_rule(
        &self,
        rule: RecurringActivityRule,
    ) -> AgendaResult<RecurringActivityRule> {
        let mut rules = self.rules.lock().await;
        let slot = rules
            .iter_mut()
            .find(|r| r.id == rule.id)
            .ok_or_else(|| AgendaError::NotFound(format!("rule {}", rule.id)))?;
        *slot = rule.clone();
        Ok(rule)
    }

    async fn delete_rule(&self, id: &str) -> AgendaResult<()> {
        self.rules.lock().await.retain(|r| r.id != id);
        Ok(())
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert(&self, appointment: NewAppointment) -> AgendaResult<Appointment> {
        let mut appointments = self.appointments.lock().await;

        if duplicates(&appointments, &appointment) {
            return Err(AgendaError::DuplicateOccurrence {
                title: appointment.title,
                date: appointment.start_time.date(),
            });
        }

        let stored = appointment.into_appointment(uuid::Uuid::new_v4().to_string());
        appointments.push(stored.clone());
        Ok(stored)
    }

    async fn query_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AgendaResult<Vec<Appointment>> {
        let mut found: Vec<Appointment> = self
            .appointments
            .lock()
            .await
            .iter()
            .filter(|a| (from..=to).contains(&a.start_date()))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.start_time);
        Ok(found)
    }

    async fn delete_appointment(&self, id: &str) -> AgendaResult<()> {
        self.appointments.lock().await.retain(|a| a.id != id);
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_due_between(&self, from: NaiveDate, to: NaiveDate) -> AgendaResult<Vec<Task>> {
        Ok(self
            .tasks
            .lock()
            .await
            .iter()
            .filter(|t| t.due_date.is_some_and(|d| (from..=to).contains(&d)))
            .cloned()
            .collect())
    }

    async fn create_task(&self, task: Task) -> AgendaResult<Task> {
        self.tasks.lock().await.push(task.clone());
        Ok(task)
    }
}
