//! File-backed store in the agenda data directory.
//!
//! Each collection is a JSON document:
//! - `rules.json`
//! - `appointments.json`
//! - `tasks.json`
//!
//! Every write re-reads its document under an exclusive lock and replaces it
//! atomically, so concurrent `agenda` processes cannot both pass the
//! duplicate check for the same recurring occurrence.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::lock::StoreLock;
use super::{EventStore, RuleStore, TaskStore, duplicates, unavailable};
use crate::appointment::{Appointment, NewAppointment};
use crate::error::{AgendaError, AgendaResult};
use crate::rule::RecurringActivityRule;
use crate::task::Task;

const RULES_FILE: &str = "rules.json";
const APPOINTMENTS_FILE: &str = "appointments.json";
const TASKS_FILE: &str = "tasks.json";

#[derive(Debug, Clone)]
pub struct LocalStore {
    data_dir: PathBuf,
}

impl LocalStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        LocalStore {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    async fn read<T>(&self, file: &'static str) -> AgendaResult<Vec<T>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let path = self.data_dir.join(file);
        blocking(move || read_document(&path)).await
    }

    /// Read-modify-write one document while holding the store lock.
    async fn modify<T, R, F>(&self, file: &'static str, f: F) -> AgendaResult<R>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        R: Send + 'static,
        F: FnOnce(&mut Vec<T>) -> AgendaResult<R> + Send + 'static,
    {
        let data_dir = self.data_dir.clone();

        blocking(move || {
            let _lock = StoreLock::acquire(&data_dir)?;
            let mut items = read_document(&data_dir.join(file))?;
            let result = f(&mut items)?;
            write_document(&data_dir, file, &items)?;
            Ok(result)
        })
        .await
    }
}

/// Run file I/O (and the blocking lock) off the async worker threads.
async fn blocking<R, F>(f: F) -> AgendaResult<R>
where
    F: FnOnce() -> AgendaResult<R> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AgendaError::store("local", format!("task join error: {e}")))?
}

fn read_document<T: DeserializeOwned>(path: &Path) -> AgendaResult<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path).map_err(|e| unavailable(path, e))?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&content)
        .map_err(|e| AgendaError::Serialization(format!("{}: {}", path.display(), e)))
}

/// Replace `file` atomically: write a sibling temp file, then rename.
fn write_document<T: Serialize>(data_dir: &Path, file: &str, items: &[T]) -> AgendaResult<()> {
    let path = data_dir.join(file);
    let temp = data_dir.join(format!("{}.tmp", file));

    let content = serde_json::to_string_pretty(items)
        .map_err(|e| AgendaError::Serialization(e.to_string()))?;

    std::fs::write(&temp, content).map_err(|e| unavailable(&temp, e))?;
    std::fs::rename(&temp, &path).map_err(|e| unavailable(&path, e))?;
    Ok(())
}

#[async_trait]
impl RuleStore for LocalStore {
    async fn list_rules(&self) -> AgendaResult<Vec<RecurringActivityRule>> {
        let mut rules: Vec<RecurringActivityRule> = self.read(RULES_FILE).await?;
        rules.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(rules)
    }

    async fn get_rule(&self, id: &str) -> AgendaResult<Option<RecurringActivityRule>> {
        Ok(self
            .read::<RecurringActivityRule>(RULES_FILE)
            .await?
            .into_iter()
            .find(|r| r.id == id))
    }

    async fn create_rule(
        &self,
        rule: RecurringActivityRule,
    ) -> AgendaResult<RecurringActivityRule> {
        self.modify(RULES_FILE, move |rules: &mut Vec<RecurringActivityRule>| {
            rules.push(rule.clone());
            Ok(rule)
        })
        .await
    }

    async fn update_rule(
        &self,
        rule: RecurringActivityRule,
    ) -> AgendaResult<RecurringActivityRule> {
        self.modify(RULES_FILE, move |rules: &mut Vec<RecurringActivityRule>| {
            let slot = rules
                .iter_mut()
                .find(|r| r.id == rule.id)
                .ok_or_else(|| AgendaError::NotFound(format!("rule {}", rule.id)))?;
            *slot = rule.clone();
            Ok(rule)
        })
        .await
    }

    async fn delete_rule(&self, id: &str) -> AgendaResult<()> {
        let id = id.to_string();
        self.modify(RULES_FILE, move |rules: &mut Vec<RecurringActivityRule>| {
            let before = rules.len();
            rules.retain(|r| r.id != id);
            if rules.len() == before {
                return Err(AgendaError::NotFound(format!("rule {}", id)));
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl EventStore for LocalStore {
    async fn insert(&self, appointment: NewAppointment) -> AgendaResult<Appointment> {
        self.modify(APPOINTMENTS_FILE, move |appointments: &mut Vec<Appointment>| {
            if duplicates(appointments.as_slice(), &appointment) {
                return Err(AgendaError::DuplicateOccurrence {
                    title: appointment.title.clone(),
                    date: appointment.start_time.date(),
                });
            }

            let stored = appointment.into_appointment(uuid::Uuid::new_v4().to_string());
            appointments.push(stored.clone());
            Ok(stored)
        })
        .await
    }

    async fn query_by_date_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> AgendaResult<Vec<Appointment>> {
        let mut found: Vec<Appointment> = self
            .read::<Appointment>(APPOINTMENTS_FILE)
            .await?
            .into_iter()
            .filter(|a| (from..=to).contains(&a.start_date()))
            .collect();
        found.sort_by_key(|a| a.start_time);
        Ok(found)
    }

    async fn delete_appointment(&self, id: &str) -> AgendaResult<()> {
        let id = id.to_string();
        self.modify(APPOINTMENTS_FILE, move |appointments: &mut Vec<Appointment>| {
            appointments.retain(|a| a.id != id);
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl TaskStore for LocalStore {
    async fn list_due_between(&self, from: NaiveDate, to: NaiveDate) -> AgendaResult<Vec<Task>> {
        Ok(self
            .read::<Task>(TASKS_FILE)
            .await?
            .into_iter()
            .filter(|t| t.due_date.is_some_and(|d| (from..=to).contains(&d)))
            .collect())
    }

    async fn create_task(&self, task: Task) -> AgendaResult<Task> {
        self.modify(TASKS_FILE, move |tasks: &mut Vec<Task>| {
            tasks.push(task.clone());
            Ok(task)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Frequency;
    use tempfile::TempDir;

    fn at(d: u32, h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn missing_documents_read_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path().join("nested"));
        assert!(store.list_rules().await.unwrap().is_empty());
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(store.query_by_date_range(day, day).await.unwrap().is_empty());
        assert!(store.list_by_due_date(day).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rules_survive_a_new_store_instance() {
        let dir = TempDir::new().unwrap();
        let mut rule = RecurringActivityRule::new("Palestra", Frequency::Weekly);
        rule.day_of_week = Some(1);

        LocalStore::new(dir.path()).create_rule(rule.clone()).await.unwrap();

        let reopened = LocalStore::new(dir.path());
        assert_eq!(reopened.get_rule(&rule.id).await.unwrap(), Some(rule.clone()));

        rule.active = false;
        reopened.update_rule(rule.clone()).await.unwrap();
        assert!(reopened.list_active(None).await.unwrap().is_empty());

        reopened.delete_rule(&rule.id).await.unwrap();
        assert!(reopened.list_rules().await.unwrap().is_empty());
        assert!(matches!(
            reopened.delete_rule(&rule.id).await,
            Err(AgendaError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn insert_enforces_recurring_uniqueness() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());

        let mut first = NewAppointment::new("Palestra", at(11, 9), at(11, 10));
        first.is_recurring = true;
        store.insert(first.clone()).await.unwrap();

        let err = store.insert(first).await.unwrap_err();
        assert!(matches!(err, AgendaError::DuplicateOccurrence { .. }));

        let stored = store
            .query_by_date_range(at(11, 0).date(), at(11, 0).date())
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert!(!dir.path().join("appointments.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_document_is_a_serialization_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("tasks.json"), "{ not json").unwrap();
        let store = LocalStore::new(dir.path());
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(matches!(
            store.list_by_due_date(day).await,
            Err(AgendaError::Serialization(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_inserts_write_one_occurrence() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(dir.path());

        let mut occurrence = NewAppointment::new("Palestra", at(11, 9), at(11, 10));
        occurrence.is_recurring = true;

        let (a, b) = tokio::join!(store.insert(occurrence.clone()), store.insert(occurrence));
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
        assert!(matches!(
            a.err().or(b.err()),
            Some(AgendaError::DuplicateOccurrence { .. })
        ));

        let stored = store
            .query_by_date_range(at(11, 0).date(), at(11, 0).date())
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn unwritable_data_dir_is_store_unavailable() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("agenda");
        std::fs::write(&blocker, "").unwrap();
        let store = LocalStore::new(&blocker);

        let err = store
            .create_task(Task::new("Consegna report", None))
            .await
            .unwrap_err();
        assert!(matches!(err, AgendaError::StoreUnavailable { store: "local", .. }));
    }
}
