//! Calendar composition.
//!
//! A calendar range is built from three independent sources, fetched
//! concurrently and merged per day:
//! 1. appointments stored in the event store (ad-hoc and materialized)
//! 2. live projections of every active rule, computed fresh
//! 3. task deadlines, drawn as 09:00-10:00 pseudo-events
//!
//! A source that fails to load is left out and reported in
//! `Composed::failures`; the others still render.

mod day;
mod view;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::appointment::Appointment;
use crate::date_range::DateRange;
use crate::error::{AgendaError, AgendaResult};
use crate::recurrence;
use crate::rule::RecurringActivityRule;
use crate::store::{EventStore, RuleStore, TaskStore};
use crate::task::Task;
use crate::validation::ValidationError;

pub use day::{CalendarDay, CalendarEntry, TaskEvent};
pub use view::{DayPreview, Page, ViewBuilder};

/// How live projections relate to materialized copies of the same rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    /// Drop the live projection when the day already holds a materialized
    /// row for the same rule.
    #[default]
    PreferMaterialized,
    /// Show the projection and the materialized row side by side.
    ShowBoth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Rules,
    Appointments,
    Tasks,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Source::Rules => "rules",
            Source::Appointments => "appointments",
            Source::Tasks => "tasks",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceFailure {
    pub source: Source,
    pub reason: String,
}

/// A composed calendar value plus the sources that could not be loaded.
#[derive(Debug, Clone, Serialize)]
pub struct Composed<T> {
    pub value: T,
    pub failures: Vec<SourceFailure>,
}

impl<T> Composed<T> {
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

pub struct CalendarComposer {
    rules: Arc<dyn RuleStore>,
    events: Arc<dyn EventStore>,
    tasks: Arc<dyn TaskStore>,
    projection: ProjectionMode,
}

impl CalendarComposer {
    pub fn new(
        rules: Arc<dyn RuleStore>,
        events: Arc<dyn EventStore>,
        tasks: Arc<dyn TaskStore>,
    ) -> Self {
        CalendarComposer {
            rules,
            events,
            tasks,
            projection: ProjectionMode::default(),
        }
    }

    pub fn with_projection(mut self, projection: ProjectionMode) -> Self {
        self.projection = projection;
        self
    }

    /// 42 days starting on the Sunday on or before the first of `month`.
    pub async fn build_month_grid(
        &self,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> AgendaResult<Composed<Vec<CalendarDay>>> {
        let range = DateRange::month_grid(year, month).ok_or_else(|| {
            AgendaError::Validation(ValidationError::InvalidField {
                field: "month",
                value: format!("{}-{}", year, month),
                reason: "not a displayable calendar month".to_string(),
            })
        })?;

        Ok(self
            .build_range(range, today, |d| d.year() == year && d.month() == month)
            .await)
    }

    /// The Sunday-to-Saturday week containing `anchor`.
    pub async fn build_week(
        &self,
        anchor: NaiveDate,
        today: NaiveDate,
    ) -> Composed<Vec<CalendarDay>> {
        self.build_range(DateRange::week_of(anchor), today, |_| true).await
    }

    pub async fn build_day(&self, date: NaiveDate, today: NaiveDate) -> Composed<CalendarDay> {
        let Composed { value: mut days, failures } =
            self.build_range(DateRange::single(date), today, |_| true).await;

        let day = days.pop().unwrap_or_else(|| CalendarDay::new(date, true, today));
        Composed { value: day, failures }
    }

    /// One bucket per day of `range`, ascending. `is_current` decides each
    /// day's `is_current_period` flag.
    pub async fn build_range<F>(
        &self,
        range: DateRange,
        today: NaiveDate,
        is_current: F,
    ) -> Composed<Vec<CalendarDay>>
    where
        F: Fn(NaiveDate) -> bool,
    {
        let (rules, appointments, tasks) = tokio::join!(
            self.rules.list_active(None),
            self.events.query_by_date_range(range.from, range.to),
            self.tasks.list_due_between(range.from, range.to),
        );

        let mut failures = Vec::new();
        let rules = or_degrade(rules, Source::Rules, &mut failures);
        let appointments = or_degrade(appointments, Source::Appointments, &mut failures);
        let tasks = or_degrade(tasks, Source::Tasks, &mut failures);

        debug!(
            %range,
            rules = rules.len(),
            appointments = appointments.len(),
            tasks = tasks.len(),
            "composing calendar range"
        );

        let mut appointments_by_day: HashMap<NaiveDate, Vec<Appointment>> = HashMap::new();
        for appointment in appointments {
            appointments_by_day
                .entry(appointment.start_date())
                .or_default()
                .push(appointment);
        }

        let mut tasks_by_day: HashMap<NaiveDate, Vec<Task>> = HashMap::new();
        for task in tasks {
            if let Some(due) = task.due_date {
                tasks_by_day.entry(due).or_default().push(task);
            }
        }

        let days = range
            .days()
            .map(|date| {
                let mut day = CalendarDay::new(date, is_current(date), today);
                let stored = appointments_by_day.remove(&date).unwrap_or_default();
                let projections = self.project(&rules, &stored, date);

                day.events.extend(stored.into_iter().map(CalendarEntry::Appointment));
                day.events.extend(projections.into_iter().map(CalendarEntry::Occurrence));
                day.events.extend(
                    tasks_by_day
                        .remove(&date)
                        .unwrap_or_default()
                        .iter()
                        .map(|task| CalendarEntry::Task(TaskEvent::project(task, date))),
                );
                day
            })
            .collect();

        Composed { value: days, failures }
    }

    /// Live occurrences of `rules` on `date`, ordered by start time.
    fn project(
        &self,
        rules: &[RecurringActivityRule],
        stored: &[Appointment],
        date: NaiveDate,
    ) -> Vec<crate::occurrence::Occurrence> {
        let mut occurrences: Vec<_> = rules
            .iter()
            .filter(|rule| match self.projection {
                ProjectionMode::ShowBoth => true,
                ProjectionMode::PreferMaterialized => {
                    !stored.iter().any(|a| a.materializes(&rule.id, &rule.name))
                }
            })
            .filter_map(|rule| recurrence::instantiate(rule, date))
            .collect();
        occurrences.sort_by_key(|o| o.start_time);
        occurrences
    }
}

fn or_degrade<T>(
    result: AgendaResult<Vec<T>>,
    source: Source,
    failures: &mut Vec<SourceFailure>,
) -> Vec<T> {
    match result {
        Ok(items) => items,
        Err(e) => {
            warn!(%source, error = %e, "calendar source unavailable, showing the rest");
            failures.push(SourceFailure {
                source,
                reason: e.to_string(),
            });
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::NewAppointment;
    use crate::rule::Frequency;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use chrono::{Duration, NaiveDateTime, Weekday};
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    fn weekly(name: &str, day: u8, time: &str) -> RecurringActivityRule {
        let mut rule = RecurringActivityRule::new(name, Frequency::Weekly);
        rule.day_of_week = Some(day);
        rule.time_of_day = Some(time.to_string());
        rule.duration_minutes = Some(60);
        rule
    }

    fn composer(store: Arc<MemoryStore>) -> CalendarComposer {
        CalendarComposer::new(store.clone(), store.clone(), store)
    }

    /// Every call fails as if the remote store were down.
    struct Unreachable;

    fn refused<T>() -> AgendaResult<T> {
        Err(AgendaError::store("remote", "connection refused"))
    }

    #[async_trait]
    impl RuleStore for Unreachable {
        async fn list_rules(&self) -> AgendaResult<Vec<RecurringActivityRule>> {
            refused()
        }

        async fn get_rule(&self, _id: &str) -> AgendaResult<Option<RecurringActivityRule>> {
            refused()
        }

        async fn create_rule(
            &self,
            _rule: RecurringActivityRule,
        ) -> AgendaResult<RecurringActivityRule> {
            refused()
        }

        async fn update_rule(
            &self,
            _rule: RecurringActivityRule,
        ) -> AgendaResult<RecurringActivityRule> {
            refused()
        }

        async fn delete_rule(&self, _id: &str) -> AgendaResult<()> {
            refused()
        }
    }

    #[async_trait]
    impl EventStore for Unreachable {
        async fn insert(&self, _appointment: NewAppointment) -> AgendaResult<Appointment> {
            refused()
        }

        async fn query_by_date_range(
            &self,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> AgendaResult<Vec<Appointment>> {
            refused()
        }

        async fn delete_appointment(&self, _id: &str) -> AgendaResult<()> {
            refused()
        }
    }

    #[async_trait]
    impl TaskStore for Unreachable {
        async fn list_due_between(
            &self,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> AgendaResult<Vec<Task>> {
            refused()
        }

        async fn create_task(&self, _task: Task) -> AgendaResult<Task> {
            refused()
        }
    }

    #[tokio::test]
    async fn merges_sources_in_display_order() {
        let store = Arc::new(MemoryStore::with_rules(vec![
            weekly("Yoga", 1, "18:00"),
            weekly("Standup", 1, "08:30"),
        ]));
        store
            .insert(NewAppointment::new("Dentista", at(2024, 3, 11, 15), at(2024, 3, 11, 16)))
            .await
            .unwrap();
        store
            .create_task(Task::new("Consegna report", Some(date(2024, 3, 11))))
            .await
            .unwrap();

        let composed = composer(store).build_day(date(2024, 3, 11), date(2024, 3, 11)).await;
        assert!(!composed.is_degraded());

        let day = composed.value;
        assert!(day.is_today);
        let titles: Vec<_> = day.events.iter().map(|e| e.title()).collect();
        assert_eq!(titles, vec!["Dentista", "Standup", "Yoga", "Consegna report"]);
        assert!(day.events[3].is_task());
    }

    #[tokio::test]
    async fn prefers_materialized_row_over_projection() {
        let rule = weekly("Palestra", 1, "09:00");
        let store = Arc::new(MemoryStore::with_rules(vec![rule.clone()]));
        let occurrence = recurrence::instantiate(&rule, date(2024, 3, 11)).unwrap();
        store.insert(occurrence.to_new_appointment()).await.unwrap();

        let day = composer(store.clone())
            .build_day(date(2024, 3, 11), date(2024, 3, 1))
            .await
            .value;
        assert_eq!(day.events.len(), 1);
        assert!(matches!(day.events[0], CalendarEntry::Appointment(_)));

        let both = composer(store)
            .with_projection(ProjectionMode::ShowBoth)
            .build_day(date(2024, 3, 11), date(2024, 3, 1))
            .await
            .value;
        assert_eq!(both.events.len(), 2);
        assert!(both.events.iter().all(|e| e.is_recurring()));
    }

    #[tokio::test]
    async fn materialized_row_without_back_reference_matches_on_title() {
        let rule = weekly("Palestra", 1, "09:00");
        let store = Arc::new(MemoryStore::with_rules(vec![rule]));
        let mut legacy = NewAppointment::new("Palestra", at(2024, 3, 11, 9), at(2024, 3, 11, 10));
        legacy.is_recurring = true;
        store.push_appointment(legacy.into_appointment("legacy-1".to_string())).await;

        let day = composer(store).build_day(date(2024, 3, 11), date(2024, 3, 1)).await.value;
        assert_eq!(day.events.len(), 1);
    }

    #[tokio::test]
    async fn failing_source_degrades_instead_of_failing() {
        let store = Arc::new(MemoryStore::with_rules(vec![weekly("Palestra", 1, "09:00")]));
        let composer = CalendarComposer::new(store.clone(), store, Arc::new(Unreachable));

        let composed = composer.build_week(date(2024, 3, 13), date(2024, 3, 13)).await;
        assert!(composed.is_degraded());
        assert_eq!(composed.failures.len(), 1);
        assert_eq!(composed.failures[0].source, Source::Tasks);
        assert!(composed.failures[0].reason.contains("connection refused"));
        assert!(composed.value.iter().all(|d| d.events.iter().all(|e| !e.is_task())));

        let monday = &composed.value[1];
        assert_eq!(monday.date.weekday(), Weekday::Mon);
        assert_eq!(monday.events.len(), 1);
    }

    #[tokio::test]
    async fn projection_kept_when_row_belongs_to_another_rule() {
        let rule = weekly("Palestra", 1, "09:00");
        let store = Arc::new(MemoryStore::with_rules(vec![rule]));
        let mut other = NewAppointment::new("Palestra", at(2024, 3, 11, 18), at(2024, 3, 11, 19));
        other.is_recurring = true;
        other.source_rule_id = Some("another-rule".to_string());
        store.insert(other).await.unwrap();

        let day = composer(store).build_day(date(2024, 3, 11), date(2024, 3, 1)).await.value;
        assert_eq!(day.events.len(), 2);
        assert!(matches!(day.events[0], CalendarEntry::Appointment(_)));
        assert!(matches!(day.events[1], CalendarEntry::Occurrence(_)));
    }

    #[tokio::test]
    async fn failing_rule_store_keeps_appointments_and_tasks() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert(NewAppointment::new("Dentista", at(2024, 3, 11, 15), at(2024, 3, 11, 16)))
            .await
            .unwrap();
        store
            .create_task(Task::new("Consegna report", Some(date(2024, 3, 11))))
            .await
            .unwrap();
        let composer = CalendarComposer::new(Arc::new(Unreachable), store.clone(), store);

        let composed = composer.build_day(date(2024, 3, 11), date(2024, 3, 11)).await;
        assert_eq!(composed.failures.len(), 1);
        assert_eq!(composed.failures[0].source, Source::Rules);

        let titles: Vec<_> = composed.value.events.iter().map(|e| e.title()).collect();
        assert_eq!(titles, vec!["Dentista", "Consegna report"]);
    }

    #[tokio::test]
    async fn failing_event_store_still_projects_rules() {
        let store = Arc::new(MemoryStore::with_rules(vec![weekly("Palestra", 1, "09:00")]));
        let composer = CalendarComposer::new(store.clone(), Arc::new(Unreachable), store);

        let composed = composer.build_day(date(2024, 3, 11), date(2024, 3, 13)).await;
        assert_eq!(composed.failures.len(), 1);
        assert_eq!(composed.failures[0].source, Source::Appointments);

        let day = composed.value;
        assert!(!day.is_today);
        assert_eq!(day.events.len(), 1);
        assert!(matches!(day.events[0], CalendarEntry::Occurrence(_)));
    }

    #[tokio::test]
    async fn every_source_down_gives_empty_days() {
        let down = Arc::new(Unreachable);
        let composer = CalendarComposer::new(down.clone(), down.clone(), down);

        let composed = composer.build_week(date(2024, 3, 13), date(2024, 3, 13)).await;
        let sources: Vec<_> = composed.failures.iter().map(|f| f.source).collect();
        assert_eq!(sources, vec![Source::Rules, Source::Appointments, Source::Tasks]);
        assert_eq!(composed.value.len(), 7);
        assert!(composed.value.iter().all(CalendarDay::is_empty));
    }

    #[tokio::test]
    async fn last_week_of_the_calendar_is_cut_short() {
        let store = Arc::new(MemoryStore::with_rules(vec![weekly("Palestra", 1, "09:00")]));
        let week = composer(store).build_week(NaiveDate::MAX, NaiveDate::MAX).await.value;
        assert!(!week.is_empty());
        assert!(week.len() <= 7);
        assert_eq!(week.last().map(|d| d.date), Some(NaiveDate::MAX));
        assert!(week.last().is_some_and(|d| d.is_today));
    }

    #[tokio::test]
    async fn week_is_sunday_to_saturday() {
        let store = Arc::new(MemoryStore::new());
        let week = composer(store).build_week(date(2024, 3, 13), date(2024, 3, 13)).await.value;
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, date(2024, 3, 10));
        assert_eq!(week[6].date, date(2024, 3, 16));
        assert!(week.iter().all(|d| d.is_current_period));
        assert_eq!(week.iter().filter(|d| d.is_today).count(), 1);
        assert!(week[3].is_today);
    }

    #[tokio::test]
    async fn month_grid_flags_current_month() {
        let store = Arc::new(MemoryStore::new());
        let grid = composer(store)
            .build_month_grid(2024, 2, date(2030, 1, 1))
            .await
            .unwrap()
            .value;
        assert_eq!(grid.len(), 42);
        assert_eq!(grid.iter().filter(|d| d.is_current_period).count(), 29);
        assert!(!grid.iter().any(|d| d.is_today));
    }

    #[tokio::test]
    async fn month_grid_rejects_invalid_month() {
        let store = Arc::new(MemoryStore::new());
        let result = composer(store).build_month_grid(2024, 13, date(2024, 1, 1)).await;
        assert!(matches!(result, Err(AgendaError::Validation(_))));
    }

    proptest! {
        #[test]
        fn grid_shape_and_today_flag(
            year in 1990i32..2100,
            month in 1u32..=12,
            today_offset in -60i64..100,
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            let first = date(year, month, 1);
            let today = first + Duration::days(today_offset);

            let calendar = composer(Arc::new(MemoryStore::new()));
            let grid = runtime
                .block_on(calendar.build_month_grid(year, month, today))
                .unwrap()
                .value;

            prop_assert_eq!(grid.len(), 42);
            prop_assert_eq!(grid[0].date.weekday(), Weekday::Sun);
            prop_assert!(grid.windows(2).all(|w| w[1].date == w[0].date + Duration::days(1)));

            let today_count = grid.iter().filter(|d| d.is_today).count();
            let in_range = grid[0].date <= today && today <= grid[41].date;
            prop_assert_eq!(today_count, usize::from(in_range));
        }
    }
}
