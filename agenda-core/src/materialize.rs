//! Materialization of recurring occurrences into the event store.
//!
//! For the current week (or month) each rule yields at most one occurrence.
//! Before writing, the event store is asked whether a recurring appointment
//! with the same title already exists in the dedup window (the same date for
//! weekly rules, the same month for monthly ones); if so the rule is skipped.
//! Running a period twice therefore inserts nothing the second time.
//!
//! Each rule is handled independently: a store error is recorded against that
//! rule and the loop moves on.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::appointment::Appointment;
use crate::date_range::{DateRange, Period, start_of_week};
use crate::error::{AgendaError, AgendaResult};
use crate::occurrence::Occurrence;
use crate::recurrence;
use crate::rule::{Frequency, RecurringActivityRule};
use crate::store::EventStore;
use crate::validation::{ValidationError, check_rule};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterializeFailure {
    pub rule_id: String,
    pub rule_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MaterializeReport {
    pub period: String,
    pub inserted: usize,
    /// Already materialized, or nothing to materialize in the period
    pub skipped: usize,
    /// Skips caused by the store rejecting a duplicate that the existence
    /// check did not see (a concurrent writer got there first)
    pub conflicts: usize,
    pub failures: Vec<MaterializeFailure>,
    pub created: Vec<Appointment>,
}

impl MaterializeReport {
    fn new(period: &str) -> Self {
        MaterializeReport {
            period: period.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn for_window(window: &DateRange) -> Self {
        Self::new(&format!("sweep-{}", window))
    }

    pub fn total(&self) -> usize {
        self.inserted + self.skipped + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn record(&mut self, rule: &RecurringActivityRule, outcome: AgendaResult<Outcome>) {
        match outcome {
            Ok(Outcome::Inserted(appointment)) => {
                debug!(
                    rule = %rule.id,
                    title = %rule.name,
                    date = %appointment.start_date(),
                    "materialized"
                );
                self.inserted += 1;
                self.created.push(appointment);
            }
            Ok(Outcome::AlreadyPresent) => {
                debug!(rule = %rule.id, title = %rule.name, "already materialized");
                self.skipped += 1;
            }
            Ok(Outcome::NotDue) => {
                debug!(rule = %rule.id, title = %rule.name, "does not fire in period");
                self.skipped += 1;
            }
            Ok(Outcome::Conflict) => {
                warn!(rule = %rule.id, title = %rule.name, "concurrent materialization detected");
                self.skipped += 1;
                self.conflicts += 1;
            }
            Err(e) => {
                warn!(rule = %rule.id, title = %rule.name, error = %e, "materialization failed");
                self.failures.push(MaterializeFailure {
                    rule_id: rule.id.clone(),
                    rule_name: rule.name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
}

/// What happened to one candidate occurrence.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outcome {
    Inserted(Appointment),
    AlreadyPresent,
    NotDue,
    Conflict,
}

pub struct OccurrenceMaterializer {
    events: Arc<dyn EventStore>,
    in_flight: Mutex<HashSet<Period>>,
}

/// Releases a period's single-flight slot when dropped.
pub(crate) struct FlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<Period>>,
    period: Period,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.period);
    }
}

impl OccurrenceMaterializer {
    pub fn new(events: Arc<dyn EventStore>) -> Self {
        OccurrenceMaterializer {
            events,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Materialize the week (Sunday to Saturday) containing `today`.
    ///
    /// `rules` should be the active weekly rules; anything else is reported
    /// as a failure.
    pub async fn materialize_week(
        &self,
        rules: &[RecurringActivityRule],
        today: NaiveDate,
    ) -> AgendaResult<MaterializeReport> {
        let period = Period::week_of(today);
        let sunday = start_of_week(today);

        self.run(period, rules, Frequency::Weekly, |rule| {
            let offset = rule.day_of_week.map(u64::from).unwrap_or_default();
            let date = sunday.checked_add_days(Days::new(offset))?;
            Some((date, DateRange::single(date)))
        })
        .await
    }

    /// Materialize the month containing `today`.
    ///
    /// Rules whose day does not exist in the month (e.g. the 31st in April)
    /// are skipped, not clamped.
    pub async fn materialize_month(
        &self,
        rules: &[RecurringActivityRule],
        today: NaiveDate,
    ) -> AgendaResult<MaterializeReport> {
        let period = Period::month_of(today);
        let month = period.range();

        self.run(period, rules, Frequency::Monthly, |rule| {
            let day = rule.day_of_month.map(u32::from).unwrap_or_default();
            let date = NaiveDate::from_ymd_opt(month.from.year(), month.from.month(), day)?;
            Some((date, month))
        })
        .await
    }

    /// Insert `occurrence` unless a recurring row with its title already
    /// starts inside `window`.
    pub(crate) async fn persist(
        &self,
        occurrence: &Occurrence,
        window: DateRange,
    ) -> AgendaResult<Outcome> {
        let exists = self
            .events
            .exists_recurring_between(&occurrence.title, window.from, window.to)
            .await?;
        if exists {
            return Ok(Outcome::AlreadyPresent);
        }

        match self.events.insert(occurrence.to_new_appointment()).await {
            Ok(appointment) => Ok(Outcome::Inserted(appointment)),
            Err(AgendaError::DuplicateOccurrence { .. }) => Ok(Outcome::Conflict),
            Err(e) => Err(e),
        }
    }

    /// Claim `period` for this process, or fail if a run is already active.
    pub(crate) fn claim(&self, period: Period) -> AgendaResult<FlightGuard<'_>> {
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if !in_flight.insert(period) {
            return Err(AgendaError::MaterializationInProgress(period.key()));
        }

        Ok(FlightGuard {
            in_flight: &self.in_flight,
            period,
        })
    }

    /// `target` maps a rule to its date in the period and the dedup window
    /// around it, or `None` when the rule has no date in the period.
    async fn run<F>(
        &self,
        period: Period,
        rules: &[RecurringActivityRule],
        frequency: Frequency,
        target: F,
    ) -> AgendaResult<MaterializeReport>
    where
        F: Fn(&RecurringActivityRule) -> Option<(NaiveDate, DateRange)>,
    {
        let _guard = self.claim(period)?;
        let mut report = MaterializeReport::new(&period.key());

        for rule in rules {
            let outcome = self.materialize_rule(rule, frequency, &target).await;
            report.record(rule, outcome);
        }

        info!(
            period = %report.period,
            inserted = report.inserted,
            skipped = report.skipped,
            conflicts = report.conflicts,
            failed = report.failures.len(),
            "materialization finished"
        );

        Ok(report)
    }

    async fn materialize_rule<F>(
        &self,
        rule: &RecurringActivityRule,
        frequency: Frequency,
        target: &F,
    ) -> AgendaResult<Outcome>
    where
        F: Fn(&RecurringActivityRule) -> Option<(NaiveDate, DateRange)>,
    {
        if rule.frequency != frequency {
            return Err(ValidationError::InvalidField {
                field: "frequency",
                value: rule.frequency.to_string(),
                reason: format!("expected a {} rule", frequency),
            }
            .into());
        }
        check_rule(rule)?;

        let Some((date, window)) = target(rule) else {
            return Ok(Outcome::NotDue);
        };

        let Some(occurrence) = recurrence::instantiate(rule, date) else {
            return Ok(Outcome::NotDue);
        };

        self.persist(&occurrence, window).await
    }
}
