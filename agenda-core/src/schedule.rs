//! Look-ahead materialization.
//!
//! A sweep persists every occurrence of every active rule from the reference
//! date up to `lookahead_days` ahead. It shares the materializer's
//! check-then-insert path, so overlapping sweeps and `generate` runs never
//! write the same occurrence twice.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::constants::DEFAULT_LOOKAHEAD_DAYS;
use crate::date_range::DateRange;
use crate::error::AgendaResult;
use crate::materialize::{MaterializeReport, OccurrenceMaterializer};
use crate::recurrence;
use crate::rule::RecurringActivityRule;
use crate::validation::check_rule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializationPolicy {
    pub lookahead_days: i64,
}

impl Default for MaterializationPolicy {
    fn default() -> Self {
        MaterializationPolicy {
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
        }
    }
}

impl MaterializationPolicy {
    /// Non-positive look-ahead is treated as one day.
    pub fn new(lookahead_days: i64) -> Self {
        MaterializationPolicy {
            lookahead_days: lookahead_days.max(1),
        }
    }

    /// `[today, today + lookahead_days)`
    pub fn window(&self, today: NaiveDate) -> DateRange {
        let days = u64::try_from(self.lookahead_days.max(1) - 1).unwrap_or_default();
        let last = today.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX);
        DateRange::new(today, last)
    }
}

pub struct Scheduler {
    materializer: Arc<OccurrenceMaterializer>,
    policy: MaterializationPolicy,
}

impl Scheduler {
    pub fn new(materializer: Arc<OccurrenceMaterializer>, policy: MaterializationPolicy) -> Self {
        Scheduler {
            materializer,
            policy,
        }
    }

    pub fn policy(&self) -> MaterializationPolicy {
        self.policy
    }

    /// Materialize every occurrence inside the policy window.
    ///
    /// Counts are per candidate occurrence. Inactive rules yield no
    /// candidates; a malformed rule is one failure.
    pub async fn sweep(
        &self,
        rules: &[RecurringActivityRule],
        today: NaiveDate,
    ) -> AgendaResult<MaterializeReport> {
        let window = self.policy.window(today);
        let mut report = MaterializeReport::for_window(&window);

        for rule in rules {
            if let Err(e) = check_rule(rule) {
                report.record(rule, Err(e.into()));
                continue;
            }

            for occurrence in recurrence::expand(rule, window) {
                let outcome = self
                    .materializer
                    .persist(&occurrence, DateRange::single(occurrence.date()))
                    .await;
                report.record(rule, outcome);
            }
        }

        info!(
            window = %window,
            inserted = report.inserted,
            skipped = report.skipped,
            conflicts = report.conflicts,
            failed = report.failures.len(),
            "sweep finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Frequency;
    use crate::store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn scheduler(store: Arc<MemoryStore>, days: i64) -> Scheduler {
        Scheduler::new(
            Arc::new(OccurrenceMaterializer::new(store)),
            MaterializationPolicy::new(days),
        )
    }

    #[test]
    fn window_is_half_open() {
        let window = MaterializationPolicy::default().window(date(2024, 3, 10));
        assert_eq!(window.from, date(2024, 3, 10));
        assert_eq!(window.to, date(2024, 3, 23));
        assert_eq!(window.num_days(), 14);

        assert_eq!(MaterializationPolicy::new(0).window(date(2024, 3, 10)).num_days(), 1);
    }

    #[tokio::test]
    async fn sweep_covers_every_frequency_and_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let scheduler = scheduler(store.clone(), 14);

        let daily = RecurringActivityRule::new("Meditazione", Frequency::Daily);
        let mut weekly = RecurringActivityRule::new("Palestra", Frequency::Weekly);
        weekly.day_of_week = Some(1);
        let mut monthly = RecurringActivityRule::new("Affitto", Frequency::Monthly);
        monthly.day_of_month = Some(15);
        let rules = vec![daily, weekly, monthly];

        // 2024-03-10 .. 2024-03-23: 14 days, two Mondays, one 15th
        let first = scheduler.sweep(&rules, date(2024, 3, 10)).await.unwrap();
        assert_eq!(first.inserted, 14 + 2 + 1);
        assert!(first.is_clean());

        let second = scheduler.sweep(&rules, date(2024, 3, 10)).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 17);
        assert_eq!(store.appointments().await.len(), 17);
    }

    #[tokio::test]
    async fn sweep_reports_malformed_rule_once() {
        let store = Arc::new(MemoryStore::new());
        let scheduler = scheduler(store.clone(), 7);

        let mut broken = RecurringActivityRule::new("Senza durata", Frequency::Daily);
        broken.duration_minutes = Some(0);
        let mut inactive = RecurringActivityRule::new("In pausa", Frequency::Daily);
        inactive.active = false;

        let report = scheduler.sweep(&[broken, inactive], date(2024, 3, 10)).await.unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.inserted + report.skipped, 0);
        assert!(store.appointments().await.is_empty());
    }
}
