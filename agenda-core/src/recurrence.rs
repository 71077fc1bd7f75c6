//! Rule expansion for recurring activities.
//!
//! Decides whether a rule fires on a date and builds the occurrence it
//! produces. Everything here is pure: the same rule and date always give the
//! same answer, so the live calendar and materialization never disagree.

use chrono::{Datelike, Duration, NaiveDate};

use crate::date_range::DateRange;
use crate::occurrence::Occurrence;
use crate::rule::{Frequency, RecurringActivityRule};

/// Whether `rule` fires on `date`.
///
/// Inactive rules never fire. Weekly and monthly rules missing their
/// schedule field (or holding an out-of-range value) never fire either.
/// Monthly rules are not clamped: day 31 does not fire in 30-day months.
pub fn fires(rule: &RecurringActivityRule, date: NaiveDate) -> bool {
    if !rule.active {
        return false;
    }

    match rule.frequency {
        Frequency::Daily => true,
        Frequency::Weekly => rule
            .day_of_week
            .is_some_and(|d| d <= 6 && date.weekday().num_days_from_sunday() == u32::from(d)),
        Frequency::Monthly => rule
            .day_of_month
            .is_some_and(|d| (1..=31).contains(&d) && date.day() == u32::from(d)),
    }
}

/// Build the occurrence `rule` produces on `date`, or `None` if it does not
/// fire there or is malformed (e.g. a non-positive duration).
pub fn instantiate(rule: &RecurringActivityRule, date: NaiveDate) -> Option<Occurrence> {
    if !fires(rule, date) {
        return None;
    }

    let duration = rule.effective_duration()?;
    let start_time = date.and_time(rule.start_time());
    let end_time = start_time + Duration::minutes(i64::from(duration));

    Some(Occurrence {
        rule_id: rule.id.clone(),
        title: rule.name.clone(),
        description: rule.description.clone(),
        start_time,
        end_time,
        category: rule.category.clone(),
        priority: rule.priority,
        is_recurring: true,
    })
}

/// Every occurrence of `rule` within `range`, in date order.
pub fn expand(rule: &RecurringActivityRule, range: DateRange) -> Vec<Occurrence> {
    range.days().filter_map(|date| instantiate(rule, date)).collect()
}
