//! Truncation and paging of day entries for display.

use serde::Serialize;

use super::day::{CalendarDay, CalendarEntry};
use crate::constants::DEFAULT_MAX_EVENTS_PER_DAY;

/// The entries that fit in a calendar cell, plus how many were cut.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPreview<'a> {
    pub visible: &'a [CalendarEntry],
    pub overflow: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'a> {
    pub items: &'a [CalendarEntry],
    /// 1-based
    pub page: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ViewBuilder {
    max_per_day: usize,
}

impl Default for ViewBuilder {
    fn default() -> Self {
        ViewBuilder {
            max_per_day: DEFAULT_MAX_EVENTS_PER_DAY,
        }
    }
}

impl ViewBuilder {
    /// A cap of zero is treated as one.
    pub fn new(max_per_day: usize) -> Self {
        ViewBuilder {
            max_per_day: max_per_day.max(1),
        }
    }

    pub fn preview<'a>(&self, day: &'a CalendarDay) -> DayPreview<'a> {
        let shown = day.events.len().min(self.max_per_day);
        DayPreview {
            visible: &day.events[..shown],
            overflow: day.events.len() - shown,
        }
    }

    /// Page `page` (1-based) of `entries`. Pages past the end are empty.
    pub fn paginate<'a>(
        &self,
        entries: &'a [CalendarEntry],
        page: usize,
        per_page: usize,
    ) -> Page<'a> {
        let per_page = per_page.max(1);
        let total_pages = entries.len().div_ceil(per_page).max(1);
        let start = page.saturating_sub(1).saturating_mul(per_page);

        let items = if page == 0 || start >= entries.len() {
            &entries[..0]
        } else {
            &entries[start..(start + per_page).min(entries.len())]
        };

        Page {
            items,
            page,
            total_pages,
        }
    }
}
