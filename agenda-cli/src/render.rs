//! TUI rendering traits for agenda types.
//!
//! Extension traits that add colored terminal rendering to agenda-core
//! types using owo_colors.

use agenda_core::calendar::{CalendarDay, CalendarEntry, Page, SourceFailure, ViewBuilder};
use agenda_core::materialize::MaterializeReport;
use agenda_core::{Frequency, Priority, RecurringActivityRule};
use chrono::{Datelike, NaiveDate};
use owo_colors::OwoColorize;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for CalendarEntry {
    fn render(&self) -> String {
        let time = format!(
            "{}-{}",
            self.start_time().format("%H:%M"),
            self.end_time().format("%H:%M")
        );
        let symbol = match self {
            CalendarEntry::Appointment(a) if a.is_recurring => "↻".cyan().to_string(),
            CalendarEntry::Appointment(_) => "•".green().to_string(),
            CalendarEntry::Occurrence(_) => "↻".blue().to_string(),
            CalendarEntry::Task(_) => "☐".yellow().to_string(),
        };
        let title = match self.priority() {
            Priority::High => self.title().red().bold().to_string(),
            Priority::Medium => self.title().to_string(),
            Priority::Low => self.title().dimmed().to_string(),
        };

        format!("{} {} {}", time.dimmed(), symbol, title)
    }
}

impl Render for SourceFailure {
    fn render(&self) -> String {
        format!("⚠ {} unavailable: {}", self.source, self.reason)
            .yellow()
            .to_string()
    }
}

impl Render for RecurringActivityRule {
    fn render(&self) -> String {
        let schedule = match self.frequency {
            Frequency::Daily => "every day".to_string(),
            Frequency::Weekly => match self.day_of_week {
                Some(d) => format!("every {}", WEEKDAYS.get(usize::from(d)).unwrap_or(&"?")),
                None => "weekly".to_string(),
            },
            Frequency::Monthly => match self.day_of_month {
                Some(d) => format!("monthly on day {}", d),
                None => "monthly".to_string(),
            },
        };
        let duration = self
            .effective_duration()
            .map(|m| format!("{}m", m))
            .unwrap_or_else(|| "invalid duration".to_string());

        let line = format!(
            "{} {} ({}, {} {})",
            short_id(&self.id).dimmed(),
            self.name,
            schedule,
            self.start_time().format("%H:%M"),
            duration
        );

        if self.active {
            line
        } else {
            format!("{} {}", line.dimmed(), "[disabled]".dimmed())
        }
    }
}

impl Render for MaterializeReport {
    fn render(&self) -> String {
        let mut lines = Vec::new();

        for appointment in &self.created {
            lines.push(format!(
                "   {} {} {}",
                "+".green(),
                appointment.title.green(),
                appointment.start_time.format("%a %Y-%m-%d %H:%M").to_string().dimmed()
            ));
        }
        for failure in &self.failures {
            lines.push(format!(
                "   {} {}: {}",
                "✗".red(),
                failure.rule_name.red(),
                failure.reason.red()
            ));
        }

        let mut summary = format!("{} inserted, {} skipped", self.inserted, self.skipped);
        if self.conflicts > 0 {
            summary.push_str(&format!(" ({} already written concurrently)", self.conflicts));
        }
        if !self.failures.is_empty() {
            summary.push_str(&format!(", {} failed", self.failures.len()));
        }
        lines.push(summary);

        lines.join("\n")
    }
}

/// Day numbers laid out Sunday-first, then the entries of each busy day in
/// the displayed month, capped per day.
pub fn render_month(days: &[CalendarDay], year: i32, month: u32, view: &ViewBuilder) -> String {
    let mut lines = Vec::new();

    let title = NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_default();
    lines.push(title.bold().to_string());
    lines.push(WEEKDAYS.map(|d| format!("{:>4}", d)).join("").dimmed().to_string());

    for week in days.chunks(7) {
        let row: String = week.iter().map(render_cell).collect();
        lines.push(row);
    }

    for day in days.iter().filter(|d| d.is_current_period && !d.is_empty()) {
        lines.push(String::new());
        lines.extend(render_day_preview(day, view));
    }

    lines.join("\n")
}

fn render_cell(day: &CalendarDay) -> String {
    let marker = if day.is_empty() { ' ' } else { '•' };
    let number = format!("{:>3}", day.date.day());

    let number = if day.is_today {
        number.reversed().to_string()
    } else if !day.is_current_period {
        number.dimmed().to_string()
    } else {
        number
    };

    format!("{}{}", number, marker)
}

pub fn render_week(days: &[CalendarDay], view: &ViewBuilder) -> String {
    let mut lines = Vec::new();

    for day in days {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(render_day_preview(day, view));
        if day.is_empty() {
            lines.push(format!("   {}", "nothing scheduled".dimmed()));
        }
    }

    lines.join("\n")
}

fn render_day_preview(day: &CalendarDay, view: &ViewBuilder) -> Vec<String> {
    let mut lines = vec![day_heading(day)];
    let preview = view.preview(day);

    lines.extend(preview.visible.iter().map(|e| format!("   {}", e.render())));
    if preview.overflow > 0 {
        lines.push(format!("   {}", format!("+{} more", preview.overflow).dimmed()));
    }

    lines
}

pub fn render_day(day: &CalendarDay, page: &Page<'_>) -> String {
    let mut lines = vec![day_heading(day)];

    if day.is_empty() {
        lines.push(format!("   {}", "nothing scheduled".dimmed()));
    } else if page.items.is_empty() {
        lines.push(format!(
            "   {}",
            format!("no page {} (of {})", page.page, page.total_pages).dimmed()
        ));
    } else {
        lines.extend(page.items.iter().map(|e| format!("   {}", e.render())));
        if page.total_pages > 1 {
            lines.push(
                format!("   page {}/{}", page.page, page.total_pages)
                    .dimmed()
                    .to_string(),
            );
        }
    }

    lines.join("\n")
}

fn day_heading(day: &CalendarDay) -> String {
    let heading = day.date.format("%a %d %b").to_string();
    if day.is_today {
        format!("{} {}", heading.bold(), "(today)".dimmed())
    } else {
        heading.bold().to_string()
    }
}

pub fn render_failures(failures: &[SourceFailure]) -> Option<String> {
    if failures.is_empty() {
        return None;
    }

    Some(failures.iter().map(|f| f.render()).collect::<Vec<_>>().join("\n"))
}

/// First block of a uuid, enough to tell rules apart.
pub fn short_id(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}
