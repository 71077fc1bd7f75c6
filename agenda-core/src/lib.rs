//! Core of the agenda ecosystem.
//!
//! Recurring activity rules are expanded into occurrences, merged with
//! stored appointments and task deadlines into calendar days, and can be
//! materialized into the event store without creating duplicates:
//! - `recurrence` decides when a rule fires and builds occurrences
//! - `materialize` persists occurrences for the current week or month
//! - `calendar` composes month grids, weeks and single days
//! - `schedule` materializes every occurrence in a look-ahead window
//! - `store` defines the data-access traits plus memory and local implementations
//! - `config` loads `~/.config/agenda/config.toml`

pub mod appointment;
pub mod calendar;
pub mod config;
pub mod constants;
pub mod date_range;
pub mod error;
pub mod materialize;
pub mod occurrence;
pub mod priority;
pub mod recurrence;
pub mod rule;
pub mod schedule;
pub mod store;
pub mod task;
pub mod validation;

pub use appointment::{Appointment, AppointmentStatus, NewAppointment};
pub use calendar::{CalendarComposer, CalendarDay, CalendarEntry, Composed, ProjectionMode};
pub use date_range::{DateRange, Period};
pub use error::{AgendaError, AgendaResult};
pub use materialize::{MaterializeReport, OccurrenceMaterializer};
pub use occurrence::Occurrence;
pub use priority::Priority;
pub use rule::{Frequency, RecurringActivityRule};
pub use task::{Task, TaskStatus};
