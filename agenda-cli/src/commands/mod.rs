pub mod day;
pub mod event;
pub mod generate;
pub mod month;
pub mod rule;
pub mod sweep;
pub mod task;
pub mod week;

/// Entries per page in the single-day view.
pub const DAY_PAGE_SIZE: usize = 10;
