/// Hour used when a rule has no usable `time_of_day`, and for task deadlines.
pub const DEFAULT_START_HOUR: u32 = 9;

/// Length of an occurrence when the rule does not say otherwise.
pub const DEFAULT_DURATION_MINUTES: u32 = 60;

/// Six week-rows of seven days.
pub const MONTH_GRID_DAYS: usize = 42;

/// Entries shown per calendar cell before collapsing into "+N more".
pub const DEFAULT_MAX_EVENTS_PER_DAY: usize = 3;

/// How far ahead a sweep materializes occurrences.
pub const DEFAULT_LOOKAHEAD_DAYS: i64 = 14;
