mod commands;
mod render;
mod utils;

use agenda_core::config::AgendaConfig;
use anyhow::Result;
use chrono::{Datelike, Local};
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "agenda")]
#[command(about = "Recurring activities, appointments and task deadlines on one calendar")]
struct Cli {
    /// Verbose logging to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a month grid
    Month {
        #[arg(long)]
        year: Option<i32>,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
    /// Show the Sunday-to-Saturday week containing a date
    Week {
        /// Any day of the week (YYYY-MM-DD or e.g. "next friday")
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Show every entry of a single day
    Day {
        #[arg(short, long)]
        date: Option<String>,

        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Write this week's or month's recurring occurrences to the event store
    Generate {
        #[arg(value_enum)]
        period: GeneratePeriod,
    },
    /// Materialize every occurrence in the look-ahead window
    Sweep {
        /// Override the configured look-ahead
        #[arg(long)]
        days: Option<i64>,

        /// Keep running, sweeping at this interval (e.g. "1h", "30m")
        #[arg(long)]
        every: Option<String>,
    },
    /// Manage recurring activity rules
    Rule {
        #[command(subcommand)]
        command: RuleCommand,
    },
    /// Manage one-off appointments
    Event {
        #[command(subcommand)]
        command: EventCommand,
    },
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GeneratePeriod {
    Week,
    Month,
}

#[derive(Subcommand)]
enum RuleCommand {
    Add {
        name: String,

        /// daily, weekly or monthly
        #[arg(short, long)]
        frequency: String,

        /// Weekday for weekly rules (0-6 from Sunday, or a name like "mon")
        #[arg(long)]
        weekday: Option<String>,

        /// Day of month for monthly rules (1-31)
        #[arg(long)]
        monthday: Option<String>,

        /// Start time (HH:MM), defaults to 09:00
        #[arg(short, long)]
        time: Option<String>,

        /// Duration in minutes, defaults to 60
        #[arg(short, long)]
        duration: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        /// low, medium or high
        #[arg(short, long)]
        priority: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },
    List,
    Enable {
        /// Rule id or unique id prefix
        id: String,
    },
    Disable {
        id: String,
    },
    Remove {
        id: String,
    },
}

#[derive(Subcommand)]
enum EventCommand {
    Add {
        title: String,

        /// Start date/time (e.g. "2025-03-20 15:00" or "tomorrow 3pm")
        #[arg(short, long)]
        start: String,

        /// Duration (e.g. "30m", "2h"), defaults to 1 hour
        #[arg(short, long)]
        duration: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,
    },
}

#[derive(Subcommand)]
enum TaskCommand {
    Add {
        title: String,

        /// Due date (YYYY-MM-DD or e.g. "friday")
        #[arg(long)]
        due: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = AgendaConfig::load()?;
    let now = Local::now().naive_local();
    let today = now.date();

    match cli.command {
        Commands::Month { year, month } => {
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            commands::month::run(&config, year, month, today).await
        }
        Commands::Week { date } => {
            let anchor = utils::dates::parse_date_or(date.as_deref(), today)?;
            commands::week::run(&config, anchor, today).await
        }
        Commands::Day { date, page } => {
            let date = utils::dates::parse_date_or(date.as_deref(), today)?;
            commands::day::run(&config, date, page, today).await
        }
        Commands::Generate { period } => match period {
            GeneratePeriod::Week => commands::generate::week(&config, today).await,
            GeneratePeriod::Month => commands::generate::month(&config, today).await,
        },
        Commands::Sweep { days, every } => {
            let every = every.as_deref().map(utils::dates::parse_interval).transpose()?;
            commands::sweep::run(&config, days, every).await
        }
        Commands::Rule { command } => match command {
            RuleCommand::Add {
                name,
                frequency,
                weekday,
                monthday,
                time,
                duration,
                category,
                priority,
                description,
            } => {
                let draft = agenda_core::validation::RuleDraft {
                    name: Some(name),
                    description,
                    frequency: Some(frequency),
                    day_of_week: weekday,
                    day_of_month: monthday,
                    time_of_day: time,
                    duration_minutes: duration,
                    category,
                    priority,
                    active: None,
                };
                commands::rule::add(&config, draft, now).await
            }
            RuleCommand::List => commands::rule::list(&config).await,
            RuleCommand::Enable { id } => commands::rule::set_active(&config, &id, true).await,
            RuleCommand::Disable { id } => commands::rule::set_active(&config, &id, false).await,
            RuleCommand::Remove { id } => commands::rule::remove(&config, &id).await,
        },
        Commands::Event { command } => match command {
            EventCommand::Add {
                title,
                start,
                duration,
                location,
                priority,
            } => {
                let duration = duration.as_deref();
                commands::event::add(&config, title, &start, duration, location, priority).await
            }
        },
        Commands::Task { command } => match command {
            TaskCommand::Add { title, due, priority } => {
                commands::task::add(&config, title, due.as_deref(), priority).await
            }
        },
    }
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let level = if debug {
        "agenda_core=debug,agenda=debug,warn"
    } else {
        "agenda_core=info,agenda=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .with_writer(std::io::stderr)
        .compact();

    let _ = subscriber.try_init();
}
