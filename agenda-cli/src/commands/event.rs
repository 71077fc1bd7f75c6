use agenda_core::config::AgendaConfig;
use agenda_core::store::EventStore;
use agenda_core::{NewAppointment, Priority};
use anyhow::Result;
use chrono::Duration;
use owo_colors::OwoColorize;

use crate::utils::dates::{parse_datetime, parse_duration};

pub async fn add(
    config: &AgendaConfig,
    title: String,
    start: &str,
    duration: Option<&str>,
    location: Option<String>,
    priority: Option<String>,
) -> Result<()> {
    let start_time = parse_datetime(start)?;
    let length = match duration {
        Some(d) => parse_duration(d)?,
        None => Duration::hours(1),
    };
    if length <= Duration::zero() {
        anyhow::bail!("Duration must be positive");
    }

    let mut appointment = NewAppointment::new(title, start_time, start_time + length);
    appointment.location = location.filter(|l| !l.is_empty());
    if let Some(p) = priority {
        appointment.priority = p.parse::<Priority>().map_err(|e| anyhow::anyhow!(e))?;
    }

    let created = config.store().insert(appointment).await?;
    println!(
        "{} {}",
        format!("  Created: {}", created.title).green(),
        created.start_time.format("%a %Y-%m-%d %H:%M").to_string().dimmed()
    );

    Ok(())
}
