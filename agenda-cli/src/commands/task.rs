use agenda_core::config::AgendaConfig;
use agenda_core::store::TaskStore;
use agenda_core::{Priority, Task};
use anyhow::Result;
use owo_colors::OwoColorize;

use crate::utils::dates::parse_date;

pub async fn add(
    config: &AgendaConfig,
    title: String,
    due: Option<&str>,
    priority: Option<String>,
) -> Result<()> {
    let due_date = due.map(parse_date).transpose()?;

    let mut task = Task::new(title, due_date);
    if let Some(p) = priority {
        task.priority = p.parse::<Priority>().map_err(|e| anyhow::anyhow!(e))?;
    }

    let created = config.store().create_task(task).await?;
    match created.due_date {
        Some(date) => println!(
            "{} {}",
            format!("  Created: {}", created.title).green(),
            format!("due {}", date).dimmed()
        ),
        None => println!(
            "{} {}",
            format!("  Created: {}", created.title).green(),
            "(no due date, not shown on the calendar)".dimmed()
        ),
    }

    Ok(())
}
