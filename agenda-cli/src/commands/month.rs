use agenda_core::calendar::ViewBuilder;
use agenda_core::config::AgendaConfig;
use anyhow::Result;
use chrono::NaiveDate;

use crate::render::{render_failures, render_month};

pub async fn run(config: &AgendaConfig, year: i32, month: u32, today: NaiveDate) -> Result<()> {
    let composer = config.composer();
    let grid = composer.build_month_grid(year, month, today).await?;

    let view = ViewBuilder::new(config.max_events_per_day);
    println!("{}", render_month(&grid.value, year, month, &view));

    if let Some(failures) = render_failures(&grid.failures) {
        println!("\n{}", failures);
    }

    Ok(())
}
