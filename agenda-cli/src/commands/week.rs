use agenda_core::calendar::ViewBuilder;
use agenda_core::config::AgendaConfig;
use anyhow::Result;
use chrono::NaiveDate;

use crate::render::{render_failures, render_week};

pub async fn run(config: &AgendaConfig, anchor: NaiveDate, today: NaiveDate) -> Result<()> {
    let week = config.composer().build_week(anchor, today).await;

    let view = ViewBuilder::new(config.max_events_per_day);
    println!("{}", render_week(&week.value, &view));

    if let Some(failures) = render_failures(&week.failures) {
        println!("\n{}", failures);
    }

    Ok(())
}
