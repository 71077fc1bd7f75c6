use agenda_core::calendar::ViewBuilder;
use agenda_core::config::AgendaConfig;
use anyhow::Result;
use chrono::NaiveDate;

use super::DAY_PAGE_SIZE;
use crate::render::{render_day, render_failures};

pub async fn run(
    config: &AgendaConfig,
    date: NaiveDate,
    page: usize,
    today: NaiveDate,
) -> Result<()> {
    let day = config.composer().build_day(date, today).await;

    let view = ViewBuilder::new(config.max_events_per_day);
    let page = view.paginate(&day.value.events, page, DAY_PAGE_SIZE);
    println!("{}", render_day(&day.value, &page));

    if let Some(failures) = render_failures(&day.failures) {
        println!("\n{}", failures);
    }

    Ok(())
}
