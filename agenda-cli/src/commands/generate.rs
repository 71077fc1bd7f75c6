use std::sync::Arc;

use agenda_core::config::AgendaConfig;
use agenda_core::store::RuleStore;
use agenda_core::{Frequency, OccurrenceMaterializer, Period};
use anyhow::Result;
use chrono::NaiveDate;
use owo_colors::OwoColorize;

use crate::render::Render;
use crate::utils::create_spinner;

pub async fn week(config: &AgendaConfig, today: NaiveDate) -> Result<()> {
    let store = Arc::new(config.store());
    let rules = store.list_active(Some(Frequency::Weekly)).await?;
    let materializer = OccurrenceMaterializer::new(store);

    let period = Period::week_of(today);
    let spinner = create_spinner(format!("Generating {}", period));
    let result = materializer.materialize_week(&rules, today).await;
    spinner.finish_and_clear();

    report(&period, result?.render(), rules.is_empty());
    Ok(())
}

pub async fn month(config: &AgendaConfig, today: NaiveDate) -> Result<()> {
    let store = Arc::new(config.store());
    let rules = store.list_active(Some(Frequency::Monthly)).await?;
    let materializer = OccurrenceMaterializer::new(store);

    let period = Period::month_of(today);
    let spinner = create_spinner(format!("Generating {}", period));
    let result = materializer.materialize_month(&rules, today).await;
    spinner.finish_and_clear();

    report(&period, result?.render(), rules.is_empty());
    Ok(())
}

fn report(period: &Period, rendered: String, no_rules: bool) {
    println!("{}", period.to_string().bold());
    if no_rules {
        println!("   {}", "No active rules for this period".dimmed());
    } else {
        println!("{}", rendered);
    }
}
