use std::sync::Arc;
use std::time::Duration;

use agenda_core::config::AgendaConfig;
use agenda_core::materialize::MaterializeReport;
use agenda_core::schedule::{MaterializationPolicy, Scheduler};
use agenda_core::store::RuleStore;
use agenda_core::OccurrenceMaterializer;
use anyhow::Result;
use chrono::Local;
use owo_colors::OwoColorize;
use tracing::{info, warn};

use crate::render::Render;
use crate::utils::create_spinner;

pub async fn run(config: &AgendaConfig, days: Option<i64>, every: Option<Duration>) -> Result<()> {
    let store = Arc::new(config.store());
    let policy = days.map(MaterializationPolicy::new).unwrap_or_else(|| config.policy());
    let scheduler = Scheduler::new(Arc::new(OccurrenceMaterializer::new(store.clone())), policy);

    let Some(every) = every else {
        let report = sweep_once(store.as_ref(), &scheduler, true).await?;
        println!("{}", report.render());
        return Ok(());
    };

    info!(
        interval = %humantime::format_duration(every),
        lookahead_days = policy.lookahead_days,
        "sweeping periodically"
    );

    loop {
        match sweep_once(store.as_ref(), &scheduler, false).await {
            Ok(report) if report.inserted > 0 || !report.is_clean() => {
                let stamp = Local::now().format("%Y-%m-%d %H:%M").to_string();
                println!("{} {}", stamp.dimmed(), report.render());
            }
            Ok(_) => {}
            // Keep the loop alive; the store may come back
            Err(e) => warn!(error = %e, "sweep failed"),
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(every) => {}
        }
    }

    Ok(())
}

async fn sweep_once(
    rules: &dyn RuleStore,
    scheduler: &Scheduler,
    interactive: bool,
) -> Result<MaterializeReport> {
    // Re-read the clock each round so long-running sweeps roll over midnight
    let today = Local::now().date_naive();
    let window = scheduler.policy().window(today);

    let spinner = interactive.then(|| create_spinner(format!("Sweeping {}", window)));
    let result = async {
        let active = rules.list_active(None).await?;
        scheduler.sweep(&active, today).await
    }
    .await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    Ok(result?)
}
