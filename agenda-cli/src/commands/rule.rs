use agenda_core::config::AgendaConfig;
use agenda_core::store::RuleStore;
use agenda_core::validation::RuleDraft;
use agenda_core::RecurringActivityRule;
use anyhow::Result;
use chrono::NaiveDateTime;
use owo_colors::OwoColorize;

use crate::render::Render;

pub async fn add(config: &AgendaConfig, draft: RuleDraft, now: NaiveDateTime) -> Result<()> {
    let rule = draft.validate_new(now)?;
    let rule = config.store().create_rule(rule).await?;

    println!("{}", format!("  Created: {}", rule.name).green());
    println!("  {}", rule.render());

    Ok(())
}

pub async fn list(config: &AgendaConfig) -> Result<()> {
    let rules = config.store().list_rules().await?;

    if rules.is_empty() {
        let message = format!(
            "No rules in {} yet. Add one with `agenda rule add`.",
            config.display_path().display()
        );
        println!("{}", message.dimmed());
        return Ok(());
    }

    println!("{}", format!("Rules in {}:", config.display_path().display()).dimmed());
    for rule in &rules {
        println!("{}", rule.render());
    }

    Ok(())
}

pub async fn set_active(config: &AgendaConfig, id: &str, active: bool) -> Result<()> {
    let store = config.store();
    let mut rule = resolve(&store, id).await?;

    if rule.active == active {
        println!("{}", format!("  {} is already {}", rule.name, state(active)).dimmed());
        return Ok(());
    }

    rule.active = active;
    let rule = store.update_rule(rule).await?;
    let verb = if active { "Enabled" } else { "Disabled" };
    println!("{}", format!("  {}: {}", verb, rule.name).green());

    Ok(())
}

pub async fn remove(config: &AgendaConfig, id: &str) -> Result<()> {
    let store = config.store();
    let rule = resolve(&store, id).await?;

    store.delete_rule(&rule.id).await?;
    println!("{}", format!("  Removed: {}", rule.name).red());

    Ok(())
}

/// Find a rule by full id or unique id prefix.
async fn resolve(store: &dyn RuleStore, id: &str) -> Result<RecurringActivityRule> {
    if let Some(rule) = store.get_rule(id).await? {
        return Ok(rule);
    }

    let mut matches: Vec<_> = store
        .list_rules()
        .await?
        .into_iter()
        .filter(|r| r.id.starts_with(id))
        .collect();

    match matches.len() {
        0 => anyhow::bail!("No rule with id '{}'", id),
        1 => Ok(matches.remove(0)),
        n => anyhow::bail!("Id prefix '{}' matches {} rules; use more characters", id, n),
    }
}

fn state(active: bool) -> &'static str {
    if active { "enabled" } else { "disabled" }
}
