use anyhow::{Context, Result};

use kanjilearner_lib::PlanOutcome;

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub fn run_plan(app: &App, query: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let item = app.find_item(query)?;
    let outcome = app
        .engine
        .plan_entry(app.user_id, item.id)
        .with_context(|| format!("Failed to plan item {}", item.id))?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "itemId": item.id,
                "outcome": outcome,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let label = terminal::item_label(item, use_color);
            match outcome {
                PlanOutcome::AlreadyStarted => println!("{} is already unlocked.", label),
                PlanOutcome::Unlocked => println!("{} is ready as a lesson.", label),
                PlanOutcome::Planned => {
                    println!("{} will unlock once its parts are learned.", label);
                    let pending: Vec<String> = app
                        .engine
                        .catalog()
                        .constituents(item.id)
                        .into_iter()
                        .map(|part| terminal::item_label(part, use_color))
                        .collect();
                    if !pending.is_empty() {
                        println!("  Parts: {}", pending.join(", "));
                    }
                }
            }
        }
    }

    Ok(())
}

pub fn run_list(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let planned = app
        .engine
        .get_planned(app.user_id)
        .context("Failed to list planned items")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&planned)?);
        }
        OutputFormat::Plain => {
            if planned.is_empty() {
                println!("Nothing planned.");
                return Ok(());
            }

            for study in &planned {
                println!(
                    "{}  level {}",
                    terminal::item_label(&study.item, use_color),
                    study.item.level
                );
            }
            println!("\n{} planned", planned.len());
        }
    }

    Ok(())
}
