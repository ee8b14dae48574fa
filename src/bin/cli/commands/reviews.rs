use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run_list(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let due = app
        .engine
        .get_pending_reviews(app.user_id)
        .context("Failed to list reviews")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&due)?);
        }
        OutputFormat::Plain => {
            if due.is_empty() {
                println!("No reviews due.");
                return Ok(());
            }

            for record in &due {
                let label = match app.engine.catalog().get(record.item_id) {
                    Some(item) => terminal::item_label(item, use_color),
                    None => format!("#{}", record.item_id),
                };
                println!("{:<24} {}", label, terminal::stage_label(record.stage, use_color));
            }
            println!("\n{} reviews due", due.len());
        }
    }

    Ok(())
}

pub fn run_answer(
    app: &App,
    query: &str,
    correct: bool,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let item = app.find_item(query)?;
    let result = app
        .engine
        .submit_review(app.user_id, item.id, correct)
        .with_context(|| format!("Failed to review item {}", item.id))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Plain => {
            let verdict = if correct {
                terminal::paint("correct", Color::GREEN, use_color)
            } else {
                terminal::paint("wrong", Color::RED, use_color)
            };
            println!(
                "{} {}: now {}, next review {}",
                terminal::item_label(item, use_color),
                verdict,
                terminal::stage_label(result.stage, use_color),
                terminal::format_time(result.next_review_at)
            );
        }
    }

    Ok(())
}
