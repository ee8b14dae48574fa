use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub fn run_list(app: &App, limit: Option<usize>, format: &OutputFormat, use_color: bool) -> Result<()> {
    let lessons = app
        .engine
        .get_lessons(app.user_id, limit)
        .context("Failed to list lessons")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&lessons)?);
        }
        OutputFormat::Plain => {
            if lessons.is_empty() {
                println!("No lessons available.");
                return Ok(());
            }

            for study in &lessons {
                println!(
                    "{:<8} {}  level {}",
                    study.item.item_type.as_str(),
                    terminal::item_label(&study.item, use_color),
                    study.item.level
                );
            }
            println!("\n{} lessons", lessons.len());
        }
    }

    Ok(())
}

pub fn run_start(app: &App, query: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let item = app.find_item(query)?;
    let result = app
        .engine
        .complete_lesson(app.user_id, item.id)
        .with_context(|| format!("Failed to finish lesson for item {}", item.id))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Plain => {
            let label = terminal::item_label(item, use_color);
            if result.changed {
                println!(
                    "{} learned. First review {}.",
                    label,
                    terminal::format_time(result.next_review_at)
                );
            } else {
                println!(
                    "{} is not waiting for a lesson (stage {}).",
                    label,
                    terminal::stage_label(result.stage, use_color)
                );
            }
        }
    }

    Ok(())
}
