use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let mistakes = app
        .engine
        .get_recent_mistakes(app.user_id)
        .context("Failed to list mistakes")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&mistakes)?);
        }
        OutputFormat::Plain => {
            if mistakes.is_empty() {
                println!("No recent mistakes.");
                return Ok(());
            }

            for mistake in &mistakes {
                let label = match app.engine.catalog().get(mistake.item_id) {
                    Some(item) => terminal::item_label(item, use_color),
                    None => format!("#{}", mistake.item_id),
                };
                println!("{}  {}", terminal::format_time(Some(mistake.timestamp)), label);
            }
            println!("\n{} mistakes", mistakes.len());
        }
    }

    Ok(())
}
