use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub fn run(
    app: &App,
    query: &str,
    limit: Option<usize>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let hits = app
        .engine
        .search(app.user_id, query, limit)
        .with_context(|| format!("Search for '{}' failed", query))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        OutputFormat::Plain => {
            if hits.is_empty() {
                println!("No items matching '{}'.", query);
                return Ok(());
            }

            for study in &hits {
                println!(
                    "{:<8} {}  level {}  {}",
                    study.item.item_type.as_str(),
                    terminal::item_label(&study.item, use_color),
                    study.item.level,
                    terminal::stage_label(study.progress.stage, use_color)
                );
            }
            println!("\n{} results", hits.len());
        }
    }

    Ok(())
}
