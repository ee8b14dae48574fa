use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run(app: &App, query: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let item = app.find_item(query)?;
    let study = app
        .engine
        .get_progress(app.user_id, item.id)
        .with_context(|| format!("Failed to load progress for item {}", item.id))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&study)?);
        }
        OutputFormat::Plain => {
            let catalog = app.engine.catalog();
            let progress = &study.progress;

            println!(
                "{}",
                terminal::paint(&item.literal, Color::BOLD, use_color)
            );
            if !item.meaning.is_empty() {
                println!("{}", item.meaning);
            }
            println!(
                "{} · level {} · {}",
                item.item_type.as_str(),
                item.level,
                terminal::stage_label(progress.stage, use_color)
            );

            let parts: Vec<String> = catalog
                .constituents(item.id)
                .into_iter()
                .map(|part| terminal::item_label(part, use_color))
                .collect();
            if !parts.is_empty() {
                println!("\nParts:   {}", parts.join(", "));
            }
            let used_in: Vec<String> = catalog
                .used_in(item.id)
                .into_iter()
                .map(|user| terminal::item_label(user, use_color))
                .collect();
            if !used_in.is_empty() {
                println!("Used in: {}", used_in.join(", "));
            }

            println!();
            println!("Unlocked:     {}", terminal::format_time(progress.unlocked_at));
            println!("Last review:  {}", terminal::format_time(progress.last_reviewed_at));
            println!("Next review:  {}", terminal::format_time(progress.next_review_at));

            if !progress.review_history.is_empty() {
                let correct = progress.review_history.iter().filter(|r| r.correct).count();
                println!(
                    "History:      {}/{} correct",
                    correct,
                    progress.review_history.len()
                );
            }
            if !progress.user_synonyms.is_empty() {
                println!("Synonyms:     {}", progress.user_synonyms.join(", "));
            }
            for sentence in &progress.user_sentences {
                println!(
                    "{}",
                    terminal::paint(&format!("  「{}」", sentence), Color::DIM, use_color)
                );
            }
        }
    }

    Ok(())
}
