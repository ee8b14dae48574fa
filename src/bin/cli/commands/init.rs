use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let created = app
        .engine
        .initialize_user(app.user_id)
        .context("Failed to initialize user")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "userId": app.user_id.to_string(),
                "dataDir": app.data_dir.to_string_lossy(),
                "burned": created,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("User {} ({})", app.user_id, app.data_dir.display());
            if created == 0 {
                println!("Already initialized.");
            } else {
                println!("{} starter items marked as known.", created);
            }
        }
    }

    Ok(())
}
