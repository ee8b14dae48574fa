use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, tz: &str, format: &OutputFormat) -> Result<()> {
    let forecast = app
        .engine
        .get_review_forecast(app.user_id, tz)
        .with_context(|| format!("Failed to build forecast for {}", tz))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&forecast)?);
        }
        OutputFormat::Plain => {
            println!("Upcoming reviews ({})", tz);
            for (day, hours) in &forecast.days {
                let busy: Vec<String> = hours
                    .iter()
                    .filter(|(_, bucket)| bucket.count > 0)
                    .map(|(hour, bucket)| format!("{}:00 +{}", hour, bucket.count))
                    .collect();
                let total = hours.values().last().map_or(0, |bucket| bucket.cumulative);
                if busy.is_empty() {
                    println!("  {}  -  (total {})", day, total);
                } else {
                    println!("  {}  {}  (total {})", day, busy.join(", "), total);
                }
            }
        }
    }

    Ok(())
}
