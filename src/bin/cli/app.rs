use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use uuid::Uuid;

use kanjilearner_lib::config::default_data_dir;
use kanjilearner_lib::{Item, ItemId, SrsEngine};

const USER_FILE: &str = "user-id";

/// Shared application state for CLI commands
pub struct App {
    pub data_dir: PathBuf,
    pub engine: SrsEngine,
    pub user_id: Uuid,
}

impl App {
    /// Open the engine in `data_dir` (or the default data directory) for a user.
    /// Without `--user`, the id stored in the data directory is used, and
    /// created on first run.
    pub fn new(data_dir: Option<&Path>, user: Option<Uuid>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_data_dir().context("Failed to get data directory")?,
        };

        let engine = SrsEngine::open(&data_dir).with_context(|| {
            format!(
                "Failed to open data directory {} (is catalog.json there?)",
                data_dir.display()
            )
        })?;

        let user_id = match user {
            Some(id) => id,
            None => local_user(&data_dir)?,
        };

        Ok(Self {
            data_dir,
            engine,
            user_id,
        })
    }

    /// Parse an item argument: a numeric id, or a literal such as `木`
    pub fn find_item(&self, query: &str) -> Result<&Item> {
        if let Ok(id) = query.parse::<i64>() {
            return self
                .engine
                .catalog()
                .get(ItemId(id))
                .with_context(|| format!("No item with id {}", id));
        }

        let matches: Vec<&Item> = self
            .engine
            .catalog()
            .iter()
            .filter(|item| item.literal == query)
            .collect();

        match matches.len() {
            0 => anyhow::bail!("No item matching '{}'", query),
            1 => Ok(matches[0]),
            _ => anyhow::bail!(
                "Ambiguous item '{}'. Use an id:\n{}",
                query,
                matches
                    .iter()
                    .map(|item| format!("  {} ({}, level {})", item.id, item.item_type.as_str(), item.level))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
        }
    }
}

/// Read the local user id, creating one if the data directory has none
fn local_user(data_dir: &Path) -> Result<Uuid> {
    let path = data_dir.join(USER_FILE);
    if path.exists() {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Uuid::parse_str(content.trim())
            .with_context(|| format!("Invalid user id in {}", path.display()));
    }

    let id = Uuid::new_v4();
    fs::write(&path, id.to_string())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Created local user {}", id);
    Ok(id)
}
