//! Tunable scheduling policy, read from `config.toml` in the data directory

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SrsError};
use crate::srs::Stage;

/// Stage at which an item counts as mastered for unlocking its dependents
pub const DEFAULT_MASTERY_THRESHOLD: Stage = Stage::Guru1;

/// Ten years; longer windows would overflow chrono's duration range
pub const MAX_MISTAKE_WINDOW_HOURS: i64 = 10 * 366 * 24;

pub const MAX_FORECAST_DAYS: u32 = 366;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct SrsConfig {
    /// Items at or above this stage satisfy dependents' prerequisites
    pub mastery_threshold: Stage,
    /// Age after which a recorded mistake is purged
    pub mistake_window_hours: i64,
    /// Most mistakes kept per user
    pub mistake_cap: usize,
    /// Days covered by the review forecast, today included
    pub forecast_days: u32,
    /// Recursion bound for prerequisite planning
    pub max_plan_depth: usize,
    /// Default page size for lesson listings
    pub default_list_limit: usize,
    pub max_synonyms: usize,
    pub max_synonym_chars: usize,
    pub max_sentences: usize,
    pub max_sentence_chars: usize,
}

impl Default for SrsConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: DEFAULT_MASTERY_THRESHOLD,
            mistake_window_hours: 24,
            mistake_cap: 50,
            forecast_days: 7,
            max_plan_depth: 16,
            default_list_limit: 100,
            max_synonyms: 10,
            max_synonym_chars: 50,
            max_sentences: 2,
            max_sentence_chars: 1000,
        }
    }
}

impl SrsConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: SrsConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.mastery_threshold <= Stage::Lesson {
            return Err(SrsError::Config(format!(
                "mastery_threshold must be a reviewed stage, got {}",
                self.mastery_threshold
            )));
        }
        if self.mistake_window_hours <= 0 || self.mistake_window_hours > MAX_MISTAKE_WINDOW_HOURS {
            return Err(SrsError::Config(format!(
                "mistake_window_hours must be between 1 and {}, got {}",
                MAX_MISTAKE_WINDOW_HOURS, self.mistake_window_hours
            )));
        }
        if self.forecast_days > MAX_FORECAST_DAYS {
            return Err(SrsError::Config(format!(
                "forecast_days must be at most {}, got {}",
                MAX_FORECAST_DAYS, self.forecast_days
            )));
        }
        if self.mistake_cap == 0 || self.forecast_days == 0 || self.max_plan_depth == 0 {
            return Err(SrsError::Config(
                "mistake_cap, forecast_days and max_plan_depth must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `stage` clears the mastery bar
    pub fn is_mastered(&self, stage: Stage) -> bool {
        stage >= self.mastery_threshold
    }

    /// Validate user-supplied synonyms and example sentences
    pub fn check_user_content(&self, synonyms: &[String], sentences: &[String]) -> Result<()> {
        if synonyms.len() > self.max_synonyms {
            return Err(SrsError::Validation(format!(
                "You may not have more than {} user synonyms.",
                self.max_synonyms
            )));
        }
        if sentences.len() > self.max_sentences {
            return Err(SrsError::Validation(format!(
                "You may not have more than {} user sentences.",
                self.max_sentences
            )));
        }
        if synonyms
            .iter()
            .any(|s| s.chars().count() > self.max_synonym_chars)
        {
            return Err(SrsError::Validation(format!(
                "Each synonym must be {} characters or fewer.",
                self.max_synonym_chars
            )));
        }
        if sentences
            .iter()
            .any(|s| s.chars().count() > self.max_sentence_chars)
        {
            return Err(SrsError::Validation(format!(
                "Each sentence must be {} characters or fewer.",
                self.max_sentence_chars
            )));
        }
        Ok(())
    }
}

/// Default data directory (e.g. ~/.local/share/kanjilearner)
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("kanjilearner"))
        .ok_or_else(|| SrsError::Config("could not determine data directory".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_threshold_is_guru() {
        let config = SrsConfig::default();
        assert!(!config.is_mastered(Stage::Apprentice4));
        assert!(config.is_mastered(Stage::Guru1));
        assert!(config.is_mastered(Stage::Burned));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = SrsConfig::load(&temp.path().join("config.toml")).unwrap();
        assert_eq!(config, SrsConfig::default());
    }

    #[test]
    fn test_partial_file_overrides() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "mastery_threshold = \"master\"\nmistake_cap = 20\n").unwrap();

        let config = SrsConfig::load(&path).unwrap();
        assert_eq!(config.mastery_threshold, Stage::Master);
        assert_eq!(config.mistake_cap, 20);
        assert_eq!(config.mistake_window_hours, 24);
    }

    #[test]
    fn test_rejects_lesson_threshold() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "mastery_threshold = \"lesson\"\n").unwrap();
        assert!(matches!(SrsConfig::load(&path), Err(SrsError::Config(_))));
    }

    #[test]
    fn test_rejects_oversized_mistake_window() {
        let mut config = SrsConfig {
            mistake_window_hours: 3_000_000_000_000,
            ..SrsConfig::default()
        };
        assert!(matches!(config.validate(), Err(SrsError::Config(_))));

        config.mistake_window_hours = MAX_MISTAKE_WINDOW_HOURS;
        assert!(config.validate().is_ok());
        config.mistake_window_hours = MAX_MISTAKE_WINDOW_HOURS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_forecast() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, format!("forecast_days = {}\n", u32::MAX)).unwrap();
        assert!(matches!(SrsConfig::load(&path), Err(SrsError::Config(_))));

        let config = SrsConfig {
            forecast_days: MAX_FORECAST_DAYS,
            ..SrsConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_user_content_limits() {
        let config = SrsConfig::default();
        let ok = vec!["water".to_string()];
        assert!(config.check_user_content(&ok, &[]).is_ok());

        let too_many: Vec<String> = (0..11).map(|i| format!("syn{}", i)).collect();
        assert!(config.check_user_content(&too_many, &[]).is_err());

        let long = vec!["水".repeat(51)];
        assert!(config.check_user_content(&long, &[]).is_err());

        let exactly = vec!["水".repeat(50)];
        assert!(config.check_user_content(&exactly, &[]).is_ok());

        let sentences = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert!(matches!(
            config.check_user_content(&[], &sentences),
            Err(SrsError::Validation(_))
        ));
    }
}
