//! Error type shared by the scheduling engine, planner and store

use thiserror::Error;
use uuid::Uuid;

use crate::catalog::ItemId;

#[derive(Error, Debug)]
pub enum SrsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Cannot move item {item} out of stage {stage}")]
    InvalidStateTransition { item: ItemId, stage: String },

    #[error("Stored stage value {0:?} is not a known SRS stage")]
    CorruptStage(String),

    #[error("Corrupt stored record: {0}")]
    CorruptRecord(String),

    #[error("Item not found: {0}")]
    ItemNotFound(ItemId),

    #[error("No progress for item {item} (user {user})")]
    ProgressNotFound { user: Uuid, item: ItemId },

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Progress store lock poisoned")]
    StoragePoisoned,
}

impl SrsError {
    /// Internal inconsistencies, as opposed to errors the caller can fix.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SrsError::CorruptStage(_)
                | SrsError::CorruptRecord(_)
                | SrsError::InvalidCatalog(_)
                | SrsError::StoragePoisoned
                | SrsError::Sqlite(_)
                | SrsError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SrsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(SrsError::CorruptStage("G9".to_string()).is_fatal());
        assert!(!SrsError::ItemNotFound(ItemId(3)).is_fatal());
        assert!(!SrsError::InvalidTimezone("Mars/Olympus".to_string()).is_fatal());
    }

    #[test]
    fn test_messages_name_the_item() {
        let err = SrsError::InvalidStateTransition {
            item: ItemId(42),
            stage: "burned".to_string(),
        };
        assert!(err.to_string().contains("42"));
    }
}
