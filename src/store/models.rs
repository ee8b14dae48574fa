//! Rows owned by the store besides progress records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ItemId;

/// An item the user wants to learn whose prerequisites are not mastered yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedEntry {
    pub user_id: Uuid,
    pub item_id: ItemId,
    pub created_at: DateTime<Utc>,
}

/// One wrong answer, kept for a limited time for review prioritisation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentMistake {
    pub id: i64,
    pub user_id: Uuid,
    pub item_id: ItemId,
    pub timestamp: DateTime<Utc>,
}
