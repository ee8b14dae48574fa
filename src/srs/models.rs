//! Data models for per-user SRS progress

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::ItemId;
use crate::error::SrsError;

/// Position of an item in the spaced repetition progression.
///
/// Variants are declared in progression order, so `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    /// Not yet available to the learner
    Locked,
    /// Unlocked, lesson not yet taken
    Lesson,
    Apprentice1,
    Apprentice2,
    Apprentice3,
    Apprentice4,
    Guru1,
    Guru2,
    Master,
    Enlightened,
    /// Terminal, never reviewed again
    Burned,
}

impl Stage {
    /// Every stage, in progression order
    pub const ORDER: [Stage; 11] = [
        Stage::Locked,
        Stage::Lesson,
        Stage::Apprentice1,
        Stage::Apprentice2,
        Stage::Apprentice3,
        Stage::Apprentice4,
        Stage::Guru1,
        Stage::Guru2,
        Stage::Master,
        Stage::Enlightened,
        Stage::Burned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Locked => "locked",
            Stage::Lesson => "lesson",
            Stage::Apprentice1 => "apprentice1",
            Stage::Apprentice2 => "apprentice2",
            Stage::Apprentice3 => "apprentice3",
            Stage::Apprentice4 => "apprentice4",
            Stage::Guru1 => "guru1",
            Stage::Guru2 => "guru2",
            Stage::Master => "master",
            Stage::Enlightened => "enlightened",
            Stage::Burned => "burned",
        }
    }

    /// Stages that can show up in the review queue
    pub fn is_reviewable(&self) -> bool {
        !matches!(self, Stage::Locked | Stage::Burned)
    }

    pub fn is_unlocked(&self) -> bool {
        *self != Stage::Locked
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = SrsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ORDER
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| SrsError::CorruptStage(s.to_string()))
    }
}

/// One answered review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub reviewed_at: DateTime<Utc>,
    pub correct: bool,
    /// Stage the item landed in
    pub stage: Stage,
}

/// Progress of one user on one catalog item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub user_id: Uuid,
    pub item_id: ItemId,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_review_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub review_history: Vec<ReviewOutcome>,
    #[serde(default)]
    pub user_synonyms: Vec<String>,
    #[serde(default)]
    pub user_sentences: Vec<String>,
}

impl ProgressRecord {
    /// A fresh, locked record
    pub fn new(user_id: Uuid, item_id: ItemId) -> Self {
        Self {
            user_id,
            item_id,
            stage: Stage::Locked,
            unlocked_at: None,
            last_reviewed_at: None,
            next_review_at: None,
            review_history: Vec::new(),
            user_synonyms: Vec::new(),
            user_sentences: Vec::new(),
        }
    }

    /// Check if the item is waiting in the review queue
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.stage.is_reviewable() && self.next_review_at.map_or(false, |at| at <= now)
    }
}

/// What a transition left behind, returned to callers of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    pub item_id: ItemId,
    pub stage: Stage,
    pub next_review_at: Option<DateTime<Utc>>,
    /// False when the operation was a no-op guard
    pub changed: bool,
}

impl ReviewResult {
    pub fn of(record: &ProgressRecord, changed: bool) -> Self {
        Self {
            item_id: record.item_id,
            stage: record.stage,
            next_review_at: record.next_review_at,
            changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_round_trips_through_text() {
        for stage in Stage::ORDER {
            assert_eq!(stage.as_str().parse::<Stage>().unwrap(), stage);
        }
        assert!(matches!(
            "G1".parse::<Stage>(),
            Err(SrsError::CorruptStage(_))
        ));
    }

    #[test]
    fn test_stage_ordering_follows_progression() {
        assert!(Stage::Locked < Stage::Lesson);
        assert!(Stage::Apprentice4 < Stage::Guru1);
        assert!(Stage::Enlightened < Stage::Burned);
        assert_eq!(
            serde_json::to_string(&Stage::Apprentice3).unwrap(),
            "\"apprentice3\""
        );
    }

    #[test]
    fn test_lesson_is_never_due() {
        let mut record = ProgressRecord::new(Uuid::new_v4(), ItemId(1));
        record.stage = Stage::Lesson;
        assert!(!record.is_due(Utc::now()));
    }
}
