//! Data models for the item catalog

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a catalog item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Kind of learnable item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemType {
    Radical,
    Kanji,
    Vocab,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Radical => "radical",
            ItemType::Kanji => "kanji",
            ItemType::Vocab => "vocab",
        }
    }
}

/// A learnable unit in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// The character or string (e.g. 水, 食べる)
    pub literal: String,
    #[serde(default)]
    pub meaning: String,
    /// Level 0 items are treated as mastered from the start
    pub level: u32,
    /// Ordering within a level
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Items this one is built from
    #[serde(default)]
    pub constituents: Vec<ItemId>,
}

fn default_priority() -> u32 {
    1
}

impl Item {
    pub fn new(id: i64, item_type: ItemType, literal: &str, level: u32) -> Self {
        Self {
            id: ItemId(id),
            item_type,
            literal: literal.to_string(),
            meaning: String::new(),
            level,
            priority: default_priority(),
            constituents: Vec::new(),
        }
    }

    pub fn with_meaning(mut self, meaning: &str) -> Self {
        self.meaning = meaning.to_string();
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_constituents<I>(mut self, constituents: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        self.constituents = constituents.into_iter().map(ItemId).collect();
        self
    }

    /// Whether this item starts out mastered for every user
    pub fn is_ground(&self) -> bool {
        self.level == 0
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.literal, self.item_type.as_str())
    }
}
