//! Item catalog stored as an arena with index-based dependency edges.
//!
//! Forward edges (constituents) come from the catalog file. The reverse
//! `used_in` edges are derived once at build time and never written back.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::models::{Item, ItemId};
use crate::error::{Result, SrsError};

#[derive(Debug, Clone)]
struct Node {
    item: Item,
    constituents: Vec<usize>,
    used_in: Vec<usize>,
}

/// Read-only set of learnable items shared by every user
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    nodes: Vec<Node>,
    index: HashMap<ItemId, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids and dangling constituents
    pub fn from_items(items: Vec<Item>) -> Result<Self> {
        let mut index = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            if index.insert(item.id, pos).is_some() {
                return Err(SrsError::InvalidCatalog(format!(
                    "duplicate item id {}",
                    item.id
                )));
            }
        }

        let mut nodes: Vec<Node> = Vec::with_capacity(items.len());
        for item in items {
            let mut constituents = Vec::with_capacity(item.constituents.len());
            for dep in &item.constituents {
                let pos = index.get(dep).copied().ok_or_else(|| {
                    SrsError::InvalidCatalog(format!(
                        "item {} lists unknown constituent {}",
                        item.id, dep
                    ))
                })?;
                if !constituents.contains(&pos) {
                    constituents.push(pos);
                }
            }
            nodes.push(Node {
                item,
                constituents,
                used_in: Vec::new(),
            });
        }

        for pos in 0..nodes.len() {
            for dep in nodes[pos].constituents.clone() {
                nodes[dep].used_in.push(pos);
            }
        }

        log::debug!("Built catalog with {} items", nodes.len());
        Ok(Self { nodes, index })
    }

    /// Load a catalog from a JSON array of items
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let items: Vec<Item> = serde_json::from_str(&content)?;
        Self::from_items(items)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.index.get(&id).map(|&pos| &self.nodes[pos].item)
    }

    /// Like `get`, but a missing item is an error
    pub fn require(&self, id: ItemId) -> Result<&Item> {
        self.get(id).ok_or(SrsError::ItemNotFound(id))
    }

    /// Direct prerequisites of an item
    pub fn constituents(&self, id: ItemId) -> Vec<&Item> {
        self.neighbours(id, |node| &node.constituents)
    }

    /// Items that list `id` as a constituent
    pub fn used_in(&self, id: ItemId) -> Vec<&Item> {
        self.neighbours(id, |node| &node.used_in)
    }

    /// Level 0 items, mastered for every user from the start
    pub fn ground_items(&self) -> impl Iterator<Item = &Item> {
        self.iter().filter(|item| item.is_ground())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.nodes.iter().map(|node| &node.item)
    }

    /// Items whose literal or meaning contains `query`, ignoring case,
    /// ordered by level then id. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<&Item> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<&Item> = self
            .iter()
            .filter(|item| {
                item.literal.to_lowercase().contains(&needle)
                    || item.meaning.to_lowercase().contains(&needle)
            })
            .collect();
        hits.sort_by_key(|item| (item.level, item.id));
        hits
    }

    /// Sort key used by every listing: level, then curation priority
    pub fn order_key(&self, id: ItemId) -> (u32, u32, ItemId) {
        match self.get(id) {
            Some(item) => (item.level, item.priority, id),
            None => (u32::MAX, u32::MAX, id),
        }
    }

    fn neighbours<F>(&self, id: ItemId, edges: F) -> Vec<&Item>
    where
        F: Fn(&Node) -> &Vec<usize>,
    {
        match self.index.get(&id) {
            Some(&pos) => edges(&self.nodes[pos])
                .iter()
                .map(|&other| &self.nodes[other].item)
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemType;
    use tempfile::TempDir;

    fn sample() -> Vec<Item> {
        vec![
            Item::new(1, ItemType::Radical, "⼈", 1),
            Item::new(2, ItemType::Kanji, "人", 1)
                .with_priority(2)
                .with_constituents([1]),
            Item::new(3, ItemType::Vocab, "人々", 1)
                .with_priority(3)
                .with_constituents([2]),
        ]
    }

    #[test]
    fn test_edges_and_reverse_index() {
        let catalog = Catalog::from_items(sample()).unwrap();

        let deps: Vec<ItemId> = catalog.constituents(ItemId(2)).iter().map(|i| i.id).collect();
        assert_eq!(deps, vec![ItemId(1)]);

        let users: Vec<ItemId> = catalog.used_in(ItemId(2)).iter().map(|i| i.id).collect();
        assert_eq!(users, vec![ItemId(3)]);

        assert!(catalog.constituents(ItemId(1)).is_empty());
        assert!(catalog.used_in(ItemId(99)).is_empty());
    }

    #[test]
    fn test_search_literal_and_meaning() {
        let items = vec![
            Item::new(5, ItemType::Kanji, "大", 2).with_meaning("Big"),
            Item::new(4, ItemType::Kanji, "人", 1).with_meaning("person"),
            Item::new(3, ItemType::Vocab, "大人", 2).with_meaning("adult"),
            Item::new(9, ItemType::Vocab, "人々", 1).with_meaning("people"),
        ];
        let catalog = Catalog::from_items(items).unwrap();

        let ids = |query: &str| -> Vec<ItemId> {
            catalog.search(query).iter().map(|item| item.id).collect()
        };
        assert_eq!(ids("人"), vec![ItemId(4), ItemId(9), ItemId(3)]);
        assert_eq!(ids("  BIG "), vec![ItemId(5)]);
        assert_eq!(ids("peop"), vec![ItemId(9)]);
        assert!(ids("").is_empty());
        assert!(ids("tree").is_empty());
    }

    #[test]
    fn test_rejects_dangling_constituent() {
        let items = vec![Item::new(1, ItemType::Kanji, "水", 1).with_constituents([7])];
        let err = Catalog::from_items(items).unwrap_err();
        assert!(matches!(err, SrsError::InvalidCatalog(_)));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let items = vec![
            Item::new(1, ItemType::Radical, "一", 1),
            Item::new(1, ItemType::Radical, "二", 1),
        ];
        assert!(Catalog::from_items(items).is_err());
    }

    #[test]
    fn test_load_from_json() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("catalog.json");
        fs::write(
            &path,
            r#"[
                {"id": 10, "type": "radical", "literal": "丶", "level": 0},
                {"id": 11, "type": "kanji", "literal": "主", "meaning": "master",
                 "level": 2, "priority": 4, "constituents": [10]}
            ]"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.require(ItemId(11)).unwrap().priority, 4);
        assert_eq!(catalog.ground_items().count(), 1);
        assert!(matches!(
            catalog.require(ItemId(12)),
            Err(SrsError::ItemNotFound(ItemId(12)))
        ));
    }
}
