//! Prerequisite planning and planned queue reconciliation
//!
//! `plan_entry` walks an item's constituents depth-first. Constituents with no
//! progress yet are planned recursively; locked ones are unlocked directly so
//! the learner can start on them. The item itself unlocks only when every
//! constituent is mastered, otherwise it waits in the planned queue.
//!
//! `process_planned_entries` re-checks that queue against one snapshot of the
//! user's progress. Each promotion that crosses the mastery bar lets the next
//! level unlock on the following call, so a chain resolves one step at a time.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{Catalog, ItemId};
use crate::clock::Clock;
use crate::config::SrsConfig;
use crate::error::{Result, SrsError};
use crate::srs::{algorithm, Stage};
use crate::store::{self, SrsStorage};

/// What `plan_entry` did with the requested item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanOutcome {
    /// Already unlocked or mastered, nothing to do
    AlreadyStarted,
    /// All prerequisites mastered, moved to lessons
    Unlocked,
    /// Waiting on prerequisites
    Planned,
}

pub struct Planner<'a> {
    catalog: &'a Catalog,
    storage: &'a SrsStorage,
    config: &'a SrsConfig,
    clock: &'a dyn Clock,
}

impl<'a> Planner<'a> {
    pub fn new(
        catalog: &'a Catalog,
        storage: &'a SrsStorage,
        config: &'a SrsConfig,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            catalog,
            storage,
            config,
            clock,
        }
    }

    fn now(&self) -> DateTime<Utc> {
        store::stored_time(self.clock.now())
    }

    /// Add an item to the user's lessons, or to the planned queue if its
    /// prerequisites are not mastered yet
    pub fn plan_entry(&self, user_id: Uuid, item_id: ItemId) -> Result<PlanOutcome> {
        self.catalog.require(item_id)?;
        let mut path = HashSet::new();
        self.plan(user_id, item_id, 0, &mut path)
    }

    fn plan(
        &self,
        user_id: Uuid,
        item_id: ItemId,
        depth: usize,
        path: &mut HashSet<ItemId>,
    ) -> Result<PlanOutcome> {
        if depth > self.config.max_plan_depth {
            return Err(SrsError::InvalidCatalog(format!(
                "planning item {} went deeper than {} levels",
                item_id, self.config.max_plan_depth
            )));
        }

        match self.storage.get_progress(user_id, item_id)? {
            Some(record) if record.stage.is_unlocked() => {
                return Ok(PlanOutcome::AlreadyStarted);
            }
            Some(_) => {}
            None => {
                self.storage.get_or_create_progress(user_id, item_id)?;
            }
        }

        path.insert(item_id);
        let mut all_ready = true;
        for constituent in self.catalog.constituents(item_id) {
            let dep = constituent.id;
            if path.contains(&dep) {
                log::warn!("Dependency cycle through item {} while planning {}", dep, item_id);
                all_ready = false;
                continue;
            }

            match self.storage.get_progress(user_id, dep)? {
                Some(record) if self.config.is_mastered(record.stage) => {}
                Some(record) => {
                    all_ready = false;
                    if record.stage == Stage::Locked {
                        self.unlock(user_id, dep)?;
                    }
                }
                None => {
                    self.plan(user_id, dep, depth + 1, path)?;
                    all_ready = false;
                }
            }
        }
        path.remove(&item_id);

        if all_ready {
            self.unlock(user_id, item_id)?;
            Ok(PlanOutcome::Unlocked)
        } else {
            if self.storage.add_planned(user_id, item_id, self.now())? {
                log::info!("Planned item {} for user {}", item_id, user_id);
            }
            Ok(PlanOutcome::Planned)
        }
    }

    fn unlock(&self, user_id: Uuid, item_id: ItemId) -> Result<()> {
        let now = self.now();
        let (_, changed) = self
            .storage
            .update_progress(user_id, item_id, true, |record| {
                Ok(algorithm::unlock(record, now))
            })?;
        if changed {
            log::info!("Unlocked item {} for user {}", item_id, user_id);
        }
        Ok(())
    }

    /// Unlock every planned item whose constituents are all mastered.
    /// Returns the items that moved to lessons.
    pub fn process_planned_entries(&self, user_id: Uuid) -> Result<Vec<ItemId>> {
        let stages: HashMap<ItemId, Stage> = self
            .storage
            .list_progress(user_id)?
            .into_iter()
            .map(|record| (record.item_id, record.stage))
            .collect();

        let now = self.now();
        let mut unlocked = Vec::new();
        for entry in self.storage.list_planned(user_id)? {
            if !self.catalog.contains(entry.item_id) {
                self.storage.remove_planned(user_id, entry.item_id)?;
                log::warn!(
                    "Dropped planned item {} for user {}: no longer in the catalog",
                    entry.item_id,
                    user_id
                );
                continue;
            }

            let ready = self
                .catalog
                .constituents(entry.item_id)
                .iter()
                .all(|dep| {
                    stages
                        .get(&dep.id)
                        .map_or(false, |stage| self.config.is_mastered(*stage))
                });
            if !ready {
                continue;
            }

            self.storage.resolve_planned(user_id, entry.item_id, |record| {
                algorithm::unlock(record, now);
            })?;
            log::info!(
                "Prerequisites met, unlocked planned item {} for user {}",
                entry.item_id,
                user_id
            );
            unlocked.push(entry.item_id);
        }

        Ok(unlocked)
    }
}
