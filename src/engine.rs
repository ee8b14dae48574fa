//! The operations exposed to callers (HTTP handlers, the CLI).
//!
//! `SrsEngine` ties the read-only catalog to the per-user store. Promotions
//! never unlock dependents by themselves: after a successful review the
//! caller reconciles the planned queue, which `submit_review` does for you.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::{Catalog, Item, ItemId};
use crate::clock::{Clock, SystemClock};
use crate::config::SrsConfig;
use crate::error::{Result, SrsError};
use crate::forecast::{self, ReviewForecast};
use crate::planner::{PlanOutcome, Planner};
use crate::srs::{algorithm, ProgressRecord, ReviewResult, Stage};
use crate::store::{self, RecentMistake, SrsStorage};

/// A catalog item together with the user's progress on it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyItem {
    pub item: Item,
    pub progress: ProgressRecord,
}

pub struct SrsEngine {
    catalog: Arc<Catalog>,
    storage: SrsStorage,
    config: SrsConfig,
    clock: Arc<dyn Clock>,
}

impl SrsEngine {
    pub fn new(catalog: Arc<Catalog>, storage: SrsStorage, config: SrsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            catalog,
            storage,
            config,
            clock: Arc::new(SystemClock),
        })
    }

    /// Open `catalog.json`, `config.toml` and `srs.db` from a data directory
    pub fn open(data_dir: &Path) -> Result<Self> {
        let catalog = Catalog::load(&data_dir.join("catalog.json"))?;
        let config = SrsConfig::load(&data_dir.join("config.toml"))?;
        let storage = SrsStorage::open(&data_dir.join("srs.db"))?;
        Self::new(Arc::new(catalog), storage, config)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &SrsConfig {
        &self.config
    }

    fn now(&self) -> DateTime<Utc> {
        store::stored_time(self.clock.now())
    }

    fn planner(&self) -> Planner<'_> {
        Planner::new(&self.catalog, &self.storage, &self.config, self.clock.as_ref())
    }

    fn transition<F>(
        &self,
        user_id: Uuid,
        item_id: ItemId,
        create_missing: bool,
        step: F,
    ) -> Result<ReviewResult>
    where
        F: FnOnce(&mut ProgressRecord) -> Result<bool>,
    {
        self.catalog.require(item_id)?;
        let (record, changed) = self
            .storage
            .update_progress(user_id, item_id, create_missing, step)?;
        Ok(ReviewResult::of(&record, changed))
    }

    // ==================== Stage Transitions ====================

    /// Make an item available as a lesson. No-op if already unlocked.
    pub fn unlock(&self, user_id: Uuid, item_id: ItemId) -> Result<ReviewResult> {
        let now = self.now();
        let result = self.transition(user_id, item_id, true, |record| {
            Ok(algorithm::unlock(record, now))
        })?;
        if result.changed {
            log::info!("Unlocked item {} for user {}", item_id, user_id);
        }
        Ok(result)
    }

    /// Finish the lesson and schedule the first review
    pub fn complete_lesson(&self, user_id: Uuid, item_id: ItemId) -> Result<ReviewResult> {
        let now = self.now();
        let result = self.transition(user_id, item_id, false, |record| {
            Ok(algorithm::complete_lesson(record, now))
        })?;
        if result.changed {
            log::info!("User {} finished the lesson for item {}", user_id, item_id);
        }
        Ok(result)
    }

    /// Move up one stage. Dependents are not unlocked here; call
    /// `process_planned_entries` afterwards.
    pub fn promote(&self, user_id: Uuid, item_id: ItemId) -> Result<ReviewResult> {
        let now = self.now();
        let result = self.transition(user_id, item_id, false, |record| {
            algorithm::promote(record, now)
        })?;
        log::debug!(
            "Promote item {} for user {}: now {} (changed: {})",
            item_id,
            user_id,
            result.stage,
            result.changed
        );
        Ok(result)
    }

    /// Drop back after a wrong answer
    pub fn demote(&self, user_id: Uuid, item_id: ItemId) -> Result<ReviewResult> {
        let now = self.now();
        let result = self.transition(user_id, item_id, false, |record| {
            Ok(algorithm::demote(record, now))
        })?;
        log::debug!(
            "Demote item {} for user {}: now {} (changed: {})",
            item_id,
            user_id,
            result.stage,
            result.changed
        );
        Ok(result)
    }

    /// Apply a review answer: a correct one promotes and reconciles the
    /// planned queue, a wrong one demotes and logs the mistake
    pub fn submit_review(&self, user_id: Uuid, item_id: ItemId, correct: bool) -> Result<ReviewResult> {
        if correct {
            let result = self.promote(user_id, item_id)?;
            self.process_planned_entries(user_id)?;
            Ok(result)
        } else {
            let result = self.demote(user_id, item_id)?;
            self.record_recent_mistake(user_id, item_id)?;
            Ok(result)
        }
    }

    // ==================== Queues ====================

    /// Records whose review time has arrived, lowest level first
    pub fn get_pending_reviews(&self, user_id: Uuid) -> Result<Vec<ProgressRecord>> {
        let mut due = self.storage.list_due(user_id, self.now())?;
        due.sort_by_key(|record| self.catalog.order_key(record.item_id));
        Ok(due)
    }

    /// Unlocked items whose lesson has not been taken, by level then priority
    pub fn get_lessons(&self, user_id: Uuid, limit: Option<usize>) -> Result<Vec<StudyItem>> {
        let records = self.storage.list_progress_in_stage(user_id, Stage::Lesson)?;
        let mut lessons = self.with_items(records);
        lessons.truncate(limit.unwrap_or(self.config.default_list_limit));
        Ok(lessons)
    }

    /// Items waiting on prerequisites, with their (locked) progress
    pub fn get_planned(&self, user_id: Uuid) -> Result<Vec<StudyItem>> {
        let mut records = Vec::new();
        for entry in self.storage.list_planned(user_id)? {
            records.push(self.storage.get_or_create_progress(user_id, entry.item_id)?);
        }
        Ok(self.with_items(records))
    }

    /// Catalog items matching `query` in their literal or meaning, by level
    /// then id. Progress is created for each returned hit.
    pub fn search(&self, user_id: Uuid, query: &str, limit: Option<usize>) -> Result<Vec<StudyItem>> {
        if query.trim().is_empty() {
            return Err(SrsError::Validation("search query must not be empty".to_string()));
        }

        let limit = limit.unwrap_or(self.config.default_list_limit);
        self.catalog
            .search(query)
            .into_iter()
            .take(limit)
            .map(|item| {
                Ok(StudyItem {
                    item: item.clone(),
                    progress: self.storage.get_or_create_progress(user_id, item.id)?,
                })
            })
            .collect()
    }

    fn with_items(&self, records: Vec<ProgressRecord>) -> Vec<StudyItem> {
        let mut items: Vec<StudyItem> = records
            .into_iter()
            .filter_map(|progress| match self.catalog.get(progress.item_id) {
                Some(item) => Some(StudyItem {
                    item: item.clone(),
                    progress,
                }),
                None => {
                    log::warn!("Progress for unknown item {} skipped", progress.item_id);
                    None
                }
            })
            .collect();
        items.sort_by_key(|study| (study.item.level, study.item.priority, study.item.id));
        items
    }

    // ==================== Planning ====================

    pub fn plan_entry(&self, user_id: Uuid, item_id: ItemId) -> Result<PlanOutcome> {
        self.planner().plan_entry(user_id, item_id)
    }

    pub fn process_planned_entries(&self, user_id: Uuid) -> Result<Vec<ItemId>> {
        self.planner().process_planned_entries(user_id)
    }

    // ==================== Mistakes ====================

    pub fn record_recent_mistake(&self, user_id: Uuid, item_id: ItemId) -> Result<RecentMistake> {
        self.catalog.require(item_id)?;
        self.storage.record_mistake(
            user_id,
            item_id,
            self.now(),
            chrono::Duration::hours(self.config.mistake_window_hours),
            self.config.mistake_cap,
        )
    }

    /// Mistakes from the last window, newest first
    pub fn get_recent_mistakes(&self, user_id: Uuid) -> Result<Vec<RecentMistake>> {
        self.storage.recent_mistakes(
            user_id,
            self.now(),
            chrono::Duration::hours(self.config.mistake_window_hours),
            self.config.mistake_cap,
        )
    }

    // ==================== Forecast ====================

    /// Upcoming reviews per local day and hour in the named IANA timezone
    pub fn get_review_forecast(&self, user_id: Uuid, timezone: &str) -> Result<ReviewForecast> {
        let tz = forecast::parse_timezone(timezone)?;
        let now = self.now();
        let days = self.config.forecast_days;
        let times = self
            .storage
            .list_review_times(user_id, now, forecast::window_end(now, days))?;
        Ok(forecast::build_forecast(&times, now, tz, days))
    }

    // ==================== Account ====================

    /// Mark every level 0 item as burned for a new user. Existing records
    /// are kept. Returns how many were created.
    pub fn initialize_user(&self, user_id: Uuid) -> Result<usize> {
        let now = self.now();
        let mut created = 0;
        for item in self.catalog.ground_items() {
            let mut record = ProgressRecord::new(user_id, item.id);
            record.stage = Stage::Burned;
            record.unlocked_at = Some(now);
            record.last_reviewed_at = Some(now);
            if self.storage.insert_progress_if_absent(&record)? {
                created += 1;
            }
        }
        log::info!("Initialized user {} with {} ground items", user_id, created);
        Ok(created)
    }

    /// The user's progress on an item, created locked if they never touched it
    pub fn get_progress(&self, user_id: Uuid, item_id: ItemId) -> Result<StudyItem> {
        let item = self.catalog.require(item_id)?.clone();
        let progress = self.storage.get_or_create_progress(user_id, item_id)?;
        Ok(StudyItem { item, progress })
    }

    /// Replace the user's own synonyms and example sentences for an item
    pub fn update_user_content(
        &self,
        user_id: Uuid,
        item_id: ItemId,
        synonyms: Vec<String>,
        sentences: Vec<String>,
    ) -> Result<ProgressRecord> {
        self.catalog.require(item_id)?;
        self.config.check_user_content(&synonyms, &sentences)?;
        let (record, _) = self
            .storage
            .update_progress(user_id, item_id, true, |record| {
                record.user_synonyms = synonyms;
                record.user_sentences = sentences;
                Ok(())
            })?;
        Ok(record)
    }

    pub fn delete_user(&self, user_id: Uuid) -> Result<()> {
        self.storage.delete_user(user_id)
    }
}

impl std::fmt::Debug for SrsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SrsEngine")
            .field("items", &self.catalog.len())
            .field("config", &self.config)
            .finish()
    }
}
