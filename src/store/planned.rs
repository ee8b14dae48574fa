//! Planned queue rows

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use super::models::PlannedEntry;
use super::{decode_time, encode_time, progress, SrsStorage};
use crate::catalog::ItemId;
use crate::error::Result;
use crate::srs::ProgressRecord;

impl SrsStorage {
    /// Queue an item for later unlocking. Returns false if it was already queued.
    pub fn add_planned(&self, user_id: Uuid, item_id: ItemId, now: DateTime<Utc>) -> Result<bool> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO planned_entries (user_id, item_id, created_at) VALUES (?1, ?2, ?3)",
            params![user_id.to_string(), item_id.0, encode_time(now)],
        )?;
        Ok(inserted > 0)
    }

    pub fn is_planned(&self, user_id: Uuid, item_id: ItemId) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM planned_entries WHERE user_id = ?1 AND item_id = ?2",
            params![user_id.to_string(), item_id.0],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Drop a planned entry without touching progress. Returns false if absent.
    pub fn remove_planned(&self, user_id: Uuid, item_id: ItemId) -> Result<bool> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM planned_entries WHERE user_id = ?1 AND item_id = ?2",
            params![user_id.to_string(), item_id.0],
        )?;
        Ok(removed > 0)
    }

    /// All of a user's planned entries, oldest first
    pub fn list_planned(&self, user_id: Uuid) -> Result<Vec<PlannedEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT item_id, created_at FROM planned_entries \
             WHERE user_id = ?1 ORDER BY created_at, item_id",
        )?;
        let rows = stmt
            .query_map([user_id.to_string()], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(item_id, created_at)| {
                Ok(PlannedEntry {
                    user_id,
                    item_id: ItemId(item_id),
                    created_at: decode_time(&created_at)?,
                })
            })
            .collect()
    }

    /// Apply `apply` to the item's record (created if absent) and drop the
    /// planned entry, in one transaction
    pub fn resolve_planned<F>(&self, user_id: Uuid, item_id: ItemId, apply: F) -> Result<ProgressRecord>
    where
        F: FnOnce(&mut ProgressRecord),
    {
        self.transaction(|tx| {
            let mut record = progress::fetch_or_new(tx, user_id, item_id)?;
            apply(&mut record);
            progress::write(tx, &record)?;
            tx.execute(
                "DELETE FROM planned_entries WHERE user_id = ?1 AND item_id = ?2",
                params![user_id.to_string(), item_id.0],
            )?;
            Ok(record)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srs::{algorithm, Stage};
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_add_planned_is_idempotent() {
        let storage = SrsStorage::open_in_memory().unwrap();
        let user = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap();

        assert!(storage.add_planned(user, ItemId(3), now).unwrap());
        assert!(!storage.add_planned(user, ItemId(3), now + Duration::hours(1)).unwrap());

        let planned = storage.list_planned(user).unwrap();
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].created_at, now);
        assert!(storage.list_planned(Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_unlocks_and_removes() {
        let storage = SrsStorage::open_in_memory().unwrap();
        let user = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap();

        storage.add_planned(user, ItemId(3), now).unwrap();
        let record = storage
            .resolve_planned(user, ItemId(3), |record| {
                algorithm::unlock(record, now);
            })
            .unwrap();

        assert_eq!(record.stage, Stage::Lesson);
        assert!(!storage.is_planned(user, ItemId(3)).unwrap());
        assert_eq!(
            storage.get_progress(user, ItemId(3)).unwrap().map(|r| r.stage),
            Some(Stage::Lesson)
        );
    }

    #[test]
    fn test_remove_planned_leaves_progress_alone() {
        let storage = SrsStorage::open_in_memory().unwrap();
        let user = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap();

        storage.add_planned(user, ItemId(5), now).unwrap();
        assert!(storage.remove_planned(user, ItemId(5)).unwrap());
        assert!(!storage.remove_planned(user, ItemId(5)).unwrap());
        assert!(storage.list_planned(user).unwrap().is_empty());
        assert_eq!(storage.get_progress(user, ItemId(5)).unwrap(), None);
    }
}
