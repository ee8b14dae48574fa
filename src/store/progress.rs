//! Progress record rows

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{decode_optional_time, encode_time, SrsStorage};
use crate::catalog::ItemId;
use crate::error::{Result, SrsError};
use crate::srs::{ProgressRecord, Stage};

const COLUMNS: &str = "user_id, item_id, stage, unlocked_at, last_reviewed_at, next_review_at, \
                       review_history, user_synonyms, user_sentences";

/// Raw column values, converted to a record outside the rusqlite callback
struct ProgressRow {
    user_id: String,
    item_id: i64,
    stage: String,
    unlocked_at: Option<String>,
    last_reviewed_at: Option<String>,
    next_review_at: Option<String>,
    review_history: String,
    user_synonyms: String,
    user_sentences: String,
}

impl ProgressRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            item_id: row.get(1)?,
            stage: row.get(2)?,
            unlocked_at: row.get(3)?,
            last_reviewed_at: row.get(4)?,
            next_review_at: row.get(5)?,
            review_history: row.get(6)?,
            user_synonyms: row.get(7)?,
            user_sentences: row.get(8)?,
        })
    }

    fn into_record(self) -> Result<ProgressRecord> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| SrsError::CorruptRecord(format!("bad user id {:?}: {}", self.user_id, e)))?;
        Ok(ProgressRecord {
            user_id,
            item_id: ItemId(self.item_id),
            stage: self.stage.parse()?,
            unlocked_at: decode_optional_time(self.unlocked_at)?,
            last_reviewed_at: decode_optional_time(self.last_reviewed_at)?,
            next_review_at: decode_optional_time(self.next_review_at)?,
            review_history: serde_json::from_str(&self.review_history)?,
            user_synonyms: serde_json::from_str(&self.user_synonyms)?,
            user_sentences: serde_json::from_str(&self.user_sentences)?,
        })
    }
}

pub(super) fn fetch(conn: &Connection, user_id: Uuid, item_id: ItemId) -> Result<Option<ProgressRecord>> {
    let sql = format!("SELECT {} FROM progress WHERE user_id = ?1 AND item_id = ?2", COLUMNS);
    conn.query_row(&sql, params![user_id.to_string(), item_id.0], ProgressRow::from_row)
        .optional()?
        .map(ProgressRow::into_record)
        .transpose()
}

pub(super) fn fetch_or_new(conn: &Connection, user_id: Uuid, item_id: ItemId) -> Result<ProgressRecord> {
    Ok(fetch(conn, user_id, item_id)?.unwrap_or_else(|| ProgressRecord::new(user_id, item_id)))
}

pub(super) fn write(conn: &Connection, record: &ProgressRecord) -> Result<()> {
    let sql = format!(
        "INSERT OR REPLACE INTO progress ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        COLUMNS
    );
    conn.execute(
        &sql,
        params![
            record.user_id.to_string(),
            record.item_id.0,
            record.stage.as_str(),
            record.unlocked_at.map(encode_time),
            record.last_reviewed_at.map(encode_time),
            record.next_review_at.map(encode_time),
            serde_json::to_string(&record.review_history)?,
            serde_json::to_string(&record.user_synonyms)?,
            serde_json::to_string(&record.user_sentences)?,
        ],
    )?;
    Ok(())
}

fn query(conn: &Connection, filter: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<ProgressRecord>> {
    let sql = format!("SELECT {} FROM progress WHERE {} ORDER BY item_id", COLUMNS, filter);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, ProgressRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(ProgressRow::into_record).collect()
}

impl SrsStorage {
    /// Get a user's progress on an item, if they have touched it
    pub fn get_progress(&self, user_id: Uuid, item_id: ItemId) -> Result<Option<ProgressRecord>> {
        let conn = self.lock()?;
        fetch(&conn, user_id, item_id)
    }

    /// Get a user's progress on an item, creating a locked record if absent
    pub fn get_or_create_progress(&self, user_id: Uuid, item_id: ItemId) -> Result<ProgressRecord> {
        self.transaction(|tx| {
            if let Some(record) = fetch(tx, user_id, item_id)? {
                return Ok(record);
            }
            let record = ProgressRecord::new(user_id, item_id);
            write(tx, &record)?;
            Ok(record)
        })
    }

    /// Store `record` unless one already exists for its (user, item).
    /// Returns whether it was inserted.
    pub fn insert_progress_if_absent(&self, record: &ProgressRecord) -> Result<bool> {
        self.transaction(|tx| {
            if fetch(tx, record.user_id, record.item_id)?.is_some() {
                return Ok(false);
            }
            write(tx, record)?;
            Ok(true)
        })
    }

    /// Atomically read, modify and write one progress record.
    ///
    /// A missing record is created as `Locked` when `create_missing` is set,
    /// otherwise the call fails with `ProgressNotFound`. If `apply` errors,
    /// nothing is written.
    pub fn update_progress<T, F>(
        &self,
        user_id: Uuid,
        item_id: ItemId,
        create_missing: bool,
        apply: F,
    ) -> Result<(ProgressRecord, T)>
    where
        F: FnOnce(&mut ProgressRecord) -> Result<T>,
    {
        self.transaction(|tx| {
            let mut record = match fetch(tx, user_id, item_id)? {
                Some(record) => record,
                None if create_missing => ProgressRecord::new(user_id, item_id),
                None => return Err(SrsError::ProgressNotFound { user: user_id, item: item_id }),
            };
            let outcome = apply(&mut record)?;
            write(tx, &record)?;
            Ok((record, outcome))
        })
    }

    /// Every record the user has, read in one snapshot
    pub fn list_progress(&self, user_id: Uuid) -> Result<Vec<ProgressRecord>> {
        let conn = self.lock()?;
        query(&conn, "user_id = ?1", &[&user_id.to_string()])
    }

    /// Records currently in `stage`
    pub fn list_progress_in_stage(&self, user_id: Uuid, stage: Stage) -> Result<Vec<ProgressRecord>> {
        let conn = self.lock()?;
        query(
            &conn,
            "user_id = ?1 AND stage = ?2",
            &[&user_id.to_string(), &stage.as_str()],
        )
    }

    /// Reviewable records whose review time has come
    pub fn list_due(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<Vec<ProgressRecord>> {
        let conn = self.lock()?;
        query(
            &conn,
            "user_id = ?1 AND stage NOT IN ('locked', 'burned') \
             AND next_review_at IS NOT NULL AND next_review_at <= ?2",
            &[&user_id.to_string(), &encode_time(now)],
        )
    }

    /// Scheduled review times in `(after, until]`, excluding lessons
    pub fn list_review_times(
        &self,
        user_id: Uuid,
        after: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT next_review_at FROM progress \
             WHERE user_id = ?1 AND stage NOT IN ('locked', 'lesson', 'burned') \
             AND next_review_at > ?2 AND next_review_at <= ?3",
        )?;
        let times = stmt
            .query_map(
                params![user_id.to_string(), encode_time(after), encode_time(until)],
                |row| row.get::<_, String>(0),
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        times.iter().map(|text| super::decode_time(text)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srs::algorithm;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_get_or_create_is_locked_and_persisted() {
        let storage = SrsStorage::open_in_memory().unwrap();
        let user = Uuid::new_v4();

        assert!(storage.get_progress(user, ItemId(5)).unwrap().is_none());
        let created = storage.get_or_create_progress(user, ItemId(5)).unwrap();
        assert_eq!(created.stage, Stage::Locked);
        assert_eq!(storage.get_progress(user, ItemId(5)).unwrap(), Some(created));
    }

    #[test]
    fn test_update_round_trips_all_fields() {
        let storage = SrsStorage::open_in_memory().unwrap();
        let user = Uuid::new_v4();

        let (record, _) = storage
            .update_progress(user, ItemId(1), true, |record| {
                algorithm::unlock(record, now());
                algorithm::complete_lesson(record, now());
                algorithm::promote(record, now())?;
                record.user_synonyms = vec!["person".to_string()];
                Ok(())
            })
            .unwrap();

        let stored = storage.get_progress(user, ItemId(1)).unwrap().unwrap();
        assert_eq!(stored, record);
        assert_eq!(stored.stage, Stage::Apprentice2);
        assert_eq!(stored.review_history.len(), 1);
    }

    #[test]
    fn test_update_missing_without_create_fails() {
        let storage = SrsStorage::open_in_memory().unwrap();
        let err = storage
            .update_progress(Uuid::new_v4(), ItemId(9), false, |_| Ok(()))
            .unwrap_err();
        assert!(matches!(err, SrsError::ProgressNotFound { .. }));
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let storage = SrsStorage::open_in_memory().unwrap();
        let user = Uuid::new_v4();
        let result = storage.update_progress(user, ItemId(2), true, |record| {
            record.stage = Stage::Master;
            Err::<(), _>(SrsError::Validation("nope".to_string()))
        });
        assert!(result.is_err());
        assert!(storage.get_progress(user, ItemId(2)).unwrap().is_none());
    }

    #[test]
    fn test_list_due_skips_future_and_burned() {
        let storage = SrsStorage::open_in_memory().unwrap();
        let user = Uuid::new_v4();

        let mut due = ProgressRecord::new(user, ItemId(1));
        due.stage = Stage::Apprentice1;
        due.unlocked_at = Some(now() - Duration::days(2));
        due.next_review_at = Some(now() - Duration::hours(1));

        let mut later = due.clone();
        later.item_id = ItemId(2);
        later.next_review_at = Some(now() + Duration::hours(1));

        let mut burned = due.clone();
        burned.item_id = ItemId(3);
        burned.stage = Stage::Burned;

        for record in [&due, &later, &burned] {
            storage.insert_progress_if_absent(record).unwrap();
        }

        let found = storage.list_due(user, now()).unwrap();
        assert_eq!(found, vec![due]);

        let times = storage
            .list_review_times(user, now(), now() + Duration::days(1))
            .unwrap();
        assert_eq!(times, vec![now() + Duration::hours(1)]);
    }

    #[test]
    fn test_corrupt_stage_surfaces() {
        let storage = SrsStorage::open_in_memory().unwrap();
        let user = Uuid::new_v4();
        storage.get_or_create_progress(user, ItemId(4)).unwrap();
        {
            let conn = storage.lock().unwrap();
            conn.execute("UPDATE progress SET stage = 'G7'", []).unwrap();
        }
        assert!(matches!(
            storage.get_progress(user, ItemId(4)),
            Err(SrsError::CorruptStage(_))
        ));
    }
}
