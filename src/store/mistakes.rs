//! Recent mistake log: bounded by age and by row count per user

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::models::RecentMistake;
use super::{decode_time, encode_time, SrsStorage};
use crate::catalog::ItemId;
use crate::error::Result;

/// Delete the user's mistakes older than `cutoff`
fn purge_older_than(conn: &Connection, user_id: Uuid, cutoff: DateTime<Utc>) -> Result<usize> {
    let purged = conn.execute(
        "DELETE FROM recent_mistakes WHERE user_id = ?1 AND timestamp < ?2",
        params![user_id.to_string(), encode_time(cutoff)],
    )?;
    if purged > 0 {
        log::debug!("Purged {} expired mistakes for user {}", purged, user_id);
    }
    Ok(purged)
}

impl SrsStorage {
    /// Log a wrong answer.
    ///
    /// Expired rows are purged first; if the user is then at `cap`, the
    /// oldest rows are evicted to make room for the new one.
    pub fn record_mistake(
        &self,
        user_id: Uuid,
        item_id: ItemId,
        now: DateTime<Utc>,
        window: Duration,
        cap: usize,
    ) -> Result<RecentMistake> {
        let user = user_id.to_string();
        self.transaction(|tx| {
            purge_older_than(tx, user_id, now - window)?;

            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM recent_mistakes WHERE user_id = ?1",
                [&user],
                |row| row.get(0),
            )?;
            let excess = count + 1 - cap as i64;
            if excess > 0 {
                tx.execute(
                    "DELETE FROM recent_mistakes WHERE id IN ( \
                         SELECT id FROM recent_mistakes WHERE user_id = ?1 \
                         ORDER BY timestamp ASC, id ASC LIMIT ?2)",
                    params![user, excess],
                )?;
            }

            tx.execute(
                "INSERT INTO recent_mistakes (user_id, item_id, timestamp) VALUES (?1, ?2, ?3)",
                params![user, item_id.0, encode_time(now)],
            )?;

            Ok(RecentMistake {
                id: tx.last_insert_rowid(),
                user_id,
                item_id,
                timestamp: now,
            })
        })
    }

    /// Up to `cap` mistakes from inside the window, newest first.
    /// Expired rows are purged on the way.
    pub fn recent_mistakes(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
        window: Duration,
        cap: usize,
    ) -> Result<Vec<RecentMistake>> {
        let cutoff = now - window;
        let rows = self.transaction(|tx| {
            purge_older_than(tx, user_id, cutoff)?;

            let mut stmt = tx.prepare(
                "SELECT id, item_id, timestamp FROM recent_mistakes \
                 WHERE user_id = ?1 AND timestamp >= ?2 \
                 ORDER BY timestamp DESC, id DESC LIMIT ?3",
            )?;
            let rows = stmt
                .query_map(
                    params![user_id.to_string(), encode_time(cutoff), cap as i64],
                    |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        rows.into_iter()
            .map(|(id, item_id, timestamp)| {
                Ok(RecentMistake {
                    id,
                    user_id,
                    item_id: ItemId(item_id),
                    timestamp: decode_time(&timestamp)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 14, 6, 0, 0).unwrap()
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let storage = SrsStorage::open_in_memory().unwrap();
        let user = Uuid::new_v4();

        for i in 0..55 {
            storage
                .record_mistake(user, ItemId(i), start() + Duration::minutes(i), Duration::hours(24), 50)
                .unwrap();
        }

        let now = start() + Duration::minutes(60);
        let kept = storage.recent_mistakes(user, now, Duration::hours(24), 50).unwrap();
        assert_eq!(kept.len(), 50);
        assert_eq!(kept.first().map(|m| m.item_id), Some(ItemId(54)));
        assert_eq!(kept.last().map(|m| m.item_id), Some(ItemId(5)));
        assert!(kept.iter().all(|m| m.item_id.0 >= 5));
    }

    #[test]
    fn test_expired_mistake_purged_on_read() {
        let storage = SrsStorage::open_in_memory().unwrap();
        let user = Uuid::new_v4();

        storage
            .record_mistake(user, ItemId(1), start(), Duration::hours(24), 50)
            .unwrap();
        storage
            .record_mistake(user, ItemId(2), start() + Duration::hours(20), Duration::hours(24), 50)
            .unwrap();

        let now = start() + Duration::hours(25);
        let kept = storage.recent_mistakes(user, now, Duration::hours(24), 50).unwrap();
        assert_eq!(kept.iter().map(|m| m.item_id).collect::<Vec<_>>(), vec![ItemId(2)]);

        // the purge is persistent, not just a read filter
        let later = storage
            .recent_mistakes(user, start(), Duration::hours(24 * 365), 50)
            .unwrap();
        assert_eq!(later.len(), 1);
    }

    #[test]
    fn test_expired_mistake_purged_on_write() {
        let storage = SrsStorage::open_in_memory().unwrap();
        let user = Uuid::new_v4();

        storage
            .record_mistake(user, ItemId(1), start(), Duration::hours(24), 50)
            .unwrap();
        storage
            .record_mistake(user, ItemId(2), start() + Duration::hours(30), Duration::hours(24), 50)
            .unwrap();

        let everything = storage
            .recent_mistakes(user, start() + Duration::hours(30), Duration::days(3650), 50)
            .unwrap();
        assert_eq!(everything.len(), 1);
        assert_eq!(everything[0].item_id, ItemId(2));
    }

    #[test]
    fn test_users_are_isolated() {
        let storage = SrsStorage::open_in_memory().unwrap();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        for i in 0..50 {
            storage
                .record_mistake(alice, ItemId(i), start(), Duration::hours(24), 50)
                .unwrap();
        }
        storage
            .record_mistake(bob, ItemId(1), start(), Duration::hours(24), 50)
            .unwrap();

        assert_eq!(storage.recent_mistakes(alice, start(), Duration::hours(24), 50).unwrap().len(), 50);
        assert_eq!(storage.recent_mistakes(bob, start(), Duration::hours(24), 50).unwrap().len(), 1);
    }
}
