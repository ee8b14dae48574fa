//! Stage engine
//!
//! Pure state-machine logic for the fixed-interval SRS ladder:
//!
//! Locked → Lesson → Apprentice 1-4 → Guru 1-2 → Master → Enlightened → Burned
//!
//! Intervals (measured from the moment of promotion into a stage):
//! - Apprentice 1: 4h, Apprentice 2: 8h, Apprentice 3: 1d, Apprentice 4: 2d
//! - Guru 1: 7d, Guru 2: 14d
//! - Master: 30d, Enlightened: 120d
//!
//! Every computed review time is pushed up to the next whole hour so the
//! review queue grows in hourly batches instead of a constant trickle.

use chrono::{DateTime, Duration, Utc};

use super::models::{ProgressRecord, ReviewOutcome, Stage};
use crate::error::{Result, SrsError};

/// Wait before the next review after landing in `stage`.
/// `None` for stages that are never scheduled.
pub fn interval(stage: Stage) -> Option<Duration> {
    match stage {
        Stage::Apprentice1 => Some(Duration::hours(4)),
        Stage::Apprentice2 => Some(Duration::hours(8)),
        Stage::Apprentice3 => Some(Duration::days(1)),
        Stage::Apprentice4 => Some(Duration::days(2)),
        Stage::Guru1 => Some(Duration::days(7)),
        Stage::Guru2 => Some(Duration::days(14)),
        Stage::Master => Some(Duration::days(30)),
        Stage::Enlightened => Some(Duration::days(120)),
        Stage::Locked | Stage::Lesson | Stage::Burned => None,
    }
}

/// Where a wrong answer sends an item. `None` means the stage never demotes.
pub fn demotion_target(stage: Stage) -> Option<Stage> {
    match stage {
        Stage::Apprentice1 | Stage::Apprentice2 | Stage::Apprentice3 | Stage::Apprentice4 => {
            Some(Stage::Apprentice1)
        }
        Stage::Guru1 | Stage::Guru2 => Some(Stage::Apprentice4),
        Stage::Master | Stage::Enlightened => Some(Stage::Guru1),
        Stage::Locked | Stage::Lesson | Stage::Burned => None,
    }
}

/// Ceiling to the next exact hour boundary. Whole hours are returned as-is.
pub fn round_up_to_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    let into_hour = Duration::seconds(at.timestamp().rem_euclid(3600))
        + Duration::nanoseconds(i64::from(at.timestamp_subsec_nanos()));
    if into_hour == Duration::zero() {
        at
    } else {
        at - into_hour + Duration::hours(1)
    }
}

/// Next review time for an item entering `stage` at `now`
pub fn next_review_at(stage: Stage, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    interval(stage).map(|wait| round_up_to_hour(now + wait))
}

/// Locked → Lesson. Returns false if the record was already unlocked.
pub fn unlock(record: &mut ProgressRecord, now: DateTime<Utc>) -> bool {
    if record.stage != Stage::Locked {
        return false;
    }
    record.stage = Stage::Lesson;
    record.unlocked_at = Some(now);
    record.next_review_at = None;
    true
}

/// Lesson → Apprentice 1, first review four hours out.
/// Returns false for any other stage.
pub fn complete_lesson(record: &mut ProgressRecord, now: DateTime<Utc>) -> bool {
    if record.stage != Stage::Lesson {
        return false;
    }
    record.stage = Stage::Apprentice1;
    record.next_review_at = next_review_at(Stage::Apprentice1, now);
    true
}

/// Advance one stage. Burned stays Burned and reports `Ok(false)`.
pub fn promote(record: &mut ProgressRecord, now: DateTime<Utc>) -> Result<bool> {
    let position = Stage::ORDER
        .iter()
        .position(|stage| *stage == record.stage)
        .ok_or_else(|| SrsError::InvalidStateTransition {
            item: record.item_id,
            stage: record.stage.to_string(),
        })?;

    let Some(&next) = Stage::ORDER.get(position + 1) else {
        return Ok(false);
    };

    record.stage = next;
    record.last_reviewed_at = Some(now);
    record.next_review_at = next_review_at(next, now);
    if record.unlocked_at.is_none() {
        record.unlocked_at = Some(now);
    }
    record.review_history.push(ReviewOutcome {
        reviewed_at: now,
        correct: true,
        stage: next,
    });
    Ok(true)
}

/// Drop back per the demotion table. Locked, Lesson and Burned are untouched.
pub fn demote(record: &mut ProgressRecord, now: DateTime<Utc>) -> bool {
    let Some(target) = demotion_target(record.stage) else {
        return false;
    };

    record.stage = target;
    record.last_reviewed_at = Some(now);
    record.next_review_at = next_review_at(target, now);
    record.review_history.push(ReviewOutcome {
        reviewed_at: now,
        correct: false,
        stage: target,
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemId;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, h, m, s).unwrap()
    }

    fn record_in(stage: Stage) -> ProgressRecord {
        let mut record = ProgressRecord::new(Uuid::new_v4(), ItemId(1));
        record.stage = stage;
        if stage != Stage::Locked {
            record.unlocked_at = Some(at(0, 0, 0));
        }
        record
    }

    #[test]
    fn test_round_up_to_hour() {
        assert_eq!(round_up_to_hour(at(10, 0, 0)), at(10, 0, 0));
        assert_eq!(round_up_to_hour(at(10, 0, 1)), at(11, 0, 0));
        assert_eq!(round_up_to_hour(at(10, 59, 59)), at(11, 0, 0));
        assert_eq!(
            round_up_to_hour(at(23, 30, 0)),
            Utc.with_ymd_and_hms(2026, 5, 11, 0, 0, 0).unwrap()
        );

        let fractional = at(10, 0, 0) + Duration::milliseconds(1);
        assert_eq!(round_up_to_hour(fractional), at(11, 0, 0));
    }

    #[test]
    fn test_promote_walks_every_stage() {
        let now = at(9, 15, 30);
        for window in Stage::ORDER.windows(2) {
            let (from, to) = (window[0], window[1]);
            let mut record = record_in(from);

            assert!(promote(&mut record, now).unwrap());
            assert_eq!(record.stage, to);
            assert_eq!(record.last_reviewed_at, Some(now));

            let expected = interval(to).map(|wait| round_up_to_hour(now + wait));
            assert_eq!(record.next_review_at, expected, "promoting {}", from);
        }
    }

    #[test]
    fn test_promote_from_burned_is_noop() {
        let mut record = record_in(Stage::Burned);
        let before = record.clone();
        assert!(!promote(&mut record, at(12, 0, 0)).unwrap());
        assert_eq!(record, before);
    }

    #[test]
    fn test_promote_into_burned_clears_schedule() {
        let mut record = record_in(Stage::Enlightened);
        record.next_review_at = Some(at(1, 0, 0));
        promote(&mut record, at(12, 0, 0)).unwrap();
        assert_eq!(record.stage, Stage::Burned);
        assert_eq!(record.next_review_at, None);
    }

    #[test]
    fn test_promote_on_exact_hour_keeps_boundary() {
        let mut record = record_in(Stage::Apprentice1);
        promote(&mut record, at(8, 0, 0)).unwrap();
        assert_eq!(record.next_review_at, Some(at(16, 0, 0)));
    }

    #[test]
    fn test_demotion_table() {
        let now = at(14, 20, 0);
        let cases = [
            (Stage::Apprentice1, Stage::Apprentice1),
            (Stage::Apprentice2, Stage::Apprentice1),
            (Stage::Apprentice3, Stage::Apprentice1),
            (Stage::Apprentice4, Stage::Apprentice1),
            (Stage::Guru1, Stage::Apprentice4),
            (Stage::Guru2, Stage::Apprentice4),
            (Stage::Master, Stage::Guru1),
            (Stage::Enlightened, Stage::Guru1),
        ];
        for (from, to) in cases {
            let mut record = record_in(from);
            assert!(demote(&mut record, now));
            assert_eq!(record.stage, to);
            assert_eq!(record.next_review_at, next_review_at(to, now));
            assert_eq!(record.review_history.last().map(|o| o.correct), Some(false));
        }
    }

    #[test]
    fn test_demote_guarded_stages() {
        for stage in [Stage::Locked, Stage::Lesson, Stage::Burned] {
            let mut record = record_in(stage);
            let before = record.clone();
            assert!(!demote(&mut record, at(3, 0, 0)));
            assert_eq!(record, before);
        }
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let base = record_in(Stage::Locked);
        let mut once = base.clone();
        assert!(unlock(&mut once, at(7, 0, 0)));

        let mut twice = base;
        assert!(unlock(&mut twice, at(7, 0, 0)));
        assert!(!unlock(&mut twice, at(9, 0, 0)));

        assert_eq!(once, twice);
        assert_eq!(once.stage, Stage::Lesson);
        assert_eq!(once.unlocked_at, Some(at(7, 0, 0)));
        assert_eq!(once.next_review_at, None);
    }

    #[test]
    fn test_complete_lesson() {
        let mut record = record_in(Stage::Lesson);
        assert!(complete_lesson(&mut record, at(10, 5, 0)));
        assert_eq!(record.stage, Stage::Apprentice1);
        assert_eq!(record.next_review_at, Some(at(15, 0, 0)));

        assert!(!complete_lesson(&mut record, at(11, 0, 0)));
        assert_eq!(record.stage, Stage::Apprentice1);
    }
}
