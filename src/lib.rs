//! Spaced-repetition scheduling and prerequisite unlocking for a
//! radicals → kanji → vocabulary curriculum.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod planner;
pub mod srs;
pub mod store;

pub use catalog::{Catalog, Item, ItemId, ItemType};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SrsConfig;
pub use engine::{SrsEngine, StudyItem};
pub use error::{Result, SrsError};
pub use forecast::{ForecastBucket, ReviewForecast};
pub use planner::PlanOutcome;
pub use srs::{ProgressRecord, ReviewResult, Stage};
pub use store::{PlannedEntry, RecentMistake, SrsStorage};
