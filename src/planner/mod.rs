//! Dependency resolution: deciding when an item's prerequisites are mastered

mod resolver;

pub use resolver::{PlanOutcome, Planner};
