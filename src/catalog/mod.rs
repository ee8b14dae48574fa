//! Catalog of radicals, kanji and vocabulary and the dependency graph between them

mod graph;
pub mod models;

pub use graph::Catalog;
pub use models::*;
