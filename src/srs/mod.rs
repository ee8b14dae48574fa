//! Spaced repetition stages and per-user progress
//!
//! This module provides:
//! - The fixed-interval stage ladder (Locked through Burned)
//! - Promotion, demotion and unlock transitions with hour-rounded scheduling
//! - Progress records as stored per (user, item)

pub mod algorithm;
pub mod models;

pub use models::*;
