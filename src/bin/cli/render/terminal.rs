use chrono::{DateTime, Local, Utc};

use kanjilearner_lib::{Item, ItemType, Stage};

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

fn stage_color(stage: Stage) -> &'static str {
    match stage {
        Stage::Locked => Color::GRAY,
        Stage::Lesson => Color::CYAN,
        Stage::Apprentice1 | Stage::Apprentice2 | Stage::Apprentice3 | Stage::Apprentice4 => {
            Color::MAGENTA
        }
        Stage::Guru1 | Stage::Guru2 => Color::BLUE,
        Stage::Master => Color::GREEN,
        Stage::Enlightened => Color::YELLOW,
        Stage::Burned => Color::DIM,
    }
}

pub fn stage_label(stage: Stage, use_color: bool) -> String {
    paint(stage.as_str(), stage_color(stage), use_color)
}

fn type_color(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Radical => Color::BLUE,
        ItemType::Kanji => Color::MAGENTA,
        ItemType::Vocab => Color::GREEN,
    }
}

/// `#12 木 (tree)` with the literal colored by item type
pub fn item_label(item: &Item, use_color: bool) -> String {
    let literal = paint(&item.literal, type_color(item.item_type), use_color);
    if item.meaning.is_empty() {
        format!("#{} {}", item.id, literal)
    } else {
        format!("#{} {} ({})", item.id, literal, item.meaning)
    }
}

/// Local wall-clock time, or `-` when unset
pub fn format_time(at: Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}
