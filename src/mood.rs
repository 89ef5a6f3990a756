use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodLevel {
    Terrible,
    Bad,
    Neutral,
    Good,
    Great,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodEntry {
    pub task_id: TaskId,
    pub task_title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub level: MoodLevel,
    pub recorded_at: DateTime<Utc>,
}

impl MoodLevel {
    pub const ALL: [MoodLevel; 5] = [
        MoodLevel::Terrible,
        MoodLevel::Bad,
        MoodLevel::Neutral,
        MoodLevel::Good,
        MoodLevel::Great,
    ];

    /// Maps a 1-5 rating; anything else is `None`.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1..=5 => Some(Self::ALL[usize::from(value - 1)]),
            _ => None,
        }
    }

    pub fn value(&self) -> u8 {
        match self {
            MoodLevel::Terrible => 1,
            MoodLevel::Bad => 2,
            MoodLevel::Neutral => 3,
            MoodLevel::Good => 4,
            MoodLevel::Great => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MoodLevel::Terrible => "Terrible",
            MoodLevel::Bad => "Bad",
            MoodLevel::Neutral => "Neutral",
            MoodLevel::Good => "Good",
            MoodLevel::Great => "Great",
        }
    }
}

/// Mean rating across entries, `None` when nothing was rated yet.
pub fn average(entries: &[MoodEntry]) -> Option<f64> {
    if entries.is_empty() {
        return None;
    }
    let total: u32 = entries.iter().map(|e| u32::from(e.level.value())).sum();
    Some(f64::from(total) / entries.len() as f64)
}
