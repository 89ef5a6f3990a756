use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::interval::Interval;
use crate::mood::{self, MoodEntry, MoodLevel};
use crate::overlap::{check_overlap, OverlapCheck};
use crate::time::{format_display, minutes_from_stored, ClockStyle, MINUTES_PER_DAY};

pub type TaskId = String;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Schedule {
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub moods: Vec<MoodEntry>,
}

/// A task as it is stored on disk. Fields may be missing or malformed;
/// [`Task::from_record`] is the only place that interprets them.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<RawDuration>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum RawDuration {
    Minutes(i64),
    Text(String),
    Other(serde_yaml::Value),
}

/// Normalized task consumed by the timeline engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub interval: Option<Interval>,
    pub tags: Vec<String>,
    pub completed: bool,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("task title cannot be empty")]
    EmptyTitle,
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error(
        "task time overlaps with existing task '{title}' ({} for {duration} min)",
        display_start(.start)
    )]
    Overlap {
        id: TaskId,
        title: String,
        start: u32,
        duration: u32,
    },
    #[error("mood already recorded for task {0}")]
    AlreadyRated(String),
}

fn display_start(start: &u32) -> String {
    format_display(i64::from(*start), ClockStyle::Hour12)
}

impl RawDuration {
    /// Positive whole minutes capped at one day, or `None` when the value is
    /// unusable.
    pub fn minutes(&self) -> Option<u32> {
        let value = match self {
            RawDuration::Minutes(m) => *m,
            RawDuration::Text(text) => {
                let digits: String = text
                    .trim()
                    .chars()
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                if digits.is_empty() {
                    return None;
                }
                digits.parse::<i64>().unwrap_or(i64::MAX)
            }
            RawDuration::Other(_) => return None,
        };
        if value <= 0 {
            return None;
        }
        Some(u32::try_from(value).map_or(MINUTES_PER_DAY, |m| m.min(MINUTES_PER_DAY)))
    }
}

impl TaskRecord {
    pub fn new(
        id: TaskId,
        title: String,
        start_minutes: Option<u32>,
        duration: u32,
        tags: Vec<String>,
    ) -> Self {
        TaskRecord {
            id,
            title,
            start_time: start_minutes.map(|m| format_display(i64::from(m), ClockStyle::Hour24)),
            duration: Some(RawDuration::Minutes(i64::from(duration))),
            tags,
            completed: false,
            created_at: Utc::now(),
        }
    }

    pub fn duration_minutes(&self) -> Option<u32> {
        self.duration.as_ref().and_then(RawDuration::minutes)
    }
}

impl Task {
    pub fn new(
        id: impl Into<TaskId>,
        title: impl Into<String>,
        start: u32,
        duration: u32,
        tags: Vec<String>,
    ) -> Self {
        Task {
            id: id.into(),
            title: title.into(),
            interval: Interval::new(start, duration),
            tags,
            completed: false,
        }
    }

    pub fn unscheduled(id: impl Into<TaskId>, title: impl Into<String>, tags: Vec<String>) -> Self {
        Task {
            id: id.into(),
            title: title.into(),
            interval: None,
            tags,
            completed: false,
        }
    }

    pub fn from_record(record: &TaskRecord) -> Self {
        let start = record.start_time.as_deref().and_then(minutes_from_stored);
        if start.is_none() && record.start_time.is_some() {
            warn!(
                "event=task_ingest status=unscheduled id={} reason=start_time",
                record.id
            );
        }
        let duration = record.duration_minutes();
        if duration.is_none() && record.duration.is_some() {
            warn!(
                "event=task_ingest status=unscheduled id={} reason=duration",
                record.id
            );
        }
        Task {
            id: record.id.clone(),
            title: record.title.clone(),
            interval: start
                .zip(duration)
                .and_then(|(start, duration)| Interval::new(start, duration)),
            tags: record.tags.clone(),
            completed: record.completed,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.interval.is_some()
    }

    pub fn start_minutes(&self) -> Option<u32> {
        self.interval.map(|i| i.start())
    }

    pub fn duration_minutes(&self) -> Option<u32> {
        self.interval.map(|i| i.duration())
    }
}

impl Schedule {
    pub fn named(name: impl Into<String>) -> Self {
        Schedule {
            name: name.into(),
            tasks: Vec::new(),
            moods: Vec::new(),
        }
    }

    /// Normalized view of the stored tasks, in insertion order.
    pub fn tasks(&self) -> Vec<Task> {
        self.tasks.iter().map(Task::from_record).collect()
    }

    pub fn find(&self, id: &str) -> Option<&TaskRecord> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn add_task(&mut self, record: TaskRecord) -> Result<(), ScheduleError> {
        self.validate(&record)?;
        info!(
            "event=task_add status=ok id={} start={:?}",
            record.id, record.start_time
        );
        self.tasks.push(record);
        Ok(())
    }

    /// Swap a stored task for an edited version, re-running the overlap check.
    pub fn replace_task(&mut self, record: TaskRecord) -> Result<(), ScheduleError> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == record.id)
            .ok_or_else(|| ScheduleError::TaskNotFound(record.id.clone()))?;
        self.validate(&record)?;
        self.tasks[idx] = record;
        Ok(())
    }

    pub fn remove_task(&mut self, id: &str) -> Result<TaskRecord, ScheduleError> {
        let idx = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| ScheduleError::TaskNotFound(id.to_string()))?;
        Ok(self.tasks.remove(idx))
    }

    pub fn set_completed(&mut self, id: &str, completed: bool) -> Result<(), ScheduleError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ScheduleError::TaskNotFound(id.to_string()))?;
        task.completed = completed;
        Ok(())
    }

    pub fn record_mood(&mut self, task_id: &str, level: MoodLevel) -> Result<(), ScheduleError> {
        let task = self
            .find(task_id)
            .ok_or_else(|| ScheduleError::TaskNotFound(task_id.to_string()))?;
        if self.moods.iter().any(|m| m.task_id == task_id) {
            return Err(ScheduleError::AlreadyRated(task_id.to_string()));
        }
        let entry = MoodEntry {
            task_id: task.id.clone(),
            task_title: task.title.clone(),
            tags: task.tags.clone(),
            level,
            recorded_at: Utc::now(),
        };
        self.moods.push(entry);
        Ok(())
    }

    pub fn unrated_tasks(&self) -> Vec<&TaskRecord> {
        self.tasks
            .iter()
            .filter(|t| !self.moods.iter().any(|m| m.task_id == t.id))
            .collect()
    }

    pub fn average_mood(&self) -> Option<f64> {
        mood::average(&self.moods)
    }

    fn validate(&self, record: &TaskRecord) -> Result<(), ScheduleError> {
        if record.title.trim().is_empty() {
            return Err(ScheduleError::EmptyTitle);
        }
        let candidate = Task::from_record(record);
        let existing = self.tasks();
        if let OverlapCheck::Rejected { conflicting } = check_overlap(&candidate, &existing) {
            info!(
                "event=task_add status=rejected id={} conflict={}",
                record.id, conflicting.id
            );
            return Err(ScheduleError::Overlap {
                id: conflicting.id.clone(),
                title: conflicting.title.clone(),
                start: conflicting.start_minutes().unwrap_or_default(),
                duration: conflicting.duration_minutes().unwrap_or_default(),
            });
        }
        Ok(())
    }
}
