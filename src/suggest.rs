//! Rule-based activity suggestions and a coarse daily analysis.
//!
//! Suggestions come from a static table keyed by the most common tag in the
//! schedule and are filtered to what still fits in the unscheduled part of
//! the day.

use std::fmt;

use crate::model::Task;
use crate::time::MINUTES_PER_DAY;

const DEFAULT_TAG: &str = "work";
const PACKED_BELOW_MINUTES: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub activity: &'static str,
    pub duration: u32,
    pub benefit: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestions {
    pub dominant_tag: String,
    pub remaining_minutes: u32,
    pub items: Vec<Suggestion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleCategory {
    WorkFocused,
    LeisureFocused,
    GrindFocused,
    Balanced,
}

const fn s(activity: &'static str, duration: u32, benefit: &'static str) -> Suggestion {
    Suggestion {
        activity,
        duration,
        benefit,
    }
}

static RULES: &[(&str, [Suggestion; 3])] = &[
    (
        "work",
        [
            s("Deep work session", 90, "Focus improvement"),
            s("Schedule planning", 20, "Organization"),
            s("Email batch processing", 30, "Inbox zero"),
        ],
    ),
    (
        "leisure",
        [
            s("Walk outside", 30, "Mood boost"),
            s("Read fiction", 45, "Stress reduction"),
            s("Meditation", 15, "Mental clarity"),
        ],
    ),
    (
        "grind",
        [
            s("Workout session", 60, "Energy boost"),
            s("Learning new skill", 45, "Personal growth"),
            s("Project sprint", 120, "Accomplishment"),
        ],
    ),
    (
        "health",
        [
            s("Hydration break", 5, "Better focus"),
            s("Healthy meal prep", 30, "Energy management"),
            s("Quick stretch", 10, "Posture improvement"),
        ],
    ),
];

static FALLBACK: [Suggestion; 3] = [
    s("Short break", 15, "Mental recharge"),
    s("Planning session", 20, "Better organization"),
    s("Reflection time", 10, "Process learnings"),
];

impl Suggestions {
    /// Too little free time left for any meaningful suggestion.
    pub fn is_packed(&self) -> bool {
        self.remaining_minutes < PACKED_BELOW_MINUTES
    }
}

impl fmt::Display for ScheduleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScheduleCategory::WorkFocused => "work-focused",
            ScheduleCategory::LeisureFocused => "leisure-focused",
            ScheduleCategory::GrindFocused => "grind-focused",
            ScheduleCategory::Balanced => "balanced",
        };
        f.write_str(label)
    }
}

/// Total planned minutes across scheduled tasks, saturating at `u32::MAX`.
pub fn scheduled_minutes(tasks: &[Task]) -> u32 {
    tasks
        .iter()
        .filter_map(Task::duration_minutes)
        .fold(0, u32::saturating_add)
}

pub fn suggest(tasks: &[Task]) -> Suggestions {
    let dominant_tag = dominant_tag(tasks).unwrap_or_else(|| DEFAULT_TAG.to_string());
    let remaining_minutes = MINUTES_PER_DAY.saturating_sub(scheduled_minutes(tasks));
    let table = RULES
        .iter()
        .find(|(tag, _)| *tag == dominant_tag)
        .map_or(&FALLBACK, |(_, items)| items);
    Suggestions {
        dominant_tag,
        remaining_minutes,
        items: table
            .iter()
            .filter(|item| item.duration <= remaining_minutes)
            .copied()
            .collect(),
    }
}

pub fn schedule_category(tasks: &[Task]) -> ScheduleCategory {
    let count = |tag: &str| {
        tasks
            .iter()
            .filter(|t| t.tags.iter().any(|x| x.eq_ignore_ascii_case(tag)))
            .count()
    };
    let (work, leisure, grind) = (count("work"), count("leisure"), count("grind"));
    if work > leisure && work > grind {
        ScheduleCategory::WorkFocused
    } else if leisure > work && leisure > grind {
        ScheduleCategory::LeisureFocused
    } else if grind > work && grind > leisure {
        ScheduleCategory::GrindFocused
    } else {
        ScheduleCategory::Balanced
    }
}

/// Most frequent tag; ties go to the tag seen first.
fn dominant_tag(tasks: &[Task]) -> Option<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for tag in tasks.iter().flat_map(|t| &t.tags) {
        let tag = tag.to_lowercase();
        match counts.iter_mut().find(|(seen, _)| *seen == tag) {
            Some((_, n)) => *n += 1,
            None => counts.push((tag, 1)),
        }
    }
    let mut best: Option<(String, usize)> = None;
    for (tag, n) in counts {
        if best.as_ref().map_or(true, |(_, max)| n > *max) {
            best = Some((tag, n));
        }
    }
    best.map(|(tag, _)| tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tagged(id: &str, start: u32, duration: u32, tags: &[&str]) -> Task {
        Task::new(
            id,
            id,
            start,
            duration,
            tags.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[test]
    fn untagged_day_defaults_to_work_rules() {
        let suggestions = suggest(&[]);
        assert_eq!(suggestions.dominant_tag, "work");
        assert_eq!(suggestions.remaining_minutes, 1440);
        assert_eq!(suggestions.items.len(), 3);
        assert!(!suggestions.is_packed());
    }

    #[test]
    fn overbooked_day_leaves_nothing_to_suggest() {
        let tasks = [
            tagged("a", 0, u32::MAX / 2 + 1, &["grind"]),
            tagged("b", 600, u32::MAX / 2 + 1, &["grind"]),
            tagged("c", 900, 1440, &["grind"]),
        ];
        assert_eq!(scheduled_minutes(&tasks), 4320);
        let suggestions = suggest(&tasks);
        assert_eq!(suggestions.remaining_minutes, 0);
        assert!(suggestions.is_packed());
    }

    #[test]
    fn dominant_tag_picks_rule_table() {
        let tasks = [
            tagged("a", 420, 30, &["health"]),
            tagged("b", 480, 30, &["Leisure"]),
            tagged("c", 540, 30, &["leisure", "health"]),
            tagged("d", 600, 30, &["leisure"]),
        ];
        let suggestions = suggest(&tasks);
        assert_eq!(suggestions.dominant_tag, "leisure");
        assert_eq!(suggestions.items[0].activity, "Walk outside");
    }

    #[test]
    fn ties_keep_first_seen_tag() {
        let tasks = [
            tagged("a", 420, 30, &["grind"]),
            tagged("b", 480, 30, &["health"]),
        ];
        assert_eq!(suggest(&tasks).dominant_tag, "grind");
    }

    #[test]
    fn unknown_tags_use_fallback_and_fit_remaining_time() {
        let tasks = [tagged("a", 0, 1420, &["chores"])];
        let suggestions = suggest(&tasks);
        assert_eq!(suggestions.remaining_minutes, 20);
        assert!(suggestions.is_packed());
        let names: Vec<&str> = suggestions.items.iter().map(|i| i.activity).collect();
        assert_eq!(names, vec!["Short break", "Planning session", "Reflection time"]);

        let tasks = [tagged("a", 0, 1435, &["chores"])];
        assert!(suggest(&tasks).items.is_empty());
    }

    #[test]
    fn unscheduled_tasks_do_not_consume_time() {
        let tasks = [Task::unscheduled("u", "later", vec!["work".into()])];
        assert_eq!(suggest(&tasks).remaining_minutes, 1440);
    }

    #[test]
    fn category_needs_a_strict_majority() {
        let work_day = [
            tagged("a", 420, 30, &["work"]),
            tagged("b", 480, 30, &["work"]),
            tagged("c", 540, 30, &["leisure"]),
        ];
        assert_eq!(schedule_category(&work_day), ScheduleCategory::WorkFocused);

        let split = [tagged("a", 420, 30, &["work"]), tagged("b", 480, 30, &["grind"])];
        assert_eq!(schedule_category(&split), ScheduleCategory::Balanced);
        assert_eq!(ScheduleCategory::GrindFocused.to_string(), "grind-focused");
    }
}
