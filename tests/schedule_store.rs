use anyhow::Result;
use dayplan::storage::{init_schedule_in, load_schedule, save_schedule, YamlTodoRepository};
use dayplan::{
    build_timeline, check_overlap, scheduled_minutes, suggest, LayoutConfig, MoodLevel, OverlapCheck, Schedule, ScheduleError, Task, TaskRecord,
    TodoItem, TodoList, TodoRepository,
};
use std::cell::Cell;
use std::fs;

fn record(id: &str, title: &str, start: u32, duration: u32) -> TaskRecord {
    TaskRecord::new(id.into(), title.into(), Some(start), duration, vec![])
}

#[test]
fn overlapping_candidate_names_the_nine_am_task() {
    let existing = vec![Task::new("nine", "Standup", 540, 60, vec![])];
    let candidate = Task::new("new", "Review", 570, 30, vec![]);
    match check_overlap(&candidate, &existing) {
        OverlapCheck::Rejected { conflicting } => assert_eq!(conflicting.id, "nine"),
        OverlapCheck::Accepted => panic!("9:30 candidate must be rejected"),
    }

    let touching = Task::new("ten", "Focus", 600, 30, vec![]);
    assert!(check_overlap(&touching, &existing).is_accepted());
}

#[test]
fn only_the_first_conflict_is_reported() {
    let existing = vec![
        Task::new("a", "A", 480, 120, vec![]),
        Task::new("b", "B", 540, 30, vec![]),
    ];
    let candidate = Task::new("c", "C", 530, 30, vec![]);
    assert!(matches!(
        check_overlap(&candidate, &existing),
        OverlapCheck::Rejected { conflicting } if conflicting.id == "a"
    ));
}

#[test]
fn rejected_task_is_not_persisted() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let location = init_schedule_in(dir.path(), Some("today".into()))?;

    let mut schedule = load_schedule(&location)?;
    schedule.add_task(record("a", "Standup", 540, 60))?;
    let err = schedule
        .add_task(record("b", "Review", 570, 30))
        .unwrap_err();
    assert!(matches!(err, ScheduleError::Overlap { ref title, start: 540, duration: 60, .. } if title == "Standup"));
    schedule.add_task(record("c", "Focus", 600, 30))?;
    save_schedule(&location, &schedule)?;

    let reloaded = load_schedule(&location)?;
    let ids: Vec<String> = reloaded.tasks().into_iter().map(|t| t.id).collect();
    assert_eq!(ids, vec!["a", "c"]);
    Ok(())
}

#[test]
fn moods_and_completion_round_trip_through_storage() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let location = init_schedule_in(dir.path(), None)?;

    let mut schedule = load_schedule(&location)?;
    schedule.add_task(TaskRecord::new(
        "run".into(),
        "Run".into(),
        Some(420),
        30,
        vec!["health".into()],
    ))?;
    schedule.add_task(record("mail", "Email", 480, 30))?;
    schedule.set_completed("run", true)?;
    schedule.record_mood("run", MoodLevel::Good)?;
    save_schedule(&location, &schedule)?;

    let reloaded = load_schedule(&location)?;
    assert_eq!(reloaded, schedule);
    assert_eq!(reloaded.average_mood(), Some(4.0));
    let unrated: Vec<&str> = reloaded
        .unrated_tasks()
        .into_iter()
        .map(|t| t.title.as_str())
        .collect();
    assert_eq!(unrated, vec!["Email"]);
    Ok(())
}

#[test]
fn suggestions_follow_the_dominant_tag() {
    let mut schedule = Schedule::named("today");
    for (id, start) in [("a", 420), ("b", 480)] {
        schedule
            .add_task(TaskRecord::new(
                id.into(),
                "Lift".into(),
                Some(start),
                30,
                vec!["grind".into()],
            ))
            .unwrap();
    }
    let suggestions = suggest(&schedule.tasks());
    assert_eq!(suggestions.dominant_tag, "grind");
    assert_eq!(suggestions.remaining_minutes, 1380);
    assert_eq!(suggestions.items.len(), 3);
}

/// Counts saves so tests can see the list writing through.
#[derive(Default)]
struct CountingRepository {
    saves: Cell<usize>,
    items: std::cell::RefCell<Vec<TodoItem>>,
}

impl TodoRepository for &CountingRepository {
    fn load(&self) -> Result<Vec<TodoItem>> {
        Ok(self.items.borrow().clone())
    }

    fn save(&self, items: &[TodoItem]) -> Result<()> {
        self.saves.set(self.saves.get() + 1);
        *self.items.borrow_mut() = items.to_vec();
        Ok(())
    }
}

#[test]
fn todo_list_saves_after_every_change() -> Result<()> {
    let repo = CountingRepository::default();
    let mut todos = TodoList::open(&repo)?;
    let id = todos.add("1".into(), "Call mom")?.id.clone();
    todos.toggle(&id)?;
    todos.clear_completed()?;
    assert_eq!(repo.saves.get(), 3);
    assert!(repo.items.borrow().is_empty());
    Ok(())
}

#[test]
fn yaml_todos_survive_reopening() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let location = init_schedule_in(dir.path(), None)?;

    let mut todos = TodoList::open(YamlTodoRepository::for_location(&location))?;
    todos.add("1".into(), "water plants")?;
    todos.add("2".into(), "book dentist")?;
    todos.toggle("2")?;

    let reopened = TodoList::open(YamlTodoRepository::for_location(&location))?;
    let state: Vec<(&str, bool)> = reopened
        .items()
        .iter()
        .map(|i| (i.title.as_str(), i.completed))
        .collect();
    assert_eq!(state, vec![("water plants", false), ("book dentist", true)]);
    Ok(())
}

#[test]
fn hand_edited_huge_durations_load_and_lay_out() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let location = init_schedule_in(dir.path(), None)?;
    fs::write(
        &location.path,
        "name: today
tasks:
  - id: huge
    title: Forever
    start_time: \"23:00\"
    duration: 4294967295
    created_at: 2024-01-01T00:00:00Z
  - id: late
    title: Nowhere
    start_time: \"2024-01-01T25:00:00Z\"
    duration: 30
    created_at: 2024-01-01T00:00:00Z
",
    )?;

    let tasks = load_schedule(&location)?.tasks();
    assert_eq!(tasks[0].duration_minutes(), Some(1440));
    assert!(!tasks[1].is_scheduled());

    let timeline = build_timeline(&tasks, &LayoutConfig::default()).unwrap();
    assert_eq!(timeline.range.end_minutes, 1440);
    assert_eq!(timeline.unscheduled, vec!["late".to_string()]);
    assert_eq!(scheduled_minutes(&tasks), 1440);
    assert_eq!(suggest(&tasks).remaining_minutes, 0);
    Ok(())
}
