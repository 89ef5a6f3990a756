use crate::cli::TodoCommand;
use crate::render::{self, EMPTY_TIMELINE, EMPTY_TODOS};
use crate::ui;
use anyhow::{anyhow, Context, Result};
use dayplan::storage::{
    init_project_schedule, load_schedule, locate_schedule, save_schedule, ScheduleLocation,
    YamlTodoRepository,
};
use dayplan::time::{format_duration, MINUTES_PER_DAY};
use dayplan::{
    build_timeline, format_display, parse_display_time, schedule_category, scheduled_minutes,
    suggest, ClockStyle, Config, MoodLevel, Schedule, Task, TaskRecord, TodoList,
};
use rand::{distributions::Alphanumeric, Rng};
use std::env;

const TIMELINE_TEXT_WIDTH: usize = 48;

pub fn init(name: Option<String>) -> Result<()> {
    let location = init_project_schedule(name)?;
    println!("Initialized schedule at {}", location.path.display());
    Ok(())
}

pub fn add(
    config: &Config,
    title: String,
    start: Option<String>,
    duration: u32,
    tags: Vec<String>,
) -> Result<()> {
    let (mut schedule, location) = load_current_schedule()?;
    let start_minutes = start
        .as_deref()
        .map(parse_display_time)
        .transpose()
        .context("reading --start")?;
    let id = generate_id();
    let record = TaskRecord::new(id.clone(), title.trim().to_string(), start_minutes, duration, tags);
    schedule.add_task(record)?;
    save_schedule(&location, &schedule)?;
    match start_minutes {
        Some(minutes) => println!(
            "Added task {} at {} for {}",
            id,
            format_display(i64::from(minutes), config.clock_style),
            format_duration(duration)
        ),
        None => println!("Added unscheduled task {}", id),
    }
    Ok(())
}

pub fn list(config: &Config) -> Result<()> {
    let (schedule, location) = load_current_schedule()?;
    println!("Schedule: {} ({})", schedule.name, location.scope.label());
    let mut tasks = schedule.tasks();
    if tasks.is_empty() {
        println!("  (empty)");
        return Ok(());
    }
    // Scheduled tasks by start time, unscheduled ones last in insertion order.
    tasks.sort_by_key(|t| t.start_minutes().unwrap_or(u32::MAX));
    for task in &tasks {
        print_task(task, config.clock_style);
    }
    Ok(())
}

pub fn remove(task_id: String) -> Result<()> {
    let (mut schedule, location) = load_current_schedule()?;
    let removed = schedule.remove_task(&task_id)?;
    save_schedule(&location, &schedule)?;
    println!("Removed task {} ({})", removed.id, removed.title);
    Ok(())
}

pub fn done(task_id: String, undo: bool) -> Result<()> {
    let (mut schedule, location) = load_current_schedule()?;
    schedule.set_completed(&task_id, !undo)?;
    save_schedule(&location, &schedule)?;
    if undo {
        println!("Reopened task {}", task_id);
    } else {
        println!("Completed task {}", task_id);
    }
    Ok(())
}

pub fn timeline(config: &Config, clock: Option<ClockStyle>) -> Result<()> {
    let (schedule, _) = load_current_schedule()?;
    let mut config = config.clone();
    if let Some(style) = clock {
        config.clock_style = style;
        config.layout.marker_style = style;
    }
    let tasks = schedule.tasks();
    let Some(timeline) = build_timeline(&tasks, &config.layout) else {
        println!("{}", EMPTY_TIMELINE);
        return Ok(());
    };
    let rows = render::timeline_rows(&timeline, &tasks, &config, config.clock_style);
    for line in render::plain_lines(&rows, TIMELINE_TEXT_WIDTH) {
        println!("{}", line);
    }
    if !timeline.unscheduled.is_empty() {
        println!();
        println!("Unscheduled:");
        for id in &timeline.unscheduled {
            if let Some(task) = tasks.iter().find(|t| &t.id == id) {
                println!("  - {}: {}", task.id, task.title);
            }
        }
    }
    Ok(())
}

pub fn suggest_activities() -> Result<()> {
    let (schedule, _) = load_current_schedule()?;
    let suggestions = suggest(&schedule.tasks());
    println!(
        "Based on your {} tasks, {} free today:",
        suggestions.dominant_tag,
        format_duration(suggestions.remaining_minutes)
    );
    if suggestions.is_packed() {
        println!("  Your schedule is packed. Consider rescheduling less important tasks.");
        return Ok(());
    }
    for item in &suggestions.items {
        println!(
            "  - {} ({}): {}",
            item.activity,
            format_duration(item.duration),
            item.benefit
        );
    }
    Ok(())
}

pub fn analyze() -> Result<()> {
    let (schedule, _) = load_current_schedule()?;
    let tasks = schedule.tasks();
    let scheduled = scheduled_minutes(&tasks);
    let completed = tasks.iter().filter(|t| t.completed).count();
    println!("Daily analysis for {}", schedule.name);
    println!("  Schedule type: {}", schedule_category(&tasks));
    println!("  Tasks: {} ({} completed)", tasks.len(), completed);
    if !tasks.is_empty() {
        println!("  Completion: {}%", completed * 100 / tasks.len());
    }
    println!("  Planned time: {}", format_duration(scheduled));
    match schedule.average_mood() {
        Some(avg) => println!("  Average mood: {:.1} / 5", avg),
        None => println!("  Average mood: not rated yet"),
    }
    Ok(())
}

pub fn mood(task_id: String, level: u8) -> Result<()> {
    let (mut schedule, location) = load_current_schedule()?;
    let level =
        MoodLevel::from_value(level).ok_or_else(|| anyhow!("mood must be between 1 and 5"))?;
    schedule.record_mood(&task_id, level)?;
    save_schedule(&location, &schedule)?;
    println!("Recorded mood {} for {}", level.label(), task_id);
    Ok(())
}

pub fn moods(config: &Config) -> Result<()> {
    let (schedule, _) = load_current_schedule()?;
    if schedule.moods.is_empty() {
        println!("No moods recorded yet.");
    }
    for entry in &schedule.moods {
        println!(
            "  - {} [{}] {}",
            entry.task_title,
            entry.level.value(),
            entry.level.label()
        );
    }
    let unrated = schedule.unrated_tasks();
    if !unrated.is_empty() {
        println!("Waiting for a rating:");
        for record in unrated {
            let task = Task::from_record(record);
            let when = task
                .start_minutes()
                .map(|m| format_display(i64::from(m), config.clock_style))
                .unwrap_or_else(|| "unscheduled".to_string());
            println!("  - {}: {} ({})", task.id, task.title, when);
        }
    }
    if let Some(avg) = schedule.average_mood() {
        println!("Average mood: {:.1} / 5", avg);
    }
    Ok(())
}

pub fn todo(action: TodoCommand) -> Result<()> {
    let location = current_location()?;
    let mut todos = TodoList::open(YamlTodoRepository::for_location(&location))?;
    match action {
        TodoCommand::Add { title } => {
            let item = todos.add(generate_id(), &title)?;
            println!("Added to-do {}", item.id);
        }
        TodoCommand::List => {
            if todos.items().is_empty() {
                println!("{}", EMPTY_TODOS);
            }
            for item in todos.items() {
                let mark = if item.completed { "x" } else { " " };
                println!("  [{}] {}: {}", mark, item.id, item.title);
            }
        }
        TodoCommand::Toggle { id } => {
            let completed = todos.toggle(&id)?;
            println!(
                "Marked {} as {}",
                id,
                if completed { "done" } else { "open" }
            );
        }
        TodoCommand::Remove { id } => {
            let removed = todos.remove(&id)?;
            println!("Removed to-do {} ({})", removed.id, removed.title);
        }
        TodoCommand::Clear => {
            let cleared = todos.clear_completed()?;
            println!("Cleared {} completed to-do(s)", cleared);
        }
    }
    Ok(())
}

pub fn tui(config: Config) -> Result<()> {
    let (schedule, location) = load_current_schedule()?;
    ui::run(schedule, location, config)
}

fn current_location() -> Result<ScheduleLocation> {
    let cwd = env::current_dir()?;
    locate_schedule(&cwd)
}

fn load_current_schedule() -> Result<(Schedule, ScheduleLocation)> {
    let location = current_location()?;
    let schedule = load_schedule(&location)?;
    Ok((schedule, location))
}

pub fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect()
}

fn print_task(task: &Task, style: ClockStyle) {
    let mark = if task.completed { " ✓" } else { "" };
    println!("  - {}: {}{}", task.id, task.title, mark);
    match task.interval {
        Some(interval) => println!(
            "    {} - {} ({})",
            format_display(i64::from(interval.start()), style),
            format_display(i64::from(interval.end() % MINUTES_PER_DAY), style),
            format_duration(interval.duration())
        ),
        None => println!("    unscheduled"),
    }
    if !task.tags.is_empty() {
        println!("    tags: {}", task.tags.join(", "));
    }
}
