use crate::model::Schedule;
use crate::todo::{TodoItem, TodoRepository};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use log::info;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const PROJECT_DIR: &str = ".dayplan";
const SCHEDULE_FILE: &str = "schedule.yml";
const TODO_FILE: &str = "todos.yml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleScope {
    Project,
    Global,
}

#[derive(Debug, Clone)]
pub struct ScheduleLocation {
    pub path: PathBuf,
    pub scope: ScheduleScope,
}

impl ScheduleScope {
    pub fn label(&self) -> &'static str {
        match self {
            ScheduleScope::Project => "project",
            ScheduleScope::Global => "global",
        }
    }
}

impl ScheduleLocation {
    /// To-do items live next to the schedule file.
    pub fn todo_path(&self) -> PathBuf {
        self.path.with_file_name(TODO_FILE)
    }
}

pub fn init_project_schedule(name: Option<String>) -> Result<ScheduleLocation> {
    let cwd = env::current_dir()?;
    init_schedule_in(&cwd, name)
}

pub fn init_schedule_in(dir: &Path, name: Option<String>) -> Result<ScheduleLocation> {
    let project_dir = dir.join(PROJECT_DIR);
    fs::create_dir_all(&project_dir).context("failed to create .dayplan directory")?;
    let location = ScheduleLocation {
        path: project_dir.join(SCHEDULE_FILE),
        scope: ScheduleScope::Project,
    };
    if !location.path.exists() {
        let schedule_name = name.unwrap_or_else(|| {
            dir.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("project")
                .to_string()
        });
        save_schedule(&location, &Schedule::named(schedule_name))?;
    }
    Ok(location)
}

pub fn locate_schedule(start: &Path) -> Result<ScheduleLocation> {
    if let Some(project_path) = find_project_schedule(start) {
        return Ok(ScheduleLocation {
            path: project_path,
            scope: ScheduleScope::Project,
        });
    }
    Ok(ScheduleLocation {
        path: data_dir()?.join(SCHEDULE_FILE),
        scope: ScheduleScope::Global,
    })
}

pub fn load_schedule(location: &ScheduleLocation) -> Result<Schedule> {
    if location.path.exists() {
        let data = fs::read_to_string(&location.path)
            .with_context(|| format!("reading {:?}", location.path))?;
        let schedule: Schedule =
            serde_yaml::from_str(&data).context("parsing schedule file")?;
        Ok(schedule)
    } else {
        let fallback_name = match location.scope {
            ScheduleScope::Project => location
                .path
                .parent()
                .and_then(|p| p.parent())
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or("project")
                .to_string(),
            ScheduleScope::Global => "today".to_string(),
        };
        let schedule = Schedule::named(fallback_name);
        save_schedule(location, &schedule)?;
        Ok(schedule)
    }
}

pub fn save_schedule(location: &ScheduleLocation, schedule: &Schedule) -> Result<()> {
    write_yaml(&location.path, schedule)?;
    info!(
        "event=schedule_save status=ok tasks={} path={}",
        schedule.tasks.len(),
        location.path.display()
    );
    Ok(())
}

/// Per-user data directory, also home of the global schedule and the logs.
pub fn data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "dayplan").context("locating data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

/// To-do items stored as a YAML list.
#[derive(Debug, Clone)]
pub struct YamlTodoRepository {
    path: PathBuf,
}

impl YamlTodoRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        YamlTodoRepository { path: path.into() }
    }

    pub fn for_location(location: &ScheduleLocation) -> Self {
        Self::new(location.todo_path())
    }
}

impl TodoRepository for YamlTodoRepository {
    fn load(&self) -> Result<Vec<TodoItem>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data =
            fs::read_to_string(&self.path).with_context(|| format!("reading {:?}", self.path))?;
        let items: Vec<TodoItem> = serde_yaml::from_str(&data).context("parsing to-do file")?;
        Ok(items)
    }

    fn save(&self, items: &[TodoItem]) -> Result<()> {
        write_yaml(&self.path, &items)
    }
}

fn write_yaml<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {:?}", parent))?;
    }
    let serialized = serde_yaml::to_string(value).context("serializing yaml")?;
    fs::write(path, serialized).with_context(|| format!("writing {:?}", path))?;
    Ok(())
}

fn find_project_schedule(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR).join(SCHEDULE_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}
