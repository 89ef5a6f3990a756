use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::model::TaskId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    #[error("to-do title cannot be empty")]
    EmptyTitle,
    #[error("to-do not found: {0}")]
    NotFound(String),
}

/// Where to-do items are kept between sessions.
pub trait TodoRepository {
    fn load(&self) -> Result<Vec<TodoItem>>;
    fn save(&self, items: &[TodoItem]) -> Result<()>;
}

/// Repository that lives only as long as the value; used when nothing
/// should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryTodoRepository {
    items: RefCell<Vec<TodoItem>>,
}

impl TodoRepository for MemoryTodoRepository {
    fn load(&self) -> Result<Vec<TodoItem>> {
        Ok(self.items.borrow().clone())
    }

    fn save(&self, items: &[TodoItem]) -> Result<()> {
        *self.items.borrow_mut() = items.to_vec();
        Ok(())
    }
}

/// To-do list that writes through its repository after every change.
pub struct TodoList<R: TodoRepository> {
    repo: R,
    items: Vec<TodoItem>,
}

impl<R: TodoRepository> TodoList<R> {
    pub fn open(repo: R) -> Result<Self> {
        let items = repo.load()?;
        Ok(TodoList { repo, items })
    }

    pub fn items(&self) -> &[TodoItem] {
        &self.items
    }

    pub fn add(&mut self, id: TaskId, title: &str) -> Result<&TodoItem> {
        let title = title.trim();
        if title.is_empty() {
            return Err(TodoError::EmptyTitle.into());
        }
        self.items.push(TodoItem {
            id,
            title: title.to_string(),
            completed: false,
            created_at: Utc::now(),
        });
        self.repo.save(&self.items)?;
        Ok(&self.items[self.items.len() - 1])
    }

    /// Flip completion and return the new state.
    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| TodoError::NotFound(id.to_string()))?;
        item.completed = !item.completed;
        let completed = item.completed;
        self.repo.save(&self.items)?;
        Ok(completed)
    }

    pub fn remove(&mut self, id: &str) -> Result<TodoItem> {
        let idx = self
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| TodoError::NotFound(id.to_string()))?;
        let removed = self.items.remove(idx);
        self.repo.save(&self.items)?;
        Ok(removed)
    }

    /// Drop completed items, returning how many were removed.
    pub fn clear_completed(&mut self) -> Result<usize> {
        let before = self.items.len();
        self.items.retain(|i| !i.completed);
        self.repo.save(&self.items)?;
        Ok(before - self.items.len())
    }

    pub fn into_repository(self) -> R {
        self.repo
    }
}
