use crate::commands::generate_id;
use crate::render::{self, TimelineRow, EMPTY_TIMELINE, EMPTY_TODOS};
use anyhow::{anyhow, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use dayplan::storage::{save_schedule, ScheduleLocation, YamlTodoRepository};
use dayplan::time::{format_duration, MINUTES_PER_DAY};
use dayplan::{
    build_timeline, format_display, parse_display_time, schedule_category, suggest, ClockStyle,
    Config, MoodLevel, Schedule, Task, TaskRecord, TodoList,
};
use log::info;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::{Alignment, Color, Modifier, Rect, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::time::{Duration, Instant};

const LABEL_WIDTH: usize = 9;
const DEFAULT_DURATION: &str = "30";

pub fn run(schedule: Schedule, location: ScheduleLocation, config: Config) -> Result<()> {
    let todos = TodoList::open(YamlTodoRepository::for_location(&location))?;
    let mut terminal = setup_terminal()?;
    let mut app = App::new(schedule, location, config, todos);
    info!("event=tui_start status=ok path={}", app.location.path.display());
    let result = app.event_loop(&mut terminal);
    teardown_terminal(&mut terminal)?;
    info!("event=tui_exit status={}", if result.is_ok() { "ok" } else { "error" });
    result
}

struct App {
    schedule: Schedule,
    location: ScheduleLocation,
    config: Config,
    todos: TodoList<YamlTodoRepository>,
    selected_task: usize,
    selected_todo: usize,
    timeline_offset: usize,
    last_save: Instant,
    status: String,
    mode: Mode,
    view: ViewMode,
}

enum Mode {
    Normal,
    Creating(TaskForm),
    Editing { task_id: String, form: TaskForm },
    ConfirmDelete { task_id: String },
    RateMood { task_id: String, level: u8 },
    AddingTodo(FieldValue),
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum ViewMode {
    Timeline,
    Plan,
}

impl ViewMode {
    fn label(&self) -> &'static str {
        match self {
            ViewMode::Timeline => "Timeline",
            ViewMode::Plan => "Plan",
        }
    }
}

struct TaskForm {
    title: FieldValue,
    start: FieldValue,
    duration: FieldValue,
    tags: FieldValue,
    field: FormField,
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum FormField {
    Title,
    Start,
    Duration,
    Tags,
}

enum FormAction {
    Create,
    Edit(String),
}

/// Single-line text input with a byte cursor kept on char boundaries.
#[derive(Clone)]
struct FieldValue {
    value: String,
    cursor: usize,
}

impl FieldValue {
    fn new(value: &str) -> Self {
        FieldValue {
            value: value.to_string(),
            cursor: value.len(),
        }
    }

    fn move_left(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor = prev_char_boundary(self.cursor, &self.value);
    }

    fn move_right(&mut self) {
        if self.cursor >= self.value.len() {
            return;
        }
        self.cursor = next_char_boundary(self.cursor, &self.value);
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let prev = prev_char_boundary(self.cursor, &self.value);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
    }

    fn insert_char(&mut self, ch: char) {
        self.value.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    fn with_caret(&self) -> String {
        let mut text = self.value.clone();
        text.insert_str(self.cursor, "▌");
        text
    }

    /// Shared line-editing keys; returns false when the key was not handled.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.value.len(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.insert_char(c)
            }
            _ => return false,
        }
        true
    }
}

impl App {
    fn new(
        schedule: Schedule,
        location: ScheduleLocation,
        config: Config,
        todos: TodoList<YamlTodoRepository>,
    ) -> Self {
        let status = format!("Loaded schedule from {}", location.path.display());
        App {
            schedule,
            location,
            config,
            todos,
            selected_task: 0,
            selected_todo: 0,
            timeline_offset: 0,
            last_save: Instant::now(),
            status,
            mode: Mode::Normal,
            view: ViewMode::Timeline,
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;
            if event::poll(Duration::from_millis(200))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key)? {
                        break;
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.mode {
            Mode::Normal => self.handle_normal_key(key),
            Mode::Creating(_) | Mode::Editing { .. } => self.handle_form_key(key),
            Mode::ConfirmDelete { .. } => self.handle_confirm_key(key),
            Mode::RateMood { .. } => self.handle_mood_key(key),
            Mode::AddingTodo(_) => self.handle_todo_input_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('1') => {
                self.set_view(ViewMode::Timeline);
                return Ok(false);
            }
            KeyCode::Char('2') => {
                self.set_view(ViewMode::Plan);
                return Ok(false);
            }
            KeyCode::Tab => {
                let next = match self.view {
                    ViewMode::Timeline => ViewMode::Plan,
                    ViewMode::Plan => ViewMode::Timeline,
                };
                self.set_view(next);
                return Ok(false);
            }
            KeyCode::Char('n') => {
                self.mode = Mode::Creating(TaskForm::new());
                self.status = "Creating new task (Tab/Shift-Tab move, Enter save, Esc cancel)".into();
                return Ok(false);
            }
            KeyCode::Char('t') => {
                self.config.clock_style = match self.config.clock_style {
                    ClockStyle::Hour12 => ClockStyle::Hour24,
                    ClockStyle::Hour24 => ClockStyle::Hour12,
                };
                self.config.layout.marker_style = self.config.clock_style;
                self.status = match self.config.clock_style {
                    ClockStyle::Hour12 => "Showing 12-hour clock".into(),
                    ClockStyle::Hour24 => "Showing 24-hour clock".into(),
                };
                return Ok(false);
            }
            _ => {}
        }

        match self.view {
            ViewMode::Timeline => self.handle_timeline_key(key),
            ViewMode::Plan => self.handle_plan_key(key),
        }
    }

    fn handle_timeline_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_task = self.selected_task.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => self.selected_task += 1,
            KeyCode::Char('e') => {
                if let Some(record) = self.current_record() {
                    let form = TaskForm::from_record(record, self.config.clock_style);
                    let task_id = record.id.clone();
                    self.status = format!("Editing {}", task_id);
                    self.mode = Mode::Editing { task_id, form };
                } else {
                    self.status = "No task selected to edit".into();
                }
            }
            KeyCode::Char('d') => {
                if let Some(task) = self.current_task() {
                    self.status = format!("Delete {}? (y to confirm, n/Esc to cancel)", task.id);
                    self.mode = Mode::ConfirmDelete { task_id: task.id };
                } else {
                    self.status = "No task selected to delete".into();
                }
            }
            KeyCode::Char(' ') | KeyCode::Char('x') => {
                if let Some(task) = self.current_task() {
                    self.schedule.set_completed(&task.id, !task.completed)?;
                    let verb = if task.completed { "Reopened" } else { "Completed" };
                    self.persist(format!("{} {}", verb, task.title))?;
                } else {
                    self.status = "No task selected".into();
                }
            }
            KeyCode::Char('m') => match self.current_task() {
                Some(task) if self.schedule.moods.iter().any(|m| m.task_id == task.id) => {
                    self.status = format!("Mood already recorded for {}", task.title);
                }
                Some(task) => {
                    self.status = "Rate with 1-5 or ←→ then Enter, Esc to cancel".into();
                    self.mode = Mode::RateMood {
                        task_id: task.id,
                        level: MoodLevel::Neutral.value(),
                    };
                }
                None => self.status = "No task selected to rate".into(),
            },
            _ => {}
        }
        self.ensure_bounds();
        Ok(false)
    }

    fn handle_plan_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_todo = self.selected_todo.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => self.selected_todo += 1,
            KeyCode::Char('a') => {
                self.mode = Mode::AddingTodo(FieldValue::new(""));
                self.status = "New to-do (Enter save, Esc cancel)".into();
            }
            KeyCode::Char(' ') | KeyCode::Char('x') => {
                let id = self.current_todo_id();
                self.status = match id.map(|id| self.todos.toggle(&id)) {
                    Some(Ok(true)) => "To-do done".into(),
                    Some(Ok(false)) => "To-do reopened".into(),
                    Some(Err(err)) => format!("Could not update to-do: {}", err),
                    None => "No to-do selected".into(),
                };
            }
            KeyCode::Char('d') => {
                let id = self.current_todo_id();
                self.status = match id.map(|id| self.todos.remove(&id)) {
                    Some(Ok(item)) => format!("Removed to-do {}", item.title),
                    Some(Err(err)) => format!("Could not remove to-do: {}", err),
                    None => "No to-do selected".into(),
                };
            }
            KeyCode::Char('c') => {
                self.status = match self.todos.clear_completed() {
                    Ok(count) => format!("Cleared {} completed to-do(s)", count),
                    Err(err) => format!("Could not clear to-dos: {}", err),
                };
            }
            _ => {}
        }
        self.ensure_bounds();
        Ok(false)
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut close_form = false;
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        match &mut mode {
            Mode::Creating(form) => {
                close_form = self.process_form_key(FormAction::Create, form, key)?;
            }
            Mode::Editing { task_id, form } => {
                let id = task_id.clone();
                close_form = self.process_form_key(FormAction::Edit(id), form, key)?;
            }
            _ => {}
        }
        self.mode = if close_form { Mode::Normal } else { mode };
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyEvent) -> Result<bool> {
        let task_id = match &self.mode {
            Mode::ConfirmDelete { task_id } => task_id.clone(),
            _ => return Ok(false),
        };
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                match self.schedule.remove_task(&task_id) {
                    Ok(removed) => self.persist(format!("Deleted {}", removed.title))?,
                    Err(err) => self.status = format!("Delete failed: {}", err),
                }
                self.mode = Mode::Normal;
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.status = "Delete canceled".into();
                self.mode = Mode::Normal;
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_mood_key(&mut self, key: KeyEvent) -> Result<bool> {
        let (task_id, mut level) = match &self.mode {
            Mode::RateMood { task_id, level } => (task_id.clone(), *level),
            _ => return Ok(false),
        };
        let mut submit = false;
        match key.code {
            KeyCode::Esc => {
                self.status = "Rating canceled".into();
                self.mode = Mode::Normal;
                return Ok(false);
            }
            KeyCode::Left | KeyCode::Char('h') => level = level.saturating_sub(1).max(1),
            KeyCode::Right | KeyCode::Char('l') => level = (level + 1).min(5),
            KeyCode::Char(c @ '1'..='5') => {
                level = c as u8 - b'0';
                submit = true;
            }
            KeyCode::Enter => submit = true,
            _ => {}
        }
        if !submit {
            self.mode = Mode::RateMood { task_id, level };
            return Ok(false);
        }
        self.mode = Mode::Normal;
        let Some(mood) = MoodLevel::from_value(level) else {
            return Ok(false);
        };
        match self.schedule.record_mood(&task_id, mood) {
            Ok(()) => self.persist(format!("Recorded mood {}", mood.label()))?,
            Err(err) => self.status = format!("Could not rate: {}", err),
        }
        Ok(false)
    }

    fn handle_todo_input_key(&mut self, key: KeyEvent) -> Result<bool> {
        let mut mode = std::mem::replace(&mut self.mode, Mode::Normal);
        let mut close = false;
        if let Mode::AddingTodo(field) = &mut mode {
            match key.code {
                KeyCode::Esc => {
                    self.status = "Canceled".into();
                    close = true;
                }
                KeyCode::Enter => match self.todos.add(generate_id(), &field.value) {
                    Ok(item) => {
                        self.status = format!("Added to-do {}", item.title);
                        self.selected_todo = self.todos.items().len().saturating_sub(1);
                        close = true;
                    }
                    Err(err) => self.status = format!("Could not add: {}", err),
                },
                _ => {
                    field.handle_key(key);
                }
            }
        }
        self.mode = if close { Mode::Normal } else { mode };
        Ok(false)
    }

    fn set_view(&mut self, view: ViewMode) {
        if self.view != view {
            self.view = view;
            self.status = format!("Switched to {} view", view.label());
        }
        self.ensure_bounds();
    }

    fn process_form_key(
        &mut self,
        action: FormAction,
        form: &mut TaskForm,
        key: KeyEvent,
    ) -> Result<bool> {
        let mut close_form = false;
        match key.code {
            KeyCode::Esc => {
                close_form = true;
                self.status = "Canceled".into();
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.prev_field(),
            KeyCode::Enter => close_form = self.try_submit(action, form)?,
            _ => {
                form.active_field_mut().handle_key(key);
            }
        }
        Ok(close_form)
    }

    fn try_submit(&mut self, action: FormAction, form: &mut TaskForm) -> Result<bool> {
        match action {
            FormAction::Create => {
                if let Err(err) = self.create_task_from_form(form) {
                    self.status = format!("Could not create: {}", err);
                    Ok(false)
                } else {
                    Ok(true)
                }
            }
            FormAction::Edit(task_id) => {
                if let Err(err) = self.edit_task_from_form(&task_id, form) {
                    self.status = format!("Could not edit: {}", err);
                    Ok(false)
                } else {
                    Ok(true)
                }
            }
        }
    }

    fn draw(&mut self, f: &mut ratatui::Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(8),
                Constraint::Length(4),
            ])
            .split(f.size());

        self.draw_header(f, layout[0]);
        match self.view {
            ViewMode::Timeline => self.draw_timeline(f, layout[1]),
            ViewMode::Plan => self.draw_plan(f, layout[1]),
        }
        self.draw_footer(f, layout[2]);

        match &self.mode {
            Mode::Creating(form) => self.draw_form(f, "New Task", form),
            Mode::Editing { form, .. } => self.draw_form(f, "Edit Task", form),
            Mode::ConfirmDelete { task_id } => self.draw_confirm(f, task_id),
            Mode::RateMood { task_id, level } => self.draw_mood(f, task_id, *level),
            Mode::AddingTodo(field) => self.draw_todo_input(f, field),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let title = Line::from(vec![
            Span::styled(
                "dayplan ",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                &self.schedule.name,
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("  •  "),
            Span::styled(self.location.scope.label(), Style::default().fg(Color::Green)),
            Span::raw("  •  "),
            Span::styled(
                format!("{}", self.location.path.display()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("saved {}", format_elapsed(self.last_save)),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("  •  "),
            Span::styled(
                format!("view {}", self.view.label().to_lowercase()),
                Style::default().fg(Color::Magenta),
            ),
        ]);

        let block = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray));
        let paragraph = Paragraph::new(title)
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
    }

    fn draw_timeline(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        self.ensure_bounds();
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(area);

        let tasks = self.schedule.tasks();
        let block = Block::default()
            .title(Span::styled(
                "Today",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .style(Style::default().bg(Color::Rgb(16, 18, 24)));

        let Some(timeline) = build_timeline(&tasks, &self.config.layout) else {
            let msg = Paragraph::new(EMPTY_TIMELINE)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);
            f.render_widget(msg, chunks[0]);
            self.draw_task_list(f, chunks[1], &tasks);
            return;
        };

        let rows = render::timeline_rows(&timeline, &tasks, &self.config, self.config.clock_style);
        let selected_id = self.current_task().map(|t| t.id);
        let inner_width = chunks[0].width.saturating_sub(2) as usize;
        let text_width = inner_width.saturating_sub(LABEL_WIDTH + 3);
        let lines: Vec<Line<'static>> = rows
            .iter()
            .map(|row| timeline_line(row, selected_id.as_deref(), text_width))
            .collect();

        if let Some(row) = selected_id.as_deref().and_then(|id| {
            rows.iter()
                .position(|r| r.cell.as_ref().is_some_and(|c| c.task_id == id && c.first_line))
        }) {
            let viewport = chunks[0].height.saturating_sub(2) as usize;
            self.timeline_offset =
                adjust_offset(row, self.timeline_offset, viewport, 2, lines.len());
        }

        let paragraph = Paragraph::new(lines)
            .block(block)
            .scroll((self.timeline_offset as u16, 0));
        f.render_widget(paragraph, chunks[0]);
        self.draw_task_list(f, chunks[1], &tasks);
    }

    fn draw_task_list(&self, f: &mut ratatui::Frame<'_>, area: Rect, tasks: &[Task]) {
        let ordered = ordered_tasks(tasks.to_vec());
        let width = area.width.saturating_sub(2) as usize;
        let items: Vec<ListItem> = ordered
            .iter()
            .map(|task| task_item(task, &self.config, width))
            .collect();
        let mut state = ListState::default();
        if !ordered.is_empty() {
            state.select(Some(self.selected_task));
        }
        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!("Tasks ({})", ordered.len()))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::LightBlue)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::LightCyan)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD),
            );
        f.render_stateful_widget(list, area, &mut state);
    }

    fn draw_plan(&mut self, f: &mut ratatui::Frame<'_>, area: Rect) {
        self.ensure_bounds();
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[0]);

        let tasks = self.schedule.tasks();
        let suggestions = suggest(&tasks);
        let mut lines = vec![Line::from(vec![
            Span::styled(
                format!("#{}", suggestions.dominant_tag),
                Style::default().fg(Color::LightMagenta),
            ),
            Span::raw(format!(
                "  {} free",
                format_duration(suggestions.remaining_minutes)
            )),
        ])];
        if suggestions.is_packed() {
            lines.push(Line::from(
                "Your schedule is packed. Consider rescheduling less important tasks.",
            ));
        }
        for item in &suggestions.items {
            lines.push(Line::from(vec![
                Span::styled(
                    item.activity,
                    Style::default()
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("  {}", format_duration(item.duration)),
                    Style::default().fg(Color::LightYellow),
                ),
                Span::styled(
                    format!("  {}", item.benefit),
                    Style::default().fg(Color::Gray),
                ),
            ]));
        }
        let panel = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title("Suggestions")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightGreen)),
        );
        f.render_widget(panel, left[0]);

        let completed = tasks.iter().filter(|t| t.completed).count();
        let mut lines = vec![
            Line::from(format!("Schedule type: {}", schedule_category(&tasks))),
            Line::from(format!("Completed: {} of {}", completed, tasks.len())),
            Line::from(match self.schedule.average_mood() {
                Some(avg) => format!("Average mood: {:.1} / 5", avg),
                None => "Average mood: not rated yet".to_string(),
            }),
        ];
        let unrated = self.schedule.unrated_tasks();
        if !unrated.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Waiting for a rating",
                Style::default().fg(Color::Yellow),
            )));
            for record in unrated {
                lines.push(Line::from(format!("  {}", record.title)));
            }
        }
        let panel = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
            Block::default()
                .title("Analysis")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightYellow)),
        );
        f.render_widget(panel, left[1]);

        let block = Block::default()
            .title(format!("To-do ({})", self.todos.items().len()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::LightBlue));
        if self.todos.items().is_empty() {
            let msg = Paragraph::new(EMPTY_TODOS)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);
            f.render_widget(msg, chunks[1]);
            return;
        }
        let width = chunks[1].width.saturating_sub(6) as usize;
        let items: Vec<ListItem> = self
            .todos
            .items()
            .iter()
            .map(|item| {
                let (mark, style) = if item.completed {
                    (
                        "[x] ",
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::CROSSED_OUT),
                    )
                } else {
                    ("[ ] ", Style::default().fg(Color::White))
                };
                ListItem::new(Line::from(vec![
                    Span::raw(mark),
                    Span::styled(render::truncate_text(&item.title, width), style),
                ]))
            })
            .collect();
        let mut state = ListState::default();
        state.select(Some(self.selected_todo));
        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(Color::LightCyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        );
        f.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn draw_footer(&self, f: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Length(2)])
            .split(area);

        let help_bar = Paragraph::new(self.footer_help_line())
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(help_bar, rows[0]);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(rows[1]);

        let status = Paragraph::new(self.status.clone())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray)),
            );
        f.render_widget(status, bottom[0]);

        let detail = Paragraph::new(self.detail_line())
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title("Selected"),
            );
        f.render_widget(detail, bottom[1]);
    }

    fn footer_help_line(&self) -> Line<'static> {
        let mut spans = vec![
            Span::styled("1", Style::default().fg(Color::LightCyan)),
            Span::raw(" timeline  "),
            Span::styled("2", Style::default().fg(Color::LightCyan)),
            Span::raw(" plan  "),
            Span::styled("n", Style::default().fg(Color::LightMagenta)),
            Span::raw(" new  "),
            Span::styled("t", Style::default().fg(Color::LightCyan)),
            Span::raw(" 12h/24h  "),
        ];
        match self.view {
            ViewMode::Timeline => spans.extend([
                Span::styled("↑↓ / j k", Style::default().fg(Color::LightCyan)),
                Span::raw(" select  "),
                Span::styled("e", Style::default().fg(Color::LightYellow)),
                Span::raw(" edit  "),
                Span::styled("space", Style::default().fg(Color::LightGreen)),
                Span::raw(" done  "),
                Span::styled("m", Style::default().fg(Color::LightYellow)),
                Span::raw(" mood  "),
                Span::styled("d", Style::default().fg(Color::LightRed)),
                Span::raw(" delete  "),
                Span::styled("q", Style::default().fg(Color::LightRed)),
                Span::raw(" quit"),
            ]),
            ViewMode::Plan => spans.extend([
                Span::styled("↑↓ / j k", Style::default().fg(Color::LightCyan)),
                Span::raw(" select  "),
                Span::styled("a", Style::default().fg(Color::LightMagenta)),
                Span::raw(" add to-do  "),
                Span::styled("space", Style::default().fg(Color::LightGreen)),
                Span::raw(" toggle  "),
                Span::styled("c", Style::default().fg(Color::LightYellow)),
                Span::raw(" clear done  "),
                Span::styled("d", Style::default().fg(Color::LightRed)),
                Span::raw(" remove  "),
                Span::styled("q", Style::default().fg(Color::LightRed)),
                Span::raw(" quit"),
            ]),
        }
        Line::from(spans)
    }

    fn detail_line(&self) -> Line<'static> {
        if self.view == ViewMode::Plan {
            return match self.todos.items().get(self.selected_todo) {
                Some(item) => Line::from(vec![
                    Span::styled(
                        item.title.clone(),
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  added {}", item.created_at.format("%Y-%m-%d %H:%M")),
                        Style::default().fg(Color::Gray),
                    ),
                ]),
                None => Line::from("No to-do selected"),
            };
        }
        let Some(task) = self.current_task() else {
            return Line::from("No task selected");
        };
        let mut spans = vec![Span::styled(
            task.title.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )];
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            time_span_text(&task, self.config.clock_style),
            Style::default().fg(Color::LightRed),
        ));
        if !task.tags.is_empty() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                format!("#{}", task.tags.join(" #")),
                Style::default().fg(Color::LightMagenta),
            ));
        }
        if let Some(entry) = self.schedule.moods.iter().find(|m| m.task_id == task.id) {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                format!("mood {}", entry.level.label()),
                Style::default().fg(Color::Gray).add_modifier(Modifier::DIM),
            ));
        }
        Line::from(spans)
    }

    fn draw_form(&self, f: &mut ratatui::Frame<'_>, title: &str, form: &TaskForm) {
        let area = centered_rect(60, 50, f.size());
        let mut fields = vec![
            field_line("Title", &form.title, form.field == FormField::Title),
            field_line(
                "Start (9:30 AM or 14:00)",
                &form.start,
                form.field == FormField::Start,
            ),
            field_line(
                "Duration (min)",
                &form.duration,
                form.field == FormField::Duration,
            ),
            field_line("Tags", &form.tags, form.field == FormField::Tags),
        ];
        fields.push(Line::from(""));
        fields.push(Line::from(Span::styled(
            "Enter to save • Esc to cancel • Tab/Shift-Tab to move • empty start leaves it unscheduled",
            Style::default().fg(Color::Gray),
        )));
        let dialog = Paragraph::new(fields)
            .block(
                Block::default()
                    .title(Span::styled(
                        title,
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD),
                    ))
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .wrap(Wrap { trim: true });

        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_confirm(&self, f: &mut ratatui::Frame<'_>, task_id: &str) {
        let area = centered_rect(50, 30, f.size());
        let title = self
            .schedule
            .find(task_id)
            .map(|t| t.title.clone())
            .unwrap_or_else(|| task_id.to_string());
        let body = vec![
            Line::from(Span::styled(
                format!("Delete \"{}\"?", title),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from("Press y to confirm, n or Esc to cancel"),
        ];
        let dialog = Paragraph::new(body).alignment(Alignment::Center).block(
            Block::default()
                .title(Span::styled(
                    "Confirm Delete",
                    Style::default()
                        .fg(Color::LightRed)
                        .add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightRed)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_mood(&self, f: &mut ratatui::Frame<'_>, task_id: &str, level: u8) {
        let area = centered_rect(50, 30, f.size());
        let title = self
            .schedule
            .find(task_id)
            .map(|t| t.title.clone())
            .unwrap_or_else(|| task_id.to_string());
        let scale: Vec<Span> = MoodLevel::ALL
            .iter()
            .flat_map(|mood| {
                let style = if mood.value() == level {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::LightYellow)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Gray)
                };
                [
                    Span::styled(format!(" {} {} ", mood.value(), mood.label()), style),
                    Span::raw(" "),
                ]
            })
            .collect();
        let body = vec![
            Line::from(Span::styled(
                format!("How did \"{}\" go?", title),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(scale),
        ];
        let dialog = Paragraph::new(body)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .title("Rate Mood")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::LightYellow)),
            );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    fn draw_todo_input(&self, f: &mut ratatui::Frame<'_>, field: &FieldValue) {
        let area = centered_rect(50, 20, f.size());
        let dialog = Paragraph::new(field_line("To-do", field, true)).block(
            Block::default()
                .title("New To-do")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::LightMagenta)),
        );
        f.render_widget(Clear, area);
        f.render_widget(dialog, area);
    }

    /// Tasks in the order the timeline shows them.
    fn ordered(&self) -> Vec<Task> {
        ordered_tasks(self.schedule.tasks())
    }

    fn current_task(&self) -> Option<Task> {
        self.ordered().into_iter().nth(self.selected_task)
    }

    fn current_record(&self) -> Option<&TaskRecord> {
        let task = self.current_task()?;
        self.schedule.find(&task.id)
    }

    fn current_todo_id(&self) -> Option<String> {
        self.todos
            .items()
            .get(self.selected_todo)
            .map(|item| item.id.clone())
    }

    fn ensure_bounds(&mut self) {
        let task_count = self.schedule.tasks.len();
        self.selected_task = self.selected_task.min(task_count.saturating_sub(1));
        let todo_count = self.todos.items().len();
        self.selected_todo = self.selected_todo.min(todo_count.saturating_sub(1));
    }

    fn create_task_from_form(&mut self, form: &TaskForm) -> Result<()> {
        let (title, start, duration, tags) = form.parse()?;
        let id = generate_id();
        let record = TaskRecord::new(id.clone(), title, start, duration, tags);
        self.schedule.add_task(record)?;
        if let Some(idx) = self.ordered().iter().position(|t| t.id == id) {
            self.selected_task = idx;
        }
        self.persist(format!("Created task {}", id))?;
        Ok(())
    }

    fn edit_task_from_form(&mut self, task_id: &str, form: &TaskForm) -> Result<()> {
        let (title, start, duration, tags) = form.parse()?;
        let existing = self
            .schedule
            .find(task_id)
            .ok_or_else(|| anyhow!("task {} no longer exists", task_id))?;
        let mut record = TaskRecord::new(task_id.to_string(), title, start, duration, tags);
        record.completed = existing.completed;
        record.created_at = existing.created_at;
        self.schedule.replace_task(record)?;
        if let Some(idx) = self.ordered().iter().position(|t| t.id == task_id) {
            self.selected_task = idx;
        }
        self.persist(format!("Updated {}", task_id))?;
        Ok(())
    }

    fn persist(&mut self, message: impl Into<String>) -> Result<()> {
        save_schedule(&self.location, &self.schedule)?;
        self.last_save = Instant::now();
        self.status = message.into();
        self.ensure_bounds();
        Ok(())
    }
}

impl TaskForm {
    fn new() -> Self {
        TaskForm {
            title: FieldValue::new(""),
            start: FieldValue::new(""),
            duration: FieldValue::new(DEFAULT_DURATION),
            tags: FieldValue::new(""),
            field: FormField::Title,
        }
    }

    fn from_record(record: &TaskRecord, style: ClockStyle) -> Self {
        let task = Task::from_record(record);
        let start = task
            .start_minutes()
            .map(|m| format_display(i64::from(m), style))
            .unwrap_or_default();
        let duration = record
            .duration_minutes()
            .map(|m| m.to_string())
            .unwrap_or_else(|| DEFAULT_DURATION.to_string());
        TaskForm {
            title: FieldValue::new(&record.title),
            start: FieldValue::new(&start),
            duration: FieldValue::new(&duration),
            tags: FieldValue::new(&record.tags.join(" ")),
            field: FormField::Title,
        }
    }

    /// Validated title, start, duration and tags.
    fn parse(&self) -> Result<(String, Option<u32>, u32, Vec<String>)> {
        let title = self.title.value.trim();
        if title.is_empty() {
            return Err(anyhow!("title is required"));
        }
        let start = match self.start.value.trim() {
            "" => None,
            text => Some(parse_display_time(text)?),
        };
        let duration = self
            .duration
            .value
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|d| (1..=MINUTES_PER_DAY).contains(d))
            .ok_or_else(|| anyhow!("duration must be between 1 and 1440 minutes"))?;
        Ok((
            title.to_string(),
            start,
            duration,
            parse_tags(&self.tags.value),
        ))
    }

    fn next_field(&mut self) {
        self.field = match self.field {
            FormField::Title => FormField::Start,
            FormField::Start => FormField::Duration,
            FormField::Duration => FormField::Tags,
            FormField::Tags => FormField::Title,
        };
    }

    fn prev_field(&mut self) {
        self.field = match self.field {
            FormField::Title => FormField::Tags,
            FormField::Start => FormField::Title,
            FormField::Duration => FormField::Start,
            FormField::Tags => FormField::Duration,
        };
    }

    fn active_field_mut(&mut self) -> &mut FieldValue {
        match self.field {
            FormField::Title => &mut self.title,
            FormField::Start => &mut self.start,
            FormField::Duration => &mut self.duration,
            FormField::Tags => &mut self.tags,
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Scheduled tasks by start time, then unscheduled ones in insertion order.
fn ordered_tasks(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_key(|t| t.start_minutes().unwrap_or(u32::MAX));
    tasks
}

fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().trim_start_matches('#').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `#RRGGBB` into a terminal color; anything else falls back to gray.
fn hex_color(hex: &str) -> Color {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Color::Gray;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => Color::Rgb(r, g, b),
        _ => Color::Gray,
    }
}

fn adjust_offset(
    selected: usize,
    current_offset: usize,
    viewport: usize,
    scrolloff: usize,
    len: usize,
) -> usize {
    if viewport == 0 || len == 0 {
        return 0;
    }
    let max_offset = len.saturating_sub(viewport);
    let margin = scrolloff.min(viewport.saturating_sub(1));
    let mut offset = current_offset.min(max_offset);
    if selected < offset.saturating_add(margin) {
        offset = selected.saturating_sub(margin);
    } else {
        let upper = offset
            .saturating_add(viewport.saturating_sub(1))
            .saturating_sub(margin);
        if selected > upper {
            offset = selected.saturating_add(margin + 1).saturating_sub(viewport);
        }
    }
    offset.min(max_offset)
}

fn prev_char_boundary(cursor: usize, text: &str) -> usize {
    text[..cursor]
        .char_indices()
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_char_boundary(cursor: usize, text: &str) -> usize {
    text[cursor..]
        .chars()
        .next()
        .map(|ch| cursor + ch.len_utf8())
        .unwrap_or(text.len())
}

fn time_span_text(task: &Task, style: ClockStyle) -> String {
    match task.interval {
        Some(interval) => format!(
            "{} - {} ({})",
            format_display(i64::from(interval.start()), style),
            format_display(i64::from(interval.end() % MINUTES_PER_DAY), style),
            format_duration(interval.duration())
        ),
        None => "unscheduled".to_string(),
    }
}

fn timeline_line(row: &TimelineRow, selected: Option<&str>, width: usize) -> Line<'static> {
    let label = match (&row.label, row.is_half_hour) {
        (Some(_), true) => format!("{:>w$} ", "·", w = LABEL_WIDTH),
        (Some(text), false) => format!("{:>w$} ", text, w = LABEL_WIDTH),
        (None, _) => " ".repeat(LABEL_WIDTH + 1),
    };
    let mut spans = vec![Span::styled(label, Style::default().fg(Color::DarkGray))];
    match &row.cell {
        Some(cell) => {
            let color = hex_color(&cell.color);
            let mut text_style = Style::default().fg(Color::White);
            if cell.first_line {
                text_style = text_style.add_modifier(Modifier::BOLD);
            }
            if cell.completed {
                text_style = text_style
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT);
            }
            if selected == Some(cell.task_id.as_str()) {
                text_style = text_style.bg(Color::Rgb(40, 44, 56));
            }
            spans.push(Span::styled("▌ ", Style::default().fg(color)));
            spans.push(Span::styled(
                format!("{:<w$}", render::truncate_text(&cell.text, width), w = width),
                text_style,
            ));
        }
        None if row.label.is_some() && !row.is_half_hour => {
            spans.push(Span::styled(
                "┄".repeat(width + 2),
                Style::default().fg(Color::Rgb(48, 52, 64)),
            ));
        }
        None => {}
    }
    Line::from(spans)
}

fn task_item(task: &Task, config: &Config, width: usize) -> ListItem<'static> {
    let color = hex_color(config.color_for_tags(&task.tags));
    let mut title_style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    if task.completed {
        title_style = title_style
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT);
    }
    let lines = vec![
        Line::from(vec![
            Span::styled("● ", Style::default().fg(color)),
            Span::styled(
                render::truncate_text(&task.title, width.saturating_sub(2)),
                title_style,
            ),
        ]),
        Line::from(Span::styled(
            format!("  {}", time_span_text(task, config.clock_style)),
            Style::default().fg(Color::Gray),
        )),
    ];
    ListItem::new(lines)
}

fn field_line(label: &str, field: &FieldValue, active: bool) -> Line<'static> {
    let label_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::BOLD | Modifier::DIM);
    let value_style = Style::default().fg(if active { Color::Cyan } else { Color::White });
    let text = if active {
        field.with_caret()
    } else {
        field.value.clone()
    };
    Line::from(vec![
        Span::styled(format!("{}: ", label), label_style),
        Span::styled(text, value_style),
    ])
}

fn format_elapsed(last: Instant) -> String {
    let secs = last.elapsed().as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("#4A90E2", Color::Rgb(0x4A, 0x90, 0xE2))]
    #[case("ffc107", Color::Rgb(0xFF, 0xC1, 0x07))]
    #[case("#abc", Color::Gray)]
    #[case("#zzzzzz", Color::Gray)]
    fn hex_colors(#[case] input: &str, #[case] expected: Color) {
        assert_eq!(hex_color(input), expected);
    }

    #[test]
    fn tags_split_on_commas_and_spaces() {
        assert_eq!(
            parse_tags("Work, #health  deep"),
            vec!["work".to_string(), "health".into(), "deep".into()]
        );
        assert!(parse_tags("  ,  ").is_empty());
    }

    #[test]
    fn form_reports_bad_start_time() {
        let mut form = TaskForm::new();
        form.title = FieldValue::new("Gym");
        form.start = FieldValue::new("25:00");
        let err = form.parse().unwrap_err();
        assert!(err.to_string().contains("invalid time format"));

        form.start = FieldValue::new("6:15 pm");
        let (_, start, duration, _) = form.parse().unwrap();
        assert_eq!(start, Some(1095));
        assert_eq!(duration, 30);
    }

    #[test]
    fn form_rejects_zero_duration_and_blank_title() {
        let mut form = TaskForm::new();
        assert!(form.parse().is_err());
        form.title = FieldValue::new("Nap");
        form.duration = FieldValue::new("0");
        assert!(form.parse().is_err());
        form.duration = FieldValue::new("4294967295");
        assert!(form.parse().is_err());
        form.duration = FieldValue::new("1441");
        assert!(form.parse().is_err());
        form.duration = FieldValue::new("1440");
        assert_eq!(form.parse().map(|(_, _, d, _)| d).ok(), Some(1440));
    }

    #[test]
    fn field_editing_respects_multibyte_chars() {
        let mut field = FieldValue::new("café");
        field.backspace();
        assert_eq!(field.value, "caf");
        field.move_left();
        field.insert_char('ß');
        assert_eq!(field.value, "caßf");
        assert_eq!(field.with_caret(), "caß▌f");
    }

    #[test]
    fn offset_keeps_selection_visible() {
        assert_eq!(adjust_offset(0, 0, 10, 2, 30), 0);
        assert_eq!(adjust_offset(15, 0, 10, 2, 30), 8);
        assert_eq!(adjust_offset(29, 8, 10, 2, 30), 20);
        assert_eq!(adjust_offset(3, 20, 10, 2, 30), 1);
    }

    #[test]
    fn unscheduled_tasks_sort_last() {
        let tasks = vec![
            Task::unscheduled("u", "Someday", vec![]),
            Task::new("b", "Lunch", 720, 60, vec![]),
            Task::new("a", "Run", 420, 30, vec![]),
        ];
        let ids: Vec<String> = ordered_tasks(tasks).into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["a", "b", "u"]);
    }
}
