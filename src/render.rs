use dayplan::time::{format_display, format_duration, ClockStyle};
use dayplan::{Config, LayoutBlock, Task, Timeline};
use std::collections::HashMap;

/// Terminal rows drawn per hour of timeline.
pub const ROWS_PER_HOUR: f64 = 2.0;

pub const EMPTY_TIMELINE: &str =
    "No tasks scheduled for today. Add tasks to see your daily schedule.";
pub const EMPTY_TODOS: &str = "Your to-do list is empty. Add one to get started.";

pub struct TimelineRow {
    pub label: Option<String>,
    pub is_half_hour: bool,
    pub cell: Option<BlockCell>,
}

pub struct BlockCell {
    pub task_id: String,
    pub text: String,
    pub first_line: bool,
    pub color: String,
    pub completed: bool,
}

/// Lay the positioned blocks onto fixed-height terminal rows.
///
/// A row holds at most one block. A block is cut short where the next one
/// starts, and blocks sharing a start row continue on the first free row.
pub fn timeline_rows(
    timeline: &Timeline,
    tasks: &[Task],
    config: &Config,
    style: ClockStyle,
) -> Vec<TimelineRow> {
    let row_px = config.layout.pixels_per_hour / ROWS_PER_HOUR;
    let to_row = |px: f64| (px / row_px).round().max(0.0) as usize;
    let span_px = timeline.range.offset_pixels(timeline.range.end_minutes, &config.layout);
    let row_count = to_row(span_px) + 1;

    let mut rows: Vec<TimelineRow> = (0..row_count)
        .map(|_| TimelineRow {
            label: None,
            is_half_hour: false,
            cell: None,
        })
        .collect();
    for marker in &timeline.range.markers {
        if let Some(row) = rows.get_mut(to_row(marker.position)) {
            row.label = Some(marker.label.clone());
            row.is_half_hour = marker.is_half_hour;
        }
    }

    let by_id: HashMap<&str, &Task> = tasks.iter().map(|t| (t.id.as_str(), t)).collect();
    let starts: Vec<usize> = timeline
        .blocks
        .iter()
        .map(|b| to_row(f64::from(b.top)))
        .collect();
    for (idx, block) in timeline.blocks.iter().enumerate() {
        let Some(task) = by_id.get(block.task_id.as_str()) else {
            continue;
        };
        let lines = block_lines(block, task, style);
        let start = starts[idx];
        let mut end = to_row(f64::from(block.top.saturating_add(block.height))).max(start + 1);
        if let Some(next) = starts[idx + 1..].iter().copied().find(|s| *s > start) {
            end = end.min(next);
        }
        let mut written = 0;
        for row in rows.iter_mut().take(end).skip(start) {
            if row.cell.is_some() {
                continue;
            }
            row.cell = Some(BlockCell {
                task_id: block.task_id.clone(),
                text: lines.get(written).cloned().unwrap_or_default(),
                first_line: written == 0,
                color: config.color_for_tags(&task.tags).to_string(),
                completed: task.completed,
            });
            written += 1;
        }
    }
    rows
}

/// Title plus "start • duration" detail, folded onto one line when compact.
pub fn block_lines(block: &LayoutBlock, task: &Task, style: ClockStyle) -> Vec<String> {
    let detail = format!(
        "{} • {}",
        format_display(i64::from(block.interval.start()), style),
        format_duration(block.interval.duration())
    );
    if block.compact {
        vec![format!("{} • {}", task.title, detail)]
    } else {
        vec![task.title.clone(), detail]
    }
}

/// Plain-text rendering used by the `timeline` command.
pub fn plain_lines(rows: &[TimelineRow], width: usize) -> Vec<String> {
    const LABEL_WIDTH: usize = 9;
    rows.iter()
        .map(|row| {
            let label = match (&row.label, row.is_half_hour) {
                (Some(_), true) => format!("{:>w$}", "·", w = LABEL_WIDTH),
                (Some(text), false) => format!("{:>w$}", text, w = LABEL_WIDTH),
                (None, _) => " ".repeat(LABEL_WIDTH),
            };
            let body = match &row.cell {
                Some(cell) => {
                    let marker = if cell.completed { "✓" } else { "│" };
                    format!("{} {}", marker, truncate_text(&cell.text, width))
                }
                None if row.label.is_some() && !row.is_half_hour => "┄".repeat(width.min(24)),
                None => String::new(),
            };
            format!("{} {}", label, body).trim_end().to_string()
        })
        .collect()
}

pub fn truncate_text(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out.chars().take(max).collect()
}
