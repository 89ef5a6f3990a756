//! Pixel placement of scheduled tasks inside a computed time range.

use log::debug;

use crate::config::LayoutConfig;
use crate::interval::Interval;
use crate::model::{Task, TaskId};
use crate::range::{compute_range, minutes_to_pixels, TimeRange};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    pub top: u32,
    pub height: u32,
}

/// A task positioned on the timeline, in whole pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutBlock {
    pub task_id: TaskId,
    pub interval: Interval,
    pub top: u32,
    pub height: u32,
    pub compact: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub range: TimeRange,
    /// Ordered by start minute; ties keep schedule order.
    pub blocks: Vec<LayoutBlock>,
    pub unscheduled: Vec<TaskId>,
}

pub fn position_of(interval: &Interval, range: &TimeRange, config: &LayoutConfig) -> BlockGeometry {
    let top = range.offset_pixels(interval.start(), config).round().max(0.0) as u32;
    let proportional = minutes_to_pixels(i64::from(interval.duration()), config).round() as u32;
    BlockGeometry {
        top,
        height: proportional.max(config.min_block_height),
    }
}

/// Rendering hint: short blocks get a single condensed line.
pub fn is_compact(height: u32, config: &LayoutConfig) -> bool {
    height < config.compact_threshold
}

pub fn build_timeline(tasks: &[Task], config: &LayoutConfig) -> Option<Timeline> {
    let range = compute_range(tasks, config)?;

    let mut scheduled: Vec<(&Task, Interval)> = tasks
        .iter()
        .filter_map(|t| t.interval.map(|i| (t, i)))
        .collect();
    scheduled.sort_by_key(|(_, interval)| interval.start());

    let blocks: Vec<LayoutBlock> = scheduled
        .into_iter()
        .map(|(task, interval)| {
            let geometry = position_of(&interval, &range, config);
            LayoutBlock {
                task_id: task.id.clone(),
                interval,
                top: geometry.top,
                height: geometry.height,
                compact: is_compact(geometry.height, config),
            }
        })
        .collect();
    let unscheduled = tasks
        .iter()
        .filter(|t| !t.is_scheduled())
        .map(|t| t.id.clone())
        .collect();
    debug!("event=layout status=ok blocks={}", blocks.len());

    Some(Timeline {
        range,
        blocks,
        unscheduled,
    })
}
