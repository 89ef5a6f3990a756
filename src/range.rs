//! Visible window and gridline computation for the day timeline.
//!
//! The window is derived from the earliest start and latest end among the
//! scheduled tasks, snapped outward to whole hours, padded, and widened to a
//! configured minimum. Every position is linear in minutes from the window
//! start.

use log::debug;

use crate::config::LayoutConfig;
use crate::model::Task;
use crate::time::{format_display, MINUTES_PER_DAY};

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub minute: u32,
    pub label: String,
    pub is_half_hour: bool,
    /// Pixels from the top of the timeline.
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeRange {
    pub start_minutes: u32,
    pub end_minutes: u32,
    pub timeline_height: f64,
    pub markers: Vec<Marker>,
}

impl TimeRange {
    pub fn span_minutes(&self) -> u32 {
        self.end_minutes.saturating_sub(self.start_minutes)
    }

    /// Pixel offset of `minute` from the window start; may be negative.
    pub fn offset_pixels(&self, minute: u32, config: &LayoutConfig) -> f64 {
        minutes_to_pixels(i64::from(minute) - i64::from(self.start_minutes), config)
    }

    pub fn hour_markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(|m| !m.is_half_hour)
    }
}

pub(crate) fn minutes_to_pixels(minutes: i64, config: &LayoutConfig) -> f64 {
    minutes as f64 / 60.0 * config.pixels_per_hour
}

/// Compute the window for the scheduled tasks, or `None` when there are none.
///
/// Callers render an empty state for `None` rather than a zero-height timeline.
pub fn compute_range(tasks: &[Task], config: &LayoutConfig) -> Option<TimeRange> {
    let intervals: Vec<_> = tasks.iter().filter_map(|t| t.interval).collect();
    let min_start = intervals.iter().map(|i| i.start()).min()?;
    let max_end = intervals.iter().map(|i| i.end()).max()?;

    let padding = config.padding_hours.saturating_mul(60).min(MINUTES_PER_DAY);
    let mut start = floor_hour(min_start)
        .min(MINUTES_PER_DAY)
        .saturating_sub(padding);
    let mut end = ceil_hour(max_end)
        .saturating_add(padding)
        .min(MINUTES_PER_DAY);

    let min_range = config.min_range_minutes.min(MINUTES_PER_DAY);
    if end.saturating_sub(start) < min_range {
        end = start.saturating_add(min_range).min(MINUTES_PER_DAY);
        start = end.saturating_sub(min_range).min(start);
    }

    let span = i64::from(end - start);
    let timeline_height = minutes_to_pixels(span, config).max(config.min_timeline_height);
    let markers = build_markers(start, end, config);
    debug!(
        "event=range_compute tasks={} start={} end={} height={} markers={}",
        intervals.len(),
        start,
        end,
        timeline_height,
        markers.len()
    );

    Some(TimeRange {
        start_minutes: start,
        end_minutes: end,
        timeline_height,
        markers,
    })
}

fn build_markers(start: u32, end: u32, config: &LayoutConfig) -> Vec<Marker> {
    let first_hour = start / 60;
    let last_hour = end.div_ceil(60);
    let mut markers = Vec::new();
    for hour in first_hour..=last_hour {
        let minute = hour * 60;
        markers.push(marker(minute, start, false, config));
        let half = minute + 30;
        if config.half_hour_markers && hour < last_hour {
            markers.push(marker(half, start, true, config));
        }
    }
    markers
}

fn marker(minute: u32, window_start: u32, is_half_hour: bool, config: &LayoutConfig) -> Marker {
    Marker {
        minute,
        // 24:00 reads as midnight rather than clamping to 11:59 PM.
        label: format_display(i64::from(minute % MINUTES_PER_DAY), config.marker_style),
        is_half_hour,
        position: minutes_to_pixels(i64::from(minute) - i64::from(window_start), config),
    }
}

fn floor_hour(minutes: u32) -> u32 {
    minutes / 60 * 60
}

fn ceil_hour(minutes: u32) -> u32 {
    minutes.div_ceil(60).saturating_mul(60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::ClockStyle;
    use rstest::rstest;

    fn task(start: u32, duration: u32) -> Task {
        Task::new(format!("t{start}"), "task", start, duration, vec![])
    }

    #[test]
    fn empty_or_unscheduled_sets_have_no_range() {
        let config = LayoutConfig::default();
        assert_eq!(compute_range(&[], &config), None);
        let unscheduled = [Task::unscheduled("u", "later", vec![])];
        assert_eq!(compute_range(&unscheduled, &config), None);
    }

    #[test]
    fn single_morning_task_gets_padded_window() {
        let range = compute_range(&[task(540, 60)], &LayoutConfig::default()).unwrap();
        assert_eq!(range.start_minutes, 420);
        assert_eq!(range.end_minutes, 840);
        assert!(range.span_minutes() >= 240);
        // 7 hours at 30px/hour is below the 400px floor.
        assert_eq!(range.timeline_height, 400.0);
    }

    #[test]
    fn window_snaps_to_whole_hours() {
        let range = compute_range(&[task(545, 10), task(790, 25)], &LayoutConfig::default())
            .unwrap();
        assert_eq!(range.start_minutes, 420);
        assert_eq!(range.end_minutes, 960);
        assert_eq!(range.timeline_height, 400.0);

        let unfloored = LayoutConfig {
            min_timeline_height: 0.0,
            ..LayoutConfig::default()
        };
        let range = compute_range(&[task(545, 10), task(790, 25)], &unfloored).unwrap();
        assert_eq!(range.timeline_height, 270.0);
    }

    #[test]
    fn short_span_widens_to_minimum_end_first() {
        let config = LayoutConfig {
            padding_hours: 0,
            ..LayoutConfig::default()
        };
        let range = compute_range(&[task(540, 30)], &config).unwrap();
        assert_eq!((range.start_minutes, range.end_minutes), (540, 780));

        let range = compute_range(&[task(1400, 20)], &config).unwrap();
        assert_eq!((range.start_minutes, range.end_minutes), (1200, 1440));
        assert_eq!(range.span_minutes(), 240);
    }

    #[test]
    fn window_clamps_to_the_day() {
        let config = LayoutConfig::default();
        let range = compute_range(&[task(30, 30)], &config).unwrap();
        assert_eq!((range.start_minutes, range.end_minutes), (0, 240));

        let range = compute_range(&[task(1380, 180)], &config).unwrap();
        assert_eq!(range.end_minutes, 1440);
    }

    #[rstest]
    #[case(task(1380, u32::MAX), 1200, 1440)]
    #[case(task(0, u32::MAX - 10), 0, 1440)]
    #[case(task(1439, 1), 1200, 1440)]
    fn extreme_durations_clamp_to_the_day(
        #[case] extreme: Task,
        #[case] start: u32,
        #[case] end: u32,
    ) {
        let range = compute_range(&[extreme], &LayoutConfig::default()).unwrap();
        assert_eq!((range.start_minutes, range.end_minutes), (start, end));
        assert!(range.markers.iter().all(|m| m.minute <= MINUTES_PER_DAY));
    }

    #[test]
    fn start_past_midnight_is_left_out() {
        let config = LayoutConfig::default();
        assert_eq!(compute_range(&[task(2000, 30)], &config), None);
        let range = compute_range(&[task(2000, 30), task(540, 60)], &config).unwrap();
        assert_eq!((range.start_minutes, range.end_minutes), (420, 840));
    }

    #[test]
    fn oversized_padding_clamps_to_the_whole_day() {
        let config = LayoutConfig {
            padding_hours: 80_000_000,
            ..LayoutConfig::default()
        };
        let range = compute_range(&[task(540, 60)], &config).unwrap();
        assert_eq!((range.start_minutes, range.end_minutes), (0, 1440));
    }

    #[test]
    fn markers_cover_window_with_half_hours_between() {
        let range = compute_range(&[task(540, 60)], &LayoutConfig::default()).unwrap();
        let hours: Vec<u32> = range.hour_markers().map(|m| m.minute).collect();
        assert_eq!(hours, (7..=14).map(|h| h * 60).collect::<Vec<_>>());
        assert_eq!(range.markers.len(), 8 + 7);
        assert!(range.markers.windows(2).all(|w| w[0].minute < w[1].minute));

        let first = &range.markers[0];
        assert_eq!((first.label.as_str(), first.position), ("7:00 AM", 0.0));
        let half = &range.markers[1];
        assert!(half.is_half_hour);
        assert_eq!((half.minute, half.position), (450, 15.0));
        let last = range.markers.last().unwrap();
        assert_eq!((last.label.as_str(), last.position), ("2:00 PM", 210.0));
    }

    #[test]
    fn half_hour_markers_can_be_disabled() {
        let config = LayoutConfig {
            half_hour_markers: false,
            marker_style: ClockStyle::Hour24,
            ..LayoutConfig::default()
        };
        let range = compute_range(&[task(1320, 60)], &config).unwrap();
        assert!(range.markers.iter().all(|m| !m.is_half_hour));
        let labels: Vec<&str> = range.markers.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["20:00", "21:00", "22:00", "23:00", "00:00"]);
    }

    #[test]
    fn recomputation_is_deterministic() {
        let tasks = [task(600, 45), task(480, 90), task(900, 15)];
        let config = LayoutConfig::default();
        assert_eq!(compute_range(&tasks, &config), compute_range(&tasks, &config));
    }
}
