use crate::time::MINUTES_PER_DAY;

/// Half-open span `[start, start + duration)` in minutes since midnight.
///
/// The end is not wrapped at midnight, so a late task may end past 1440.
/// Durations are capped at one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    start: u32,
    duration: u32,
}

impl Interval {
    /// Returns `None` for a zero-length duration or a start outside the day;
    /// such a task is unscheduled.
    pub fn new(start: u32, duration: u32) -> Option<Self> {
        if duration == 0 || start >= MINUTES_PER_DAY {
            return None;
        }
        Some(Interval {
            start,
            duration: duration.min(MINUTES_PER_DAY),
        })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.duration)
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    pub fn contains(&self, minute: u32) -> bool {
        self.start <= minute && minute < self.end()
    }

    pub fn spills_past_midnight(&self) -> bool {
        self.end() > MINUTES_PER_DAY
    }
}
