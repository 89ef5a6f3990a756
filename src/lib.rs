//! Daily planning core: clock-time codec, overlap validation and the
//! timeline layout engine, plus the stores and rule tables around them.

pub mod config;
pub mod interval;
pub mod layout;
pub mod logging;
pub mod model;
pub mod mood;
pub mod overlap;
pub mod range;
pub mod storage;
pub mod suggest;
pub mod time;
pub mod todo;

pub use config::{Config, LayoutConfig};
pub use interval::Interval;
pub use layout::{build_timeline, is_compact, position_of, BlockGeometry, LayoutBlock, Timeline};
pub use model::{RawDuration, Schedule, ScheduleError, Task, TaskId, TaskRecord};
pub use mood::{MoodEntry, MoodLevel};
pub use overlap::{check_overlap, OverlapCheck};
pub use range::{compute_range, Marker, TimeRange};
pub use suggest::{
    schedule_category, scheduled_minutes, suggest, ScheduleCategory, Suggestion, Suggestions,
};
pub use time::{format_display, parse_display_time, to_minutes, ClockStyle, Meridiem, TimeParseError};
pub use todo::{MemoryTodoRepository, TodoError, TodoItem, TodoList, TodoRepository};
