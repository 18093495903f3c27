//! taskwise-core: quick-add parsing and day scheduling for personal tasks

pub mod parser;
pub mod rules;
pub mod schedule;
pub mod task;
pub mod time;

pub use parser::{
    parse_task, Confidence, ConfidenceLevel, DraftField, ParsedTaskDraft, TaskParser,
};
pub use schedule::{
    apply_schedule, build_schedule, Schedulable, ScheduleBlock, WorkWindow, BUFFER_MINUTES,
    DEFAULT_DURATION_MINUTES, MAX_SCHEDULED_TASKS,
};
pub use task::{Category, EnergyLevel, Priority, Recurrence, Subtask, Task, TaskStatus};
pub use time::{
    next_weekday, parse_meridiem_time, today_in_tz, weekday_from_name, ClockTime, DateProvider,
    FixedDate, SystemDate,
};
