//! Smart day schedule: greedy packing of pending tasks into one work window.
//!
//! Tasks are ordered by priority, then energy (deep work first), capped, and laid end to end
//! from the start of the window with a fixed buffer between blocks. The first task that
//! would run past the window ends the plan; nothing wraps to the next day.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::task::{EnergyLevel, Priority, Task};
use crate::time::{ClockTime, MINUTES_PER_DAY};

/// At most this many tasks are considered for one day.
pub const MAX_SCHEDULED_TASKS: usize = 8;
/// Gap left after every block.
pub const BUFFER_MINUTES: u32 = 10;
/// Used when a task has no estimate.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Energy rank for tasks that don't say.
const DEFAULT_ENERGY: EnergyLevel = EnergyLevel::Light;

/// Working hours, whole hours since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for WorkWindow {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 18,
        }
    }
}

impl WorkWindow {
    pub fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    fn start_minutes(&self) -> u32 {
        self.start_hour.saturating_mul(60)
    }

    /// Clamped to midnight so blocks stay on one calendar day.
    fn end_minutes(&self) -> u32 {
        self.end_hour.saturating_mul(60).min(MINUTES_PER_DAY)
    }
}

/// What the scheduler needs to know about a task.
pub trait Schedulable {
    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn is_completed(&self) -> bool;
    fn has_due_date(&self) -> bool;
    fn priority(&self) -> Priority;
    fn energy_level(&self) -> Option<EnergyLevel>;
    /// Minutes.
    fn estimated_duration(&self) -> Option<u32>;
}

impl Schedulable for Task {
    fn id(&self) -> &str {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn is_completed(&self) -> bool {
        self.is_completed
    }

    fn has_due_date(&self) -> bool {
        self.due_date.is_some()
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn energy_level(&self) -> Option<EnergyLevel> {
        self.energy_level
    }

    fn estimated_duration(&self) -> Option<u32> {
        self.estimated_duration
    }
}

/// One slot of the day plan. Title, priority and energy are copied at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleBlock {
    pub task_id: String,
    pub title: String,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_level: Option<EnergyLevel>,
}

impl ScheduleBlock {
    pub fn duration_minutes(&self) -> u32 {
        self.end_time.minutes().saturating_sub(self.start_time.minutes())
    }
}

/// Build today's plan. An empty result means nothing qualified or nothing fit.
pub fn build_schedule<T: Schedulable>(tasks: &[T], window: WorkWindow) -> Vec<ScheduleBlock> {
    let mut pending: Vec<&T> = tasks
        .iter()
        .filter(|t| !t.is_completed() && t.has_due_date())
        .collect();

    // Stable: equal keys keep input order.
    pending.sort_by_key(|t| (t.priority(), t.energy_level().unwrap_or(DEFAULT_ENERGY)));

    if pending.len() > MAX_SCHEDULED_TASKS {
        debug!(
            skipped = pending.len() - MAX_SCHEDULED_TASKS,
            "task cap reached; lowest-ranked tasks left out"
        );
        pending.truncate(MAX_SCHEDULED_TASKS);
    }

    let end_of_day = window.end_minutes();
    let mut cursor = window.start_minutes();
    let mut blocks = Vec::with_capacity(pending.len());

    for task in pending {
        let duration = task.estimated_duration().unwrap_or(DEFAULT_DURATION_MINUTES);
        let block_end = cursor.saturating_add(duration);
        if block_end > end_of_day {
            debug!(task_id = task.id(), cursor, duration, "work window full; stopping");
            break;
        }

        let (Some(start_time), Some(end_time)) =
            (ClockTime::from_minutes(cursor), ClockTime::from_minutes(block_end))
        else {
            break;
        };

        blocks.push(ScheduleBlock {
            task_id: task.id().to_string(),
            title: task.title().to_string(),
            start_time,
            end_time,
            priority: task.priority(),
            energy_level: task.energy_level(),
        });

        cursor = block_end.saturating_add(BUFFER_MINUTES);
    }

    blocks
}

/// Record each block's start on its task. Returns how many tasks were updated.
pub fn apply_schedule(tasks: &mut [Task], blocks: &[ScheduleBlock]) -> usize {
    let mut updated = 0;
    for block in blocks {
        if let Some(task) = tasks.iter_mut().find(|t| t.id == block.task_id) {
            task.time_block_start = Some(block.start_time);
            updated += 1;
        }
    }
    updated
}
