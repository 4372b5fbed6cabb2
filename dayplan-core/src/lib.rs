//! dayplan-core: daily workload planning engine + time tracking.

pub mod error;
pub mod planner;
pub mod schedule;
pub mod store;
pub mod task;
pub mod time;
pub mod tracking;

pub use error::{PlanError, Result};
pub use planner::{NewTask, Planner};
pub use schedule::{
    Allocation, LoadLevel, MIN_PARTIAL_HOURS, ScheduleMetrics, ScheduleResult, ScheduledTask,
    ViewMode, calculate_daily_schedule, urgency_score,
};
pub use store::{MemoryStore, TaskStore};
pub use task::{DEFAULT_DAILY_CAPACITY, Settings, Task, TrackingState};
pub use time::{
    Clock, FixedClock, SystemClock, days_between, elapsed_hours, local_today, parse_local_date,
    parse_timezone,
};
pub use tracking::{
    InFlightPolicy, StoppedSession, add_manual_time, complete_task, delete_task,
    live_snapshot, live_time_worked, start_timer, stop_timer, toggle_complete,
};
