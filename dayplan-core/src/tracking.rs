//! Time tracking: per-task timer state machine over the whole task set.
//!
//! ```text
//! Idle --start--> Tracking --stop--> Idle
//! ```
//!
//! At most one task tracks at a time. `start_timer` enforces this by scanning
//! the set and stopping any other running timer first; there is no separate
//! "current task" pointer to drift out of sync with the per-task flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};
use crate::task::{Task, TrackingState};
use crate::time::elapsed_hours;

/// What happens to a running session when its task is completed or deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InFlightPolicy {
    /// Drop the uncommitted session time.
    #[default]
    Discard,
    /// Stop the timer and credit the session before completing/deleting.
    Credit,
}

/// Result of stopping a timer.
#[derive(Debug, Clone, PartialEq)]
pub struct StoppedSession {
    pub task_id: String,
    pub elapsed_hours: f64,
    pub time_worked: f64,
}

fn find_mut<'a>(tasks: &'a mut [Task], id: &str) -> Result<&'a mut Task> {
    tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| PlanError::TaskNotFound(id.to_string()))
}

/// Start `id`'s timer, stopping (and crediting) any other running timer.
///
/// Returns the session that was force-stopped, if any.
pub fn start_timer(
    tasks: &mut [Task],
    id: &str,
    now: DateTime<Utc>,
) -> Result<Option<StoppedSession>> {
    let target = tasks
        .iter()
        .find(|t| t.id == id)
        .ok_or_else(|| PlanError::TaskNotFound(id.to_string()))?;
    if target.is_tracking {
        return Err(PlanError::AlreadyTracking(id.to_string()));
    }
    if target.completed {
        return Err(PlanError::TaskCompleted(id.to_string()));
    }

    let mut stopped = None;
    for other in tasks.iter_mut().filter(|t| t.is_tracking && t.id != id) {
        let session = stop(other, now);
        tracing::debug!(
            task_id = %session.task_id,
            elapsed_hours = session.elapsed_hours,
            "stopped running timer before starting another"
        );
        stopped = Some(session);
    }

    let task = find_mut(tasks, id)?;
    task.accumulated_time = task.time_worked;
    task.timer_started_at = Some(now);
    task.is_tracking = true;

    Ok(stopped)
}

pub fn stop_timer(tasks: &mut [Task], id: &str, now: DateTime<Utc>) -> Result<StoppedSession> {
    let task = find_mut(tasks, id)?;
    if !task.is_tracking {
        return Err(PlanError::NotTracking(id.to_string()));
    }
    Ok(stop(task, now))
}

fn stop(task: &mut Task, now: DateTime<Utc>) -> StoppedSession {
    let elapsed = match task.tracking_state() {
        TrackingState::Tracking { started_at } => elapsed_hours(started_at, now),
        TrackingState::Idle => 0.0,
    };
    task.time_worked = session_baseline(task) + elapsed;
    task.accumulated_time = task.time_worked;
    task.timer_started_at = None;
    task.is_tracking = false;

    StoppedSession {
        task_id: task.id.clone(),
        elapsed_hours: elapsed,
        time_worked: task.time_worked,
    }
}

/// Hours committed before the running session. A record stored without
/// `accumulatedTime` deserializes it as 0, so never fall below `time_worked`.
fn session_baseline(task: &Task) -> f64 {
    task.accumulated_time.max(task.time_worked)
}

/// Log hours by hand. Works whether or not the timer is running.
pub fn add_manual_time(tasks: &mut [Task], id: &str, hours: f64) -> Result<f64> {
    if !hours.is_finite() || hours <= 0.0 {
        return Err(PlanError::InvalidHours(hours));
    }
    let task = find_mut(tasks, id)?;
    task.time_worked += hours;
    task.accumulated_time += hours;
    Ok(task.time_worked)
}

/// Drop to Idle before the task leaves the schedule.
fn settle_for_removal(task: &mut Task, now: DateTime<Utc>, policy: InFlightPolicy) {
    if !task.is_tracking {
        return;
    }
    match policy {
        InFlightPolicy::Credit => {
            stop(task, now);
        }
        InFlightPolicy::Discard => {
            tracing::debug!(task_id = %task.id, "discarding running session");
            task.accumulated_time = task.time_worked;
            task.timer_started_at = None;
            task.is_tracking = false;
        }
    }
}

/// Mark a task completed.
pub fn complete_task(
    tasks: &mut [Task],
    id: &str,
    now: DateTime<Utc>,
    policy: InFlightPolicy,
) -> Result<()> {
    let task = find_mut(tasks, id)?;
    settle_for_removal(task, now, policy);
    task.completed = true;
    Ok(())
}

/// Flip completion. Re-opening a task only clears the flag.
///
/// Returns the new `completed` value.
pub fn toggle_complete(
    tasks: &mut [Task],
    id: &str,
    now: DateTime<Utc>,
    policy: InFlightPolicy,
) -> Result<bool> {
    let task = find_mut(tasks, id)?;
    if task.completed {
        task.completed = false;
    } else {
        settle_for_removal(task, now, policy);
        task.completed = true;
    }
    Ok(task.completed)
}

pub fn delete_task(
    tasks: &mut Vec<Task>,
    id: &str,
    now: DateTime<Utc>,
    policy: InFlightPolicy,
) -> Result<Task> {
    let idx = tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| PlanError::TaskNotFound(id.to_string()))?;
    let mut task = tasks.remove(idx);
    settle_for_removal(&mut task, now, policy);
    Ok(task)
}

/// Hours worked including the still-running session. Does not mutate.
pub fn live_time_worked(task: &Task, now: DateTime<Utc>) -> f64 {
    match task.tracking_state() {
        TrackingState::Tracking { started_at } => {
            session_baseline(task) + elapsed_hours(started_at, now)
        }
        TrackingState::Idle => task.time_worked,
    }
}

/// Copy of `tasks` with live session time folded into `time_worked`,
/// ready to feed the schedule engine.
pub fn live_snapshot(tasks: &[Task], now: DateTime<Utc>) -> Vec<Task> {
    tasks
        .iter()
        .map(|t| {
            let mut live = t.clone();
            live.time_worked = live_time_worked(t, now);
            live
        })
        .collect()
}
