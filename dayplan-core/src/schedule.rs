//! Daily schedule engine: deadline-driven effort split + urgency ranking +
//! greedy capacity fill.
//!
//! Pure: the caller supplies the task snapshot (with any live timer already
//! folded into `time_worked`), the capacity, and today's local date.
//!
//! Ranking:
//! - urgency_score DESC
//! - days_from_view ASC (nearer deadline first when tied)
//! - input order

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::task::{Task, validate_capacity};
use crate::time::days_between;

/// Space left in the day below which no partial block is offered.
pub const MIN_PARTIAL_HOURS: f64 = 0.25;

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMode {
    Past,
    Today,
    Future,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Allocation {
    Full,
    /// Capacity boundary: only `hours` of the commitment fit today.
    Partial { hours: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task: Task,
    pub remaining_hours: f64,
    /// Days from the viewed date to the deadline, at least 1.
    pub days_from_view: i64,
    /// Days from today to the deadline, at least 1.
    pub total_days_window: i64,
    pub min_commitment_today: f64,
    pub urgency_score: f64,
    pub allocation: Allocation,
}

impl ScheduledTask {
    pub fn is_partial(&self) -> bool {
        matches!(self.allocation, Allocation::Partial { .. })
    }

    pub fn partial_hours(&self) -> Option<f64> {
        match self.allocation {
            Allocation::Partial { hours } => Some(hours),
            Allocation::Full => None,
        }
    }

    /// Hours this entry consumes from today's capacity.
    pub fn allocated_hours(&self) -> f64 {
        self.partial_hours().unwrap_or(self.min_commitment_today)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadLevel {
    Light,
    Heavy,
    Over,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduleMetrics {
    pub total_required_hours_today: f64,
    /// Percent of daily capacity.
    pub capacity_usage: f64,
    pub is_overloaded: bool,
}

impl ScheduleMetrics {
    pub fn load_level(&self) -> LoadLevel {
        if self.capacity_usage > 100.0 {
            LoadLevel::Over
        } else if self.capacity_usage > 80.0 {
            LoadLevel::Heavy
        } else {
            LoadLevel::Light
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub viewed_date: NaiveDate,
    pub view_mode: ViewMode,
    pub recommended_tasks: Vec<ScheduledTask>,
    pub metrics: ScheduleMetrics,
}

/// Build the plan for `viewed_date` (defaults to `today`).
pub fn calculate_daily_schedule(
    tasks: &[Task],
    daily_capacity: f64,
    viewed_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<ScheduleResult> {
    validate_capacity(daily_capacity)?;

    let viewed = viewed_date.unwrap_or(today);
    let view_mode = match viewed.cmp(&today) {
        std::cmp::Ordering::Greater => ViewMode::Future,
        std::cmp::Ordering::Equal => ViewMode::Today,
        std::cmp::Ordering::Less => ViewMode::Past,
    };

    let mut candidates: Vec<(usize, ScheduledTask)> = tasks
        .iter()
        .filter(|t| !t.completed)
        // expired relative to the viewed day
        .filter(|t| t.deadline >= viewed)
        .enumerate()
        .filter_map(|(i, t)| project(t, viewed, today, view_mode).map(|s| (i, s)))
        .collect();

    candidates.sort_by(|(ia, a), (ib, b)| {
        b.urgency_score
            .total_cmp(&a.urgency_score)
            .then_with(|| a.days_from_view.cmp(&b.days_from_view))
            .then_with(|| ia.cmp(ib))
    });

    let mut recommended = Vec::new();
    let mut allocated = 0.0_f64;

    for (_, mut st) in candidates {
        if allocated + st.min_commitment_today <= daily_capacity + EPS {
            allocated += st.min_commitment_today;
            recommended.push(st);
        } else {
            let space = daily_capacity - allocated;
            if space > MIN_PARTIAL_HOURS {
                st.allocation = Allocation::Partial { hours: space };
                recommended.push(st);
                allocated = daily_capacity;
                break;
            }
        }
        if allocated >= daily_capacity - EPS {
            break;
        }
    }

    tracing::debug!(
        %viewed,
        ?view_mode,
        considered = tasks.len(),
        recommended = recommended.len(),
        allocated,
        "daily schedule computed"
    );

    Ok(ScheduleResult {
        viewed_date: viewed,
        view_mode,
        recommended_tasks: recommended,
        metrics: ScheduleMetrics {
            total_required_hours_today: round_to(allocated, 2),
            capacity_usage: round_to(allocated / daily_capacity * 100.0, 1),
            is_overloaded: allocated > daily_capacity + EPS,
        },
    })
}

/// Effort split and urgency for one open, unexpired task.
/// Returns `None` when nothing is left to do.
fn project(
    task: &Task,
    viewed: NaiveDate,
    today: NaiveDate,
    mode: ViewMode,
) -> Option<ScheduledTask> {
    let remaining_hours = task.remaining_hours();

    // Due today or overdue collapses to one day: all remaining effort lands now.
    let total_days_window = days_between(today, task.deadline).max(1);
    let days_from_view = days_between(viewed, task.deadline).max(1);

    // Future days show the steady share computed from today, not a share that
    // relaxes as the viewed day approaches the deadline.
    let divisor = match mode {
        ViewMode::Future => total_days_window,
        ViewMode::Today | ViewMode::Past => days_from_view,
    };
    let min_commitment_today = round_to(remaining_hours / divisor as f64, 2);
    if min_commitment_today <= 0.0 {
        return None;
    }

    Some(ScheduledTask {
        task: task.clone(),
        remaining_hours,
        days_from_view,
        total_days_window,
        min_commitment_today,
        urgency_score: urgency_score(task.priority, days_from_view),
        allocation: Allocation::Full,
    })
}

pub fn urgency_score(priority: i32, days_from_view: i64) -> f64 {
    f64::from(priority) * 2.0 + 10.0 / (days_from_view as f64 + 0.1)
}

pub(crate) fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 19).unwrap()
    }

    fn task(id: &str, hours: f64, priority: i32, due_in: i64) -> Task {
        Task::new(id, id, hours, today() + Duration::days(due_in)).with_priority(priority)
    }

    #[test]
    fn test_empty_task_list() {
        let res = calculate_daily_schedule(&[], 8.0, None, today()).unwrap();
        assert!(res.recommended_tasks.is_empty());
        assert_eq!(res.metrics.total_required_hours_today, 0.0);
        assert_eq!(res.metrics.capacity_usage, 0.0);
        assert_eq!(res.view_mode, ViewMode::Today);
    }

    #[test]
    fn test_rejects_non_positive_capacity() {
        assert!(calculate_daily_schedule(&[], 0.0, None, today()).is_err());
        assert!(calculate_daily_schedule(&[], -2.0, None, today()).is_err());
    }

    #[test]
    fn test_commitment_spreads_over_days_left() {
        let res = calculate_daily_schedule(&[task("a", 9.0, 1, 3)], 8.0, None, today()).unwrap();
        let a = &res.recommended_tasks[0];
        assert_eq!(a.days_from_view, 3);
        assert_eq!(a.min_commitment_today, 3.0);
    }

    #[test]
    fn test_overdue_is_expired_and_due_today_gets_everything() {
        let tasks = vec![task("late", 2.0, 9, -1), task("now", 3.0, 1, 0)];
        let res = calculate_daily_schedule(&tasks, 8.0, None, today()).unwrap();
        assert_eq!(res.recommended_tasks.len(), 1);
        assert_eq!(res.recommended_tasks[0].task.id, "now");
        assert_eq!(res.recommended_tasks[0].min_commitment_today, 3.0);
    }

    #[test]
    fn test_worked_time_reduces_commitment_and_finished_tasks_drop() {
        let tasks = vec![
            task("half", 4.0, 1, 1).with_time_worked(1.0),
            task("done", 2.0, 1, 1).with_time_worked(2.0),
        ];
        let res = calculate_daily_schedule(&tasks, 8.0, None, today()).unwrap();
        assert_eq!(res.recommended_tasks.len(), 1);
        assert_eq!(res.recommended_tasks[0].remaining_hours, 3.0);
        assert_eq!(res.recommended_tasks[0].min_commitment_today, 3.0);
    }

    #[test]
    fn test_future_view_uses_steady_share_from_today() {
        let t = task("a", 10.0, 1, 5);
        let viewed = today() + Duration::days(3);
        let res = calculate_daily_schedule(&[t], 8.0, Some(viewed), today()).unwrap();
        let a = &res.recommended_tasks[0];
        assert_eq!(res.view_mode, ViewMode::Future);
        assert_eq!(a.total_days_window, 5);
        assert_eq!(a.days_from_view, 2);
        assert_eq!(a.min_commitment_today, 2.0);
        // urgency still reflects the viewed day
        assert_eq!(a.urgency_score, urgency_score(1, 2));
    }

    #[test]
    fn test_past_view_recomputes_from_that_day() {
        let t = task("a", 10.0, 1, 5);
        let viewed = today() - Duration::days(5);
        let res = calculate_daily_schedule(&[t], 8.0, Some(viewed), today()).unwrap();
        assert_eq!(res.view_mode, ViewMode::Past);
        assert_eq!(res.recommended_tasks[0].days_from_view, 10);
        assert_eq!(res.recommended_tasks[0].min_commitment_today, 1.0);
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let a = task("a", 1.0, 1, 4);
        let b = task("b", 1.0, 1, 4);
        let res = calculate_daily_schedule(&[a, b], 8.0, None, today()).unwrap();
        let ids: Vec<_> = res.recommended_tasks.iter().map(|s| s.task.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_partial_allocation_stops_scan() {
        let tasks = vec![
            task("big", 6.0, 5, 0),
            task("next", 4.0, 4, 0),
            task("tiny", 0.5, 1, 0),
        ];
        let res = calculate_daily_schedule(&tasks, 8.0, None, today()).unwrap();
        let ids: Vec<_> = res.recommended_tasks.iter().map(|s| s.task.id.as_str()).collect();
        assert_eq!(ids, vec!["big", "next"]);
        assert_eq!(res.recommended_tasks[1].partial_hours(), Some(2.0));
        assert_eq!(res.metrics.total_required_hours_today, 8.0);
        assert_eq!(res.metrics.capacity_usage, 100.0);
        assert!(!res.metrics.is_overloaded);
    }

    #[test]
    fn test_sliver_of_capacity_skips_partial_but_keeps_scanning() {
        let tasks = vec![
            task("a", 7.8, 5, 0),
            task("b", 3.0, 4, 0),
            task("c", 0.2, 1, 0),
        ];
        let res = calculate_daily_schedule(&tasks, 8.0, None, today()).unwrap();
        let ids: Vec<_> = res.recommended_tasks.iter().map(|s| s.task.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(res.recommended_tasks.iter().all(|s| !s.is_partial()));
        assert_eq!(res.metrics.total_required_hours_today, 8.0);
    }

    #[test]
    fn test_exactly_quarter_hour_left_is_not_a_partial() {
        let tasks = vec![
            task("a", 7.75, 5, 0),
            task("b", 1.0, 4, 0),
            task("c", 0.25, 1, 0),
        ];
        let res = calculate_daily_schedule(&tasks, 8.0, None, today()).unwrap();
        let ids: Vec<_> = res.recommended_tasks.iter().map(|s| s.task.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(res.recommended_tasks.iter().all(|s| !s.is_partial()));

        let res = calculate_daily_schedule(&tasks[..2], 8.0, None, today()).unwrap();
        assert_eq!(res.recommended_tasks.len(), 1);
        assert_eq!(res.metrics.total_required_hours_today, 7.75);
    }

    #[test]
    fn test_exact_fill_stops() {
        let tasks = vec![task("a", 8.0, 5, 0), task("b", 0.5, 1, 0)];
        let res = calculate_daily_schedule(&tasks, 8.0, None, today()).unwrap();
        assert_eq!(res.recommended_tasks.len(), 1);
        assert!(!res.recommended_tasks[0].is_partial());
    }

    #[test]
    fn test_load_level() {
        let m = |u| ScheduleMetrics {
            total_required_hours_today: 0.0,
            capacity_usage: u,
            is_overloaded: u > 100.0,
        };
        assert_eq!(m(50.0).load_level(), LoadLevel::Light);
        assert_eq!(m(90.0).load_level(), LoadLevel::Heavy);
        assert_eq!(m(100.0).load_level(), LoadLevel::Heavy);
        assert_eq!(m(120.0).load_level(), LoadLevel::Over);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(3.14159, 2), 3.14);
        assert_eq!(round_to(66.666, 1), 66.7);
    }
}
