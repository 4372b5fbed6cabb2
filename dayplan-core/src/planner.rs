//! Planner: the caller-side loop around the engine.
//!
//! Every mutation is a read-modify-write against the store, and every plan is
//! recomputed from scratch (store -> live snapshot -> engine). Nothing is
//! patched incrementally, so a periodic refresh has no ordering hazards.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::schedule::{ScheduleResult, calculate_daily_schedule};
use crate::store::TaskStore;
use crate::task::{Settings, Task};
use crate::time::{Clock, local_today, parse_local_date};
use crate::tracking::{self, InFlightPolicy, StoppedSession, live_snapshot};

/// Form input for a new task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub estimated_hours: f64,
    pub priority: i32,
    /// Local calendar date, `YYYY-MM-DD`.
    pub deadline: String,
}

#[derive(Debug)]
pub struct Planner<S: TaskStore, C: Clock> {
    store: S,
    clock: C,
    tz: Tz,
    policy: InFlightPolicy,
}

impl<S: TaskStore, C: Clock> Planner<S, C> {
    pub fn new(store: S, clock: C, tz: Tz) -> Self {
        Self {
            store,
            clock,
            tz,
            policy: InFlightPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: InFlightPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        local_today(self.clock.now(), self.tz)
    }

    pub fn tasks(&self) -> Result<Vec<Task>> {
        self.store.get_tasks()
    }

    pub fn settings(&self) -> Result<Settings> {
        self.store.get_settings()
    }

    pub fn add_task(&self, input: NewTask) -> Result<Task> {
        let deadline = parse_local_date(&input.deadline)?;
        let task = Task::new(
            uuid::Uuid::new_v4().to_string(),
            input.title.trim(),
            input.estimated_hours,
            deadline,
        )
        .with_priority(input.priority);
        task.validate()?;

        let mut tasks = self.store.get_tasks()?;
        tasks.push(task.clone());
        self.store.save_tasks(&tasks).context("save tasks")?;
        tracing::info!(task_id = %task.id, title = %task.title, "task added");
        Ok(task)
    }

    /// Returns the new `completed` value.
    pub fn toggle_complete(&self, id: &str) -> Result<bool> {
        self.mutate(|tasks, planner| {
            Ok(tracking::toggle_complete(tasks, id, planner.clock.now(), planner.policy)?)
        })
    }

    pub fn delete_task(&self, id: &str) -> Result<Task> {
        self.mutate(|tasks, planner| {
            Ok(tracking::delete_task(tasks, id, planner.clock.now(), planner.policy)?)
        })
    }

    pub fn start_timer(&self, id: &str) -> Result<Option<StoppedSession>> {
        let stopped = self.mutate(|tasks, planner| {
            Ok(tracking::start_timer(tasks, id, planner.clock.now())?)
        })?;
        tracing::info!(task_id = id, "timer started");
        Ok(stopped)
    }

    pub fn stop_timer(&self, id: &str) -> Result<StoppedSession> {
        let session = self.mutate(|tasks, planner| {
            Ok(tracking::stop_timer(tasks, id, planner.clock.now())?)
        })?;
        tracing::info!(
            task_id = id,
            elapsed_hours = session.elapsed_hours,
            "timer stopped"
        );
        Ok(session)
    }

    /// Returns the task's new `time_worked`.
    pub fn log_time(&self, id: &str, hours: f64) -> Result<f64> {
        self.mutate(|tasks, _| Ok(tracking::add_manual_time(tasks, id, hours)?))
    }

    pub fn set_capacity(&self, hours: f64) -> Result<Settings> {
        let settings = Settings::new(hours)?;
        self.store.save_settings(&settings).context("save settings")?;
        Ok(settings)
    }

    /// The task whose timer is running, if any.
    pub fn active_task(&self) -> Result<Option<Task>> {
        Ok(self.store.get_tasks()?.into_iter().find(|t| t.is_tracking))
    }

    /// Plan for `viewed` (today when `None`), folding in live session time.
    pub fn plan(&self, viewed: Option<NaiveDate>) -> Result<ScheduleResult> {
        let now = self.clock.now();
        let tasks = self.store.get_tasks()?;
        let settings = self.store.get_settings()?;
        let live = live_snapshot(&tasks, now);
        Ok(calculate_daily_schedule(
            &live,
            settings.daily_capacity,
            viewed,
            local_today(now, self.tz),
        )?)
    }

    /// Periodic tick: a fresh plan while a timer runs, `None` otherwise.
    pub fn refresh(&self, viewed: Option<NaiveDate>) -> Result<Option<ScheduleResult>> {
        if self.active_task()?.is_none() {
            return Ok(None);
        }
        self.plan(viewed).map(Some)
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut Vec<Task>, &Self) -> Result<T>) -> Result<T> {
        let mut tasks = self.store.get_tasks()?;
        let out = f(&mut tasks, self)?;
        self.store.save_tasks(&tasks).context("save tasks")?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::time::FixedClock;
    use chrono::{Duration, TimeZone, Utc};

    fn planner(clock: &FixedClock) -> Planner<MemoryStore, &FixedClock> {
        Planner::new(MemoryStore::new(), clock, chrono_tz::UTC)
    }

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2026, 2, 19, 9, 0, 0).unwrap())
    }

    fn new_task(title: &str, hours: f64, deadline: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            estimated_hours: hours,
            priority: 1,
            deadline: deadline.to_string(),
        }
    }

    #[test]
    fn test_add_task_persists_with_zeroed_tracking() {
        let c = clock();
        let p = planner(&c);
        let t = p.add_task(new_task("  Essay ", 4.0, "2026-02-21")).unwrap();
        assert_eq!(t.title, "Essay");
        assert!(!t.is_tracking);
        assert_eq!(p.tasks().unwrap().len(), 1);
    }

    #[test]
    fn test_add_task_rejects_bad_input() {
        let c = clock();
        let p = planner(&c);
        assert!(p.add_task(new_task("x", 0.0, "2026-02-21")).is_err());
        assert!(p.add_task(new_task("x", 1.0, "21/02/2026")).is_err());
        assert!(p.tasks().unwrap().is_empty());
    }

    #[test]
    fn test_plan_folds_in_running_timer() {
        let c = clock();
        let p = planner(&c);
        let t = p.add_task(new_task("Essay", 4.0, "2026-02-19")).unwrap();
        p.start_timer(&t.id).unwrap();
        c.advance(Duration::hours(1));

        let plan = p.plan(None).unwrap();
        assert_eq!(plan.recommended_tasks[0].min_commitment_today, 3.0);
        // persisted value only changes on stop
        assert_eq!(p.tasks().unwrap()[0].time_worked, 0.0);

        p.stop_timer(&t.id).unwrap();
        assert!((p.tasks().unwrap()[0].time_worked - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_refresh_is_noop_without_timer() {
        let c = clock();
        let p = planner(&c);
        let t = p.add_task(new_task("Essay", 4.0, "2026-02-20")).unwrap();
        assert!(p.refresh(None).unwrap().is_none());
        p.start_timer(&t.id).unwrap();
        assert!(p.refresh(None).unwrap().is_some());
    }

    #[test]
    fn test_set_capacity_validates() {
        let c = clock();
        let p = planner(&c);
        assert!(p.set_capacity(0.0).is_err());
        assert_eq!(p.settings().unwrap().daily_capacity, 8.0);
        p.set_capacity(6.0).unwrap();
        assert_eq!(p.settings().unwrap().daily_capacity, 6.0);
    }

    #[test]
    fn test_today_follows_timezone() {
        let c = FixedClock::new(Utc.with_ymd_and_hms(2026, 2, 20, 3, 0, 0).unwrap());
        let chicago: Tz = "America/Chicago".parse().unwrap();
        let p = Planner::new(MemoryStore::new(), &c, chicago);
        assert_eq!(p.today(), NaiveDate::from_ymd_opt(2026, 2, 19).unwrap());
    }

    #[test]
    fn test_credit_policy_on_delete() {
        let c = clock();
        let p = planner(&c).with_policy(InFlightPolicy::Credit);
        let t = p.add_task(new_task("Essay", 4.0, "2026-02-20")).unwrap();
        p.start_timer(&t.id).unwrap();
        c.advance(Duration::minutes(30));
        let removed = p.delete_task(&t.id).unwrap();
        assert!((removed.time_worked - 0.5).abs() < 1e-9);
        assert!(p.tasks().unwrap().is_empty());
    }
}
