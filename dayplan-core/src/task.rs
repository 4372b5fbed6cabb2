//! Task + settings model shared by the scheduling engine and the tracking model.
//!
//! Field names serialize in camelCase so stored JSON keeps the keys the store
//! has always used (`estimatedHours`, `timeWorked`, `timerStartedAt`, ...).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

pub const DEFAULT_DAILY_CAPACITY: f64 = 8.0;

/// Core task type.
///
/// Effort, priority and deadline are fixed at creation; the tracking fields
/// are only mutated through `crate::tracking`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,

    /// Total effort required, in hours.
    pub estimated_hours: f64,

    /// Higher = more important. Unbounded, compared ordinally.
    pub priority: i32,

    /// Local calendar date. Time-of-day never participates in scheduling.
    pub deadline: NaiveDate,

    #[serde(default)]
    pub completed: bool,

    /// Hours logged so far (persisted; only grows).
    #[serde(default)]
    pub time_worked: f64,

    #[serde(default)]
    pub is_tracking: bool,

    #[serde(default)]
    pub timer_started_at: Option<DateTime<Utc>>,

    /// Baseline for the running session; equals `time_worked` when idle.
    #[serde(default)]
    pub accumulated_time: f64,
}

/// Where a task's timer currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Idle,
    Tracking { started_at: DateTime<Utc> },
}

impl Task {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        estimated_hours: f64,
        deadline: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            estimated_hours,
            priority: 1,
            deadline,
            completed: false,
            time_worked: 0.0,
            is_tracking: false,
            timer_started_at: None,
            accumulated_time: 0.0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_time_worked(mut self, hours: f64) -> Self {
        self.time_worked = hours;
        self.accumulated_time = hours;
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// A running timer without a start timestamp is treated as idle.
    pub fn tracking_state(&self) -> TrackingState {
        match (self.is_tracking, self.timer_started_at) {
            (true, Some(started_at)) => TrackingState::Tracking { started_at },
            _ => TrackingState::Idle,
        }
    }

    pub fn remaining_hours(&self) -> f64 {
        (self.estimated_hours - self.time_worked).max(0.0)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.estimated_hours.is_finite() || self.estimated_hours <= 0.0 {
            return Err(PlanError::InvalidHours(self.estimated_hours));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub daily_capacity: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_capacity: DEFAULT_DAILY_CAPACITY,
        }
    }
}

impl Settings {
    pub fn new(daily_capacity: f64) -> Result<Self> {
        let s = Self { daily_capacity };
        s.validate()?;
        Ok(s)
    }

    pub fn validate(&self) -> Result<()> {
        validate_capacity(self.daily_capacity)
    }
}

pub(crate) fn validate_capacity(capacity: f64) -> Result<()> {
    if !capacity.is_finite() || capacity <= 0.0 {
        return Err(PlanError::InvalidCapacity(capacity));
    }
    Ok(())
}
