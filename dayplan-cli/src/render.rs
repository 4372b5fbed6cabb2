//! Plain-text rendering of a day's plan.

use chrono::NaiveDate;
use dayplan_core::{LoadLevel, ScheduleResult, ScheduledTask, Task, ViewMode};

/// Commitments above this many hours are flagged as heavy focus.
const HEAVY_FOCUS_HOURS: f64 = 3.0;

pub fn list_title(plan: &ScheduleResult) -> String {
    match plan.view_mode {
        ViewMode::Today => "Recommended for Today".to_string(),
        _ => format!("Projected for {}", plan.viewed_date.format("%b %-d")),
    }
}

pub fn status_message(plan: &ScheduleResult, capacity: f64) -> String {
    if plan.metrics.total_required_hours_today > capacity {
        return "Warning: Over capacity for this day.".to_string();
    }
    let day = match plan.view_mode {
        ViewMode::Today => "Today".to_string(),
        _ => plan.viewed_date.format("%Y-%m-%d").to_string(),
    };
    format!("Schedule optimized for {day}.")
}

/// `"<hours> / <capacity> hrs"` plus a 20-cell load bar.
pub fn burn_rate(plan: &ScheduleResult, capacity: f64) -> String {
    let pct = plan.metrics.capacity_usage.clamp(0.0, 100.0);
    let filled = (pct / 5.0).round() as usize;
    let marker = match plan.metrics.load_level() {
        LoadLevel::Light => "",
        LoadLevel::Heavy => " (heavy)",
        LoadLevel::Over => " (over)",
    };
    format!(
        "{} / {} hrs [{}{}] {:.1}%{}",
        plan.metrics.total_required_hours_today,
        capacity,
        "#".repeat(filled),
        ".".repeat(20 - filled),
        plan.metrics.capacity_usage,
        marker
    )
}

pub fn task_line(i: usize, s: &ScheduledTask) -> String {
    let focus = match s.partial_hours() {
        Some(h) => format!("{h:.2}h today (partial of {}h)", s.min_commitment_today),
        None => format!("{}h today", s.min_commitment_today),
    };
    let flag = if s.min_commitment_today > HEAVY_FOCUS_HOURS { "!" } else { " " };
    let timer = if s.task.is_tracking { " [tracking]" } else { "" };
    format!(
        "{flag}{}. {} | focus {} | due {} | p{} | score {:.2}{timer}\n     id: {}",
        i + 1,
        s.task.title,
        focus,
        s.task.deadline.format("%Y-%m-%d"),
        s.task.priority,
        s.urgency_score,
        s.task.id
    )
}

pub fn render_plan(plan: &ScheduleResult, capacity: f64) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {}\n\n", list_title(plan)));
    out.push_str(&burn_rate(plan, capacity));
    out.push('\n');
    out.push_str(&status_message(plan, capacity));
    out.push_str("\n\n");

    if plan.recommended_tasks.is_empty() {
        out.push_str("Your schedule is clear. Add a task to optimize your day.\n");
        return out;
    }
    for (i, s) in plan.recommended_tasks.iter().enumerate() {
        out.push_str(&task_line(i, s));
        out.push('\n');
    }
    out
}

pub fn render_task_list(tasks: &[Task], today: NaiveDate) -> String {
    if tasks.is_empty() {
        return "No tasks yet. Add one with: dayplan add\n".to_string();
    }
    let mut out = String::new();
    for t in tasks {
        let mark = if t.completed { "x" } else { " " };
        let overdue = if !t.completed && t.deadline < today { " (expired)" } else { "" };
        let timer = if t.is_tracking { " [tracking]" } else { "" };
        out.push_str(&format!(
            "[{mark}] {} | {:.2}/{}h | p{} | due {}{overdue}{timer}\n    id: {}\n",
            t.title,
            t.time_worked,
            t.estimated_hours,
            t.priority,
            t.deadline.format("%Y-%m-%d"),
            t.id
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use dayplan_core::calculate_daily_schedule;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 19).unwrap()
    }

    #[test]
    fn test_empty_plan_shows_clear_schedule() {
        let plan = calculate_daily_schedule(&[], 8.0, None, today()).unwrap();
        let text = render_plan(&plan, 8.0);
        assert!(text.contains("Recommended for Today"));
        assert!(text.contains("0 / 8 hrs"));
        assert!(text.contains("Schedule optimized for Today."));
        assert!(text.contains("Your schedule is clear."));
    }

    #[test]
    fn test_future_plan_title_and_partial_line() {
        let t = Task::new("1", "Thesis", 40.0, NaiveDate::from_ymd_opt(2026, 2, 22).unwrap());
        let viewed = NaiveDate::from_ymd_opt(2026, 2, 20).unwrap();
        let plan = calculate_daily_schedule(&[t], 8.0, Some(viewed), today()).unwrap();
        let text = render_plan(&plan, 8.0);
        assert!(text.contains("Projected for Feb 20"));
        assert!(text.contains("partial of 13.33h"));
        assert!(text.contains("(heavy)"));
        assert!(text.starts_with("# "));
    }

    #[test]
    fn test_task_list_marks_state() {
        let mut done = Task::new("1", "Done", 1.0, today()).with_completed(true);
        done.time_worked = 1.0;
        let late = Task::new("2", "Late", 2.0, today() - chrono::Duration::days(1));
        let text = render_task_list(&[done, late], today());
        assert!(text.contains("[x] Done"));
        assert!(text.contains("(expired)"));
    }
}
