//! Completion history and streaks.
//!
//! A day shows up in the history only if at least one active task existed on
//! it. A task exists on every calendar day from the day it was created on,
//! whatever the time of creation. A day counts as completed when every task
//! that existed on it has a completion recorded for that date.

use std::collections::HashSet;

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use rusqlite::Connection;

use crate::model::{DaySummary, DayTask, Task};
use crate::ops::{read_task_row, TASK_COLUMNS};
use crate::validate::validate_window;

fn active_tasks_oldest_first(conn: &Connection) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE active = 1 ORDER BY created_at, id"
    ))?;
    let rows = stmt.query_map([], read_task_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Into::into)
}

fn completions_between(
    conn: &Connection,
    first: NaiveDate,
    last: NaiveDate,
) -> Result<HashSet<(i64, NaiveDate)>> {
    let mut stmt = conn.prepare_cached(
        "SELECT task_id, completion_date FROM task_completions
         WHERE completion_date BETWEEN ?1 AND ?2",
    )?;
    let rows = stmt.query_map(rusqlite::params![first, last], |row| {
        Ok((row.get(0)?, row.get(1)?))
    })?;
    rows.collect::<rusqlite::Result<HashSet<_>>>()
        .map_err(Into::into)
}

/// Per-day summaries for the `days` days ending at `today`, oldest first.
pub fn history(conn: &Connection, today: NaiveDate, days: u32) -> Result<Vec<DaySummary>> {
    let days = validate_window(days)?;
    let first = today - Duration::days(i64::from(days - 1));
    let tasks = active_tasks_oldest_first(conn)?;
    let done = completions_between(conn, first, today)?;

    let mut summaries = Vec::new();
    for offset in (0..days).rev() {
        let date = today - Duration::days(i64::from(offset));
        let day_tasks: Vec<DayTask> = tasks
            .iter()
            .filter(|task| task.created_on() <= date)
            .map(|task| DayTask {
                title: task.title.clone(),
                completed: done.contains(&(task.id, date)),
            })
            .collect();
        if day_tasks.is_empty() {
            continue;
        }
        summaries.push(DaySummary {
            date,
            completed: day_tasks.iter().all(|t| t.completed),
            total_tasks: day_tasks.len(),
            tasks: day_tasks,
        });
    }
    Ok(summaries)
}

/// Count consecutive days ending at `today` from dates sorted newest first.
/// An unfinished `today` does not break the run; counting starts at yesterday.
fn streak_ending(done_days: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u32 {
    let mut days = done_days.into_iter().skip_while(|d| *d > today).peekable();
    let mut expected = if days.peek() == Some(&today) {
        today
    } else {
        today - Duration::days(1)
    };
    let mut streak = 0;
    for day in days {
        if day != expected {
            break;
        }
        streak += 1;
        expected = expected - Duration::days(1);
    }
    streak
}

/// Current run of consecutive completed days for one task.
pub fn current_streak(conn: &Connection, task_id: i64, today: NaiveDate) -> Result<u32> {
    let mut stmt = conn.prepare_cached(
        "SELECT completion_date FROM task_completions
         WHERE task_id = ?1 AND completion_date <= ?2
         ORDER BY completion_date DESC",
    )?;
    let dates = stmt
        .query_map(rusqlite::params![task_id, today], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<NaiveDate>>>()?;
    Ok(streak_ending(dates, today))
}

/// Trailing run of fully completed days in a history report.
pub fn window_streak(summaries: &[DaySummary], today: NaiveDate) -> u32 {
    streak_ending(
        summaries
            .iter()
            .rev()
            .filter(|s| s.completed)
            .map(|s| s.date),
        today,
    )
}
