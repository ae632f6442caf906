use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};

use crate::error::OpError;
use crate::history::current_streak;
use crate::model::{Task, TaskCompletion, TaskView};
use crate::validate::validate_title;

pub(crate) const TASK_COLUMNS: &str = "id, title, description, created_at, active";

pub(crate) fn read_task_row(row: &rusqlite::Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        active: row.get(4)?,
    })
}

const INSERT_TASK: &str = "
INSERT INTO tasks (title, description, created_at, active)
VALUES (?1, ?2, ?3, 1)
";

const INSERT_COMPLETION: &str = "
INSERT INTO task_completions (task_id, completion_date, completed_at)
VALUES (?1, ?2, ?3)
";

const DELETE_COMPLETION: &str = "
DELETE FROM task_completions
WHERE task_id = ?1 AND completion_date = ?2
";

fn require_task(conn: &Connection, id: i64) -> Result<Task> {
    let task = conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            [id],
            read_task_row,
        )
        .optional()?;
    task.ok_or_else(|| OpError::TaskNotFound(id).into())
}

fn task_view(conn: &Connection, task: Task, today: NaiveDate) -> Result<TaskView> {
    let completed_today = is_completed_on(conn, task.id, today)?;
    let streak = current_streak(conn, task.id, today)?;
    Ok(TaskView {
        task,
        completed_today,
        streak,
    })
}

/// Look up a task by id. Soft-deleted tasks are still found.
pub fn get_task(conn: &Connection, id: i64) -> Result<Task> {
    require_task(conn, id)
}

pub fn get_task_view(conn: &Connection, id: i64, today: NaiveDate) -> Result<TaskView> {
    let task = require_task(conn, id)?;
    task_view(conn, task, today)
}

/// Active tasks, most recently created first.
pub fn active_tasks(conn: &Connection) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE active = 1 ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt.query_map([], read_task_row)?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Into::into)
}

pub fn list_active_tasks(conn: &Connection, today: NaiveDate) -> Result<Vec<TaskView>> {
    active_tasks(conn)?
        .into_iter()
        .map(|task| task_view(conn, task, today))
        .collect()
}

pub fn create_task(
    conn: &Connection,
    title: &str,
    description: &str,
    now: NaiveDateTime,
) -> Result<TaskView> {
    let title = validate_title(title)?;
    conn.execute(
        INSERT_TASK,
        rusqlite::params![title, description.trim(), now],
    )?;
    let task = require_task(conn, conn.last_insert_rowid())?;
    Ok(TaskView {
        task,
        completed_today: false,
        streak: 0,
    })
}

pub fn is_completed_on(conn: &Connection, task_id: i64, date: NaiveDate) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM task_completions WHERE task_id = ?1 AND completion_date = ?2",
        rusqlite::params![task_id, date],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Flip today's completion for a task: remove it if present, record it otherwise.
pub fn toggle_completion(conn: &Connection, id: i64, now: NaiveDateTime) -> Result<TaskView> {
    let today = now.date();
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let task = require_task(&tx, id)?;
    let removed = tx.execute(DELETE_COMPLETION, rusqlite::params![id, today])?;
    if removed == 0 {
        tx.execute(INSERT_COMPLETION, rusqlite::params![id, today, now])?;
    }
    tx.commit()?;
    task_view(conn, task, today)
}

/// Hide a task from listings and history. Its completions are kept.
pub fn soft_delete_task(conn: &Connection, id: i64) -> Result<()> {
    require_task(conn, id)?;
    conn.execute("UPDATE tasks SET active = 0 WHERE id = ?1", [id])?;
    Ok(())
}

/// Remove a task for good. The store cascades the delete to its completions.
pub fn purge_task(conn: &Connection, id: i64) -> Result<()> {
    require_task(conn, id)?;
    conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
    Ok(())
}

/// Every completion recorded for a task, newest first.
pub fn list_completions(conn: &Connection, task_id: i64) -> Result<Vec<TaskCompletion>> {
    require_task(conn, task_id)?;
    let mut stmt = conn.prepare_cached(
        "SELECT id, task_id, completion_date, completed_at FROM task_completions
         WHERE task_id = ?1 ORDER BY completion_date DESC",
    )?;
    let rows = stmt.query_map([task_id], |row| {
        Ok(TaskCompletion {
            id: row.get(0)?,
            task_id: row.get(1)?,
            completion_date: row.get(2)?,
            completed_at: row.get(3)?,
        })
    })?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn day(date: &str) -> NaiveDate {
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap()
    }

    fn task_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn create_and_get_task() {
        let conn = db::open_memory().unwrap();
        let view = create_task(&conn, "  stretch ", "  ten minutes ", at("2024-06-10", "08:00:00"))
            .unwrap();
        assert_eq!(view.task.title, "stretch");
        assert_eq!(view.task.description, "ten minutes");
        assert!(view.task.active);
        assert!(!view.completed_today);
        assert_eq!(view.streak, 0);

        let task = get_task(&conn, view.task.id).unwrap();
        assert_eq!(task.title, "stretch");
        assert_eq!(task.created_at, at("2024-06-10", "08:00:00"));
    }

    #[test]
    fn create_without_description() {
        let conn = db::open_memory().unwrap();
        let view = create_task(&conn, "read", "", at("2024-06-10", "08:00:00")).unwrap();
        assert_eq!(view.task.description, "");
    }

    #[test]
    fn create_whitespace_title_fails_without_insert() {
        let conn = db::open_memory().unwrap();
        let err = create_task(&conn, "   \t", "desc", at("2024-06-10", "08:00:00")).unwrap_err();
        assert_eq!(OpError::find(&err), Some(&OpError::EmptyTitle));
        assert_eq!(task_count(&conn), 0);
    }

    #[test]
    fn get_missing_task_is_not_found() {
        let conn = db::open_memory().unwrap();
        let err = get_task(&conn, 99).unwrap_err();
        assert_eq!(OpError::find(&err), Some(&OpError::TaskNotFound(99)));
    }

    #[test]
    fn list_newest_first() {
        let conn = db::open_memory().unwrap();
        create_task(&conn, "old", "", at("2024-06-08", "08:00:00")).unwrap();
        create_task(&conn, "new", "", at("2024-06-10", "08:00:00")).unwrap();
        create_task(&conn, "mid", "", at("2024-06-09", "08:00:00")).unwrap();
        let titles: Vec<String> = list_active_tasks(&conn, day("2024-06-10"))
            .unwrap()
            .into_iter()
            .map(|v| v.task.title)
            .collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[test]
    fn list_same_timestamp_breaks_ties_by_id() {
        let conn = db::open_memory().unwrap();
        let now = at("2024-06-10", "08:00:00");
        create_task(&conn, "first", "", now).unwrap();
        create_task(&conn, "second", "", now).unwrap();
        let tasks = active_tasks(&conn).unwrap();
        assert_eq!(tasks[0].title, "second");
        assert_eq!(tasks[1].title, "first");
    }

    #[test]
    fn toggle_flips_todays_completion() {
        let conn = db::open_memory().unwrap();
        let id = create_task(&conn, "run", "", at("2024-06-10", "07:00:00"))
            .unwrap()
            .task
            .id;
        let now = at("2024-06-10", "18:30:00");

        let view = toggle_completion(&conn, id, now).unwrap();
        assert!(view.completed_today);
        let completions = list_completions(&conn, id).unwrap();
        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].completion_date, day("2024-06-10"));
        assert_eq!(completions[0].completed_at, now);

        let view = toggle_completion(&conn, id, now).unwrap();
        assert!(!view.completed_today);
        assert!(list_completions(&conn, id).unwrap().is_empty());

        let view = toggle_completion(&conn, id, now).unwrap();
        assert!(view.completed_today);
        assert_eq!(list_completions(&conn, id).unwrap().len(), 1);
    }

    #[test]
    fn toggle_only_touches_today() {
        let conn = db::open_memory().unwrap();
        let id = create_task(&conn, "run", "", at("2024-06-08", "07:00:00"))
            .unwrap()
            .task
            .id;
        toggle_completion(&conn, id, at("2024-06-09", "20:00:00")).unwrap();
        let view = toggle_completion(&conn, id, at("2024-06-10", "20:00:00")).unwrap();
        assert!(view.completed_today);
        assert_eq!(view.streak, 2);
        assert_eq!(list_completions(&conn, id).unwrap().len(), 2);
    }

    #[test]
    fn toggle_missing_task_is_not_found() {
        let conn = db::open_memory().unwrap();
        let err = toggle_completion(&conn, 5, at("2024-06-10", "08:00:00")).unwrap_err();
        assert_eq!(OpError::find(&err), Some(&OpError::TaskNotFound(5)));
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM task_completions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn soft_delete_hides_task_but_keeps_completions() {
        let conn = db::open_memory().unwrap();
        let id = create_task(&conn, "run", "", at("2024-06-10", "07:00:00"))
            .unwrap()
            .task
            .id;
        create_task(&conn, "read", "", at("2024-06-10", "07:30:00")).unwrap();
        toggle_completion(&conn, id, at("2024-06-10", "09:00:00")).unwrap();

        soft_delete_task(&conn, id).unwrap();
        let titles: Vec<String> = list_active_tasks(&conn, day("2024-06-10"))
            .unwrap()
            .into_iter()
            .map(|v| v.task.title)
            .collect();
        assert_eq!(titles, vec!["read"]);
        assert!(!get_task(&conn, id).unwrap().active);
        assert_eq!(list_completions(&conn, id).unwrap().len(), 1);
    }

    #[test]
    fn soft_deleted_task_can_still_be_toggled() {
        let conn = db::open_memory().unwrap();
        let id = create_task(&conn, "run", "", at("2024-06-10", "07:00:00"))
            .unwrap()
            .task
            .id;
        soft_delete_task(&conn, id).unwrap();
        let view = toggle_completion(&conn, id, at("2024-06-10", "09:00:00")).unwrap();
        assert!(view.completed_today);
        assert!(!view.task.active);
        // Deleting twice is allowed too.
        soft_delete_task(&conn, id).unwrap();
    }

    #[test]
    fn duplicate_completion_is_not_a_domain_error() {
        let conn = db::open_memory().unwrap();
        let id = create_task(&conn, "run", "", at("2024-06-10", "07:00:00"))
            .unwrap()
            .task
            .id;
        let now = at("2024-06-10", "09:00:00");
        toggle_completion(&conn, id, now).unwrap();

        let err: anyhow::Error = conn
            .execute(INSERT_COMPLETION, rusqlite::params![id, now.date(), now])
            .unwrap_err()
            .into();
        assert!(OpError::find(&err).is_none());
        assert_eq!(list_completions(&conn, id).unwrap().len(), 1);
    }

    #[test]
    fn soft_delete_missing_task_is_not_found() {
        let conn = db::open_memory().unwrap();
        let err = soft_delete_task(&conn, 3).unwrap_err();
        assert_eq!(OpError::find(&err), Some(&OpError::TaskNotFound(3)));
    }

    #[test]
    fn purge_removes_task_and_completions() {
        let conn = db::open_memory().unwrap();
        let id = create_task(&conn, "run", "", at("2024-06-09", "07:00:00"))
            .unwrap()
            .task
            .id;
        toggle_completion(&conn, id, at("2024-06-09", "09:00:00")).unwrap();
        toggle_completion(&conn, id, at("2024-06-10", "09:00:00")).unwrap();

        purge_task(&conn, id).unwrap();
        assert!(get_task(&conn, id).is_err());
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM task_completions WHERE task_id = ?1",
                [id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn completions_newest_first() {
        let conn = db::open_memory().unwrap();
        let id = create_task(&conn, "run", "", at("2024-06-01", "07:00:00"))
            .unwrap()
            .task
            .id;
        for date in ["2024-06-03", "2024-06-05", "2024-06-04"] {
            toggle_completion(&conn, id, at(date, "09:00:00")).unwrap();
        }
        let dates: Vec<NaiveDate> = list_completions(&conn, id)
            .unwrap()
            .into_iter()
            .map(|c| c.completion_date)
            .collect();
        assert_eq!(
            dates,
            vec![day("2024-06-05"), day("2024-06-04"), day("2024-06-03")]
        );
    }
}
