use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub created_at: NaiveDateTime,
    pub active: bool,
}

impl Task {
    /// Calendar day the task came into existence.
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskCompletion {
    pub id: i64,
    pub task_id: i64,
    pub completion_date: NaiveDate,
    pub completed_at: NaiveDateTime,
}

/// A task as shown to the user for a given day.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub completed_today: bool,
    pub streak: u32,
}

impl TaskView {
    /// Returns display icon: x=done today, .=open
    pub fn icon(&self) -> &'static str {
        if self.completed_today {
            "x"
        } else {
            "."
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTask {
    pub title: String,
    pub completed: bool,
}

/// One day of the completion history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub completed: bool,
    pub total_tasks: usize,
    pub tasks: Vec<DayTask>,
}

impl DaySummary {
    pub fn completed_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }
}
