use serde::Serialize;

use crate::model::{DaySummary, Task, TaskCompletion, TaskView};

#[derive(Serialize)]
pub struct TaskDetail<'a> {
    #[serde(flatten)]
    pub view: &'a TaskView,
    pub completions: &'a [TaskCompletion],
}

#[derive(Serialize)]
pub struct HistoryReport<'a> {
    pub days: &'a [DaySummary],
    pub streak: u32,
}

fn status_word(task: &Task) -> &'static str {
    if task.active {
        "active"
    } else {
        "deleted"
    }
}

pub fn format_task_detail(view: &TaskView, completions: &[TaskCompletion]) -> String {
    let task = &view.task;
    let mut out = String::new();
    out.push_str(&format!("Id:          {}\n", task.id));
    out.push_str(&format!("Title:       {}\n", task.title));
    out.push_str(&format!("Status:      {}\n", status_word(task)));
    if !task.description.is_empty() {
        out.push_str(&format!("Description: {}\n", task.description));
    }
    out.push_str(&format!(
        "Created:     {}\n",
        task.created_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!(
        "Today:       {}\n",
        if view.completed_today { "done" } else { "open" }
    ));
    out.push_str(&format!("Streak:      {}\n", view.streak));

    if !completions.is_empty() {
        out.push('\n');
        out.push_str("Completions:\n");
        for c in completions {
            out.push_str(&format!(
                "  {} (at {})\n",
                c.completion_date,
                c.completed_at.format("%H:%M:%S")
            ));
        }
    }

    out
}

pub fn format_task_list(views: &[TaskView]) -> String {
    let mut out = String::new();
    for view in views {
        let streak = if view.streak > 0 {
            format!(" [{}d]", view.streak)
        } else {
            String::new()
        };
        let desc = if view.task.description.is_empty() {
            String::new()
        } else {
            format!("  {}", view.task.description)
        };
        out.push_str(&format!(
            "{} {:>4} {}{}{}\n",
            view.icon(),
            view.task.id,
            view.task.title,
            streak,
            desc
        ));
    }
    out
}

pub fn format_history(days: &[DaySummary], streak: u32) -> String {
    let mut out = String::new();
    for day in days {
        let mark = if day.completed { "x" } else { "." };
        out.push_str(&format!(
            "{} {} {}  {}/{}\n",
            mark,
            day.date,
            day.date.format("%a"),
            day.completed_tasks(),
            day.total_tasks
        ));
        for task in &day.tasks {
            let mark = if task.completed { "x" } else { "." };
            out.push_str(&format!("    {} {}\n", mark, task.title));
        }
    }
    if !days.is_empty() {
        out.push_str(&format!("Streak: {streak} day(s)\n"));
    }
    out
}
