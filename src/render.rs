//! HTML pages and fragments.
//!
//! Templates are compiled into the binary. Tera escapes every variable in
//! templates whose name ends in `.html`.

use anyhow::{Context as _, Result};
use serde::Serialize;
use tera::{Context, Tera};

use crate::model::{DaySummary, TaskView};

const TEMPLATES: [(&str, &str); 4] = [
    ("base.html", include_str!("../templates/base.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("_task_item.html", include_str!("../templates/_task_item.html")),
    ("_history.html", include_str!("../templates/_history.html")),
];

#[derive(Serialize)]
struct HistoryContext<'a> {
    days: &'a [DaySummary],
    window: u32,
    streak: u32,
}

pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)
            .context("failed to compile templates")?;
        Ok(Self { tera })
    }

    fn render(&self, name: &str, ctx: &Context) -> Result<String> {
        self.tera
            .render(name, ctx)
            .with_context(|| format!("failed to render {name}"))
    }

    pub fn render_index(
        &self,
        tasks: &[TaskView],
        days: &[DaySummary],
        window: u32,
        streak: u32,
    ) -> Result<String> {
        let mut ctx = Context::new();
        ctx.insert("tasks", tasks);
        ctx.insert(
            "history",
            &HistoryContext {
                days,
                window,
                streak,
            },
        );
        self.render("index.html", &ctx)
    }

    pub fn render_task_item(&self, task: &TaskView) -> Result<String> {
        let mut ctx = Context::new();
        ctx.insert("task", task);
        self.render("_task_item.html", &ctx)
    }

    pub fn render_history(&self, days: &[DaySummary], window: u32, streak: u32) -> Result<String> {
        let mut ctx = Context::new();
        ctx.insert(
            "history",
            &HistoryContext {
                days,
                window,
                streak,
            },
        );
        self.render("_history.html", &ctx)
    }
}
