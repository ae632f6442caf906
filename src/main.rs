use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use rusqlite::Connection;

use habitz::cli::{Cli, Command};
use habitz::history::{history, window_streak};
use habitz::output::{self, HistoryReport, TaskDetail};
use habitz::render::Templates;
use habitz::{db, ops, web};

fn default_db_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".habitz").join("habitz.db"))
}

fn resolve_db_path(cli_db: Option<String>) -> Result<String> {
    match cli_db {
        Some(p) => Ok(p),
        None => {
            let path = default_db_path()?;
            Ok(path
                .to_str()
                .context("default DB path is not valid UTF-8")?
                .to_string())
        }
    }
}

fn ensure_db_dir(db_path: &str) -> Result<()> {
    if let Some(parent) = std::path::Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn open_db(db_path: &str) -> Result<Connection> {
    let conn = db::open(db_path)?;
    db::init(&conn)?;
    Ok(conn)
}

fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}

fn main() {
    setup_logging();
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db)?;
    ensure_db_dir(&db_path)?;
    let now = Local::now().naive_local();
    let today = now.date();

    match cli.command {
        Command::Serve { addr, static_dir } => {
            let conn = open_db(&db_path)?;
            let templates = Templates::new()?;
            log::info!("Using database {db_path}");
            let state = web::AppState::new(conn, templates, static_dir);
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(web::serve(&addr, state))?;
        }

        Command::Init => {
            open_db(&db_path)?;
            eprintln!("Initialized {db_path}");
        }

        Command::Add { title, desc } => {
            let conn = open_db(&db_path)?;
            let view = ops::create_task(&conn, &title, &desc, now)?;
            println!("{}", view.task.id);
            eprintln!("Added task '{}'", view.task.title);
        }

        Command::List { json } => {
            let conn = open_db(&db_path)?;
            let tasks = ops::list_active_tasks(&conn, today)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else {
                print!("{}", output::format_task_list(&tasks));
            }
        }

        Command::Show { id, json } => {
            let conn = open_db(&db_path)?;
            let view = ops::get_task_view(&conn, id, today)?;
            let completions = ops::list_completions(&conn, id)?;
            if json {
                let detail = TaskDetail {
                    view: &view,
                    completions: &completions,
                };
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                print!("{}", output::format_task_detail(&view, &completions));
            }
        }

        Command::Toggle { id } => {
            let conn = open_db(&db_path)?;
            let view = ops::toggle_completion(&conn, id, now)?;
            if view.completed_today {
                eprintln!("Marked '{}' done for {today}", view.task.title);
            } else {
                eprintln!("Marked '{}' open for {today}", view.task.title);
            }
        }

        Command::Rm { id } => {
            let conn = open_db(&db_path)?;
            ops::soft_delete_task(&conn, id)?;
            eprintln!("Removed task {id}");
        }

        Command::Purge { id } => {
            let conn = open_db(&db_path)?;
            ops::purge_task(&conn, id)?;
            eprintln!("Purged task {id} and its history");
        }

        Command::History { days, json } => {
            let conn = open_db(&db_path)?;
            let summaries = history(&conn, today, days)?;
            let streak = window_streak(&summaries, today);
            if json {
                let report = HistoryReport {
                    days: &summaries,
                    streak,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", output::format_history(&summaries, streak));
            }
        }
    }

    Ok(())
}
