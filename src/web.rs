//! HTTP front end. Every handler answers with an HTML page or fragment meant
//! to be swapped in by htmx.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use axum::extract::{Form, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use chrono::{Local, NaiveDateTime};
use log::{error, info, warn};
use rusqlite::Connection;
use serde::Deserialize;
use tower_http::services::ServeDir;

use crate::error::OpError;
use crate::history::{history, window_streak};
use crate::ops;
use crate::render::Templates;
use crate::validate::{parse_task_id, DEFAULT_HISTORY_DAYS};

/// Tells the page to refresh anything derived from task state.
const TASK_CHANGED: [(&str, &str); 1] = [("HX-Trigger", "taskChanged")];

#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
    templates: Arc<Templates>,
    static_dir: PathBuf,
}

impl AppState {
    pub fn new(conn: Connection, templates: Templates, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            templates: Arc::new(templates),
            static_dir: static_dir.into(),
        }
    }

    /// Run store work off the async runtime.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let res = tokio::task::spawn_blocking(move || {
            let conn = conn.lock().map_err(|_| anyhow!("database lock poisoned"))?;
            f(&conn)
        })
        .await
        .context("database task failed")?;
        Ok(res?)
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub struct AppError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match OpError::find(&self.0) {
            Some(e @ (OpError::TaskNotFound(_) | OpError::MalformedTaskId(_))) => {
                warn!("{e}");
                (StatusCode::NOT_FOUND, e.to_string()).into_response()
            }
            Some(e) => {
                warn!("rejected request: {e}");
                (StatusCode::BAD_REQUEST, e.to_string()).into_response()
            }
            None => {
                error!("request failed: {:#}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NewTaskForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    days: Option<u32>,
}

/// GET /
async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let today = now().date();
    let (tasks, days) = state
        .with_conn(move |conn| {
            let tasks = ops::list_active_tasks(conn, today)?;
            let days = history(conn, today, DEFAULT_HISTORY_DAYS)?;
            Ok((tasks, days))
        })
        .await?;
    let streak = window_streak(&days, today);
    let html = state
        .templates
        .render_index(&tasks, &days, DEFAULT_HISTORY_DAYS, streak)?;
    Ok(Html(html))
}

/// POST /tasks
async fn create_task(
    State(state): State<AppState>,
    Form(form): Form<NewTaskForm>,
) -> Result<impl IntoResponse, AppError> {
    let view = state
        .with_conn(move |conn| ops::create_task(conn, &form.title, &form.description, now()))
        .await?;
    info!("Created task {} '{}'", view.task.id, view.task.title);
    let html = state.templates.render_task_item(&view)?;
    Ok((TASK_CHANGED, Html(html)))
}

/// POST /tasks/{id}/toggle
async fn toggle_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_task_id(&id)?;
    let view = state
        .with_conn(move |conn| ops::toggle_completion(conn, id, now()))
        .await?;
    info!(
        "Task {id} marked {} for today",
        if view.completed_today { "done" } else { "open" }
    );
    let html = state.templates.render_task_item(&view)?;
    Ok((TASK_CHANGED, Html(html)))
}

/// DELETE /tasks/{id}
async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_task_id(&id)?;
    state
        .with_conn(move |conn| ops::soft_delete_task(conn, id))
        .await?;
    info!("Deleted task {id}");
    Ok((StatusCode::OK, TASK_CHANGED))
}

/// GET /history?days=N
async fn history_fragment(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Html<String>, AppError> {
    let today = now().date();
    let window = params.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    let days = state
        .with_conn(move |conn| history(conn, today, window))
        .await?;
    let streak = window_streak(&days, today);
    let html = state.templates.render_history(&days, window, streak)?;
    Ok(Html(html))
}

async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let start = Instant::now();
    let res = next.run(req).await;
    info!(
        "{method} {path} -> {} in {}ms",
        res.status().as_u16(),
        start.elapsed().as_millis()
    );
    res
}

pub fn router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);
    Router::new()
        .route("/", get(index))
        .route("/tasks", post(create_task))
        .route("/tasks/{id}/toggle", post(toggle_task))
        .route("/tasks/{id}", delete(delete_task))
        .route("/history", get(history_fragment))
        .nest_service("/static", static_files)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down...");
}

pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("Shutdown complete");
    Ok(())
}
