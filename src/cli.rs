use clap::{Parser, Subcommand};

use crate::validate::DEFAULT_HISTORY_DAYS;

#[derive(Parser)]
#[command(name = "habitz", about = "Daily habit tracker")]
pub struct Cli {
    /// Path to the SQLite database [default: ~/.habitz/habitz.db]
    #[arg(long, env = "HABITZ_DB", global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the web interface
    Serve {
        /// Address to listen on
        #[arg(long, env = "HABITZ_ADDR", default_value = "127.0.0.1:5000")]
        addr: String,
        /// Directory served under /static
        #[arg(long, env = "HABITZ_STATIC", default_value = "static")]
        static_dir: String,
    },

    /// Create database and tables (idempotent)
    Init,

    /// Add a task
    Add {
        /// Task title
        title: String,
        /// Task description
        #[arg(short, long, default_value = "")]
        desc: String,
    },

    /// List active tasks
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show task details and its completions
    Show {
        /// Task id
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mark a task done for today, or undo it
    Toggle {
        /// Task id
        id: i64,
    },

    /// Hide a task; its history is kept
    Rm {
        /// Task id
        id: i64,
    },

    /// Delete a task and all of its completions
    Purge {
        /// Task id
        id: i64,
    },

    /// Show completion history
    History {
        /// Number of days to cover, ending today
        #[arg(long, default_value_t = DEFAULT_HISTORY_DAYS)]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
