//! Command-line interface for st
//!
//! This module defines the CLI structure using clap derive macros.
//! Handlers live in submodules grouped by what they touch.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::clock::{Clock, ManualClock, SystemClock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::persist::Persistence;
use crate::storage::FileStore;
use crate::store::TaskStore;
use crate::task::{validate_deadline, DEADLINE_YEARS};

mod notify;
mod report;
mod task;

/// st - Smart Tasks
///
/// A personal task manager with derived views, workload analysis and
/// motivational notifications.
#[derive(Parser, Debug)]
#[command(name = "st")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory holding the task file
    #[arg(long, global = true, env = "ST_STORE")]
    pub store: Option<PathBuf>,

    /// Configuration file (defaults to the platform config dir)
    #[arg(long, global = true, env = "ST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Pin the current time (RFC 3339)
    #[arg(long, global = true, env = "ST_NOW", hide = true)]
    pub now: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a task
    Add {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long)]
        description: Option<String>,

        /// Priority: high, medium, low
        #[arg(short, long, default_value = "medium")]
        priority: String,

        /// Deadline: RFC 3339, YYYY-MM-DD, today, tomorrow or +Nd
        #[arg(long, default_value = "today")]
        deadline: String,
    },

    /// Create a task from free text ("call bank tomorrow urgent")
    Quick {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// List tasks in a view
    List {
        /// inbox, today, upcoming, completed or all
        #[arg(short, long, default_value = "all")]
        view: String,

        /// Keep tasks whose title or description contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Keep tasks with exactly this priority
        #[arg(short, long)]
        priority: Option<String>,
    },

    /// Show one task
    Show {
        /// Task id or unique prefix
        id: String,
    },

    /// Change task fields
    Edit {
        /// Task id or unique prefix
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,

        #[arg(short, long)]
        status: Option<String>,

        #[arg(long)]
        deadline: Option<String>,
    },

    /// Move a task to another board column
    Move {
        /// Task id or unique prefix
        id: String,

        /// todo, in-progress or done
        status: String,
    },

    /// Mark a task done
    Done {
        /// Task id or unique prefix
        id: String,
    },

    /// Delete a task
    #[command(alias = "delete")]
    Rm {
        /// Task id or unique prefix
        id: String,
    },

    /// Tasks grouped by status
    Board,

    /// Tasks grouped by deadline date
    Calendar {
        /// Only this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },

    /// Completion progress and view counts
    Stats,

    /// Weekly trends and priority distribution
    Analytics,

    /// Evaluate notification rules once
    Notify,

    /// Keep evaluating notification rules until interrupted
    Watch {
        /// Override notifications.interval_minutes
        #[arg(long)]
        interval_minutes: Option<u64>,

        /// Stop after this many seconds
        #[arg(long)]
        exit_after: Option<u64>,
    },

    /// Motivational quote for the current state
    Quote,
}

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct Globals {
    pub store: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub now: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let globals = Globals {
            store: self.store,
            config: self.config,
            now: self.now,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Add {
                title,
                description,
                priority,
                deadline,
            } => task::run_add(task::AddOptions {
                title,
                description,
                priority,
                deadline,
                globals,
            }),
            Commands::Quick { text } => task::run_quick(task::QuickOptions {
                text: text.join(" "),
                globals,
            }),
            Commands::List {
                view,
                search,
                priority,
            } => task::run_list(task::ListOptions {
                view,
                search,
                priority,
                globals,
            }),
            Commands::Show { id } => task::run_show(task::ShowOptions { id, globals }),
            Commands::Edit {
                id,
                title,
                description,
                priority,
                status,
                deadline,
            } => task::run_edit(task::EditOptions {
                id,
                title,
                description,
                priority,
                status,
                deadline,
                globals,
            }),
            Commands::Move { id, status } => task::run_move(task::MoveOptions {
                id,
                status,
                globals,
            }),
            Commands::Done { id } => task::run_done(task::DoneOptions { id, globals }),
            Commands::Rm { id } => task::run_rm(task::RmOptions { id, globals }),
            Commands::Board => report::run_board(globals),
            Commands::Calendar { date } => {
                report::run_calendar(report::CalendarOptions { date, globals })
            }
            Commands::Stats => report::run_stats(globals),
            Commands::Analytics => report::run_analytics(globals),
            Commands::Notify => notify::run_notify(globals),
            Commands::Watch {
                interval_minutes,
                exit_after,
            } => notify::run_watch(notify::WatchOptions {
                interval_minutes,
                exit_after,
                globals,
            }),
            Commands::Quote => notify::run_quote(globals),
        }
    }
}

/// Everything a handler needs: config, the opened store and the clock.
pub(crate) struct Context {
    pub config: Config,
    pub store: TaskStore<FileStore>,
    pub clock: Arc<dyn Clock>,
    pub warnings: Vec<String>,
}

impl Context {
    /// Current time in the local zone; views are computed in this zone.
    pub fn now(&self) -> DateTime<Local> {
        self.clock.now().with_timezone(&Local)
    }
}

pub(crate) fn load_context(globals: &Globals) -> Result<Context> {
    let mut config = Config::discover(globals.config.as_deref())?;
    if let Some(dir) = &globals.store {
        config.storage.dir = Some(dir.clone());
    }
    let dir = config.storage.resolve_dir()?;
    let backend = FileStore::new(dir).with_lock_timeout(config.storage.lock_timeout_ms);
    let persistence = Persistence::with_key(backend, config.storage.key.clone());

    let mut warnings = Vec::new();
    let tasks = persistence.try_load().unwrap_or_else(|err| {
        warn!(error = %err, "discarding unreadable task data");
        warnings.push(format!("stored tasks could not be read ({err}); starting empty"));
        Vec::new()
    });

    let clock: Arc<dyn Clock> = match globals.now.as_deref() {
        Some(raw) => {
            let at = DateTime::parse_from_rfc3339(raw.trim()).map_err(|err| {
                Error::InvalidArgument(format!("invalid --now timestamp '{raw}': {err}"))
            })?;
            Arc::new(ManualClock::new(at.with_timezone(&Utc)))
        }
        None => Arc::new(SystemClock),
    };
    let store = TaskStore::with_tasks(persistence, tasks, clock.clone());

    Ok(Context {
        config,
        store,
        clock,
        warnings,
    })
}

/// Parse a deadline argument relative to `now`.
///
/// Date-only forms (`YYYY-MM-DD`, `today`, `tomorrow`) mean the end of that
/// local day; `+Nd` is exactly N days from now.
pub(crate) fn parse_deadline<Tz: TimeZone>(raw: &str, now: &DateTime<Tz>) -> Result<DateTime<Utc>> {
    let value = raw.trim();
    let tz = now.timezone();
    let today = now.date_naive();

    let end_of = |date: NaiveDate| -> Result<DateTime<Utc>> {
        let naive = date.and_time(end_of_day());
        tz.from_local_datetime(&naive)
            .latest()
            .map(|at| at.with_timezone(&Utc))
            .ok_or_else(|| Error::InvalidArgument(format!("'{value}' does not exist locally")))
    };

    match value.to_ascii_lowercase().as_str() {
        "" => Err(Error::InvalidArgument("deadline cannot be empty".to_string())),
        "today" => end_of(today),
        "tomorrow" => end_of(today + Duration::days(1)),
        lower => {
            if let Some(days) = lower.strip_prefix('+').and_then(|rest| rest.strip_suffix('d')) {
                let days: i64 = days.parse().map_err(|_| {
                    Error::InvalidArgument(format!("invalid relative deadline '{value}'"))
                })?;
                return Duration::try_days(days)
                    .and_then(|delta| now.with_timezone(&Utc).checked_add_signed(delta))
                    .ok_or_else(|| {
                        Error::InvalidArgument(format!("relative deadline '{value}' is out of range"))
                    })
                    .and_then(|at| in_range(at, value));
            }
            if let Ok(at) = DateTime::parse_from_rfc3339(value) {
                return in_range(at.with_timezone(&Utc), value);
            }
            if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
                return end_of(date).and_then(|at| in_range(at, value));
            }
            Err(Error::InvalidArgument(format!(
                "invalid deadline '{value}' (expected RFC 3339, YYYY-MM-DD, today, tomorrow or +Nd)"
            )))
        }
    }
}

fn in_range(at: DateTime<Utc>, raw: &str) -> Result<DateTime<Utc>> {
    validate_deadline(&at).map_err(|_| {
        Error::InvalidArgument(format!(
            "deadline '{raw}' is outside years {}-{}",
            DEADLINE_YEARS.start(),
            DEADLINE_YEARS.end()
        ))
    })?;
    Ok(at)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default()
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| Error::InvalidArgument(format!("invalid date '{raw}': {err}")))
}
