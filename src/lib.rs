//! smart-tasks - personal task manager library
//!
//! This library provides the core of the `st` CLI: a task store persisted as
//! one JSON blob, pure derived views over the collection, and a notification
//! engine that turns the collection into reminders, alerts and encouragement.
//!
//! # Core Concepts
//!
//! - **Task store**: sole writer of the collection; every change is saved whole
//! - **Views**: inbox, today, upcoming, completed, board and calendar groupings
//! - **Notifications**: rule-based reminders, deduplicated by id while live
//! - **Insights**: optional generated text with deterministic fallbacks
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `st.toml`
//! - `error`: Error types and result aliases
//! - `clock`: Injectable time source
//! - `task`: Task data model and timestamp format
//! - `lock`: File locking and atomic writes
//! - `storage`: Key-value backends (file and in-memory)
//! - `persist`: Task collection load/save
//! - `store`: The task store
//! - `views`: Derived views, calendar and analytics
//! - `risk`: Workload risk classification
//! - `insight`: Insight providers and fallbacks
//! - `notify`: Notification rules and the live notification set
//! - `scheduler`: Background notification evaluation
//! - `quick_add`: Free-text task entry

pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod insight;
pub mod lock;
pub mod notify;
pub mod output;
pub mod persist;
pub mod quick_add;
pub mod risk;
pub mod scheduler;
pub mod storage;
pub mod store;
pub mod task;
pub mod views;

pub use error::{Error, Result};
