//! Derived views over a task collection.
//!
//! Everything here is a pure function of its arguments. Calendar questions
//! ("is this due today?") are answered in the time zone of the `now` argument,
//! so callers pass `Local::now()` for a user-facing view and a fixed
//! `DateTime<Utc>` in tests. Inputs are never mutated.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::task::{Priority, Status, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressStats {
    pub total: usize,
    pub completed: usize,
    pub percentage: u32,
}

/// Completion counters; `percentage` rounds half up and is 0 for no tasks.
pub fn compute_stats(tasks: &[Task]) -> ProgressStats {
    let total = tasks.len();
    let completed = tasks.iter().filter(|task| task.is_done()).count();
    let percentage = if total == 0 {
        0
    } else {
        ((completed * 200 + total) / (2 * total)) as u32
    };
    ProgressStats {
        total,
        completed,
        percentage,
    }
}

/// Calendar date of `at` as seen from `tz`.
pub fn local_date<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

pub fn is_overdue<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> bool {
    task.is_open() && task.deadline < now.with_timezone(&Utc)
}

/// Named task subsets shown in the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Inbox,
    Today,
    Upcoming,
    Completed,
    All,
}

/// Days after today covered by [`View::Upcoming`].
pub const UPCOMING_DAYS: i64 = 7;

impl View {
    pub const NAMED: [View; 4] = [View::Inbox, View::Today, View::Upcoming, View::Completed];

    /// `None` for names that are not a known view.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "inbox" => Some(View::Inbox),
            "today" => Some(View::Today),
            "upcoming" => Some(View::Upcoming),
            "completed" => Some(View::Completed),
            "all" => Some(View::All),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            View::Inbox => "inbox",
            View::Today => "today",
            View::Upcoming => "upcoming",
            View::Completed => "completed",
            View::All => "all",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            View::Inbox => "Inbox",
            View::Today => "Today",
            View::Upcoming => "Upcoming",
            View::Completed => "Completed",
            View::All => "All Tasks",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            View::Inbox => "All your tasks in one place",
            View::Today => "Tasks due today",
            View::Upcoming => "Tasks due in the next 7 days",
            View::Completed => "All completed tasks",
            View::All => "All tasks",
        }
    }

    pub fn matches<Tz: TimeZone>(self, task: &Task, now: &DateTime<Tz>) -> bool {
        let today = now.date_naive();
        let due = local_date(&task.deadline, &now.timezone());
        match self {
            View::Inbox => task.is_open(),
            View::Today => task.is_open() && due == today,
            View::Upcoming => {
                task.is_open() && due > today && due <= today + Duration::days(UPCOMING_DAYS)
            }
            View::Completed => task.is_done(),
            View::All => true,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        View::from_name(s).ok_or_else(|| {
            Error::InvalidArgument(format!(
                "unknown view '{}' (expected inbox|today|upcoming|completed|all)",
                s.trim()
            ))
        })
    }
}

/// Tasks belonging to the named view. Unknown names return every task.
pub fn filter_by_view<'a, Tz: TimeZone>(
    tasks: &'a [Task],
    view_name: &str,
    now: &DateTime<Tz>,
) -> Vec<&'a Task> {
    let view = View::from_name(view_name).unwrap_or(View::All);
    filter_view(tasks, view, now)
}

pub fn filter_view<'a, Tz: TimeZone>(
    tasks: &'a [Task],
    view: View,
    now: &DateTime<Tz>,
) -> Vec<&'a Task> {
    tasks.iter().filter(|task| view.matches(task, now)).collect()
}

/// Case-insensitive substring match on title or description, narrowed to
/// `priority` when given. An empty term matches every task.
pub fn search<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    term: &str,
    priority: Option<Priority>,
) -> Vec<&'a Task> {
    let needle = term.to_lowercase();
    tasks
        .into_iter()
        .filter(|task| {
            needle.is_empty()
                || task.title.to_lowercase().contains(&needle)
                || task.description.to_lowercase().contains(&needle)
        })
        .filter(|task| priority.map_or(true, |wanted| task.priority == wanted))
        .collect()
}

/// Badge counts for the named views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ViewCounts {
    pub inbox: usize,
    pub today: usize,
    pub upcoming: usize,
    pub completed: usize,
}

pub fn view_counts<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> ViewCounts {
    let mut counts = ViewCounts::default();
    for task in tasks {
        for view in View::NAMED {
            if !view.matches(task, now) {
                continue;
            }
            match view {
                View::Inbox => counts.inbox += 1,
                View::Today => counts.today += 1,
                View::Upcoming => counts.upcoming += 1,
                View::Completed => counts.completed += 1,
                View::All => {}
            }
        }
    }
    counts
}

/// Board columns. Every task lands in exactly one column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusBoard<'a> {
    pub todo: Vec<&'a Task>,
    pub in_progress: Vec<&'a Task>,
    pub done: Vec<&'a Task>,
}

impl<'a> StatusBoard<'a> {
    pub fn column(&self, status: Status) -> &[&'a Task] {
        match status {
            Status::Todo => &self.todo,
            Status::InProgress => &self.in_progress,
            Status::Done => &self.done,
        }
    }
}

pub fn group_by_status(tasks: &[Task]) -> StatusBoard<'_> {
    let mut board = StatusBoard::default();
    for task in tasks {
        match task.status {
            Status::Todo => board.todo.push(task),
            Status::InProgress => board.in_progress.push(task),
            Status::Done => board.done.push(task),
        }
    }
    board
}

/// Tasks keyed by the calendar date of their deadline in `tz`.
pub fn group_by_date<'a, Tz: TimeZone>(
    tasks: &'a [Task],
    tz: &Tz,
) -> BTreeMap<NaiveDate, Vec<&'a Task>> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        by_date
            .entry(local_date(&task.deadline, tz))
            .or_default()
            .push(task);
    }
    by_date
}

/// Per-day counters for a calendar cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DaySummary {
    pub total: usize,
    pub overdue: usize,
    pub completed: usize,
    pub pending: usize,
}

pub fn calendar_summary<Tz: TimeZone>(
    tasks: &[Task],
    now: &DateTime<Tz>,
) -> BTreeMap<NaiveDate, DaySummary> {
    group_by_date(tasks, &now.timezone())
        .into_iter()
        .map(|(date, day)| {
            let summary = DaySummary {
                total: day.len(),
                overdue: day.iter().filter(|task| is_overdue(task, now)).count(),
                completed: day.iter().filter(|task| task.is_done()).count(),
                pending: day.iter().filter(|task| task.is_open()).count(),
            };
            (date, summary)
        })
        .collect()
}

/// Display order: status, then priority, then earliest deadline, then id.
pub fn sort_for_display<T: Borrow<Task>>(tasks: &mut [T]) {
    tasks.sort_by(|left, right| {
        let (left, right) = (left.borrow(), right.borrow());
        left.status
            .rank()
            .cmp(&right.status.rank())
            .then_with(|| left.priority.rank().cmp(&right.priority.rank()))
            .then_with(|| left.deadline.cmp(&right.deadline))
            .then_with(|| left.id.cmp(&right.id))
    });
}

/// Done tasks whose last update falls on `date` in `tz`.
pub fn completed_on<Tz: TimeZone>(tasks: &[Task], date: NaiveDate, tz: &Tz) -> usize {
    tasks
        .iter()
        .filter(|task| task.is_done() && local_date(&task.updated_at, tz) == date)
        .count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PriorityDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityDistribution {
    pub fn count(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high,
            Priority::Medium => self.medium,
            Priority::Low => self.low,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCompletion {
    pub date: NaiveDate,
    pub completed: usize,
}

/// Dashboard numbers. Weeks start on Monday; completion is dated by `updated_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub todo: usize,
    pub overdue: usize,
    pub this_week_completed: usize,
    pub last_week_completed: usize,
    pub weekly_growth: f64,
    pub priority: PriorityDistribution,
    pub daily_trend: Vec<DailyCompletion>,
    pub completion_rate: f64,
}

pub fn analytics<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Analytics {
    let tz = now.timezone();
    let today = now.date_naive();
    let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
    let last_week_start = week_start - Duration::days(7);

    let completed_between = |from: NaiveDate, to: NaiveDate| {
        tasks
            .iter()
            .filter(|task| task.is_done())
            .map(|task| local_date(&task.updated_at, &tz))
            .filter(|date| *date >= from && *date <= to)
            .count()
    };
    let this_week_completed = completed_between(week_start, week_start + Duration::days(6));
    let last_week_completed =
        completed_between(last_week_start, last_week_start + Duration::days(6));

    let weekly_growth = if last_week_completed > 0 {
        (this_week_completed as f64 - last_week_completed as f64) / last_week_completed as f64
            * 100.0
    } else if this_week_completed > 0 {
        100.0
    } else {
        0.0
    };

    let mut priority = PriorityDistribution::default();
    for task in tasks {
        match task.priority {
            Priority::High => priority.high += 1,
            Priority::Medium => priority.medium += 1,
            Priority::Low => priority.low += 1,
        }
    }

    let daily_trend = (0..7)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            DailyCompletion {
                date,
                completed: completed_on(tasks, date, &tz),
            }
        })
        .collect();

    let board = group_by_status(tasks);
    let total = tasks.len();
    let completed = board.done.len();
    Analytics {
        total,
        completed,
        in_progress: board.in_progress.len(),
        todo: board.todo.len(),
        overdue: tasks.iter().filter(|task| is_overdue(task, now)).count(),
        this_week_completed,
        last_week_completed,
        weekly_growth,
        priority,
        daily_trend,
        completion_rate: if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        },
    }
}
