//! Read-only reports: board, calendar, stats and analytics.

use chrono::NaiveDate;
use serde::Serialize;

use crate::cli::task::{output_options, push_context_warnings, task_line};
use crate::cli::{load_context, parse_date, Globals};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::risk::analyze_workload;
use crate::task::{Status, Task};
use crate::views::{self, DaySummary, ProgressStats, ViewCounts};

pub struct CalendarOptions {
    pub date: Option<String>,
    pub globals: Globals,
}

#[derive(Serialize)]
struct CalendarDay<'a> {
    date: NaiveDate,
    #[serde(flatten)]
    summary: DaySummary,
    tasks: Vec<&'a Task>,
}

#[derive(Serialize)]
struct StatsOutput {
    #[serde(flatten)]
    progress: ProgressStats,
    views: ViewCounts,
}

pub fn run_board(globals: Globals) -> Result<()> {
    let ctx = load_context(&globals)?;
    let now = ctx.now();
    let mut board = views::group_by_status(ctx.store.list());
    views::sort_for_display(&mut board.todo);
    views::sort_for_display(&mut board.in_progress);
    views::sort_for_display(&mut board.done);

    let mut human = HumanOutput::new("Board");
    push_context_warnings(&mut human, &ctx);
    for status in Status::ALL {
        let column = board.column(status);
        human.push_summary(status.to_string(), column.len().to_string());
        for task in column {
            human.push_detail(task_line(task, &now));
        }
    }
    emit_success(output_options(&globals), "board", &board, Some(&human))
}

pub fn run_calendar(options: CalendarOptions) -> Result<()> {
    let ctx = load_context(&options.globals)?;
    let now = ctx.now();
    let only = options.date.as_deref().map(parse_date).transpose()?;

    let mut grouped = views::group_by_date(ctx.store.list(), &now.timezone());
    let summaries = views::calendar_summary(ctx.store.list(), &now);
    if let Some(date) = only {
        grouped.retain(|day, _| *day == date);
    }

    let mut days = Vec::with_capacity(grouped.len());
    let mut human = HumanOutput::new("Calendar");
    push_context_warnings(&mut human, &ctx);
    for (date, mut tasks) in grouped {
        views::sort_for_display(&mut tasks);
        let summary = summaries.get(&date).copied().unwrap_or_default();
        human.push_summary(
            date.format("%a %Y-%m-%d").to_string(),
            format!(
                "{} total, {} pending, {} done, {} overdue",
                summary.total, summary.pending, summary.completed, summary.overdue
            ),
        );
        for task in &tasks {
            human.push_detail(task_line(task, &now));
        }
        days.push(CalendarDay {
            date,
            summary,
            tasks,
        });
    }
    if days.is_empty() {
        human.push_detail("No tasks scheduled");
    }

    emit_success(output_options(&options.globals), "calendar", &days, Some(&human))
}

pub fn run_stats(globals: Globals) -> Result<()> {
    let ctx = load_context(&globals)?;
    let now = ctx.now();
    let output = StatsOutput {
        progress: ctx.store.stats(),
        views: views::view_counts(ctx.store.list(), &now),
    };

    let mut human = HumanOutput::new("Progress");
    push_context_warnings(&mut human, &ctx);
    human.push_summary(
        "Completed",
        format!(
            "{}/{} ({}%)",
            output.progress.completed, output.progress.total, output.progress.percentage
        ),
    );
    human.push_summary("Inbox", output.views.inbox.to_string());
    human.push_summary("Today", output.views.today.to_string());
    human.push_summary("Upcoming", output.views.upcoming.to_string());
    human.push_summary("Completed view", output.views.completed.to_string());

    emit_success(output_options(&globals), "stats", &output, Some(&human))
}

pub fn run_analytics(globals: Globals) -> Result<()> {
    let ctx = load_context(&globals)?;
    let now = ctx.now();
    let analytics = views::analytics(ctx.store.list(), &now);
    let workload = analyze_workload(ctx.store.list(), &now);

    #[derive(Serialize)]
    struct AnalyticsOutput<'a> {
        #[serde(flatten)]
        analytics: &'a views::Analytics,
        workload: &'a crate::risk::WorkloadAnalysis,
    }

    let mut human = HumanOutput::new("Analytics");
    push_context_warnings(&mut human, &ctx);
    human.push_summary("Total", analytics.total.to_string());
    human.push_summary(
        "Status",
        format!(
            "{} todo, {} in progress, {} done",
            analytics.todo, analytics.in_progress, analytics.completed
        ),
    );
    human.push_summary("Overdue", analytics.overdue.to_string());
    human.push_summary(
        "Completion rate",
        format!("{:.0}%", analytics.completion_rate),
    );
    human.push_summary(
        "This week",
        format!(
            "{} completed ({:+.0}% vs last week's {})",
            analytics.this_week_completed, analytics.weekly_growth, analytics.last_week_completed
        ),
    );
    human.push_summary(
        "Priority",
        format!(
            "{} high, {} medium, {} low",
            analytics.priority.high, analytics.priority.medium, analytics.priority.low
        ),
    );
    human.push_summary("Workload", format!("{} {}", workload.risk.as_str(), workload.message));
    for day in &analytics.daily_trend {
        human.push_detail(format!(
            "{} {}",
            day.date.format("%a %m-%d"),
            "#".repeat(day.completed)
        ));
    }
    for suggestion in &workload.suggestions {
        human.push_next_step(suggestion.clone());
    }

    let output = AnalyticsOutput {
        analytics: &analytics,
        workload: &workload,
    };
    emit_success(output_options(&globals), "analytics", &output, Some(&human))
}
