//! Notification commands: one-shot `notify`, long-running `watch`, and `quote`.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::task::{output_options, push_context_warnings};
use crate::cli::{load_context, Globals};
use crate::error::{Error, Result};
use crate::insight::{celebration_message, quote_or_fallback, InsightContext, Mood};
use crate::notify::{evaluate, NotificationCenter, SmartNotification};
use crate::output::{emit_json_line, emit_success, HumanOutput};
use crate::risk::{analyze_workload, WorkloadAnalysis};
use crate::scheduler::{NotificationScheduler, SnapshotFn};
use crate::views::completed_on;

/// How often `watch` checks the task file for changes from other commands.
const CHANGE_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct WatchOptions {
    pub interval_minutes: Option<u64>,
    pub exit_after: Option<u64>,
    pub globals: Globals,
}

#[derive(Serialize)]
struct NotifyOutput<'a> {
    notifications: &'a [SmartNotification],
    has_high_priority: bool,
    workload: WorkloadAnalysis,
}

#[derive(Serialize)]
struct QuoteOutput {
    quote: String,
    mood: Mood,
    #[serde(skip_serializing_if = "Option::is_none")]
    celebration: Option<String>,
}

pub fn run_notify(globals: Globals) -> Result<()> {
    let ctx = load_context(&globals)?;
    let now = ctx.now();
    let provider = ctx.config.insights.build_provider()?;

    let mut center = NotificationCenter::new();
    center.merge(evaluate(ctx.store.list(), &now, provider.as_ref()));
    let output = NotifyOutput {
        notifications: center.list(),
        has_high_priority: center.has_high_priority(),
        workload: analyze_workload(ctx.store.list(), &now),
    };

    let mut human = HumanOutput::new(format!("Notifications ({})", center.len()));
    push_context_warnings(&mut human, &ctx);
    human.push_summary("Workload", output.workload.risk.as_str());
    for notification in center.list() {
        human.push_detail(notification_line(notification));
    }
    emit_success(output_options(&globals), "notify", &output, Some(&human))
}

pub fn run_quote(globals: Globals) -> Result<()> {
    let ctx = load_context(&globals)?;
    let now = ctx.now();
    let provider = ctx.config.insights.build_provider()?;
    let context = InsightContext::from_tasks(ctx.store.list(), &now);

    let completed_today = completed_on(ctx.store.list(), now.date_naive(), &Local);
    let output = QuoteOutput {
        quote: quote_or_fallback(provider.as_ref(), &context),
        mood: Mood::from_completion_rate(context.completion_rate),
        celebration: (completed_today > 0).then(|| celebration_message(completed_today)),
    };

    let mut human = HumanOutput::new(output.quote.clone());
    push_context_warnings(&mut human, &ctx);
    if let Some(celebration) = &output.celebration {
        human.push_detail(celebration.clone());
    }
    emit_success(output_options(&globals), "quote", &output, Some(&human))
}

pub fn run_watch(options: WatchOptions) -> Result<()> {
    let ctx = load_context(&options.globals)?;
    let interval = match options.interval_minutes {
        Some(0) => {
            return Err(Error::InvalidArgument(
                "--interval-minutes must be > 0".to_string(),
            ))
        }
        Some(minutes) => Duration::from_secs(minutes.saturating_mul(60)),
        None => ctx.config.notifications.interval(),
    };
    let provider = ctx.config.insights.build_provider()?;
    let persistence = ctx.store.persistence().clone();
    let watched = persistence.backend().path_for(persistence.key());
    let snapshot: SnapshotFn = Arc::new(move || persistence.load());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let (scheduler, mut events) =
            NotificationScheduler::spawn(interval, snapshot, ctx.clock.clone(), provider, Local);
        info!(interval_secs = interval.as_secs(), "watching for notifications");

        let stop_after = async {
            match options.exit_after {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(stop_after);

        let mut poll = tokio::time::interval(CHANGE_POLL_INTERVAL);
        let mut last_seen = file_stamp(&watched);

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(notification) = event else { break };
                    print_notification(&notification, &options.globals)?;
                }
                _ = poll.tick() => {
                    let stamp = file_stamp(&watched);
                    if stamp != last_seen {
                        debug!(path = %watched.display(), "task file changed");
                        last_seen = stamp;
                        scheduler.refresh();
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
                _ = &mut stop_after => break,
            }
        }

        scheduler.shutdown().await;
        Ok::<(), Error>(())
    })
}

fn file_stamp(path: &Path) -> Option<(SystemTime, u64)> {
    let meta = std::fs::metadata(path).ok()?;
    Some((meta.modified().ok()?, meta.len()))
}

fn print_notification(notification: &SmartNotification, globals: &Globals) -> Result<()> {
    if globals.json {
        return emit_json_line(notification);
    }
    if !globals.quiet {
        println!(
            "{} {}",
            notification.timestamp.with_timezone(&Local).format("%H:%M"),
            notification_line(notification)
        );
    }
    Ok(())
}

fn notification_line(notification: &SmartNotification) -> String {
    format!(
        "[{}] {}: {} ({})",
        notification.priority.as_str(),
        notification.title,
        notification.message,
        notification.id
    )
}
