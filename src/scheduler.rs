//! Background driver for the notification rules.
//!
//! The scheduler runs one pass right away, then one per interval, plus one
//! whenever [`NotificationScheduler::refresh`] is called (the caller does this
//! after the task collection changes). Each pass evaluates on the blocking
//! pool because insight providers may do network I/O.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::TimeZone;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::insight::InsightProvider;
use crate::notify::{evaluate, NotificationCenter, SmartNotification};
use crate::task::Task;

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Source of task snapshots, called once per pass.
pub type SnapshotFn = Arc<dyn Fn() -> Vec<Task> + Send + Sync>;

pub struct NotificationScheduler {
    center: Arc<Mutex<NotificationCenter>>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
    passes: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

struct Pass<Tz> {
    snapshot: SnapshotFn,
    clock: Arc<dyn Clock>,
    provider: Arc<dyn InsightProvider>,
    tz: Tz,
}

impl NotificationScheduler {
    /// Start the background loop on the current tokio runtime.
    ///
    /// Notifications newly added to the center are also sent on the returned
    /// channel.
    pub fn spawn<Tz>(
        interval: Duration,
        snapshot: SnapshotFn,
        clock: Arc<dyn Clock>,
        provider: Arc<dyn InsightProvider>,
        tz: Tz,
    ) -> (Self, mpsc::UnboundedReceiver<SmartNotification>)
    where
        Tz: TimeZone + Send + Sync + 'static,
        Tz::Offset: Send,
    {
        let center = Arc::new(Mutex::new(NotificationCenter::new()));
        let refresh = Arc::new(Notify::new());
        let cancel = CancellationToken::new();
        let passes = Arc::new(AtomicU64::new(0));
        let (events, rx) = mpsc::unbounded_channel();

        let pass = Arc::new(Pass {
            snapshot,
            clock,
            provider,
            tz,
        });
        let handle = tokio::spawn(run(
            interval,
            pass,
            center.clone(),
            refresh.clone(),
            cancel.clone(),
            passes.clone(),
            events,
        ));

        (
            Self {
                center,
                refresh,
                cancel,
                passes,
                handle: Some(handle),
            },
            rx,
        )
    }

    /// Ask for an evaluation pass now.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    /// Number of completed evaluation passes.
    pub fn passes(&self) -> u64 {
        self.passes.load(Ordering::SeqCst)
    }

    pub fn center(&self) -> MutexGuard<'_, NotificationCenter> {
        lock_center(&self.center)
    }

    pub fn shared_center(&self) -> Arc<Mutex<NotificationCenter>> {
        self.center.clone()
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "notification scheduler exited abnormally");
            }
        }
    }
}

impl Drop for NotificationScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn lock_center(center: &Mutex<NotificationCenter>) -> MutexGuard<'_, NotificationCenter> {
    center.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn run<Tz>(
    interval: Duration,
    pass: Arc<Pass<Tz>>,
    center: Arc<Mutex<NotificationCenter>>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
    passes: Arc<AtomicU64>,
    events: mpsc::UnboundedSender<SmartNotification>,
) where
    Tz: TimeZone + Send + Sync + 'static,
    Tz::Offset: Send,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
            _ = refresh.notified() => {}
        }

        let job = pass.clone();
        let evaluated = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = tokio::task::spawn_blocking(move || {
                let tasks = (job.snapshot)();
                let now = job.clock.now().with_timezone(&job.tz);
                evaluate(&tasks, &now, job.provider.as_ref())
            }) => result,
        };

        let candidates = match evaluated {
            Ok(candidates) => candidates,
            Err(err) => {
                warn!(error = %err, "notification pass failed");
                continue;
            }
        };

        let added = lock_center(&center).merge(candidates);
        let total = passes.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(pass = total, added = added.len(), "notification pass complete");
        for notification in added {
            // The receiver may be gone; the center still holds the entry.
            let _ = events.send(notification);
        }
    }
    debug!("notification scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::insight::StaticInsights;
    use crate::notify::NotificationKey;
    use crate::task::{Priority, Status, TaskId};
    use chrono::{DateTime, Duration as ChronoDuration, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, 8, 0, 0).unwrap()
    }

    fn overdue_task(id: &str) -> Task {
        Task {
            id: TaskId::from(id),
            title: id.to_string(),
            description: String::new(),
            priority: Priority::High,
            status: Status::Todo,
            deadline: now() - ChronoDuration::hours(2),
            created_at: now() - ChronoDuration::days(1),
            updated_at: now() - ChronoDuration::days(1),
        }
    }

    fn start(
        tasks: Arc<Mutex<Vec<Task>>>,
    ) -> (NotificationScheduler, mpsc::UnboundedReceiver<SmartNotification>) {
        let snapshot: SnapshotFn = Arc::new(move || tasks.lock().unwrap().clone());
        NotificationScheduler::spawn(
            DEFAULT_INTERVAL,
            snapshot,
            Arc::new(ManualClock::new(now())),
            Arc::new(StaticInsights),
            Utc,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn first_pass_runs_immediately() {
        let (scheduler, mut rx) = start(Arc::new(Mutex::new(Vec::new())));
        let first = rx.recv().await.unwrap();
        assert_eq!(first.id, NotificationKey::Welcome);
        assert!(scheduler.passes() >= 1);
        assert_eq!(scheduler.center().len(), 1);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_picks_up_new_tasks() {
        let tasks = Arc::new(Mutex::new(Vec::new()));
        let (scheduler, mut rx) = start(tasks.clone());
        assert_eq!(rx.recv().await.unwrap().id, NotificationKey::Welcome);

        tasks.lock().unwrap().push(overdue_task("late"));
        scheduler.refresh();

        let next = rx.recv().await.unwrap();
        assert_eq!(next.id, NotificationKey::Overdue);
        assert!(scheduler.center().has_high_priority());
        assert!(scheduler.center().contains(&NotificationKey::Welcome));
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_passes_do_not_duplicate() {
        let tasks = Arc::new(Mutex::new(vec![overdue_task("late")]));
        let (scheduler, mut rx) = start(tasks);
        rx.recv().await.unwrap();
        tokio::time::sleep(DEFAULT_INTERVAL * 3).await;

        let center = scheduler.shared_center();
        let live = center.lock().unwrap().len();
        scheduler.refresh();
        tokio::time::sleep(DEFAULT_INTERVAL).await;
        assert_eq!(center.lock().unwrap().len(), live);
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_closes_the_event_channel() {
        let (scheduler, mut rx) = start(Arc::new(Mutex::new(Vec::new())));
        rx.recv().await.unwrap();
        scheduler.shutdown().await;
        assert!(rx.recv().await.is_none());
    }
}
