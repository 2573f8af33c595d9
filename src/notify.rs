//! Smart notification rules and the live notification set.
//!
//! [`evaluate`] runs every rule once against a task snapshot and a `now`, and
//! returns what each rule would surface. It keeps no state. The
//! [`NotificationCenter`] owns the live set: it drops candidates whose key is
//! already live, and forgets entries only on dismissal or clear-all.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::insight::{insights_or_fallback, pick, InsightContext, InsightProvider};
use crate::risk::{analyze_workload, WorkloadRisk};
use crate::task::{Priority, Task, TaskId};
use crate::views::{completed_on, is_overdue};

/// Deadline reminders fire for open tasks due within this many hours.
pub const DEADLINE_WINDOW_HOURS: i64 = 48;
/// Below this many tasks the workload rule only fires on elevated risk.
pub const WORKLOAD_BASELINE_TASKS: usize = 3;
/// Minimum collection size for the daily insight.
pub const INSIGHT_MIN_TASKS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Deadline,
    Overdue,
    Workload,
    Insight,
    Celebration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

impl NotificationPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Medium => "medium",
            NotificationPriority::High => "high",
        }
    }
}

/// Identity of a notification. One key per rule, one per task for deadlines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NotificationKey {
    Deadline(TaskId),
    Overdue,
    Workload,
    DailyInsight,
    Celebration,
    Welcome,
}

impl fmt::Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKey::Deadline(id) => write!(f, "deadline-{id}"),
            NotificationKey::Overdue => f.write_str("overdue-alert"),
            NotificationKey::Workload => f.write_str("workload-analysis"),
            NotificationKey::DailyInsight => f.write_str("daily-insight"),
            NotificationKey::Celebration => f.write_str("daily-celebration"),
            NotificationKey::Welcome => f.write_str("welcome-notification"),
        }
    }
}

impl FromStr for NotificationKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s {
            "overdue-alert" => Ok(NotificationKey::Overdue),
            "workload-analysis" => Ok(NotificationKey::Workload),
            "daily-insight" => Ok(NotificationKey::DailyInsight),
            "daily-celebration" => Ok(NotificationKey::Celebration),
            "welcome-notification" => Ok(NotificationKey::Welcome),
            _ => match s.strip_prefix("deadline-") {
                Some(id) if !id.is_empty() => Ok(NotificationKey::Deadline(TaskId::from(id))),
                _ => Err(Error::InvalidArgument(format!(
                    "unknown notification id '{s}'"
                ))),
            },
        }
    }
}

impl Serialize for NotificationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmartNotification {
    pub id: NotificationKey,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub timestamp: DateTime<Utc>,
}

/// Run every rule once. Output order follows rule order.
pub fn evaluate<Tz: TimeZone>(
    tasks: &[Task],
    now: &DateTime<Tz>,
    insights: &dyn InsightProvider,
) -> Vec<SmartNotification> {
    let timestamp = now.with_timezone(&Utc);
    let notification = |id, kind, title: &str, message: String, priority| SmartNotification {
        id,
        kind,
        title: title.to_string(),
        message,
        priority,
        timestamp,
    };
    let mut out = Vec::new();

    for task in tasks.iter().filter(|task| task.is_open()) {
        let until = task.deadline - timestamp;
        if until <= chrono::Duration::zero()
            || until > chrono::Duration::hours(DEADLINE_WINDOW_HOURS)
        {
            continue;
        }
        let hours = (until.num_seconds() as f64 / 3600.0).round() as i64;
        out.push(notification(
            NotificationKey::Deadline(task.id.clone()),
            NotificationKind::Deadline,
            "⏰ Deadline Reminder",
            format!("\"{}\" is due in {hours} hours!", task.title),
            if task.priority == Priority::High {
                NotificationPriority::High
            } else {
                NotificationPriority::Medium
            },
        ));
    }

    let overdue = tasks.iter().filter(|task| is_overdue(task, now)).count();
    if overdue > 0 {
        out.push(notification(
            NotificationKey::Overdue,
            NotificationKind::Overdue,
            "🚨 Overdue Tasks",
            format!(
                "You have {overdue} overdue task{}. Click to reschedule.",
                plural(overdue)
            ),
            NotificationPriority::High,
        ));
    }

    let workload = analyze_workload(tasks, now);
    if !tasks.is_empty()
        && (workload.risk != WorkloadRisk::Low || tasks.len() >= WORKLOAD_BASELINE_TASKS)
    {
        out.push(notification(
            NotificationKey::Workload,
            NotificationKind::Workload,
            &workload.message,
            workload.suggestions.join(" • "),
            if workload.risk == WorkloadRisk::High {
                NotificationPriority::High
            } else {
                NotificationPriority::Medium
            },
        ));
    }

    if tasks.len() >= INSIGHT_MIN_TASKS {
        let context = InsightContext::from_tasks(tasks, now);
        let candidates = insights_or_fallback(insights, &context);
        if let Some(message) = pick(&candidates, &context) {
            out.push(notification(
                NotificationKey::DailyInsight,
                NotificationKind::Insight,
                "🧠 AI Productivity Insight",
                message.clone(),
                NotificationPriority::Low,
            ));
        }
    }

    let completed_today = completed_on(tasks, now.date_naive(), &now.timezone());
    if completed_today >= 1 {
        out.push(notification(
            NotificationKey::Celebration,
            NotificationKind::Celebration,
            "🎉 Great Progress!",
            format!(
                "Excellent! You've completed {completed_today} task{} today. Keep it up!",
                plural(completed_today)
            ),
            NotificationPriority::Low,
        ));
    }

    if tasks.is_empty() {
        out.push(notification(
            NotificationKey::Welcome,
            NotificationKind::Insight,
            "👋 Welcome to Smart Tasks!",
            "Start by creating your first task. I'll provide AI-powered insights to boost your productivity."
                .to_string(),
            NotificationPriority::Low,
        ));
    }

    out
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

/// Live, session-only notification set.
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    live: Vec<SmartNotification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add candidates whose key is not live yet; returns the ones added.
    pub fn merge(&mut self, candidates: Vec<SmartNotification>) -> Vec<SmartNotification> {
        let mut added = Vec::new();
        for candidate in candidates {
            if self.contains(&candidate.id) {
                continue;
            }
            self.live.push(candidate.clone());
            added.push(candidate);
        }
        added
    }

    pub fn contains(&self, id: &NotificationKey) -> bool {
        self.live.iter().any(|n| &n.id == id)
    }

    /// Remove one notification; `false` if it was not live.
    pub fn dismiss(&mut self, id: &NotificationKey) -> bool {
        let before = self.live.len();
        self.live.retain(|n| &n.id != id);
        self.live.len() != before
    }

    pub fn clear_all(&mut self) {
        self.live.clear();
    }

    pub fn list(&self) -> &[SmartNotification] {
        &self.live
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn has_high_priority(&self) -> bool {
        self.live
            .iter()
            .any(|n| n.priority == NotificationPriority::High)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insight::{NoInsights, StaticInsights};
    use crate::task::Status;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, 8, 0, 0).unwrap()
    }

    fn task(id: &str, priority: Priority, status: Status, deadline: DateTime<Utc>) -> Task {
        Task {
            id: TaskId::from(id),
            title: id.to_string(),
            description: String::new(),
            priority,
            status,
            deadline,
            created_at: now() - Duration::days(3),
            updated_at: now() - Duration::days(2),
        }
    }

    fn keys(notifications: &[SmartNotification]) -> Vec<String> {
        notifications.iter().map(|n| n.id.to_string()).collect()
    }

    #[test]
    fn empty_collection_only_welcomes() {
        let out = evaluate(&[], &now(), &StaticInsights);
        assert_eq!(keys(&out), vec!["welcome-notification"]);
        assert_eq!(out[0].kind, NotificationKind::Insight);
    }

    #[test]
    fn deadline_window_is_open_at_zero_and_closed_at_48h() {
        let tasks = vec![
            task("in10h", Priority::High, Status::Todo, now() + Duration::hours(10)),
            task("at48h", Priority::Low, Status::Todo, now() + Duration::hours(48)),
            task("past48h", Priority::Low, Status::Todo, now() + Duration::hours(49)),
            task("done", Priority::High, Status::Done, now() + Duration::hours(5)),
            task("now", Priority::Low, Status::Todo, now()),
        ];
        let out = evaluate(&tasks, &now(), &StaticInsights);
        let deadlines: Vec<&SmartNotification> = out
            .iter()
            .filter(|n| n.kind == NotificationKind::Deadline)
            .collect();
        assert_eq!(deadlines.len(), 2);
        assert_eq!(deadlines[0].id.to_string(), "deadline-in10h");
        assert_eq!(deadlines[0].priority, NotificationPriority::High);
        assert_eq!(deadlines[0].message, "\"in10h\" is due in 10 hours!");
        assert_eq!(deadlines[1].priority, NotificationPriority::Medium);
    }

    #[test]
    fn four_overdue_tasks_raise_high_workload_and_one_overdue_alert() {
        let tasks: Vec<Task> = (0..4)
            .map(|i| {
                task(
                    &format!("late{i}"),
                    Priority::Medium,
                    Status::Todo,
                    now() - Duration::hours(1 + i),
                )
            })
            .collect();
        let out = evaluate(&tasks, &now(), &StaticInsights);

        let overdue: Vec<&SmartNotification> = out
            .iter()
            .filter(|n| n.kind == NotificationKind::Overdue)
            .collect();
        assert_eq!(overdue.len(), 1);
        assert_eq!(
            overdue[0].message,
            "You have 4 overdue tasks. Click to reschedule."
        );

        let workload = out
            .iter()
            .find(|n| n.id == NotificationKey::Workload)
            .expect("workload notification");
        assert_eq!(workload.priority, NotificationPriority::High);
        assert!(workload.title.contains("High workload"));
    }

    #[test]
    fn workload_needs_elevated_risk_or_three_tasks() {
        let far = now() + Duration::days(10);
        let two = vec![
            task("a", Priority::Low, Status::Todo, far),
            task("b", Priority::Low, Status::Todo, far),
        ];
        assert!(!keys(&evaluate(&two, &now(), &StaticInsights)).contains(&"workload-analysis".to_string()));

        let mut three = two.clone();
        three.push(task("c", Priority::Low, Status::Todo, far));
        let out = evaluate(&three, &now(), &StaticInsights);
        let workload = out.iter().find(|n| n.id == NotificationKey::Workload).unwrap();
        assert_eq!(workload.priority, NotificationPriority::Medium);
        assert_eq!(workload.message, "Great job maintaining balance!");

        let late = vec![
            task("x", Priority::Low, Status::Todo, now() - Duration::hours(1)),
            task("y", Priority::Low, Status::Todo, now() - Duration::hours(2)),
        ];
        assert!(keys(&evaluate(&late, &now(), &StaticInsights)).contains(&"workload-analysis".to_string()));
    }

    #[test]
    fn single_overdue_task_is_counted_in_aggregate() {
        let tasks = vec![task("late", Priority::Low, Status::Todo, now() - Duration::hours(1))];
        let out = evaluate(&tasks, &now(), &StaticInsights);
        let alert = out.iter().find(|n| n.id == NotificationKey::Overdue).unwrap();
        assert_eq!(alert.message, "You have 1 overdue task. Click to reschedule.");
        assert_eq!(alert.priority, NotificationPriority::High);
    }

    #[test]
    fn insight_falls_back_when_provider_fails() {
        let far = now() + Duration::days(10);
        let tasks = vec![
            task("a", Priority::Low, Status::Todo, far),
            task("b", Priority::Low, Status::Todo, far),
        ];
        let out = evaluate(&tasks, &now(), &NoInsights);
        let insight = out.iter().find(|n| n.id == NotificationKey::DailyInsight).unwrap();
        assert_eq!(insight.priority, NotificationPriority::Low);
        assert_eq!(
            insight.message,
            "📊 You have 2 tasks. Consider prioritizing by deadline and importance."
        );
    }

    #[test]
    fn celebration_counts_tasks_completed_today() {
        let mut done = task("done", Priority::Low, Status::Done, now() - Duration::days(1));
        done.updated_at = now() - Duration::hours(1);
        let mut old = task("old", Priority::Low, Status::Done, now() - Duration::days(1));
        old.updated_at = now() - Duration::days(1);
        let out = evaluate(&[done, old], &now(), &StaticInsights);
        let celebration = out.iter().find(|n| n.id == NotificationKey::Celebration).unwrap();
        assert_eq!(
            celebration.message,
            "Excellent! You've completed 1 task today. Keep it up!"
        );
    }

    #[test]
    fn evaluation_is_repeatable() {
        let tasks = vec![
            task("a", Priority::High, Status::Todo, now() + Duration::hours(3)),
            task("b", Priority::Low, Status::Done, now()),
        ];
        assert_eq!(
            evaluate(&tasks, &now(), &StaticInsights),
            evaluate(&tasks, &now(), &StaticInsights)
        );
    }

    #[test]
    fn center_deduplicates_until_dismissed() {
        let tasks = vec![task("late", Priority::High, Status::Todo, now() - Duration::hours(1))];
        let mut center = NotificationCenter::new();

        let first = center.merge(evaluate(&tasks, &now(), &StaticInsights));
        assert!(!first.is_empty());
        let live = center.len();
        assert!(center.has_high_priority());

        let later = now() + Duration::minutes(30);
        assert!(center.merge(evaluate(&tasks, &later, &StaticInsights)).is_empty());
        assert_eq!(center.len(), live);

        assert!(center.dismiss(&NotificationKey::Overdue));
        assert!(!center.dismiss(&NotificationKey::Overdue));
        let again = center.merge(evaluate(&tasks, &later, &StaticInsights));
        assert_eq!(keys(&again), vec!["overdue-alert"]);
        assert_eq!(again[0].timestamp, later);

        center.clear_all();
        assert!(center.is_empty());
        assert!(!center.has_high_priority());
    }

    #[test]
    fn keys_round_trip_through_strings() {
        for key in [
            NotificationKey::Deadline(TaskId::from("01jabc")),
            NotificationKey::Overdue,
            NotificationKey::Workload,
            NotificationKey::DailyInsight,
            NotificationKey::Celebration,
            NotificationKey::Welcome,
        ] {
            assert_eq!(key.to_string().parse::<NotificationKey>().unwrap(), key);
        }
        assert!("deadline-".parse::<NotificationKey>().is_err());
        assert_eq!(
            serde_json::to_value(NotificationKey::Overdue).unwrap(),
            serde_json::json!("overdue-alert")
        );
    }
}
