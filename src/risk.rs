//! Workload risk classification.
//!
//! Scores the open workload from two counters: overdue tasks and open
//! high-priority tasks.

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::task::{Priority, Task};
use crate::views::is_overdue;

/// Severity rating for the current workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadRisk {
    Low,
    Medium,
    High,
}

impl WorkloadRisk {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkloadRisk::Low => "low",
            WorkloadRisk::Medium => "medium",
            WorkloadRisk::High => "high",
        }
    }
}

/// Full workload report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkloadAnalysis {
    pub risk: WorkloadRisk,
    pub overdue: usize,
    pub high_priority_open: usize,
    pub message: String,
    pub suggestions: Vec<String>,
}

pub fn analyze_workload<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> WorkloadAnalysis {
    let overdue = tasks.iter().filter(|task| is_overdue(task, now)).count();
    let high_priority_open = tasks
        .iter()
        .filter(|task| task.is_open() && task.priority == Priority::High)
        .count();
    let risk = classify(overdue, high_priority_open);

    WorkloadAnalysis {
        risk,
        overdue,
        high_priority_open,
        message: message_for(risk).to_string(),
        suggestions: suggestions_for(risk)
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

pub fn classify(overdue: usize, high_priority_open: usize) -> WorkloadRisk {
    if overdue > 3 || high_priority_open > 5 {
        WorkloadRisk::High
    } else if overdue > 1 || high_priority_open > 3 {
        WorkloadRisk::Medium
    } else {
        WorkloadRisk::Low
    }
}

fn message_for(risk: WorkloadRisk) -> &'static str {
    match risk {
        WorkloadRisk::High => "🚨 High workload detected! Risk of burnout.",
        WorkloadRisk::Medium => "⚠️ Moderate workload - monitor closely",
        WorkloadRisk::Low => "✅ Workload is manageable",
    }
}

fn suggestions_for(risk: WorkloadRisk) -> &'static [&'static str] {
    match risk {
        WorkloadRisk::High => &[
            "Consider delegating 2-3 low priority tasks",
            "Extend deadlines for non-critical items",
            "Focus on completing overdue tasks first",
        ],
        WorkloadRisk::Medium => &[
            "Prioritize high-impact tasks",
            "Consider time-blocking for focus",
        ],
        WorkloadRisk::Low => &["Great job maintaining balance!"],
    }
}
