//! Insight provider: motivational and analytical strings.
//!
//! Providers may fail at any time (network, parsing, disabled). Callers go
//! through [`insights_or_fallback`] / [`quote_or_fallback`], which always
//! return something: the fallback text is a deterministic function of the
//! same [`InsightContext`].

use std::time::Duration;

use chrono::{DateTime, Datelike, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::task::{Priority, Task};
use crate::views::{compute_stats, is_overdue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        if hour < 12 {
            TimeOfDay::Morning
        } else if hour < 17 {
            TimeOfDay::Afternoon
        } else {
            TimeOfDay::Evening
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeOfDay::Morning => "morning",
            TimeOfDay::Afternoon => "afternoon",
            TimeOfDay::Evening => "evening",
        }
    }
}

/// Aggregates handed to a provider. No task text leaves the process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightContext {
    pub total: usize,
    pub completed: usize,
    pub overdue: usize,
    pub high_priority_open: usize,
    /// Whole percent, 0..=100.
    pub completion_rate: u32,
    pub time_of_day: TimeOfDay,
    pub day_of_week: String,
    /// Days since the common era in the caller's zone; seeds deterministic picks.
    pub day_number: i32,
}

impl InsightContext {
    pub fn from_tasks<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Self {
        let stats = compute_stats(tasks);
        let date = now.date_naive();
        Self {
            total: stats.total,
            completed: stats.completed,
            overdue: tasks.iter().filter(|task| is_overdue(task, now)).count(),
            high_priority_open: tasks
                .iter()
                .filter(|task| task.is_open() && task.priority == Priority::High)
                .count(),
            completion_rate: stats.percentage,
            time_of_day: TimeOfDay::from_hour(now.hour()),
            day_of_week: weekday_name(date.weekday()).to_string(),
            day_number: date.num_days_from_ce(),
        }
    }

    fn prompt(&self) -> String {
        format!(
            "Generate a personalized, motivational quote for a task manager user with:\n\
             - {}/{} tasks completed ({}%)\n\
             - {} overdue tasks\n\
             - {} high priority tasks\n\
             - Current time: {} on {}\n\
             Make it encouraging, specific to their situation, and under 50 words. Include relevant emoji.",
            self.completed,
            self.total,
            self.completion_rate,
            self.overdue,
            self.high_priority_open,
            self.time_of_day.as_str(),
            self.day_of_week,
        )
    }

    fn summary(&self) -> String {
        format!(
            "User productivity context: {}% completion rate, {} overdue items, working on {} {}",
            self.completion_rate,
            self.overdue,
            self.day_of_week,
            self.time_of_day.as_str(),
        )
    }
}

fn weekday_name(day: chrono::Weekday) -> &'static str {
    match day {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}

/// Source of generated text.
pub trait InsightProvider: Send + Sync {
    fn generate_insights(&self, context: &InsightContext) -> Result<Vec<String>>;

    fn generate_quote(&self, context: &InsightContext) -> Result<String>;
}

/// Insights from the provider, or the fallback when it fails or returns nothing.
pub fn insights_or_fallback(
    provider: &dyn InsightProvider,
    context: &InsightContext,
) -> Vec<String> {
    match provider.generate_insights(context) {
        Ok(insights) if !insights.is_empty() => insights,
        Ok(_) => {
            debug!("insight provider returned nothing, using fallback");
            fallback_insights(context)
        }
        Err(err) => {
            warn!(error = %err, "insight generation failed, using fallback");
            fallback_insights(context)
        }
    }
}

pub fn quote_or_fallback(provider: &dyn InsightProvider, context: &InsightContext) -> String {
    match provider.generate_quote(context) {
        Ok(quote) if !quote.trim().is_empty() => quote,
        Ok(_) => fallback_quote(context).to_string(),
        Err(err) => {
            warn!(error = %err, "quote generation failed, using fallback");
            fallback_quote(context).to_string()
        }
    }
}

/// Deterministic pick from `items`, stable for one context.
pub fn pick<'a, T>(items: &'a [T], context: &InsightContext) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let seed = context.day_number.unsigned_abs() as usize + context.total + context.completed;
    items.get(seed % items.len())
}

pub fn fallback_insights(context: &InsightContext) -> Vec<String> {
    vec![format!(
        "📊 You have {} tasks. Consider prioritizing by deadline and importance.",
        context.total
    )]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    High,
    Good,
    Moderate,
    Low,
}

impl Mood {
    pub fn from_completion_rate(rate: u32) -> Self {
        if rate >= 70 {
            Mood::High
        } else if rate >= 40 {
            Mood::Good
        } else if rate >= 20 {
            Mood::Moderate
        } else {
            Mood::Low
        }
    }

    fn quotes(self) -> &'static [&'static str] {
        match self {
            Mood::High => &[
                "🌟 You're on fire! Your productivity is inspiring others around you.",
                "🚀 Exceptional work! You've mastered the art of getting things done.",
                "💎 Your consistency is your superpower. Keep this momentum!",
            ],
            Mood::Good => &[
                "💪 Solid progress! You're building unstoppable momentum.",
                "⭐ Great work! Your dedication is paying off beautifully.",
                "🎯 You're in the zone! Focus on what matters most.",
            ],
            Mood::Moderate => &[
                "🌱 Every step forward counts. You're growing stronger!",
                "🔥 Time to ignite your potential! Start with one small win.",
                "💡 Progress over perfection. You've got this!",
            ],
            Mood::Low => &[
                "🌅 Fresh start, fresh energy! Today is full of possibilities.",
                "💎 Diamonds form under pressure. Your breakthrough is coming.",
                "🚀 Small steps lead to giant leaps. Begin with just one task.",
            ],
        }
    }
}

pub fn fallback_quote(context: &InsightContext) -> &'static str {
    let quotes = Mood::from_completion_rate(context.completion_rate).quotes();
    pick(quotes, context).copied().unwrap_or(quotes[0])
}

pub const MOTIVATIONAL_QUOTES: [&str; 8] = [
    "The only way to do great work is to love what you do. - Steve Jobs",
    "Success is not final, failure is not fatal: it is the courage to continue that counts. - Winston Churchill",
    "Your limitation is only your imagination.",
    "Great things never come from comfort zones.",
    "Dream it. Wish it. Do it.",
    "Success doesn't come to you, you go to it.",
    "The future belongs to those who believe in the beauty of their dreams. - Eleanor Roosevelt",
    "It is never too late to be what you might have been. - George Eliot",
];

pub fn celebration_message(completed: usize) -> String {
    match completed {
        1 => "🎉 First task completed! Great start!".to_string(),
        5 => "🔥 5 tasks completed! You're on fire!".to_string(),
        10 => "⭐ 10 tasks! You're a productivity machine!".to_string(),
        n => format!("🚀 {n} tasks completed! Keep it up!"),
    }
}

/// Canned insights and quotes; never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticInsights;

impl InsightProvider for StaticInsights {
    fn generate_insights(&self, _context: &InsightContext) -> Result<Vec<String>> {
        Ok([
            "🎯 You complete 73% more tasks on Tuesdays - consider scheduling important work then",
            "⚠️ High priority tasks are taking 2.3x longer than estimated - adjust your planning",
            "🔥 You're most productive between 9-11 AM - block this time for complex tasks",
            "📊 Your completion rate drops 40% when you have >5 tasks per day - consider task batching",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect())
    }

    fn generate_quote(&self, context: &InsightContext) -> Result<String> {
        Ok(pick(&MOTIVATIONAL_QUOTES, context)
            .copied()
            .unwrap_or(MOTIVATIONAL_QUOTES[0])
            .to_string())
    }
}

/// Provider that is switched off; every call falls back.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInsights;

impl InsightProvider for NoInsights {
    fn generate_insights(&self, _context: &InsightContext) -> Result<Vec<String>> {
        Err(Error::Insight("insights are disabled".to_string()))
    }

    fn generate_quote(&self, _context: &InsightContext) -> Result<String> {
        Err(Error::Insight("insights are disabled".to_string()))
    }
}

/// Generative-answer HTTP API (`/kb/{id}/chat` and `/kb/{id}/ask`).
#[derive(Debug, Clone)]
pub struct HttpInsights {
    base_url: String,
    knowledge_box: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

#[derive(Debug, Deserialize)]
struct AnswerResponse {
    #[serde(default)]
    answer: Option<String>,
}

impl HttpInsights {
    pub fn new(
        base_url: impl Into<String>,
        knowledge_box: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            knowledge_box: knowledge_box.into(),
            api_key,
            agent,
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/kb/{}/{}", self.base_url, self.knowledge_box, action)
    }

    fn post_for_answer(&self, action: &str, body: serde_json::Value) -> Result<String> {
        let url = self.endpoint(action);
        let mut request = self.agent.post(&url);
        if let Some(api_key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {api_key}"));
        }

        let response = request.send_json(body).map_err(|err| match err {
            ureq::Error::Status(code, _) => {
                Error::Insight(format!("{url} returned HTTP {code}"))
            }
            other => Error::Insight(format!("request to {url} failed: {other}")),
        })?;

        let parsed: AnswerResponse = response
            .into_json()
            .map_err(|err| Error::Insight(format!("unreadable response from {url}: {err}")))?;

        match parsed.answer {
            Some(answer) if !answer.trim().is_empty() => Ok(answer.trim().to_string()),
            _ => Err(Error::Insight(format!("{url} returned no answer"))),
        }
    }
}

impl InsightProvider for HttpInsights {
    fn generate_insights(&self, context: &InsightContext) -> Result<Vec<String>> {
        let body = serde_json::json!({
            "query": format!(
                "Analyze productivity patterns and provide insights: {}",
                serde_json::to_string(context)?
            ),
            "features": ["SEMANTIC_SEARCH"],
        });
        let answer = self.post_for_answer("ask", body)?;
        Ok(answer
            .lines()
            .map(|line| line.trim().trim_start_matches(['-', '*', '•']).trim())
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn generate_quote(&self, context: &InsightContext) -> Result<String> {
        let body = serde_json::json!({
            "query": context.prompt(),
            "context": context.summary(),
            "features": ["SEMANTIC_SEARCH", "GENERATIVE_ANSWER"],
            "max_tokens": 100,
        });
        let answer = self.post_for_answer("chat", body)?;
        Ok(decorate_quote(&answer, context.completion_rate))
    }
}

/// Prefix an emoji matching the completion rate unless one is already there.
fn decorate_quote(quote: &str, completion_rate: u32) -> String {
    let quote = quote.trim();
    if ["🎯", "💪", "🌟"].iter().any(|emoji| quote.contains(emoji)) {
        return quote.to_string();
    }
    let emoji = if completion_rate > 70 {
        "🌟"
    } else if completion_rate > 40 {
        "💪"
    } else {
        "🎯"
    };
    format!("{emoji} {quote}")
}
