//! One-line task entry: `st quick "call the bank tomorrow urgent"`.
//!
//! Keywords are matched as whole words, case-insensitively, and removed from
//! the title along with every `!`.

use chrono::{DateTime, Duration, Utc};

use crate::error::{Error, Result};
use crate::task::{NewTask, Priority};

const HIGH_WORDS: &[&str] = &["urgent", "important"];
const LOW_WORDS: &[&str] = &["low", "maybe"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum When {
    Today,
    Tomorrow,
    NextWeek,
}

/// Turn free text into a new task. The deadline defaults to `now`.
pub fn parse_quick(text: &str, now: DateTime<Utc>) -> Result<NewTask> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::InvalidArgument(
            "quick add text cannot be empty".to_string(),
        ));
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut kept: Vec<String> = Vec::with_capacity(tokens.len());
    let mut high = text.contains('!');
    let mut low = false;
    let mut seen: Vec<When> = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let word = keyword(tokens[i]);
        if word == "next" && tokens.get(i + 1).map(|t| keyword(t)).as_deref() == Some("week") {
            seen.push(When::NextWeek);
            i += 2;
            continue;
        }
        match word.as_str() {
            w if HIGH_WORDS.contains(&w) => high = true,
            w if LOW_WORDS.contains(&w) => low = true,
            "today" => seen.push(When::Today),
            "tomorrow" => seen.push(When::Tomorrow),
            _ => {
                let cleaned: String = tokens[i].chars().filter(|c| *c != '!').collect();
                if !cleaned.is_empty() {
                    kept.push(cleaned);
                }
            }
        }
        i += 1;
    }

    let priority = if high {
        Priority::High
    } else if low {
        Priority::Low
    } else {
        Priority::Medium
    };

    let deadline = if seen.contains(&When::Today) {
        now
    } else if seen.contains(&When::Tomorrow) {
        now + Duration::days(1)
    } else if seen.contains(&When::NextWeek) {
        now + Duration::days(7)
    } else {
        now
    };

    let title = if kept.is_empty() {
        text.to_string()
    } else {
        kept.join(" ")
    };

    Ok(NewTask::new(title, priority, deadline))
}

/// Lowercased token with surrounding punctuation and `!` removed.
fn keyword(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 5, 8, 0, 0).unwrap()
    }

    #[test]
    fn plain_text_is_medium_and_due_now() {
        let task = parse_quick("water the plants", now()).unwrap();
        assert_eq!(task.title, "water the plants");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.deadline, now());
    }

    #[test]
    fn urgent_and_tomorrow_are_stripped() {
        let task = parse_quick("Call the bank tomorrow URGENT", now()).unwrap();
        assert_eq!(task.title, "Call the bank");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.deadline, now() + Duration::days(1));
    }

    #[test]
    fn bang_means_high_priority() {
        let task = parse_quick("ship it!!", now()).unwrap();
        assert_eq!(task.title, "ship it");
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn high_keywords_win_over_low_ones() {
        let task = parse_quick("maybe important refactor", now()).unwrap();
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.title, "refactor");
    }

    #[test]
    fn next_week_is_seven_days_out() {
        let task = parse_quick("plan offsite next week, low", now()).unwrap();
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.deadline, now() + Duration::days(7));
        assert_eq!(task.title, "plan offsite");
    }

    #[test]
    fn keywords_inside_words_are_left_alone() {
        let task = parse_quick("follow up with todayville", now()).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.deadline, now());
        assert_eq!(task.title, "follow up with todayville");
    }

    #[test]
    fn keyword_only_input_keeps_original_text() {
        let task = parse_quick("urgent today", now()).unwrap();
        assert_eq!(task.title, "urgent today");
        assert_eq!(task.priority, Priority::High);
    }

    #[test]
    fn blank_input_is_rejected() {
        assert!(matches!(
            parse_quick("   ", now()),
            Err(Error::InvalidArgument(_))
        ));
    }
}
