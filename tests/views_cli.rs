mod support;

use predicates::str::contains;
use serde_json::json;
use support::{ids, task_record, TestEnv};

/// Six tasks around Wednesday 2025-03-05 08:00 UTC.
fn seeded() -> Result<TestEnv, Box<dyn std::error::Error>> {
    let env = TestEnv::new();
    let tasks = json!([
        task_record("01jdue-today", "Ship release", "High", "Todo", "2025-03-05T18:00:00Z", "2025-02-20T09:00:00Z"),
        task_record("01jsaturday", "Plan trip", "Medium", "Todo", "2025-03-08T12:00:00Z", "2025-02-20T09:00:00Z"),
        task_record("01jlater", "Refactor parser", "Low", "InProgress", "2025-03-20T12:00:00Z", "2025-03-01T09:00:00Z"),
        task_record("01jdone-tue", "Send invoice", "High", "Done", "2025-03-04T17:00:00Z", "2025-03-04T10:00:00Z"),
        task_record("01joverdue", "Renew passport", "Medium", "Todo", "2025-03-01T12:00:00Z", "2025-02-20T09:00:00Z"),
        task_record("01jdone-old", "Book dentist", "Low", "Done", "2025-02-25T12:00:00Z", "2025-02-26T10:00:00Z"),
    ]);
    env.write_tasks(&tasks.to_string())?;
    Ok(env)
}

fn listed_ids(env: &TestEnv, view: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let value = env.json(&["list", "--view", view])?;
    assert_eq!(value["data"]["view"], view);
    Ok(ids(&value["data"]["tasks"]))
}

#[test]
fn named_views_partition_by_status_and_deadline() -> Result<(), Box<dyn std::error::Error>> {
    let env = seeded()?;

    assert_eq!(
        listed_ids(&env, "inbox")?,
        vec!["01jdue-today", "01joverdue", "01jsaturday", "01jlater"]
    );
    assert_eq!(listed_ids(&env, "today")?, vec!["01jdue-today"]);
    assert_eq!(listed_ids(&env, "upcoming")?, vec!["01jsaturday"]);
    assert_eq!(
        listed_ids(&env, "completed")?,
        vec!["01jdone-tue", "01jdone-old"]
    );
    assert_eq!(listed_ids(&env, "all")?.len(), 6);
    Ok(())
}

#[test]
fn list_human_output_flags_overdue_tasks() -> Result<(), Box<dyn std::error::Error>> {
    let env = seeded()?;
    env.st()
        .args(["list", "--view", "inbox"])
        .assert()
        .success()
        .stdout(contains("Inbox"))
        .stdout(contains("[Todo][Medium] 01joverdue Renew passport (due 2025-03-01 12:00) OVERDUE"));
    Ok(())
}

#[test]
fn list_search_matches_title_or_description() -> Result<(), Box<dyn std::error::Error>> {
    let env = seeded()?;
    let mut tasks = env.read_tasks()?;
    tasks[5]["description"] = json!("ask about PArking");
    env.write_tasks(&tasks.to_string())?;

    let value = env.json(&["list", "--search", "pa"])?;
    assert_eq!(value["data"]["search"], "pa");
    assert_eq!(
        ids(&value["data"]["tasks"]),
        vec!["01joverdue", "01jlater", "01jdone-old"]
    );

    let value = env.json(&["list", "--view", "inbox", "--search", "PA", "-p", "low"])?;
    assert_eq!(value["data"]["priority"], "Low");
    assert_eq!(ids(&value["data"]["tasks"]), vec!["01jlater"]);

    let value = env.json(&["list", "--priority", "high"])?;
    assert_eq!(ids(&value["data"]["tasks"]), vec!["01jdue-today", "01jdone-tue"]);
    Ok(())
}

#[test]
fn list_search_reports_filters_and_rejects_unknown_priority(
) -> Result<(), Box<dyn std::error::Error>> {
    let env = seeded()?;
    env.st()
        .args(["list", "--search", "passport"])
        .assert()
        .success()
        .stdout(contains("- Search: passport"))
        .stdout(contains("- Total: 1"));

    env.st()
        .args(["list", "--priority", "urgent"])
        .assert()
        .code(2)
        .stderr(contains("unknown priority 'urgent'"));
    Ok(())
}

#[test]
fn board_groups_every_task_into_one_column() -> Result<(), Box<dyn std::error::Error>> {
    let env = seeded()?;
    let board = env.json(&["board"])?;
    let data = &board["data"];

    assert_eq!(
        ids(&data["todo"]),
        vec!["01jdue-today", "01joverdue", "01jsaturday"]
    );
    assert_eq!(ids(&data["in_progress"]), vec!["01jlater"]);
    assert_eq!(ids(&data["done"]), vec!["01jdone-tue", "01jdone-old"]);
    Ok(())
}

#[test]
fn calendar_groups_by_deadline_date() -> Result<(), Box<dyn std::error::Error>> {
    let env = seeded()?;
    let calendar = env.json(&["calendar"])?;
    let days = calendar["data"].as_array().ok_or("calendar is not an array")?;

    let dates: Vec<&str> = days.iter().filter_map(|day| day["date"].as_str()).collect();
    assert_eq!(
        dates,
        vec![
            "2025-02-25",
            "2025-03-01",
            "2025-03-04",
            "2025-03-05",
            "2025-03-08",
            "2025-03-20"
        ]
    );

    let overdue_day = &days[1];
    assert_eq!(overdue_day["total"], 1);
    assert_eq!(overdue_day["overdue"], 1);
    assert_eq!(overdue_day["pending"], 1);
    assert_eq!(overdue_day["completed"], 0);

    let done_day = &days[2];
    assert_eq!(done_day["completed"], 1);
    assert_eq!(done_day["overdue"], 0);
    Ok(())
}

#[test]
fn calendar_date_filter_and_bad_date() -> Result<(), Box<dyn std::error::Error>> {
    let env = seeded()?;
    let calendar = env.json(&["calendar", "--date", "2025-03-05"])?;
    let days = calendar["data"].as_array().ok_or("calendar is not an array")?;
    assert_eq!(days.len(), 1);
    assert_eq!(ids(&days[0]["tasks"]), vec!["01jdue-today"]);

    let empty = env.json(&["calendar", "--date", "2025-04-01"])?;
    assert_eq!(empty["data"], json!([]));

    env.st()
        .args(["calendar", "--date", "March 5"])
        .assert()
        .code(2)
        .stderr(contains("invalid date"));
    Ok(())
}

#[test]
fn stats_report_rounded_percentage_and_view_counts() -> Result<(), Box<dyn std::error::Error>> {
    let env = seeded()?;
    let stats = env.json(&["stats"])?;
    let data = &stats["data"];
    assert_eq!(data["total"], 6);
    assert_eq!(data["completed"], 2);
    assert_eq!(data["percentage"], 33);
    assert_eq!(
        data["views"],
        json!({"inbox": 4, "today": 1, "upcoming": 1, "completed": 2})
    );
    Ok(())
}

#[test]
fn stats_on_empty_store_are_zero() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnv::new();
    let stats = env.json(&["stats"])?;
    assert_eq!(stats["data"]["total"], 0);
    assert_eq!(stats["data"]["percentage"], 0);
    Ok(())
}

#[test]
fn analytics_compares_calendar_weeks() -> Result<(), Box<dyn std::error::Error>> {
    let env = seeded()?;
    let analytics = env.json(&["analytics"])?;
    let data = &analytics["data"];

    assert_eq!(data["total"], 6);
    assert_eq!(data["completed"], 2);
    assert_eq!(data["in_progress"], 1);
    assert_eq!(data["todo"], 3);
    assert_eq!(data["overdue"], 1);
    assert_eq!(data["this_week_completed"], 1);
    assert_eq!(data["last_week_completed"], 1);
    assert_eq!(data["weekly_growth"].as_f64(), Some(0.0));
    assert_eq!(data["priority"], json!({"high": 2, "medium": 2, "low": 2}));

    let trend = data["daily_trend"].as_array().ok_or("missing trend")?;
    assert_eq!(trend.len(), 7);
    assert_eq!(trend[0]["date"], "2025-02-27");
    assert_eq!(trend[6]["date"], "2025-03-05");
    let completed: Vec<u64> = trend
        .iter()
        .filter_map(|day| day["completed"].as_u64())
        .collect();
    assert_eq!(completed, vec![0, 0, 0, 0, 0, 1, 0]);

    let rate = data["completion_rate"].as_f64().ok_or("missing rate")?;
    assert!((rate - 100.0 / 3.0).abs() < 1e-9);

    assert_eq!(data["workload"]["risk"], "low");
    assert_eq!(data["workload"]["overdue"], 1);
    assert_eq!(data["workload"]["high_priority_open"], 1);
    Ok(())
}

#[test]
fn analytics_human_output_has_workload() -> Result<(), Box<dyn std::error::Error>> {
    let env = seeded()?;
    env.st()
        .arg("analytics")
        .assert()
        .success()
        .stdout(contains("Analytics"))
        .stdout(contains("Overdue: 1"))
        .stdout(contains("Workload: low"));
    Ok(())
}
