use std::path::PathBuf;

use serde_json::Value;
use smart_tasks::error::{exit_codes, Error, JsonError};

#[test]
fn exit_code_user_error() {
    let err = Error::InvalidArgument("bad input".to_string());
    assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    assert_eq!(
        Error::TaskNotFound("01j".to_string()).exit_code(),
        exit_codes::USER_ERROR
    );
}

#[test]
fn exit_code_operation_failed() {
    let err = Error::OperationFailed("boom".to_string());
    assert_eq!(err.exit_code(), exit_codes::OPERATION_FAILED);
    let lock = Error::LockFailed(PathBuf::from("tasks.json.lock"));
    assert_eq!(lock.exit_code(), exit_codes::OPERATION_FAILED);
    let insight = Error::Insight("offline".to_string());
    assert_eq!(insight.exit_code(), exit_codes::OPERATION_FAILED);
}

#[test]
fn details_include_ambiguous_matches() {
    let err = Error::AmbiguousTaskId {
        prefix: "01j".to_string(),
        matches: vec!["01ja".to_string(), "01jb".to_string()],
    };
    assert!(err.to_string().contains("2 matches"));
    let details = err.details().expect("details");
    assert_eq!(details["prefix"], Value::String("01j".to_string()));
    assert_eq!(details["matches"].as_array().map(Vec::len), Some(2));
}

#[test]
fn json_error_includes_details() {
    let err = Error::InvalidConfig("bad config".to_string());
    let json = JsonError::from(&err);
    assert_eq!(json.code, exit_codes::USER_ERROR);
    let details = json.details.expect("details");
    assert_eq!(details["message"], Value::String("bad config".to_string()));
}

#[test]
fn json_error_for_missing_task() {
    let err = Error::TaskNotFound("01jabc".to_string());
    let json = JsonError::from(&err);
    assert!(json.error.contains("Task not found"));
    assert_eq!(json.details.expect("details")["id"], "01jabc");
}
