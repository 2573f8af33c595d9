#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Wednesday morning, UTC.
pub const NOW: &str = "2025-03-05T08:00:00Z";

pub const TASKS_FILE: &str = "smart-task-manager-tasks.json";

/// Isolated data dir, config dir and clock for one test.
pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.store_dir().join(TASKS_FILE)
    }

    /// `st` pinned to [`NOW`] in UTC, reading and writing only inside the tempdir.
    pub fn st(&self) -> Command {
        let mut cmd = Command::cargo_bin("st").expect("binary");
        cmd.env_remove("ST_CONFIG")
            .env_remove("RUST_LOG")
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("XDG_DATA_HOME", self.path().join("share"))
            .env("TZ", "UTC")
            .env("ST_NOW", NOW)
            .env("ST_STORE", self.store_dir());
        cmd
    }

    /// Run `st --json <args>` and return the parsed envelope.
    pub fn json(&self, args: &[&str]) -> Result<Value, Box<dyn std::error::Error>> {
        let output = self.st().arg("--json").args(args).output()?;
        let value: Value = serde_json::from_slice(&output.stdout)?;
        Ok(value)
    }

    /// Create a task and return its id.
    pub fn add(&self, args: &[&str]) -> Result<String, Box<dyn std::error::Error>> {
        let mut full = vec!["add"];
        full.extend_from_slice(args);
        let value = self.json(&full)?;
        let id = value["data"]["id"]
            .as_str()
            .ok_or("missing id in add output")?
            .to_string();
        Ok(id)
    }

    pub fn write_tasks(&self, contents: &str) -> std::io::Result<()> {
        fs::create_dir_all(self.store_dir())?;
        fs::write(self.tasks_path(), contents)
    }

    pub fn read_tasks(&self) -> Result<Value, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(self.tasks_path())?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn write_config(&self, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.path().join("st.toml");
        fs::write(&path, contents)?;
        Ok(path)
    }
}

/// A stored task record in the on-disk format.
pub fn task_record(
    id: &str,
    title: &str,
    priority: &str,
    status: &str,
    deadline: &str,
    updated_at: &str,
) -> Value {
    serde_json::json!({
        "id": id,
        "title": title,
        "description": "",
        "priority": priority,
        "status": status,
        "deadline": deadline,
        "createdAt": "2025-02-20T09:00:00Z",
        "updatedAt": updated_at,
    })
}

pub fn ids(tasks: &Value) -> Vec<String> {
    tasks
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|task| task["id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
