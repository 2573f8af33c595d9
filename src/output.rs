//! Shared output formatting for st CLI commands.
//!
//! Every command prints either one JSON envelope (`--json`) or a short human
//! report built from a [`HumanOutput`]. Errors use the same envelope with
//! `status = "error"` so scripts only ever parse one shape.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "st.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
enum Outcome {
    Success,
    Error,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "no_items")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "no_items")]
    next_steps: &'a [String],
}

fn no_items(items: &&[String]) -> bool {
    items.is_empty()
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl<T: Serialize> Envelope<'_, T> {
    fn print(&self) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

/// Human report: a header line followed by optional bulleted sections.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    /// `- key: value` under "Summary". An empty value prints the key alone.
    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }

    fn sections(&self) -> [(&'static str, &[String]); 3] {
        [
            ("Details", self.details.as_slice()),
            ("Warnings", self.warnings.as_slice()),
            ("Next steps", self.next_steps.as_slice()),
        ]
    }
}

impl fmt::Display for HumanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header)?;
        if !self.summary.is_empty() {
            f.write_str("\n\nSummary:")?;
            for (key, value) in &self.summary {
                if value.is_empty() {
                    write!(f, "\n- {key}")?;
                } else {
                    write!(f, "\n- {key}: {value}")?;
                }
            }
        }
        for (title, items) in self.sections() {
            if items.is_empty() {
                continue;
            }
            write!(f, "\n\n{title}:")?;
            for item in items {
                write!(f, "\n- {item}")?;
            }
        }
        Ok(())
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let (warnings, next_steps) = match human {
            Some(h) => (h.warnings.as_slice(), h.next_steps.as_slice()),
            None => (&[][..], &[][..]),
        };
        return Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Outcome::Success,
            data: Some(data),
            error: None,
            warnings,
            next_steps,
        }
        .print();
    }

    match human {
        Some(human) if !options.quiet => println!("{human}"),
        _ => {}
    }
    Ok(())
}

/// One compact JSON object per line, for streaming commands.
pub fn emit_json_line<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    if json {
        return Envelope::<()> {
            schema_version: SCHEMA_VERSION,
            command,
            status: Outcome::Error,
            data: None,
            error: Some(ErrorBody {
                message: err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            }),
            warnings: &[],
            next_steps: &next_steps,
        }
        .print();
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

pub fn infer_command_name_from_args() -> String {
    infer_command_name(std::env::args().skip(1))
}

/// First non-flag argument, skipping the values of global options.
pub fn infer_command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--store" | "--config" | "--now" => {
                args.next();
            }
            flag if flag.starts_with('-') => {}
            _ => return arg,
        }
    }
    "st".to_string()
}

fn error_kind(err: &Error) -> &'static str {
    if err.exit_code() == crate::error::exit_codes::USER_ERROR {
        "user_error"
    } else {
        "operation_failed"
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::TaskNotFound(_) => vec!["st list --view all".to_string()],
        Error::AmbiguousTaskId { matches, .. } => matches
            .iter()
            .take(3)
            .map(|id| format!("st show {id}"))
            .collect(),
        Error::InvalidConfig(_) => vec!["fix st.toml then retry".to_string()],
        Error::LockFailed(_) => vec!["retry once other st processes finish".to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn command_name_skips_global_option_values() {
        assert_eq!(infer_command_name(args(&["--json", "list"])), "list");
        assert_eq!(
            infer_command_name(args(&["--store", "/tmp/x", "done", "01j"])),
            "done"
        );
        assert_eq!(infer_command_name(args(&["--quiet"])), "st");
    }

    #[test]
    fn human_output_has_sections() {
        let mut out = HumanOutput::new("st list: 2 tasks");
        out.push_summary("view", "all");
        out.push_detail("first");
        out.push_warning("storage unavailable");
        out.push_next_step("st add \"...\"");
        let text = out.to_string();
        assert!(text.starts_with("st list: 2 tasks\n\nSummary:"));
        assert!(text.contains("Summary:\n- view: all"));
        assert!(text.contains("Details:\n- first"));
        assert!(text.contains("Warnings:\n- storage unavailable"));
        assert!(text.ends_with("Next steps:\n- st add \"...\""));
    }

    #[test]
    fn header_only_report_has_no_sections() {
        assert_eq!(HumanOutput::new("Board").to_string(), "Board");
    }

    #[test]
    fn error_steps_point_at_candidates() {
        let err = Error::AmbiguousTaskId {
            prefix: "01j".to_string(),
            matches: vec!["01ja".into(), "01jb".into(), "01jc".into(), "01jd".into()],
        };
        assert_eq!(
            error_next_steps(&err),
            vec!["st show 01ja", "st show 01jb", "st show 01jc"]
        );
        assert_eq!(error_kind(&err), "user_error");
        assert_eq!(error_kind(&Error::Insight("x".into())), "operation_failed");
    }
}
