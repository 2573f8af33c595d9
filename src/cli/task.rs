//! st task command implementations.

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use crate::cli::{load_context, parse_deadline, Context, Globals};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::quick_add::parse_quick;
use crate::task::{NewTask, Priority, Status, Task, TaskPatch};
use crate::views::{self, is_overdue, View};

pub struct AddOptions {
    pub title: String,
    pub description: Option<String>,
    pub priority: String,
    pub deadline: String,
    pub globals: Globals,
}

pub struct QuickOptions {
    pub text: String,
    pub globals: Globals,
}

pub struct ListOptions {
    pub view: String,
    pub search: Option<String>,
    pub priority: Option<String>,
    pub globals: Globals,
}

pub struct ShowOptions {
    pub id: String,
    pub globals: Globals,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub status: Option<String>,
    pub deadline: Option<String>,
    pub globals: Globals,
}

pub struct MoveOptions {
    pub id: String,
    pub status: String,
    pub globals: Globals,
}

pub struct DoneOptions {
    pub id: String,
    pub globals: Globals,
}

pub struct RmOptions {
    pub id: String,
    pub globals: Globals,
}

#[derive(Serialize)]
struct TaskListOutput<'a> {
    view: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
    total: usize,
    tasks: Vec<&'a Task>,
}

pub fn run_add(options: AddOptions) -> Result<()> {
    let mut ctx = load_context(&options.globals)?;
    let now = ctx.now();
    let priority: Priority = options.priority.parse()?;
    let deadline = parse_deadline(&options.deadline, &now)?;
    let mut data = NewTask::new(options.title.trim(), priority, deadline);
    if let Some(description) = options.description {
        data = data.description(description);
    }
    data.validate()?;

    let task = ctx.store.create(data);
    emit_task(&ctx, &options.globals, "add", "Task created", &task)
}

pub fn run_quick(options: QuickOptions) -> Result<()> {
    let mut ctx = load_context(&options.globals)?;
    let data = parse_quick(&options.text, ctx.clock.now())?;
    let task = ctx.store.create(data);
    emit_task(&ctx, &options.globals, "quick", "Task created", &task)
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let ctx = load_context(&options.globals)?;
    let now = ctx.now();
    let priority = options
        .priority
        .as_deref()
        .map(str::parse::<Priority>)
        .transpose()?;
    let search = options.search.as_deref().map(str::trim);
    let in_view = views::filter_by_view(ctx.store.list(), &options.view, &now);
    let mut tasks = views::search(in_view, search.unwrap_or_default(), priority);
    views::sort_for_display(&mut tasks);

    let view = View::from_name(&options.view).unwrap_or(View::All);
    let mut human = HumanOutput::new(view.title());
    push_context_warnings(&mut human, &ctx);
    if View::from_name(&options.view).is_none() {
        human.push_warning(format!("unknown view '{}'; showing all tasks", options.view));
    }
    if let Some(term) = search.filter(|term| !term.is_empty()) {
        human.push_summary("Search", term);
    }
    if let Some(priority) = priority {
        human.push_summary("Priority", priority.to_string());
    }
    human.push_summary("Total", tasks.len().to_string());
    for task in &tasks {
        human.push_detail(task_line(task, &now));
    }
    if tasks.is_empty() {
        human.push_detail(view.description());
        if ctx.store.is_empty() {
            human.push_next_step("st add \"...\" --deadline tomorrow");
        }
    }

    let output = TaskListOutput {
        view: view.name(),
        title: view.title(),
        search,
        priority,
        total: tasks.len(),
        tasks,
    };
    emit_success(output_options(&options.globals), "list", &output, Some(&human))
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let ctx = load_context(&options.globals)?;
    let id = ctx.store.resolve(&options.id)?;
    let task = ctx
        .store
        .get(&id)
        .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

    let now = ctx.now();
    let mut human = HumanOutput::new(format!("Task {}", task.id));
    push_context_warnings(&mut human, &ctx);
    push_task_summary(&mut human, task, &now);
    if !task.description.is_empty() {
        human.push_detail(task.description.clone());
    }
    emit_success(output_options(&options.globals), "show", task, Some(&human))
}

pub fn run_edit(options: EditOptions) -> Result<()> {
    let mut ctx = load_context(&options.globals)?;
    let now = ctx.now();
    let patch = TaskPatch {
        title: options.title,
        description: options.description,
        priority: options.priority.as_deref().map(str::parse::<Priority>).transpose()?,
        status: options.status.as_deref().map(str::parse).transpose()?,
        deadline: options
            .deadline
            .as_deref()
            .map(|raw| parse_deadline(raw, &now))
            .transpose()?,
    };
    if patch.is_empty() {
        return Err(Error::InvalidArgument(
            "nothing to change (pass --title, --description, --priority, --status or --deadline)"
                .to_string(),
        ));
    }

    let id = ctx.store.resolve(&options.id)?;
    let task = ctx.store.update(&id, patch)?;
    emit_task(&ctx, &options.globals, "edit", "Task updated", &task)
}

pub fn run_move(options: MoveOptions) -> Result<()> {
    let mut ctx = load_context(&options.globals)?;
    let status: Status = options.status.parse()?;
    let id = ctx.store.resolve(&options.id)?;
    let task = ctx.store.set_status(&id, status)?;
    emit_task(&ctx, &options.globals, "move", "Task moved", &task)
}

pub fn run_done(options: DoneOptions) -> Result<()> {
    let mut ctx = load_context(&options.globals)?;
    let id = ctx.store.resolve(&options.id)?;
    let task = ctx.store.complete(&id)?;
    emit_task(&ctx, &options.globals, "done", "Task completed", &task)
}

pub fn run_rm(options: RmOptions) -> Result<()> {
    let mut ctx = load_context(&options.globals)?;
    let id = ctx.store.resolve(&options.id)?;
    let task = ctx.store.delete(&id)?;
    emit_task(&ctx, &options.globals, "rm", "Task deleted", &task)
}

fn emit_task(ctx: &Context, globals: &Globals, command: &str, header: &str, task: &Task) -> Result<()> {
    let now = ctx.now();
    let mut human = HumanOutput::new(header);
    push_context_warnings(&mut human, ctx);
    push_task_summary(&mut human, task, &now);
    emit_success(output_options(globals), command, task, Some(&human))
}

pub(crate) fn output_options(globals: &Globals) -> OutputOptions {
    OutputOptions {
        json: globals.json,
        quiet: globals.quiet,
    }
}

pub(crate) fn push_context_warnings(human: &mut HumanOutput, ctx: &Context) {
    for warning in &ctx.warnings {
        human.push_warning(warning.clone());
    }
    if let Some(err) = ctx.store.last_save_error() {
        human.push_warning(format!("change kept for this run only; saving failed: {err}"));
    }
}

fn push_task_summary(human: &mut HumanOutput, task: &Task, now: &DateTime<Local>) {
    human.push_summary("ID", task.id.to_string());
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.status.to_string());
    human.push_summary("Priority", task.priority.to_string());
    let mut due = format_when(&task.deadline, now);
    if is_overdue(task, now) {
        due.push_str(" (overdue)");
    }
    human.push_summary("Deadline", due);
}

/// `[status][priority] id title (due ...)`
pub(crate) fn task_line<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut line = format!(
        "[{}][{}] {} {} (due {})",
        task.status,
        task.priority,
        task.id,
        task.title,
        format_when(&task.deadline, now)
    );
    if is_overdue(task, now) {
        line.push_str(" OVERDUE");
    }
    line
}

fn format_when<Tz: TimeZone>(at: &DateTime<chrono::Utc>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.with_timezone(&now.timezone())
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskId;
    use chrono::{Duration, Utc};

    #[test]
    fn task_line_marks_overdue_open_tasks() {
        let now = Utc.with_ymd_and_hms(2025, 3, 5, 8, 0, 0).unwrap();
        let mut task = Task {
            id: TaskId::from("01jtest"),
            title: "File taxes".to_string(),
            description: String::new(),
            priority: Priority::High,
            status: Status::Todo,
            deadline: now - Duration::hours(1),
            created_at: now - Duration::days(1),
            updated_at: now - Duration::days(1),
        };
        assert_eq!(
            task_line(&task, &now),
            "[Todo][High] 01jtest File taxes (due 2025-03-05 07:00) OVERDUE"
        );
        task.status = Status::Done;
        assert!(!task_line(&task, &now).contains("OVERDUE"));
    }
}
