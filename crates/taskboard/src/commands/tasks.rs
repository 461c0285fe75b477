//! Task command handlers.

use serde_json::{Map, Value};
use tabled::Tabled;

use taskboard_core::SubmitOptions;
use taskboard_core::models::{ListQuery, Task, TaskInput, TaskQuery};

use crate::cli::{OutputFormat, TasksArgs, TasksCommand};
use crate::error::CliError;
use crate::output;

use super::{Ctx, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Assignee")]
    assignee: String,
}

impl From<&Task> for TaskRow {
    fn from(t: &Task) -> Self {
        Self {
            id: t.id,
            title: t.title.clone(),
            status: t.status.to_string(),
            assignee: t
                .assigned_to
                .as_ref()
                .map(|u| u.name.clone())
                .unwrap_or_default(),
        }
    }
}

fn detail(t: &Task) -> String {
    let assignee = t
        .assigned_to
        .as_ref()
        .map_or_else(|| "unassigned".to_owned(), |u| format!("{} <{}>", u.name, u.email));
    format!("#{} {}\nstatus:   {}\nassignee: {}", t.id, t.title, t.status, assignee)
}

fn print_task(ctx: &Ctx, task: &Task) {
    let out = output::render_single(ctx.output, task, detail, |t| t.id.to_string());
    output::print_output(&out, ctx.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: TasksArgs, ctx: &Ctx) -> Result<(), CliError> {
    let project = args.project;
    match args.command {
        TasksCommand::List {
            list,
            status,
            assignee,
        } => {
            let query = TaskQuery {
                list: ListQuery {
                    page: Some(list.page),
                    per_page: Some(list.per_page),
                    search: list.search,
                },
                status,
                assigned_to_id: assignee,
            };
            let page = ctx.client.list_tasks(project, &query).await?;
            let out = output::render_list(ctx.output, &page.data, |t| TaskRow::from(t), |t| {
                t.id.to_string()
            });
            output::print_output(&out, ctx.quiet);
            if ctx.output == OutputFormat::Table {
                output::print_status(&output::page_footer(&page.meta), ctx.quiet);
            }
            Ok(())
        }

        TasksCommand::Create {
            title,
            status,
            assignee,
        } => {
            let form = ctx.form(TaskInput {
                title,
                status,
                assigned_to_id: assignee,
            });
            let outcome = form
                .post(&format!("projects/{project}/tasks"), SubmitOptions::new())
                .await;
            if let Some(response) = util::into_response(outcome)? {
                let task: Task = response.data()?;
                output::print_status(&format!("Task #{} created", task.id), ctx.quiet);
                print_task(ctx, &task);
            }
            Ok(())
        }

        TasksCommand::Update {
            id,
            title,
            status,
            assignee,
            unassign,
        } => {
            // No single-task endpoint to prefill from, so the form starts
            // empty and carries only the fields being changed.
            let form = ctx.form(Map::<String, Value>::new());
            if let Some(title) = title {
                form.set_field("title", title)?;
            }
            if let Some(status) = status {
                form.set_field("status", status)?;
            }
            if let Some(assignee) = assignee {
                form.set_field("assigned_to_id", assignee)?;
            } else if unassign {
                form.set_field("assigned_to_id", Value::Null)?;
            }
            if !form.is_dirty() {
                output::print_status("Nothing to update", ctx.quiet);
                return Ok(());
            }

            let outcome = form
                .put(&format!("projects/{project}/tasks/{id}"), SubmitOptions::new())
                .await;
            if let Some(response) = util::into_response(outcome)? {
                let task: Task = response.data()?;
                output::print_status(&format!("Task #{id} updated"), ctx.quiet);
                print_task(ctx, &task);
            }
            Ok(())
        }

        TasksCommand::Delete { id } => {
            if !util::confirm(&format!("Delete task #{id}?"), ctx.yes)? {
                return Ok(());
            }
            ctx.client.delete_task(project, id).await?;
            output::print_status(&format!("Task #{id} deleted"), ctx.quiet);
            Ok(())
        }
    }
}
