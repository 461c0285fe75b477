//! Project command handlers.

use std::sync::Arc;

use tabled::Tabled;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use taskboard_core::models::{ListQuery, Page, Project, ProjectInput};
use taskboard_core::{Debouncer, FormController, SubmitOptions, SubmitOutcome};

use crate::cli::{ListArgs, OutputFormat, ProjectsArgs, ProjectsCommand};
use crate::error::CliError;
use crate::output;

use super::{Ctx, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
}

impl From<&Project> for ProjectRow {
    fn from(p: &Project) -> Self {
        Self {
            id: p.id,
            title: p.title.clone(),
            start: p.start_date.clone(),
            end: p.end_date.clone(),
        }
    }
}

fn detail(p: &Project) -> String {
    let mut out = format!(
        "#{} {}\n{} .. {}",
        p.id, p.title, p.start_date, p.end_date
    );
    if !p.description.is_empty() {
        out.push_str("\n\n");
        out.push_str(&p.description);
    }
    out
}

fn print_page(page: &Page<Project>, format: OutputFormat, quiet: bool) {
    let out = output::render_list(format, &page.data, |p| ProjectRow::from(p), |p| p.id.to_string());
    output::print_output(&out, quiet);
    if format == OutputFormat::Table {
        output::print_status(&output::page_footer(&page.meta), quiet);
    }
}

fn print_project(ctx: &Ctx, project: &Project) {
    let out = output::render_single(ctx.output, project, detail, |p| p.id.to_string());
    output::print_output(&out, ctx.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ProjectsArgs, ctx: &Ctx) -> Result<(), CliError> {
    match args.command {
        ProjectsCommand::List(list) => {
            let page = ctx.client.list_projects(&list_query(&list)).await?;
            print_page(&page, ctx.output, ctx.quiet);
            Ok(())
        }

        ProjectsCommand::Search { per_page } => search(per_page, ctx).await,

        ProjectsCommand::Get { id } => {
            let project = ctx.client.get_project(id).await?;
            print_project(ctx, &project);
            Ok(())
        }

        ProjectsCommand::Create {
            title,
            description,
            start_date,
            end_date,
        } => {
            let form = ctx.form(ProjectInput {
                title,
                description,
                start_date,
                end_date,
            });
            let outcome = form.post("projects", SubmitOptions::new()).await;
            if let Some(response) = util::into_response(outcome)? {
                let project: Project = response.data()?;
                output::print_status(&format!("Project #{} created", project.id), ctx.quiet);
                print_project(ctx, &project);
            }
            Ok(())
        }

        ProjectsCommand::Update {
            id,
            title,
            description,
            start_date,
            end_date,
        } => {
            let current = ctx.client.get_project(id).await?;
            let form = ctx.form(ProjectInput::from(&current));
            let changes = [
                ("title", title),
                ("description", description),
                ("start_date", start_date),
                ("end_date", end_date),
            ];
            for (field, value) in changes {
                if let Some(value) = value {
                    form.set_field(field, value)?;
                }
            }
            if !form.is_dirty() {
                output::print_status("Nothing to update", ctx.quiet);
                return Ok(());
            }

            let outcome = form
                .put(&format!("projects/{id}"), SubmitOptions::new())
                .await;
            if let Some(response) = util::into_response(outcome)? {
                let project: Project = response.data()?;
                output::print_status(&format!("Project #{id} updated"), ctx.quiet);
                print_project(ctx, &project);
            }
            Ok(())
        }

        ProjectsCommand::Delete { id } => {
            if !util::confirm(
                &format!("Delete project #{id} and all of its tasks?"),
                ctx.yes,
            )? {
                return Ok(());
            }
            ctx.client.delete_project(id).await?;
            output::print_status(&format!("Project #{id} deleted"), ctx.quiet);
            Ok(())
        }
    }
}

fn list_query(list: &ListArgs) -> ListQuery {
    ListQuery {
        page: Some(list.page),
        per_page: Some(list.per_page),
        search: list.search.clone(),
    }
}

// ── Debounced search ────────────────────────────────────────────────

/// Read queries from stdin, one per line, and list matching projects.
///
/// Lines arriving within the debounce window of each other collapse into
/// one request for the last of them; a newer query cancels an older one
/// still in flight.
async fn search(per_page: u64, ctx: &Ctx) -> Result<(), CliError> {
    let form = ctx.form(ListQuery {
        page: Some(1),
        per_page: Some(per_page),
        search: None,
    });
    let debouncer = Debouncer::new(ctx.client_config.search_debounce);
    let failure: Arc<std::sync::Mutex<Option<CliError>>> = Arc::default();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last = None;
    while let Some(line) = lines.next_line().await? {
        let query = line.trim().to_owned();
        let form = form.clone();
        let failure = Arc::clone(&failure);
        let (format, quiet) = (ctx.output, ctx.quiet);
        last = Some(debouncer.call(async move {
            if let Err(e) = run_search(&form, query, format, quiet).await {
                *failure.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(e);
            }
        }));
    }

    if let Some(handle) = last {
        // A superseded or cancelled search has nothing to report.
        let _ = handle.await;
    }
    let failure = failure
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .take();
    failure.map_or(Ok(()), Err)
}

async fn run_search(
    form: &FormController<ListQuery>,
    query: String,
    format: OutputFormat,
    quiet: bool,
) -> Result<(), CliError> {
    debug!(%query, "searching projects");
    form.set_field("search", (!query.is_empty()).then_some(query))?;
    match form.get("projects", SubmitOptions::new()).await {
        SubmitOutcome::Cancelled => Ok(()),
        outcome => {
            if let Some(response) = util::into_response(outcome)? {
                let page: Page<Project> = response.json()?;
                print_page(&page, format, quiet);
            }
            Ok(())
        }
    }
}
