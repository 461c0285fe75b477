//! User listing.

use tabled::Tabled;

use taskboard_core::models::{ListQuery, User};

use crate::cli::{OutputFormat, UsersArgs, UsersCommand};
use crate::error::CliError;
use crate::output;

use super::Ctx;

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Email")]
    email: String,
    #[tabled(rename = "Role")]
    role: String,
}

impl From<&User> for UserRow {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            name: u.name.clone(),
            email: u.email.clone(),
            role: u.role.to_string(),
        }
    }
}

pub async fn handle(args: UsersArgs, ctx: &Ctx) -> Result<(), CliError> {
    match args.command {
        UsersCommand::List(list) => {
            let query = ListQuery {
                page: Some(list.page),
                per_page: Some(list.per_page),
                search: list.search,
            };
            let page = ctx.client.list_users(&query).await?;
            let out = output::render_list(ctx.output, &page.data, |u| UserRow::from(u), |u| {
                u.email.clone()
            });
            output::print_output(&out, ctx.quiet);
            if ctx.output == OutputFormat::Table {
                output::print_status(&output::page_footer(&page.meta), ctx.quiet);
            }
            Ok(())
        }
    }
}
