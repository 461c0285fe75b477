//! Command dispatch and the shared per-invocation context.

pub mod auth;
pub mod config_cmd;
pub mod projects;
pub mod tasks;
pub mod users;
pub mod util;

use taskboard_config::Config;
use taskboard_core::{ApiClient, ClientConfig, FormController, FormData, Session};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;

/// Everything a command handler needs: the API client, the session, and
/// the output preferences resolved from flags and config.
pub struct Ctx {
    pub client: ApiClient,
    pub session: Session,
    pub client_config: ClientConfig,
    pub output: OutputFormat,
    pub quiet: bool,
    pub yes: bool,
}

impl Ctx {
    pub fn new(cfg: &Config, global: &GlobalOpts) -> Result<Self, CliError> {
        let client_config = cfg.client_config()?;
        let client = client_config.build_client(cfg.token_store()?)?;
        Ok(Self {
            session: Session::new(client.clone()),
            client,
            client_config,
            output: config::output_format(global, cfg),
            quiet: global.quiet,
            yes: global.yes,
        })
    }

    /// A form bound to this invocation's client and form defaults.
    pub fn form<T: FormData>(&self, initial: T) -> FormController<T> {
        FormController::with_options(
            self.client.clone(),
            initial,
            self.client_config.form_options(),
        )
    }
}

/// Route a backend command to its handler.
pub async fn dispatch(cmd: Command, ctx: &Ctx) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(args, ctx).await,
        Command::Register(args) => auth::register(args, ctx).await,
        Command::Logout => auth::logout(ctx).await,
        Command::Whoami => auth::whoami(ctx).await,
        Command::Projects(args) => projects::handle(args, ctx).await,
        Command::Tasks(args) => tasks::handle(args, ctx).await,
        Command::Users(args) => users::handle(args, ctx).await,
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
