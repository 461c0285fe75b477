//! Clap derive structures for the `taskboard` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

use taskboard_core::models::TaskStatus;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// taskboard -- manage projects and tasks from the command line
#[derive(Debug, Parser)]
#[command(
    name = "taskboard",
    version,
    about = "Manage Taskboard projects and tasks from the command line",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file to use instead of the platform default
    #[arg(long, env = "TASKBOARD_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// API base URL (overrides config)
    #[arg(long, short = 'u', global = true)]
    pub base_url: Option<String>,

    /// Output format (overrides config)
    #[arg(long, short = 'o', global = true)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session token
    Login(LoginArgs),

    /// Create an account and log in
    Register(RegisterArgs),

    /// End the session and forget the stored token
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Manage projects
    #[command(alias = "p")]
    Projects(ProjectsArgs),

    /// Manage a project's tasks
    #[command(alias = "t")]
    Tasks(TasksArgs),

    /// List users
    Users(UsersArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared List Arguments ────────────────────────────────────────────

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u64,

    /// Results per page
    #[arg(long, short = 'l', default_value = "10")]
    pub per_page: u64,

    /// Free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (prompted when omitted)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Display name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Account email
    #[arg(long, short = 'e')]
    pub email: String,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

// ── Projects ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProjectsArgs {
    #[command(subcommand)]
    pub command: ProjectsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProjectsCommand {
    /// List projects
    #[command(alias = "ls")]
    List(ListArgs),

    /// Search projects interactively, one query per input line
    Search {
        /// Results per page
        #[arg(long, short = 'l', default_value = "10")]
        per_page: u64,
    },

    /// Show one project
    Get {
        id: u64,
    },

    /// Create a project
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        start_date: String,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end_date: String,
    },

    /// Update a project; only the given fields change
    Update {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
    },

    /// Delete a project
    #[command(alias = "rm")]
    Delete {
        id: u64,
    },
}

// ── Tasks ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TasksArgs {
    /// Project ID
    #[arg(long, short = 'p')]
    pub project: u64,

    #[command(subcommand)]
    pub command: TasksCommand,
}

#[derive(Debug, Subcommand)]
pub enum TasksCommand {
    /// List tasks
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        list: ListArgs,
        /// Filter by status
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
        /// Filter by assignee ID
        #[arg(long)]
        assignee: Option<u64>,
    },

    /// Create a task
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, value_parser = parse_status, default_value = "todo")]
        status: TaskStatus,
        /// Assignee user ID
        #[arg(long)]
        assignee: Option<u64>,
    },

    /// Update a task; only the given fields change
    Update {
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<TaskStatus>,
        /// Assignee user ID
        #[arg(long, conflicts_with = "unassign")]
        assignee: Option<u64>,
        /// Remove the current assignee
        #[arg(long)]
        unassign: bool,
    },

    /// Delete a task
    #[command(alias = "rm")]
    Delete {
        id: u64,
    },
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    s.parse()
        .map_err(|_| format!("expected one of todo, in_progress, done; got '{s}'"))
}

// ── Users ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommand,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List users
    #[command(alias = "ls")]
    List(ListArgs),
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Set one configuration key and save
    Set {
        /// Key, e.g. base_url, output, timeout, insecure, token_storage
        key: String,
        value: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
