//! Entry point for `jira`: a non-interactive, scriptable client for the
//! remote issue-tracking service. Argument parsing and per-command wiring
//! are collaborators around the core (§1 Out of scope); this binary is the
//! thin shell that loads configuration, builds the transport, dispatches
//! to a command handler, and maps the result to a process exit code.

mod commands;
mod config;
mod error;

use clap::{Parser, Subcommand};
use core_error::ErrorCategory;
use core_output::Sink;
use core_transport::CancellationToken;
use tracing::info;

use crate::commands::{agile, attachment, batch, comment, fields, issue, link, search};
use crate::error::{CliError, CliResult};

#[derive(Parser)]
#[command(name = "jira", version, about = "A scriptable client for the remote issue tracker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit machine-readable JSON instead of human text.
    #[arg(long, global = true)]
    json: bool,
    /// Suppress success payloads on stdout (errors still go to stderr).
    #[arg(long, global = true)]
    quiet: bool,
    /// Print what would happen without making any transport calls.
    #[arg(long, global = true)]
    dry_run: bool,
    /// Force monochrome output even on a TTY.
    #[arg(long, global = true)]
    no_color: bool,
    /// Emit one verbose HTTP log line per request to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the authenticated user (connectivity check).
    Whoami,
    /// Work with issues.
    Issue {
        #[command(subcommand)]
        action: issue::IssueCommand,
    },
    /// Work with comments.
    Comment {
        #[command(subcommand)]
        action: comment::CommentCommand,
    },
    /// Search issues by JQL.
    Search(search::SearchArgs),
    /// Work with issue links.
    Link {
        #[command(subcommand)]
        action: link::LinkCommand,
    },
    /// Discover valid field values.
    Fields {
        #[command(subcommand)]
        action: fields::FieldsCommand,
    },
    /// Work with attachments.
    Attachment {
        #[command(subcommand)]
        action: attachment::AttachmentCommand,
    },
    /// Work with agile boards.
    Board {
        #[command(subcommand)]
        action: agile::BoardCommand,
    },
    /// Work with sprints.
    Sprint {
        #[command(subcommand)]
        action: agile::SprintCommand,
    },
    /// Run an operation over a batch of issue keys read from stdin.
    Batch {
        #[command(subcommand)]
        action: batch::BatchCommand,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let sink = Sink::new(cli.json, cli.quiet, cli.no_color, cli.dry_run);
    let cancel = CancellationToken::new();

    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watcher.cancel();
        }
    });

    let category = match run(cli, &sink, &cancel).await {
        Ok(category) => category,
        Err(e) => {
            e.report(&sink);
            e.category()
        }
    };

    std::process::exit(category.exit_code());
}

async fn run(cli: Cli, sink: &Sink, cancel: &CancellationToken) -> CliResult<ErrorCategory> {
    let env = config::EnvConfig::from_env().map_err(CliError::from)?;
    let transport_config =
        core_transport::Config::new(env.base_url.as_str(), env.email.as_str(), env.token.as_str()).with_verbose(cli.verbose);
    let client = core_transport::Client::new(transport_config).map_err(CliError::from)?;

    info!(target: "jira_cli", command = ?std::env::args().nth(1), "dispatch");

    match cli.command {
        Commands::Whoami => {
            let bytes = client.get("/rest/api/3/myself", cancel).await.map_err(CliError::from)?;
            let value: serde_json::Value = serde_json::from_slice(&bytes)
                .map_err(|e| CliError::from(anyhow::anyhow!("malformed /myself response: {e}")))?;
            sink.success(value.clone(), || {
                value
                    .get("displayName")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("unknown user")
                    .to_string()
            });
            Ok(ErrorCategory::Success)
        }
        Commands::Issue { action } => {
            issue::run(action, &client, sink, env.default_project.as_deref(), cancel).await?;
            Ok(ErrorCategory::Success)
        }
        Commands::Comment { action } => {
            comment::run(action, &client, sink, cancel).await?;
            Ok(ErrorCategory::Success)
        }
        Commands::Search(args) => {
            search::run(args, &client, sink, cancel).await?;
            Ok(ErrorCategory::Success)
        }
        Commands::Link { action } => {
            link::run(action, &client, sink, cancel).await?;
            Ok(ErrorCategory::Success)
        }
        Commands::Fields { action } => {
            fields::run(action, &client, sink, cancel).await?;
            Ok(ErrorCategory::Success)
        }
        Commands::Attachment { action } => {
            attachment::run(action, &client, sink, cancel).await?;
            Ok(ErrorCategory::Success)
        }
        Commands::Board { action } => {
            agile::run_board(action, &client, sink, cancel).await?;
            Ok(ErrorCategory::Success)
        }
        Commands::Sprint { action } => {
            agile::run_sprint(action, &client, sink, cancel).await?;
            Ok(ErrorCategory::Success)
        }
        Commands::Batch { action } => batch::run(action, &client, sink, cancel).await,
    }
}
