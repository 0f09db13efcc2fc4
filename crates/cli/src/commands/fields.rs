//! `fields priorities|issue-types|statuses|link-types`: metadata discovery,
//! surfaced directly (the catalogues component G validates candidates
//! against).

use clap::Subcommand;
use core_output::Sink;
use core_transport::{CancellationToken, Client};

use crate::error::CliResult;

#[derive(Subcommand)]
pub enum FieldsCommand {
    /// List valid priority names.
    Priorities,
    /// List valid issue-type names for a project.
    IssueTypes { project: String },
    /// List valid status names for a project, deduplicated across issue types.
    Statuses { project: String },
    /// List valid issue-link-type names.
    LinkTypes,
}

pub async fn run(cmd: FieldsCommand, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<()> {
    let names = match &cmd {
        FieldsCommand::Priorities => core_metadata::priority_options(client, cancel).await?,
        FieldsCommand::IssueTypes { project } => core_metadata::issue_type_options(client, project, cancel).await?,
        FieldsCommand::Statuses { project } => core_metadata::status_options(client, project, cancel).await?,
        FieldsCommand::LinkTypes => core_metadata::link_type_options(client, cancel).await?,
    };

    sink.success(serde_json::json!({ "options": names }), || {
        if names.is_empty() {
            "no options returned".to_string()
        } else {
            names.join("\n")
        }
    });
    Ok(())
}
