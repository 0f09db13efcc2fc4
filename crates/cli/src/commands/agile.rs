//! `board list` / `sprint add-issue`: the agile surface, routed through
//! `agile_get`/`agile_post` rather than the REST base.

use clap::Subcommand;
use core_error::ClientError;
use core_output::Sink;
use core_transport::{CancellationToken, Client};
use serde_json::Value;

use crate::error::CliResult;

#[derive(Subcommand)]
pub enum BoardCommand {
    /// List boards, optionally scoped to a project.
    List {
        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SprintCommand {
    /// Add an issue to a sprint.
    AddIssue { sprint_id: String, key: String },
}

pub async fn run_board(cmd: BoardCommand, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<()> {
    let BoardCommand::List { project } = cmd;
    let path = match &project {
        Some(p) => format!("/rest/agile/1.0/board?projectKeyOrId={p}"),
        None => "/rest/agile/1.0/board".to_string(),
    };
    let bytes = client.agile_get(&path, cancel).await?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::User(format!("malformed board response: {e}")))?;
    sink.success(value.clone(), || {
        let boards = value.get("values").and_then(Value::as_array).cloned().unwrap_or_default();
        boards
            .iter()
            .map(|b| {
                format!(
                    "{}: {}",
                    b.get("id").map(Value::to_string).unwrap_or_default(),
                    b.get("name").and_then(Value::as_str).unwrap_or("")
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    });
    Ok(())
}

pub async fn run_sprint(cmd: SprintCommand, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<()> {
    let SprintCommand::AddIssue { sprint_id, key } = cmd;
    let body = serde_json::json!({ "issues": [key] });

    if sink.is_dry_run() {
        sink.dry_run_descriptor(body, || format!("add {key} to sprint {sprint_id}"));
        return Ok(());
    }

    let path = format!("/rest/agile/1.0/sprint/{sprint_id}/issue");
    let payload = serde_json::to_vec(&body)
        .map_err(|e| ClientError::User(format!("failed to encode request body: {e}")))?;
    client.agile_post(&path, payload, cancel).await?;
    sink.success(
        serde_json::json!({"sprint_id": sprint_id, "key": key}),
        || format!("added {key} to sprint {sprint_id}"),
    );
    Ok(())
}
