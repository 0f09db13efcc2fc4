//! `link create|delete`.

use clap::Subcommand;
use core_error::ClientError;
use core_output::Sink;
use core_transport::{CancellationToken, Client};

use crate::error::CliResult;

#[derive(Subcommand)]
pub enum LinkCommand {
    /// Link two issues.
    Create {
        from: String,
        to: String,
        #[arg(long = "type")]
        link_type: String,
    },
    /// Remove a link by its id.
    Delete { id: String },
}

pub async fn run(cmd: LinkCommand, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<()> {
    match cmd {
        LinkCommand::Create { from, to, link_type } => create(&from, &to, &link_type, client, sink, cancel).await,
        LinkCommand::Delete { id } => delete(&id, client, sink, cancel).await,
    }
}

async fn create(
    from: &str,
    to: &str,
    link_type: &str,
    client: &Client,
    sink: &Sink,
    cancel: &CancellationToken,
) -> CliResult<()> {
    core_metadata::validate_link_type(client, link_type, cancel).await?;

    let body = serde_json::json!({
        "type": { "name": link_type },
        "inwardIssue": { "key": from },
        "outwardIssue": { "key": to },
    });

    if sink.is_dry_run() {
        sink.dry_run_descriptor(body, || format!("link {from} -> {to} ({link_type})"));
        return Ok(());
    }

    let payload = serde_json::to_vec(&body)
        .map_err(|e| ClientError::User(format!("failed to encode request body: {e}")))?;
    client.post("/rest/api/3/issueLink", payload, cancel).await?;
    sink.success(
        serde_json::json!({"from": from, "to": to, "type": link_type}),
        || format!("linked {from} -> {to} ({link_type})"),
    );
    Ok(())
}

async fn delete(id: &str, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<()> {
    if sink.is_dry_run() {
        sink.dry_run_descriptor(serde_json::json!({"id": id}), || format!("delete link {id}"));
        return Ok(());
    }
    let path = format!("/rest/api/3/issueLink/{id}");
    client.delete(&path, cancel).await?;
    sink.success(serde_json::json!({"id": id, "deleted": true}), || format!("deleted link {id}"));
    Ok(())
}
