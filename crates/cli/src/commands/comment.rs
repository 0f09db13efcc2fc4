//! `comment add|edit`.

use clap::Subcommand;
use core_error::ClientError;
use core_output::Sink;
use core_transport::{CancellationToken, Client};
use serde_json::Value;

use crate::commands::{render_body_field, resolve_body_arg, wrap_markdown_body};
use crate::error::CliResult;

#[derive(Subcommand)]
pub enum CommentCommand {
    /// Add a comment to an issue.
    Add {
        key: String,
        /// Markdown comment body, or `-` to read from stdin.
        body: String,
    },
    /// Edit an existing comment.
    Edit {
        key: String,
        id: String,
        /// Markdown comment body, or `-` to read from stdin.
        body: String,
    },
}

pub async fn run(cmd: CommentCommand, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<()> {
    match cmd {
        CommentCommand::Add { key, body } => add(&key, &body, client, sink, cancel).await,
        CommentCommand::Edit { key, id, body } => edit(&key, &id, &body, client, sink, cancel).await,
    }
}

async fn add(key: &str, body_arg: &str, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<()> {
    let markdown = resolve_body_arg(body_arg)?;
    let body = wrap_markdown_body(&markdown);

    if sink.is_dry_run() {
        sink.dry_run_descriptor(body, || format!("add comment to {key}"));
        return Ok(());
    }

    let path = format!("/rest/api/3/issue/{key}/comment");
    let payload = serde_json::to_vec(&body)
        .map_err(|e| ClientError::User(format!("failed to encode request body: {e}")))?;
    let bytes = client.post(&path, payload, cancel).await?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::User(format!("malformed comment response: {e}")))?;
    sink.success(value.clone(), || render_comment(&value, key));
    Ok(())
}

async fn edit(
    key: &str,
    id: &str,
    body_arg: &str,
    client: &Client,
    sink: &Sink,
    cancel: &CancellationToken,
) -> CliResult<()> {
    let markdown = resolve_body_arg(body_arg)?;
    let body = wrap_markdown_body(&markdown);

    if sink.is_dry_run() {
        sink.dry_run_descriptor(body, || format!("edit comment {id} on {key}"));
        return Ok(());
    }

    let path = format!("/rest/api/3/issue/{key}/comment/{id}");
    let payload = serde_json::to_vec(&body)
        .map_err(|e| ClientError::User(format!("failed to encode request body: {e}")))?;
    let bytes = client.put(&path, payload, cancel).await?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::User(format!("malformed comment response: {e}")))?;
    sink.success(value.clone(), || render_comment(&value, key));
    Ok(())
}

/// Render a comment's DocFmt `body` back to Markdown for human display,
/// prefixed with the issue key and comment id it belongs to.
fn render_comment(value: &Value, key: &str) -> String {
    let id = value.get("id").and_then(Value::as_str).unwrap_or("?");
    let body = comment_markdown(value);
    let mut out = format!("{key} comment {id}");
    if !body.trim().is_empty() {
        out.push('\n');
        out.push_str(body.trim_end());
    }
    out
}

/// Render a comment's DocFmt `body` back to Markdown.
fn comment_markdown(value: &Value) -> String {
    render_body_field(value, "body")
}
