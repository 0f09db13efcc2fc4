//! `attachment add|get|delete`.
//!
//! Attachment ownership (whether an attachment id actually belongs to the
//! issue it's addressed through) is not checked client-side — the open
//! question is resolved in DESIGN.md: the remote service's own 404 on a
//! mismatched id is relied on instead.

use std::path::PathBuf;

use clap::Subcommand;
use core_error::ClientError;
use core_output::Sink;
use core_transport::{CancellationToken, Client};
use serde_json::Value;

use crate::error::CliResult;

#[derive(Subcommand)]
pub enum AttachmentCommand {
    /// Upload a file as an attachment on an issue.
    Add { key: String, file: PathBuf },
    /// Download an attachment's content to a local path.
    Get { id: String, out: PathBuf },
    /// Delete an attachment.
    Delete { id: String },
}

pub async fn run(cmd: AttachmentCommand, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<()> {
    match cmd {
        AttachmentCommand::Add { key, file } => add(&key, &file, client, sink, cancel).await,
        AttachmentCommand::Get { id, out } => get(&id, &out, client, sink, cancel).await,
        AttachmentCommand::Delete { id } => delete(&id, client, sink, cancel).await,
    }
}

async fn add(key: &str, file: &PathBuf, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<()> {
    if sink.is_dry_run() {
        sink.dry_run_descriptor(serde_json::json!({"key": key, "file": file.display().to_string()}), || {
            format!("attach {} to {key}", file.display())
        });
        return Ok(());
    }

    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ClientError::User(format!("invalid attachment filename: {}", file.display())))?
        .to_string();
    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| ClientError::User(format!("failed to read {}: {e}", file.display())))?;
    let content_type = guess_content_type(&filename);

    let path = format!("/rest/api/3/issue/{key}/attachments");
    let response = client
        .post_multipart(&path, filename.clone(), content_type, bytes, cancel)
        .await?;
    let value: Value = serde_json::from_slice(&response)
        .map_err(|e| ClientError::User(format!("malformed attachment response: {e}")))?;
    sink.success(value, || format!("attached {filename} to {key}"));
    Ok(())
}

async fn get(id: &str, out: &PathBuf, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<()> {
    if sink.is_dry_run() {
        sink.dry_run_descriptor(serde_json::json!({"id": id, "out": out.display().to_string()}), || {
            format!("download attachment {id} to {}", out.display())
        });
        return Ok(());
    }

    let path = format!("/rest/api/3/attachment/content/{id}");
    let file = tokio::fs::File::create(out)
        .await
        .map_err(|e| ClientError::User(format!("failed to create {}: {e}", out.display())))?;
    client.get_stream(&path, file, cancel).await?;
    sink.success(
        serde_json::json!({"id": id, "saved_to": out.display().to_string()}),
        || format!("saved attachment {id} to {}", out.display()),
    );
    Ok(())
}

async fn delete(id: &str, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<()> {
    if sink.is_dry_run() {
        sink.dry_run_descriptor(serde_json::json!({"id": id}), || format!("delete attachment {id}"));
        return Ok(());
    }
    let path = format!("/rest/api/3/attachment/{id}");
    client.delete(&path, cancel).await?;
    sink.success(serde_json::json!({"id": id, "deleted": true}), || format!("deleted attachment {id}"));
    Ok(())
}

fn guess_content_type(filename: &str) -> String {
    let ext = filename.rsplit('.').next().unwrap_or("").to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => "application/octet-stream",
    }
    .to_string()
}
