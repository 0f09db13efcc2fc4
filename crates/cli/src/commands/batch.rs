//! `batch transition|delete|comment`: per-line stdin fan-out over issue
//! keys (component H). Every subcommand shares the same input-resolution
//! and dry-run shape; only the per-key operation differs.

use clap::{Args, Subcommand};
use core_error::{ClientError, ErrorCategory};
use core_output::Sink;
use core_transport::{CancellationToken, Client};

use crate::commands::{resolve_body_arg, wrap_markdown_body};
use crate::error::CliResult;

#[derive(Args, Clone)]
pub struct BatchInput {
    /// Read keys from stdin (one per line).
    #[arg(long)]
    pub stdin: bool,
    /// Read keys from a file, or `-` for stdin.
    #[arg(long)]
    pub file: Option<String>,
}

impl BatchInput {
    /// Detect and reject a `--stdin` / `--file -` combination that would
    /// both claim standard input, then read whichever source was named.
    fn resolve(&self) -> Result<String, ClientError> {
        let file_is_stdin = self.file.as_deref() == Some("-");
        if self.stdin && file_is_stdin {
            return Err(ClientError::User(
                "cannot combine --stdin with --file -: both claim standard input".into(),
            ));
        }
        if self.stdin || file_is_stdin {
            use std::io::Read;
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| ClientError::User(format!("failed to read stdin: {e}")))?;
            return Ok(buf);
        }
        match &self.file {
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| ClientError::User(format!("failed to read {path}: {e}"))),
            None => Err(ClientError::User("batch requires --stdin or --file <path>".into())),
        }
    }
}

#[derive(Subcommand)]
pub enum BatchCommand {
    /// Apply a transition to every issue key.
    Transition {
        #[command(flatten)]
        input: BatchInput,
        to: String,
    },
    /// Delete every issue key.
    Delete {
        #[command(flatten)]
        input: BatchInput,
        #[arg(long)]
        delete_subtasks: bool,
    },
    /// Add the same comment to every issue key.
    Comment {
        #[command(flatten)]
        input: BatchInput,
        body: String,
    },
}

/// Run a batch subcommand and return the aggregate exit category, so the
/// entry point maps it to a process exit code exactly like any other
/// command's result — no early `process::exit` here.
pub async fn run(cmd: BatchCommand, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<ErrorCategory> {
    match cmd {
        BatchCommand::Transition { input, to } => {
            let text = input.resolve()?;
            if sink.is_dry_run() {
                let previews = core_batch::run_dry(&text, |key| format!("transition {key} to {to}"));
                sink.batch_previews(&previews);
                return Ok(ErrorCategory::Success);
            }
            let report = core_batch::run(&text, |key| {
                let client = client.clone();
                let cancel = cancel.clone();
                let to = to.clone();
                let key = key.to_string();
                async move { transition_one(&client, &key, &to, &cancel).await }
            })
            .await;
            sink.batch_report(&report);
            Ok(report.category())
        }
        BatchCommand::Delete { input, delete_subtasks } => {
            let text = input.resolve()?;
            if sink.is_dry_run() {
                let previews = core_batch::run_dry(&text, |key| format!("delete {key}"));
                sink.batch_previews(&previews);
                return Ok(ErrorCategory::Success);
            }
            let report = core_batch::run(&text, |key| {
                let client = client.clone();
                let cancel = cancel.clone();
                let key = key.to_string();
                async move { delete_one(&client, &key, delete_subtasks, &cancel).await }
            })
            .await;
            sink.batch_report(&report);
            Ok(report.category())
        }
        BatchCommand::Comment { input, body } => {
            let text = input.resolve()?;
            let markdown = resolve_body_arg(&body)?;
            if sink.is_dry_run() {
                let previews = core_batch::run_dry(&text, |key| format!("comment on {key}"));
                sink.batch_previews(&previews);
                return Ok(ErrorCategory::Success);
            }
            let report = core_batch::run(&text, |key| {
                let client = client.clone();
                let cancel = cancel.clone();
                let markdown = markdown.clone();
                let key = key.to_string();
                async move { comment_one(&client, &key, &markdown, &cancel).await }
            })
            .await;
            sink.batch_report(&report);
            Ok(report.category())
        }
    }
}

async fn transition_one(client: &Client, key: &str, to: &str, cancel: &CancellationToken) -> Result<(), ClientError> {
    let path = format!("/rest/api/3/issue/{key}/transitions");
    let bytes = client.get(&path, cancel).await?;
    let available: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::User(format!("malformed transitions response: {e}")))?;
    let transition_id = available
        .get("transitions")
        .and_then(serde_json::Value::as_array)
        .and_then(|a| {
            a.iter().find(|t| {
                t.get("name")
                    .and_then(serde_json::Value::as_str)
                    .is_some_and(|n| n.eq_ignore_ascii_case(to))
            })
        })
        .and_then(|t| t.get("id").and_then(serde_json::Value::as_str))
        .ok_or_else(|| ClientError::User(format!("no transition named \"{to}\"")))?
        .to_string();

    let body = serde_json::json!({ "transition": { "id": transition_id } });
    let payload = serde_json::to_vec(&body)
        .map_err(|e| ClientError::User(format!("failed to encode request body: {e}")))?;
    client.post(&path, payload, cancel).await?;
    Ok(())
}

async fn delete_one(client: &Client, key: &str, delete_subtasks: bool, cancel: &CancellationToken) -> Result<(), ClientError> {
    let path = if delete_subtasks {
        format!("/rest/api/3/issue/{key}?deleteSubtasks=true")
    } else {
        format!("/rest/api/3/issue/{key}")
    };
    client.delete(&path, cancel).await?;
    Ok(())
}

async fn comment_one(client: &Client, key: &str, markdown: &str, cancel: &CancellationToken) -> Result<(), ClientError> {
    let body = wrap_markdown_body(markdown);
    let payload = serde_json::to_vec(&body)
        .map_err(|e| ClientError::User(format!("failed to encode request body: {e}")))?;
    let path = format!("/rest/api/3/issue/{key}/comment");
    client.post(&path, payload, cancel).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_stdin_and_file_dash_combination() {
        let input = BatchInput { stdin: true, file: Some("-".to_string()) };
        let err = input.resolve().unwrap_err();
        assert!(err.display_line().contains("--stdin"));
    }

    #[test]
    fn requires_some_input_source() {
        let input = BatchInput { stdin: false, file: None };
        assert!(input.resolve().is_err());
    }
}
