//! `issue get|create|update|delete|assign|transitions`.

use clap::{Args, Subcommand};
use core_error::ClientError;
use core_output::Sink;
use core_transport::{CancellationToken, Client};
use serde_json::Value;

use crate::commands::{render_body_field, resolve_body_arg, wrap_markdown_body};
use crate::error::CliResult;

#[derive(Subcommand)]
pub enum IssueCommand {
    /// Fetch an issue by key.
    Get { key: String },
    /// Create a new issue.
    Create(CreateArgs),
    /// Update fields on an existing issue.
    Update(UpdateArgs),
    /// Delete an issue.
    Delete {
        key: String,
        /// Also delete subtasks (`?deleteSubtasks=true`).
        #[arg(long)]
        delete_subtasks: bool,
    },
    /// Reassign an issue.
    Assign { key: String, account_id: String },
    /// List available transitions, or apply one with `--to`.
    Transitions {
        key: String,
        #[arg(long)]
        to: Option<String>,
        /// Optional comment to attach to the transition.
        #[arg(long)]
        comment: Option<String>,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    /// Project key; falls back to `JIRA_PROJECT` if omitted.
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub issue_type: String,
    #[arg(long)]
    pub summary: String,
    /// Markdown description, or `-` to read from stdin.
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub key: String,
    #[arg(long)]
    pub summary: Option<String>,
    /// Markdown description, or `-` to read from stdin.
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub priority: Option<String>,
}

pub async fn run(
    cmd: IssueCommand,
    client: &Client,
    sink: &Sink,
    default_project: Option<&str>,
    cancel: &CancellationToken,
) -> CliResult<()> {
    match cmd {
        IssueCommand::Get { key } => get(&key, client, sink, cancel).await,
        IssueCommand::Create(args) => create(args, client, sink, default_project, cancel).await,
        IssueCommand::Update(args) => update(args, client, sink, cancel).await,
        IssueCommand::Delete { key, delete_subtasks } => {
            delete(&key, delete_subtasks, client, sink, cancel).await
        }
        IssueCommand::Assign { key, account_id } => {
            assign(&key, &account_id, client, sink, cancel).await
        }
        IssueCommand::Transitions { key, to, comment } => {
            transitions(&key, to, comment, client, sink, cancel).await
        }
    }
}

async fn get(key: &str, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<()> {
    let path = format!("/rest/api/3/issue/{key}");
    let bytes = client.get(&path, cancel).await?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::User(format!("malformed issue response: {e}")))?;
    render_issue(&value, sink);
    Ok(())
}

async fn create(
    args: CreateArgs,
    client: &Client,
    sink: &Sink,
    default_project: Option<&str>,
    cancel: &CancellationToken,
) -> CliResult<()> {
    let project = args
        .project
        .or_else(|| default_project.map(str::to_string))
        .ok_or_else(|| ClientError::User("no project specified and JIRA_PROJECT is unset".into()))?;

    if let Some(priority) = &args.priority {
        core_metadata::validate_priority(client, priority, cancel).await?;
    }
    core_metadata::validate_issue_type(client, &project, &args.issue_type, cancel).await?;

    let mut fields = serde_json::json!({
        "project": { "key": project },
        "summary": args.summary,
        "issuetype": { "name": args.issue_type },
    });
    if let Some(description) = &args.description {
        let markdown = resolve_body_arg(description)?;
        fields["description"] = core_markdown::markdown_to_json(&markdown);
    }
    if let Some(priority) = &args.priority {
        fields["priority"] = serde_json::json!({ "name": priority });
    }
    let body = serde_json::json!({ "fields": fields });

    if sink.is_dry_run() {
        sink.dry_run_descriptor(body.clone(), || {
            format!("create issue in project {project}: \"{}\"", args.summary)
        });
        return Ok(());
    }

    let payload = serde_json::to_vec(&body)
        .map_err(|e| ClientError::User(format!("failed to encode request body: {e}")))?;
    let bytes = client.post("/rest/api/3/issue", payload, cancel).await?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::User(format!("malformed create response: {e}")))?;
    sink.success(value.clone(), || {
        format!("created {}", value.get("key").and_then(Value::as_str).unwrap_or("?"))
    });
    Ok(())
}

async fn update(args: UpdateArgs, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<()> {
    if let Some(priority) = &args.priority {
        core_metadata::validate_priority(client, priority, cancel).await?;
    }

    let mut fields = serde_json::Map::new();
    if let Some(summary) = &args.summary {
        fields.insert("summary".into(), Value::String(summary.clone()));
    }
    if let Some(description) = &args.description {
        let markdown = resolve_body_arg(description)?;
        fields.insert("description".into(), core_markdown::markdown_to_json(&markdown));
    }
    if let Some(priority) = &args.priority {
        fields.insert("priority".into(), serde_json::json!({ "name": priority }));
    }
    if fields.is_empty() {
        return Err(ClientError::User("update requires at least one field to change".into()).into());
    }
    let body = serde_json::json!({ "fields": Value::Object(fields) });

    if sink.is_dry_run() {
        sink.dry_run_descriptor(body, || format!("update {}", args.key));
        return Ok(());
    }

    let path = format!("/rest/api/3/issue/{}", args.key);
    let payload = serde_json::to_vec(&body)
        .map_err(|e| ClientError::User(format!("failed to encode request body: {e}")))?;
    client.put(&path, payload, cancel).await?;
    sink.success(serde_json::json!({"key": args.key, "updated": true}), || {
        format!("updated {}", args.key)
    });
    Ok(())
}

async fn delete(
    key: &str,
    delete_subtasks: bool,
    client: &Client,
    sink: &Sink,
    cancel: &CancellationToken,
) -> CliResult<()> {
    if sink.is_dry_run() {
        sink.dry_run_descriptor(serde_json::json!({"key": key}), || format!("delete {key}"));
        return Ok(());
    }
    let path = if delete_subtasks {
        format!("/rest/api/3/issue/{key}?deleteSubtasks=true")
    } else {
        format!("/rest/api/3/issue/{key}")
    };
    client.delete(&path, cancel).await?;
    sink.success(serde_json::json!({"key": key, "deleted": true}), || format!("deleted {key}"));
    Ok(())
}

async fn assign(
    key: &str,
    account_id: &str,
    client: &Client,
    sink: &Sink,
    cancel: &CancellationToken,
) -> CliResult<()> {
    let body = serde_json::json!({ "accountId": account_id });
    if sink.is_dry_run() {
        sink.dry_run_descriptor(body, || format!("assign {key} to {account_id}"));
        return Ok(());
    }
    let path = format!("/rest/api/3/issue/{key}/assignee");
    let payload = serde_json::to_vec(&body)
        .map_err(|e| ClientError::User(format!("failed to encode request body: {e}")))?;
    client.put(&path, payload, cancel).await?;
    sink.success(serde_json::json!({"key": key, "assignee": account_id}), || {
        format!("assigned {key} to {account_id}")
    });
    Ok(())
}

async fn transitions(
    key: &str,
    to: Option<String>,
    comment: Option<String>,
    client: &Client,
    sink: &Sink,
    cancel: &CancellationToken,
) -> CliResult<()> {
    let path = format!("/rest/api/3/issue/{key}/transitions");

    let Some(target) = to else {
        let bytes = client.get(&path, cancel).await?;
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::User(format!("malformed transitions response: {e}")))?;
        sink.success(value.clone(), || {
            let names: Vec<&str> = value
                .get("transitions")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(|t| t.get("name").and_then(Value::as_str)).collect())
                .unwrap_or_default();
            format!("available transitions for {key}: {}", names.join(", "))
        });
        return Ok(());
    };

    let bytes = client.get(&path, cancel).await?;
    let available: Value = serde_json::from_slice(&bytes)
        .map_err(|e| ClientError::User(format!("malformed transitions response: {e}")))?;
    let transition_id = available
        .get("transitions")
        .and_then(Value::as_array)
        .and_then(|a| {
            a.iter().find(|t| {
                t.get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|n| n.eq_ignore_ascii_case(&target))
            })
        })
        .and_then(|t| t.get("id").and_then(Value::as_str))
        .ok_or_else(|| {
            let names: Vec<&str> = available
                .get("transitions")
                .and_then(Value::as_array)
                .map(|a| a.iter().filter_map(|t| t.get("name").and_then(Value::as_str)).collect())
                .unwrap_or_default();
            ClientError::User(format!(
                "invalid transition \"{target}\": must be one of [{}]",
                names.join(", ")
            ))
        })?
        .to_string();

    let mut body = serde_json::json!({ "transition": { "id": transition_id } });
    if let Some(comment_md) = &comment {
        let markdown = resolve_body_arg(comment_md)?;
        body["update"] = serde_json::json!({
            "comment": [ { "add": wrap_markdown_body(&markdown) } ]
        });
    }

    if sink.is_dry_run() {
        sink.dry_run_descriptor(body, || format!("transition {key} to {target}"));
        return Ok(());
    }

    let payload = serde_json::to_vec(&body)
        .map_err(|e| ClientError::User(format!("failed to encode request body: {e}")))?;
    client.post(&path, payload, cancel).await?;
    sink.success(serde_json::json!({"key": key, "transitioned_to": target}), || {
        format!("transitioned {key} to {target}")
    });
    Ok(())
}

fn render_issue(value: &Value, sink: &Sink) {
    sink.success(value.clone(), || {
        let key = value.get("key").and_then(Value::as_str).unwrap_or("?");
        let fields = value.get("fields").cloned().unwrap_or(Value::Null);
        let summary = fields.get("summary").and_then(Value::as_str).unwrap_or("");
        let status = fields
            .get("status")
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("");
        let description = render_body_field(&fields, "description");
        let mut out = format!("{key}: {summary} [{status}]");
        if !description.trim().is_empty() {
            out.push_str("\n\n");
            out.push_str(description.trim_end());
        }
        out
    });
}
