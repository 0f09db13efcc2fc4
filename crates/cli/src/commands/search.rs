//! `search <JQL>`: paginated by `nextPageToken`.

use clap::Args;
use core_error::ClientError;
use core_output::Sink;
use core_transport::{CancellationToken, Client};
use serde_json::Value;

use crate::error::CliResult;

#[derive(Args)]
pub struct SearchArgs {
    /// JQL query string.
    pub jql: String,
    /// Maximum number of issues to return across all pages.
    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

pub async fn run(args: SearchArgs, client: &Client, sink: &Sink, cancel: &CancellationToken) -> CliResult<()> {
    let mut issues = Vec::new();
    let mut next_page_token: Option<String> = None;

    loop {
        let mut request = serde_json::json!({ "jql": args.jql, "maxResults": args.limit });
        if let Some(token) = &next_page_token {
            request["nextPageToken"] = Value::String(token.clone());
        }
        let payload = serde_json::to_vec(&request)
            .map_err(|e| ClientError::User(format!("failed to encode search request: {e}")))?;
        let bytes = client.post("/rest/api/3/search/jql", payload, cancel).await?;
        let page: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::User(format!("malformed search response: {e}")))?;

        let page_issues = page.get("issues").and_then(Value::as_array).cloned().unwrap_or_default();
        issues.extend(page_issues);

        next_page_token = page
            .get("nextPageToken")
            .and_then(Value::as_str)
            .map(str::to_string);
        if next_page_token.is_none() || issues.len() >= args.limit {
            break;
        }
    }
    issues.truncate(args.limit);

    let result = serde_json::json!({ "issues": issues });
    sink.success(result, || {
        let rows: Vec<Vec<String>> = issues
            .iter()
            .map(|issue| {
                let key = issue.get("key").and_then(Value::as_str).unwrap_or("?").to_string();
                let summary = issue
                    .get("fields")
                    .and_then(|f| f.get("summary"))
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string();
                vec![key, summary]
            })
            .collect();
        let mut lines = Vec::with_capacity(rows.len() + 1);
        lines.push(format!("{} issues", issues.len()));
        for row in rows {
            lines.push(format!("{}  {}", row[0], row[1]));
        }
        lines.join("\n")
    });
    Ok(())
}
