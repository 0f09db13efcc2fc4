//! Pre-flight field-value validation against the remote catalogue
//! (component G).
//!
//! Validation is opt-in and cheap to skip: an empty candidate is an
//! immediate success, so callers that don't care about a field never pay
//! for the round trip. When a candidate is supplied, the catalogue is
//! fetched fresh for the lifetime of the invoking command — there is no
//! persistent cache — and matched case-insensitively.

use std::collections::BTreeSet;

use core_error::ClientError;
use core_transport::{CancellationToken, Client};
use serde_json::Value;

/// Resolve `candidate` against `options` (the remote's canonical names,
/// in the order the remote returned them). An empty candidate always
/// succeeds. A case-insensitive match against any option succeeds. A miss
/// returns [`ClientError::User`] quoting the offending value and listing
/// every valid option.
pub fn resolve(candidate: &str, options: &[String]) -> Result<(), ClientError> {
    if candidate.is_empty() {
        return Ok(());
    }

    let found = options
        .iter()
        .any(|opt| opt.eq_ignore_ascii_case(candidate));
    if found {
        return Ok(());
    }

    let listed = options.join(", ");
    Err(ClientError::User(format!(
        "invalid value \"{candidate}\": must be one of [{listed}]"
    )))
}

/// Fetch the priority catalogue's canonical names, in the order the
/// remote returned them.
pub async fn priority_options(client: &Client, cancel: &CancellationToken) -> Result<Vec<String>, ClientError> {
    let bytes = client.get("/rest/api/3/priority", cancel).await?;
    parse_name_array(&bytes)
}

/// Fetch the issue-type catalogue's canonical names for `project_key`.
pub async fn issue_type_options(
    client: &Client,
    project_key: &str,
    cancel: &CancellationToken,
) -> Result<Vec<String>, ClientError> {
    let path = format!("/rest/api/3/issue/createmeta/{project_key}/issuetypes");
    let bytes = client.get(&path, cancel).await?;
    parse_issue_type_names(&bytes)
}

/// Fetch the per-issue-type status catalogue's names for `project_key`,
/// deduplicated across issue types.
pub async fn status_options(
    client: &Client,
    project_key: &str,
    cancel: &CancellationToken,
) -> Result<Vec<String>, ClientError> {
    let path = format!("/rest/api/3/project/{project_key}/statuses");
    let bytes = client.get(&path, cancel).await?;
    parse_status_names(&bytes)
}

/// Fetch the issue-link-type catalogue's canonical names.
pub async fn link_type_options(client: &Client, cancel: &CancellationToken) -> Result<Vec<String>, ClientError> {
    let bytes = client.get("/rest/api/3/issueLinkType", cancel).await?;
    parse_link_type_names(&bytes)
}

/// Fetch the priority catalogue and validate `candidate` against it.
pub async fn validate_priority(
    client: &Client,
    candidate: &str,
    cancel: &CancellationToken,
) -> Result<(), ClientError> {
    if candidate.is_empty() {
        return Ok(());
    }
    let options = priority_options(client, cancel).await?;
    resolve(candidate, &options)
}

/// Fetch the issue-type catalogue for `project_key` and validate
/// `candidate` against it.
pub async fn validate_issue_type(
    client: &Client,
    project_key: &str,
    candidate: &str,
    cancel: &CancellationToken,
) -> Result<(), ClientError> {
    if candidate.is_empty() {
        return Ok(());
    }
    let options = issue_type_options(client, project_key, cancel).await?;
    resolve(candidate, &options)
}

/// Fetch the per-issue-type status catalogue for `project_key`, dedup
/// across issue types, and validate `candidate` against it.
pub async fn validate_status(
    client: &Client,
    project_key: &str,
    candidate: &str,
    cancel: &CancellationToken,
) -> Result<(), ClientError> {
    if candidate.is_empty() {
        return Ok(());
    }
    let options = status_options(client, project_key, cancel).await?;
    resolve(candidate, &options)
}

/// Fetch the issue-link-type catalogue and validate `candidate` against it.
pub async fn validate_link_type(
    client: &Client,
    candidate: &str,
    cancel: &CancellationToken,
) -> Result<(), ClientError> {
    if candidate.is_empty() {
        return Ok(());
    }
    let options = link_type_options(client, cancel).await?;
    resolve(candidate, &options)
}

fn malformed(context: &str) -> ClientError {
    ClientError::User(format!("malformed {context} catalogue response"))
}

/// `[{ "name": "High", ... }, ...]`, as returned by the priority endpoint.
fn parse_name_array(bytes: &[u8]) -> Result<Vec<String>, ClientError> {
    let v: Value = serde_json::from_slice(bytes).map_err(|_| malformed("priority"))?;
    let arr = v.as_array().ok_or_else(|| malformed("priority"))?;
    Ok(arr
        .iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

/// `{ "issueTypes": [{ "name": "Bug", ... }, ...] }`, as returned by the
/// issue-type createmeta endpoint.
fn parse_issue_type_names(bytes: &[u8]) -> Result<Vec<String>, ClientError> {
    let v: Value = serde_json::from_slice(bytes).map_err(|_| malformed("issue-type"))?;
    let arr = v
        .get("issueTypes")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("issue-type"))?;
    Ok(arr
        .iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

/// `[{ "name": "Bug", "statuses": [{ "name": "To Do" }, ...] }, ...]`, as
/// returned by the project-statuses endpoint. Status names repeat across
/// issue types and are deduplicated here.
fn parse_status_names(bytes: &[u8]) -> Result<Vec<String>, ClientError> {
    let v: Value = serde_json::from_slice(bytes).map_err(|_| malformed("status"))?;
    let arr = v.as_array().ok_or_else(|| malformed("status"))?;

    let mut seen = BTreeSet::new();
    let mut ordered = Vec::new();
    for issue_type in arr {
        let Some(statuses) = issue_type.get("statuses").and_then(Value::as_array) else {
            continue;
        };
        for status in statuses {
            if let Some(name) = status.get("name").and_then(Value::as_str) {
                if seen.insert(name.to_ascii_lowercase()) {
                    ordered.push(name.to_string());
                }
            }
        }
    }
    Ok(ordered)
}

/// `{ "issueLinkTypes": [{ "name": "Blocks", ... }, ...] }`.
fn parse_link_type_names(bytes: &[u8]) -> Result<Vec<String>, ClientError> {
    let v: Value = serde_json::from_slice(bytes).map_err(|_| malformed("link-type"))?;
    let arr = v
        .get("issueLinkTypes")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("link-type"))?;
    Ok(arr
        .iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_candidate_is_immediate_success() {
        assert!(resolve("", &[]).is_ok());
    }

    #[test]
    fn case_insensitive_match_succeeds() {
        let options = vec!["High".to_string(), "Low".to_string()];
        assert!(resolve("high", &options).is_ok());
        assert!(resolve("HIGH", &options).is_ok());
    }

    #[test]
    fn miss_lists_every_valid_option() {
        let options = vec!["High".to_string(), "Low".to_string()];
        let err = resolve("Medium", &options).unwrap_err();
        let msg = err.display_line();
        assert!(msg.contains("Medium"));
        assert!(msg.contains("High"));
        assert!(msg.contains("Low"));
    }

    #[test]
    fn parse_name_array_extracts_names_in_order() {
        let json = br#"[{"name":"Highest"},{"name":"High"},{"name":"Low"}]"#;
        let names = parse_name_array(json).unwrap();
        assert_eq!(names, vec!["Highest", "High", "Low"]);
    }

    #[test]
    fn parse_status_names_dedups_across_issue_types() {
        let json = br#"[
            {"name":"Bug","statuses":[{"name":"To Do"},{"name":"Done"}]},
            {"name":"Task","statuses":[{"name":"to do"},{"name":"In Progress"}]}
        ]"#;
        let names = parse_status_names(json).unwrap();
        assert_eq!(names, vec!["To Do", "Done", "In Progress"]);
    }

    #[test]
    fn parse_issue_type_names_reads_nested_array() {
        let json = br#"{"issueTypes":[{"name":"Bug"},{"name":"Story"}]}"#;
        let names = parse_issue_type_names(json).unwrap();
        assert_eq!(names, vec!["Bug", "Story"]);
    }

    #[test]
    fn parse_link_type_names_reads_nested_array() {
        let json = br#"{"issueLinkTypes":[{"name":"Blocks"},{"name":"Relates"}]}"#;
        let names = parse_link_type_names(json).unwrap();
        assert_eq!(names, vec!["Blocks", "Relates"]);
    }

    #[test]
    fn malformed_json_is_a_user_error() {
        assert!(parse_name_array(b"not json").is_err());
    }
}
