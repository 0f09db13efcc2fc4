//! Thin per-command glue (component J): argument-to-request mapping only.
//! Every handler follows the same shape — validate (optional pre-flight),
//! encode a Markdown body if one is present, call the transport, decode
//! the response, hand the result to the output sink — with no business
//! logic beyond that, per the purpose statement's Non-goals.

pub mod agile;
pub mod attachment;
pub mod batch;
pub mod comment;
pub mod fields;
pub mod issue;
pub mod link;
pub mod search;

use core_error::ClientError;
use serde_json::Value;

use crate::error::CliResult;

/// Read a body argument that may be literal text or, by convention, `-`
/// to mean "read the rest of stdin".
pub fn resolve_body_arg(arg: &str) -> CliResult<String> {
    if arg == "-" {
        use std::io::Read;
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| ClientError::User(format!("failed to read stdin: {e}")))?;
        Ok(buf)
    } else {
        Ok(arg.to_string())
    }
}

/// Wrap Markdown source as the `{ "body": <DocFmt> }` shape every
/// description, comment, and transition comment request uses (§6).
pub fn wrap_markdown_body(markdown: &str) -> Value {
    serde_json::json!({ "body": core_markdown::markdown_to_json(markdown) })
}

/// Render a DocFmt `body` field (as returned embedded in an issue/comment
/// payload) back to Markdown, or an empty string if absent/malformed.
pub fn render_body_field(fields: &Value, key: &str) -> String {
    fields
        .get(key)
        .and_then(|v| core_markdown::json_to_markdown(v).ok())
        .unwrap_or_default()
}
