//! Bidirectional Markdown ⇄ DocFmt conversion (components E and F).
//!
//! This crate is the only place that depends on both `pulldown-cmark` and
//! `core-docfmt`: [`parse`] and [`ast`] turn commonmark + GFM source into a
//! small intermediate tree, [`encoder`] lowers that tree into a DocFmt
//! [`Document`], and [`decoder`] renders a `Document` back into Markdown
//! source. Callers that only need the DocFmt value, or only need the JSON
//! wire form, use the convenience functions below rather than reaching into
//! the submodules directly.

pub mod ast;
pub mod decoder;
pub mod encoder;
pub mod parse;

pub use core_docfmt::{Document, DocfmtError};

/// Parse Markdown source into a DocFmt document.
pub fn markdown_to_docfmt(src: &str) -> Document {
    encoder::encode(src)
}

/// Render a DocFmt document back into Markdown source.
pub fn docfmt_to_markdown(doc: &Document) -> String {
    decoder::decode(doc)
}

/// Parse Markdown source directly into the DocFmt wire JSON, as sent in a
/// request body.
pub fn markdown_to_json(src: &str) -> serde_json::Value {
    markdown_to_docfmt(src).to_json()
}

/// Render a DocFmt wire JSON value (as received from the remote service)
/// back into Markdown source.
pub fn json_to_markdown(v: &serde_json::Value) -> Result<String, DocfmtError> {
    let doc = Document::from_json(v)?;
    Ok(docfmt_to_markdown(&doc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_to_json_round_trips_through_document() {
        let json = markdown_to_json("**hi**\n");
        let rendered = json_to_markdown(&json).unwrap();
        assert_eq!(rendered, "**hi**\n");
    }

    #[test]
    fn json_to_markdown_rejects_non_document_root() {
        let v = serde_json::json!({"type": "paragraph", "version": 1, "content": []});
        assert!(json_to_markdown(&v).is_err());
    }
}
