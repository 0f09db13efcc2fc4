//! Markdown → DocFmt encoder (component E).
//!
//! Never fails on input syntax: any fragment the parser can't represent in
//! DocFmt is either emitted as plain text or omitted. The only structural
//! work left to this module, once the AST in `ast.rs` exists, is enforcing
//! the invariants in the data model (mark compatibility, blockquote
//! flattening, task-item shape, non-empty code blocks) while emitting
//! DocFmt nodes.

use core_docfmt::{fresh_id, Document, Mark, MarkKind, Node, NodeKind};

use crate::ast::{Block, Inline};
use crate::parse::parse_document;

/// Convert a UTF-8 Markdown string (commonmark + GFM tables, strikethrough,
/// task lists, autolinks) into a well-formed DocFmt document.
pub fn encode(src: &str) -> Document {
    let blocks = parse_document(src);
    let content = blocks.iter().filter_map(emit_block).collect();
    Document::new(content)
}

fn emit_block(block: &Block) -> Option<Node> {
    match block {
        Block::Paragraph(inlines) => {
            let content = emit_inlines(inlines);
            Some(Node::new(NodeKind::Paragraph).with_content(content))
        }
        Block::Heading(level, inlines) => {
            let clamped = (*level).clamp(1, 6);
            let content = emit_inlines(inlines);
            Some(
                Node::new(NodeKind::Heading)
                    .with_attr("level", clamped as i64)
                    .with_content(content),
            )
        }
        Block::CodeBlock { lang, text } => {
            let mut node = Node::new(NodeKind::CodeBlock);
            if let Some(lang) = lang {
                node = node.with_attr("language", lang.clone());
            }
            let body = if text.is_empty() {
                " ".to_string()
            } else {
                text.clone()
            };
            node = node.with_content(vec![Node::text(body, vec![])]);
            Some(node)
        }
        Block::Blockquote(blocks) => {
            let flattened = flatten_blockquote(blocks);
            let content = flattened
                .iter()
                .filter_map(emit_blockquote_child)
                .collect();
            Some(Node::new(NodeKind::Blockquote).with_content(content))
        }
        Block::BulletList(items) => {
            let content = items.iter().map(emit_list_item).collect();
            Some(Node::new(NodeKind::BulletList).with_content(content))
        }
        Block::OrderedList(items) => {
            let content = items.iter().map(emit_list_item).collect();
            Some(Node::new(NodeKind::OrderedList).with_content(content))
        }
        Block::TaskList(items) => {
            let list_id = fresh_id();
            let content = items
                .iter()
                .map(|(checked, inlines)| {
                    Node::new(NodeKind::TaskItem)
                        .with_attr("localId", fresh_id())
                        .with_attr(
                            "state",
                            if *checked { "DONE" } else { "TODO" },
                        )
                        .with_content(emit_inlines(inlines))
                })
                .collect();
            Some(
                Node::new(NodeKind::TaskList)
                    .with_attr("localId", list_id)
                    .with_content(content),
            )
        }
        Block::Table { header, rows } => Some(emit_table(header, rows)),
        Block::ThematicBreak => Some(Node::new(NodeKind::ThematicBreak)),
        Block::HtmlBlock(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(
                    Node::new(NodeKind::Paragraph)
                        .with_content(vec![Node::text(trimmed.to_string(), vec![])]),
                )
            }
        }
    }
}

/// Recursively flatten nested blockquotes: inner content is spliced into
/// the outer sequence in source order, so no `Blockquote` ever contains
/// another `Blockquote`.
fn flatten_blockquote(blocks: &[Block]) -> Vec<Block> {
    let mut out = Vec::new();
    for block in blocks {
        match block {
            Block::Blockquote(inner) => out.extend(flatten_blockquote(inner)),
            other => out.push(other.clone()),
        }
    }
    out
}

/// A blockquote's children are restricted to paragraph, bullet-list,
/// ordered-list, code-block. Anything else reachable here (heading, table,
/// task-list, thematic-break, html) is coerced into a paragraph carrying
/// its best-effort plain-text rendering, rather than producing an invalid
/// DocFmt tree.
fn emit_blockquote_child(block: &Block) -> Option<Node> {
    match block {
        Block::Paragraph(_) | Block::BulletList(_) | Block::OrderedList(_) | Block::CodeBlock { .. } => {
            emit_block(block)
        }
        Block::Heading(_, inlines) => Some(
            Node::new(NodeKind::Paragraph).with_content(emit_inlines(inlines)),
        ),
        Block::TaskList(items) => {
            let text = items
                .iter()
                .map(|(_, inlines)| plain_text_of(inlines))
                .collect::<Vec<_>>()
                .join(" ");
            Some(Node::new(NodeKind::Paragraph).with_content(vec![Node::text(text, vec![])]))
        }
        Block::Table { header, .. } => {
            let text = header
                .iter()
                .map(|cell| plain_text_of(cell))
                .collect::<Vec<_>>()
                .join(" ");
            Some(Node::new(NodeKind::Paragraph).with_content(vec![Node::text(text, vec![])]))
        }
        Block::ThematicBreak => None,
        Block::HtmlBlock(text) => emit_block(&Block::HtmlBlock(text.clone())),
        Block::Blockquote(_) => unreachable!("flattened before reaching this point"),
    }
}

fn emit_list_item(blocks: &[Block]) -> Node {
    let content = blocks.iter().filter_map(emit_block).collect();
    Node::new(NodeKind::ListItem).with_content(content)
}

fn emit_table(header: &[Vec<Inline>], rows: &[Vec<Vec<Inline>>]) -> Node {
    let mut table_rows = Vec::new();

    if !header.is_empty() {
        let cells = header
            .iter()
            .map(|cell| emit_cell(cell, NodeKind::TableHeaderCell))
            .collect();
        table_rows.push(Node::new(NodeKind::TableRow).with_content(cells));
    }

    for row in rows {
        let cells = row
            .iter()
            .map(|cell| emit_cell(cell, NodeKind::TableDataCell))
            .collect();
        table_rows.push(Node::new(NodeKind::TableRow).with_content(cells));
    }

    Node::new(NodeKind::Table).with_content(table_rows)
}

fn emit_cell(inlines: &[Inline], kind: NodeKind) -> Node {
    let paragraph = Node::new(NodeKind::Paragraph).with_content(emit_inlines(inlines));
    Node::new(kind).with_content(vec![paragraph])
}

fn emit_inlines(inlines: &[Inline]) -> Vec<Node> {
    let mut out = Vec::new();
    for inline in inlines {
        emit_inline(inline, &[], &mut out);
    }
    out
}

/// The sole mark-nesting rule: descending through a wrapper prepends its
/// mark to every text leaf produced below it, unless that leaf already
/// carries `code`, in which case incompatible outer marks are dropped
/// rather than producing an invalid mark set. `code`-on-text dominates.
fn emit_inline(inline: &Inline, marks: &[Mark], out: &mut Vec<Node>) {
    match inline {
        Inline::Text(s) => {
            if !s.is_empty() {
                out.push(Node::text(s.clone(), marks.to_vec()));
            }
        }
        Inline::HardBreak => out.push(Node::new(NodeKind::HardBreak)),
        Inline::Code(s) => {
            let mut leaf_marks = retain_code_compatible(marks);
            leaf_marks.push(Mark::new(MarkKind::Code));
            out.push(Node::text(s.clone(), leaf_marks));
        }
        Inline::Emphasis(children) => {
            let mut next = marks.to_vec();
            next.push(Mark::new(MarkKind::Emphasis));
            for child in children {
                emit_inline(child, &next, out);
            }
        }
        Inline::Strong(children) => {
            let mut next = marks.to_vec();
            next.push(Mark::new(MarkKind::Strong));
            for child in children {
                emit_inline(child, &next, out);
            }
        }
        Inline::Strike(children) => {
            let mut next = marks.to_vec();
            next.push(Mark::new(MarkKind::Strike));
            for child in children {
                emit_inline(child, &next, out);
            }
        }
        Inline::Link { href, inner } => {
            let mut next = marks.to_vec();
            next.push(Mark::link(href.clone()));
            for child in inner {
                emit_inline(child, &next, out);
            }
        }
    }
}

fn retain_code_compatible(marks: &[Mark]) -> Vec<Mark> {
    marks
        .iter()
        .filter(|m| Mark::compatible(m.kind, MarkKind::Code))
        .cloned()
        .collect()
}

fn plain_text_of(inlines: &[Inline]) -> String {
    let mut s = String::new();
    for i in inlines {
        match i {
            Inline::Text(t) => s.push_str(t),
            Inline::Code(t) => s.push_str(t),
            Inline::Emphasis(inner) | Inline::Strong(inner) | Inline::Strike(inner) => {
                s.push_str(&plain_text_of(inner))
            }
            Inline::Link { inner, .. } => s.push_str(&plain_text_of(inner)),
            Inline::HardBreak => s.push(' '),
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_docfmt::NodeKind;

    fn doc_is_v1(doc: &Document) {
        assert_eq!(doc.version, 1);
    }

    #[test]
    fn bold_italic_mix_produces_both_marks() {
        let doc = encode("**bold** and *italic*");
        doc_is_v1(&doc);
        let para = &doc.content[0];
        assert_eq!(para.kind, NodeKind::Paragraph);
        let bold_leaf = &para.content[0];
        assert_eq!(bold_leaf.text.as_deref(), Some("bold"));
        assert_eq!(bold_leaf.marks.len(), 1);
        assert_eq!(bold_leaf.marks[0].kind, MarkKind::Strong);
    }

    #[test]
    fn code_inside_strong_drops_strong() {
        let doc = encode("**`code`**");
        let para = &doc.content[0];
        let leaf = &para.content[0];
        assert_eq!(leaf.text.as_deref(), Some("code"));
        assert_eq!(leaf.marks.len(), 1);
        assert_eq!(leaf.marks[0].kind, MarkKind::Code);
    }

    #[test]
    fn code_inside_link_keeps_both() {
        let doc = encode("[`code`](https://example.com)");
        let para = &doc.content[0];
        let leaf = &para.content[0];
        let kinds: Vec<_> = leaf.marks.iter().map(|m| m.kind).collect();
        assert!(kinds.contains(&MarkKind::Code));
        assert!(kinds.contains(&MarkKind::Link));
    }

    #[test]
    fn code_block_is_never_empty() {
        let doc = encode("```\n```");
        let block = &doc.content[0];
        assert_eq!(block.kind, NodeKind::CodeBlock);
        assert_eq!(block.content.len(), 1);
        assert_eq!(block.content[0].text.as_deref(), Some(" "));
    }

    #[test]
    fn nested_blockquote_is_flattened() {
        let doc = encode("> a\n> > b\n");
        assert_eq!(doc.content.len(), 1);
        let bq = &doc.content[0];
        assert_eq!(bq.kind, NodeKind::Blockquote);
        assert!(bq.content.iter().all(|n| n.kind != NodeKind::Blockquote));
        assert_eq!(bq.content.len(), 2);
    }

    #[test]
    fn task_item_has_no_paragraph_wrapper() {
        let doc = encode("- [x] done\n");
        let list = &doc.content[0];
        assert_eq!(list.kind, NodeKind::TaskList);
        assert!(!list.attrs.is_empty());
        let item = &list.content[0];
        assert_eq!(item.kind, NodeKind::TaskItem);
        assert_eq!(item.attr_str("state"), Some("DONE"));
        assert!(item.content.iter().all(|n| n.kind != NodeKind::Paragraph));
        assert_eq!(item.content[0].text.as_deref(), Some("done"));
    }

    #[test]
    fn task_list_and_task_item_ids_are_distinct_across_encodes() {
        let doc1 = encode("- [ ] a\n");
        let doc2 = encode("- [ ] a\n");
        let id1 = doc1.content[0].attr_str("localId").unwrap().to_string();
        let id2 = doc2.content[0].attr_str("localId").unwrap().to_string();
        assert_ne!(id1, id2);
    }

    #[test]
    fn heading_level_is_clamped_by_source() {
        let doc = encode("###### six\n");
        assert_eq!(doc.content[0].attr_str("level"), None); // stored as number
        assert_eq!(
            doc.content[0].attrs.get("level").and_then(|v| v.as_i64()),
            Some(6)
        );
    }

    #[test]
    fn gfm_table_round_trips_to_nodes() {
        let doc = encode("| A | B |\n| --- | --- |\n| 1 | 2 |\n");
        let table = &doc.content[0];
        assert_eq!(table.kind, NodeKind::Table);
        assert_eq!(table.content.len(), 2);
        let header_row = &table.content[0];
        assert_eq!(header_row.content[0].kind, NodeKind::TableHeaderCell);
        let data_row = &table.content[1];
        assert_eq!(data_row.content[0].kind, NodeKind::TableDataCell);
    }

    #[test]
    fn thematic_break_variants_canonicalise() {
        for src in ["---\n", "***\n", "___\n", "- - -\n"] {
            let doc = encode(src);
            assert_eq!(doc.content[0].kind, NodeKind::ThematicBreak);
        }
    }

    #[test]
    fn image_becomes_alt_text() {
        let doc = encode("![a cat](cat.png)\n");
        let para = &doc.content[0];
        assert_eq!(para.content[0].text.as_deref(), Some("a cat"));
    }

    #[test]
    fn autolink_becomes_link_mark_with_url_text() {
        let doc = encode("<https://example.com>\n");
        let para = &doc.content[0];
        let leaf = &para.content[0];
        assert_eq!(leaf.text.as_deref(), Some("https://example.com"));
        assert_eq!(leaf.marks[0].kind, MarkKind::Link);
    }
}
