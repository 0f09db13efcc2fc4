//! DocFmt → Markdown decoder (component F).
//!
//! Renders a [`Document`] back into commonmark + GFM source. The decoder
//! never consults the original Markdown (there isn't one, in general — the
//! document may have come from the remote service) and always produces
//! canonical output: ordered lists are renumbered from 1, headings are
//! clamped to 1-6, and adjacent text leaves sharing the same mark set are
//! merged before rendering so runs of plain text don't fragment into
//! spurious delimiter pairs.

use core_docfmt::{Document, Mark, MarkKind, Node, NodeKind};

/// Render a DocFmt document as Markdown source. Unknown node kinds (there
/// are none left once [`Document::from_json`] has filtered them) and empty
/// containers render as nothing.
pub fn decode(doc: &Document) -> String {
    let blocks: Vec<String> = doc
        .content
        .iter()
        .map(render_block)
        .filter(|b| !b.is_empty())
        .collect();
    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

/// Prefix every line, including blank interior lines, so a multi-paragraph
/// blockquote stays one contiguous `>` block on re-parse instead of
/// splitting into separate blockquotes at the blank line (§4.F).
fn indent(s: &str, prefix: &str) -> String {
    let blank_prefix = prefix.trim_end();
    s.lines()
        .map(|line| {
            if line.is_empty() {
                blank_prefix.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_block(node: &Node) -> String {
    match node.kind {
        NodeKind::Paragraph => render_inlines(&node.content),
        NodeKind::Heading => {
            let level = node
                .attrs
                .get("level")
                .and_then(|v| v.as_i64())
                .unwrap_or(1)
                .clamp(1, 6) as usize;
            format!("{} {}", "#".repeat(level), render_inlines(&node.content))
        }
        NodeKind::CodeBlock => {
            let lang = node.attrs.get("language").and_then(|v| v.as_str()).unwrap_or("");
            let text = node
                .content
                .first()
                .and_then(|n| n.text.as_deref())
                .unwrap_or("");
            format!("```{lang}\n{text}\n```")
        }
        NodeKind::Blockquote => {
            let inner = node
                .content
                .iter()
                .map(render_block)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("\n\n");
            indent(&inner, "> ")
        }
        NodeKind::BulletList => render_list(node, None),
        NodeKind::OrderedList => render_list(node, Some(1)),
        NodeKind::TaskList => render_task_list(node),
        NodeKind::Table => render_table(node),
        NodeKind::ThematicBreak => "---".to_string(),
        NodeKind::HardBreak => String::new(),
        _ => String::new(),
    }
}

fn render_list(node: &Node, start: Option<i64>) -> String {
    let mut lines = Vec::new();
    let mut counter = start.unwrap_or(1);
    for item in &node.content {
        if item.kind != NodeKind::ListItem {
            continue;
        }
        let body = item
            .content
            .iter()
            .map(render_block)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        let marker = match start {
            Some(_) => {
                let m = format!("{counter}. ");
                counter += 1;
                m
            }
            None => "- ".to_string(),
        };
        let indented = indent_continuation(&body, "  ");
        lines.push(format!("{marker}{indented}"));
    }
    lines.join("\n")
}

fn render_task_list(node: &Node) -> String {
    let mut lines = Vec::new();
    for item in &node.content {
        if item.kind != NodeKind::TaskItem {
            continue;
        }
        let checked = item.attrs.get("state").and_then(|v| v.as_str()) == Some("DONE");
        let box_marker = if checked { "[x]" } else { "[ ]" };
        let text = render_inlines(&item.content);
        lines.push(format!("- {box_marker} {text}"));
    }
    lines.join("\n")
}

/// Indent every line after the first by `prefix`, leaving the first line
/// bare so it can follow an inline list marker on the same line.
fn indent_continuation(s: &str, prefix: &str) -> String {
    let mut lines = s.lines();
    let Some(first) = lines.next() else {
        return String::new();
    };
    let rest: Vec<String> = lines
        .map(|l| if l.is_empty() { String::new() } else { format!("{prefix}{l}") })
        .collect();
    if rest.is_empty() {
        first.to_string()
    } else {
        format!("{first}\n{}", rest.join("\n"))
    }
}

fn render_table(node: &Node) -> String {
    let rows: Vec<&Node> = node
        .content
        .iter()
        .filter(|n| n.kind == NodeKind::TableRow)
        .collect();
    if rows.is_empty() {
        return String::new();
    }

    let cell_text = |cell: &Node| -> String {
        cell.content
            .iter()
            .map(|p| render_inlines(&p.content).replace('|', "\\|"))
            .collect::<Vec<_>>()
            .join(" ")
    };

    let header_cells: Vec<String> = rows[0].content.iter().map(cell_text).collect();
    let col_count = header_cells.len();

    let mut out = String::new();
    out.push_str("| ");
    out.push_str(&header_cells.join(" | "));
    out.push_str(" |\n|");
    for _ in 0..col_count {
        out.push_str(" --- |");
    }

    for row in &rows[1..] {
        let cells: Vec<String> = row.content.iter().map(cell_text).collect();
        out.push('\n');
        out.push_str("| ");
        out.push_str(&cells.join(" | "));
        out.push_str(" |");
    }

    out
}

fn render_inlines(nodes: &[Node]) -> String {
    let merged = merge_adjacent_text(nodes);
    let mut out = String::new();
    for node in &merged {
        match node.kind {
            NodeKind::Text => out.push_str(&render_text_node(node)),
            NodeKind::HardBreak => out.push_str("  \n"),
            _ => {}
        }
    }
    out
}

/// Merge consecutive `Text` siblings that carry the same mark set, so a run
/// of plain text produced by several encoder calls renders as one
/// contiguous span rather than several back-to-back delimiter pairs.
fn merge_adjacent_text(nodes: &[Node]) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::new();
    for node in nodes {
        if node.kind == NodeKind::Text {
            if let Some(last) = out.last_mut() {
                if last.kind == NodeKind::Text && same_marks(&last.marks, &node.marks) {
                    let mut text = last.text.clone().unwrap_or_default();
                    text.push_str(node.text.as_deref().unwrap_or(""));
                    last.text = Some(text);
                    continue;
                }
            }
        }
        out.push(node.clone());
    }
    out
}

fn same_marks(a: &[Mark], b: &[Mark]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|m| b.iter().any(|n| n == m))
}

/// Escape first, then wrap in delimiters innermost-out: `code` always wins
/// the innermost position (it reverts to raw text, discarding any escaping,
/// since backslashes have no special meaning inside a code span), the
/// symmetric marks nest around it in a fixed order, and `link` is always
/// outermost since it wraps the whole visible label.
fn render_text_node(node: &Node) -> String {
    let raw = node.text.as_deref().unwrap_or("");
    let has_code = node.marks.iter().any(|m| m.kind == MarkKind::Code);

    let mut body = if has_code {
        format!("`{raw}`")
    } else {
        escape(raw)
    };

    for kind in [MarkKind::Strike, MarkKind::Emphasis, MarkKind::Strong] {
        if node.marks.iter().any(|m| m.kind == kind) {
            body = wrap(&body, kind);
        }
    }

    if let Some(link) = node.marks.iter().find(|m| m.kind == MarkKind::Link) {
        let href = link.attrs.get("href").cloned().unwrap_or_default();
        body = format!("[{body}]({href})");
    }

    body
}

fn wrap(s: &str, kind: MarkKind) -> String {
    let delim = match kind {
        MarkKind::Strong => "**",
        MarkKind::Emphasis => "*",
        MarkKind::Strike => "~~",
        _ => "",
    };
    format!("{delim}{s}{delim}")
}

/// Escape the handful of commonmark markers that would otherwise reparse
/// as formatting: backtick, asterisk, and opening bracket always, unless
/// the preceding source character is already a backslash. Underscore is
/// escaped only at a word boundary — an identifier-style underscore
/// (`white_check_mark`) is left alone. Everything else, including `\`,
/// `|`, `]`, `#`, `-`, `+`, `!`, `.`, is emitted literally.
fn escape(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    for (i, &c) in chars.iter().enumerate() {
        let prev = if i > 0 { Some(chars[i - 1]) } else { None };
        match c {
            '`' | '*' | '[' => {
                if prev == Some('\\') {
                    out.push(c);
                } else {
                    out.push('\\');
                    out.push(c);
                }
            }
            '_' => {
                let is_word = |ch: char| ch.is_alphanumeric() || ch == '_';
                let prev_word = prev.is_some_and(is_word);
                let next_word = chars.get(i + 1).is_some_and(|n| is_word(*n));
                if prev_word && next_word {
                    out.push(c);
                } else {
                    out.push('\\');
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode;

    #[test]
    fn paragraph_round_trips() {
        let doc = encode("hello world\n");
        assert_eq!(decode(&doc), "hello world\n");
    }

    #[test]
    fn strong_emphasis_render_with_markers() {
        let doc = Document::new(vec![Node::new(NodeKind::Paragraph).with_content(vec![
            Node::text("bold", vec![Mark::new(MarkKind::Strong)]),
        ])]);
        assert_eq!(decode(&doc), "**bold**\n");
    }

    #[test]
    fn code_mark_is_not_escaped_inside_backticks() {
        let doc = Document::new(vec![Node::new(NodeKind::Paragraph).with_content(vec![
            Node::text("a*b*c", vec![Mark::new(MarkKind::Code)]),
        ])]);
        assert_eq!(decode(&doc), "`a*b*c`\n");
    }

    #[test]
    fn plain_text_escapes_special_characters() {
        let doc = Document::new(vec![Node::new(NodeKind::Paragraph).with_content(vec![
            Node::text("1 * 2 [x]", vec![]),
        ])]);
        assert_eq!(decode(&doc), "1 \\* 2 \\[x]\n");
    }

    #[test]
    fn identifier_style_underscores_are_not_escaped() {
        let doc = Document::new(vec![Node::new(NodeKind::Paragraph).with_content(vec![
            Node::text("white_check_mark", vec![]),
        ])]);
        assert_eq!(decode(&doc), "white_check_mark\n");
    }

    #[test]
    fn word_boundary_underscore_is_escaped() {
        let doc = Document::new(vec![Node::new(NodeKind::Paragraph).with_content(vec![
            Node::text("_hi_", vec![]),
        ])]);
        assert_eq!(decode(&doc), "\\_hi\\_\n");
    }

    #[test]
    fn ordered_list_is_renumbered_from_one() {
        let doc = Document::new(vec![Node::new(NodeKind::OrderedList).with_content(vec![
            Node::new(NodeKind::ListItem).with_content(vec![
                Node::new(NodeKind::Paragraph).with_content(vec![Node::text("a", vec![])]),
            ]),
            Node::new(NodeKind::ListItem).with_content(vec![
                Node::new(NodeKind::Paragraph).with_content(vec![Node::text("b", vec![])]),
            ]),
        ])]);
        assert_eq!(decode(&doc), "1. a\n2. b\n");
    }

    #[test]
    fn task_list_round_trips_check_state() {
        let doc = encode("- [x] done\n- [ ] pending\n");
        assert_eq!(decode(&doc), "- [x] done\n- [ ] pending\n");
    }

    #[test]
    fn blockquote_prefixes_every_line_including_blank_interior_lines() {
        let doc = encode("> a\n>\n> b\n");
        let rendered = decode(&doc);
        assert!(rendered.lines().all(|l| l == ">" || l.starts_with("> ")));
    }

    #[test]
    fn blockquote_with_blank_interior_line_stays_one_quote_on_reencode() {
        let doc = encode("> a\n>\n> b\n");
        let rendered = decode(&doc);
        let reencoded = encode(&rendered);
        assert_eq!(reencoded.content.len(), 1);
        assert_eq!(reencoded.content[0].kind, NodeKind::Blockquote);
    }

    #[test]
    fn table_renders_separator_row() {
        let doc = encode("| A | B |\n| --- | --- |\n| 1 | 2 |\n");
        let rendered = decode(&doc);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "| A | B |");
        assert_eq!(lines[1], "| --- | --- |");
        assert_eq!(lines[2], "| 1 | 2 |");
    }

    #[test]
    fn adjacent_plain_text_leaves_merge_before_rendering() {
        let doc = Document::new(vec![Node::new(NodeKind::Paragraph).with_content(vec![
            Node::text("foo", vec![]),
            Node::text("bar", vec![]),
        ])]);
        assert_eq!(decode(&doc), "foobar\n");
    }

    #[test]
    fn heading_level_is_clamped_when_rendering() {
        let doc = Document::new(vec![
            Node::new(NodeKind::Heading)
                .with_attr("level", 9_i64)
                .with_content(vec![Node::text("h", vec![])]),
        ]);
        assert_eq!(decode(&doc), "###### h\n");
    }
}
