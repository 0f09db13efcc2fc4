//! Walks a `pulldown-cmark` event stream into the local [`Block`]/[`Inline`]
//! AST (see `ast.rs`). This is the only module that touches the parser
//! crate directly; everything downstream operates on the local tree.

use std::iter::Peekable;

use pulldown_cmark::{
    Event, HeadingLevel, Options, Parser, Tag, TagEnd,
};

use crate::ast::{Block, Inline};

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_GFM
}

pub fn parse_document(src: &str) -> Vec<Block> {
    let parser = Parser::new_ext(src, options());
    let events: Vec<Event> = parser.collect();
    let mut iter = events.into_iter().peekable();
    parse_blocks(&mut iter)
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

type Events<'a> = Peekable<std::vec::IntoIter<Event<'a>>>;

fn parse_blocks(iter: &mut Events<'_>) -> Vec<Block> {
    let mut out = Vec::new();

    while let Some(event) = iter.peek() {
        if matches!(event, Event::End(_)) {
            break;
        }
        let event = iter.next().expect("peeked");

        match event {
            Event::Start(Tag::Paragraph) => {
                let inlines = parse_inlines(iter);
                consume_end(iter);
                if !inlines_empty(&inlines) {
                    out.push(Block::Paragraph(inlines));
                }
            }
            Event::Start(Tag::Heading { level, .. }) => {
                let inlines = parse_inlines(iter);
                consume_end(iter);
                out.push(Block::Heading(heading_level(level), inlines));
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    pulldown_cmark::CodeBlockKind::Fenced(info) => {
                        let info = info.to_string();
                        let lang = info.split_whitespace().next().unwrap_or("").to_string();
                        if lang.is_empty() { None } else { Some(lang) }
                    }
                    pulldown_cmark::CodeBlockKind::Indented => None,
                };
                let mut text = String::new();
                loop {
                    match iter.peek() {
                        Some(Event::Text(t)) => {
                            text.push_str(t);
                            iter.next();
                        }
                        Some(Event::End(TagEnd::CodeBlock)) => {
                            iter.next();
                            break;
                        }
                        Some(_) => {
                            iter.next();
                        }
                        None => break,
                    }
                }
                out.push(Block::CodeBlock { lang, text });
            }
            Event::Start(Tag::BlockQuote(_)) => {
                let inner = parse_blocks(iter);
                consume_end(iter);
                out.push(Block::Blockquote(inner));
            }
            Event::Start(Tag::List(start)) => {
                out.push(parse_list(iter, start.is_some()));
                consume_end(iter);
            }
            Event::Start(Tag::Table(_aligns)) => {
                out.push(parse_table(iter));
                consume_end(iter);
            }
            Event::Start(Tag::FootnoteDefinition(_)) => {
                // Footnotes are outside the spec's node-type set; content is
                // parsed only to keep the event cursor aligned, then dropped.
                let _ = parse_blocks(iter);
                consume_end(iter);
            }
            Event::Rule => out.push(Block::ThematicBreak),
            Event::Html(html) => {
                out.push(Block::HtmlBlock(strip_tags(&html)));
            }
            Event::Text(_) | Event::SoftBreak | Event::HardBreak => {
                // Bare inline content at block level (rare, malformed input);
                // wrap as a single paragraph so nothing is silently lost.
                let mut inlines = Vec::new();
                collect_loose_inline(&event, &mut inlines);
                while let Some(ev) = iter.peek() {
                    if matches!(ev, Event::Text(_) | Event::SoftBreak | Event::HardBreak) {
                        let ev = iter.next().unwrap();
                        collect_loose_inline(&ev, &mut inlines);
                    } else {
                        break;
                    }
                }
                if !inlines_empty(&inlines) {
                    out.push(Block::Paragraph(inlines));
                }
            }
            _ => {}
        }
    }

    out
}

fn collect_loose_inline(event: &Event, out: &mut Vec<Inline>) {
    match event {
        Event::Text(t) => out.push(Inline::Text(t.to_string())),
        Event::SoftBreak => out.push(Inline::Text(" ".to_string())),
        Event::HardBreak => out.push(Inline::HardBreak),
        _ => {}
    }
}

fn consume_end(iter: &mut Events<'_>) {
    if matches!(iter.peek(), Some(Event::End(_))) {
        iter.next();
    }
}

fn parse_list(iter: &mut Events<'_>, ordered: bool) -> Block {
    let mut plain_items: Vec<Vec<Block>> = Vec::new();
    let mut task_items: Vec<(bool, Vec<Inline>)> = Vec::new();
    let mut is_task_list = false;

    while let Some(Event::Start(Tag::Item)) = iter.peek() {
        iter.next();

        if let Some(Event::TaskListMarker(checked)) = iter.peek() {
            let checked = *checked;
            iter.next();
            is_task_list = true;
            let blocks = parse_blocks(iter);
            consume_end(iter);
            task_items.push((checked, crate::ast::flatten_to_inlines(&blocks)));
        } else {
            let blocks = parse_blocks(iter);
            consume_end(iter);
            plain_items.push(blocks);
        }
    }

    if is_task_list {
        Block::TaskList(task_items)
    } else if ordered {
        Block::OrderedList(plain_items)
    } else {
        Block::BulletList(plain_items)
    }
}

fn parse_table(iter: &mut Events<'_>) -> Block {
    let mut header = Vec::new();
    let mut rows = Vec::new();

    if let Some(Event::Start(Tag::TableHead)) = iter.peek() {
        iter.next();
        while let Some(Event::Start(Tag::TableCell)) = iter.peek() {
            iter.next();
            let inlines = parse_inlines(iter);
            consume_end(iter);
            header.push(inlines);
        }
        consume_end(iter);
    }

    while let Some(Event::Start(Tag::TableRow)) = iter.peek() {
        iter.next();
        let mut row = Vec::new();
        while let Some(Event::Start(Tag::TableCell)) = iter.peek() {
            iter.next();
            let inlines = parse_inlines(iter);
            consume_end(iter);
            row.push(inlines);
        }
        consume_end(iter);
        rows.push(row);
    }

    Block::Table { header, rows }
}

fn parse_inlines(iter: &mut Events<'_>) -> Vec<Inline> {
    let mut out = Vec::new();

    while let Some(event) = iter.peek() {
        if matches!(event, Event::End(_)) {
            break;
        }
        let event = iter.next().expect("peeked");

        match event {
            Event::Text(t) => out.push(Inline::Text(t.to_string())),
            Event::Code(t) => out.push(Inline::Code(t.to_string())),
            Event::SoftBreak => out.push(Inline::Text(" ".to_string())),
            Event::HardBreak => out.push(Inline::HardBreak),
            Event::InlineHtml(_) | Event::Html(_) => {
                // Tags stripped; any enclosed text arrives as separate Text
                // events and is kept.
            }
            Event::FootnoteReference(label) => {
                out.push(Inline::Text(format!("[^{label}]")));
            }
            Event::Start(Tag::Emphasis) => {
                let inner = parse_inlines(iter);
                consume_end(iter);
                out.push(Inline::Emphasis(inner));
            }
            Event::Start(Tag::Strong) => {
                let inner = parse_inlines(iter);
                consume_end(iter);
                out.push(Inline::Strong(inner));
            }
            Event::Start(Tag::Strikethrough) => {
                let inner = parse_inlines(iter);
                consume_end(iter);
                out.push(Inline::Strike(inner));
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                let inner = parse_inlines(iter);
                consume_end(iter);
                out.push(Inline::Link {
                    href: dest_url.to_string(),
                    inner,
                });
            }
            Event::Start(Tag::Image { dest_url: _, title, .. }) => {
                // Alt text is the inline content of the image; title is
                // dropped. pulldown-cmark yields the alt text as nested
                // Text events.
                let alt = parse_inlines(iter);
                consume_end(iter);
                let text = plain_text(&alt);
                let text = if text.is_empty() { title.to_string() } else { text };
                out.push(Inline::Text(text));
            }
            _ => {}
        }
    }

    out
}

fn plain_text(inlines: &[Inline]) -> String {
    let mut s = String::new();
    for i in inlines {
        match i {
            Inline::Text(t) => s.push_str(t),
            Inline::Code(t) => s.push_str(t),
            Inline::Emphasis(inner) | Inline::Strong(inner) | Inline::Strike(inner) => {
                s.push_str(&plain_text(inner))
            }
            Inline::Link { inner, .. } => s.push_str(&plain_text(inner)),
            Inline::HardBreak => s.push(' '),
        }
    }
    s
}

fn inlines_empty(inlines: &[Inline]) -> bool {
    plain_text(inlines).trim().is_empty() && !inlines.iter().any(|i| matches!(i, Inline::Code(_)))
}

/// Strip HTML tags from `s` with a single linear scan, discarding
/// attributes along with the tag itself.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_simple_tags() {
        assert_eq!(strip_tags("<b>hi</b>"), "hi");
        assert_eq!(strip_tags("<div class=\"x\">hi</div>"), "hi");
    }
}
