//! A small intermediate AST sitting between the commonmark/GFM event
//! stream and DocFmt emission. Keeping this layer means the encoder's
//! structural rules (blockquote flattening, task-list detection, mark
//! nesting) are expressed over a plain tree instead of an event cursor.

#[derive(Debug, Clone)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading(u8, Vec<Inline>),
    CodeBlock {
        lang: Option<String>,
        text: String,
    },
    Blockquote(Vec<Block>),
    BulletList(Vec<Vec<Block>>),
    OrderedList(Vec<Vec<Block>>),
    /// Inline-only content per item; bool is the checked state.
    TaskList(Vec<(bool, Vec<Inline>)>),
    Table {
        header: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    ThematicBreak,
    /// Already tag-stripped text extracted from a raw HTML block.
    HtmlBlock(String),
}

#[derive(Debug, Clone)]
pub enum Inline {
    Text(String),
    HardBreak,
    Code(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strike(Vec<Inline>),
    Link { href: String, inner: Vec<Inline> },
}

/// Pull every inline leaf out of a block list, unwrapping paragraph
/// wrappers. Used to build task-item content, which is inline-only even
/// though commonmark represents a loose list item's content as a
/// paragraph.
pub fn flatten_to_inlines(blocks: &[Block]) -> Vec<Inline> {
    let mut out = Vec::new();
    for block in blocks {
        match block {
            Block::Paragraph(inlines) => out.extend(inlines.iter().cloned()),
            Block::Heading(_, inlines) => out.extend(inlines.iter().cloned()),
            _ => {}
        }
    }
    out
}
