//! Maps review "lines" onto structural positions.
//!
//! The review service numbers every leaf text-bearing block of a document
//! (paragraphs, headings, code blocks, and the paragraphs nested inside list
//! items or quotes) from 1 in document order. [`build_line_index`] walks the
//! block tree once and records, for each such line, the span covering the
//! block's content interior.
//!
//! The table is a snapshot: it must be rebuilt after every document mutation
//! and is never patched in place.

use crate::markdown::{Block, Document, Node};

/// Structural span of one review line. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

impl LineSpan {
    pub fn new(line: usize, start: usize, end: usize) -> Self {
        Self {
            line,
            start,
            end: end.max(start),
        }
    }

    pub fn width(&self) -> usize {
        self.end - self.start
    }

    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position <= self.end
    }
}

/// Builds the ordered line table for a document snapshot.
///
/// A document without any text-bearing block still yields one synthetic line
/// covering the whole document, so lookups for line 1 never fail just because
/// the document is empty.
pub fn build_line_index(document: &Document) -> Vec<LineSpan> {
    let (spans, end) = index_nodes(&document.blocks, 0, Vec::new());
    if spans.is_empty() {
        return vec![LineSpan::new(1, 0, end)];
    }
    spans
}

/// Folds `nodes` starting at `offset`, returning the extended table and the
/// position right after the last node.
fn index_nodes(nodes: &[Node], offset: usize, spans: Vec<LineSpan>) -> (Vec<LineSpan>, usize) {
    nodes
        .iter()
        .fold((spans, offset), |(spans, pos), node| index_node(node, pos, spans))
}

fn index_node(node: &Node, pos: usize, mut spans: Vec<LineSpan>) -> (Vec<LineSpan>, usize) {
    match &node.block {
        block if block.is_text_block() => {
            let start = pos + 1;
            spans.push(LineSpan::new(spans.len() + 1, start, start + block.content_size()));
            (spans, pos + node.node_size())
        }
        Block::Quote { content } => {
            let (spans, inner_end) = index_nodes(content, pos + 1, spans);
            (spans, inner_end + 1)
        }
        Block::List { items, .. } => {
            let (spans, items_end) = items.iter().fold((spans, pos + 1), |(spans, item_pos), item| {
                let (spans, inner_end) = index_nodes(&item.content, item_pos + 1, spans);
                (spans, inner_end + 1)
            });
            (spans, items_end + 1)
        }
        _ => (spans, pos + node.node_size()),
    }
}
