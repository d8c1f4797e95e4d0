//! Nested rendering contexts, chained into a stack through `next`.

use crate::render::inline::InlineTextBuilder;
use crate::render::table::TableCell;

/// One open context.  The chain of `next` links is the builder's stack;
/// the item with no `next` is the root block.
pub(crate) struct StackItem {
    pub next: Option<Box<StackItem>>,
    pub kind: StackKind,
}

pub(crate) enum StackKind {
    /// A generic block of flowing text.
    Block(BlockFrame),
    /// A table cell; block-like but destined for the table grid.
    Cell(BlockFrame),
    /// A table collecting completed rows.
    Table(TableFrame),
    /// A table row collecting completed cells.
    Row(RowFrame),
}

/// Accumulation state shared by blocks and table cells.
pub(crate) struct BlockFrame {
    pub inline: InlineTextBuilder,
    /// Finalized text: merged child blocks, or verbatim content when `is_pre`.
    pub raw_text: String,
    /// Minimum line breaks before this content when merged into the parent.
    pub leading_line_breaks: usize,
    /// Breaks owed before the next piece of content.
    pub stashed_line_breaks: usize,
    pub is_pre: bool,
}

impl BlockFrame {
    /// The frame's full text so far.
    pub fn text(&self) -> String {
        if self.is_pre || self.inline.is_empty() {
            self.raw_text.clone()
        } else {
            let mut text = self.raw_text.clone();
            text.push_str(&self.inline.to_string());
            text
        }
    }
}

pub(crate) struct TableFrame {
    pub rows: Vec<Vec<TableCell>>,
}

pub(crate) struct RowFrame {
    pub cells: Vec<TableCell>,
}
