//! The block text builder: the surface that per-tag formatters drive.

use std::mem;

use crate::render::inline::InlineTextBuilder;
use crate::render::stack::{BlockFrame, RowFrame, StackItem, StackKind, TableFrame};
use crate::render::table::{self, SpanPolicy, TableCell};
use crate::render::whitespace::WhitespaceProcessor;
use crate::{Error, Options, Result};

/// Narrower than this and wrapping stops being useful.
const MIN_WRAP_WIDTH: usize = 20;

/// A composable per-word transform, applied to each word before it enters
/// an inline builder.
pub type WordTransform = Box<dyn Fn(&str) -> String>;

/// Accumulates the output text of one conversion.
///
/// Formatters open and close nested contexts (blocks, tables, rows,
/// cells) and push inline text into whichever context is current.  When a
/// context closes, its finished text folds into the parent, reconciling
/// requested line breaks by taking the maximum of the two sides.  After
/// all opens are matched by closes, [`BlockTextBuilder::into_string`]
/// yields the root block's text.
pub struct BlockTextBuilder<'a> {
    options: &'a Options,
    whitespace: WhitespaceProcessor,
    current: StackItem,
    transforms: Vec<WordTransform>,
}

impl<'a> BlockTextBuilder<'a> {
    /// Create a builder whose root block wraps at the configured width.
    pub fn new(options: &'a Options) -> BlockTextBuilder<'a> {
        BlockTextBuilder {
            options,
            whitespace: WhitespaceProcessor,
            current: StackItem {
                next: None,
                kind: StackKind::Block(BlockFrame {
                    inline: InlineTextBuilder::new(options, None),
                    raw_text: String::new(),
                    leading_line_breaks: 1,
                    stashed_line_breaks: 0,
                    is_pre: false,
                }),
            },
            transforms: Vec::new(),
        }
    }

    fn push_item(&mut self, kind: StackKind) {
        let next = mem::replace(
            &mut self.current,
            StackItem { next: None, kind },
        );
        self.current.next = Some(Box::new(next));
    }

    fn pop_item(&mut self) -> Result<StackItem> {
        let next = self
            .current
            .next
            .take()
            .ok_or(Error::InvalidState("close without a matching open"))?;
        Ok(mem::replace(&mut self.current, *next))
    }

    /// Wrap width of the nearest enclosing block or cell.
    fn current_wrap_width(&self) -> usize {
        let mut item = &self.current;
        loop {
            match &item.kind {
                StackKind::Block(frame) | StackKind::Cell(frame) => {
                    return frame.inline.max_line_length
                }
                _ => match &item.next {
                    Some(next) => item = next,
                    None => return self.options.wordwrap.unwrap_or(usize::MAX),
                },
            }
        }
    }

    fn current_is_pre(&self) -> bool {
        let mut item = &self.current;
        loop {
            match &item.kind {
                StackKind::Block(frame) | StackKind::Cell(frame) => return frame.is_pre,
                _ => match &item.next {
                    Some(next) => item = next,
                    None => return false,
                },
            }
        }
    }

    fn current_block_frame_mut(&mut self) -> Option<&mut BlockFrame> {
        match &mut self.current.kind {
            StackKind::Block(frame) | StackKind::Cell(frame) => Some(frame),
            _ => None,
        }
    }

    /// Open a nested block.  `reserved_line_length` narrows the wrap width
    /// for prefixes the caller will add after wrapping (list markers,
    /// quote markers); the width never drops below a usable minimum.
    pub fn open_block(&mut self, leading_line_breaks: usize, reserved_line_length: usize, is_pre: bool) {
        html_trace!("open_block(leading={}, reserved={})", leading_line_breaks, reserved_line_length);
        let width = MIN_WRAP_WIDTH.max(
            self.current_wrap_width()
                .saturating_sub(reserved_line_length),
        );
        let is_pre = is_pre || self.current_is_pre();
        self.push_item(StackKind::Block(BlockFrame {
            inline: InlineTextBuilder::new(self.options, Some(width)),
            raw_text: String::new(),
            leading_line_breaks,
            stashed_line_breaks: 0,
            is_pre,
        }));
    }

    /// Close the current block and fold its text into the parent.  The
    /// transform, if given, runs on the whole block after wrapping, so
    /// width reserved at `open_block` stays honest.
    pub fn close_block(
        &mut self,
        trailing_line_breaks: usize,
        transform: Option<&dyn Fn(&str) -> String>,
    ) -> Result<()> {
        let item = self.pop_item()?;
        let StackKind::Block(frame) = item.kind else {
            return Err(Error::InvalidState("close_block: current item is not a block"));
        };
        let text = frame.text();
        let text = match transform {
            Some(f) => f(&text),
            None => text,
        };
        html_trace!("close_block -> {:?}", text);
        self.merge_text(
            &text,
            frame.leading_line_breaks,
            frame.stashed_line_breaks.max(trailing_line_breaks),
        )
    }

    /// Add inline text to the current block or cell; a no-op in any other
    /// context.  Preformatted content is taken verbatim.
    pub fn add_inline(&mut self, text: &str, no_word_transform: bool) {
        let BlockTextBuilder {
            current,
            transforms,
            whitespace,
            ..
        } = self;
        let frame = match &mut current.kind {
            StackKind::Block(frame) | StackKind::Cell(frame) => frame,
            _ => return,
        };
        if frame.is_pre {
            frame.raw_text.push_str(text);
            return;
        }
        if text.is_empty() {
            return;
        }
        if WhitespaceProcessor::is_whitespace_only(text) && frame.stashed_line_breaks > 0 {
            // Whitespace between blocks is insignificant.
            return;
        }
        if frame.stashed_line_breaks > 0 {
            frame.inline.start_new_line(frame.stashed_line_breaks);
            frame.stashed_line_breaks = 0;
        }
        if no_word_transform || transforms.is_empty() {
            whitespace.shrink_wrap_add(&mut frame.inline, text, |word| word.to_string());
        } else {
            whitespace.shrink_wrap_add(&mut frame.inline, text, |word| {
                transforms
                    .iter()
                    .rev()
                    .fold(word.to_string(), |acc, f| f(&acc))
            });
        }
    }

    /// Force a line break inside the current block or cell.
    pub fn add_line_break(&mut self) {
        if let Some(frame) = self.current_block_frame_mut() {
            if frame.is_pre {
                frame.raw_text.push('\n');
            } else {
                frame.inline.start_new_line(1);
            }
        }
    }

    /// Permit (but do not force) a wrap at the next word concatenation.
    pub fn add_word_break_opportunity(&mut self) {
        if let Some(frame) = self.current_block_frame_mut() {
            frame.inline.word_break_opportunity = true;
        }
    }

    /// Push a per-word transform; transforms compose newest-first.
    pub fn push_word_transform(&mut self, transform: WordTransform) {
        self.transforms.push(transform);
    }

    /// Pop the most recently pushed word transform.
    pub fn pop_word_transform(&mut self) {
        self.transforms.pop();
    }

    /// Open a table context.
    pub fn open_table(&mut self) {
        self.push_item(StackKind::Table(TableFrame { rows: Vec::new() }));
    }

    /// Open a row; the current context must be a table.
    pub fn open_table_row(&mut self) -> Result<()> {
        if !matches!(self.current.kind, StackKind::Table(_)) {
            return Err(Error::InvalidState("open_table_row: current item is not a table"));
        }
        self.push_item(StackKind::Row(RowFrame { cells: Vec::new() }));
        Ok(())
    }

    /// Open a cell; the current context must be a row.  The cell wraps at
    /// `max_column_width` rather than the enclosing block width.
    pub fn open_table_cell(&mut self, max_column_width: Option<usize>) -> Result<()> {
        if !matches!(self.current.kind, StackKind::Row(_)) {
            return Err(Error::InvalidState("open_table_cell: current item is not a table row"));
        }
        self.push_item(StackKind::Cell(BlockFrame {
            inline: InlineTextBuilder::new(self.options, max_column_width),
            raw_text: String::new(),
            leading_line_breaks: 1,
            stashed_line_breaks: 0,
            is_pre: false,
        }));
        Ok(())
    }

    /// Close the current cell and record it on the parent row.  Only
    /// newline characters are trimmed from the cell text; interior
    /// structure survives for the table engine to linearize.
    pub fn close_table_cell(&mut self, colspan: usize, rowspan: usize, header: bool) -> Result<()> {
        let item = self.pop_item()?;
        let StackKind::Cell(frame) = item.kind else {
            return Err(Error::InvalidState("close_table_cell: current item is not a table cell"));
        };
        let text = frame.text();
        let StackKind::Row(row) = &mut self.current.kind else {
            return Err(Error::InvalidState("close_table_cell: parent is not a table row"));
        };
        row.cells.push(TableCell {
            colspan,
            rowspan,
            text: text.trim_matches('\n').to_string(),
            header,
        });
        Ok(())
    }

    /// Close the current row and record it on the parent table.
    pub fn close_table_row(&mut self) -> Result<()> {
        let item = self.pop_item()?;
        let StackKind::Row(row) = item.kind else {
            return Err(Error::InvalidState("close_table_row: current item is not a table row"));
        };
        let StackKind::Table(table) = &mut self.current.kind else {
            return Err(Error::InvalidState("close_table_row: parent is not a table"));
        };
        table.rows.push(row.cells);
        Ok(())
    }

    /// Close the current table, lay it out, and fold the rendered text
    /// into the parent.  An empty table contributes nothing, not even its
    /// requested line breaks.
    pub fn close_table(
        &mut self,
        col_spacing: usize,
        row_spacing: usize,
        leading_line_breaks: usize,
        trailing_line_breaks: usize,
    ) -> Result<()> {
        let item = self.pop_item()?;
        let StackKind::Table(frame) = item.kind else {
            return Err(Error::InvalidState("close_table: current item is not a table"));
        };
        let policy = self.options.table.span_policy;
        let text = table::render_table(&frame.rows, col_spacing, row_spacing, policy)
            .or_else(|| {
                // Tag mode declined this table; fall back to repeating.
                table::render_table(&frame.rows, col_spacing, row_spacing, SpanPolicy::Repeat)
            })
            .unwrap_or_default();
        if text.is_empty() {
            return Ok(());
        }
        self.merge_text(&text, leading_line_breaks, trailing_line_breaks)
    }

    /// Fold `text` into the current block or cell.  Adjacent break
    /// requests reconcile to their maximum, never their sum.
    fn merge_text(&mut self, text: &str, leading: usize, trailing: usize) -> Result<()> {
        let frame = self
            .current_block_frame_mut()
            .ok_or(Error::InvalidState("only blocks and table cells can contain text"))?;
        let parent_text = frame.text();
        frame.inline.clear();
        let breaks = frame.stashed_line_breaks.max(leading);
        if parent_text.is_empty() {
            frame.raw_text = text.to_string();
            frame.leading_line_breaks = frame.leading_line_breaks.max(breaks);
        } else {
            let mut merged = parent_text;
            for _ in 0..breaks {
                merged.push('\n');
            }
            merged.push_str(text);
            frame.raw_text = merged;
        }
        frame.stashed_line_breaks = trailing;
        Ok(())
    }

    /// The finished output: the root block's accumulated text.
    pub fn into_string(self) -> String {
        let mut item = self.current;
        while let Some(next) = item.next {
            item = *next;
        }
        match item.kind {
            StackKind::Block(frame) | StackKind::Cell(frame) => frame.text(),
            _ => String::new(),
        }
    }
}
