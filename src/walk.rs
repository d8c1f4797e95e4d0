//! DOM traversal and per-tag formatting.

use html5ever::Attribute;
use markup5ever_rcdom::{Handle, NodeData};
use unicode_width::UnicodeWidthStr;

use crate::render::builder::BlockTextBuilder;
use crate::{Options, Result};

/// Widest horizontal rule emitted for `<hr>`.
const MAX_RULE_WIDTH: usize = 40;

/// Walks a parsed document, driving a [`BlockTextBuilder`].
pub(crate) struct Walker<'a> {
    options: &'a Options,
    list_depth: usize,
}

impl<'a> Walker<'a> {
    pub fn new(options: &'a Options) -> Walker<'a> {
        Walker {
            options,
            list_depth: 0,
        }
    }

    pub fn walk(&mut self, document: &Handle, builder: &mut BlockTextBuilder) -> Result<()> {
        self.walk_node(document, 0, builder)
    }

    fn walk_children(
        &mut self,
        handle: &Handle,
        depth: usize,
        builder: &mut BlockTextBuilder,
    ) -> Result<()> {
        let children = handle.children.borrow().clone();
        for (i, child) in children.iter().enumerate() {
            if let Some(limit) = self.options.max_child_nodes {
                if i >= limit {
                    builder.add_inline(&self.options.ellipsis, true);
                    break;
                }
            }
            self.walk_node(child, depth + 1, builder)?;
        }
        Ok(())
    }

    fn walk_node(
        &mut self,
        handle: &Handle,
        depth: usize,
        builder: &mut BlockTextBuilder,
    ) -> Result<()> {
        match handle.data {
            NodeData::Document => self.walk_children(handle, depth, builder),
            NodeData::Text { ref contents } => {
                builder.add_inline(&contents.borrow(), false);
                Ok(())
            }
            NodeData::Element {
                ref name,
                ref attrs,
                ..
            } => {
                if let Some(max) = self.options.max_depth {
                    if depth >= max {
                        builder.add_inline(&self.options.ellipsis, true);
                        return Ok(());
                    }
                }
                html_trace!("element <{}> at depth {}", name.local, depth);
                match name.expanded() {
                    expanded_name!(html "head")
                    | expanded_name!(html "script")
                    | expanded_name!(html "style")
                    | expanded_name!(html "template") => Ok(()),
                    expanded_name!(html "p") => self.format_block(handle, depth, builder, 2),
                    expanded_name!(html "div")
                    | expanded_name!(html "article")
                    | expanded_name!(html "section")
                    | expanded_name!(html "header")
                    | expanded_name!(html "footer")
                    | expanded_name!(html "main")
                    | expanded_name!(html "nav")
                    | expanded_name!(html "aside")
                    | expanded_name!(html "address")
                    | expanded_name!(html "figure")
                    | expanded_name!(html "figcaption") => {
                        self.format_block(handle, depth, builder, 1)
                    }
                    expanded_name!(html "h1")
                    | expanded_name!(html "h2")
                    | expanded_name!(html "h3")
                    | expanded_name!(html "h4")
                    | expanded_name!(html "h5")
                    | expanded_name!(html "h6") => self.format_heading(handle, depth, builder),
                    expanded_name!(html "pre") => self.format_pre(handle, depth, builder),
                    expanded_name!(html "blockquote") => {
                        self.format_blockquote(handle, depth, builder)
                    }
                    expanded_name!(html "br") => {
                        builder.add_line_break();
                        Ok(())
                    }
                    expanded_name!(html "wbr") => {
                        builder.add_word_break_opportunity();
                        Ok(())
                    }
                    expanded_name!(html "hr") => self.format_rule(builder),
                    expanded_name!(html "a") => {
                        self.format_anchor(handle, depth, builder, &attrs.borrow())
                    }
                    expanded_name!(html "img") => {
                        self.format_image(builder, &attrs.borrow());
                        Ok(())
                    }
                    expanded_name!(html "ul") => self.format_list(handle, depth, builder, None),
                    expanded_name!(html "ol") => {
                        let start = get_attr("start", &attrs.borrow())
                            .and_then(|v| v.parse::<i64>().ok())
                            .unwrap_or(1);
                        self.format_list(handle, depth, builder, Some(start))
                    }
                    expanded_name!(html "table") => self.format_table(handle, depth, builder),
                    _ => self.walk_children(handle, depth, builder),
                }
            }
            _ => Ok(()),
        }
    }

    fn format_block(
        &mut self,
        handle: &Handle,
        depth: usize,
        builder: &mut BlockTextBuilder,
        line_breaks: usize,
    ) -> Result<()> {
        builder.open_block(line_breaks, 0, false);
        self.walk_children(handle, depth, builder)?;
        builder.close_block(line_breaks, None)
    }

    fn format_heading(
        &mut self,
        handle: &Handle,
        depth: usize,
        builder: &mut BlockTextBuilder,
    ) -> Result<()> {
        builder.open_block(2, 0, false);
        if self.options.uppercase_headings {
            builder.push_word_transform(Box::new(|word: &str| word.to_uppercase()));
            self.walk_children(handle, depth, builder)?;
            builder.pop_word_transform();
        } else {
            self.walk_children(handle, depth, builder)?;
        }
        builder.close_block(2, None)
    }

    fn format_pre(
        &mut self,
        handle: &Handle,
        depth: usize,
        builder: &mut BlockTextBuilder,
    ) -> Result<()> {
        builder.open_block(2, 0, true);
        self.walk_children(handle, depth, builder)?;
        builder.close_block(2, None)
    }

    fn format_blockquote(
        &mut self,
        handle: &Handle,
        depth: usize,
        builder: &mut BlockTextBuilder,
    ) -> Result<()> {
        builder.open_block(2, 2, false);
        self.walk_children(handle, depth, builder)?;
        let quote = |text: &str| -> String {
            text.trim_matches('\n')
                .split('\n')
                .map(|line| {
                    if line.is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {}", line)
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        };
        builder.close_block(2, Some(&quote))
    }

    fn format_rule(&mut self, builder: &mut BlockTextBuilder) -> Result<()> {
        let width = self
            .options
            .wordwrap
            .map_or(MAX_RULE_WIDTH, |w| w.min(MAX_RULE_WIDTH));
        builder.open_block(2, 0, false);
        builder.add_inline(&"-".repeat(width), true);
        builder.close_block(2, None)
    }

    fn format_anchor(
        &mut self,
        handle: &Handle,
        depth: usize,
        builder: &mut BlockTextBuilder,
        attrs: &[Attribute],
    ) -> Result<()> {
        let href = get_attr("href", attrs);
        self.walk_children(handle, depth, builder)?;
        if self.options.show_link_hrefs {
            if let Some(href) = href {
                // Fragment links carry no information outside the page.
                if !href.is_empty() && !href.starts_with('#') {
                    builder.add_inline(&format!(" [{}]", href), true);
                }
            }
        }
        Ok(())
    }

    fn format_image(&mut self, builder: &mut BlockTextBuilder, attrs: &[Attribute]) {
        if let Some(alt) = get_attr("alt", attrs) {
            if !alt.is_empty() {
                builder.add_inline(&format!("[{}]", alt), false);
            }
        }
    }

    fn format_list(
        &mut self,
        handle: &Handle,
        depth: usize,
        builder: &mut BlockTextBuilder,
        start: Option<i64>,
    ) -> Result<()> {
        let items: Vec<Handle> = handle
            .children
            .borrow()
            .iter()
            .filter(|child| is_element(child, &expanded_name!(html "li")))
            .cloned()
            .collect();
        if items.is_empty() {
            return Ok(());
        }
        let nested = self.list_depth > 0;
        let prefixes: Vec<String> = match start {
            None => {
                let prefix = if nested {
                    self.options.item_prefix.trim_start_matches(' ').to_string()
                } else {
                    self.options.item_prefix.clone()
                };
                items.iter().map(|_| prefix.clone()).collect()
            }
            Some(start) => (start..)
                .take(items.len())
                .map(|i| {
                    if nested {
                        format!("{}. ", i)
                    } else {
                        format!(" {}. ", i)
                    }
                })
                .collect(),
        };
        let prefix_width = prefixes
            .iter()
            .map(|p| UnicodeWidthStr::width(p.as_str()))
            .max()
            .unwrap_or(0);
        let list_breaks = if nested { 1 } else { 2 };

        builder.open_block(list_breaks, 0, false);
        self.list_depth += 1;
        for (item, prefix) in items.iter().zip(&prefixes) {
            builder.open_block(1, prefix_width, false);
            let result = self.walk_children(item, depth + 1, builder);
            if result.is_err() {
                self.list_depth -= 1;
                return result;
            }
            let padded = format!("{:<width$}", prefix, width = prefix_width);
            let indent = " ".repeat(prefix_width);
            let mark = |text: &str| -> String {
                let mut out = String::new();
                for (i, line) in text.split('\n').enumerate() {
                    if i == 0 {
                        out.push_str(&padded);
                    } else {
                        out.push('\n');
                        out.push_str(&indent);
                    }
                    out.push_str(line);
                }
                out
            };
            if let Err(e) = builder.close_block(1, Some(&mark)) {
                self.list_depth -= 1;
                return Err(e);
            }
        }
        self.list_depth -= 1;
        builder.close_block(list_breaks, None)
    }

    fn format_table(
        &mut self,
        handle: &Handle,
        depth: usize,
        builder: &mut BlockTextBuilder,
    ) -> Result<()> {
        let children = handle.children.borrow().clone();
        for child in &children {
            if is_element(child, &expanded_name!(html "caption")) {
                self.format_block(child, depth, builder, 2)?;
            }
        }
        builder.open_table();
        self.format_table_rows(&children, depth, builder, false)?;
        builder.close_table(
            self.options.table.col_spacing,
            self.options.table.row_spacing,
            2,
            2,
        )
    }

    fn format_table_rows(
        &mut self,
        children: &[Handle],
        depth: usize,
        builder: &mut BlockTextBuilder,
        header_section: bool,
    ) -> Result<()> {
        for child in children {
            if is_element(child, &expanded_name!(html "tr")) {
                self.format_table_row(child, depth, builder, header_section)?;
            } else if is_element(child, &expanded_name!(html "thead")) {
                let section = child.children.borrow().clone();
                self.format_table_rows(&section, depth + 1, builder, true)?;
            } else if is_element(child, &expanded_name!(html "tbody"))
                || is_element(child, &expanded_name!(html "tfoot"))
            {
                let section = child.children.borrow().clone();
                self.format_table_rows(&section, depth + 1, builder, false)?;
            }
        }
        Ok(())
    }

    fn format_table_row(
        &mut self,
        row: &Handle,
        depth: usize,
        builder: &mut BlockTextBuilder,
        header_section: bool,
    ) -> Result<()> {
        builder.open_table_row()?;
        let cells = row.children.borrow().clone();
        for cell in &cells {
            let is_th = is_element(cell, &expanded_name!(html "th"));
            if !is_th && !is_element(cell, &expanded_name!(html "td")) {
                continue;
            }
            let (colspan, rowspan) = match cell.data {
                NodeData::Element { ref attrs, .. } => {
                    let attrs = attrs.borrow();
                    (parse_span("colspan", &attrs), parse_span("rowspan", &attrs))
                }
                _ => (1, 1),
            };
            builder.open_table_cell(Some(self.options.table.max_column_width))?;
            self.walk_children(cell, depth + 1, builder)?;
            builder.close_table_cell(colspan, rowspan, header_section || is_th)?;
        }
        builder.close_table_row()
    }
}

fn is_element(handle: &Handle, expected: &html5ever::ExpandedName) -> bool {
    match handle.data {
        NodeData::Element { ref name, .. } => &name.expanded() == expected,
        _ => false,
    }
}

fn get_attr(name: &str, attrs: &[Attribute]) -> Option<String> {
    attrs
        .iter()
        .find(|attr| &*attr.name.local == name)
        .map(|attr| attr.value.to_string())
}

/// Span attributes default to 1 when missing or malformed.
fn parse_span(name: &str, attrs: &[Attribute]) -> usize {
    get_attr(name, attrs)
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(1)
        .max(1)
}
