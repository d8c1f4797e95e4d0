//! A library to convert HTML to formatted plain text.
//!
//! The document is parsed with `html5ever` and walked in document order;
//! block structure (paragraphs, headings, lists, blockquotes, preformatted
//! text) becomes line breaks and indentation, inline text is collapsed and
//! word-wrapped, and tables are laid out as aligned columns, including
//! cells spanning several rows or columns.
//!
//! The simplest usage is [`from_read`]:
//!
//! ```rust
//! use html2plain::from_read;
//!
//! let html = b"\
//!     <ul>\
//!       <li>Item one</li>\
//!       <li>Item two</li>\
//!       <li>Item three</li>\
//!     </ul>";
//! let text = from_read(&html[..], 20).unwrap();
//! assert_eq!(text, " * Item one\n * Item two\n * Item three");
//! ```
//!
//! Conversions are configured through the [`config`] module:
//!
//! ```rust
//! use html2plain::{config, SpanPolicy};
//!
//! let html = b"<h1>Title</h1>";
//! let text = config::plain()
//!     .uppercase_headings(false)
//!     .span_policy(SpanPolicy::First)
//!     .string_from_read(&html[..], 40)
//!     .unwrap();
//! assert_eq!(text, "Title");
//! ```

#![deny(missing_docs)]

#[macro_use]
extern crate html5ever;

#[macro_use]
mod macros;

pub mod render;
mod walk;

use std::io;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use markup5ever_rcdom::RcDom;

use render::builder::BlockTextBuilder;
pub use render::table::SpanPolicy;

/// Errors from HTML conversion.
///
/// Input-data irregularities never surface here; they degrade to
/// best-effort text.  These errors indicate misuse of the builder API,
/// invalid configuration, or a failed read of the input.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The builder was driven incorrectly, e.g. a row opened outside a
    /// table or a close without a matching open.  Indicates a formatter
    /// bug, not an input problem.
    #[error("builder used incorrectly: {0}")]
    InvalidState(&'static str),
    /// A table span rendering policy name was not recognized.
    #[error("unknown table span policy {0:?}")]
    UnknownSpanPolicy(String),
    /// Reading the input failed.
    #[error("error reading input: {0}")]
    Io(#[from] io::Error),
}

/// A `Result` using this crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// How long words without natural break points are split.
#[derive(Debug, Clone, Default)]
pub struct LongWordSplit {
    /// Characters eligible for mid-word splitting, in preference order.
    pub wrap_characters: Vec<char>,
    /// Hard-cut at the width limit when no wrap character matches.
    pub force_wrap_on_limit: bool,
}

/// Table-specific knobs.
#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Spaces between columns.
    pub col_spacing: usize,
    /// Blank lines between rows.
    pub row_spacing: usize,
    /// Wrap width for text inside a cell.
    pub max_column_width: usize,
    /// How spanning cells are rendered.
    pub span_policy: SpanPolicy,
}

impl Default for TableOptions {
    fn default() -> TableOptions {
        TableOptions {
            col_spacing: 3,
            row_spacing: 0,
            max_column_width: 60,
            span_policy: SpanPolicy::Repeat,
        }
    }
}

/// Conversion settings, built once per conversion and read-only from
/// then on.  Usually constructed through [`config`].
#[derive(Debug, Clone)]
pub struct Options {
    /// Wrap width in display columns; `None` disables wrapping.
    pub wordwrap: Option<usize>,
    /// Marker for unordered list items.
    pub item_prefix: String,
    /// Render headings in upper case.
    pub uppercase_headings: bool,
    /// Append ` [href]` after link text.
    pub show_link_hrefs: bool,
    /// Marker substituted where depth or node limits truncate output.
    pub ellipsis: String,
    /// Maximum tree depth to descend; deeper content is elided.
    pub max_depth: Option<usize>,
    /// Maximum children walked per node; further siblings are elided.
    pub max_child_nodes: Option<usize>,
    /// Maximum input length in bytes; longer input is truncated with a
    /// warning before parsing.
    pub max_input_length: usize,
    /// Mid-word splitting of words wider than a line.
    pub long_word_split: LongWordSplit,
    /// Table layout settings.
    pub table: TableOptions,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            wordwrap: Some(80),
            item_prefix: " * ".to_string(),
            uppercase_headings: true,
            show_link_hrefs: true,
            ellipsis: "...".to_string(),
            max_depth: None,
            max_child_nodes: None,
            max_input_length: 1 << 24,
            long_word_split: LongWordSplit::default(),
            table: TableOptions::default(),
        }
    }
}

/// Configure the HTML to text conversion.
///
/// Start from [`plain()`](config::plain), chain the settings you need,
/// and finish with
/// [`string_from_read`](config::Config::string_from_read).
pub mod config {
    use std::io;

    use crate::{Options, SpanPolicy};

    /// Configuration for a conversion, built by chained methods.
    #[derive(Debug, Clone)]
    pub struct Config {
        options: Options,
    }

    /// A plain-text configuration with default settings.
    pub fn plain() -> Config {
        Config {
            options: Options::default(),
        }
    }

    impl Config {
        /// Limit the tree depth walked; deeper content is replaced by an
        /// ellipsis.
        pub fn max_depth(mut self, depth: usize) -> Config {
            self.options.max_depth = Some(depth);
            self
        }

        /// Limit the number of children walked per node.
        pub fn max_child_nodes(mut self, count: usize) -> Config {
            self.options.max_child_nodes = Some(count);
            self
        }

        /// Truncate input longer than `bytes` before parsing.
        pub fn max_input_length(mut self, bytes: usize) -> Config {
            self.options.max_input_length = bytes;
            self
        }

        /// Select how table cells spanning several rows or columns are
        /// rendered.
        pub fn span_policy(mut self, policy: SpanPolicy) -> Config {
            self.options.table.span_policy = policy;
            self
        }

        /// Allow splitting over-long words at any of `chars` (in
        /// preference order); `force_wrap_on_limit` hard-cuts at the
        /// width when none matches.
        pub fn split_long_words(mut self, chars: &[char], force_wrap_on_limit: bool) -> Config {
            self.options.long_word_split.wrap_characters = chars.to_vec();
            self.options.long_word_split.force_wrap_on_limit = force_wrap_on_limit;
            self
        }

        /// Render headings in upper case (default) or as written.
        pub fn uppercase_headings(mut self, uppercase: bool) -> Config {
            self.options.uppercase_headings = uppercase;
            self
        }

        /// Append link targets after link text (default) or omit them.
        pub fn show_link_hrefs(mut self, show: bool) -> Config {
            self.options.show_link_hrefs = show;
            self
        }

        /// Reads HTML from `input` and returns a string with text wrapped
        /// to `width` columns.
        pub fn string_from_read<R: io::Read>(mut self, input: R, width: usize) -> crate::Result<String> {
            self.options.wordwrap = Some(width.max(1));
            crate::convert(input, &self.options)
        }
    }
}

/// Reads HTML from `input`, and returns a `String` with text wrapped to
/// `width` columns.
pub fn from_read<R: io::Read>(input: R, width: usize) -> Result<String> {
    config::plain().string_from_read(input, width)
}

fn convert<R: io::Read>(mut input: R, options: &Options) -> Result<String> {
    let mut bytes = Vec::new();
    input.read_to_end(&mut bytes)?;
    if bytes.len() > options.max_input_length {
        log::warn!(
            "input length {} exceeds the limit of {}; truncating",
            bytes.len(),
            options.max_input_length
        );
        bytes.truncate(options.max_input_length);
    }

    let parse_options = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let dom = parse_document(RcDom::default(), parse_options)
        .from_utf8()
        .read_from(&mut bytes.as_slice())?;

    let mut builder = BlockTextBuilder::new(options);
    walk::Walker::new(options).walk(&dom.document, &mut builder)?;
    Ok(builder.into_string())
}
