//! The text accumulation engine: whitespace collapsing, word wrapping,
//! the nested-context stack, the builder driven by formatters, and table
//! layout.

pub mod builder;
pub mod inline;
pub(crate) mod stack;
pub mod table;
pub(crate) mod whitespace;
