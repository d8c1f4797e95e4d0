//! Whitespace collapsing for inline text.

use crate::render::inline::InlineTextBuilder;

/// Collapses runs of whitespace while feeding words into an
/// [`InlineTextBuilder`].
///
/// Words on either side of a call boundary are glued together unless
/// whitespace separated them in the source, so inline markup split across
/// several text nodes (`one<b>two</b>`) still forms a single token.
#[derive(Debug, Default)]
pub(crate) struct WhitespaceProcessor;

impl WhitespaceProcessor {
    /// Whitespace in the HTML sense.  Non-breaking spaces are deliberately
    /// not included; they are word characters.
    pub(crate) fn is_whitespace(c: char) -> bool {
        matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c')
    }

    pub(crate) fn is_whitespace_only(text: &str) -> bool {
        text.chars().all(Self::is_whitespace)
    }

    /// Collapse whitespace in `text` and merge the remaining words into
    /// `inline`, applying `transform` to each word first.
    pub(crate) fn shrink_wrap_add<F>(&self, inline: &mut InlineTextBuilder, text: &str, transform: F)
    where
        F: Fn(&str) -> String,
    {
        if text.is_empty() {
            return;
        }
        let previously_stashed = inline.stashed_space;
        let leading_ws = text.chars().next().is_some_and(Self::is_whitespace);
        let trailing_ws = text.chars().next_back().is_some_and(Self::is_whitespace);

        let mut any_word = false;
        for word in text.split(Self::is_whitespace).filter(|w| !w.is_empty()) {
            let word = transform(word);
            if !any_word && !leading_ws && !previously_stashed {
                // No space separates this word from the previous text node.
                inline.concat_word(&word);
            } else {
                inline.push_word(&word);
            }
            any_word = true;
        }

        inline.stashed_space = if any_word {
            trailing_ws
        } else {
            // Whitespace-only run: remember that a separator was seen.
            previously_stashed || !text.is_empty()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::inline::InlineTextBuilder;
    use crate::Options;

    fn builder(width: usize) -> InlineTextBuilder {
        InlineTextBuilder::new(&Options::default(), Some(width))
    }

    #[test]
    fn collapses_internal_whitespace() {
        let mut inline = builder(80);
        WhitespaceProcessor.shrink_wrap_add(&mut inline, "one \t \n two", |w| w.to_string());
        assert_eq!(inline.to_string(), "one two");
    }

    #[test]
    fn glues_adjacent_runs_without_whitespace() {
        let mut inline = builder(80);
        let ws = WhitespaceProcessor;
        ws.shrink_wrap_add(&mut inline, "one", |w| w.to_string());
        ws.shrink_wrap_add(&mut inline, "two three", |w| w.to_string());
        assert_eq!(inline.to_string(), "onetwo three");
    }

    #[test]
    fn respects_boundary_whitespace() {
        let mut inline = builder(80);
        let ws = WhitespaceProcessor;
        ws.shrink_wrap_add(&mut inline, "one ", |w| w.to_string());
        ws.shrink_wrap_add(&mut inline, "two", |w| w.to_string());
        assert_eq!(inline.to_string(), "one two");
    }

    #[test]
    fn whitespace_only_run_acts_as_separator() {
        let mut inline = builder(80);
        let ws = WhitespaceProcessor;
        ws.shrink_wrap_add(&mut inline, "one", |w| w.to_string());
        ws.shrink_wrap_add(&mut inline, "  ", |w| w.to_string());
        ws.shrink_wrap_add(&mut inline, "two", |w| w.to_string());
        assert_eq!(inline.to_string(), "one two");
    }

    #[test]
    fn applies_word_transform() {
        let mut inline = builder(80);
        WhitespaceProcessor.shrink_wrap_add(&mut inline, "one two", |w| w.to_uppercase());
        assert_eq!(inline.to_string(), "ONE TWO");
    }
}
