//! Word-wrapping accumulator for a single run of inline text.

use std::fmt;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::Options;

/// Effectively "no wrapping".
const UNLIMITED: usize = usize::MAX;

/// Accumulates words into wrapped lines for one inline run (a block body or
/// a table cell).
///
/// Completed lines are kept as word lists; one in-progress line carries a
/// remaining column budget so each `push_word` is O(word).  All width
/// arithmetic is in terminal display columns, not bytes or chars.
#[derive(Debug)]
pub struct InlineTextBuilder {
    lines: Vec<Vec<String>>,
    next_line_words: Vec<String>,
    pub(crate) max_line_length: usize,
    next_line_available_chars: usize,
    wrap_characters: Vec<char>,
    force_wrap_on_limit: bool,
    /// Soft permission to break mid-token at the next concatenation.
    pub(crate) word_break_opportunity: bool,
    /// Whitespace was seen since the last word was added.
    pub(crate) stashed_space: bool,
}

impl InlineTextBuilder {
    /// Create a builder wrapping at `max_line_length` columns, or at the
    /// configured word-wrap width (unbounded if neither is set).
    pub fn new(options: &Options, max_line_length: Option<usize>) -> InlineTextBuilder {
        let max_line_length = max_line_length
            .or(options.wordwrap)
            .unwrap_or(UNLIMITED);
        InlineTextBuilder {
            lines: Vec::new(),
            next_line_words: Vec::new(),
            max_line_length,
            next_line_available_chars: max_line_length,
            wrap_characters: options.long_word_split.wrap_characters.clone(),
            force_wrap_on_limit: options.long_word_split.force_wrap_on_limit,
            word_break_opportunity: false,
            stashed_space: false,
        }
    }

    /// Append a word to the in-progress line, wrapping (and splitting the
    /// word if it is wider than a whole line) as needed.
    pub fn push_word(&mut self, word: &str) {
        if self.next_line_available_chars == 0 {
            self.start_new_line(1);
        }
        let space_cost = usize::from(!self.next_line_words.is_empty());
        let cost = display_width(word) + space_cost;
        if cost <= self.next_line_available_chars {
            html_trace!("push_word {:?} (cost {})", word, cost);
            self.next_line_words.push(word.to_string());
            self.next_line_available_chars -= cost;
        } else {
            let mut parts = self.split_long_word(word).into_iter();
            if let Some(first) = parts.next() {
                if !self.next_line_words.is_empty() {
                    self.start_new_line(1);
                }
                self.place_part(first);
            }
            for part in parts {
                self.start_new_line(1);
                self.place_part(part);
            }
        }
    }

    fn place_part(&mut self, part: String) {
        self.next_line_available_chars = self
            .next_line_available_chars
            .saturating_sub(display_width(&part));
        self.next_line_words.push(part);
    }

    /// Remove and return the last word of the in-progress line, restoring
    /// the budget it consumed.  Completed lines are untouched.
    pub fn pop_word(&mut self) -> Option<String> {
        let word = self.next_line_words.pop()?;
        let space_cost = usize::from(!self.next_line_words.is_empty());
        let cost = display_width(&word) + space_cost;
        self.next_line_available_chars = self
            .next_line_available_chars
            .saturating_add(cost)
            .min(self.max_line_length);
        Some(word)
    }

    /// Glue a word onto the previous one with no intervening space.  If a
    /// word-break opportunity is pending and the word would overflow the
    /// line, it is pushed as a separate word instead.
    pub fn concat_word(&mut self, word: &str) {
        if self.word_break_opportunity && display_width(word) > self.next_line_available_chars {
            self.push_word(word);
            self.word_break_opportunity = false;
        } else {
            match self.pop_word() {
                Some(last) => self.push_word(&(last + word)),
                None => self.push_word(word),
            }
        }
    }

    /// Commit the in-progress line; with `n > 1`, also emit `n - 1` empty
    /// lines.  The budget is reset to the full width.
    pub fn start_new_line(&mut self, n: usize) {
        self.lines.push(std::mem::take(&mut self.next_line_words));
        for _ in 1..n {
            self.lines.push(Vec::new());
        }
        self.next_line_available_chars = self.max_line_length;
    }

    /// Split a word wider than the line, preferring the configured wrap
    /// characters in order, falling back to a hard cut at the width limit
    /// when forced, and otherwise leaving the word intact.
    fn split_long_word(&mut self, word: &str) -> Vec<String> {
        let mut parts = Vec::new();
        let mut remaining = word;
        let mut wrap_idx = 0;
        while display_width(remaining) > self.max_line_length {
            let candidate_end = prefix_end_at_width(remaining, self.max_line_length);
            if candidate_end == 0 {
                // A single grapheme wider than the whole line.
                break;
            }
            let candidate = &remaining[..candidate_end];
            let mut split_at = None;
            while wrap_idx < self.wrap_characters.len() {
                let c = self.wrap_characters[wrap_idx];
                if let Some(pos) = candidate.rfind(c) {
                    // Keep the wrap character on the first line.
                    split_at = Some(pos + c.len_utf8());
                    break;
                }
                wrap_idx += 1;
            }
            match split_at {
                Some(pos) => {
                    parts.push(remaining[..pos].to_string());
                    remaining = &remaining[pos..];
                }
                None if self.force_wrap_on_limit => {
                    parts.push(candidate.to_string());
                    remaining = &remaining[candidate_end..];
                }
                None => break,
            }
        }
        parts.push(remaining.to_string());
        parts
    }

    /// True iff nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.next_line_words.is_empty()
    }

    /// Discard all accumulated content and reset the budget.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.next_line_words.clear();
        self.next_line_available_chars = self.max_line_length;
        self.word_break_opportunity = false;
        self.stashed_space = false;
    }
}

impl fmt::Display for InlineTextBuilder {
    /// Words joined by single spaces, lines joined by newlines; the
    /// in-progress line is the final line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for line in self.lines.iter().chain(std::iter::once(&self.next_line_words)) {
            if !first {
                f.write_str("\n")?;
            }
            first = false;
            f.write_str(&line.join(" "))?;
        }
        Ok(())
    }
}

fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Byte index of the longest prefix of `word` no wider than `cols`.
fn prefix_end_at_width(word: &str, cols: usize) -> usize {
    let mut width = 0;
    for (idx, c) in word.char_indices() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + cw > cols {
            return idx;
        }
        width += cw;
    }
    word.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Options;

    fn builder(width: usize) -> InlineTextBuilder {
        InlineTextBuilder::new(&Options::default(), Some(width))
    }

    fn builder_split(width: usize, chars: &[char], force: bool) -> InlineTextBuilder {
        let mut options = Options::default();
        options.long_word_split.wrap_characters = chars.to_vec();
        options.long_word_split.force_wrap_on_limit = force;
        InlineTextBuilder::new(&options, Some(width))
    }

    #[test]
    fn wraps_at_width() {
        let mut b = builder(10);
        for word in ["The", "quick", "brown", "fox"] {
            b.push_word(word);
        }
        assert_eq!(b.to_string(), "The quick\nbrown fox");
    }

    #[test]
    fn exact_fit_consumes_whole_budget() {
        let mut b = builder(9);
        b.push_word("The");
        b.push_word("quick");
        // "The quick" is exactly 9 columns; the next word must wrap.
        b.push_word("brown");
        assert_eq!(b.to_string(), "The quick\nbrown");
    }

    #[test]
    fn pop_word_restores_budget() {
        let mut b = builder(10);
        b.push_word("The");
        b.push_word("quick");
        assert_eq!(b.pop_word().as_deref(), Some("quick"));
        b.push_word("quick");
        b.push_word("brown");
        assert_eq!(b.to_string(), "The quick\nbrown");
    }

    #[test]
    fn pop_word_on_empty_line() {
        let mut b = builder(10);
        assert_eq!(b.pop_word(), None);
        b.push_word("one");
        b.start_new_line(1);
        // Completed lines are not popped.
        assert_eq!(b.pop_word(), None);
    }

    #[test]
    fn concat_word_accretes_without_space() {
        let mut b = builder(20);
        b.push_word("one");
        b.concat_word("two");
        assert_eq!(b.to_string(), "onetwo");
    }

    #[test]
    fn concat_word_honours_break_opportunity() {
        let mut b = builder(20);
        b.push_word(&"a".repeat(18));
        b.word_break_opportunity = true;
        b.concat_word(&"b".repeat(10));
        assert_eq!(b.to_string(), format!("{}\n{}", "a".repeat(18), "b".repeat(10)));
        assert!(!b.word_break_opportunity);
    }

    #[test]
    fn start_new_line_emits_blank_lines() {
        let mut b = builder(10);
        b.push_word("one");
        b.start_new_line(3);
        b.push_word("two");
        assert_eq!(b.to_string(), "one\n\n\ntwo");
    }

    #[test]
    fn long_word_without_split_chars_passes_through() {
        let mut b = builder(10);
        b.push_word(&"x".repeat(15));
        assert_eq!(b.to_string(), "x".repeat(15));
    }

    #[test]
    fn long_word_splits_at_wrap_character() {
        let mut b = builder_split(20, &['-'], false);
        b.push_word("aaaa-bbbb-cccc-dddd-eeee-ffff");
        assert_eq!(b.to_string(), "aaaa-bbbb-cccc-dddd-\neeee-ffff");
    }

    #[test]
    fn force_wrap_cuts_at_limit() {
        let mut b = builder_split(10, &[], true);
        b.push_word(&"x".repeat(25));
        assert_eq!(
            b.to_string(),
            format!("{}\n{}\n{}", "x".repeat(10), "x".repeat(10), "x".repeat(5))
        );
    }

    #[test]
    fn wide_characters_count_as_two_columns() {
        let mut b = builder(4);
        b.push_word("日本");
        b.push_word("語");
        assert_eq!(b.to_string(), "日本\n語");
    }

    #[test]
    fn clear_resets_state() {
        let mut b = builder(10);
        b.push_word("one");
        b.stashed_space = true;
        b.clear();
        assert!(b.is_empty());
        assert!(!b.stashed_space);
        b.push_word("twotwotwo1");
        assert_eq!(b.to_string(), "twotwotwo1");
    }
}
