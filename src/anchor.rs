//! # Anchor Matcher
//!
//! Turns an anchor string into a compiled [`Matcher`]. Anchors are either raw
//! regular expressions or literal text. Literal anchors are compiled one
//! character at a time so that loosening (whitespace runs, smart punctuation)
//! never has to post-process an already escaped pattern.

use crate::error::EditError;
use regex::{Captures, Regex, RegexBuilder};
use std::ops::Range;

const DOUBLE_QUOTE_CLASS: &str = "[\"\u{201C}\u{201D}]";
const SINGLE_QUOTE_CLASS: &str = "['\u{2018}\u{2019}]";
const DASH_CLASS: &str = "[-\u{2013}\u{2014}]";
const WHITESPACE_RUN: &str = r"\s+";

/// Flags controlling how an anchor is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorOptions {
    pub use_regex: bool,
    pub case_sensitive: bool,
    pub loose_whitespace: bool,
    pub normalize_quotes: bool,
}

impl Default for AnchorOptions {
    fn default() -> Self {
        Self {
            use_regex: false,
            case_sensitive: true,
            loose_whitespace: true,
            normalize_quotes: true,
        }
    }
}

impl AnchorOptions {
    /// Exact, case-sensitive literal matching with no loosening.
    pub fn exact() -> Self {
        Self {
            use_regex: false,
            case_sensitive: true,
            loose_whitespace: false,
            normalize_quotes: false,
        }
    }
}

/// A compiled anchor. Built per operation call and never cached.
#[derive(Debug)]
pub struct Matcher {
    regex: Regex,
    expand_captures: bool,
}

impl Matcher {
    pub fn build(anchor: &str, options: &AnchorOptions) -> Result<Self, EditError> {
        let pattern = if options.use_regex {
            anchor.to_string()
        } else {
            compile_literal(anchor, options.loose_whitespace, options.normalize_quotes)
        };

        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(!options.case_sensitive)
            .build()
            .map_err(|source| EditError::Pattern {
                pattern: anchor.to_string(),
                source,
            })?;

        Ok(Self {
            regex,
            expand_captures: options.use_regex,
        })
    }

    /// Finds the first match starting at or after `offset`.
    pub fn find_at(&self, text: &str, offset: usize) -> Option<Range<usize>> {
        if offset > text.len() || !text.is_char_boundary(offset) {
            return None;
        }
        self.regex.find_at(text, offset).map(|m| m.range())
    }

    /// Finds the `occurrence`-th match (1-based), each search resuming where the
    /// previous match ended. `0` is treated as `1`.
    pub fn find_nth(&self, text: &str, occurrence: usize) -> Option<Range<usize>> {
        let mut cursor = Some(0);
        let mut found = None;
        for _ in 0..occurrence.max(1) {
            let span = self.find_at(text, cursor?)?;
            cursor = resume_after(text, &span);
            found = Some(span);
        }
        found
    }

    /// Replaces every non-overlapping match in one pass. Returns the new text
    /// and the number of replacements.
    pub fn replace_all(&self, text: &str, replacement: &str) -> (String, usize) {
        self.substitute(text, replacement, |_| true)
    }

    /// Replaces only the `occurrence`-th match (1-based) of a single
    /// left-to-right scan, leaving the others untouched.
    pub fn replace_nth(&self, text: &str, replacement: &str, occurrence: usize) -> (String, usize) {
        self.substitute(text, replacement, |index| index + 1 == occurrence)
    }

    fn substitute(
        &self,
        text: &str,
        replacement: &str,
        mut selected: impl FnMut(usize) -> bool,
    ) -> (String, usize) {
        let mut output = String::with_capacity(text.len());
        let mut last_end = 0;
        let mut replaced = 0;

        for (index, caps) in self.regex.captures_iter(text).enumerate() {
            let Some(whole) = caps.get(0) else { continue };
            if !selected(index) {
                continue;
            }
            output.push_str(&text[last_end..whole.start()]);
            self.push_replacement(&caps, replacement, &mut output);
            last_end = whole.end();
            replaced += 1;
        }

        output.push_str(&text[last_end..]);
        (output, replaced)
    }

    fn push_replacement(&self, caps: &Captures<'_>, replacement: &str, output: &mut String) {
        if self.expand_captures {
            caps.expand(replacement, output);
        } else {
            output.push_str(replacement);
        }
    }
}

/// Where the next occurrence search starts. Empty matches step over one
/// character so the scan always makes progress.
fn resume_after(text: &str, span: &Range<usize>) -> Option<usize> {
    if !span.is_empty() {
        return Some(span.end);
    }
    text[span.end..]
        .chars()
        .next()
        .map(|c| span.end + c.len_utf8())
}

/// Walks a literal anchor once, emitting an escaped fragment per character and
/// a single `\s+` per whitespace run.
fn compile_literal(anchor: &str, loose_whitespace: bool, normalize_quotes: bool) -> String {
    let mut pattern = String::with_capacity(anchor.len() * 2);
    let mut chars = anchor.chars().peekable();
    let mut buf = [0u8; 4];

    while let Some(c) = chars.next() {
        if loose_whitespace && c.is_whitespace() {
            while chars.next_if(|next| next.is_whitespace()).is_some() {}
            pattern.push_str(WHITESPACE_RUN);
            continue;
        }

        let class = if normalize_quotes {
            punctuation_class(c)
        } else {
            None
        };
        match class {
            Some(class) => pattern.push_str(class),
            None => pattern.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }

    pattern
}

fn punctuation_class(c: char) -> Option<&'static str> {
    match c {
        '"' | '\u{201C}' | '\u{201D}' => Some(DOUBLE_QUOTE_CLASS),
        '\'' | '\u{2018}' | '\u{2019}' => Some(SINGLE_QUOTE_CLASS),
        '-' | '\u{2013}' | '\u{2014}' => Some(DASH_CLASS),
        _ => None,
    }
}
