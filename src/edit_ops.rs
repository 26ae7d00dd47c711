//! # Edit Operations
//!
//! Pure text transformations behind every [`EditSpec`]. Each operation takes
//! the current buffer and returns the new buffer together with the number of
//! changes it made. A missing anchor, marker or occurrence is not an error:
//! the content comes back untouched with zero changes, so the model can retry
//! with a better anchor.

use crate::anchor::{AnchorOptions, Matcher};
use crate::error::EditError;
use crate::patch::{EditSpec, InsertOp, ReplaceBetweenOp, ReplaceTextOp};

/// The outcome of applying one edit to an in-memory buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditResult {
    pub content: String,
    pub changes_applied: usize,
}

impl EditResult {
    fn unchanged(content: &str) -> Self {
        Self {
            content: content.to_string(),
            changes_applied: 0,
        }
    }
}

/// Which side of the anchor an insertion lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Before,
    After,
}

impl EditSpec {
    /// Applies this edit to `content`. Unknown edit kinds leave it untouched.
    pub fn apply(&self, content: &str) -> Result<EditResult, EditError> {
        match self {
            EditSpec::ReplaceText(op) => apply_replace_text(content, op),
            EditSpec::ReplaceBetween(op) => apply_replace_between(content, op),
            EditSpec::InsertBefore(op) => apply_insert(content, op, Position::Before),
            EditSpec::InsertAfter(op) => apply_insert(content, op, Position::After),
            EditSpec::Unknown => Ok(EditResult::unchanged(content)),
        }
    }
}

fn apply_replace_text(content: &str, op: &ReplaceTextOp) -> Result<EditResult, EditError> {
    replace_text(
        content,
        &op.find,
        &op.replace,
        &op.flags.anchor_options(op.use_regex),
        op.occurrence,
    )
}

fn apply_replace_between(content: &str, op: &ReplaceBetweenOp) -> Result<EditResult, EditError> {
    replace_between(
        content,
        &op.start_marker,
        &op.end_marker,
        &op.replacement,
        op.include_markers,
        op.occurrence,
        &op.flags.anchor_options(false),
    )
}

fn apply_insert(content: &str, op: &InsertOp, position: Position) -> Result<EditResult, EditError> {
    insert_at_anchor(
        content,
        &op.anchor,
        &op.insertion,
        position,
        op.occurrence,
        &op.flags.anchor_options(false),
    )
}

/// Replaces matches of `find`.
///
/// With `occurrence` unset every match is replaced in a single pass; inserted
/// text is never re-matched. With `occurrence = Some(n)` only the n-th match
/// of that same scan is replaced, and nothing changes when there are fewer
/// than `n` matches.
pub fn replace_text(
    content: &str,
    find: &str,
    replace: &str,
    options: &AnchorOptions,
    occurrence: Option<usize>,
) -> Result<EditResult, EditError> {
    let matcher = Matcher::build(find, options)?;
    let (new_content, replaced) = match occurrence {
        None => matcher.replace_all(content, replace),
        Some(n) => matcher.replace_nth(content, replace, n),
    };
    Ok(EditResult {
        content: new_content,
        changes_applied: replaced,
    })
}

/// Replaces the text between the `occurrence`-th start/end marker pair.
///
/// Pairs are located sequentially: find the start marker, then the end marker
/// after it, and resume the next pair's search after that end marker. With
/// `include_markers` the whole span including both markers is replaced;
/// otherwise only the text strictly between them.
pub fn replace_between(
    content: &str,
    start_marker: &str,
    end_marker: &str,
    replacement: &str,
    include_markers: bool,
    occurrence: Option<usize>,
    options: &AnchorOptions,
) -> Result<EditResult, EditError> {
    let start_matcher = Matcher::build(start_marker, options)?;
    let end_matcher = Matcher::build(end_marker, options)?;

    let mut search_from = 0;
    let mut pair = None;
    for _ in 0..occurrence.unwrap_or(1).max(1) {
        let Some(start) = start_matcher.find_at(content, search_from) else {
            return Ok(EditResult::unchanged(content));
        };
        let Some(end) = end_matcher.find_at(content, start.end) else {
            return Ok(EditResult::unchanged(content));
        };
        search_from = next_pair_offset(content, start.start, end.end);
        pair = Some((start, end));
    }

    let Some((start, end)) = pair else {
        return Ok(EditResult::unchanged(content));
    };

    let (keep_before, keep_after) = if include_markers {
        (start.start, end.end)
    } else {
        (start.end, end.start)
    };

    let mut new_content =
        String::with_capacity(content.len() - (keep_after - keep_before) + replacement.len());
    new_content.push_str(&content[..keep_before]);
    new_content.push_str(replacement);
    new_content.push_str(&content[keep_after..]);

    Ok(EditResult {
        content: new_content,
        changes_applied: 1,
    })
}

/// Steps past a pair that consumed no text so the next search cannot find it
/// again.
fn next_pair_offset(content: &str, pair_start: usize, pair_end: usize) -> usize {
    if pair_end > pair_start {
        return pair_end;
    }
    content[pair_end..]
        .chars()
        .next()
        .map_or(content.len() + 1, |c| pair_end + c.len_utf8())
}

/// Splices `insertion` before or after the `occurrence`-th match of `anchor`.
/// A zero-length match is a valid insertion point.
pub fn insert_at_anchor(
    content: &str,
    anchor: &str,
    insertion: &str,
    position: Position,
    occurrence: Option<usize>,
    options: &AnchorOptions,
) -> Result<EditResult, EditError> {
    let matcher = Matcher::build(anchor, options)?;
    let Some(span) = matcher.find_nth(content, occurrence.unwrap_or(1)) else {
        return Ok(EditResult::unchanged(content));
    };

    let index = match position {
        Position::Before => span.start,
        Position::After => span.end,
    };

    let mut new_content = String::with_capacity(content.len() + insertion.len());
    new_content.push_str(&content[..index]);
    new_content.push_str(insertion);
    new_content.push_str(&content[index..]);

    Ok(EditResult {
        content: new_content,
        changes_applied: 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> AnchorOptions {
        AnchorOptions::default()
    }

    #[test]
    fn test_replace_text_all_occurrences() {
        let result = replace_text("cat and cat", "cat", "dog", &defaults(), None).unwrap();
        assert_eq!(result.content, "dog and dog");
        assert_eq!(result.changes_applied, 2);
    }

    #[test]
    fn test_replace_text_nth_occurrence() {
        let result = replace_text("cat and cat", "cat", "dog", &defaults(), Some(2)).unwrap();
        assert_eq!(result.content, "cat and dog");
        assert_eq!(result.changes_applied, 1);
    }

    #[test]
    fn test_replace_text_occurrence_beyond_matches_changes_nothing() {
        let result = replace_text("cat and cat", "cat", "dog", &defaults(), Some(3)).unwrap();
        assert_eq!(result.content, "cat and cat");
        assert_eq!(result.changes_applied, 0);
    }

    #[test]
    fn test_replace_text_zero_occurrence_changes_nothing() {
        let result = replace_text("cat", "cat", "dog", &defaults(), Some(0)).unwrap();
        assert_eq!(result.content, "cat");
        assert_eq!(result.changes_applied, 0);
    }

    #[test]
    fn test_replace_text_loose_whitespace_across_lines() {
        let content = "# Chapter\n1\n\nIt was dark.";
        let result = replace_text(content, "Chapter 1", "Chapter One", &defaults(), None).unwrap();
        assert_eq!(result.content, "# Chapter One\n\nIt was dark.");
        assert_eq!(result.changes_applied, 1);
    }

    #[test]
    fn test_replace_text_invalid_regex_is_an_error() {
        let options = AnchorOptions {
            use_regex: true,
            ..defaults()
        };
        let result = replace_text("abc", "[a-", "x", &options, None);
        assert!(matches!(result, Err(EditError::Pattern { .. })));
    }

    #[test]
    fn test_replace_between_keeps_markers() {
        let result = replace_between(
            "pre<!--A-->mid<!--B-->post",
            "<!--A-->",
            "<!--B-->",
            "X",
            false,
            None,
            &defaults(),
        )
        .unwrap();
        assert_eq!(result.content, "pre<!--A-->X<!--B-->post");
        assert_eq!(result.changes_applied, 1);
    }

    #[test]
    fn test_replace_between_including_markers() {
        let result = replace_between(
            "pre<!--A-->mid<!--B-->post",
            "<!--A-->",
            "<!--B-->",
            "X",
            true,
            None,
            &defaults(),
        )
        .unwrap();
        assert_eq!(result.content, "preXpost");
        assert_eq!(result.changes_applied, 1);
    }

    #[test]
    fn test_replace_between_second_pair() {
        let content = "[a]one[b] [a]two[b] [a]three[b]";
        let result =
            replace_between(content, "[a]", "[b]", "2", false, Some(2), &defaults()).unwrap();
        assert_eq!(result.content, "[a]one[b] [a]2[b] [a]three[b]");
    }

    #[test]
    fn test_replace_between_end_marker_must_follow_start() {
        let content = "END first START middle";
        let result =
            replace_between(content, "START", "END", "x", false, None, &defaults()).unwrap();
        assert_eq!(result.content, content);
        assert_eq!(result.changes_applied, 0);
    }

    #[test]
    fn test_replace_between_missing_pair_is_soft() {
        let content = "[a]one[b]";
        for (start, end, occurrence) in [("[x]", "[b]", None), ("[a]", "[x]", None), ("[a]", "[b]", Some(2))] {
            let result =
                replace_between(content, start, end, "new", true, occurrence, &defaults()).unwrap();
            assert_eq!(result.content, content);
            assert_eq!(result.changes_applied, 0);
        }
    }

    #[test]
    fn test_insert_after_anchor() {
        let result =
            insert_at_anchor("STARTEND", "START", "-MID-", Position::After, None, &defaults())
                .unwrap();
        assert_eq!(result.content, "START-MID-END");
        assert_eq!(result.changes_applied, 1);
    }

    #[test]
    fn test_insert_before_second_occurrence() {
        let content = "## Scene\nA\n## Scene\nB";
        let result = insert_at_anchor(
            content,
            "## Scene",
            "<!-- cut -->\n",
            Position::Before,
            Some(2),
            &defaults(),
        )
        .unwrap();
        assert_eq!(result.content, "## Scene\nA\n<!-- cut -->\n## Scene\nB");
    }

    #[test]
    fn test_insert_at_zero_length_match() {
        let result =
            insert_at_anchor("body", "", "head ", Position::Before, None, &defaults()).unwrap();
        assert_eq!(result.content, "head body");
        assert_eq!(result.changes_applied, 1);
    }

    #[test]
    fn test_absent_anchor_is_identity_for_every_operation() {
        let content = "The quick brown fox.";
        let specs: Vec<EditSpec> = serde_json::from_value(serde_json::json!([
            { "type": "replace_text", "find": "zebra", "replace": "x" },
            { "type": "replace_text", "find": "z+", "replace": "x", "use_regex": true },
            { "type": "replace_between", "start_marker": "<<", "end_marker": ">>", "replacement": "x" },
            { "type": "insert_before", "anchor": "zebra", "insert": "x" },
            { "type": "insert_after", "anchor": "zebra", "insert": "x" }
        ]))
        .unwrap();

        for spec in specs {
            let result = spec.apply(content).unwrap();
            assert_eq!(result.content, content, "{} changed the text", spec.kind());
            assert_eq!(result.changes_applied, 0);
        }
    }

    #[test]
    fn test_unknown_spec_is_identity() {
        let result = EditSpec::Unknown.apply("text").unwrap();
        assert_eq!(result, EditResult::unchanged("text"));
    }
}
