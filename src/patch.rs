use crate::anchor::AnchorOptions;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// One surgical edit, as requested by the model inside `fs_apply_text_edits`.
///
/// The wire format is an object tagged by `type`. Edits whose `type` is
/// missing, not a string or not recognized become [`EditSpec::Unknown`] and
/// are skipped by the applicator, so one odd element never breaks a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum EditSpec {
    ReplaceText(ReplaceTextOp),
    ReplaceBetween(ReplaceBetweenOp),
    InsertBefore(InsertOp),
    InsertAfter(InsertOp),
    Unknown,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TaggedEdit {
    ReplaceText(ReplaceTextOp),
    ReplaceBetween(ReplaceBetweenOp),
    InsertBefore(InsertOp),
    InsertAfter(InsertOp),
    #[serde(other)]
    Unknown,
}

impl From<TaggedEdit> for EditSpec {
    fn from(edit: TaggedEdit) -> Self {
        match edit {
            TaggedEdit::ReplaceText(op) => EditSpec::ReplaceText(op),
            TaggedEdit::ReplaceBetween(op) => EditSpec::ReplaceBetween(op),
            TaggedEdit::InsertBefore(op) => EditSpec::InsertBefore(op),
            TaggedEdit::InsertAfter(op) => EditSpec::InsertAfter(op),
            TaggedEdit::Unknown => EditSpec::Unknown,
        }
    }
}

impl<'de> Deserialize<'de> for EditSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if !value.get("type").is_some_and(Value::is_string) {
            return Ok(EditSpec::Unknown);
        }
        TaggedEdit::deserialize(value)
            .map(EditSpec::from)
            .map_err(de::Error::custom)
    }
}

impl EditSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            EditSpec::ReplaceText(_) => "replace_text",
            EditSpec::ReplaceBetween(_) => "replace_between",
            EditSpec::InsertBefore(_) => "insert_before",
            EditSpec::InsertAfter(_) => "insert_after",
            EditSpec::Unknown => "unknown",
        }
    }
}

/// Matching flags shared by every edit kind. Defaults follow the tool schema:
/// case-sensitive, loose whitespace, normalized quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MatchFlags {
    pub case_sensitive: bool,
    pub loose_whitespace: bool,
    pub normalize_quotes: bool,
}

impl Default for MatchFlags {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            loose_whitespace: true,
            normalize_quotes: true,
        }
    }
}

impl MatchFlags {
    pub fn anchor_options(&self, use_regex: bool) -> AnchorOptions {
        AnchorOptions {
            use_regex,
            case_sensitive: self.case_sensitive,
            loose_whitespace: self.loose_whitespace,
            normalize_quotes: self.normalize_quotes,
        }
    }
}

/// Replaces every match of `find`, or only the `occurrence`-th one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplaceTextOp {
    pub find: String,
    pub replace: String,
    #[serde(default)]
    pub use_regex: bool,
    /// 1-based. `None` replaces all matches.
    #[serde(default)]
    pub occurrence: Option<usize>,
    #[serde(flatten)]
    pub flags: MatchFlags,
}

/// Replaces the span between a start and an end marker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReplaceBetweenOp {
    pub start_marker: String,
    pub end_marker: String,
    pub replacement: String,
    /// When true the markers themselves are replaced too.
    #[serde(default)]
    pub include_markers: bool,
    #[serde(default)]
    pub occurrence: Option<usize>,
    #[serde(flatten)]
    pub flags: MatchFlags,
}

/// Splices text next to an anchor. The side is given by the `EditSpec` variant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InsertOp {
    pub anchor: String,
    #[serde(rename = "insert")]
    pub insertion: String,
    #[serde(default)]
    pub occurrence: Option<usize>,
    #[serde(flatten)]
    pub flags: MatchFlags,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_replace_text_with_defaults() {
        let spec: EditSpec = serde_json::from_value(json!({
            "type": "replace_text",
            "find": "cat",
            "replace": "dog"
        }))
        .unwrap();

        let EditSpec::ReplaceText(op) = spec else {
            panic!("expected replace_text, got {spec:?}");
        };
        assert_eq!(op.find, "cat");
        assert!(!op.use_regex);
        assert_eq!(op.occurrence, None);
        assert_eq!(op.flags, MatchFlags::default());
    }

    #[test]
    fn test_deserialize_insert_uses_insert_field_and_flags() {
        let spec: EditSpec = serde_json::from_value(json!({
            "type": "insert_after",
            "anchor": "START",
            "insert": "-MID-",
            "occurrence": 2,
            "case_sensitive": false,
            "loose_whitespace": false
        }))
        .unwrap();

        let EditSpec::InsertAfter(op) = spec else {
            panic!("expected insert_after, got {spec:?}");
        };
        assert_eq!(op.insertion, "-MID-");
        assert_eq!(op.occurrence, Some(2));
        assert!(!op.flags.case_sensitive);
        assert!(!op.flags.loose_whitespace);
        assert!(op.flags.normalize_quotes);
    }

    #[test]
    fn test_unknown_type_is_kept_as_unknown() {
        let specs: Vec<EditSpec> = serde_json::from_value(json!([
            { "type": "delete_paragraph", "index": 3 },
            { "type": "replace_between", "start_marker": "A", "end_marker": "B", "replacement": "" }
        ]))
        .unwrap();

        assert_eq!(specs[0], EditSpec::Unknown);
        assert_eq!(specs[1].kind(), "replace_between");
    }

    #[test]
    fn test_missing_or_non_string_type_is_unknown() {
        let specs: Vec<EditSpec> = serde_json::from_value(json!([
            { "find": "cat", "replace": "dog" },
            { "type": null, "find": "cat", "replace": "dog" },
            "replace_text",
            { "type": "insert_before", "anchor": "", "insert": "x" }
        ]))
        .unwrap();

        assert_eq!(specs[..3], [EditSpec::Unknown, EditSpec::Unknown, EditSpec::Unknown]);
        assert_eq!(specs[3].kind(), "insert_before");
    }

    #[test]
    fn test_missing_mandatory_field_is_rejected() {
        let result: Result<EditSpec, _> = serde_json::from_value(json!({
            "type": "replace_text",
            "find": "cat"
        }));
        assert!(result.is_err());
    }
}
