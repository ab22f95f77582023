//! Shorthand field aliases
//!
//! Authors may abbreviate field names in quiz, assignment and assignment-group
//! documents. Each table maps a shorthand to the canonical LMS field name and
//! is applied once, at parse time.

use serde_json::{Map, Value};

/// A shorthand → canonical lookup table.
pub type AliasTable = &'static [(&'static str, &'static str)];

pub const ANSWER_KEYS: AliasTable = &[
    ("comments", "answer_comments"),
    ("match_left", "answer_match_left"),
    ("ml", "answer_match_left"),
    ("match_right", "answer_match_right"),
    ("mr", "answer_match_right"),
    ("incorrect", "matching_answer_incorrect_matches"),
    ("weight", "answer_weight"),
    ("w", "answer_weight"),
    ("html", "answer_html"),
    ("h", "answer_html"),
    ("text", "answer_text"),
    ("t", "answer_text"),
];

pub const QUESTION_KEYS: AliasTable = &[
    ("text", "question_text"),
    ("type", "question_type"),
    ("points", "points_possible"),
    ("p", "points_possible"),
    ("incorrect", "matching_answer_incorrect_matches"),
    ("answer", "answers"),
    ("a", "answers"),
];

pub const QUESTION_TYPES: AliasTable = &[
    ("tf", "true_false_question"),
    ("mc", "multiple_choice_question"),
    ("ma", "multiple_answers_question"),
    ("match", "matching_question"),
    ("mat", "matching_question"),
    ("sa", "short_answer_question"),
    ("e", "essay_question"),
    ("u", "file_upload_question"),
];

pub const GROUP_KEYS: AliasTable = &[("weight", "group_weight"), ("w", "group_weight"), ("n", "name")];

pub const GROUP_RULE_KEYS: AliasTable = &[
    ("high", "drop_highest"),
    ("h", "drop_highest"),
    ("low", "drop_lowest"),
    ("l", "drop_lowest"),
    ("never", "never_drop"),
];

pub const SUBMISSION_TYPES: AliasTable = &[
    ("text", "online_text_entry"),
    ("url", "online_url"),
    ("upload", "online_upload"),
];

/// Look up the canonical name for `key`, or return it unchanged.
pub fn canonical<'a>(table: AliasTable, key: &'a str) -> &'a str {
    table
        .iter()
        .find(|(short, _)| *short == key)
        .map(|(_, full)| *full)
        .unwrap_or(key)
}

/// Rename every key of `map` through `table`.
///
/// A shorthand colliding with its own canonical name collapses into a single
/// entry; authors should not spell a field both ways.
pub fn rename_keys(map: Map<String, Value>, table: AliasTable) -> Map<String, Value> {
    map.into_iter()
        .map(|(k, v)| (canonical(table, &k).to_string(), v))
        .collect()
}

/// Expand submission type shorthands inside a `submission_types` list.
pub fn translate_submission_types(map: &mut Map<String, Value>) {
    if let Some(Value::Array(types)) = map.get_mut("submission_types") {
        for t in types.iter_mut() {
            if let Value::String(s) = t {
                *s = canonical(SUBMISSION_TYPES, s).to_string();
            }
        }
    }
}
