//! Content hashing for change detection
//!
//! Every hash is a SHA-256 digest rendered in the canonical `sha256:<hex>`
//! format. Structured values are hashed over a canonical JSON serialization
//! in which object keys are sorted at every depth. Array element order is
//! preserved: reordering a list-valued field is a content change.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::{Error, Result};

/// Prefix for all hashes produced by this module
const PREFIX: &str = "sha256:";

/// An opaque content digest.
///
/// Two items with equal hashes are treated as identical for sync purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap a digest previously produced by this module (e.g. one read back
    /// from remote metadata).
    pub fn from_stored(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash raw bytes.
pub fn hash_bytes(bytes: &[u8]) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    ContentHash(format!("{}{:x}", PREFIX, hasher.finalize()))
}

/// Hash text content as UTF-8 bytes.
pub fn hash_text(text: &str) -> ContentHash {
    hash_bytes(text.as_bytes())
}

/// Hash a structured value over its canonical serialization.
pub fn hash_dict(value: &Value) -> ContentHash {
    hash_text(&canonical_json(value))
}

/// Hash a file's raw contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn hash_file(path: &Path) -> Result<ContentHash> {
    let content = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    Ok(hash_bytes(&content))
}

/// Serialize a value compactly with object keys sorted at every depth.
///
/// The ordering does not depend on how the underlying JSON map stores its
/// keys, so the output is stable whether or not insertion order is preserved.
pub fn canonical_json(value: &Value) -> String {
    sorted(value).to_string()
}

fn sorted(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut out = Map::new();
            for (key, inner) in entries {
                out.insert(key.clone(), sorted(inner));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_has_prefix() {
        let hash = hash_text("hello world");
        assert!(hash.as_str().starts_with("sha256:"));
    }

    #[test]
    fn text_hash_known_value() {
        let hash = hash_text("hello world");
        assert_eq!(
            hash.as_str(),
            "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn bytes_and_text_agree() {
        assert_eq!(hash_bytes(b"# Welcome"), hash_text("# Welcome"));
    }

    #[test]
    fn dict_hash_ignores_key_order() {
        let a = json!({"title": "Syllabus", "body": "<h1>Welcome</h1>"});
        let b = json!({"body": "<h1>Welcome</h1>", "title": "Syllabus"});
        assert_eq!(hash_dict(&a), hash_dict(&b));
    }

    #[test]
    fn dict_hash_sorts_nested_keys() {
        let a = json!({"rules": {"drop_lowest": 1, "drop_highest": 0}});
        let b = json!({"rules": {"drop_highest": 0, "drop_lowest": 1}});
        assert_eq!(hash_dict(&a), hash_dict(&b));
    }

    #[test]
    fn dict_hash_respects_list_order() {
        let a = json!({"answers": [{"answer_text": "yes"}, {"answer_text": "no"}]});
        let b = json!({"answers": [{"answer_text": "no"}, {"answer_text": "yes"}]});
        assert_ne!(hash_dict(&a), hash_dict(&b));
    }

    #[test]
    fn dict_hash_distinguishes_types() {
        let a = json!({"points_possible": 1});
        let b = json!({"points_possible": "1"});
        assert_ne!(hash_dict(&a), hash_dict(&b));
    }

    #[test]
    fn canonical_json_is_compact_and_sorted() {
        let value = json!({"b": [3, {"z": 1, "a": 2}], "a": null});
        assert_eq!(canonical_json(&value), r#"{"a":null,"b":[3,{"a":2,"z":1}]}"#);
    }

    #[test]
    fn file_hash_matches_content_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page-syllabus.md");
        std::fs::write(&path, "hello world").unwrap();

        assert_eq!(hash_file(&path).unwrap(), hash_text("hello world"));
    }

    #[test]
    fn stored_hash_round_trips_through_serde() {
        let hash = hash_text("abc");
        let stored = serde_json::to_value(&hash).unwrap();
        assert!(stored.is_string());
        let back: ContentHash = serde_json::from_value(stored).unwrap();
        assert_eq!(back, hash);
    }
}
