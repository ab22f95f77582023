//! Sync metadata kept on the LMS
//!
//! The last-synced content hash of every managed resource is stored in the
//! authenticated user's custom-data area, under a fixed namespace and a key
//! derived from the resource's path. Uploaded files are tracked in a single
//! shared record mapping the file's uuid to its last uploaded hash.

use std::sync::Mutex;

use course_fs::ContentHash;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, error, warn};

use crate::api::Api;
use crate::error::{Error, Result, excerpt};
use crate::http::HttpMethod;
use crate::resource::{RemoteResource, ResourcePath};

/// Custom-data namespace all coursework records live under
pub const DEFAULT_NAMESPACE: &str = "com.lowlandresearch.coursework";

/// Key of the shared uuid-to-hash record for uploaded files
pub const FILE_HASHES_KEY: &str = "file-hashes";

/// Hashes of a quiz's questions, in question order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionHashes {
    #[serde(default)]
    pub hashes: Vec<ContentHash>,
}

/// The metadata record of one resource.
///
/// Unknown fields are preserved across a read-modify-write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<ContentHash>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub questions: Option<QuestionHashes>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SyncMetadata {
    pub fn with_hash(hash: ContentHash) -> Self {
        Self {
            hash: Some(hash),
            ..Self::default()
        }
    }

    /// Stored question hashes, empty if none were recorded.
    pub fn question_hashes(&self) -> &[ContentHash] {
        self.questions.as_ref().map_or(&[], |q| q.hashes.as_slice())
    }
}

/// Metadata key for a resource path.
pub fn key_for(path: &ResourcePath) -> String {
    format!("metadata-{}", path.parts().join("-"))
}

/// Reads and writes sync metadata through the custom-data endpoint.
#[derive(Debug)]
pub struct MetadataStore {
    api: Api,
    namespace: String,
    file_hashes_lock: Mutex<()>,
}

impl MetadataStore {
    pub fn new(api: Api) -> Self {
        Self::with_namespace(api, DEFAULT_NAMESPACE)
    }

    pub fn with_namespace(api: Api, namespace: impl Into<String>) -> Self {
        Self {
            api,
            namespace: namespace.into(),
            file_hashes_lock: Mutex::new(()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn segments(key: &str) -> [&str; 4] {
        ["users", "self", "custom_data", key]
    }

    /// Read the raw record under `key`.
    ///
    /// A non-2xx reply means no record exists and yields `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be made or the reply could
    /// not be decoded.
    pub fn get_raw(&self, key: &str) -> Result<Option<Value>> {
        let request = self
            .api
            .request(HttpMethod::Get, &Self::segments(key))
            .query("ns", &self.namespace);
        let url = request.full_url();
        let response = self.api.send(request)?;
        if !response.is_success() {
            debug!(key, status = response.status, "No metadata record");
            return Ok(None);
        }
        let envelope: Value = response.json().map_err(|e| Error::decode(url, e))?;
        Ok(Some(envelope.get("data").cloned().unwrap_or(Value::Null)))
    }

    /// Write the raw record under `key`. Returns whether the write was
    /// accepted; a rejection is logged, not raised.
    pub fn put_raw(&self, key: &str, data: &Value) -> bool {
        let body = json!({ "ns": self.namespace, "data": data });
        let request = match self.api.request(HttpMethod::Put, &Self::segments(key)).json(&body) {
            Ok(request) => request,
            Err(e) => {
                error!(key, error = %e, "Could not encode metadata");
                return false;
            }
        };
        match self.api.send(request) {
            Ok(response) if response.is_success() => true,
            Ok(response) => {
                error!(
                    key,
                    status = response.status,
                    body = %excerpt(&response.text()),
                    "Metadata write rejected"
                );
                false
            }
            Err(e) => {
                error!(key, error = %e, "Metadata write failed");
                false
            }
        }
    }

    /// Metadata of a resource. A missing record is initialized as empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the read itself failed or the stored record does
    /// not have the expected shape.
    pub fn get(&self, resource: &RemoteResource) -> Result<SyncMetadata> {
        match self.read(resource)? {
            Some(metadata) => Ok(metadata),
            None => {
                let empty = SyncMetadata::default();
                if !self.set(resource, &empty) {
                    warn!(resource = %resource.path, "Could not initialize metadata");
                }
                Ok(empty)
            }
        }
    }

    /// Metadata of a resource without initializing a missing record.
    pub fn read(&self, resource: &RemoteResource) -> Result<Option<SyncMetadata>> {
        let key = key_for(&resource.path);
        match self.get_raw(&key)? {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(SyncMetadata::default())),
            Some(data) => serde_json::from_value(data)
                .map(Some)
                .map_err(|e| Error::decode(key, e)),
        }
    }

    /// Replace the metadata record of a resource.
    pub fn set(&self, resource: &RemoteResource, metadata: &SyncMetadata) -> bool {
        match serde_json::to_value(metadata) {
            Ok(data) => self.put_raw(&key_for(&resource.path), &data),
            Err(e) => {
                error!(resource = %resource.path, error = %e, "Could not encode metadata");
                false
            }
        }
    }

    /// Last uploaded hash of a tracked file.
    pub fn file_hash(&self, uuid: &str) -> Result<Option<ContentHash>> {
        let hashes = self.get_raw(FILE_HASHES_KEY)?;
        Ok(hashes
            .as_ref()
            .and_then(|h| h.get(uuid))
            .and_then(Value::as_str)
            .map(ContentHash::from_stored))
    }

    /// Record the uploaded hash of a tracked file.
    ///
    /// The shared record is read, modified and written back under a lock so
    /// concurrent uploads in this process do not drop each other's entries.
    pub fn set_file_hash(&self, uuid: &str, hash: &ContentHash) -> Result<bool> {
        let _guard = self
            .file_hashes_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut hashes = match self.get_raw(FILE_HASHES_KEY)? {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        hashes.insert(uuid.to_string(), Value::String(hash.to_string()));
        Ok(self.put_raw(FILE_HASHES_KEY, &Value::Object(hashes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpClient, HttpRequest, HttpResponse};
    use crate::resource::ResourceKind;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Minimal in-memory custom-data endpoint.
    #[derive(Default)]
    struct CustomData {
        records: Mutex<HashMap<String, Value>>,
        reject_writes: bool,
    }

    impl HttpClient for CustomData {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
            let key = request.url.rsplit('/').next().unwrap_or_default().to_string();
            let mut records = self.records.lock().unwrap();
            Ok(match request.method {
                HttpMethod::Get => match records.get(&key) {
                    Some(data) => HttpResponse::json_body(200, &json!({ "data": data })),
                    None => HttpResponse::new(404, "not found"),
                },
                HttpMethod::Put if self.reject_writes => HttpResponse::new(500, "down"),
                HttpMethod::Put => {
                    let body = request.json_body().unwrap();
                    assert_eq!(body["ns"], DEFAULT_NAMESPACE);
                    records.insert(key, body["data"].clone());
                    HttpResponse::json_body(200, &body)
                }
                _ => HttpResponse::new(405, ""),
            })
        }
    }

    fn store(client: Arc<CustomData>) -> MetadataStore {
        MetadataStore::new(Api::new("https://lms/api/v1", "t", client))
    }

    fn page() -> RemoteResource {
        ResourcePath::course(12)
            .collection(ResourceKind::Page)
            .resource(json!({"url": "week-1", "title": "Week 1"}))
            .unwrap()
    }

    #[test]
    fn key_joins_path_parts() {
        assert_eq!(key_for(&page().path), "metadata-courses-12-pages-week-1");
    }

    #[test]
    fn missing_record_is_initialized_empty() {
        let client = Arc::new(CustomData::default());
        let store = store(client.clone());

        let meta = store.get(&page()).unwrap();

        assert_eq!(meta, SyncMetadata::default());
        let records = client.records.lock().unwrap();
        assert_eq!(records.get("metadata-courses-12-pages-week-1"), Some(&json!({})));
    }

    #[test]
    fn read_does_not_initialize() {
        let client = Arc::new(CustomData::default());
        let store = store(client.clone());

        assert_eq!(store.read(&page()).unwrap(), None);
        assert!(client.records.lock().unwrap().is_empty());
    }

    #[test]
    fn set_then_get() {
        let client = Arc::new(CustomData::default());
        let store = store(client);
        let mut meta = SyncMetadata::with_hash(ContentHash::from_stored("sha256:ab"));
        meta.questions = Some(QuestionHashes {
            hashes: vec![ContentHash::from_stored("sha256:01")],
        });

        assert!(store.set(&page(), &meta));
        assert_eq!(store.get(&page()).unwrap(), meta);
    }

    #[test]
    fn unknown_fields_survive() {
        let client = Arc::new(CustomData::default());
        client.records.lock().unwrap().insert(
            "metadata-courses-12-pages-week-1".into(),
            json!({"hash": "sha256:ab", "note": "kept"}),
        );
        let store = store(client);

        let meta = store.get(&page()).unwrap();

        assert_eq!(meta.extra.get("note"), Some(&json!("kept")));
        assert_eq!(serde_json::to_value(&meta).unwrap()["note"], "kept");
    }

    #[test]
    fn rejected_write_reports_false() {
        let client = Arc::new(CustomData {
            reject_writes: true,
            ..CustomData::default()
        });
        let store = store(client);
        assert!(!store.set(&page(), &SyncMetadata::default()));
    }

    #[test]
    fn file_hashes_share_one_record() {
        let client = Arc::new(CustomData::default());
        let store = store(client.clone());

        assert_eq!(store.file_hash("u1").unwrap(), None);
        store.set_file_hash("u1", &ContentHash::from_stored("sha256:1")).unwrap();
        store.set_file_hash("u2", &ContentHash::from_stored("sha256:2")).unwrap();

        assert_eq!(
            store.file_hash("u1").unwrap(),
            Some(ContentHash::from_stored("sha256:1"))
        );
        let records = client.records.lock().unwrap();
        assert_eq!(
            records.get(FILE_HASHES_KEY),
            Some(&json!({"u1": "sha256:1", "u2": "sha256:2"}))
        );
    }
}
