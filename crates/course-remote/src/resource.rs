//! Typed remote resources
//!
//! Every LMS entity is addressed by a path of collection names and ids
//! (`courses/12/modules/5/items/31`). A [`ResourceKind`] carries what differs
//! between entity types: collection segment, request form key, identifier
//! field and list parameters. [`Api`] provides the uniform capability set
//! (list, get, create, update, delete) on top.

use std::fmt;

use serde_json::{Map, Value};
use tracing::debug;

use crate::api::Api;
use crate::cache::{CacheKey, Mutation};
use crate::error::{Error, Result};

/// The kinds of remote entity the sync engine manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Course,
    Page,
    Assignment,
    AssignmentGroup,
    Quiz,
    Question,
    Module,
    ModuleItem,
    File,
    Folder,
}

impl ResourceKind {
    /// Collection name in the URL.
    pub fn segment(self) -> &'static str {
        match self {
            ResourceKind::Course => "courses",
            ResourceKind::Page => "pages",
            ResourceKind::Assignment => "assignments",
            ResourceKind::AssignmentGroup => "assignment_groups",
            ResourceKind::Quiz => "quizzes",
            ResourceKind::Question => "questions",
            ResourceKind::Module => "modules",
            ResourceKind::ModuleItem => "items",
            ResourceKind::File => "files",
            ResourceKind::Folder => "folders",
        }
    }

    /// Key create/update bodies are wrapped in, if any.
    pub fn form_key(self) -> Option<&'static str> {
        match self {
            ResourceKind::Course => Some("course"),
            ResourceKind::Page => Some("wiki_page"),
            ResourceKind::Assignment => Some("assignment"),
            ResourceKind::Quiz => Some("quiz"),
            ResourceKind::Question => Some("question"),
            ResourceKind::Module => Some("module"),
            ResourceKind::ModuleItem => Some("module_item"),
            ResourceKind::AssignmentGroup | ResourceKind::File | ResourceKind::Folder => None,
        }
    }

    /// Field holding the identifier used in the resource's URL.
    pub fn id_key(self) -> &'static str {
        match self {
            ResourceKind::Page => "url",
            _ => "id",
        }
    }

    /// Natural-key field: the human-readable name used for lookups.
    pub fn title_key(self) -> &'static str {
        match self {
            ResourceKind::Page | ResourceKind::Quiz | ResourceKind::ModuleItem => "title",
            ResourceKind::File => "filename",
            ResourceKind::Question => "question_name",
            ResourceKind::Course
            | ResourceKind::Assignment
            | ResourceKind::AssignmentGroup
            | ResourceKind::Module
            | ResourceKind::Folder => "name",
        }
    }

    /// Extra query parameters for list and get calls.
    pub fn include(self) -> &'static [(&'static str, &'static str)] {
        match self {
            ResourceKind::Course => &[
                ("include[]", "term"),
                ("include[]", "total_students"),
                ("include[]", "syllabus_body"),
            ],
            ResourceKind::ModuleItem => &[("include[]", "content_details")],
            _ => &[],
        }
    }

    /// Whether a listed entry belongs to this collection.
    ///
    /// Quiz-backed assignments are listed among assignments but are managed
    /// through their quiz.
    pub fn keeps(self, data: &Value) -> bool {
        match self {
            ResourceKind::Assignment => !data
                .get("is_quiz_assignment")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            _ => true,
        }
    }

    /// Whether single resources live at the API root rather than under
    /// their parent (`files/<id>` rather than `courses/1/files/<id>`).
    pub fn detached(self) -> bool {
        matches!(self, ResourceKind::File)
    }

    /// Wrap a body in this kind's form key.
    pub fn wrap(self, data: &Value) -> Value {
        match self.form_key() {
            Some(key) => {
                let mut wrapped = Map::new();
                wrapped.insert(key.to_string(), data.clone());
                Value::Object(wrapped)
            }
            None => data.clone(),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Path of a remote resource: alternating collection names and ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath(Vec<String>);

impl ResourcePath {
    /// The API root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn course(id: impl fmt::Display) -> Self {
        Self::root().child(ResourceKind::Course, id)
    }

    pub fn child(&self, kind: ResourceKind, id: impl fmt::Display) -> Self {
        let mut parts = self.0.clone();
        parts.push(kind.segment().to_string());
        parts.push(id.to_string());
        Self(parts)
    }

    /// A collection below this resource.
    pub fn collection(&self, kind: ResourceKind) -> Collection {
        Collection {
            parent: self.clone(),
            kind,
        }
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

/// A typed collection of resources below a parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Collection {
    parent: ResourcePath,
    kind: ResourceKind,
}

impl Collection {
    /// Top-level collection (e.g. all courses).
    pub fn top(kind: ResourceKind) -> Self {
        ResourcePath::root().collection(kind)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn parent(&self) -> &ResourcePath {
        &self.parent
    }

    /// URL segments of the collection itself.
    pub fn segments(&self) -> Vec<String> {
        let mut parts = self.parent.0.clone();
        parts.push(self.kind.segment().to_string());
        parts
    }

    /// Path of a member with the given identifier.
    pub fn member(&self, id: impl fmt::Display) -> ResourcePath {
        if self.kind.detached() {
            ResourcePath::root().child(self.kind, id)
        } else {
            self.parent.child(self.kind, id)
        }
    }

    /// Cache key for this collection's listing.
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(self.segments().join("/"))
    }

    /// Wrap a listed or returned JSON object as a resource of this
    /// collection.
    pub fn resource(&self, data: Value) -> Result<RemoteResource> {
        let id = identifier(&data, self.kind).ok_or_else(|| {
            Error::unexpected(
                self.segments().join("/"),
                format!("{} entry without `{}`", self.kind, self.kind.id_key()),
            )
        })?;
        Ok(RemoteResource {
            path: self.member(id),
            kind: self.kind,
            data,
        })
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments().join("/"))
    }
}

/// A handle on one remote entity with a snapshot of its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResource {
    pub path: ResourcePath,
    pub kind: ResourceKind,
    pub data: Value,
}

impl RemoteResource {
    /// Identifier as it appears in the resource's URL.
    pub fn id(&self) -> String {
        self.path.0.last().cloned().unwrap_or_default()
    }

    /// Numeric `id` field, if the resource has one.
    pub fn numeric_id(&self) -> Option<u64> {
        self.data.get("id").and_then(Value::as_u64)
    }

    /// Natural key (title or name).
    pub fn title(&self) -> Option<&str> {
        self.str_field(self.kind.title_key())
    }

    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn position(&self) -> Option<i64> {
        self.data.get("position").and_then(Value::as_i64)
    }

    /// The collection this resource was listed from, reconstructed from its
    /// path. Detached resources report their API-root collection.
    pub fn collection(&self) -> Collection {
        let parts = &self.path.0;
        let parent = if parts.len() >= 2 {
            ResourcePath(parts[..parts.len() - 2].to_vec())
        } else {
            ResourcePath::root()
        };
        parent.collection(self.kind)
    }

    fn rebuild(&self, data: Value) -> Self {
        let path = match identifier(&data, self.kind) {
            Some(id) if id != self.id() => self.collection().member(id),
            _ => self.path.clone(),
        };
        Self {
            path,
            kind: self.kind,
            data,
        }
    }
}

fn identifier(data: &Value, kind: ResourceKind) -> Option<String> {
    match data.get(kind.id_key())? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl Api {
    /// List every member of a collection.
    pub fn list(&self, collection: &Collection) -> Result<Vec<RemoteResource>> {
        let entries = self.get_all(&collection.segments(), collection.kind.include())?;
        let total = entries.len();
        let resources = entries
            .into_iter()
            .filter(|e| collection.kind.keeps(e))
            .map(|e| collection.resource(e))
            .collect::<Result<Vec<_>>>()?;
        debug!(collection = %collection, total, kept = resources.len(), "Listed collection");
        Ok(resources)
    }

    /// Fetch a single resource.
    pub fn get(&self, collection: &Collection, id: impl fmt::Display) -> Result<RemoteResource> {
        let path = collection.member(id);
        let data = self.get_json(path.parts(), collection.kind.include())?;
        collection.resource(data)
    }

    /// Re-read a resource's current fields.
    pub fn refresh(&self, resource: &RemoteResource) -> Result<RemoteResource> {
        let data = self.get_json(resource.path.parts(), resource.kind.include())?;
        Ok(resource.rebuild(data))
    }

    /// Create a member of a collection. One write.
    pub fn create(&self, collection: &Collection, data: &Value) -> Result<Mutation<RemoteResource>> {
        let created = self.post_json(&collection.segments(), &collection.kind.wrap(data))?;
        let resource = collection.resource(created)?;
        Ok(Mutation::new(resource, collection.cache_key()))
    }

    /// Update a resource with a full or partial field set. One write.
    ///
    /// The returned handle carries the fields the server reported back. A
    /// page whose title changed may come back under a new URL slug.
    pub fn update(&self, resource: &RemoteResource, data: &Value) -> Result<Mutation<RemoteResource>> {
        let updated = self.put_json(resource.path.parts(), &resource.kind.wrap(data))?;
        let stale = resource.collection().cache_key();
        let data = if updated.is_object() {
            updated
        } else {
            merge_fields(&resource.data, data)
        };
        Ok(Mutation::new(resource.rebuild(data), stale))
    }

    /// Delete a resource. One write.
    pub fn delete_resource(&self, resource: &RemoteResource) -> Result<Mutation<()>> {
        self.delete(resource.path.parts())?;
        Ok(Mutation::new((), resource.collection().cache_key()))
    }
}

fn merge_fields(base: &Value, update: &Value) -> Value {
    let mut merged = base.clone();
    if let (Value::Object(target), Value::Object(fields)) = (&mut merged, update) {
        for (k, v) in fields {
            target.insert(k.clone(), v.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(ResourceKind::Page, Some("wiki_page"), "url")]
    #[case(ResourceKind::Assignment, Some("assignment"), "id")]
    #[case(ResourceKind::AssignmentGroup, None, "id")]
    #[case(ResourceKind::ModuleItem, Some("module_item"), "id")]
    #[case(ResourceKind::File, None, "id")]
    fn kind_table(#[case] kind: ResourceKind, #[case] form_key: Option<&str>, #[case] id_key: &str) {
        assert_eq!(kind.form_key(), form_key);
        assert_eq!(kind.id_key(), id_key);
    }

    #[test]
    fn nested_paths() {
        let items = ResourcePath::course(12)
            .child(ResourceKind::Module, 5)
            .collection(ResourceKind::ModuleItem);
        assert_eq!(items.to_string(), "courses/12/modules/5/items");
        assert_eq!(items.member(31).to_string(), "courses/12/modules/5/items/31");
    }

    #[test]
    fn files_are_detached() {
        let files = ResourcePath::course(12).collection(ResourceKind::File);
        assert_eq!(files.to_string(), "courses/12/files");
        assert_eq!(files.member(9).to_string(), "files/9");
    }

    #[test]
    fn pages_are_addressed_by_slug() {
        let pages = ResourcePath::course(12).collection(ResourceKind::Page);
        let page = pages
            .resource(json!({"url": "syllabus", "title": "Syllabus", "page_id": 4}))
            .unwrap();
        assert_eq!(page.path.to_string(), "courses/12/pages/syllabus");
        assert_eq!(page.title(), Some("Syllabus"));
    }

    #[test]
    fn resource_without_id_is_rejected() {
        let modules = ResourcePath::course(1).collection(ResourceKind::Module);
        assert!(modules.resource(json!({"name": "x"})).is_err());
    }

    #[test]
    fn quiz_assignments_are_filtered() {
        assert!(!ResourceKind::Assignment.keeps(&json!({"is_quiz_assignment": true})));
        assert!(ResourceKind::Assignment.keeps(&json!({"is_quiz_assignment": false})));
        assert!(ResourceKind::Assignment.keeps(&json!({})));
        assert!(ResourceKind::Quiz.keeps(&json!({"is_quiz_assignment": true})));
    }

    #[test]
    fn bodies_are_wrapped_in_form_key() {
        let body = json!({"title": "A"});
        assert_eq!(ResourceKind::Page.wrap(&body), json!({"wiki_page": {"title": "A"}}));
        assert_eq!(ResourceKind::AssignmentGroup.wrap(&body), body);
    }

    #[test]
    fn collection_is_recovered_from_path() {
        let pages = ResourcePath::course(3).collection(ResourceKind::Page);
        let page = pages.resource(json!({"url": "a"})).unwrap();
        assert_eq!(page.collection(), pages);
    }

    #[test]
    fn renamed_page_gets_new_path() {
        let pages = ResourcePath::course(3).collection(ResourceKind::Page);
        let page = pages.resource(json!({"url": "old"})).unwrap();
        let renamed = page.rebuild(json!({"url": "new"}));
        assert_eq!(renamed.path.to_string(), "courses/3/pages/new");
    }
}
