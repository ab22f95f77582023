//! Resource, cache and upload behaviour against the in-memory LMS.

use std::sync::Arc;

use course_remote::{
    CollectionCache, HttpMethod, MetadataStore, ResourceKind, ResourcePath, find_exact,
    upload_bytes,
};
use course_test_utils::FakeLms;
use pretty_assertions::assert_eq;
use serde_json::json;

fn setup() -> (Arc<FakeLms>, ResourcePath) {
    let lms = Arc::new(FakeLms::new());
    let id = lms.add_course("CS101 Programming S01", "CS101");
    (lms, ResourcePath::course(id))
}

#[test]
fn create_is_visible_after_applying_the_mutation() {
    let (lms, course) = setup();
    let api = lms.api();
    let cache = CollectionCache::new();
    let pages = course.collection(ResourceKind::Page);

    assert!(cache.list(&api, &pages).unwrap().is_empty());

    let page = api
        .create(&pages, &json!({"title": "Week 1", "body": "<p>hi</p>"}))
        .unwrap()
        .apply(&cache);

    assert_eq!(page.id(), "week-1");
    let listed = cache.list(&api, &pages).unwrap();
    assert_eq!(find_exact(&listed, "Week 1").found().map(|p| p.id()), Some("week-1".into()));
}

#[test]
fn unapplied_mutation_leaves_listing_stale() {
    let (lms, course) = setup();
    let api = lms.api();
    let cache = CollectionCache::new();
    let pages = course.collection(ResourceKind::Page);
    cache.list(&api, &pages).unwrap();

    let mutation = api.create(&pages, &json!({"title": "A"})).unwrap();

    assert!(cache.list(&api, &pages).unwrap().is_empty());
    mutation.apply(&cache);
    assert_eq!(cache.list(&api, &pages).unwrap().len(), 1);
}

#[test]
fn listings_are_fetched_once_per_run() {
    let (lms, course) = setup();
    let api = lms.api();
    let cache = CollectionCache::new();
    let modules = course.collection(ResourceKind::Module);

    for _ in 0..3 {
        cache.list(&api, &modules).unwrap();
    }

    let gets = lms
        .requests()
        .iter()
        .filter(|r| r.method == HttpMethod::Get && r.path.ends_with("/modules"))
        .count();
    assert_eq!(gets, 1);
}

#[test]
fn quiz_assignments_are_not_listed() {
    let (lms, course) = setup();
    let api = lms.api();
    api.create(&course.collection(ResourceKind::Quiz), &json!({"title": "Quiz 1"}))
        .unwrap()
        .apply(&CollectionCache::new());
    lms.seed(&format!("{course}/assignments"), json!({"name": "HW 1"}));

    let listed = api.list(&course.collection(ResourceKind::Assignment)).unwrap();

    let names: Vec<_> = listed.iter().filter_map(|a| a.title()).collect();
    assert_eq!(names, vec!["HW 1"]);
}

#[test]
fn renaming_a_page_follows_the_new_slug() {
    let (lms, course) = setup();
    let api = lms.api();
    let cache = CollectionCache::new();
    let pages = course.collection(ResourceKind::Page);
    let page = api.create(&pages, &json!({"title": "Old"})).unwrap().apply(&cache);

    let renamed = api.update(&page, &json!({"title": "New"})).unwrap().apply(&cache);

    assert_eq!(renamed.path.to_string(), format!("{course}/pages/new"));
    assert_eq!(api.refresh(&renamed).unwrap().title(), Some("New"));
}

#[test]
fn upload_follows_the_redirect_with_credentials() {
    let (lms, course) = setup();
    let api = lms.api();
    let cache = CollectionCache::new();

    let file = upload_bytes(&api, &cache, &course, "deck.html", b"<html>deck</html>".to_vec())
        .unwrap()
        .apply(&cache);

    assert_eq!(file.str_field("filename"), Some("deck.html"));
    assert_eq!(file.path.to_string(), format!("files/{}", file.id()));
    let id = file.numeric_id().unwrap();
    assert_eq!(lms.file_content(id).unwrap(), b"<html>deck</html>".to_vec());

    let requests = lms.requests();
    let announce = requests
        .iter()
        .find(|r| r.method == HttpMethod::Post && r.path.ends_with("/files"))
        .unwrap();
    assert_eq!(announce.body.as_ref().unwrap()["name"], "deck.html");
    assert!(requests.iter().any(|r| r.path.starts_with("https://files.test/upload/")));
    assert_eq!(requests.last().unwrap().path, format!("files/{id}"));
}

#[test]
fn reupload_replaces_the_file_of_the_same_name() {
    let (lms, course) = setup();
    let api = lms.api();
    let cache = CollectionCache::new();

    let first = upload_bytes(&api, &cache, &course, "deck.html", b"v1".to_vec())
        .unwrap()
        .apply(&cache);
    let second = upload_bytes(&api, &cache, &course, "deck.html", b"v2".to_vec())
        .unwrap()
        .apply(&cache);

    assert_eq!(first.id(), second.id());
    assert_eq!(first.str_field("uuid"), second.str_field("uuid"));
    assert_eq!(lms.file_content(second.numeric_id().unwrap()).unwrap(), b"v2".to_vec());
}

#[test]
fn quoted_file_names_are_uploaded_intact() {
    let (lms, course) = setup();
    let api = lms.api();
    let cache = CollectionCache::new();

    let file = upload_bytes(&api, &cache, &course, "deck \"final\".html", b"<html/>".to_vec())
        .unwrap()
        .apply(&cache);

    assert_eq!(file.str_field("filename"), Some("deck \"final\".html"));
    assert_eq!(lms.file_content(file.numeric_id().unwrap()).unwrap(), b"<html/>".to_vec());
}

#[test]
fn rejected_upload_announcement_is_an_error() {
    let (lms, course) = setup();
    lms.fail(HttpMethod::Post, "/files", 403);

    let err = upload_bytes(&lms.api(), &CollectionCache::new(), &course, "x.html", Vec::new())
        .unwrap_err();

    assert_eq!(err.status(), Some(403));
}

#[test]
fn metadata_is_scoped_per_course() {
    let lms = Arc::new(FakeLms::new());
    let a = ResourcePath::course(lms.add_course("A", "A"));
    let b = ResourcePath::course(lms.add_course("B", "B"));
    let api = lms.api();
    let cache = CollectionCache::new();
    let store = MetadataStore::new(api.clone());

    let in_a = api
        .create(&a.collection(ResourceKind::Module), &json!({"name": "Week 1"}))
        .unwrap()
        .apply(&cache);
    let in_b = api
        .create(&b.collection(ResourceKind::Module), &json!({"name": "Week 1"}))
        .unwrap()
        .apply(&cache);

    let mut meta = store.get(&in_a).unwrap();
    meta.hash = Some(course_fs::hash_text("a"));
    assert!(store.set(&in_a, &meta));

    assert_eq!(store.get(&in_b).unwrap().hash, None);
    assert_eq!(store.get(&in_a).unwrap().hash, Some(course_fs::hash_text("a")));
}
