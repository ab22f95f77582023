//! Modules and module items from `modules.yml`
//!
//! Sync runs in five passes so every pass sees the effects of the previous
//! one:
//!
//! 1. create (or update) modules
//! 2. order modules as listed
//! 3. create items missing from the whole course
//! 4. move items that live in another module into their listed module
//! 5. order items within each module
//!
//! Items already present in a module are rewritten only when their listed
//! fields change (tracked by hash, like every other resource). Remote items
//! or modules that are not listed are left alone.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::Path;
use std::sync::Arc;

use course_content::{ItemKind, ModuleDoc, ModuleItemDoc, parse_modules};
use course_fs::hash_dict;
use course_remote::{Collection, RemoteResource, ResourceKind, SyncMetadata, search_substring};
use serde_json::{Map, Value, json};
use tracing::{error, info};

use super::context::SyncContext;
use super::engine::{persist, sync_resource, update_if_changed};
use super::order::plan_moves;
use super::report::{SyncOutcome, SyncReport};
use crate::course::Course;
use crate::{Error, Result};

/// A module item resolved against course content.
#[derive(Debug, Clone)]
struct PlannedItem {
    label: String,
    title: String,
    fields: Map<String, Value>,
}

/// Sync a course's modules and their items from `modules.yml`.
pub fn sync_modules(ctx: &SyncContext, course: &Course, path: &Path) -> Result<SyncReport> {
    let source = course_fs::io::read_text_lossy(path)?;
    let docs = parse_modules(&source)?;
    let modules = course.path().collection(ResourceKind::Module);
    let mut report = SyncReport::new();

    let remotes = create_modules(ctx, course, &modules, &docs, &mut report);

    let desired: Vec<String> = remotes.iter().flatten().map(RemoteResource::id).collect();
    order(ctx, &modules, &desired, &mut report)?;

    let planned: Vec<Vec<PlannedItem>> = docs
        .iter()
        .map(|doc| resolve_items(ctx, course, doc, &mut report))
        .collect();

    let moves = create_items(ctx, course, &modules, &remotes, &planned, &mut report)?;
    move_items(ctx, course, moves, &mut report);

    for (remote, items) in remotes.iter().zip(&planned) {
        let Some(module) = remote else {
            continue;
        };
        let collection = module.path.collection(ResourceKind::ModuleItem);
        let listing = ctx.list(&collection)?;
        let desired: Vec<String> = match_items(&listing, items)
            .into_iter()
            .flatten()
            .map(RemoteResource::id)
            .collect();
        order(ctx, &collection, &desired, &mut report)?;
    }

    info!(course = course.name(), modules = docs.len(), "Modules synced");
    Ok(report)
}

/// Pass 1. Returns the remote module of each listed module, `None` where
/// it failed or a dry run skipped its creation.
fn create_modules(
    ctx: &SyncContext,
    course: &Course,
    modules: &Collection,
    docs: &[ModuleDoc],
    report: &mut SyncReport,
) -> Vec<Option<RemoteResource>> {
    docs.iter()
        .map(|doc| {
            let mut desired = doc.fields.clone();
            desired.insert("name".into(), Value::String(doc.name.clone()));
            match sync_resource(ctx, modules, &doc.name, &Value::Object(desired)) {
                Ok(synced) => {
                    report.record(course.name(), &doc.name, synced.outcome);
                    synced.resource
                }
                Err(e) => {
                    error!(course = course.name(), module = %doc.name, error = %e, "Module sync failed");
                    report.record(course.name(), &doc.name, SyncOutcome::Failed(e.to_string()));
                    None
                }
            }
        })
        .collect()
}

/// Resolve every item of a module. Failures are reported and dropped.
fn resolve_items(ctx: &SyncContext, course: &Course, doc: &ModuleDoc, report: &mut SyncReport) -> Vec<PlannedItem> {
    let mut planned = Vec::new();
    for item in &doc.items {
        let label = format!("{} / {}", doc.name, item.raw_title().unwrap_or_default());
        match resolve_item(ctx, course, item) {
            Ok(fields) => {
                let title = fields
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                planned.push(PlannedItem {
                    label: format!("{} / {}", doc.name, title),
                    title,
                    fields,
                });
            }
            Err(e) => {
                error!(course = course.name(), item = %label, error = %e, "Module item not resolved");
                report.record(course.name(), label, SyncOutcome::Failed(e.to_string()));
            }
        }
    }
    planned
}

/// Desired fields of one module item.
///
/// Items pointing at course content carry the content's title and its
/// `page_url` or `content_id`.
fn resolve_item(ctx: &SyncContext, course: &Course, item: &ModuleItemDoc) -> Result<Map<String, Value>> {
    let (kind, search, extra) = match item {
        ModuleItemDoc::Raw(map) => {
            if !map.get("title").is_some_and(Value::is_string) {
                return Err(Error::missing("module item", "title"));
            }
            return Ok(map.clone());
        }
        ModuleItemDoc::Typed { kind, search, extra } => (*kind, search, extra),
    };

    let mut fields = extra.clone();
    fields.insert("type".into(), json!(kind.as_str()));
    if !kind.references_content() {
        fields.insert("title".into(), json!(search));
        return Ok(fields);
    }

    let (resource_kind, search_key, id_key, target_key) = match kind {
        ItemKind::Page => (ResourceKind::Page, "title", "url", "page_url"),
        ItemKind::Quiz => (ResourceKind::Quiz, "title", "id", "content_id"),
        ItemKind::Assignment => (ResourceKind::Assignment, "name", "id", "content_id"),
        _ => (ResourceKind::File, "filename", "id", "content_id"),
    };
    let listing = ctx.list(&course.path().collection(resource_kind))?;
    let found = search_substring(&listing, search, &[search_key])
        .ok_or_else(|| Error::not_found(resource_kind, search.as_str()))?;

    fields.insert("title".into(), json!(found.title().unwrap_or(search)));
    fields.insert(
        target_key.into(),
        found.data.get(id_key).cloned().unwrap_or(Value::Null),
    );
    Ok(fields)
}

/// A module item found in the wrong module.
struct PendingMove {
    item: RemoteResource,
    target: RemoteResource,
    planned: PlannedItem,
}

/// Pair each planned item with a remote item of the same title.
///
/// The n-th listed occurrence of a title takes the n-th remote item with
/// that title in position order, so repeated titles (separators such as
/// `subheader: Break`) keep matching the items created for them.
fn match_items<'a>(listing: &'a [RemoteResource], items: &[PlannedItem]) -> Vec<Option<&'a RemoteResource>> {
    let mut ordered: Vec<&RemoteResource> = listing.iter().collect();
    ordered.sort_by_key(|r| r.position().unwrap_or(i64::MAX));

    let mut by_title: HashMap<&str, VecDeque<&RemoteResource>> = HashMap::new();
    for resource in ordered {
        if let Some(title) = resource.title() {
            by_title.entry(title).or_default().push_back(resource);
        }
    }
    items
        .iter()
        .map(|item| by_title.get_mut(item.title.as_str()).and_then(VecDeque::pop_front))
        .collect()
}

/// Pass 3. Brings items already in their module to their listed fields,
/// creates items that exist nowhere in the course and returns the items
/// that exist in another module.
///
/// An item in another module is only taken if that module does not list
/// the same title itself.
fn create_items(
    ctx: &SyncContext,
    course: &Course,
    modules: &Collection,
    remotes: &[Option<RemoteResource>],
    planned: &[Vec<PlannedItem>],
    report: &mut SyncReport,
) -> Result<Vec<PendingMove>> {
    let mut listings: Vec<(RemoteResource, Arc<Vec<RemoteResource>>)> = Vec::new();
    for module in ctx.list(modules)?.iter() {
        let items = ctx.list(&module.path.collection(ResourceKind::ModuleItem))?;
        listings.push((module.clone(), items));
    }

    let claimed: HashMap<String, HashSet<&str>> = remotes
        .iter()
        .zip(planned)
        .filter_map(|(remote, items)| {
            let module = remote.as_ref()?;
            Some((module.id(), items.iter().map(|i| i.title.as_str()).collect()))
        })
        .collect();

    let mut moves = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();
    for (remote, items) in remotes.iter().zip(planned) {
        let Some(module) = remote else {
            for item in items {
                let outcome = if ctx.dry_run() {
                    dry_run_create(item, report)
                } else {
                    SyncOutcome::Failed("module was not synced".into())
                };
                report.record(course.name(), &item.label, outcome);
            }
            continue;
        };

        let collection = module.path.collection(ResourceKind::ModuleItem);
        let own = ctx.list(&collection)?;
        for (item, existing) in items.iter().zip(match_items(&own, items)) {
            let outcome = match existing {
                Some(existing) => sync_item(ctx, existing, item),
                None => {
                    let elsewhere: Vec<&RemoteResource> = listings
                        .iter()
                        .filter(|(m, _)| m.id() != module.id())
                        .filter(|(m, _)| !claimed.get(&m.id()).is_some_and(|c| c.contains(item.title.as_str())))
                        .flat_map(|(_, listed)| listed.iter())
                        .filter(|i| i.title() == Some(item.title.as_str()) && !taken.contains(&i.id()))
                        .collect();
                    match elsewhere.as_slice() {
                        [] => create_item(ctx, &collection, item, report),
                        [found] => {
                            taken.insert(found.id());
                            moves.push(PendingMove {
                                item: (*found).clone(),
                                target: module.clone(),
                                planned: item.clone(),
                            });
                            continue;
                        }
                        several => SyncOutcome::Failed(
                            Error::ambiguous("module item", &item.title, several.len()).to_string(),
                        ),
                    }
                }
            };
            if let SyncOutcome::Failed(reason) = &outcome {
                error!(course = course.name(), item = %item.label, reason = %reason, "Module item sync failed");
            }
            report.record(course.name(), &item.label, outcome);
        }
    }
    Ok(moves)
}

/// Update an item already in its module when its listed fields changed.
fn sync_item(ctx: &SyncContext, existing: &RemoteResource, item: &PlannedItem) -> SyncOutcome {
    let desired = Value::Object(item.fields.clone());
    match update_if_changed(ctx, existing.clone(), &item.label, &desired, hash_dict(&desired)) {
        Ok(synced) => synced.outcome,
        Err(e) => SyncOutcome::Failed(e.to_string()),
    }
}

fn create_item(ctx: &SyncContext, collection: &Collection, item: &PlannedItem, report: &mut SyncReport) -> SyncOutcome {
    if ctx.dry_run() {
        return dry_run_create(item, report);
    }
    let desired = Value::Object(item.fields.clone());
    match ctx.create(collection, &desired) {
        Ok(created) => {
            info!(item = %item.label, path = %created.path, "Created module item");
            persist(ctx, &created, &SyncMetadata::with_hash(hash_dict(&desired)));
            SyncOutcome::Created
        }
        Err(e) => SyncOutcome::Failed(e.to_string()),
    }
}

fn dry_run_create(item: &PlannedItem, report: &mut SyncReport) -> SyncOutcome {
    info!(item = %item.label, "[dry-run] Would create module item");
    report.action(format!("[dry-run] Would create module item \"{}\"", item.label));
    SyncOutcome::Created
}

/// Pass 4. The moved item is sent its listed fields along with the new
/// `module_id`, and its hash is recorded under its new path.
fn move_items(ctx: &SyncContext, course: &Course, moves: Vec<PendingMove>, report: &mut SyncReport) {
    let modules = course.path().collection(ResourceKind::Module);
    for pending in moves {
        let label = &pending.planned.label;
        if ctx.dry_run() {
            report.action(format!(
                "[dry-run] Would move module item \"{label}\" from {}",
                pending.item.path
            ));
            report.record(course.name(), label, SyncOutcome::Updated);
            continue;
        }

        let mut desired = pending.planned.fields.clone();
        let hash = hash_dict(&Value::Object(desired.clone()));
        let target_id = pending.target.numeric_id().map_or(Value::Null, Value::from);
        desired.insert("module_id".into(), target_id);

        let moved = ctx.update(&pending.item, &Value::Object(desired)).and_then(|moved| {
            Ok(pending
                .target
                .path
                .collection(ResourceKind::ModuleItem)
                .resource(moved.data)?)
        });
        // both the source and the target listings changed
        ctx.cache.invalidate_prefix(modules.cache_key().as_str());
        let outcome = match moved {
            Ok(moved) => {
                info!(item = %label, path = %moved.path, "Moved module item");
                persist(ctx, &moved, &SyncMetadata::with_hash(hash));
                report.action(format!("Moved module item \"{label}\""));
                SyncOutcome::Updated
            }
            Err(e) => {
                error!(item = %label, error = %e, "Module item move failed");
                SyncOutcome::Failed(e.to_string())
            }
        };
        report.record(course.name(), label, outcome);
    }
}

/// Passes 2 and 5: issue the position writes that put `desired` (ids) in
/// order within `collection`.
fn order(ctx: &SyncContext, collection: &Collection, desired: &[String], report: &mut SyncReport) -> Result<()> {
    let listing = ctx.list(collection)?;
    let mut current: Vec<&RemoteResource> = listing.iter().collect();
    current.sort_by_key(|r| r.position().unwrap_or(i64::MAX));
    let ids: Vec<String> = current.iter().map(|r| r.id()).collect();

    for planned in plan_moves(&ids, desired) {
        let Some(resource) = current.iter().find(|r| r.id() == planned.id) else {
            continue;
        };
        let name = resource.title().unwrap_or_default();
        if ctx.dry_run() {
            info!(kind = %collection.kind(), name, position = planned.position, "[dry-run] Would move");
            report.action(format!(
                "[dry-run] Would move {} \"{name}\" to position {}",
                collection.kind(),
                planned.position
            ));
            continue;
        }
        ctx.update(resource, &json!({ "position": planned.position }))?;
        info!(kind = %collection.kind(), name, position = planned.position, "Moved");
        report.action(format!(
            "Moved {} \"{name}\" to position {}",
            collection.kind(),
            planned.position
        ));
    }
    Ok(())
}
