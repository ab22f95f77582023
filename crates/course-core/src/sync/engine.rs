//! Hash-guarded create-or-update of one remote resource
//!
//! The content hash of the desired field values is compared with the hash
//! recorded in the resource's sync metadata:
//!
//! - no resource with the natural key: create it, record the hash
//! - recorded hash equals the new hash: nothing is written
//! - otherwise: send the full desired state, record the new hash
//!
//! A crash between the write and the metadata update leaves a stale hash,
//! so the next run re-sends the same state and converges.

use course_fs::{ContentHash, hash_dict};
use course_remote::{Collection, Lookup, RemoteResource, SyncMetadata, find_exact};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::context::SyncContext;
use super::report::SyncOutcome;
use crate::{Error, Result};

/// Result of syncing one resource.
#[derive(Debug, Clone)]
pub struct Synced {
    pub outcome: SyncOutcome,
    /// The remote resource after the sync. `None` only when a dry run
    /// skipped its creation.
    pub resource: Option<RemoteResource>,
    /// Metadata as recorded (or, in a dry run, as it would be recorded).
    pub metadata: SyncMetadata,
}

/// Bring the resource named `key` in `collection` to `desired`.
///
/// # Errors
///
/// Returns [`Error::AmbiguousMatch`] without writing if several resources
/// share the key, and any rejected read or write.
pub fn sync_resource(ctx: &SyncContext, collection: &Collection, key: &str, desired: &Value) -> Result<Synced> {
    let hash = hash_dict(desired);
    let listing = ctx.list(collection)?;
    match find_exact(&listing, key) {
        Lookup::Ambiguous(found) => Err(Error::ambiguous(collection.kind(), key, found.len())),
        Lookup::Absent => create(ctx, collection, key, desired, hash),
        Lookup::Found(existing) => update_if_changed(ctx, existing.clone(), key, desired, hash),
    }
}

fn create(ctx: &SyncContext, collection: &Collection, key: &str, desired: &Value, hash: ContentHash) -> Result<Synced> {
    let metadata = SyncMetadata::with_hash(hash);
    if ctx.dry_run() {
        info!(kind = %collection.kind(), key, "[dry-run] Would create");
        return Ok(Synced {
            outcome: SyncOutcome::Created,
            resource: None,
            metadata,
        });
    }

    let created = ctx.create(collection, desired)?;
    info!(kind = %collection.kind(), key, path = %created.path, "Created");
    persist(ctx, &created, &metadata);
    Ok(Synced {
        outcome: SyncOutcome::Created,
        resource: Some(created),
        metadata,
    })
}

/// Compare `existing` with `desired` through its recorded hash and update it
/// when they differ.
pub(super) fn update_if_changed(
    ctx: &SyncContext,
    existing: RemoteResource,
    key: &str,
    desired: &Value,
    hash: ContentHash,
) -> Result<Synced> {
    let mut metadata = if ctx.dry_run() {
        ctx.metadata.read(&existing)?.unwrap_or_default()
    } else {
        ctx.metadata.get(&existing)?
    };

    if metadata.hash.as_ref() == Some(&hash) {
        debug!(kind = %existing.kind, key, "Unchanged");
        return Ok(Synced {
            outcome: SyncOutcome::Unchanged,
            resource: Some(existing),
            metadata,
        });
    }

    metadata.hash = Some(hash);
    if ctx.dry_run() {
        info!(kind = %existing.kind, key, path = %existing.path, "[dry-run] Would update");
        return Ok(Synced {
            outcome: SyncOutcome::Updated,
            resource: Some(existing),
            metadata,
        });
    }

    let updated = ctx.update(&existing, desired)?;
    info!(kind = %existing.kind, key, path = %updated.path, "Updated");
    persist(ctx, &updated, &metadata);
    Ok(Synced {
        outcome: SyncOutcome::Updated,
        resource: Some(updated),
        metadata,
    })
}

/// Record metadata for a resource. A rejected write is logged; the caller
/// carries on and the next run re-sends the same state.
pub fn persist(ctx: &SyncContext, resource: &RemoteResource, metadata: &SyncMetadata) {
    if !ctx.metadata.set(resource, metadata) {
        let error = Error::MetadataPersistFailure {
            target: resource.path.to_string(),
        };
        warn!(error = %error, "Next run will re-send this resource");
    }
}
