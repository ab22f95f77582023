//! Shared state of one sync run

use std::sync::Arc;

use course_content::{MarkdownRenderer, Renderer};
use course_remote::{Api, Collection, CollectionCache, MetadataStore, RemoteResource};
use serde_json::Value;

use crate::Result;
use crate::config::DEFAULT_WORKERS;

/// Options for sync operations
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// If true, decide every write without performing it.
    /// Actions will be prefixed with "[dry-run] Would ..."
    pub dry_run: bool,
    /// Items synced concurrently by the batch driver
    pub workers: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Everything a sync operation needs: the account, the run's listing cache,
/// the metadata store and the Markdown renderer.
///
/// One context is shared by every worker of a run.
pub struct SyncContext {
    pub api: Api,
    pub cache: CollectionCache,
    pub metadata: MetadataStore,
    pub renderer: Arc<dyn Renderer>,
    pub options: SyncOptions,
}

impl SyncContext {
    pub fn new(api: Api, options: SyncOptions) -> Self {
        Self {
            metadata: MetadataStore::new(api.clone()),
            api,
            cache: CollectionCache::new(),
            renderer: Arc::new(MarkdownRenderer::new()),
            options,
        }
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.metadata = MetadataStore::with_namespace(self.api.clone(), namespace);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn dry_run(&self) -> bool {
        self.options.dry_run
    }

    /// Memoized listing of a collection.
    pub fn list(&self, collection: &Collection) -> Result<Arc<Vec<RemoteResource>>> {
        Ok(self.cache.list(&self.api, collection)?)
    }

    /// Create a resource and invalidate its collection's listing.
    pub fn create(&self, collection: &Collection, data: &Value) -> Result<RemoteResource> {
        Ok(self.api.create(collection, data)?.apply(&self.cache))
    }

    /// Update a resource and invalidate its collection's listing.
    pub fn update(&self, resource: &RemoteResource, data: &Value) -> Result<RemoteResource> {
        Ok(self.api.update(resource, data)?.apply(&self.cache))
    }

    /// Delete a resource and invalidate its collection's listing.
    pub fn delete(&self, resource: &RemoteResource) -> Result<()> {
        self.api.delete_resource(resource)?.apply(&self.cache);
        Ok(())
    }
}
