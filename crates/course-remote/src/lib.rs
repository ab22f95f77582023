//! LMS access for coursework
//!
//! This crate owns everything that talks to the remote LMS:
//!
//! - [`http`]: transport abstraction with a reqwest implementation in [`client`]
//! - [`api`]: authenticated, paginated JSON calls
//! - [`resource`]: typed resource paths and the list/get/create/update/delete
//!   capability set
//! - [`cache`]: per-run memoization of collection listings
//! - [`metadata`]: last-synced hashes kept in the user's custom data
//! - [`finder`]: natural-key lookups over listings
//! - [`upload`]: the three-step course file upload

pub mod api;
pub mod cache;
pub mod client;
pub mod error;
pub mod finder;
pub mod http;
pub mod metadata;
pub mod resource;
pub mod upload;

pub use api::Api;
pub use cache::{CacheKey, CollectionCache, Mutation};
pub use client::ReqwestHttpClient;
pub use error::{Error, Result};
pub use finder::{Lookup, find_by_prefix, find_exact, search_substring};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, MultipartForm};
pub use metadata::{MetadataStore, QuestionHashes, SyncMetadata};
pub use resource::{Collection, RemoteResource, ResourceKind, ResourcePath};
pub use upload::{files_named, root_folder, upload_bytes, upload_course_file};
