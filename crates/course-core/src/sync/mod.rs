//! Sync of local course content into the LMS
//!
//! This module provides:
//! - **engine**: hash-guarded create-or-update shared by every content type
//! - **page**, **assignment**, **quiz**, **group**, **module**, **slides**,
//!   **syllabus**: the per-type variations
//! - **order**: minimal position writes for ordered collections
//! - **runner**: [`SyncEngine`], fanning a command out over courses and files

mod assignment;
mod context;
mod engine;
mod group;
mod module;
mod order;
mod page;
mod quiz;
mod report;
mod runner;
mod slides;
mod syllabus;

pub use assignment::sync_assignment;
pub use context::{SyncContext, SyncOptions};
pub use engine::{Synced, persist, sync_resource};
pub use group::{resolve_group, sync_assignment_groups};
pub use module::sync_modules;
pub use order::{Move, plan_moves};
pub use page::sync_page;
pub use quiz::{quiz_title, sync_quiz};
pub use report::{Counts, ItemReport, SyncOutcome, SyncReport};
pub use runner::SyncEngine;
pub use slides::{SlideDeck, companion_path, render_slide, sync_slide};
pub use syllabus::sync_syllabus;
