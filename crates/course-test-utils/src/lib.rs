//! Shared test utilities for the coursework workspace.
//!
//! This crate provides standardised test fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`lms`]: [`FakeLms`], an in-memory LMS behind the `HttpClient` trait
//! - [`course`]: [`TestCourse`] builder for course directories on disk

pub mod course;
pub mod lms;

pub use course::TestCourse;
pub use lms::{BASE_URL, FakeLms, Recorded, TOKEN};
