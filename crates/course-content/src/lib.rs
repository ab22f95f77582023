//! Local course document parsing and rendering
//!
//! Reads the files authors write (front-matter Markdown, quiz, module and
//! assignment-group YAML) and turns them into the desired remote field
//! values. Nothing in this crate talks to the network.

pub mod aliases;
pub mod document;
pub mod error;
pub mod frontmatter;
pub mod group;
pub mod markdown;
pub mod module;
pub mod quiz;
pub mod slides;
pub mod yaml;

pub use document::{AssignmentDoc, PageDoc};
pub use error::{Error, Result};
pub use frontmatter::FrontMatter;
pub use group::{GroupDoc, parse_groups};
pub use markdown::{MarkdownRenderer, Rendered, Renderer};
pub use module::{ItemKind, ModuleDoc, ModuleItemDoc, parse_modules};
pub use quiz::{Quiz, process_quiz};
