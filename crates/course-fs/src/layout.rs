//! Course directory layout
//!
//! A course directory holds a `course.yml` descriptor and any of the content
//! locations below. The course root is the nearest ancestor of a path that
//! contains at least one content location.
//!
//! ```text
//! <root>/
//!   slides/slide-*.md
//!   pages/page-*.md
//!   quizzes/quiz-*.yml
//!   assignments/assign-*.md
//!   modules.yml
//!   assignment_groups.yml
//!   <section>/course.yml
//!   <section>/syllabus.md
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Course descriptor file name.
pub const COURSE_FILE: &str = "course.yml";

/// Syllabus source, found next to the course descriptor.
pub const SYLLABUS_FILE: &str = "syllabus.md";

/// Kinds of local content a course root can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Slide,
    Page,
    Quiz,
    Assignment,
    Module,
    AssignmentGroups,
}

impl ContentKind {
    /// Every content kind, in discovery order.
    pub const ALL: [ContentKind; 6] = [
        ContentKind::Slide,
        ContentKind::Page,
        ContentKind::Quiz,
        ContentKind::Assignment,
        ContentKind::Module,
        ContentKind::AssignmentGroups,
    ];

    /// Directory or file name relative to the course root.
    pub fn location(self) -> &'static str {
        match self {
            ContentKind::Slide => "slides",
            ContentKind::Page => "pages",
            ContentKind::Quiz => "quizzes",
            ContentKind::Assignment => "assignments",
            ContentKind::Module => "modules.yml",
            ContentKind::AssignmentGroups => "assignment_groups.yml",
        }
    }

    /// File name prefix and extension for directory-backed kinds.
    ///
    /// Returns `None` for kinds stored in a single file.
    pub fn file_pattern(self) -> Option<(&'static str, &'static str)> {
        match self {
            ContentKind::Slide => Some(("slide-", "md")),
            ContentKind::Page => Some(("page-", "md")),
            ContentKind::Quiz => Some(("quiz-", "yml")),
            ContentKind::Assignment => Some(("assign-", "md")),
            ContentKind::Module | ContentKind::AssignmentGroups => None,
        }
    }

    /// Whether the presence of this location marks a course root.
    fn marks_root(self) -> bool {
        !matches!(self, ContentKind::AssignmentGroups)
    }
}

/// Absolute content locations for one course root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPaths {
    root: PathBuf,
}

impl ContentPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Locate the course root above `path` and build its content paths.
    pub fn discover(path: &Path) -> Result<Self> {
        find_course_root(path).map(Self::new)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of a content kind (which may not exist).
    pub fn get(&self, kind: ContentKind) -> PathBuf {
        self.root.join(kind.location())
    }

    /// List content files of a directory-backed kind, sorted by name.
    ///
    /// A missing directory yields an empty list. Single-file kinds yield the
    /// file itself when it exists.
    pub fn list(&self, kind: ContentKind) -> Result<Vec<PathBuf>> {
        let location = self.get(kind);
        let Some((prefix, extension)) = kind.file_pattern() else {
            return Ok(if location.is_file() {
                vec![location]
            } else {
                Vec::new()
            });
        };

        if !location.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&location).map_err(|e| Error::io(&location, e))?;
        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&location, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name_matches = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix));
            let ext_matches = path.extension().and_then(|e| e.to_str()) == Some(extension);
            if name_matches && ext_matches {
                found.push(path);
            }
        }
        found.sort();
        Ok(found)
    }
}

/// Walk up from `path` to the nearest directory containing a content location.
pub fn find_course_root(path: &Path) -> Result<PathBuf> {
    let start = dunce::canonicalize(path).map_err(|e| Error::io(path, e))?;

    for candidate in start.ancestors() {
        let has_content = ContentKind::ALL
            .iter()
            .filter(|k| k.marks_root())
            .any(|k| candidate.join(k.location()).exists());
        if has_content {
            tracing::debug!(root = %candidate.display(), "Found course root");
            return Ok(candidate.to_path_buf());
        }
    }

    Err(Error::CourseRootNotFound { path: start })
}

/// Recursively collect every `course.yml` under `path`, sorted.
///
/// `path` may also point directly at a descriptor file.
pub fn find_course_files(path: &Path) -> Result<Vec<PathBuf>> {
    let path = dunce::canonicalize(path).map_err(|e| Error::io(path, e))?;
    if path.is_file() {
        return Ok(if path.file_name().and_then(|n| n.to_str()) == Some(COURSE_FILE) {
            vec![path]
        } else {
            Vec::new()
        });
    }

    let mut found = Vec::new();
    let mut pending = vec![path];
    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&dir, e))?;
            let entry_path = entry.path();
            let file_type = entry.file_type().map_err(|e| Error::io(&entry_path, e))?;
            if file_type.is_dir() {
                let hidden = entry.file_name().to_string_lossy().starts_with('.');
                if !hidden {
                    pending.push(entry_path);
                }
            } else if entry.file_name() == COURSE_FILE {
                found.push(entry_path);
            }
        }
    }

    found.sort();
    Ok(found)
}

/// Find exactly one `course.yml` under `path`.
pub fn find_one_course_file(path: &Path) -> Result<PathBuf> {
    let mut found = find_course_files(path)?;
    match found.len() {
        0 => Err(Error::CourseFileNotFound {
            file: COURSE_FILE.into(),
            path: path.to_path_buf(),
        }),
        1 => Ok(found.remove(0)),
        _ => Err(Error::MultipleCourseFiles {
            file: COURSE_FILE.into(),
            path: path.to_path_buf(),
            found,
        }),
    }
}

/// Resolve a possibly relative path against the course root.
pub fn resolve_path(course_root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        course_root.join(path)
    }
}
