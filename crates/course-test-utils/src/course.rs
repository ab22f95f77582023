//! [`TestCourse`] builder for course directories on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary course directory with the standard content layout.
///
/// # Example
///
/// ```rust,no_run
/// use course_test_utils::TestCourse;
///
/// let course = TestCourse::new(101)
///     .page("page-syllabus.md", "---\ntitle: Syllabus\n---\n# Welcome\n");
/// course.assert_file_exists("pages/page-syllabus.md");
/// ```
pub struct TestCourse {
    temp_dir: TempDir,
    root: PathBuf,
}

impl TestCourse {
    /// A course root containing `course.yml` for the given remote id.
    pub fn new(course_id: u64) -> Self {
        Self::nested(course_id, "")
    }

    /// A course root at `relative` below the temporary directory, so
    /// several courses can share one tree.
    pub fn nested(course_id: u64, relative: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join(relative);
        fs::create_dir_all(&root).unwrap();
        let course = Self { temp_dir, root };
        course.write("course.yml", &format!("id: {course_id}\nname: Test Course {course_id}\n"));
        course
    }

    /// The temporary directory holding the course tree.
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The course root (the directory holding `course.yml`).
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `content` to `path` relative to the course root.
    pub fn write(&self, path: &str, content: &str) -> PathBuf {
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, content)
            .unwrap_or_else(|e| panic!("TestCourse::write: {}: {e}", full.display()));
        full
    }

    pub fn page(self, name: &str, content: &str) -> Self {
        self.write(&format!("pages/{name}"), content);
        self
    }

    pub fn assignment(self, name: &str, content: &str) -> Self {
        self.write(&format!("assignments/{name}"), content);
        self
    }

    pub fn quiz(self, name: &str, content: &str) -> Self {
        self.write(&format!("quizzes/{name}"), content);
        self
    }

    pub fn slide(self, name: &str, content: &str) -> Self {
        self.write(&format!("slides/{name}"), content);
        self
    }

    pub fn modules(self, content: &str) -> Self {
        self.write("modules.yml", content);
        self
    }

    pub fn assignment_groups(self, content: &str) -> Self {
        self.write("assignment_groups.yml", content);
        self
    }

    pub fn syllabus(self, content: &str) -> Self {
        self.write("syllabus.md", content);
        self
    }

    pub fn read(&self, path: &str) -> String {
        let full = self.root.join(path);
        fs::read_to_string(&full)
            .unwrap_or_else(|e| panic!("TestCourse::read: {}: {e}", full.display()))
    }

    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.root.join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }
}

/// Render a page file with a `title:` front matter.
pub fn page_source(title: &str, body: &str) -> String {
    let front = serde_yaml::to_string(&serde_json::json!({ "title": title })).unwrap();
    format!("---\n{front}---\n{body}")
}
