//! Quizzes and their questions from `quizzes/quiz-*.yml`
//!
//! The quiz itself goes through the ordinary hash-guarded sync. Questions
//! cannot be reliably edited in place, so they are hashed one by one and,
//! when the list of hashes differs from the recorded one in any position,
//! every remote question is deleted and the full set recreated.

use std::path::Path;

use course_content::process_quiz;
use course_fs::{ContentHash, hash_dict};
use course_remote::{QuestionHashes, RemoteResource, ResourceKind, SyncMetadata};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::context::SyncContext;
use super::engine::{Synced, persist, sync_resource};
use super::group::resolve_group;
use super::report::SyncOutcome;
use crate::Result;
use crate::course::Course;

/// Title of the quiz in a quiz file, for filtering by name.
pub fn quiz_title(path: &Path) -> Result<Option<String>> {
    let doc = course_content::yaml::parse(&course_fs::io::read_text_lossy(path)?)?;
    Ok(doc.get("title").and_then(course_content::yaml::scalar_string))
}

/// Sync one quiz file, questions included, into a course.
pub fn sync_quiz(ctx: &SyncContext, course: &Course, path: &Path) -> Result<Synced> {
    let doc = course_content::yaml::parse(&course_fs::io::read_text_lossy(path)?)?;
    let quiz = process_quiz(doc, course.seed(), ctx.renderer.as_ref())?;

    let mut desired = quiz.fields;
    if let Some(prefix) = &quiz.assignment_group {
        desired.insert("assignment_group_id".into(), resolve_group(ctx, course, prefix)?);
    }

    let collection = course.path().collection(ResourceKind::Quiz);
    let mut synced = sync_resource(ctx, &collection, &quiz.title, &Value::Object(desired))?;

    let replaced = match synced.resource.clone() {
        Some(remote) => sync_questions(ctx, &remote, &mut synced.metadata, &quiz.questions)?,
        None => {
            info!(quiz = %quiz.title, questions = quiz.questions.len(), "[dry-run] Would create questions");
            false
        }
    };
    if replaced && synced.outcome == SyncOutcome::Unchanged {
        synced.outcome = SyncOutcome::Updated;
    }
    Ok(synced)
}

/// Replace the quiz's questions if their hashes changed. Returns whether
/// the questions were (or, in a dry run, would be) replaced.
fn sync_questions(
    ctx: &SyncContext,
    quiz: &RemoteResource,
    metadata: &mut SyncMetadata,
    questions: &[Value],
) -> Result<bool> {
    let title = quiz.title().unwrap_or_default();
    let hashes: Vec<ContentHash> = questions.iter().map(hash_dict).collect();
    if metadata.question_hashes() == hashes.as_slice() {
        debug!(quiz = title, "Questions unchanged");
        return Ok(false);
    }

    let collection = quiz.path.collection(ResourceKind::Question);
    let existing = ctx.list(&collection)?;
    if ctx.dry_run() {
        info!(
            quiz = title,
            removing = existing.len(),
            adding = questions.len(),
            "[dry-run] Would replace questions"
        );
        return Ok(true);
    }

    info!(quiz = title, removing = existing.len(), adding = questions.len(), "Replacing questions");
    for question in existing.iter() {
        ctx.delete(question)?;
    }
    for question in questions {
        ctx.create(&collection, question)?;
    }

    metadata.questions = Some(QuestionHashes { hashes });
    persist(ctx, quiz, metadata);
    ctx.update(quiz, &json!({ "question_count": questions.len() }))?;
    Ok(true)
}
