//! Quiz document processing
//!
//! Turns an authored quiz YAML document into the quiz fields and question
//! list sent to the LMS. Shorthand keys are expanded, prose is rendered to
//! HTML, answer weights are normalized and missing question types inferred.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::{Map, Value};

use crate::aliases::{self, ANSWER_KEYS, QUESTION_KEYS, QUESTION_TYPES};
use crate::error::{Error, Result};
use crate::markdown::Renderer;
use crate::yaml::scalar_string;

/// Question types that are answered free-form and carry no answer list.
const FREE_FORM_TYPES: [&str; 3] = [
    "file_upload_question",
    "short_answer_question",
    "essay_question",
];

/// A processed quiz ready for sync.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    pub title: String,
    /// Quiz-level fields, excluding questions and the group reference.
    pub fields: Map<String, Value>,
    /// Name prefix of the assignment group this quiz belongs to.
    pub assignment_group: Option<String>,
    pub questions: Vec<Value>,
}

/// Process a parsed quiz document.
///
/// `seed` identifies the course; a `shuffle_questions: true` document is
/// shuffled with it so the order, and therefore the hash, is stable across
/// runs for the same course.
pub fn process_quiz(doc: Value, seed: u64, renderer: &dyn Renderer) -> Result<Quiz> {
    let Value::Object(mut doc) = doc else {
        return Err(Error::invalid("quiz", "document is not a mapping"));
    };

    let title = doc
        .get("title")
        .and_then(scalar_string)
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::missing("quiz", "title"))?;

    let questions = match doc.remove("questions") {
        Some(Value::Array(questions)) => questions,
        Some(_) => return Err(Error::invalid(format!("quiz \"{title}\""), "questions is not a list")),
        None => return Err(Error::missing(format!("quiz \"{title}\""), "questions")),
    };

    let mut questions = questions;
    let shuffle = doc.remove("shuffle_questions").is_some_and(|v| is_truthy(&v));
    if shuffle {
        let mut rng = StdRng::seed_from_u64(seed);
        questions.shuffle(&mut rng);
    }

    let questions = questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| process_question(q, renderer).map_err(|e| in_context(e, &title, i + 1)))
        .collect::<Result<Vec<_>>>()?;

    if let Some(description) = doc.get("description").and_then(scalar_string) {
        doc.insert(
            "description".into(),
            Value::String(renderer.render_fragment(&description)),
        );
    }

    let assignment_group = doc.remove("assignment_group").and_then(|v| scalar_string(&v));

    Ok(Quiz {
        title,
        fields: doc,
        assignment_group,
        questions,
    })
}

/// Process a single question.
pub fn process_question(question: Value, renderer: &dyn Renderer) -> Result<Value> {
    let Value::Object(question) = question else {
        return Err(Error::invalid("question", "not a mapping"));
    };
    let mut question = aliases::rename_keys(question, QUESTION_KEYS);

    if let Some(Value::String(kind)) = question.get_mut("question_type") {
        *kind = aliases::canonical(QUESTION_TYPES, kind).to_string();
    }

    let text = question
        .get("question_text")
        .and_then(scalar_string)
        .ok_or_else(|| Error::missing("question", "question_text"))?;
    question.insert(
        "question_text".into(),
        Value::String(renderer.render_fragment(&text)),
    );

    let free_form = question
        .get("question_type")
        .and_then(Value::as_str)
        .is_some_and(|t| FREE_FORM_TYPES.contains(&t));
    if free_form {
        return Ok(Value::Object(question));
    }

    let answers = match question.remove("answers") {
        Some(Value::Array(answers)) => answers,
        Some(_) => return Err(Error::invalid("question", "answers is not a list")),
        None => return Err(Error::missing("question", "answers")),
    };

    let answers = answers
        .into_iter()
        .enumerate()
        .map(|(i, a)| {
            process_answer(a, renderer).map_err(|e| match e {
                Error::MissingField { field, .. } => Error::missing(format!("answer {}", i + 1), field),
                other => other,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if !question.contains_key("question_type") {
        let weighted = answers
            .iter()
            .filter(|a| a.get("answer_weight").is_some_and(is_truthy))
            .count();
        let inferred = if weighted > 1 {
            "multiple_answers_question"
        } else {
            "multiple_choice_question"
        };
        question.insert("question_type".into(), Value::String(inferred.into()));
    }

    question.insert("answers".into(), Value::Array(answers));
    Ok(Value::Object(question))
}

/// Process a single answer.
pub fn process_answer(answer: Value, renderer: &dyn Renderer) -> Result<Value> {
    let Value::Object(answer) = answer else {
        return Err(Error::invalid("answer", "not a mapping"));
    };
    let mut answer = aliases::rename_keys(answer, ANSWER_KEYS);

    if !answer.contains_key("answer_text") && !answer.contains_key("answer_html") {
        return Err(Error::missing("answer", "answer_text"));
    }

    if let Some(html) = answer.get("answer_html").and_then(scalar_string) {
        answer.insert(
            "answer_html".into(),
            Value::String(renderer.render_fragment(&html)),
        );
    }

    for key in ["answer_text", "answer_match_left", "answer_match_right"] {
        if let Some(value) = answer.get(key).and_then(scalar_string) {
            answer.insert(key.into(), Value::String(value));
        }
    }

    let matching = answer.contains_key("answer_match_left")
        || answer.contains_key("matching_answer_incorrect_matches");
    if !matching {
        let correct = answer.get("answer_weight").is_some_and(is_truthy);
        answer.insert("answer_weight".into(), Value::from(if correct { 100 } else { 0 }));
    }

    Ok(Value::Object(answer))
}

/// Loose truthiness for authored values: `0`, `false`, `""`, `[]`, `{}` and
/// null are false.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn in_context(error: Error, title: &str, index: usize) -> Error {
    match error {
        Error::MissingField { item, field } => {
            Error::missing(format!("{item} of question {index} in quiz \"{title}\""), field)
        }
        Error::Invalid { item, message } => {
            Error::invalid(format!("{item} of question {index} in quiz \"{title}\""), message)
        }
        other => other,
    }
}
