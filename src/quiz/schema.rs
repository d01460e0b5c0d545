//! Validation of loosely typed provider output.
//!
//! Providers hand back a JSON tree of unknown shape. It is parsed into a
//! [`serde_json::Value`] first and then checked field by field, so that every
//! rejection names the offending path.

use serde_json::{Map, Value};
use thiserror::Error;

use super::{KNOWN_CATEGORIES, Question, QuizPayload};

/// Reasons a provider payload cannot be turned into quiz content.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The raw text was not JSON at all.
    #[error("provider returned invalid JSON")]
    InvalidJson(#[source] serde_json::Error),
    /// A successful provider response did not have the chat-completion shape.
    #[error("provider response is not a chat completion")]
    MalformedEnvelope(#[source] serde_json::Error),
    /// A JSON object was expected at `path`.
    #[error("`{path}` must be an object")]
    NotAnObject {
        /// JSON path of the value.
        path: String,
    },
    /// A required field is absent or null.
    #[error("`{path}.{field}` is missing")]
    MissingField {
        /// JSON path of the enclosing object.
        path: String,
        /// Missing key.
        field: &'static str,
    },
    /// A field holds a value of the wrong type.
    #[error("`{path}.{field}` must be {expected}")]
    WrongType {
        /// JSON path of the enclosing object.
        path: String,
        /// Offending key.
        field: &'static str,
        /// Expected JSON type.
        expected: &'static str,
    },
    /// The wrong-answer list does not hold exactly three entries.
    #[error("`{path}.wrong` must hold exactly 3 answers (got {found})")]
    WrongAnswerArity {
        /// JSON path of the question.
        path: String,
        /// Number of wrong answers received.
        found: usize,
    },
}

/// Parse raw provider text into quiz content.
pub fn parse_payload_str(raw: &str) -> Result<QuizPayload, SchemaError> {
    let value: Value = serde_json::from_str(raw).map_err(SchemaError::InvalidJson)?;
    parse_payload(&value)
}

/// Validate an untyped JSON tree into quiz content.
pub fn parse_payload(value: &Value) -> Result<QuizPayload, SchemaError> {
    let root = as_object(value, "$")?;

    let questions = match root.get("questions") {
        None | Some(Value::Null) => {
            return Err(SchemaError::MissingField {
                path: "$".into(),
                field: "questions",
            });
        }
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| parse_question(item, &format!("$.questions[{index}]")))
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(SchemaError::WrongType {
                path: "$".into(),
                field: "questions",
                expected: "an array",
            });
        }
    };

    let bonus_question = match root.get("bonus_question") {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_question(value, "$.bonus_question")?),
    };

    Ok(QuizPayload {
        questions,
        bonus_question,
    })
}

/// Validate a single question object located at `path`.
pub fn parse_question(value: &Value, path: &str) -> Result<Question, SchemaError> {
    let object = as_object(value, path)?;

    let text = required_string(object, path, "q")?;
    let correct_answer = required_string(object, path, "correct")?;
    let wrong_answers = wrong_answers(object, path)?;
    let hint = optional_string(object, path, "hint")?;
    let difficulty = difficulty(object, path)?;
    let category = required_string(object, path, "category")?;
    let prize_tier = optional_string(object, path, "prize")?;

    Ok(Question {
        text,
        correct_answer,
        wrong_answers,
        hint,
        difficulty,
        category,
        prize_tier,
    })
}

/// List the soft rules a payload breaks: question count, monotonic difficulty
/// and the closed category set. These are prompt-level rules and are reported,
/// not enforced.
pub fn content_warnings(payload: &QuizPayload, expected_count: usize) -> Vec<String> {
    let mut warnings = Vec::new();

    if payload.questions.len() != expected_count {
        warnings.push(format!(
            "expected {expected_count} questions, got {}",
            payload.questions.len()
        ));
    }

    for (index, pair) in payload.questions.windows(2).enumerate() {
        if pair[1].difficulty <= pair[0].difficulty {
            warnings.push(format!(
                "difficulty does not increase at question {} ({} -> {})",
                index + 1,
                pair[0].difficulty,
                pair[1].difficulty
            ));
        }
    }

    let all = payload
        .questions
        .iter()
        .chain(payload.bonus_question.as_ref());
    for question in all {
        if !KNOWN_CATEGORIES.contains(&question.category.as_str()) {
            warnings.push(format!("unknown category `{}`", question.category));
        }
    }

    warnings
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, SchemaError> {
    value.as_object().ok_or_else(|| SchemaError::NotAnObject {
        path: path.to_owned(),
    })
}

fn required_string(
    object: &Map<String, Value>,
    path: &str,
    field: &'static str,
) -> Result<String, SchemaError> {
    optional_string(object, path, field)?.ok_or_else(|| SchemaError::MissingField {
        path: path.to_owned(),
        field,
    })
}

fn optional_string(
    object: &Map<String, Value>,
    path: &str,
    field: &'static str,
) -> Result<Option<String>, SchemaError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(_) => Err(SchemaError::WrongType {
            path: path.to_owned(),
            field,
            expected: "a string",
        }),
    }
}

fn wrong_answers(object: &Map<String, Value>, path: &str) -> Result<[String; 3], SchemaError> {
    let items = match object.get("wrong") {
        None | Some(Value::Null) => {
            return Err(SchemaError::MissingField {
                path: path.to_owned(),
                field: "wrong",
            });
        }
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(SchemaError::WrongType {
                path: path.to_owned(),
                field: "wrong",
                expected: "an array of strings",
            });
        }
    };

    let answers = items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_owned)
                .ok_or_else(|| SchemaError::WrongType {
                    path: path.to_owned(),
                    field: "wrong",
                    expected: "an array of strings",
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    <[String; 3]>::try_from(answers).map_err(|answers| SchemaError::WrongAnswerArity {
        path: path.to_owned(),
        found: answers.len(),
    })
}

// Integral numbers and numeric strings are accepted; anything else is rejected.
fn difficulty(object: &Map<String, Value>, path: &str) -> Result<i64, SchemaError> {
    let wrong_type = || SchemaError::WrongType {
        path: path.to_owned(),
        field: "difficulty",
        expected: "an integer",
    };

    match object.get("difficulty") {
        None | Some(Value::Null) => Err(SchemaError::MissingField {
            path: path.to_owned(),
            field: "difficulty",
        }),
        Some(Value::Number(number)) => number
            .as_i64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|value| value.fract() == 0.0)
                    .map(|value| value as i64)
            })
            .ok_or_else(wrong_type),
        Some(Value::String(raw)) => raw.trim().parse::<i64>().map_err(|_| wrong_type()),
        Some(_) => Err(wrong_type()),
    }
}
