//! Canonical form of quiz content.
//!
//! The canonical payload is compact JSON with object keys sorted at every level.
//! Question order is kept as-is: two quizzes with the same questions in a different
//! order are different content.

use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use super::Question;

/// Canonical serialization of a quiz together with its SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalQuiz {
    /// Sorted-key compact JSON.
    pub payload: String,
    /// Lowercase hex SHA-256 of `payload`.
    pub content_hash: String,
}

/// Canonicalize questions and bonus question and hash the result.
pub fn canonicalize(questions: &[Question], bonus_question: Option<&Question>) -> CanonicalQuiz {
    let value = json!({
        "questions": questions.iter().map(question_value).collect::<Vec<_>>(),
        "bonus_question": bonus_question.map(question_value),
    });

    let mut payload = String::new();
    write_sorted(&value, &mut payload);

    let content_hash = hex::encode(Sha256::digest(payload.as_bytes()));
    CanonicalQuiz {
        payload,
        content_hash,
    }
}

// prize_tier is not part of the stored content, so it stays out of the hash.
pub(crate) fn question_value(question: &Question) -> Value {
    json!({
        "q": question.text,
        "correct": question.correct_answer,
        "wrong": question.wrong_answers,
        "hint": question.hint,
        "difficulty": question.difficulty,
        "category": question.category,
    })
}

fn write_sorted(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(left, _), (right, _)| left.cmp(right));

            out.push('{');
            for (index, (key, value)) in entries.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_sorted(value, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_sorted(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::schema::parse_question;

    fn question(text: &str, difficulty: i64) -> Question {
        Question {
            text: text.into(),
            correct_answer: "Paris".into(),
            wrong_answers: ["London".into(), "Berlin".into(), "Madrid".into()],
            hint: Some("City of Light".into()),
            difficulty,
            category: "Geography".into(),
            prize_tier: None,
        }
    }

    #[test]
    fn hash_is_deterministic() {
        let questions = vec![question("a?", 1), question("b?", 2)];
        let bonus = question("bonus?", 8);

        let first = canonicalize(&questions, Some(&bonus));
        let second = canonicalize(&questions.clone(), Some(&bonus.clone()));

        assert_eq!(first, second);
        assert_eq!(first.content_hash.len(), 64);
        assert!(
            first
                .content_hash
                .chars()
                .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        );
    }

    #[test]
    fn question_order_is_content() {
        let forward = vec![question("a?", 1), question("b?", 2)];
        let reversed = vec![question("b?", 2), question("a?", 1)];

        assert_ne!(
            canonicalize(&forward, None).content_hash,
            canonicalize(&reversed, None).content_hash
        );
    }

    #[test]
    fn bonus_question_changes_hash() {
        let questions = vec![question("a?", 1)];
        let bonus = question("bonus?", 5);

        assert_ne!(
            canonicalize(&questions, None).content_hash,
            canonicalize(&questions, Some(&bonus)).content_hash
        );
    }

    #[test]
    fn key_order_in_source_json_does_not_matter() {
        let one = serde_json::json!({
            "q": "x?", "correct": "y", "wrong": ["a", "b", "c"],
            "hint": null, "difficulty": 3, "category": "Science"
        });
        let two: Value = serde_json::from_str(
            r#"{"category":"Science","difficulty":3,"hint":null,"wrong":["a","b","c"],"correct":"y","q":"x?"}"#,
        )
        .unwrap();

        let one = parse_question(&one, "q").unwrap();
        let two = parse_question(&two, "q").unwrap();

        assert_eq!(
            canonicalize(&[one], None).content_hash,
            canonicalize(&[two], None).content_hash
        );
    }

    #[test]
    fn prize_tier_is_not_hashed() {
        let plain = question("a?", 1);
        let mut with_prize = plain.clone();
        with_prize.prize_tier = Some("$100".into());

        assert_eq!(
            canonicalize(&[plain], None).content_hash,
            canonicalize(&[with_prize], None).content_hash
        );
    }

    #[test]
    fn payload_has_sorted_keys() {
        let canonical = canonicalize(&[question("a?", 1)], None);

        assert_eq!(
            canonical.payload,
            r#"{"bonus_question":null,"questions":[{"category":"Geography","correct":"Paris","difficulty":1,"hint":"City of Light","q":"a?","wrong":["London","Berlin","Madrid"]}]}"#
        );
    }
}
