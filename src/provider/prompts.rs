use serde_json::{Value, json};

use crate::quiz::{KNOWN_CATEGORIES, QuizPayload, canonical::question_value};

const QUESTION_SHAPE: &str = r#"{
  "q": "question text",
  "correct": "the correct answer",
  "wrong": ["distractor 1", "distractor 2", "distractor 3"],
  "hint": "a genuine 50/50 clue that helps without giving the answer away",
  "difficulty": 1,
  "category": "one of the allowed categories",
  "prize": "$100"
}"#;

pub(crate) fn generation_system() -> String {
    "You write questions for a 'Who Wants to Be a Millionaire?' style trivia game \
     and answer with a single JSON object."
        .to_owned()
}

pub(crate) fn generation_user(count: usize) -> String {
    format!(
        "Generate {count} multiple-choice trivia questions plus 1 bonus question.\n\
         \n\
         Rules:\n\
         1. Regular questions MUST be in strictly increasing difficulty, from 1 (easy) to {count} (very hard).\n\
         2. The bonus question is of medium difficulty.\n\
         3. Every question has exactly three plausible wrong answers.\n\
         4. \"category\" is one of: {categories}.\n\
         5. \"prize\" is the tier label, from \"$100\" up to \"$1,000,000\".\n\
         \n\
         Each question object looks like:\n\
         {QUESTION_SHAPE}\n\
         \n\
         Answer with exactly one JSON object with the keys \"questions\" (array of {count} question objects) \
         and \"bonus_question\" (a question object or null). No commentary, no markdown.",
        categories = KNOWN_CATEGORIES.join(", "),
    )
}

pub(crate) fn revision_system() -> String {
    format!(
        "You are an expert 'Who Wants to Be a Millionaire?' question writer and editor.\n\
         When updating a quiz:\n\
         - Preserve the overall structure: question count, difficulty progression, prize tiers and category distribution.\n\
         - Keep every question in this shape:\n\
         {QUESTION_SHAPE}\n\
         - \"category\" stays one of: {categories}.\n\
         - Keep wrong answers plausible.\n\
         - Apply the administrator's instructions precisely without introducing extraneous changes.\n\
         Answer with exactly one JSON object with the keys \"questions\" and \"bonus_question\". \
         No commentary, no markdown, no extra fields.",
        categories = KNOWN_CATEGORIES.join(", "),
    )
}

pub(crate) fn revision_user(current: &QuizPayload, instruction: &str) -> String {
    let current = serde_json::to_string_pretty(&quiz_value(current)).unwrap_or_default();
    format!(
        "Current quiz data:\n{current}\n\nAdmin instructions:\n{instruction}\n\n\
         Return only the updated JSON payload as specified."
    )
}

fn quiz_value(payload: &QuizPayload) -> Value {
    json!({
        "questions": payload.questions.iter().map(question_value).collect::<Vec<_>>(),
        "bonus_question": payload.bonus_question.as_ref().map(question_value),
    })
}
