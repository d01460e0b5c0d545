//! Quiz content types shared by the provider, the canonicalizer and the store.

/// Canonical serialization and content hashing.
pub mod canonical;
/// Validation of untyped provider output into [`Question`] values.
pub mod schema;

use serde::{Deserialize, Serialize};

/// Number of regular questions requested for every generated quiz.
pub const QUESTIONS_PER_QUIZ: usize = 15;

/// Categories the provider is instructed to draw from.
pub const KNOWN_CATEGORIES: [&str; 10] = [
    "History",
    "Geography",
    "Science",
    "Arts & Literature",
    "Sports",
    "Pop Culture",
    "Food & Drink",
    "Nature",
    "Tech & Innovation",
    "World Cultures",
];

/// A single multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Question wording.
    pub text: String,
    /// The one correct answer.
    pub correct_answer: String,
    /// Exactly three distractors.
    pub wrong_answers: [String; 3],
    /// Optional 50/50 style clue.
    pub hint: Option<String>,
    /// Difficulty level, expected to increase across a quiz.
    pub difficulty: i64,
    /// Topic of the question.
    pub category: String,
    /// Prize tier label produced by the provider. Never persisted.
    pub prize_tier: Option<String>,
}

/// Questions plus the optional bonus question, as produced by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizPayload {
    /// Ordered regular questions.
    pub questions: Vec<Question>,
    /// Optional bonus question.
    pub bonus_question: Option<Question>,
}
