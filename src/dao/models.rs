use serde::{Deserialize, Serialize};
use std::time::SystemTime;

use crate::quiz::{Question, QuizPayload};

/// Question as persisted inside a quiz record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Question wording.
    pub q: String,
    /// Correct answer.
    pub correct: String,
    /// The three distractors.
    pub wrong: [String; 3],
    /// Optional clue.
    pub hint: Option<String>,
    /// Difficulty level.
    pub difficulty: i64,
    /// Topic of the question.
    pub category: String,
}

/// Content of a quiz: the part covered by the content hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuizContentEntity {
    /// Ordered regular questions.
    pub questions: Vec<QuestionEntity>,
    /// Optional bonus question.
    pub bonus_question: Option<QuestionEntity>,
    /// SHA-256 of the canonical content, unique across quizzes.
    pub content_hash: String,
}

/// Stored quiz record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizEntity {
    /// Primary key of the quiz.
    pub id: i64,
    /// Questions, bonus question and hash.
    pub content: QuizContentEntity,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Lightweight projection used to list quizzes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizListItemEntity {
    /// Primary key of the quiz.
    pub id: i64,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Stored player record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Primary key of the player.
    pub id: i64,
    /// Unique, case-sensitive player name.
    pub name: String,
}

/// Score to append for a player on a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewScoreEntity {
    /// Owning player.
    pub player_id: i64,
    /// Quiz the score was obtained on.
    pub game_id: i64,
    /// Score value.
    pub value: i64,
    /// When the game was played.
    pub played_at: SystemTime,
}

/// Stored score record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntity {
    /// Primary key of the score.
    pub id: i64,
    /// Owning player.
    pub player_id: i64,
    /// Quiz the score was obtained on.
    pub game_id: i64,
    /// Score value.
    pub value: i64,
    /// When the game was played.
    pub played_at: SystemTime,
}

/// Best score of one player, along with the row it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRowEntity {
    /// Player identifier.
    pub player_id: i64,
    /// Player name.
    pub player: String,
    /// Highest score of the player.
    pub best: i64,
    /// Quiz on which the best score was obtained.
    pub game_id: i64,
    /// When the best score was recorded.
    pub played_at: SystemTime,
}

impl From<Question> for QuestionEntity {
    fn from(value: Question) -> Self {
        Self {
            q: value.text,
            correct: value.correct_answer,
            wrong: value.wrong_answers,
            hint: value.hint,
            difficulty: value.difficulty,
            category: value.category,
        }
    }
}

impl From<QuestionEntity> for Question {
    fn from(value: QuestionEntity) -> Self {
        Self {
            text: value.q,
            correct_answer: value.correct,
            wrong_answers: value.wrong,
            hint: value.hint,
            difficulty: value.difficulty,
            category: value.category,
            prize_tier: None,
        }
    }
}

impl QuizContentEntity {
    /// Build the persisted content from provider output and its hash.
    pub fn from_payload(payload: QuizPayload, content_hash: String) -> Self {
        Self {
            questions: payload.questions.into_iter().map(Into::into).collect(),
            bonus_question: payload.bonus_question.map(Into::into),
            content_hash,
        }
    }

    /// Recover the provider-facing payload from stored content.
    pub fn to_payload(&self) -> QuizPayload {
        QuizPayload {
            questions: self.questions.iter().cloned().map(Into::into).collect(),
            bonus_question: self.bonus_question.clone().map(Into::into),
        }
    }
}

impl From<QuizEntity> for QuizListItemEntity {
    fn from(entity: QuizEntity) -> Self {
        Self {
            id: entity.id,
            created_at: entity.created_at,
        }
    }
}
