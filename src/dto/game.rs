use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{QuestionEntity, QuizContentEntity, QuizListItemEntity},
    dto::{format_system_time, validation::validate_not_blank},
};

/// Question as exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuestionDto {
    /// Question wording.
    pub q: String,
    /// Correct answer.
    pub correct: String,
    /// Exactly three wrong answers.
    pub wrong: [String; 3],
    /// Optional 50/50 clue.
    pub hint: Option<String>,
    /// Difficulty level.
    pub difficulty: i64,
    /// Question topic.
    pub category: String,
}

/// Full quiz returned by create, read, random and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct QuizView {
    /// Quiz identifier.
    pub game_id: i64,
    /// Ordered regular questions.
    pub questions: Vec<QuestionDto>,
    /// Optional bonus question.
    pub bonus_question: Option<QuestionDto>,
}

/// Entry of the quiz listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GameListItem {
    /// Quiz identifier.
    pub game_id: i64,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Answer of the existence check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExistsResponse {
    /// Whether a quiz with the requested id is stored.
    pub exists: bool,
}

/// Free-form revision instruction for an existing quiz.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateGameRequest {
    /// What to change, in plain language. `prompt` is accepted as an alias.
    #[serde(alias = "prompt")]
    #[validate(
        length(min = 1, max = 4000),
        custom(function = "validate_not_blank")
    )]
    pub instruction: String,
}

impl From<QuestionEntity> for QuestionDto {
    fn from(value: QuestionEntity) -> Self {
        Self {
            q: value.q,
            correct: value.correct,
            wrong: value.wrong,
            hint: value.hint,
            difficulty: value.difficulty,
            category: value.category,
        }
    }
}

impl QuizView {
    /// Build the view of a quiz from its id and stored content.
    pub fn new(game_id: i64, content: QuizContentEntity) -> Self {
        Self {
            game_id,
            questions: content.questions.into_iter().map(Into::into).collect(),
            bonus_question: content.bonus_question.map(Into::into),
        }
    }
}

impl From<QuizListItemEntity> for GameListItem {
    fn from(value: QuizListItemEntity) -> Self {
        Self {
            game_id: value.id,
            created_at: format_system_time(value.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    #[test]
    fn update_request_accepts_prompt_alias() {
        let request: UpdateGameRequest =
            serde_json::from_str(r#"{"prompt": "make it harder"}"#).unwrap();
        assert_eq!(request.instruction, "make it harder");
        assert!(request.validate().is_ok());
    }

    #[test]
    fn update_request_rejects_blank_and_oversized_instructions() {
        let blank = UpdateGameRequest {
            instruction: "   ".into(),
        };
        let oversized = UpdateGameRequest {
            instruction: "x".repeat(4001),
        };

        assert!(blank.validate().is_err());
        assert!(oversized.validate().is_err());
    }

    #[test]
    fn list_item_formats_rfc3339() {
        let item: GameListItem = QuizListItemEntity {
            id: 3,
            created_at: UNIX_EPOCH + Duration::from_secs(86_400),
        }
        .into();

        assert_eq!(item.game_id, 3);
        assert_eq!(item.created_at, "1970-01-02T00:00:00Z");
    }
}
