//! Quiz creation and revision.
//!
//! Creation is idempotent on content: the provider output is canonicalized and
//! hashed, an existing quiz with the same hash is returned as-is, and a lost
//! insert race is resolved by reading the winning row back. The store's unique
//! constraint on the hash is the only synchronization between requests.

use std::time::SystemTime;

use tracing::{info, instrument, warn};

use crate::{
    dao::models::{QuizContentEntity, QuizEntity},
    dto::game::{ExistsResponse, GameListItem, QuizView},
    error::ServiceError,
    quiz::{
        QUESTIONS_PER_QUIZ, QuizPayload,
        canonical::canonicalize,
        schema::content_warnings,
    },
    state::SharedState,
};

const GAME_NOT_FOUND: &str = "Game not found";

/// Generate a new quiz, or return the stored quiz with identical content.
#[instrument(skip(state))]
pub async fn create_game(state: &SharedState) -> Result<QuizView, ServiceError> {
    let payload = state.provider().generate(QUESTIONS_PER_QUIZ).await?;
    log_content_warnings(&payload);

    let canonical = canonicalize(&payload.questions, payload.bonus_question.as_ref());
    let content_hash = canonical.content_hash;
    let store = state.store();

    if let Some(existing) = store.find_quiz_by_hash(content_hash.clone()).await? {
        info!(game_id = existing.id, "identical quiz already stored");
        return Ok(view_of(existing));
    }

    let content = QuizContentEntity::from_payload(payload, content_hash.clone());
    match store.insert_quiz(content, SystemTime::now()).await {
        Ok(quiz) => {
            info!(game_id = quiz.id, "created quiz");
            Ok(view_of(quiz))
        }
        Err(err) if err.is_duplicate_key() => {
            warn!("concurrent insert of identical quiz; reading the stored row back");
            match store.find_quiz_by_hash(content_hash).await? {
                Some(existing) => Ok(view_of(existing)),
                None => Err(ServiceError::ConflictResolution),
            }
        }
        Err(err) => Err(err.into()),
    }
}

/// Revise a stored quiz with a free-form instruction.
///
/// Questions, bonus question and hash are replaced in a single write. A revision
/// whose content already belongs to another quiz is rejected; rows are never merged.
#[instrument(skip(state, instruction), fields(instruction_len = instruction.len()))]
pub async fn update_game(
    state: &SharedState,
    id: i64,
    instruction: String,
) -> Result<QuizView, ServiceError> {
    let store = state.store();
    let Some(current) = store.find_quiz(id).await? else {
        return Err(not_found());
    };

    let revised = state
        .provider()
        .revise(current.content.to_payload(), instruction)
        .await?;
    log_content_warnings(&revised);

    let canonical = canonicalize(&revised.questions, revised.bonus_question.as_ref());
    let content = QuizContentEntity::from_payload(revised, canonical.content_hash);

    match store.replace_quiz_content(id, content.clone()).await {
        Ok(true) => {
            info!(game_id = id, "revised quiz");
            Ok(QuizView::new(id, content))
        }
        Ok(false) => Err(not_found()),
        Err(err) if err.is_duplicate_key() => Err(ServiceError::Conflict(
            "Revised content is identical to another game".into(),
        )),
        Err(err) => Err(err.into()),
    }
}

/// Load one quiz.
pub async fn get_game(state: &SharedState, id: i64) -> Result<QuizView, ServiceError> {
    state
        .store()
        .find_quiz(id)
        .await?
        .map(view_of)
        .ok_or_else(not_found)
}

/// All quizzes ordered by id.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameListItem>, ServiceError> {
    let quizzes = state.store().list_quizzes().await?;
    Ok(quizzes.into_iter().map(Into::into).collect())
}

/// Pick a stored quiz at random; 404 when none exists.
pub async fn random_game(state: &SharedState) -> Result<QuizView, ServiceError> {
    state
        .store()
        .random_quiz()
        .await?
        .map(view_of)
        .ok_or_else(|| ServiceError::NotFound("No games available".into()))
}

/// Whether a quiz with this id is stored.
pub async fn game_exists(state: &SharedState, id: i64) -> Result<ExistsResponse, ServiceError> {
    let exists = state.store().quiz_exists(id).await?;
    Ok(ExistsResponse { exists })
}

/// Delete a quiz together with its scores.
pub async fn delete_game(state: &SharedState, id: i64) -> Result<(), ServiceError> {
    match state.store().delete_quiz(id).await? {
        Some(scores_removed) => {
            info!(game_id = id, scores_removed, "deleted quiz");
            Ok(())
        }
        None => Err(not_found()),
    }
}

fn view_of(quiz: QuizEntity) -> QuizView {
    QuizView::new(quiz.id, quiz.content)
}

fn not_found() -> ServiceError {
    ServiceError::NotFound(GAME_NOT_FOUND.into())
}

fn log_content_warnings(payload: &QuizPayload) {
    for warning in content_warnings(payload, QUESTIONS_PER_QUIZ) {
        warn!(%warning, "provider content breaks a quiz rule");
    }
}
