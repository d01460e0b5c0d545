use std::time::SystemTime;

use tracing::{info, instrument, warn};

use crate::{
    dao::models::{NewScoreEntity, PlayerEntity},
    dto::score::{LeaderboardEntry, ScoreSubmission, ScoreSubmitted},
    error::ServiceError,
    state::SharedState,
};

/// Record a score for `game_id`, creating the player on first use.
///
/// Nothing is written when the game does not exist. A game deleted while the
/// submission is in flight is reported the same way, since the store refuses
/// scores without a quiz.
#[instrument(skip(state, submission), fields(player = %submission.player_name))]
pub async fn submit_score(
    state: &SharedState,
    game_id: i64,
    submission: ScoreSubmission,
) -> Result<ScoreSubmitted, ServiceError> {
    let store = state.store();
    if !store.quiz_exists(game_id).await? {
        return Err(ServiceError::NotFound("Game not found".into()));
    }

    let player = find_or_create_player(state, submission.player_name).await?;
    let score = match store
        .insert_score(NewScoreEntity {
            player_id: player.id,
            game_id,
            value: submission.score,
            played_at: SystemTime::now(),
        })
        .await
    {
        Ok(score) => score,
        Err(err) if err.is_missing_reference() => {
            warn!(game_id, "game deleted before the score was stored");
            return Err(ServiceError::NotFound("Game not found".into()));
        }
        Err(err) => return Err(err.into()),
    };

    info!(score_id = score.id, player_id = player.id, game_id, "score recorded");
    Ok(ScoreSubmitted::new(score.id))
}

/// Best score per player, highest first.
pub async fn leaderboard(
    state: &SharedState,
    limit: Option<usize>,
) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    let limit = limit.unwrap_or(state.config().leaderboard_default_limit);
    let rows = state.store().leaderboard(limit).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

// Same insert-then-refetch pattern as quiz creation, keyed on the unique name.
async fn find_or_create_player(
    state: &SharedState,
    name: String,
) -> Result<PlayerEntity, ServiceError> {
    let store = state.store();
    if let Some(player) = store.find_player_by_name(name.clone()).await? {
        return Ok(player);
    }

    match store.insert_player(name.clone()).await {
        Ok(player) => {
            info!(player_id = player.id, "created player");
            Ok(player)
        }
        Err(err) if err.is_duplicate_key() => {
            warn!("concurrent creation of the same player; reading it back");
            store
                .find_player_by_name(name)
                .await?
                .ok_or(ServiceError::ConflictResolution)
        }
        Err(err) => Err(err.into()),
    }
}
