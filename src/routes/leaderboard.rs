use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use validator::Validate;

use crate::{
    dto::score::{LeaderboardEntry, LeaderboardQuery},
    error::AppError,
    services::score_service,
    state::SharedState,
};

/// Leaderboard routes, reachable with or without the trailing slash.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/leaderboard", get(leaderboard))
        .route("/leaderboard/", get(leaderboard))
}

/// Best score per player, highest first.
#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "scores",
    params(LeaderboardQuery),
    responses(
        (status = 200, description = "Leaderboard rows", body = [LeaderboardEntry]),
        (status = 400, description = "Limit out of range")
    )
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    query.validate()?;
    Ok(Json(score_service::leaderboard(&state, query.limit).await?))
}
