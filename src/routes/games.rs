use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{MethodRouter, get, post, put},
};
use validator::Validate;

use crate::{
    dto::{
        game::{ExistsResponse, GameListItem, QuizView, UpdateGameRequest},
        score::{ScoreSubmission, ScoreSubmitted},
    },
    error::AppError,
    services::{game_service, score_service},
    state::SharedState,
};

const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Quiz endpoints. Creation, revision and deletion sit behind the admin gate.
pub fn router(state: SharedState) -> Router<SharedState> {
    let create = admin_only(&state, post(create_game));

    Router::new()
        .route("/games", create.clone())
        .route("/games/", create)
        .route("/games/list", get(list_games))
        .route("/games/random", get(random_game))
        .route(
            "/games/{id}",
            get(get_game).merge(admin_only(&state, put(update_game).delete(delete_game))),
        )
        .route("/games/{id}/exists", get(game_exists))
        .route("/games/{id}/score", post(submit_score))
}

fn admin_only(
    state: &SharedState,
    methods: MethodRouter<SharedState>,
) -> MethodRouter<SharedState> {
    methods.route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_admin_key,
    ))
}

/// Generate a new quiz, or return the stored quiz with identical content.
#[utoipa::path(
    post,
    path = "/games",
    tag = "games",
    params(("X-Admin-Key" = String, Header, description = "Shared admin secret")),
    responses(
        (status = 200, description = "Quiz created or already stored", body = QuizView),
        (status = 403, description = "Missing or invalid admin key"),
        (status = 502, description = "Provider returned malformed content"),
        (status = 503, description = "Provider or storage unavailable"),
        (status = 500, description = "Conflict could not be resolved")
    )
)]
pub async fn create_game(State(state): State<SharedState>) -> Result<Json<QuizView>, AppError> {
    Ok(Json(game_service::create_game(&state).await?))
}

/// List every stored quiz, oldest first.
#[utoipa::path(
    get,
    path = "/games/list",
    tag = "games",
    responses((status = 200, description = "Stored quizzes", body = [GameListItem]))
)]
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameListItem>>, AppError> {
    Ok(Json(game_service::list_games(&state).await?))
}

/// Pick a stored quiz at random.
#[utoipa::path(
    get,
    path = "/games/random",
    tag = "games",
    responses(
        (status = 200, description = "A random quiz", body = QuizView),
        (status = 404, description = "No quiz stored")
    )
)]
pub async fn random_game(State(state): State<SharedState>) -> Result<Json<QuizView>, AppError> {
    Ok(Json(game_service::random_game(&state).await?))
}

/// Fetch one quiz by id.
#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "games",
    params(("id" = i64, Path, description = "Quiz identifier")),
    responses(
        (status = 200, description = "Quiz", body = QuizView),
        (status = 404, description = "Game not found")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<QuizView>, AppError> {
    Ok(Json(game_service::get_game(&state, id).await?))
}

/// Revise a quiz through the content provider.
#[utoipa::path(
    put,
    path = "/games/{id}",
    tag = "games",
    params(
        ("X-Admin-Key" = String, Header, description = "Shared admin secret"),
        ("id" = i64, Path, description = "Quiz identifier")
    ),
    request_body = UpdateGameRequest,
    responses(
        (status = 200, description = "Quiz revised", body = QuizView),
        (status = 400, description = "Invalid instruction"),
        (status = 403, description = "Missing or invalid admin key"),
        (status = 404, description = "Game not found"),
        (status = 409, description = "Revised content matches another quiz"),
        (status = 502, description = "Provider returned malformed content"),
        (status = 503, description = "Provider or storage unavailable")
    )
)]
pub async fn update_game(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateGameRequest>,
) -> Result<Json<QuizView>, AppError> {
    payload.validate()?;
    Ok(Json(
        game_service::update_game(&state, id, payload.instruction).await?,
    ))
}

/// Delete a quiz and its scores.
#[utoipa::path(
    delete,
    path = "/games/{id}",
    tag = "games",
    params(
        ("X-Admin-Key" = String, Header, description = "Shared admin secret"),
        ("id" = i64, Path, description = "Quiz identifier")
    ),
    responses(
        (status = 204, description = "Quiz deleted"),
        (status = 403, description = "Missing or invalid admin key"),
        (status = 404, description = "Game not found")
    )
)]
pub async fn delete_game(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    game_service::delete_game(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Tell whether a quiz id is stored.
#[utoipa::path(
    get,
    path = "/games/{id}/exists",
    tag = "games",
    params(("id" = i64, Path, description = "Quiz identifier")),
    responses((status = 200, description = "Whether the quiz is stored", body = ExistsResponse))
)]
pub async fn game_exists(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<ExistsResponse>, AppError> {
    Ok(Json(game_service::game_exists(&state, id).await?))
}

/// Record a player's score on a quiz.
#[utoipa::path(
    post,
    path = "/games/{id}/score",
    tag = "scores",
    params(("id" = i64, Path, description = "Quiz identifier")),
    request_body = ScoreSubmission,
    responses(
        (status = 201, description = "Score recorded", body = ScoreSubmitted),
        (status = 400, description = "Invalid submission"),
        (status = 404, description = "Game not found")
    )
)]
pub async fn submit_score(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<ScoreSubmission>,
) -> Result<(StatusCode, Json<ScoreSubmitted>), AppError> {
    payload.validate()?;
    let submitted = score_service::submit_score(&state, id, payload).await?;
    Ok((StatusCode::CREATED, Json(submitted)))
}

async fn require_admin_key(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| AppError::Forbidden("Missing admin key".into()))?;

    match state.config().admin_key.as_deref() {
        Some(expected) if expected == provided => Ok(next.run(req).await),
        Some(_) => Err(AppError::Forbidden("Invalid admin key".into())),
        None => Err(AppError::Forbidden("Admin access is not configured".into())),
    }
}
