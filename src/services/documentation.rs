use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the trivia backend.
#[openapi(
    paths(
        crate::routes::health::health,
        crate::routes::games::create_game,
        crate::routes::games::list_games,
        crate::routes::games::random_game,
        crate::routes::games::get_game,
        crate::routes::games::update_game,
        crate::routes::games::delete_game,
        crate::routes::games::game_exists,
        crate::routes::games::submit_score,
        crate::routes::leaderboard::leaderboard,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::QuestionDto,
            crate::dto::game::QuizView,
            crate::dto::game::GameListItem,
            crate::dto::game::ExistsResponse,
            crate::dto::game::UpdateGameRequest,
            crate::dto::score::ScoreSubmission,
            crate::dto::score::ScoreSubmitted,
            crate::dto::score::LeaderboardEntry,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "games", description = "Quiz generation, revision and lookup"),
        (name = "scores", description = "Score submission and leaderboard"),
    )
)]
/// OpenAPI document of every route.
pub struct ApiDoc;
