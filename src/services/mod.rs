/// OpenAPI documentation generation.
pub mod documentation;
/// Quiz creation, revision and lookup.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Score submission and leaderboard.
pub mod score_service;
