use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    config::MAX_LEADERBOARD_LIMIT,
    dao::models::LeaderboardRowEntity,
    dto::{format_system_time, validation::validate_not_blank},
};

/// Score reported at the end of a game.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ScoreSubmission {
    /// Case-sensitive player name; the player is created on first use.
    #[validate(length(min = 1, max = 64), custom(function = "validate_not_blank"))]
    pub player_name: String,
    /// Points scored; any integer is accepted.
    pub score: i64,
}

/// Acknowledgement of a recorded score.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScoreSubmitted {
    /// Fixed confirmation text.
    pub message: String,
    /// Identifier of the stored score.
    pub score_id: i64,
}

impl ScoreSubmitted {
    /// Acknowledge the score stored under `score_id`.
    pub fn new(score_id: i64) -> Self {
        Self {
            message: "Score submitted successfully".into(),
            score_id,
        }
    }
}

/// Best score of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LeaderboardEntry {
    /// Player name.
    pub player: String,
    /// Highest score of the player.
    pub best: i64,
    /// Quiz on which the best score was obtained.
    pub game_id: i64,
    /// RFC 3339 timestamp of the best score.
    pub played_at: String,
}

/// Query string of the leaderboard endpoint.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Maximum number of rows (1 to 100).
    #[validate(range(min = 1, max = MAX_LEADERBOARD_LIMIT))]
    pub limit: Option<usize>,
}

impl From<LeaderboardRowEntity> for LeaderboardEntry {
    fn from(value: LeaderboardRowEntity) -> Self {
        Self {
            player: value.player,
            best: value.best,
            game_id: value.game_id,
            played_at: format_system_time(value.played_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_rejects_long_or_blank_names() {
        let long = ScoreSubmission {
            player_name: "p".repeat(65),
            score: 10,
        };
        let blank = ScoreSubmission {
            player_name: "  ".into(),
            score: 10,
        };
        let ok = ScoreSubmission {
            player_name: "Alice".into(),
            score: -5,
        };

        assert!(long.validate().is_err());
        assert!(blank.validate().is_err());
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn limit_must_be_in_range() {
        assert!(LeaderboardQuery { limit: Some(0) }.validate().is_err());
        assert!(LeaderboardQuery { limit: Some(101) }.validate().is_err());
        assert!(LeaderboardQuery { limit: Some(100) }.validate().is_ok());
        assert!(LeaderboardQuery { limit: None }.validate().is_ok());
    }
}
