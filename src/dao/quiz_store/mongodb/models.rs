//! BSON documents of the `games`, `players`, `scores` and `counters` collections.

use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};

use crate::dao::models::{
    LeaderboardRowEntity, PlayerEntity, QuestionEntity, QuizContentEntity, QuizEntity,
    QuizListItemEntity, ScoreEntity,
};

/// Quiz as stored in `games`; `content_hash` carries the unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoQuizDocument {
    #[serde(rename = "_id")]
    pub id: i64,
    pub questions: Vec<QuestionEntity>,
    pub bonus_question: Option<QuestionEntity>,
    pub content_hash: String,
    pub created_at: DateTime,
}

/// Fields replaced together by the update flow.
#[derive(Debug, Clone, Serialize)]
pub struct MongoQuizContent<'a> {
    pub questions: &'a [QuestionEntity],
    pub bonus_question: Option<&'a QuestionEntity>,
    pub content_hash: &'a str,
}

/// Projection used by the quiz listing.
#[derive(Debug, Clone, Deserialize)]
pub struct MongoQuizListDocument {
    #[serde(rename = "_id")]
    pub id: i64,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoPlayerDocument {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    #[serde(rename = "_id")]
    pub id: i64,
    pub player_id: i64,
    pub game_id: i64,
    pub score: i64,
    pub played_at: DateTime,
}

/// Id sequence, one document per collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCounterDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub seq: i64,
}

/// Output row of [`leaderboard_pipeline`].
#[derive(Debug, Clone, Deserialize)]
pub struct MongoLeaderboardRow {
    pub player_id: i64,
    pub player: String,
    pub best: i64,
    pub game_id: i64,
    pub played_at: DateTime,
}

impl From<MongoQuizDocument> for QuizEntity {
    fn from(value: MongoQuizDocument) -> Self {
        Self {
            id: value.id,
            content: QuizContentEntity {
                questions: value.questions,
                bonus_question: value.bonus_question,
                content_hash: value.content_hash,
            },
            created_at: value.created_at.to_system_time(),
        }
    }
}

impl From<QuizEntity> for MongoQuizDocument {
    fn from(value: QuizEntity) -> Self {
        Self {
            id: value.id,
            questions: value.content.questions,
            bonus_question: value.content.bonus_question,
            content_hash: value.content.content_hash,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl<'a> From<&'a QuizContentEntity> for MongoQuizContent<'a> {
    fn from(value: &'a QuizContentEntity) -> Self {
        Self {
            questions: &value.questions,
            bonus_question: value.bonus_question.as_ref(),
            content_hash: &value.content_hash,
        }
    }
}

impl From<MongoQuizListDocument> for QuizListItemEntity {
    fn from(value: MongoQuizListDocument) -> Self {
        Self {
            id: value.id,
            created_at: value.created_at.to_system_time(),
        }
    }
}

impl From<MongoPlayerDocument> for PlayerEntity {
    fn from(value: MongoPlayerDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
        }
    }
}

impl From<ScoreEntity> for MongoScoreDocument {
    fn from(value: ScoreEntity) -> Self {
        Self {
            id: value.id,
            player_id: value.player_id,
            game_id: value.game_id,
            score: value.value,
            played_at: DateTime::from_system_time(value.played_at),
        }
    }
}

impl From<MongoLeaderboardRow> for LeaderboardRowEntity {
    fn from(value: MongoLeaderboardRow) -> Self {
        Self {
            player_id: value.player_id,
            player: value.player,
            best: value.best,
            game_id: value.game_id,
            played_at: value.played_at.to_system_time(),
        }
    }
}

/// Filter on the integer `_id`.
pub fn doc_id(id: i64) -> Document {
    doc! {"_id": id}
}

/// Best score per player: earliest row among equal values, ties across players
/// broken by player id.
pub fn leaderboard_pipeline(limit: i64, players_collection: &str) -> Vec<Document> {
    vec![
        doc! {"$sort": {"score": -1, "played_at": 1, "_id": 1}},
        doc! {"$group": {
            "_id": "$player_id",
            "best": {"$first": "$score"},
            "game_id": {"$first": "$game_id"},
            "played_at": {"$first": "$played_at"},
        }},
        doc! {"$sort": {"best": -1, "_id": 1}},
        doc! {"$limit": limit},
        doc! {"$lookup": {
            "from": players_collection,
            "localField": "_id",
            "foreignField": "_id",
            "as": "player",
        }},
        doc! {"$unwind": "$player"},
        doc! {"$project": {
            "_id": 0,
            "player_id": "$_id",
            "player": "$player.name",
            "best": 1,
            "game_id": 1,
            "played_at": 1,
        }},
    ]
}
