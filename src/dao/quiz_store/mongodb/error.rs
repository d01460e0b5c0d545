use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

use crate::dao::storage::StorageError;

/// Result alias for MongoDB operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Failures raised by the MongoDB backend.
///
/// Every driver failure keeps the original error as its source; the variant names
/// the operation that failed.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection string could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Offending URI.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver refused the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The server never answered during startup.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings sent before giving up.
        attempts: u32,
        /// Error of the last ping.
        #[source]
        source: MongoError,
    },
    /// Health probe failure.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Index creation failed at startup.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Indexed field.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The counters collection could not be incremented.
    #[error("failed to allocate next id for `{counter}`")]
    NextId {
        /// Counter name, equal to the collection it numbers.
        counter: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// An upserted counter came back empty.
    #[error("counter `{counter}` returned no value")]
    MissingCounter {
        /// Counter name.
        counter: &'static str,
    },
    /// A unique index rejected the write.
    #[error("unique index `{index}` rejected the write")]
    DuplicateKey {
        /// Indexed field.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Quiz content could not be turned into BSON.
    #[error("failed to encode quiz `{id}`: {message}")]
    EncodeQuiz {
        /// Quiz id.
        id: i64,
        /// Encoder message.
        message: String,
    },
    /// Quiz insert failure.
    #[error("failed to insert quiz")]
    InsertQuiz {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Quiz lookup by id failure.
    #[error("failed to load quiz `{id}`")]
    LoadQuiz {
        /// Quiz id.
        id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Quiz lookup by hash failure.
    #[error("failed to load quiz by content hash")]
    LoadQuizByHash {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Quiz listing failure.
    #[error("failed to list quizzes")]
    ListQuizzes {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// `$sample` failure.
    #[error("failed to sample a quiz")]
    SampleQuiz {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Content replacement failure.
    #[error("failed to update quiz `{id}`")]
    UpdateQuiz {
        /// Quiz id.
        id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Quiz document removal failure.
    #[error("failed to delete quiz `{id}`")]
    DeleteQuiz {
        /// Quiz id.
        id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Score sweep failure. Deleting the quiz again retries the sweep.
    #[error("failed to delete scores of quiz `{game_id}`")]
    DeleteScores {
        /// Quiz id.
        game_id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Player lookup failure.
    #[error("failed to load player `{name}`")]
    LoadPlayer {
        /// Player name.
        name: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Player insert failure.
    #[error("failed to insert player `{name}`")]
    InsertPlayer {
        /// Player name.
        name: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Score insert failure.
    #[error("failed to insert score for quiz `{game_id}`")]
    InsertScore {
        /// Quiz id.
        game_id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The quiz a score points at is gone; the score was withdrawn.
    #[error("quiz `{game_id}` does not exist")]
    MissingQuiz {
        /// Quiz id.
        game_id: i64,
    },
    /// Leaderboard aggregation failure.
    #[error("failed to compute leaderboard")]
    Leaderboard {
        /// Driver error.
        #[source]
        source: MongoError,
    },
}

/// Whether a driver error is a unique index violation (E11000).
pub fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::DuplicateKey { index, .. } => StorageError::DuplicateKey { key: index },
            MongoDaoError::MissingQuiz { .. } => StorageError::MissingReference { key: "game_id" },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
