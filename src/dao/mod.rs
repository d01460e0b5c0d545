/// Database model definitions.
pub mod models;
/// Quiz, player and score persistence.
pub mod quiz_store;
/// Storage abstraction layer for database operations.
pub mod storage;
