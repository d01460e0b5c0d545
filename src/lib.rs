//! Library crate for trivia-back, exposing modules for binaries and integration tests.

pub mod config;
/// Persistence layer: entities, storage errors and the quiz store backends.
pub mod dao;
/// HTTP request and response bodies.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
pub mod provider;
pub mod quiz;
/// HTTP route trees.
pub mod routes;
/// Business logic invoked by the routes.
pub mod services;
/// Shared application state.
pub mod state;
