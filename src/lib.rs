//! Library crate for club-court-back, exposing modules for binaries and integration tests.

/// Runtime configuration.
pub mod config;
/// Storage layer.
pub mod dao;
/// HTTP payloads.
pub mod dto;
/// Service and HTTP errors.
pub mod error;
/// HTTP routes.
pub mod routes;
/// Application services.
pub mod services;
/// Core domain logic and shared state.
pub mod state;
