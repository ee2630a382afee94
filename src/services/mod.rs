/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Game recording, match saving and saved match listing.
pub mod match_service;
/// Upcoming events and member standings.
pub mod member_service;
/// Event session hydration and attendee resolution.
pub mod session_service;
/// Storage connection supervisor toggling degraded mode.
pub mod storage_supervisor;
/// Team balancing, manual overrides and configuration persistence.
pub mod team_service;
