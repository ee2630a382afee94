use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::{
        validation::EventId,
        matches::MatchResultSummary,
        member::{EventSummary, MemberStanding, StandingsQuery},
        team::SessionSummary,
    },
    error::AppError,
    services::{match_service, member_service, team_service},
    state::SharedState,
};

/// Read-only endpoints open to every club member.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/events", get(list_events))
        .route("/events/{id}/session", get(event_session))
        .route("/members/standings", get(standings))
        .route("/matches", get(list_matches))
}

/// Upcoming events, soonest first.
#[utoipa::path(
    get,
    path = "/events",
    tag = "public",
    responses((status = 200, description = "Events dated today or later", body = [EventSummary]))
)]
pub async fn list_events(
    State(state): State<SharedState>,
) -> Result<Json<Vec<EventSummary>>, AppError> {
    Ok(Json(member_service::list_upcoming_events(&state).await?))
}

/// Teams, games and phase of an event.
#[utoipa::path(
    get,
    path = "/events/{id}/session",
    tag = "public",
    params(("id" = String, Path, description = "Event identifier")),
    responses(
        (status = 200, description = "Current event session", body = SessionSummary),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn event_session(
    State(state): State<SharedState>,
    Path(id): Path<EventId>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(team_service::session_snapshot(&state, id.as_str()).await?))
}

/// Member statistics table.
#[utoipa::path(
    get,
    path = "/members/standings",
    tag = "public",
    params(StandingsQuery),
    responses((status = 200, description = "Members with their records", body = [MemberStanding]))
)]
pub async fn standings(
    State(state): State<SharedState>,
    Query(query): Query<StandingsQuery>,
) -> Result<Json<Vec<MemberStanding>>, AppError> {
    Ok(Json(member_service::standings(&state, query).await?))
}

/// Saved matches, most recent first.
#[utoipa::path(
    get,
    path = "/matches",
    tag = "public",
    responses((status = 200, description = "Stored match results", body = [MatchResultSummary]))
)]
pub async fn list_matches(
    State(state): State<SharedState>,
) -> Result<Json<Vec<MatchResultSummary>>, AppError> {
    Ok(Json(match_service::list_match_results(&state).await?))
}
