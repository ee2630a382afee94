use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, post},
};
use axum_valid::Valid;

use crate::{
    dto::{
        validation::EventId,
        matches::{MatchSavedResponse, RecordGameRequest, SeriesSummary},
        team::{
            BalanceRequest, ExcludeMemberRequest, MoveMemberRequest, ReorderMemberRequest,
            RestoreMemberRequest, SessionSummary, ShuffleTeamRequest,
        },
    },
    error::AppError,
    services::{match_service, team_service},
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Admin-only endpoints that edit teams and record games.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/events/{id}/teams", post(save_configuration))
        .route("/events/{id}/teams/balance", post(balance_teams))
        .route("/events/{id}/teams/reset", post(reset_teams))
        .route("/events/{id}/teams/move", post(move_member))
        .route("/events/{id}/teams/exclude", post(exclude_member))
        .route("/events/{id}/teams/restore", post(restore_member))
        .route("/events/{id}/teams/reorder", post(reorder_member))
        .route("/events/{id}/teams/shuffle", post(shuffle_team))
        .route("/events/{id}/games", post(record_game))
        .route("/events/{id}/games/{number}", delete(remove_game))
        .route("/events/{id}/match/save", post(save_match))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Split the attendees of an event into balanced teams.
#[utoipa::path(
    post,
    path = "/events/{id}/teams/balance",
    tag = "admin",
    params(
        ("id" = String, Path, description = "Event identifier"),
        ("X-Admin-Token" = String, Header, description = "Configured admin token")
    ),
    request_body = BalanceRequest,
    responses(
        (status = 200, description = "Teams balanced", body = SessionSummary),
        (status = 400, description = "Invalid event identifier or team mode"),
        (status = 409, description = "Games already recorded or match saved")
    )
)]
pub async fn balance_teams(
    State(state): State<SharedState>,
    Path(id): Path<EventId>,
    Valid(Json(payload)): Valid<Json<BalanceRequest>>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(team_service::balance_event(&state, id.as_str(), payload).await?))
}

/// Clear the teams of an event.
#[utoipa::path(
    post,
    path = "/events/{id}/teams/reset",
    tag = "admin",
    params(
        ("id" = String, Path, description = "Event identifier"),
        ("X-Admin-Token" = String, Header, description = "Configured admin token")
    ),
    responses((status = 200, description = "Teams cleared", body = SessionSummary))
)]
pub async fn reset_teams(
    State(state): State<SharedState>,
    Path(id): Path<EventId>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(team_service::reset_teams(&state, id.as_str()).await?))
}

/// Persist the current teams as the event's configuration.
#[utoipa::path(
    post,
    path = "/events/{id}/teams",
    tag = "admin",
    params(
        ("id" = String, Path, description = "Event identifier"),
        ("X-Admin-Token" = String, Header, description = "Configured admin token")
    ),
    responses((status = 200, description = "Configuration stored", body = SessionSummary))
)]
pub async fn save_configuration(
    State(state): State<SharedState>,
    Path(id): Path<EventId>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(team_service::save_configuration(&state, id.as_str()).await?))
}

/// Move a member to another team.
#[utoipa::path(
    post,
    path = "/events/{id}/teams/move",
    tag = "admin",
    params(
        ("id" = String, Path, description = "Event identifier"),
        ("X-Admin-Token" = String, Header, description = "Configured admin token")
    ),
    request_body = MoveMemberRequest,
    responses(
        (status = 200, description = "Member moved", body = SessionSummary),
        (status = 404, description = "Member not in the source team")
    )
)]
pub async fn move_member(
    State(state): State<SharedState>,
    Path(id): Path<EventId>,
    Valid(Json(payload)): Valid<Json<MoveMemberRequest>>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(team_service::move_member(&state, id.as_str(), payload).await?))
}

/// Take a member out of the teams.
#[utoipa::path(
    post,
    path = "/events/{id}/teams/exclude",
    tag = "admin",
    params(
        ("id" = String, Path, description = "Event identifier"),
        ("X-Admin-Token" = String, Header, description = "Configured admin token")
    ),
    request_body = ExcludeMemberRequest,
    responses((status = 200, description = "Member excluded", body = SessionSummary))
)]
pub async fn exclude_member(
    State(state): State<SharedState>,
    Path(id): Path<EventId>,
    Valid(Json(payload)): Valid<Json<ExcludeMemberRequest>>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(team_service::exclude_member(&state, id.as_str(), payload).await?))
}

/// Bring an excluded member back into the smallest team.
#[utoipa::path(
    post,
    path = "/events/{id}/teams/restore",
    tag = "admin",
    params(
        ("id" = String, Path, description = "Event identifier"),
        ("X-Admin-Token" = String, Header, description = "Configured admin token")
    ),
    request_body = RestoreMemberRequest,
    responses((status = 200, description = "Member restored to the smallest team", body = SessionSummary))
)]
pub async fn restore_member(
    State(state): State<SharedState>,
    Path(id): Path<EventId>,
    Valid(Json(payload)): Valid<Json<RestoreMemberRequest>>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(team_service::restore_member(&state, id.as_str(), payload).await?))
}

/// Swap a member with its neighbour in the team order.
#[utoipa::path(
    post,
    path = "/events/{id}/teams/reorder",
    tag = "admin",
    params(
        ("id" = String, Path, description = "Event identifier"),
        ("X-Admin-Token" = String, Header, description = "Configured admin token")
    ),
    request_body = ReorderMemberRequest,
    responses((status = 200, description = "Member swapped with its neighbour", body = SessionSummary))
)]
pub async fn reorder_member(
    State(state): State<SharedState>,
    Path(id): Path<EventId>,
    Valid(Json(payload)): Valid<Json<ReorderMemberRequest>>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(team_service::reorder_member(&state, id.as_str(), payload).await?))
}

/// Shuffle the order of one team.
#[utoipa::path(
    post,
    path = "/events/{id}/teams/shuffle",
    tag = "admin",
    params(
        ("id" = String, Path, description = "Event identifier"),
        ("X-Admin-Token" = String, Header, description = "Configured admin token")
    ),
    request_body = ShuffleTeamRequest,
    responses((status = 200, description = "Team order shuffled", body = SessionSummary))
)]
pub async fn shuffle_team(
    State(state): State<SharedState>,
    Path(id): Path<EventId>,
    Valid(Json(payload)): Valid<Json<ShuffleTeamRequest>>,
) -> Result<Json<SessionSummary>, AppError> {
    Ok(Json(team_service::shuffle_team(&state, id.as_str(), payload).await?))
}

/// Record or replace one game of the series.
#[utoipa::path(
    post,
    path = "/events/{id}/games",
    tag = "admin",
    params(
        ("id" = String, Path, description = "Event identifier"),
        ("X-Admin-Token" = String, Header, description = "Configured admin token")
    ),
    request_body = RecordGameRequest,
    responses(
        (status = 200, description = "Game recorded", body = SeriesSummary),
        (status = 422, description = "Drawn game without a chosen winner")
    )
)]
pub async fn record_game(
    State(state): State<SharedState>,
    Path(id): Path<EventId>,
    Valid(Json(payload)): Valid<Json<RecordGameRequest>>,
) -> Result<Json<SeriesSummary>, AppError> {
    Ok(Json(match_service::record_game(&state, id.as_str(), payload).await?))
}

/// Delete a recorded game.
#[utoipa::path(
    delete,
    path = "/events/{id}/games/{number}",
    tag = "admin",
    params(
        ("id" = String, Path, description = "Event identifier"),
        ("number" = u32, Path, description = "Game number"),
        ("X-Admin-Token" = String, Header, description = "Configured admin token")
    ),
    responses((status = 200, description = "Game removed", body = SeriesSummary))
)]
pub async fn remove_game(
    State(state): State<SharedState>,
    Path((id, number)): Path<(EventId, u32)>,
) -> Result<Json<SeriesSummary>, AppError> {
    Ok(Json(match_service::remove_game(&state, id.as_str(), number).await?))
}

/// Store the decided match and update member statistics.
#[utoipa::path(
    post,
    path = "/events/{id}/match/save",
    tag = "admin",
    params(
        ("id" = String, Path, description = "Event identifier"),
        ("X-Admin-Token" = String, Header, description = "Configured admin token")
    ),
    responses(
        (status = 200, description = "Match stored", body = MatchSavedResponse),
        (status = 409, description = "Series undecided or already saved"),
        (status = 500, description = "Match stored but some statistics were not written")
    )
)]
pub async fn save_match(
    State(state): State<SharedState>,
    Path(id): Path<EventId>,
) -> Result<Json<MatchSavedResponse>, AppError> {
    Ok(Json(match_service::save_match_result(&state, id.as_str()).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    match state.config().admin_token.as_deref() {
        Some(token) if token == provided.as_str() => Ok(next.run(req).await),
        Some(_) => Err(AppError::Unauthorized("invalid admin token".into())),
        None => Err(AppError::Unauthorized(
            "admin token not configured on the server".into(),
        )),
    }
}
