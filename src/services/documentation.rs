use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Club Court Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::public::list_events,
        crate::routes::public::event_session,
        crate::routes::public::standings,
        crate::routes::public::list_matches,
        crate::routes::admin::balance_teams,
        crate::routes::admin::reset_teams,
        crate::routes::admin::save_configuration,
        crate::routes::admin::move_member,
        crate::routes::admin::exclude_member,
        crate::routes::admin::restore_member,
        crate::routes::admin::reorder_member,
        crate::routes::admin::shuffle_team,
        crate::routes::admin::record_game,
        crate::routes::admin::remove_game,
        crate::routes::admin::save_match,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::VisibleMatchPhase,
            crate::dto::phase::PhaseSummary,
            crate::dto::team::BalanceRequest,
            crate::dto::team::MoveMemberRequest,
            crate::dto::team::ExcludeMemberRequest,
            crate::dto::team::RestoreMemberRequest,
            crate::dto::team::ReorderMemberRequest,
            crate::dto::team::ShuffleTeamRequest,
            crate::dto::team::RosterMemberSummary,
            crate::dto::team::TeamSummary,
            crate::dto::team::AssignmentSummary,
            crate::dto::team::SessionSummary,
            crate::dto::matches::RecordGameRequest,
            crate::dto::matches::GameResultSummary,
            crate::dto::matches::SeriesSummary,
            crate::dto::matches::MatchSavedResponse,
            crate::dto::matches::SavedTeamSummary,
            crate::dto::matches::MatchResultSummary,
            crate::dto::member::EventSummary,
            crate::dto::member::StandingsSort,
            crate::dto::member::MemberStanding,
            crate::state::roster::Position,
            crate::state::roster::TeamLabel,
            crate::state::roster::PositionCounts,
            crate::state::assignment::Direction,
            crate::state::stats::SeriesMark,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "public", description = "Events, standings and saved matches"),
        (name = "admin", description = "Team balancing, overrides and game recording (X-Admin-Token)"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_admin_and_public_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/events/{id}/teams/balance"));
        assert!(doc.paths.paths.contains_key("/members/standings"));
        assert!(doc.paths.paths.contains_key("/events/{id}/games/{number}"));
    }
}
