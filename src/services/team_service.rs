//! Business logic behind the team routes: balancing, manual overrides and persisting the
//! configuration. Every operation locks the event session, plans its transition and only
//! commits the edited assignment once the transition is applied.

use std::time::SystemTime;

use rand::{SeedableRng, rngs::StdRng};
use tracing::{debug, info};

use crate::{
    dao::models::{RosterMemberEntity, TeamConfigurationEntity, team_rosters},
    dto::team::{
        BalanceRequest, ExcludeMemberRequest, MoveMemberRequest, ReorderMemberRequest,
        RestoreMemberRequest, SessionSummary, ShuffleTeamRequest,
    },
    error::ServiceError,
    services::session_service::{attendees, open_session},
    state::{
        SharedState, assignment::TeamAssignment, balancer::balance, roster::TeamMode,
        session::EventSession,
        state_machine::{MatchEvent, MatchPhase},
    },
};

// ---------------------------------------------------------------------------
// Read-only projections
// ---------------------------------------------------------------------------

/// Current teams, games and phase of an event.
pub async fn session_snapshot(
    state: &SharedState,
    event_id: &str,
) -> Result<SessionSummary, ServiceError> {
    let session = open_session(state, event_id).await?;
    Ok(SessionSummary::from(&*session))
}

// ---------------------------------------------------------------------------
// Balancing
// ---------------------------------------------------------------------------

/// Split the attending members into fresh teams, replacing any previous split.
pub async fn balance_event(
    state: &SharedState,
    event_id: &str,
    request: BalanceRequest,
) -> Result<SessionSummary, ServiceError> {
    let mode = match request.team_mode {
        Some(value) => TeamMode::try_from(value)?,
        None => state.config().default_team_mode,
    };

    let mut session = open_session(state, event_id).await?;
    let roster = attendees(state, event_id).await?;

    let assignment = {
        let mut rng = state.rng().lock().await;
        balance(&roster, mode, &mut *rng)
    };

    session
        .run_transition(MatchEvent::TeamsBalanced, || async { Ok(()) })
        .await?;
    info!(
        event_id,
        teams = mode.count(),
        attendees = roster.len(),
        sizes = ?assignment.sizes(),
        "teams balanced"
    );
    session.set_assignment(Some(assignment));

    Ok(SessionSummary::from(&*session))
}

/// Drop the current split so the event can be balanced again from scratch.
pub async fn reset_teams(
    state: &SharedState,
    event_id: &str,
) -> Result<SessionSummary, ServiceError> {
    let mut session = open_session(state, event_id).await?;
    session
        .run_transition(MatchEvent::TeamsReset, || async { Ok(()) })
        .await?;
    session.set_assignment(None);
    debug!(event_id, "teams reset");
    Ok(SessionSummary::from(&*session))
}

// ---------------------------------------------------------------------------
// Manual overrides
// ---------------------------------------------------------------------------

/// Apply `edit` to a copy of the assignment and commit it once the transition succeeds.
async fn edit_assignment<F>(
    state: &SharedState,
    event_id: &str,
    edit: F,
) -> Result<SessionSummary, ServiceError>
where
    F: FnOnce(&mut TeamAssignment) -> Result<(), ServiceError>,
{
    let mut session = open_session(state, event_id).await?;
    let mut candidate = editable_assignment(&session)?;
    edit(&mut candidate)?;

    session
        .run_transition(MatchEvent::TeamsEdited, || async { Ok(()) })
        .await?;
    session.set_assignment(Some(candidate));

    Ok(SessionSummary::from(&*session))
}

/// Overrides are only accepted until the first game is recorded.
fn editable_assignment(session: &EventSession) -> Result<TeamAssignment, ServiceError> {
    let phase = session.phase();
    if phase != MatchPhase::TeamsAssigned {
        return Err(ServiceError::InvalidState(format!(
            "teams of event `{}` cannot be edited in phase {phase:?}",
            session.event_id()
        )));
    }
    session.require_assignment().cloned()
}

/// Move a member between teams.
pub async fn move_member(
    state: &SharedState,
    event_id: &str,
    request: MoveMemberRequest,
) -> Result<SessionSummary, ServiceError> {
    edit_assignment(state, event_id, |assignment| {
        assignment.move_member(&request.member_id, request.from, request.to)?;
        Ok(())
    })
    .await
}

/// Exclude a member from the teams.
pub async fn exclude_member(
    state: &SharedState,
    event_id: &str,
    request: ExcludeMemberRequest,
) -> Result<SessionSummary, ServiceError> {
    edit_assignment(state, event_id, |assignment| {
        assignment.exclude(&request.member_id, request.from)?;
        Ok(())
    })
    .await
}

/// Restore an excluded member into the smallest team.
pub async fn restore_member(
    state: &SharedState,
    event_id: &str,
    request: RestoreMemberRequest,
) -> Result<SessionSummary, ServiceError> {
    edit_assignment(state, event_id, |assignment| {
        let label = assignment.restore(&request.member_id)?;
        debug!(event_id, member_id = %request.member_id, team = %label, "member restored");
        Ok(())
    })
    .await
}

/// Swap a member with its neighbour.
pub async fn reorder_member(
    state: &SharedState,
    event_id: &str,
    request: ReorderMemberRequest,
) -> Result<SessionSummary, ServiceError> {
    edit_assignment(state, event_id, |assignment| {
        assignment.reorder(request.team, request.index, request.direction)?;
        Ok(())
    })
    .await
}

/// Shuffle the order of one team.
pub async fn shuffle_team(
    state: &SharedState,
    event_id: &str,
    request: ShuffleTeamRequest,
) -> Result<SessionSummary, ServiceError> {
    let mut rng = {
        let mut shared = state.rng().lock().await;
        StdRng::from_rng(&mut *shared)
    };
    edit_assignment(state, event_id, |assignment| {
        assignment.shuffle_team(request.team, &mut rng)?;
        Ok(())
    })
    .await
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Upsert the current split into the team configuration collection.
pub async fn save_configuration(
    state: &SharedState,
    event_id: &str,
) -> Result<SessionSummary, ServiceError> {
    let mut session = open_session(state, event_id).await?;
    let assignment = session.require_assignment()?;

    let configuration = TeamConfigurationEntity {
        event_id: event_id.to_owned(),
        team_mode: assignment.mode(),
        teams: team_rosters(assignment),
        excluded: assignment
            .excluded()
            .iter()
            .map(RosterMemberEntity::from)
            .collect(),
        created_at: SystemTime::now(),
    };

    let store = state.require_club_store().await?;
    session
        .run_transition(MatchEvent::ConfigurationSaved, move || async move {
            store.save_team_configuration(configuration).await?;
            Ok(())
        })
        .await?;
    info!(event_id, "team configuration saved");

    Ok(SessionSummary::from(&*session))
}
