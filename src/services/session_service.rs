//! Loading and locking of per-event sessions.
//!
//! A session is filled from storage the first time an event is touched and then lives in
//! memory for the rest of the process. Every caller holds the session's lock for the whole
//! operation, so edits to one event are applied one at a time.

use tokio::sync::OwnedMutexGuard;
use tracing::debug;

use crate::{
    config::PositionAliases,
    dao::models::{AttendanceStatus, MemberEntity, assignment_from_rosters},
    error::ServiceError,
    state::{
        SharedState,
        roster::{Position, RosterEntry},
        scoring::GameResult,
        session::EventSession,
        state_machine::MatchPhase,
    },
};

/// Lock the session of `event_id`, hydrating it from storage on first use.
///
/// A session is only created once the store confirms the event exists, so lookups of
/// unknown ids never leave entries behind.
pub async fn open_session(
    state: &SharedState,
    event_id: &str,
) -> Result<OwnedMutexGuard<EventSession>, ServiceError> {
    let handle = match state.existing_session(event_id) {
        Some(handle) => handle,
        None => {
            let store = state.require_club_store().await?;
            if store.find_event(event_id.to_owned()).await?.is_none() {
                return Err(ServiceError::NotFound(format!("event `{event_id}` not found")));
            }
            state.session(event_id)
        }
    };

    let mut session = handle.lock_owned().await;
    if session.is_hydrated() {
        return Ok(session);
    }

    let store = state.require_club_store().await?;
    if let Some(result) = store.find_match_result(event_id.to_owned()).await? {
        let assignment = assignment_from_rosters(result.team_mode, result.teams, Vec::new());
        let games = result
            .game_results
            .into_iter()
            .map(GameResult::from)
            .collect();
        session.hydrate(MatchPhase::Saved, Some(assignment), games);
    } else if let Some(configuration) = store.find_team_configuration(event_id.to_owned()).await?
    {
        let assignment = assignment_from_rosters(
            configuration.team_mode,
            configuration.teams,
            configuration.excluded,
        );
        session.hydrate(MatchPhase::TeamsAssigned, Some(assignment), Vec::new());
    } else {
        session.hydrate(MatchPhase::NoTeams, None, Vec::new());
    }

    debug!(event_id, phase = ?session.phase(), "hydrated event session");
    Ok(session)
}

/// Roster entry of a directory member.
pub fn roster_entry(member: &MemberEntity, aliases: &PositionAliases) -> RosterEntry {
    RosterEntry {
        identity: member.id.clone(),
        name: member.name.clone(),
        position: aliases.resolve(&member.position),
        detail_position: member.detail_position.clone(),
    }
}

/// Attendees of an event resolved against the member directory.
///
/// Attendance refers to members by display name. A name with no directory entry still
/// plays, with its name as identity and no position.
pub async fn attendees(
    state: &SharedState,
    event_id: &str,
) -> Result<Vec<RosterEntry>, ServiceError> {
    let store = state.require_club_store().await?;
    let members = store.list_members().await?;
    let attendance = store.list_attendance(event_id.to_owned()).await?;
    let aliases = &state.config().position_aliases;

    let mut roster: Vec<RosterEntry> = Vec::new();
    for entry in attendance
        .into_iter()
        .filter(|entry| entry.status == AttendanceStatus::Attending)
    {
        if roster.iter().any(|known| known.name == entry.member_name) {
            continue;
        }
        let resolved = match members.iter().find(|m| m.name == entry.member_name) {
            Some(member) => roster_entry(member, aliases),
            None => {
                debug!(
                    event_id,
                    member = %entry.member_name,
                    "attendee missing from member directory"
                );
                RosterEntry::new(
                    entry.member_name.clone(),
                    entry.member_name,
                    Position::Unknown,
                )
            }
        };
        roster.push(resolved);
    }

    Ok(roster)
}
