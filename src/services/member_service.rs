//! Read-only listings backing the public routes.

use std::cmp::Ordering;

use time::{Date, OffsetDateTime, macros::format_description};
use tracing::warn;

use crate::{
    dao::models::EventEntity,
    dto::member::{EventSummary, MemberStanding, StandingsQuery, StandingsSort},
    error::ServiceError,
    state::SharedState,
};

/// Events dated today or later, soonest first.
pub async fn list_upcoming_events(state: &SharedState) -> Result<Vec<EventSummary>, ServiceError> {
    let store = state.require_club_store().await?;
    let events = store.list_events().await?;
    let today = OffsetDateTime::now_utc().date();
    Ok(upcoming(events, today))
}

fn upcoming(events: Vec<EventEntity>, today: Date) -> Vec<EventSummary> {
    let format = format_description!("[year]-[month]-[day]");
    let mut dated: Vec<(Date, EventEntity)> = events
        .into_iter()
        .filter_map(|event| match Date::parse(&event.date, format) {
            Ok(date) => Some((date, event)),
            Err(err) => {
                warn!(
                    event_id = %event.id,
                    date = %event.date,
                    error = %err,
                    "skipping event with invalid date"
                );
                None
            }
        })
        .filter(|(date, _)| *date >= today)
        .collect();
    dated.sort_by(|(a, _), (b, _)| a.cmp(b));
    dated
        .into_iter()
        .map(|(_, event)| EventSummary::from(event))
        .collect()
}

/// Every member with their accumulated statistics.
pub async fn standings(
    state: &SharedState,
    query: StandingsQuery,
) -> Result<Vec<MemberStanding>, ServiceError> {
    let store = state.require_club_store().await?;
    let aliases = &state.config().position_aliases;
    let mut rows: Vec<MemberStanding> = store
        .list_members()
        .await?
        .into_iter()
        .map(|member| {
            let position = aliases.resolve(&member.position);
            MemberStanding::new(member, position)
        })
        .collect();
    sort_standings(&mut rows, query.sort);
    Ok(rows)
}

/// Stable sort; ties keep alphabetical order by name.
fn sort_standings(rows: &mut [MemberStanding], sort: StandingsSort) {
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    match sort {
        StandingsSort::Name => {}
        StandingsSort::Wins => rows.sort_by(|a, b| b.wins.cmp(&a.wins)),
        StandingsSort::Losses => rows.sort_by(|a, b| b.losses.cmp(&a.losses)),
        StandingsSort::WinRate => rows.sort_by(|a, b| {
            b.win_rate
                .partial_cmp(&a.win_rate)
                .unwrap_or(Ordering::Equal)
        }),
    }
}
