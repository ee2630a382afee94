use indexmap::IndexMap;
use mongodb::bson::{DateTime, Document, doc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    dao::models::{
        EventEntity, GameResultEntity, MatchResultEntity, MemberEntity, MemberStatsEntity,
        RosterMemberEntity, TeamConfigurationEntity, TeamRosterEntity,
    },
    state::{
        roster::{TeamLabel, TeamMode},
        scoring::Outcome,
        stats::SeriesMark,
    },
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMemberDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    position: String,
    #[serde(default)]
    detail_position: String,
    #[serde(default)]
    wins: u32,
    #[serde(default)]
    losses: u32,
    #[serde(default)]
    winning_series: u32,
    #[serde(default)]
    recent_results: Vec<SeriesMark>,
}

impl From<MongoMemberDocument> for MemberEntity {
    fn from(value: MongoMemberDocument) -> Self {
        Self {
            id: value.id,
            name: value.name,
            position: value.position,
            detail_position: value.detail_position,
            wins: value.wins,
            losses: value.losses,
            winning_series: value.winning_series,
            recent_results: value.recent_results,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoEventDocument {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    date: String,
}

impl From<MongoEventDocument> for EventEntity {
    fn from(value: MongoEventDocument) -> Self {
        Self {
            id: value.id,
            title: value.title,
            date: value.date,
        }
    }
}

/// Team configuration keyed by its event so upserts replace in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTeamConfigurationDocument {
    #[serde(rename = "_id")]
    event_id: String,
    team_mode: TeamMode,
    teams: Vec<TeamRosterEntity>,
    #[serde(default)]
    excluded: Vec<RosterMemberEntity>,
    created_at: DateTime,
}

impl From<TeamConfigurationEntity> for MongoTeamConfigurationDocument {
    fn from(value: TeamConfigurationEntity) -> Self {
        Self {
            event_id: value.event_id,
            team_mode: value.team_mode,
            teams: value.teams,
            excluded: value.excluded,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoTeamConfigurationDocument> for TeamConfigurationEntity {
    fn from(value: MongoTeamConfigurationDocument) -> Self {
        Self {
            event_id: value.event_id,
            team_mode: value.team_mode,
            teams: value.teams,
            excluded: value.excluded,
            created_at: value.created_at.to_system_time(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MongoGameResult {
    game_number: u32,
    scores: IndexMap<TeamLabel, u32>,
    winner: Outcome,
}

/// Match result keyed by its event: a second insert for the same event is a duplicate key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchResultDocument {
    #[serde(rename = "_id")]
    event_id: String,
    result_id: Uuid,
    team_mode: TeamMode,
    teams: Vec<TeamRosterEntity>,
    game_results: Vec<MongoGameResult>,
    series_winner: Outcome,
    created_at: DateTime,
}

impl From<MatchResultEntity> for MongoMatchResultDocument {
    fn from(value: MatchResultEntity) -> Self {
        Self {
            event_id: value.event_id,
            result_id: value.id,
            team_mode: value.team_mode,
            teams: value.teams,
            game_results: value
                .game_results
                .into_iter()
                .map(|game| MongoGameResult {
                    game_number: game.game_number,
                    scores: game.scores,
                    winner: game.winner,
                })
                .collect(),
            series_winner: value.series_winner,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoMatchResultDocument> for MatchResultEntity {
    fn from(value: MongoMatchResultDocument) -> Self {
        Self {
            id: value.result_id,
            event_id: value.event_id,
            team_mode: value.team_mode,
            teams: value.teams,
            game_results: value
                .game_results
                .into_iter()
                .map(|game| GameResultEntity {
                    game_number: game.game_number,
                    scores: game.scores,
                    winner: game.winner,
                })
                .collect(),
            series_winner: value.series_winner,
            created_at: value.created_at.to_system_time(),
        }
    }
}

pub fn doc_id(id: &str) -> Document {
    doc! {"_id": id}
}

/// `$set` document touching only the statistics columns of a member.
pub fn stats_update(stats: &MemberStatsEntity) -> Document {
    let recent: Vec<&str> = stats.recent_results.iter().map(|mark| mark.as_str()).collect();
    doc! {
        "$set": {
            "wins": i64::from(stats.wins),
            "losses": i64::from(stats.losses),
            "winning_series": i64::from(stats.winning_series),
            "recent_results": recent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_update_sets_only_stat_fields() {
        let update = stats_update(&MemberStatsEntity {
            member_id: "m1".into(),
            wins: 3,
            losses: 2,
            winning_series: 1,
            recent_results: vec![SeriesMark::W, SeriesMark::L],
        });
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.get_i64("wins").unwrap(), 3);
        assert!(!set.contains_key("member_id"));
    }
}
