//! Process-local [`ClubStore`] used for local runs and tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use futures::future::BoxFuture;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::dao::{
    club_store::ClubStore,
    models::{
        AttendanceEntity, EventEntity, MatchResultEntity, MemberEntity, MemberStatsEntity,
        TeamConfigurationEntity,
    },
    storage::{StorageError, StorageResult},
};

/// Failures the in-memory store can be told to produce.
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    /// Simulated outage.
    #[error("in-memory store is offline")]
    Offline,
    /// Statistics writes for this member were told to fail.
    #[error("write rejected for member `{id}`")]
    RejectedWrite { id: String },
    /// No such member in the directory.
    #[error("member `{id}` does not exist")]
    UnknownMember { id: String },
}

impl From<MemoryStoreError> for StorageError {
    fn from(err: MemoryStoreError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}

#[derive(Default)]
struct Collections {
    members: IndexMap<String, MemberEntity>,
    events: IndexMap<String, EventEntity>,
    attendance: Vec<AttendanceEntity>,
    configurations: HashMap<String, TeamConfigurationEntity>,
    match_results: Vec<MatchResultEntity>,
}

/// [`ClubStore`] kept in process memory. Clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryClubStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    data: RwLock<Collections>,
    rejected_members: RwLock<HashSet<String>>,
    offline: AtomicBool,
}

impl MemoryClubStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a directory member.
    pub async fn insert_member(&self, member: MemberEntity) {
        let mut data = self.inner.data.write().await;
        data.members.insert(member.id.clone(), member);
    }

    /// Add or replace an event.
    pub async fn insert_event(&self, event: EventEntity) {
        let mut data = self.inner.data.write().await;
        data.events.insert(event.id.clone(), event);
    }

    /// Append an attendance answer.
    pub async fn insert_attendance(&self, attendance: AttendanceEntity) {
        self.inner.data.write().await.attendance.push(attendance);
    }

    /// Current copy of a member.
    pub async fn member(&self, id: &str) -> Option<MemberEntity> {
        self.inner.data.read().await.members.get(id).cloned()
    }

    /// Number of stored team configurations.
    pub async fn configuration_count(&self) -> usize {
        self.inner.data.read().await.configurations.len()
    }

    /// Make every statistics write for `id` fail until the store is rebuilt.
    pub async fn reject_member_writes(&self, id: impl Into<String>) {
        self.inner.rejected_members.write().await.insert(id.into());
    }

    /// Toggle a simulated outage affecting every call.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> Result<(), MemoryStoreError> {
        if self.inner.offline.load(Ordering::SeqCst) {
            Err(MemoryStoreError::Offline)
        } else {
            Ok(())
        }
    }

    async fn update_member_stats(&self, stats: MemberStatsEntity) -> Result<(), MemoryStoreError> {
        self.ensure_online()?;
        if self.inner.rejected_members.read().await.contains(&stats.member_id) {
            return Err(MemoryStoreError::RejectedWrite {
                id: stats.member_id,
            });
        }
        let mut data = self.inner.data.write().await;
        let member = data.members.get_mut(&stats.member_id).ok_or_else(|| {
            MemoryStoreError::UnknownMember {
                id: stats.member_id.clone(),
            }
        })?;
        member.wins = stats.wins;
        member.losses = stats.losses;
        member.winning_series = stats.winning_series;
        member.recent_results = stats.recent_results;
        Ok(())
    }
}

impl ClubStore for MemoryClubStore {
    fn list_members(&self) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            Ok(store.inner.data.read().await.members.values().cloned().collect())
        })
    }

    fn list_events(&self) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            Ok(store.inner.data.read().await.events.values().cloned().collect())
        })
    }

    fn find_event(&self, id: String) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            Ok(store.inner.data.read().await.events.get(&id).cloned())
        })
    }

    fn list_attendance(
        &self,
        event_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AttendanceEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let data = store.inner.data.read().await;
            Ok(data
                .attendance
                .iter()
                .filter(|entry| entry.event_id == event_id)
                .cloned()
                .collect())
        })
    }

    fn find_team_configuration(
        &self,
        event_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamConfigurationEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            Ok(store.inner.data.read().await.configurations.get(&event_id).cloned())
        })
    }

    fn save_team_configuration(
        &self,
        configuration: TeamConfigurationEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let mut data = store.inner.data.write().await;
            data.configurations
                .insert(configuration.event_id.clone(), configuration);
            Ok(())
        })
    }

    fn find_match_result(
        &self,
        event_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<MatchResultEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let data = store.inner.data.read().await;
            Ok(data
                .match_results
                .iter()
                .find(|result| result.event_id == event_id)
                .cloned())
        })
    }

    fn insert_match_result(&self, result: MatchResultEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            let mut data = store.inner.data.write().await;
            if data
                .match_results
                .iter()
                .any(|existing| existing.event_id == result.event_id)
            {
                return Err(StorageError::duplicate("matchResults", result.event_id));
            }
            data.match_results.push(result);
            Ok(())
        })
    }

    fn list_match_results(&self) -> BoxFuture<'static, StorageResult<Vec<MatchResultEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.ensure_online()?;
            Ok(store.inner.data.read().await.match_results.clone())
        })
    }

    fn update_member_stats(&self, stats: MemberStatsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_member_stats(stats).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_online().map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.health_check()
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use uuid::Uuid;

    use super::*;
    use crate::state::{roster::TeamMode, scoring::Outcome, stats::SeriesMark};

    fn member(id: &str) -> MemberEntity {
        MemberEntity {
            id: id.into(),
            name: id.into(),
            position: String::new(),
            detail_position: String::new(),
            wins: 1,
            losses: 0,
            winning_series: 0,
            recent_results: Vec::new(),
        }
    }

    fn match_result(event_id: &str) -> MatchResultEntity {
        MatchResultEntity {
            id: Uuid::new_v4(),
            event_id: event_id.into(),
            team_mode: TeamMode::Two,
            teams: Vec::new(),
            game_results: Vec::new(),
            series_winner: Outcome::NoGame,
            created_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn stats_update_only_touches_stat_columns() {
        let store = MemoryClubStore::new();
        let mut original = member("m1");
        original.position = "가드".into();
        store.insert_member(original).await;

        store
            .update_member_stats(MemberStatsEntity {
                member_id: "m1".into(),
                wins: 4,
                losses: 2,
                winning_series: 1,
                recent_results: vec![SeriesMark::W],
            })
            .await
            .unwrap();

        let updated = store.member("m1").await.unwrap();
        assert_eq!(updated.wins, 4);
        assert_eq!(updated.position, "가드");
    }

    #[tokio::test]
    async fn rejected_members_fail_writes() {
        let store = MemoryClubStore::new();
        store.insert_member(member("m1")).await;
        store.reject_member_writes("m1").await;

        let result = ClubStore::update_member_stats(
            &store,
            MemberStatsEntity {
                member_id: "m1".into(),
                wins: 9,
                losses: 0,
                winning_series: 0,
                recent_results: Vec::new(),
            },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(store.member("m1").await.unwrap().wins, 1);
    }

    #[tokio::test]
    async fn match_results_are_insert_only() {
        let store = MemoryClubStore::new();
        store.insert_match_result(match_result("e1")).await.unwrap();
        let err = store.insert_match_result(match_result("e1")).await.unwrap_err();
        assert!(matches!(err, StorageError::Duplicate { .. }));
        assert_eq!(store.list_match_results().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn offline_store_reports_unavailable() {
        let store = MemoryClubStore::new();
        store.set_offline(true);
        assert!(store.health_check().await.is_err());
        assert!(store.list_members().await.is_err());
        store.set_offline(false);
        assert!(store.health_check().await.is_ok());
    }
}
