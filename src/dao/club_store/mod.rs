/// CouchDB backend.
#[cfg(feature = "couch-store")]
pub mod couchdb;
/// In-process backend for tests and local runs.
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::models::{
    AttendanceEntity, EventEntity, MatchResultEntity, MemberEntity, MemberStatsEntity,
    TeamConfigurationEntity,
};
use crate::dao::storage::StorageResult;

/// Abstraction over the club's document collections.
pub trait ClubStore: Send + Sync {
    /// Every member of the directory.
    fn list_members(&self) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>>;
    /// Every event, in storage order.
    fn list_events(&self) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>>;
    /// Event by identifier.
    fn find_event(&self, id: String) -> BoxFuture<'static, StorageResult<Option<EventEntity>>>;
    /// Attendance answers of one event.
    fn list_attendance(
        &self,
        event_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AttendanceEntity>>>;
    /// Saved team configuration of an event.
    fn find_team_configuration(
        &self,
        event_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamConfigurationEntity>>>;
    /// Insert or replace the configuration keyed by its `event_id`.
    fn save_team_configuration(
        &self,
        configuration: TeamConfigurationEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Saved match result of an event.
    fn find_match_result(
        &self,
        event_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<MatchResultEntity>>>;
    /// Store a match result. A second result for the same event is a duplicate.
    fn insert_match_result(&self, result: MatchResultEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Every saved match result.
    fn list_match_results(&self) -> BoxFuture<'static, StorageResult<Vec<MatchResultEntity>>>;
    /// Overwrite the statistics columns of one member, leaving the rest of the document alone.
    fn update_member_stats(&self, stats: MemberStatsEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Cheap round trip to the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
