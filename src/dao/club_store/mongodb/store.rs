use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Collection, Database, IndexModel,
    bson::doc,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        MongoEventDocument, MongoMatchResultDocument, MongoMemberDocument,
        MongoTeamConfigurationDocument, doc_id, stats_update,
    },
};
use crate::dao::{
    club_store::ClubStore,
    models::{
        AttendanceEntity, EventEntity, MatchResultEntity, MemberEntity, MemberStatsEntity,
        TeamConfigurationEntity,
    },
    storage::{StorageError, StorageResult},
};

const USERS: &str = "users";
const EVENTS: &str = "events";
const ATTENDANCE: &str = "attendance";
const TEAM_CONFIGURATIONS: &str = "teamConfigurations";
const MATCH_RESULTS: &str = "matchResults";

const DUPLICATE_KEY: i32 = 11000;

/// [`ClubStore`] backed by MongoDB collections.
#[derive(Clone)]
pub struct MongoClubStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    database: RwLock<Database>,
    config: MongoConfig,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = self.database.read().await.clone();
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (_client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        *self.database.write().await = database;
        Ok(())
    }
}

impl MongoClubStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (_client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let store = Self {
            inner: Arc::new(MongoInner {
                database: RwLock::new(database),
                config,
            }),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let attendance = self.collection::<AttendanceEntity>(ATTENDANCE).await;
        let index = IndexModel::builder()
            .keys(doc! {"event_id": 1, "member_name": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("attendance_event_idx".to_owned()))
                    .build(),
            )
            .build();

        attendance
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ATTENDANCE,
                index: "event_id,member_name",
                source,
            })?;

        let members = self.collection::<MongoMemberDocument>(USERS).await;
        let index = IndexModel::builder()
            .keys(doc! {"name": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("member_name_idx".to_owned()))
                    .build(),
            )
            .build();

        members
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: USERS,
                index: "name",
                source,
            })?;

        Ok(())
    }

    async fn collection<T>(&self, name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.inner.database.read().await.collection::<T>(name)
    }

    async fn find_all<T>(&self, name: &'static str) -> MongoResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned + Send + Sync + Unpin,
    {
        let query = |source| MongoDaoError::Query {
            collection: name,
            source,
        };
        self.collection::<T>(name)
            .await
            .find(doc! {})
            .await
            .map_err(query)?
            .try_collect()
            .await
            .map_err(query)
    }

    async fn list_members(&self) -> MongoResult<Vec<MemberEntity>> {
        let documents = self.find_all::<MongoMemberDocument>(USERS).await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn list_events(&self) -> MongoResult<Vec<EventEntity>> {
        let documents = self.find_all::<MongoEventDocument>(EVENTS).await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_event(&self, id: String) -> MongoResult<Option<EventEntity>> {
        let document = self
            .collection::<MongoEventDocument>(EVENTS)
            .await
            .find_one(doc_id(&id))
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: EVENTS,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn list_attendance(&self, event_id: String) -> MongoResult<Vec<AttendanceEntity>> {
        let query = |source| MongoDaoError::Query {
            collection: ATTENDANCE,
            source,
        };
        self.collection::<AttendanceEntity>(ATTENDANCE)
            .await
            .find(doc! {"event_id": event_id})
            .await
            .map_err(query)?
            .try_collect()
            .await
            .map_err(query)
    }

    async fn find_team_configuration(
        &self,
        event_id: String,
    ) -> MongoResult<Option<TeamConfigurationEntity>> {
        let document = self
            .collection::<MongoTeamConfigurationDocument>(TEAM_CONFIGURATIONS)
            .await
            .find_one(doc_id(&event_id))
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: TEAM_CONFIGURATIONS,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn save_team_configuration(&self, configuration: TeamConfigurationEntity) -> MongoResult<()> {
        let key = configuration.event_id.clone();
        let document: MongoTeamConfigurationDocument = configuration.into();
        self.collection::<MongoTeamConfigurationDocument>(TEAM_CONFIGURATIONS)
            .await
            .replace_one(doc_id(&key), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: TEAM_CONFIGURATIONS,
                key,
                source,
            })?;
        Ok(())
    }

    async fn find_match_result(&self, event_id: String) -> MongoResult<Option<MatchResultEntity>> {
        let document = self
            .collection::<MongoMatchResultDocument>(MATCH_RESULTS)
            .await
            .find_one(doc_id(&event_id))
            .await
            .map_err(|source| MongoDaoError::Query {
                collection: MATCH_RESULTS,
                source,
            })?;
        Ok(document.map(Into::into))
    }

    async fn insert_match_result(&self, result: MatchResultEntity) -> StorageResult<()> {
        let key = result.event_id.clone();
        let document: MongoMatchResultDocument = result.into();
        match self
            .collection::<MongoMatchResultDocument>(MATCH_RESULTS)
            .await
            .insert_one(&document)
            .await
        {
            Ok(_) => Ok(()),
            Err(source) if is_duplicate_key(&source) => {
                Err(StorageError::duplicate(MATCH_RESULTS, key))
            }
            Err(source) => Err(MongoDaoError::Write {
                collection: MATCH_RESULTS,
                key,
                source,
            }
            .into()),
        }
    }

    async fn list_match_results(&self) -> MongoResult<Vec<MatchResultEntity>> {
        let documents = self
            .find_all::<MongoMatchResultDocument>(MATCH_RESULTS)
            .await?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn update_member_stats(&self, stats: MemberStatsEntity) -> MongoResult<()> {
        let result = self
            .collection::<MongoMemberDocument>(USERS)
            .await
            .update_one(doc_id(&stats.member_id), stats_update(&stats))
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: USERS,
                key: stats.member_id.clone(),
                source,
            })?;
        if result.matched_count == 0 {
            return Err(MongoDaoError::UnknownMember {
                id: stats.member_id,
            });
        }
        Ok(())
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

impl ClubStore for MongoClubStore {
    fn list_members(&self) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_members().await.map_err(Into::into) })
    }

    fn list_events(&self) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_events().await.map_err(Into::into) })
    }

    fn find_event(&self, id: String) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_event(id).await.map_err(Into::into) })
    }

    fn list_attendance(
        &self,
        event_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AttendanceEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_attendance(event_id).await.map_err(Into::into) })
    }

    fn find_team_configuration(
        &self,
        event_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamConfigurationEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_team_configuration(event_id)
                .await
                .map_err(Into::into)
        })
    }

    fn save_team_configuration(
        &self,
        configuration: TeamConfigurationEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .save_team_configuration(configuration)
                .await
                .map_err(Into::into)
        })
    }

    fn find_match_result(
        &self,
        event_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<MatchResultEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_match_result(event_id).await.map_err(Into::into) })
    }

    fn insert_match_result(&self, result: MatchResultEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_match_result(result).await })
    }

    fn list_match_results(&self) -> BoxFuture<'static, StorageResult<Vec<MatchResultEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_match_results().await.map_err(Into::into) })
    }

    fn update_member_stats(&self, stats: MemberStatsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_member_stats(stats).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
