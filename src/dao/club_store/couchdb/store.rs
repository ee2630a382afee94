use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;

use crate::dao::{
    club_store::ClubStore,
    models::{
        AttendanceEntity, EventEntity, MatchResultEntity, MemberEntity, MemberStatsEntity,
        TeamConfigurationEntity,
    },
    storage::{StorageError, StorageResult},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CouchDocument, END_SUFFIX, EVENT_PREFIX, MATCH_RESULT_PREFIX,
        MEMBER_PREFIX, attendance_event_prefix, event_doc_id, match_result_doc_id, member_doc_id,
        team_configuration_doc_id,
    },
};

/// [`ClubStore`] backed by a CouchDB database over HTTP.
#[derive(Clone)]
pub struct CouchClubStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchClubStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        self.with_auth(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = format!("{}/{}", self.base_url, self.database);

        let response = self
            .with_auth(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .with_auth(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<CouchDocument<T>>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<CouchDocument<T>>()
                .await
                .map(Some)
                .map_err(|source| CouchDaoError::DecodeResponse {
                    path: doc_id.to_string(),
                    source,
                }),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, document: &CouchDocument<T>) -> CouchResult<()>
    where
        T: Serialize,
    {
        let response = self
            .request(Method::PUT, &document.id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: document.id.clone(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(CouchDaoError::Conflict {
                path: document.id.clone(),
            }),
            status => Err(CouchDaoError::RequestStatus {
                path: document.id.clone(),
                status,
            }),
        }
    }

    /// PUT carrying over the current revision, so the write replaces any existing document.
    async fn upsert_document<T>(&self, mut document: CouchDocument<T>) -> CouchResult<()>
    where
        T: Serialize,
    {
        if let Some(existing) = self.get_document::<serde_json::Value>(&document.id).await? {
            document.rev = existing.rev;
        }
        self.put_document(&document).await
    }

    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{}\"", prefix)),
            ("endkey", format!("\"{}{}\"", prefix, END_SUFFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let mut documents = Vec::new();
        for row in payload.rows {
            if let Some(doc) = row.doc {
                let parsed: CouchDocument<T> =
                    from_value(doc).map_err(|source| CouchDaoError::DeserializeValue {
                        path: row.id,
                        source,
                    })?;
                documents.push(parsed.body);
            }
        }

        Ok(documents)
    }

    async fn update_member_stats(&self, stats: MemberStatsEntity) -> CouchResult<()> {
        let doc_id = member_doc_id(&stats.member_id);
        let mut document = self
            .get_document::<MemberEntity>(&doc_id)
            .await?
            .ok_or_else(|| CouchDaoError::UnknownMember {
                path: doc_id.clone(),
            })?;
        let member = &mut document.body;
        member.wins = stats.wins;
        member.losses = stats.losses;
        member.winning_series = stats.winning_series;
        member.recent_results = stats.recent_results;
        self.put_document(&document).await
    }

    async fn insert_match_result(&self, result: MatchResultEntity) -> StorageResult<()> {
        let key = result.event_id.clone();
        let document = CouchDocument::new(match_result_doc_id(&key), result);
        match self.put_document(&document).await {
            Ok(()) => Ok(()),
            Err(CouchDaoError::Conflict { .. }) => {
                Err(StorageError::duplicate("matchResults", key))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl ClubStore for CouchClubStore {
    fn list_members(&self) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_documents::<MemberEntity>(MEMBER_PREFIX)
                .await
                .map_err(Into::into)
        })
    }

    fn list_events(&self) -> BoxFuture<'static, StorageResult<Vec<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_documents::<EventEntity>(EVENT_PREFIX)
                .await
                .map_err(Into::into)
        })
    }

    fn find_event(&self, id: String) -> BoxFuture<'static, StorageResult<Option<EventEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc = store
                .get_document::<EventEntity>(&event_doc_id(&id))
                .await?;
            Ok(maybe_doc.map(|doc| doc.body))
        })
    }

    fn list_attendance(
        &self,
        event_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<AttendanceEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_documents::<AttendanceEntity>(&attendance_event_prefix(&event_id))
                .await
                .map_err(Into::into)
        })
    }

    fn find_team_configuration(
        &self,
        event_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<TeamConfigurationEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc = store
                .get_document::<TeamConfigurationEntity>(&team_configuration_doc_id(&event_id))
                .await?;
            Ok(maybe_doc.map(|doc| doc.body))
        })
    }

    fn save_team_configuration(
        &self,
        configuration: TeamConfigurationEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = team_configuration_doc_id(&configuration.event_id);
            store
                .upsert_document(CouchDocument::new(doc_id, configuration))
                .await
                .map_err(Into::into)
        })
    }

    fn find_match_result(
        &self,
        event_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<MatchResultEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let maybe_doc = store
                .get_document::<MatchResultEntity>(&match_result_doc_id(&event_id))
                .await?;
            Ok(maybe_doc.map(|doc| doc.body))
        })
    }

    fn insert_match_result(&self, result: MatchResultEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_match_result(result).await })
    }

    fn list_match_results(&self) -> BoxFuture<'static, StorageResult<Vec<MatchResultEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_documents::<MatchResultEntity>(MATCH_RESULT_PREFIX)
                .await
                .map_err(Into::into)
        })
    }

    fn update_member_stats(&self, stats: MemberStatsEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.update_member_stats(stats).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = format!("{}/{}", store.base_url, store.database);
            let response = store
                .with_auth(store.client.get(&url))
                .send()
                .await
                .map_err(|source| CouchDaoError::RequestSend {
                    path: url.clone(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url,
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
