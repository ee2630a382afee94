/// Team assignment and manual overrides.
pub mod assignment;
/// Position-balanced team split.
pub mod balancer;
/// Positions, team labels and roster entries.
pub mod roster;
/// Game and series winners.
pub mod scoring;
/// Per-event session.
pub mod session;
/// Fisher-Yates shuffle.
pub mod shuffle;
/// Match lifecycle.
pub mod state_machine;
/// Member statistics.
pub mod stats;

use std::sync::Arc;

use dashmap::DashMap;
use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::{Mutex, RwLock, watch};

use crate::{
    config::AppConfig, dao::club_store::ClubStore, error::ServiceError,
    state::session::EventSession,
};

pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};

/// Shared handle to [`AppState`].
pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, configuration and per-event sessions.
pub struct AppState {
    club_store: RwLock<Option<Arc<dyn ClubStore>>>,
    degraded: watch::Sender<bool>,
    sessions: DashMap<String, Arc<Mutex<EventSession>>>,
    rng: Mutex<StdRng>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Same as [`AppState::new`] with a reproducible random source.
    pub fn with_seed(config: AppConfig, seed: u64) -> SharedState {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: AppConfig, rng: StdRng) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            club_store: RwLock::new(None),
            degraded: degraded_tx,
            sessions: DashMap::new(),
            rng: Mutex::new(rng),
            config,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current store, if one is installed.
    pub async fn club_store(&self) -> Option<Arc<dyn ClubStore>> {
        let guard = self.club_store.read().await;
        guard.as_ref().cloned()
    }

    /// Current store or [`ServiceError::Degraded`].
    pub async fn require_club_store(&self) -> Result<Arc<dyn ClubStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.club_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new store implementation and leave degraded mode.
    pub async fn set_club_store(&self, store: Arc<dyn ClubStore>) {
        {
            let mut guard = self.club_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update the degraded flag, notifying watchers only when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    /// Session of an event, created empty on first access.
    pub fn session(&self, event_id: &str) -> Arc<Mutex<EventSession>> {
        self.sessions
            .entry(event_id.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(EventSession::new(event_id))))
            .clone()
    }

    /// Session of an event if one was already created.
    pub fn existing_session(&self, event_id: &str) -> Option<Arc<Mutex<EventSession>>> {
        self.sessions.get(event_id).map(|entry| entry.value().clone())
    }

    /// Number of events with a session in memory.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Random source used for balancing and shuffles.
    pub fn rng(&self) -> &Mutex<StdRng> {
        &self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::club_store::memory::MemoryClubStore;

    #[tokio::test]
    async fn starts_degraded_until_store_installed() {
        let state = AppState::with_seed(AppConfig::default(), 1);
        assert!(state.is_degraded());
        assert!(matches!(
            state.require_club_store().await,
            Err(ServiceError::Degraded)
        ));

        let mut watcher = state.degraded_watcher();
        state.set_club_store(Arc::new(MemoryClubStore::new())).await;
        assert!(!state.is_degraded());
        assert!(watcher.has_changed().unwrap());
        assert!(!*watcher.borrow_and_update());
        assert!(state.require_club_store().await.is_ok());
    }

    #[test]
    fn sessions_are_shared_per_event() {
        let state = AppState::with_seed(AppConfig::default(), 1);
        let first = state.session("e1");
        let again = state.session("e1");
        let other = state.session("e2");
        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
    }
}
