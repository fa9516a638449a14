use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::models::{Contact, Faq, Feedback, Partner, Resource, Service, TeamMember};

use super::dataset::{CachedDataset, Collections, PersistedRecord, SNAPSHOT_VERSION};
use super::error::CacheError;
use super::source::ResourceSource;
use super::store::SnapshotStore;

/// Consider the site data stale after 12 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(12 * 60 * 60);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Refetch even when the cache is fresh.
    pub force: bool,
}

impl FetchOptions {
    pub fn forced() -> Self {
        Self { force: true }
    }
}

/// What a `fetch_all` call did.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Cache was fresh; no requests were made.
    Fresh,
    /// All six collections were replaced.
    Refreshed { fetched_at: DateTime<Utc> },
    /// The batch failed; stored collections are unchanged.
    Failed { error: String },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, FetchOutcome::Failed { .. })
    }
}

#[derive(Default)]
struct RefreshSlot {
    last: Option<FetchOutcome>,
}

/// Reads just the version so unknown schemas are rejected before parsing the state.
#[derive(Deserialize)]
struct VersionProbe {
    #[serde(default)]
    version: u32,
}

/// Fetch-once cache of the six site collections.
///
/// State lives in a watch channel: reads borrow the current dataset, a
/// successful refresh replaces it in one step, and subscribers are notified on
/// every change. Refreshes are serialized; a caller that arrives while one is
/// running gets that refresh's outcome.
pub struct AppDataCache {
    source: Arc<dyn ResourceSource>,
    store: Arc<dyn SnapshotStore>,
    ttl: Duration,
    state: watch::Sender<CachedDataset>,
    refresh: Mutex<RefreshSlot>,
    completed: AtomicU64,
}

impl AppDataCache {
    /// Create the cache, restoring the last persisted snapshot if there is one.
    pub fn open(source: Arc<dyn ResourceSource>, store: Arc<dyn SnapshotStore>) -> Self {
        let initial = Self::hydrate(store.as_ref());
        debug!(
            loaded = initial.loaded,
            fetched_at = ?initial.fetched_at,
            "Data cache opened"
        );
        let (state, _) = watch::channel(initial);
        Self {
            source,
            store,
            ttl: DEFAULT_TTL,
            state,
            refresh: Mutex::new(RefreshSlot::default()),
            completed: AtomicU64::new(0),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn hydrate(store: &dyn SnapshotStore) -> CachedDataset {
        let contents = match store.read() {
            Ok(Some(contents)) => contents,
            Ok(None) => return CachedDataset::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read cached snapshot, starting empty");
                return CachedDataset::default();
            }
        };

        match serde_json::from_str::<VersionProbe>(&contents) {
            Ok(probe) if probe.version == SNAPSHOT_VERSION => {}
            Ok(probe) => {
                warn!(
                    found = probe.version,
                    expected = SNAPSHOT_VERSION,
                    "Discarding cached snapshot with unsupported version"
                );
                return CachedDataset::default();
            }
            Err(e) => {
                warn!(error = %e, "Cached snapshot is not valid JSON, starting empty");
                return CachedDataset::default();
            }
        }

        match serde_json::from_str::<PersistedRecord>(&contents) {
            Ok(record) => CachedDataset::from_record(record),
            Err(e) => {
                warn!(error = %e, "Failed to parse cached snapshot, starting empty");
                CachedDataset::default()
            }
        }
    }

    // ===== Refresh =====

    /// Refresh all six collections unless the cache is fresh.
    ///
    /// Never fails past this boundary: errors are recorded on the dataset and
    /// returned as `FetchOutcome::Failed`, so callers may ignore the result.
    pub async fn fetch_all(&self, options: FetchOptions) -> FetchOutcome {
        let seen = self.completed.load(Ordering::Acquire);
        let mut slot = self.refresh.lock().await;

        if self.completed.load(Ordering::Acquire) != seen {
            if let Some(outcome) = slot.last.clone() {
                debug!(?outcome, "Joined refresh that finished while waiting");
                return outcome;
            }
        }

        if !options.force && self.is_fresh() {
            debug!(age = %self.state.borrow().age_display(), "Cache is fresh, skipping fetch");
            return FetchOutcome::Fresh;
        }

        info!(force = options.force, "Fetching site data");
        let outcome = match self.fetch_batch().await {
            Ok(collections) => {
                let fetched_at = Utc::now().trunc_subsecs(3);
                self.state.send_replace(CachedDataset {
                    collections,
                    loaded: true,
                    fetched_at: Some(fetched_at),
                    error: None,
                });
                self.persist();
                info!(%fetched_at, "Site data refreshed");
                FetchOutcome::Refreshed { fetched_at }
            }
            Err(e) => {
                let error = e.to_string();
                warn!(resource = %e.resource(), error = %error, "Site data fetch failed");
                self.state.send_modify(|data| data.error = Some(error.clone()));
                FetchOutcome::Failed { error }
            }
        };

        slot.last = Some(outcome.clone());
        self.completed.fetch_add(1, Ordering::Release);
        outcome
    }

    /// Fetch all six resources concurrently; the first failure fails the batch.
    async fn fetch_batch(&self) -> Result<Collections, CacheError> {
        let source = self.source.as_ref();
        let fetch = |resource: Resource| async move {
            debug!(%resource, "Fetching resource");
            source
                .fetch(resource)
                .await
                .map_err(|e| CacheError::Fetch { resource, source: e })
        };

        let (partners, services, faqs, contact, team, feedback) = futures::try_join!(
            fetch(Resource::Partners),
            fetch(Resource::Services),
            fetch(Resource::Faqs),
            fetch(Resource::Contact),
            fetch(Resource::Team),
            fetch(Resource::Feedback),
        )?;

        Ok(Collections {
            partners: decode::<Vec<Partner>>(Resource::Partners, partners)?,
            services: decode::<Vec<Service>>(Resource::Services, services)?,
            faqs: decode::<Vec<Faq>>(Resource::Faqs, faqs)?,
            contact: decode::<Option<Contact>>(Resource::Contact, contact)?,
            team: decode::<Vec<TeamMember>>(Resource::Team, team)?,
            feedback: decode::<Vec<Feedback>>(Resource::Feedback, feedback)?,
        })
    }

    /// Reset to the empty state and persist that.
    pub fn clear(&self) {
        self.state.send_replace(CachedDataset::default());
        self.persist();
        info!("Site data cache cleared");
    }

    fn persist(&self) {
        let record = self.state.borrow().to_record();
        let result = serde_json::to_string(&record)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.store.write(&json));
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist site data snapshot");
        }
    }

    // ===== Reads =====

    /// Register for change notifications.
    pub fn subscribe(&self) -> watch::Receiver<CachedDataset> {
        self.state.subscribe()
    }

    pub fn read<R>(&self, f: impl FnOnce(&CachedDataset) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn snapshot(&self) -> CachedDataset {
        self.state.borrow().clone()
    }

    pub fn is_fresh(&self) -> bool {
        self.state.borrow().is_fresh(self.ttl)
    }

    pub fn is_loaded(&self) -> bool {
        self.state.borrow().loaded
    }

    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.state.borrow().fetched_at
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn collection(&self, resource: Resource) -> Value {
        self.state.borrow().collections.to_value(resource)
    }

    pub fn partners(&self) -> Vec<Partner> {
        self.state.borrow().collections.partners.clone()
    }

    pub fn services(&self) -> Vec<Service> {
        self.state.borrow().collections.services.clone()
    }

    pub fn faqs(&self) -> Vec<Faq> {
        self.state.borrow().collections.faqs.clone()
    }

    pub fn contact(&self) -> Option<Contact> {
        self.state.borrow().collections.contact.clone()
    }

    pub fn team(&self) -> Vec<TeamMember> {
        self.state.borrow().collections.team.clone()
    }

    pub fn feedback(&self) -> Vec<Feedback> {
        self.state.borrow().collections.feedback.clone()
    }
}

fn decode<T: DeserializeOwned>(resource: Resource, value: Value) -> Result<T, CacheError> {
    serde_json::from_value(value).map_err(|e| CacheError::Decode { resource, source: e })
}

// ============================================================================
// Tests
// ============================================================================
