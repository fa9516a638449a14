//! Application data cache for the public site collections.
//!
//! `AppDataCache` fetches partners, services, faqs, contact, team and
//! feedback as one batch, keeps them in memory and in a durable snapshot,
//! and serves them without refetching until the data is 12 hours old or a
//! caller forces a refresh.
//!
//! - `ResourceSource`: where collection bodies come from (`ApiClient` in production)
//! - `SnapshotStore`: where the snapshot survives restarts (`FileStore`, `MemoryStore`)

pub mod dataset;
pub mod error;
pub mod manager;
pub mod source;
pub mod store;

pub use dataset::{CachedDataset, Collections, PersistedRecord, SNAPSHOT_KEY, SNAPSHOT_VERSION};
pub use error::CacheError;
pub use manager::{AppDataCache, FetchOptions, FetchOutcome, DEFAULT_TTL};
pub use source::ResourceSource;
pub use store::{FileStore, MemoryStore, SnapshotStore};
