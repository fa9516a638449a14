use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Contact, Faq, Feedback, Partner, Resource, Service, TeamMember};

/// Schema version of the persisted snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Name of the persisted record.
pub const SNAPSHOT_KEY: &str = "sportech-app-data";

/// The six site collections, always replaced together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collections {
    #[serde(default)]
    pub partners: Vec<Partner>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub faqs: Vec<Faq>,
    #[serde(default)]
    pub contact: Option<Contact>,
    #[serde(default)]
    pub team: Vec<TeamMember>,
    #[serde(default)]
    pub feedback: Vec<Feedback>,
}

impl Collections {
    /// Current value of one collection as JSON (an array, or an object/null for contact).
    pub fn to_value(&self, resource: Resource) -> Value {
        let value = match resource {
            Resource::Partners => serde_json::to_value(&self.partners),
            Resource::Services => serde_json::to_value(&self.services),
            Resource::Faqs => serde_json::to_value(&self.faqs),
            Resource::Contact => serde_json::to_value(&self.contact),
            Resource::Team => serde_json::to_value(&self.team),
            Resource::Feedback => serde_json::to_value(&self.feedback),
        };
        // Models serialize to plain maps; this cannot fail.
        value.unwrap_or(Value::Null)
    }

    /// Number of items held for a resource (0 or 1 for contact).
    pub fn len(&self, resource: Resource) -> usize {
        match resource {
            Resource::Partners => self.partners.len(),
            Resource::Services => self.services.len(),
            Resource::Faqs => self.faqs.len(),
            Resource::Contact => usize::from(self.contact.is_some()),
            Resource::Team => self.team.len(),
            Resource::Feedback => self.feedback.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Resource::ALL.iter().all(|r| self.len(*r) == 0)
    }
}

/// Everything the data cache holds: the collections plus load status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedDataset {
    pub collections: Collections,
    /// True once a full fetch has succeeded; mirrors `fetched_at.is_some()`.
    pub loaded: bool,
    pub fetched_at: Option<DateTime<Utc>>,
    /// Last fetch failure. Never persisted.
    pub error: Option<String>,
}

impl CachedDataset {
    /// Fresh means loaded and younger than `ttl`. A timestamp in the future
    /// (clock skew) counts as fresh.
    pub fn is_fresh_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (self.loaded, self.fetched_at) {
            (true, Some(at)) => match (now - at).to_std() {
                Ok(elapsed) => elapsed < ttl,
                Err(_) => true,
            },
            _ => false,
        }
    }

    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.is_fresh_at(Utc::now(), ttl)
    }

    pub fn age_minutes(&self) -> Option<i64> {
        self.fetched_at.map(|at| (Utc::now() - at).num_minutes())
    }

    pub fn age_display(&self) -> String {
        let Some(minutes) = self.age_minutes() else {
            return "never".to_string();
        };
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }

    /// The persisted subset: collections, `loaded`, `fetched_at`.
    pub fn to_record(&self) -> PersistedRecord {
        PersistedRecord {
            state: PersistedState {
                collections: self.collections.clone(),
                fetched_at: self.fetched_at,
                loaded: self.loaded,
            },
            version: SNAPSHOT_VERSION,
        }
    }

    /// Rebuild from a persisted record. `loaded` is derived from `fetched_at`
    /// so a hand-edited or older record cannot break that pairing.
    pub fn from_record(record: PersistedRecord) -> Self {
        let PersistedState {
            collections,
            fetched_at,
            loaded,
        } = record.state;
        if loaded != fetched_at.is_some() {
            tracing::debug!(loaded, has_fetched_at = fetched_at.is_some(), "Normalizing snapshot load flag");
        }
        Self {
            collections,
            loaded: fetched_at.is_some(),
            fetched_at,
            error: None,
        }
    }
}

/// On-disk form: `{"state": {...}, "version": 1}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub state: PersistedState,
    pub version: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(flatten)]
    pub collections: Collections,
    /// Milliseconds since the Unix epoch.
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub loaded: bool,
}
