use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the six public collections the site reads from the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Partners,
    Services,
    Faqs,
    Contact,
    Team,
    Feedback,
}

impl Resource {
    /// All resources in the order the cache fetches them.
    pub const ALL: [Resource; 6] = [
        Resource::Partners,
        Resource::Services,
        Resource::Faqs,
        Resource::Contact,
        Resource::Team,
        Resource::Feedback,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Partners => "partners",
            Resource::Services => "services",
            Resource::Faqs => "faqs",
            Resource::Contact => "contact",
            Resource::Team => "team",
            Resource::Feedback => "feedback",
        }
    }

    /// API path relative to the base URL.
    pub fn path(&self) -> String {
        format!("/{}", self.name())
    }

    /// `contact` is a single object; everything else is a list.
    pub fn is_list(&self) -> bool {
        !matches!(self, Resource::Contact)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Resource::ALL
            .into_iter()
            .find(|r| r.name() == lower)
            .ok_or_else(|| {
                format!(
                    "unknown resource '{}' (expected one of: partners, services, faqs, contact, team, feedback)",
                    s
                )
            })
    }
}
