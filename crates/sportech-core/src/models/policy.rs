use serde::{Deserialize, Serialize};

/// A policy page (privacy policy, terms & conditions) stored under `/policies/{slug}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub sections: Vec<PolicySection>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySection {
    #[serde(default)]
    pub title: String,
    /// Paragraphs separated by a blank line.
    #[serde(default)]
    pub description: String,
}

impl PolicySection {
    pub fn paragraphs(&self) -> Vec<&str> {
        self.description
            .split("\n\n")
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }
}

impl Policy {
    /// Body sent on save: the API expects the whole document with trimmed sections.
    pub fn to_update_body(&self) -> Policy {
        Policy {
            slug: None,
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            sections: self
                .sections
                .iter()
                .map(|s| PolicySection {
                    title: s.title.clone(),
                    description: s.description.trim().to_string(),
                })
                .collect(),
        }
    }
}
