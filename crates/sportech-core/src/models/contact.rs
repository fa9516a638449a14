//! Company contact details and the public contact form.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Single contact record served at `/contact`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub tiktok: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub youtube: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Contact {
    /// Social links that are present, as (network, url) pairs.
    pub fn social_links(&self) -> Vec<(&'static str, &str)> {
        [
            ("facebook", &self.facebook),
            ("tiktok", &self.tiktok),
            ("instagram", &self.instagram),
            ("youtube", &self.youtube),
        ]
        .into_iter()
        .filter_map(|(name, url)| {
            url.as_deref()
                .filter(|u| !u.trim().is_empty())
                .map(|u| (name, u))
        })
        .collect()
    }
}

/// Message submitted through the site's contact form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub message: String,
}

impl ContactMessage {
    /// First name, email and message are required.
    pub fn validate(&self) -> Result<(), String> {
        if self.first_name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.message.trim().is_empty()
        {
            return Err("First name, email and message are required.".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_social_links_skip_blank() {
        let contact = Contact {
            facebook: Some("https://fb.com/sportech".to_string()),
            tiktok: Some("  ".to_string()),
            youtube: Some("https://yt.com/sportech".to_string()),
            ..Default::default()
        };
        assert_eq!(
            contact.social_links(),
            vec![
                ("facebook", "https://fb.com/sportech"),
                ("youtube", "https://yt.com/sportech")
            ]
        );
    }

    #[test]
    fn test_contact_message_validation() {
        let mut msg = ContactMessage {
            first_name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            message: "Hello".to_string(),
            ..Default::default()
        };
        assert!(msg.validate().is_ok());

        msg.message = "   ".to_string();
        assert!(msg.validate().is_err());
    }

    #[test]
    fn test_contact_message_wire_format() {
        let msg = ContactMessage {
            first_name: "Ana".to_string(),
            last_name: "Lee".to_string(),
            email: "ana@example.com".to_string(),
            phone: String::new(),
            message: "Hi".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["firstName"], "Ana");
        assert_eq!(json["lastName"], "Lee");
    }
}
