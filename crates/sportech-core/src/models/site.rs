//! List collections shown on the public site and edited in the admin panel.
//!
//! The API is loose about field naming (some records carry `id`, others a
//! Mongo `_id`; partners mix snake and camel case), so every model keeps the
//! fields it knows about and folds the rest into `extra`. That keeps a cached
//! snapshot faithful to what the API returned.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient;

/// Pick whichever identifier the API sent.
fn pick_id<'a>(id: &'a Option<String>, mongo_id: &'a Option<String>) -> Option<&'a str> {
    id.as_deref().or(mongo_id.as_deref())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub mongo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub website: Option<String>,
    #[serde(rename = "googlePlay", default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub google_play: Option<String>,
    #[serde(rename = "appGallery", default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub app_gallery: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Partner {
    pub fn id(&self) -> Option<&str> {
        pick_id(&self.id, &self.mongo_id).or(self.slug.as_deref())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unnamed partner)")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub mongo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub banner_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub right_image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Service {
    pub fn id(&self) -> Option<&str> {
        pick_id(&self.id, &self.mongo_id).or(self.slug.as_deref())
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(untitled service)")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Faq {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub mongo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub answer: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Faq {
    pub fn id(&self) -> Option<&str> {
        pick_id(&self.id, &self.mongo_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub mongo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub photo: Option<String>,
    /// Assigned by the API on create; the site lists members in this order.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_i64")]
    pub order: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TeamMember {
    pub fn id(&self) -> Option<&str> {
        pick_id(&self.id, &self.mongo_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub mongo_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_f64")]
    pub stars: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient::opt_string")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Feedback {
    pub fn id(&self) -> Option<&str> {
        pick_id(&self.id, &self.mongo_id)
    }

    /// Star rating rounded and clamped to 1..=5; the admin form falls back to one star.
    pub fn rating(&self) -> u8 {
        self.stars.unwrap_or(1.0).round().clamp(1.0, 5.0) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partner_keeps_unknown_fields() {
        let json = r#"{"_id":"65a1","name":"Acme","googlePlay":"https://play/acme","tier":"gold"}"#;
        let partner: Partner = serde_json::from_str(json).unwrap();
        assert_eq!(partner.id(), Some("65a1"));
        assert_eq!(partner.google_play.as_deref(), Some("https://play/acme"));
        assert_eq!(partner.extra.get("tier"), Some(&Value::from("gold")));

        let back: Value = serde_json::to_value(&partner).unwrap();
        let original: Value = serde_json::from_str(json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_service_id_falls_back_to_slug() {
        let service: Service = serde_json::from_str(r#"{"slug":"tracking","title":"Tracking"}"#).unwrap();
        assert_eq!(service.id(), Some("tracking"));
        assert_eq!(service.display_title(), "Tracking");
    }

    #[test]
    fn test_id_preferred_over_mongo_id() {
        let faq: Faq = serde_json::from_str(r#"{"id":"f1","_id":"m1","question":"Q?"}"#).unwrap();
        assert_eq!(faq.id(), Some("f1"));
    }

    #[test]
    fn test_feedback_rating_is_clamped() {
        let mut fb = Feedback::default();
        assert_eq!(fb.rating(), 1);
        fb.stars = Some(9.0);
        assert_eq!(fb.rating(), 5);
        fb.stars = Some(4.0);
        assert_eq!(fb.rating(), 4);
        fb.stars = Some(-2.0);
        assert_eq!(fb.rating(), 1);
    }

    #[test]
    fn test_feedback_accepts_loose_stars() {
        let fb: Feedback = serde_json::from_str(r#"{"_id":"f1","name":"Ana","stars":"4"}"#).unwrap();
        assert_eq!(fb.stars, Some(4.0));
        assert_eq!(fb.rating(), 4);

        let fb: Feedback = serde_json::from_str(r#"{"_id":"f2","stars":4.5}"#).unwrap();
        assert_eq!(fb.stars, Some(4.5));
        assert_eq!(fb.rating(), 5);

        let fb: Feedback = serde_json::from_str(r#"{"_id":"f3","stars":"five"}"#).unwrap();
        assert_eq!(fb.rating(), 1);
    }

    #[test]
    fn test_numeric_ids_are_kept_as_text() {
        let member: TeamMember =
            serde_json::from_str(r#"{"id":7,"name":"Lea","order":"2"}"#).unwrap();
        assert_eq!(member.id(), Some("7"));
        assert_eq!(member.order, Some(2));

        let partner: Partner = serde_json::from_str(r#"{"_id":12,"name":"Acme"}"#).unwrap();
        assert_eq!(partner.id(), Some("12"));
    }
}
