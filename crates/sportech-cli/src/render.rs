//! Plain-text output for cached site data.

use std::time::Duration;

use sportech_core::auth::Session;
use sportech_core::cache::{CachedDataset, Collections};
use sportech_core::models::{Policy, Resource};
use sportech_core::utils::{format_optional, truncate_string};

/// Column width for free-text fields in list output.
const TEXT_COLUMN_WIDTH: usize = 60;

pub fn print_status(data: &CachedDataset, ttl: Duration, session: &Session, base_url: &str) {
    println!("API:        {}", if base_url.is_empty() { "(not configured)" } else { base_url });
    println!("Loaded:     {}", if data.loaded { "yes" } else { "no" });
    match data.fetched_at {
        Some(at) => println!(
            "Fetched:    {} ({})",
            at.format("%Y-%m-%d %H:%M:%S UTC"),
            data.age_display()
        ),
        None => println!("Fetched:    never"),
    }
    println!(
        "Fresh:      {} (ttl {}h)",
        if data.is_fresh(ttl) { "yes" } else { "no" },
        ttl.as_secs() / 3600
    );
    if let Some(ref error) = data.error {
        println!("Last error: {}", error);
    }
    match (session.email(), session.data.as_ref()) {
        (Some(email), Some(d)) if session.is_valid() => {
            println!("Admin:      {} ({}m left)", email, d.minutes_until_expiry())
        }
        _ => println!("Admin:      not logged in"),
    }
    print_counts(data);
}

pub fn print_counts(data: &CachedDataset) {
    for resource in Resource::ALL {
        println!("  {:<10} {}", resource.name(), data.collections.len(resource));
    }
}

pub fn print_collection(collections: &Collections, resource: Resource) {
    if collections.len(resource) == 0 {
        println!("No {} cached.", resource);
        return;
    }
    for line in collection_lines(collections, resource) {
        println!("{}", line);
    }
}

fn collection_lines(collections: &Collections, resource: Resource) -> Vec<String> {
    match resource {
        Resource::Partners => collections
            .partners
            .iter()
            .map(|p| {
                format!(
                    "{:<24} {:<32} {}",
                    p.id().unwrap_or("-"),
                    p.display_name(),
                    format_optional(&p.website, "")
                )
            })
            .collect(),
        Resource::Services => collections
            .services
            .iter()
            .map(|s| {
                format!(
                    "{:<24} {:<32} {}",
                    s.id().unwrap_or("-"),
                    s.display_title(),
                    truncate_string(&format_optional(&s.short_description, ""), TEXT_COLUMN_WIDTH)
                )
            })
            .collect(),
        Resource::Faqs => collections
            .faqs
            .iter()
            .flat_map(|f| {
                [
                    format!("Q: {}", format_optional(&f.question, "?")),
                    format!("A: {}", format_optional(&f.answer, "")),
                    String::new(),
                ]
            })
            .collect(),
        Resource::Contact => {
            let Some(ref c) = collections.contact else {
                return Vec::new();
            };
            let mut lines = vec![
                format!("Location: {}", format_optional(&c.location, "-")),
                format!("Email:    {}", format_optional(&c.email, "-")),
                format!("Phone:    {}", format_optional(&c.phone, "-")),
            ];
            lines.extend(
                c.social_links()
                    .into_iter()
                    .map(|(network, url)| format!("{:<9} {}", format!("{}:", network), url)),
            );
            lines
        }
        Resource::Team => {
            let mut team: Vec<_> = collections.team.iter().collect();
            team.sort_by_key(|m| m.order.unwrap_or(i64::MAX));
            team.into_iter()
                .map(|m| {
                    format!(
                        "{:<28} {}",
                        format_optional(&m.name, "(unnamed)"),
                        format_optional(&m.role, "")
                    )
                })
                .collect()
        }
        Resource::Feedback => collections
            .feedback
            .iter()
            .map(|f| {
                let rating = usize::from(f.rating());
                format!(
                    "{}{} {}: {}",
                    "*".repeat(rating),
                    " ".repeat(5 - rating),
                    format_optional(&f.name, "Anonymous"),
                    truncate_string(&format_optional(&f.message, ""), TEXT_COLUMN_WIDTH)
                )
            })
            .collect(),
    }
}

pub fn print_policy(policy: &Policy) {
    println!("{}", policy.title);
    if !policy.subtitle.is_empty() {
        println!("{}", policy.subtitle);
    }
    for section in &policy.sections {
        println!();
        println!("## {}", section.title);
        for paragraph in section.paragraphs() {
            println!();
            println!("{}", paragraph);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sportech_core::models::{Contact, Feedback, TeamMember};

    #[test]
    fn test_team_sorted_by_order() {
        let collections = Collections {
            team: vec![
                TeamMember {
                    name: Some("Second".to_string()),
                    order: Some(2),
                    ..Default::default()
                },
                TeamMember {
                    name: Some("Unordered".to_string()),
                    ..Default::default()
                },
                TeamMember {
                    name: Some("First".to_string()),
                    order: Some(1),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let lines = collection_lines(&collections, Resource::Team);
        assert!(lines[0].starts_with("First"));
        assert!(lines[1].starts_with("Second"));
        assert!(lines[2].starts_with("Unordered"));
    }

    #[test]
    fn test_feedback_stars() {
        let collections = Collections {
            feedback: vec![Feedback {
                name: Some("Ana".to_string()),
                stars: Some(3.0),
                message: Some("Great".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(collection_lines(&collections, Resource::Feedback), vec!["***   Ana: Great"]);
    }

    #[test]
    fn test_contact_lines_include_socials() {
        let collections = Collections {
            contact: Some(Contact {
                email: Some("a@b.com".to_string()),
                instagram: Some("https://ig/sportech".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let lines = collection_lines(&collections, Resource::Contact);
        assert!(lines.contains(&"Email:    a@b.com".to_string()));
        assert!(lines.iter().any(|l| l.starts_with("instagram:") && l.ends_with("https://ig/sportech")));
    }
}
