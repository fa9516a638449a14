//! Data models for the Sportech site API.
//!
//! - `Resource`: the six public collections the data cache tracks
//! - `Partner`, `Service`, `Faq`, `TeamMember`, `Feedback`: list collections
//! - `Contact`, `ContactMessage`: company contact record and the contact form
//! - `Policy`: policy pages edited from the admin panel

pub mod contact;
pub mod lenient;
pub mod policy;
pub mod resource;
pub mod site;

pub use contact::{Contact, ContactMessage};
pub use policy::{Policy, PolicySection};
pub use resource::Resource;
pub use site::{Faq, Feedback, Partner, Service, TeamMember};
