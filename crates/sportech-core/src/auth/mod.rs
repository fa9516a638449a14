//! Admin authentication state.
//!
//! - `Session`: the bearer token from `/auth/login`, persisted to disk
//! - `ResetFlow`: email and reset token carried through the password-reset steps

pub mod reset;
pub mod session;

pub use reset::ResetFlow;
pub use session::{Session, SessionData};
