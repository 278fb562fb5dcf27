//! QuoteConnect Domain - Core session and authorization types
//!
//! This crate defines the domain model for the QuoteConnect front-end core:
//! who a user is, which role they hold, what the current session looks like,
//! and which views a role may reach.
//! All types here are pure Rust with no I/O dependencies.

pub mod access;
pub mod credentials;
pub mod error;
pub mod id;
pub mod identity;
pub mod navigation;
pub mod notification;
pub mod role;
pub mod session;

pub use access::AccessDecision;
pub use credentials::{Credentials, SignupRequest};
pub use error::{AuthError, AuthResult, ValidationError};
pub use id::generate_id;
pub use identity::{AuthAccount, Identity, ProfileRecord};
pub use navigation::{DashboardView, NavLink, landing_route, nav_links};
pub use notification::{Notification, NotificationLevel};
pub use role::Role;
pub use session::Session;
