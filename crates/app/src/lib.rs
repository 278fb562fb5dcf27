//! QuoteConnect command-line front-end.
//!
//! Each invocation restores the persisted session, runs one command
//! against the auth controller or the route guard, and reports the result
//! together with any notifications the flow raised.

pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod error;

pub use bootstrap::{Services, bootstrap};
pub use cli::{Cli, Command, SignupArgs};
pub use commands::{RunReport, execute, run};
pub use error::AppError;
