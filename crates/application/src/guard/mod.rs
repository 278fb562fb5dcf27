//! Route authorization.
//!
//! [`decide`] is the pure decision over a session and an optional role
//! set. [`RouteGuard`] applies it to paths through a [`RouteTable`].

mod route_guard;

pub use route_guard::{RouteGuard, RouteRule, RouteTable, decide};
