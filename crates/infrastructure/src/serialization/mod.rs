//! JSON helpers for files written by the local adapters.
//!
//! Output is pretty-printed with 2-space indentation and a trailing
//! newline, so the storage file stays readable and diffs stay small.

mod json;

pub use json::*;
