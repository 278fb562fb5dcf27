//! ID generation utilities.

use uuid::Uuid;

/// Generates a new time-ordered UUID v7 as a string.
///
/// Used for accounts created by providers that do not assign their own ids.
#[must_use]
pub fn generate_id() -> String {
    Uuid::now_v7().to_string()
}
