//! Marketplace roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Role held by an identity. Closed set; "no role yet" is `Option::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Submits products and receives quotes.
    Customer,
    /// Submits price quotes for products.
    Vendor,
    /// Internal analyst with read-only aggregate views.
    Intern,
}

impl Role {
    /// All roles, in display order.
    pub const ALL: [Self; 3] = [Self::Customer, Self::Vendor, Self::Intern];

    /// Returns the wire/storage name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Vendor => "vendor",
            Self::Intern => "intern",
        }
    }

    /// Returns the capitalized label shown in menus.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Vendor => "Vendor",
            Self::Intern => "Intern",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "vendor" => Ok(Self::Vendor),
            "intern" => Ok(Self::Intern),
            other => Err(ValidationError::new(
                "role",
                format!("unknown role '{other}'"),
            )),
        }
    }
}
