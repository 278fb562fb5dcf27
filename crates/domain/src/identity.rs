//! Identity, account and profile records.
//!
//! A provider may hand back an authenticated account before it has a
//! profile (role and display attributes). `Identity` is the merged view
//! the rest of the system works with.

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// Bare authenticated principal returned by the auth step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthAccount {
    /// Opaque provider id.
    pub id: String,
    /// Sign-in email.
    pub email: String,
}

/// Profile row keyed by the account id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileRecord {
    /// Account id this profile belongs to.
    pub id: String,
    /// Assigned role, if any.
    #[serde(default)]
    pub role: Option<Role>,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Contact phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Company name (vendors).
    #[serde(default)]
    pub company: Option<String>,
}

/// An authenticated principal's id, role and display attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque provider id.
    pub id: String,
    /// Sign-in email.
    pub email: String,
    /// Role; `None` only while a profile is incomplete.
    #[serde(default)]
    pub role: Option<Role>,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Company name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl Identity {
    /// Merges an auth account with its profile, if one was found.
    #[must_use]
    pub fn from_parts(account: AuthAccount, profile: Option<ProfileRecord>) -> Self {
        let profile = profile.unwrap_or_default();
        Self {
            id: account.id,
            email: account.email,
            role: profile.role,
            first_name: profile.first_name,
            last_name: profile.last_name,
            phone: profile.phone,
            company: profile.company,
        }
    }

    /// Returns the bare account part of this identity.
    #[must_use]
    pub fn account(&self) -> AuthAccount {
        AuthAccount {
            id: self.id.clone(),
            email: self.email.clone(),
        }
    }

    /// Returns the profile part of this identity.
    #[must_use]
    pub fn profile(&self) -> ProfileRecord {
        ProfileRecord {
            id: self.id.clone(),
            role: self.role,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            company: self.company.clone(),
        }
    }

    /// Full name, falling back to the email when no name is known.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }

    /// Upper-cased initials of the name parts, or `"U"` when there is no name.
    #[must_use]
    pub fn initials(&self) -> String {
        let initials: String = self
            .first_name
            .split_whitespace()
            .chain(self.last_name.split_whitespace())
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        if initials.is_empty() {
            "U".to_string()
        } else {
            initials
        }
    }

    /// True once the identity has a role and a name.
    #[must_use]
    pub fn is_profile_complete(&self) -> bool {
        self.role.is_some() && !self.first_name.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn account() -> AuthAccount {
        AuthAccount {
            id: "u-1".to_string(),
            email: "a@b.com".to_string(),
        }
    }

    #[test]
    fn test_from_parts_merges_profile() {
        let profile = ProfileRecord {
            id: "u-1".to_string(),
            role: Some(Role::Vendor),
            first_name: "Vera".to_string(),
            last_name: "Stone".to_string(),
            phone: None,
            company: Some("Stone Supply".to_string()),
        };
        let identity = Identity::from_parts(account(), Some(profile.clone()));

        assert_eq!(identity.role, Some(Role::Vendor));
        assert_eq!(identity.display_name(), "Vera Stone");
        assert_eq!(identity.profile(), profile);
        assert!(identity.is_profile_complete());
    }

    #[test]
    fn test_from_parts_without_profile_is_incomplete() {
        let identity = Identity::from_parts(account(), None);
        assert_eq!(identity.role, None);
        assert_eq!(identity.display_name(), "a@b.com");
        assert!(!identity.is_profile_complete());
    }

    #[test]
    fn test_initials() {
        let mut identity = Identity::from_parts(account(), None);
        assert_eq!(identity.initials(), "U");

        identity.first_name = "demo".to_string();
        identity.last_name = "customer".to_string();
        assert_eq!(identity.initials(), "DC");

        identity.first_name = "Mary Ann".to_string();
        assert_eq!(identity.initials(), "MAC");
    }
}
