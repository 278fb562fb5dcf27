//! Login and signup input, with client-side validation.
//!
//! Validation runs before any provider call so that malformed input never
//! produces side effects.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::role::Role;

/// Minimum password length accepted at signup.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Email/password pair submitted by the sign-in form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Sign-in email.
    pub email: String,
    /// Plain-text password, only ever forwarded to the provider.
    pub password: String,
}

impl Credentials {
    /// Creates a credential pair, trimming the email.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }

    /// Checks that both fields are present and the email is well formed.
    ///
    /// # Errors
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::new("password", "Password is required"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fields submitted by the sign-up form.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignupRequest {
    /// Sign-in email.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Selected role; required.
    pub role: Option<Role>,
    /// Contact phone, required for customers.
    pub phone: Option<String>,
    /// Company name, required for vendors.
    pub company: Option<String>,
}

impl SignupRequest {
    /// Checks required fields for the selected role.
    ///
    /// # Errors
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::new(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        let Some(role) = self.role else {
            return Err(ValidationError::new("role", "Please select a role"));
        };
        if self.first_name.trim().is_empty() {
            return Err(ValidationError::new("first_name", "First name is required"));
        }
        if self.last_name.trim().is_empty() {
            return Err(ValidationError::new("last_name", "Last name is required"));
        }
        match role {
            Role::Customer if is_blank(self.phone.as_deref()) => Err(ValidationError::new(
                "phone",
                "A contact phone number is required for customers",
            )),
            Role::Vendor if is_blank(self.company.as_deref()) => Err(ValidationError::new(
                "company",
                "A company name is required for vendors",
            )),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("role", &self.role)
            .field("phone", &self.phone)
            .field("company", &self.company)
            .finish()
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::new("email", "Email is required"));
    }
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(())
        }
        _ => Err(ValidationError::new("email", "Enter a valid email address")),
    }
}
