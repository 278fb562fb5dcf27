//! Request and response bodies of the hosted auth backend.

use quoteconnect_domain::AuthAccount;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct SignupBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: SignupMetadata<'a>,
}

/// User metadata stored with the auth record.
#[derive(Debug, Serialize)]
pub(crate) struct SignupMetadata<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserRecord {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl From<UserRecord> for AuthAccount {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserRecord,
}

/// Signup answers with a session when the account is usable right away,
/// or with the bare user when the email must be confirmed first.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum SignupResponse {
    Session(SessionResponse),
    PendingConfirmation(UserRecord),
}

/// Error body. The auth and REST services use different field names.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiErrorBody {
    pub fn code(&self) -> Option<String> {
        self.error_code.clone().or_else(|| self.error.clone())
    }

    pub fn into_message(self) -> Option<String> {
        self.msg.or(self.error_description).or(self.message)
    }
}
